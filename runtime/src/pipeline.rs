//! Ride pipeline: one skier's day.
//!
//! ```text
//! ARRIVED ──(ineligible)──▶ REJECTED
//!    │
//!    ▼
//! ADMITTED ──▶ ON_PLATFORM ──▶ BOARDING ⇄ STALLED ──▶ DESCENDING ──┐
//!    ▲                                                             │
//!    └──────────────── entitlement valid and station open ─────────┘
//!                                 otherwise ──▶ EXPIRED / CLOSED
//! ```
//!
//! Resources are always taken in the same order (queue place, gate,
//! platform, chair) and held in guards, so every early exit releases them in
//! reverse.

use crate::error::LiftError;
use crate::lift::Lift;
use crate::metrics::RideMetrics;
use crate::resort::Resort;
use chairlift_core::{
    AdmissionRejection, Entitlement, GateId, PriorityClass, RideEvent, Route, Skier, SkierId,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Progress of one ascent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AscentReport {
    /// Ticks counted towards the ascent
    pub ticks: u32,
    /// Ticks interrupted by a stop and not counted
    pub stalled_ticks: u32,
}

/// Ride the lift to the top
///
/// A tick counts only if the lift ran for the whole of it: a stop that lands
/// inside the tick stalls it even if a resume follows before it ends. Before
/// every tick the skier parks until the lift
/// runs, so a stop freezes progress at the next tick boundary and a resume
/// continues from there. `on_tick` sees the counted progress after each
/// counted tick.
///
/// # Errors
///
/// Returns [`LiftError::Halted`] if the lift is halted mid-ascent.
pub async fn ascend<F>(
    lift: &Lift,
    ticks: u32,
    tick: Duration,
    mut on_tick: F,
) -> Result<AscentReport, LiftError>
where
    F: FnMut(u32),
{
    let mut report = AscentReport {
        ticks: 0,
        stalled_ticks: 0,
    };

    while report.ticks < ticks {
        lift.wait_until_running().await?;
        let stops = lift.state().stops;
        tokio::time::sleep(tick).await;

        let state = lift.state();
        if state.running && state.stops == stops {
            report.ticks += 1;
            on_tick(report.ticks);
        } else {
            report.stalled_ticks += 1;
            tracing::debug!(progress = report.ticks, of = ticks, "Ascent stalled");
        }
    }

    Ok(report)
}

/// Why a skier left the station
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Failed the eligibility check on arrival
    Rejected(AdmissionRejection),
    /// Entitlement ran out
    Expired,
    /// Station closed for new rides
    StationClosed,
    /// Lift halted while the skier waited for it
    LiftHalted,
}

impl ExitReason {
    /// Short label for logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Expired => "expired",
            Self::StationClosed => "station_closed",
            Self::LiftHalted => "lift_halted",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(rejection) => write!(f, "rejected: {rejection}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Final state of one skier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkierOutcome {
    /// The skier
    pub skier: SkierId,
    /// Completed rides
    pub rides: u32,
    /// Why it left
    pub exit: ExitReason,
}

/// One skier running the ride pipeline
pub struct SkierActor {
    skier: Skier,
    entitlement: Entitlement,
    rng: StdRng,
}

impl SkierActor {
    /// Skier with its entitlement and a seed for its gate and route choices
    #[must_use]
    pub fn new(skier: Skier, entitlement: Entitlement, seed: u64) -> Self {
        Self {
            skier,
            entitlement,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Ride until the entitlement expires or the station closes
    ///
    /// The eligibility check runs once, before any resource is touched.
    pub async fn run(mut self, resort: Arc<Resort>) -> SkierOutcome {
        let id = self.skier.id;

        if let Err(rejection) = resort.admit(&self.skier) {
            tracing::warn!(skier = %id, age = self.skier.age, %rejection, "Skier refused");
            RideMetrics::record_rejection();
            RideMetrics::record_finished("rejected");
            return SkierOutcome {
                skier: id,
                rides: 0,
                exit: ExitReason::Rejected(rejection),
            };
        }

        tracing::debug!(
            skier = %id,
            age = self.skier.age,
            class = %self.entitlement.class(),
            pass = %self.entitlement.pass(),
            "Skier arrived"
        );

        let exit = self.ride_until_done(&resort).await;
        resort.withdraw(&self.skier);

        let rides = self.entitlement.usage_count();
        tracing::info!(skier = %id, rides, reason = %exit, "Skier left the station");
        RideMetrics::record_finished(exit.label());

        SkierOutcome {
            skier: id,
            rides,
            exit,
        }
    }

    async fn ride_until_done(&mut self, resort: &Resort) -> ExitReason {
        loop {
            if !self.entitlement.is_valid_at(resort.clock.minutes_elapsed()) {
                return ExitReason::Expired;
            }
            if let Err(exit) = self.ride_once(resort).await {
                return exit;
            }
        }
    }

    #[allow(clippy::cognitive_complexity)] // One linear pass through the ride phases
    async fn ride_once(&mut self, resort: &Resort) -> Result<(), ExitReason> {
        let id = self.skier.id;

        let queued = resort
            .station
            .join_queue()
            .ok_or(ExitReason::StationClosed)?;

        let gate = GateId(self.rng.gen_range(0..resort.gates.gate_count()));
        let pass = resort
            .gates
            .pass_through(gate, id)
            .await
            .map_err(|_| ExitReason::StationClosed)?;

        let platform_slot = resort
            .platform
            .acquire()
            .await
            .map_err(|_| ExitReason::StationClosed)?;
        let on_platform = queued.enter_platform();
        tracing::debug!(skier = %id, gate = %pass.gate, "On platform");

        resort
            .lift
            .wait_until_running()
            .await
            .map_err(|_| ExitReason::LiftHalted)?;

        let class = self.entitlement.class();
        let pool = match class {
            PriorityClass::Vip => &resort.vip_chairs,
            PriorityClass::Standard => &resort.chairs,
        };
        let chair = pool.acquire().await.map_err(|_| ExitReason::LiftHalted)?;

        resort
            .lift
            .wait_until_running()
            .await
            .map_err(|_| ExitReason::LiftHalted)?;

        if class == PriorityClass::Vip {
            tracing::info!(skier = %id, pool = chair.pool(), "[VIP] Boarded");
        } else {
            tracing::info!(skier = %id, pool = chair.pool(), "Boarded");
        }

        let ascent = ascend(
            &resort.lift,
            resort.ride.ascent_ticks,
            resort.ride.ascent_tick(),
            |_| {},
        )
        .await
        .map_err(|_| ExitReason::LiftHalted)?;
        if ascent.stalled_ticks > 0 {
            RideMetrics::record_stalled_ticks(ascent.stalled_ticks);
        }

        let completed_rides = self.entitlement.record_ride();
        chair.release();
        platform_slot.release();
        drop(on_platform);

        let route = Route::ALL.choose(&mut self.rng).copied().unwrap_or(Route::T1);
        resort.sink.record(RideEvent {
            skier: id,
            gate: pass.gate,
            route,
            completed_rides,
            class,
        });
        RideMetrics::record_ride(class);

        tracing::info!(skier = %id, route = %route, rides = completed_rides, "Descending");
        tokio::time::sleep(resort.ride.descent(route)).await;
        Ok(())
    }
}
