//! One supervised simulated day.
//!
//! Every task the day starts is owned by a `JoinSet`: skiers in one, the
//! clock and workers in another, the coordinator in a third. The
//! coordinator's halt releases anything still parked on the lift, and
//! background tasks that ignore the shutdown broadcast past the configured
//! timeout are aborted. If a skier task fails, dropping the sets cancels the
//! whole group.

use crate::clock::{SimClock, run_clock};
use crate::coordinator::{ShutdownCoordinator, ShutdownReport};
use crate::error::SimulationError;
use crate::pipeline::{ExitReason, SkierActor, SkierOutcome};
use crate::population::Population;
use crate::resort::Resort;
use crate::worker::{WorkerReport, crew};
use chairlift_core::environment::Clock;
use chairlift_core::lift::Operator;
use chairlift_core::{Diagnostics, EntitlementSource, SimulationConfig, StatisticsSink};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::task::JoinSet;

/// External control surface
///
/// Operator triggers (signals, a console) go through these methods, which
/// perform the same locked transitions as the workers.
#[derive(Clone)]
pub struct ControlHandle {
    resort: Arc<Resort>,
}

impl ControlHandle {
    /// Pause the lift; no-op if already stopped or shutting down
    pub fn request_stop(&self) -> bool {
        self.resort.lift.request_stop(Operator::Console)
    }

    /// Resume the lift; no-op if running or shutting down
    pub fn request_resume(&self) -> bool {
        self.resort.lift.request_resume(Operator::Console)
    }

    /// Close the station early and let it drain
    pub fn close_station(&self) -> bool {
        self.resort.station.close()
    }

    /// Read-only snapshot
    #[must_use]
    pub fn snapshot(&self) -> Diagnostics {
        self.resort.diagnostics()
    }
}

/// Result of a simulated day
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    /// Every skier that received an entitlement, in completion order
    pub outcomes: Vec<SkierOutcome>,
    /// Arrivals the entitlement source refused
    pub tickets_refused: u32,
    /// Admission gate hand-offs
    pub gate_passes: u64,
    /// Highest platform occupancy
    pub platform_peak: usize,
    /// Highest standard chair occupancy
    pub chairs_peak: usize,
    /// Highest VIP chair occupancy
    pub vip_chairs_peak: usize,
    /// Per-worker activity
    pub workers: Vec<WorkerReport>,
    /// Drain statistics
    pub shutdown: ShutdownReport,
    /// Simulated minutes when the day ended
    pub simulated_minutes: u32,
}

impl SimulationSummary {
    /// Completed rides across all skiers
    #[must_use]
    pub fn total_rides(&self) -> u64 {
        self.outcomes.iter().map(|o| u64::from(o.rides)).sum()
    }

    /// Skiers refused at the eligibility check
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.exit, ExitReason::Rejected(_)))
            .count()
    }
}

/// A configured day, ready to run
pub struct Simulation {
    config: SimulationConfig,
    tickets: Arc<dyn EntitlementSource>,
    resort: Arc<Resort>,
    clock: Arc<SimClock>,
    rng: StdRng,
}

impl Simulation {
    /// Validate `config` and build the resort
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] if the configuration is invalid.
    pub fn new(
        config: SimulationConfig,
        tickets: Arc<dyn EntitlementSource>,
        sink: Arc<dyn StatisticsSink>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let clock = Arc::new(SimClock::new());
        let resort = Arc::new(Resort::new(&config, clock.clone(), sink));
        let rng = config
            .population
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            config,
            tickets,
            resort,
            clock,
            rng,
        })
    }

    /// Control surface for operators, usable while the day runs
    #[must_use]
    pub fn control(&self) -> ControlHandle {
        ControlHandle {
            resort: Arc::clone(&self.resort),
        }
    }

    /// Run the day to completion
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::ActorFailed`] if any task panicked, which
    /// includes resource-protocol violations.
    pub async fn run(mut self) -> Result<SimulationSummary, SimulationError> {
        let resort = Arc::clone(&self.resort);
        let coordinator = ShutdownCoordinator::new(
            resort.station.clone(),
            resort.lift.clone(),
            &self.config.shutdown,
        );

        let mut background = JoinSet::new();
        background.spawn({
            let clock = Arc::clone(&self.clock);
            let station = resort.station.clone();
            let session = self.config.session.clone();
            async move {
                run_clock(clock, station, session).await;
                None
            }
        });
        for worker in crew(
            &resort.lift,
            &self.config.staff,
            self.rng.r#gen(),
            coordinator.shutdown_sender(),
        ) {
            background.spawn(async move { Some(worker.run().await) });
        }
        let mut coordinator = {
            let mut set = JoinSet::new();
            set.spawn(coordinator.run());
            set
        };

        let (mut skiers, tickets_refused) = self.admit_arrivals().await;

        let mut outcomes = Vec::new();
        while let Some(outcome) = skiers.join_next().await {
            match outcome {
                Ok(outcome) => outcomes.push(outcome),
                Err(failure) => {
                    // Dropping the sets aborts the clock, workers and coordinator
                    tracing::error!(%failure, "Skier task failed, abandoning the day");
                    resort.station.close();
                    return Err(failure.into());
                },
            }
        }

        let shutdown = match coordinator.join_next().await.transpose()? {
            Some(Ok(report)) => report,
            Some(Err(_)) | None => {
                tracing::error!("Station state dropped before shutdown completed");
                ShutdownReport::default()
            },
        };
        resort.close_pools();
        let workers = Self::join_background(background, &self.config).await?;
        let gate_passes = resort.gates.join().await?;

        let summary = SimulationSummary {
            outcomes,
            tickets_refused,
            gate_passes,
            platform_peak: resort.platform.peak(),
            chairs_peak: resort.chairs.peak(),
            vip_chairs_peak: resort.vip_chairs.peak(),
            workers,
            shutdown,
            simulated_minutes: self.clock.minutes_elapsed(),
        };
        tracing::info!(
            skiers = summary.outcomes.len(),
            rides = summary.total_rides(),
            rejected = summary.rejected(),
            tickets_refused,
            "Day over"
        );
        Ok(summary)
    }

    async fn admit_arrivals(&mut self) -> (JoinSet<SkierOutcome>, u32) {
        let mut population = Population::new(&self.config.population, self.rng.r#gen());
        let mut skiers = JoinSet::new();
        let mut tickets_refused = 0;

        for _ in 0..self.config.population.skiers {
            let delay = population.arrival_delay();
            tokio::select! {
                () = tokio::time::sleep(delay) => {},
                _ = self.resort.station.wait_until_closed() => break,
            }

            let skier = population.next_skier();
            match self.tickets.issue(skier.id, skier.age) {
                Ok(entitlement) => {
                    let actor = SkierActor::new(skier, entitlement, self.rng.r#gen());
                    skiers.spawn(actor.run(Arc::clone(&self.resort)));
                },
                Err(refused) => {
                    tracing::warn!(skier = %skier.id, %refused, "No ticket issued");
                    tickets_refused += 1;
                },
            }
        }

        tracing::debug!(arrived = population.issued(), "Arrivals finished");
        (skiers, tickets_refused)
    }

    async fn join_background(
        mut background: JoinSet<Option<WorkerReport>>,
        config: &SimulationConfig,
    ) -> Result<Vec<WorkerReport>, SimulationError> {
        let mut workers = Vec::new();
        let joined = tokio::time::timeout(config.shutdown.task_timeout(), async {
            while let Some(report) = background.join_next().await {
                workers.extend(report?);
            }
            Ok::<_, SimulationError>(())
        })
        .await;

        match joined {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    remaining = background.len(),
                    "Background tasks ignored shutdown, aborting"
                );
                background.abort_all();
            },
        }

        workers.sort_by_key(|report| report.id);
        Ok(workers)
    }
}
