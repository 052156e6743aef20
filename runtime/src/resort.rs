//! Shared resources of one simulated day.

use crate::capacity::CapacityGate;
use crate::gates::AdmissionGates;
use crate::lift::Lift;
use crate::station::Station;
use chairlift_core::config::{RideConfig, SimulationConfig};
use chairlift_core::environment::Clock;
use chairlift_core::skier::can_supervise;
use chairlift_core::{AdmissionRejection, Diagnostics, GuardianRegistry, Skier, StatisticsSink};
use std::sync::{Arc, Mutex, PoisonError};

/// Everything skiers compete for, plus the seams they report through
pub struct Resort {
    /// Admission turnstiles
    pub gates: AdmissionGates,
    /// Boarding platform slots
    pub platform: CapacityGate,
    /// Standard chair seats
    pub chairs: CapacityGate,
    /// VIP chair seats
    pub vip_chairs: CapacityGate,
    /// Lift state machine
    pub lift: Lift,
    /// Open flag and in-flight counters
    pub station: Station,
    /// Simulated clock
    pub clock: Arc<dyn Clock>,
    /// Completed-ride receiver
    pub sink: Arc<dyn StatisticsSink>,
    /// Ride timing
    pub ride: RideConfig,
    guardians: Mutex<GuardianRegistry>,
}

impl Resort {
    /// Build the resources described by `config` and open the gates
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if a capacity in `config` is zero; call
    /// [`SimulationConfig::validate`] first.
    #[must_use]
    pub fn new(
        config: &SimulationConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn StatisticsSink>,
    ) -> Self {
        let station = Station::new();
        let capacity = &config.capacity;

        Self {
            gates: AdmissionGates::open(capacity.gates, &station),
            platform: CapacityGate::new("platform", capacity.platform),
            chairs: CapacityGate::new("chairs", capacity.standard_seats()),
            vip_chairs: CapacityGate::new("vip_chairs", capacity.vip_seats()),
            lift: Lift::new(),
            station,
            clock,
            sink,
            ride: config.ride.clone(),
            guardians: Mutex::new(GuardianRegistry::new(
                config.population.max_dependents_per_guardian,
            )),
        }
    }

    /// Eligibility check for an arriving skier
    ///
    /// Adults old enough to supervise are enrolled as guardians first.
    ///
    /// # Errors
    ///
    /// Returns the [`AdmissionRejection`] of an ineligible child.
    pub fn admit(&self, skier: &Skier) -> Result<(), AdmissionRejection> {
        let mut guardians = self.guardians.lock().unwrap_or_else(PoisonError::into_inner);
        if can_supervise(skier.age) {
            guardians.enroll(skier);
        }
        guardians.admit(skier)
    }

    /// Remove a departing skier from the guardian registry
    pub fn withdraw(&self, skier: &Skier) {
        self.guardians
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .withdraw(skier);
    }

    /// Children currently supervised by `guardian`, if it is a live guardian
    #[must_use]
    pub fn dependents_of(&self, guardian: chairlift_core::SkierId) -> Option<u8> {
        self.guardians
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dependents_of(guardian)
    }

    /// Close every capacity pool once the lift has halted
    ///
    /// Pending and later `acquire` calls fail; held slots are released
    /// normally.
    pub fn close_pools(&self) {
        self.platform.close();
        self.chairs.close();
        self.vip_chairs.close();
    }

    /// Read-only snapshot for operators
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let station = self.station.state();
        Diagnostics {
            simulated_minutes_elapsed: self.clock.minutes_elapsed(),
            actors_on_platform: station.on_platform,
            actors_in_lift_queue: station.in_queue,
            lift_running: self.lift.is_running(),
            station_open: station.open,
        }
    }
}
