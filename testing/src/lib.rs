//! # Chairlift Testing
//!
//! Testing utilities and helpers for the chairlift simulation.
//!
//! This crate provides:
//! - Mock implementations of the environment seams (clock, entitlements, statistics)
//! - Test helpers and builders
//! - Property-based testing utilities
//! - Assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use chairlift_testing::{helpers, ManualClock, RecordingSink};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_one_ride() {
//!     let sink = Arc::new(RecordingSink::new());
//!     let resort = helpers::resort(&helpers::test_config(), Arc::new(ManualClock::new()), sink.clone());
//!     // spawn skiers against `resort` ...
//!     assert_eq!(sink.events().len(), 1);
//! }
//! ```

use chairlift_core::entitlement::{
    Entitlement, EntitlementRejected, EntitlementSource, PassKind, PriorityClass,
};
use chairlift_core::environment::Clock;
use chairlift_core::stats::{RideEvent, StatisticsSink};
use chairlift_core::SkierId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Reducer test harness
pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{
        AtomicU32, Clock, Entitlement, EntitlementRejected, EntitlementSource, HashMap, Mutex,
        Ordering, PassKind, PoisonError, PriorityClass, RideEvent, SkierId, StatisticsSink,
    };

    /// Manually driven simulated clock
    ///
    /// Starts at opening time and only moves when a test says so.
    ///
    /// # Example
    ///
    /// ```
    /// use chairlift_testing::mocks::ManualClock;
    /// use chairlift_core::environment::Clock;
    ///
    /// let clock = ManualClock::new();
    /// assert_eq!(clock.minutes_elapsed(), 0);
    /// clock.set(90);
    /// assert_eq!(clock.minutes_elapsed(), 90);
    /// ```
    #[derive(Debug, Default)]
    pub struct ManualClock {
        minutes: AtomicU32,
    }

    impl ManualClock {
        /// Clock at opening time
        #[must_use]
        pub const fn new() -> Self {
            Self {
                minutes: AtomicU32::new(0),
            }
        }

        /// Jump to `minutes` after opening
        pub fn set(&self, minutes: u32) {
            self.minutes.store(minutes, Ordering::Release);
        }

        /// Move forward by `minutes`
        pub fn advance(&self, minutes: u32) {
            self.minutes.fetch_add(minutes, Ordering::AcqRel);
        }
    }

    impl Clock for ManualClock {
        fn minutes_elapsed(&self) -> u32 {
            self.minutes.load(Ordering::Acquire)
        }
    }

    /// Create a clock frozen at opening time
    #[must_use]
    pub const fn test_clock() -> ManualClock {
        ManualClock::new()
    }

    /// Entitlement source issuing the same pass to everybody
    ///
    /// Individual skiers can be given a different priority class, and a
    /// minimum age can be enforced.
    #[derive(Debug)]
    pub struct FixedEntitlements {
        class: PriorityClass,
        valid_for_minutes: u32,
        minimum_age: u8,
        overrides: HashMap<SkierId, PriorityClass>,
    }

    impl FixedEntitlements {
        /// Standard day passes valid for `valid_for_minutes`
        #[must_use]
        pub fn standard(valid_for_minutes: u32) -> Self {
            Self {
                class: PriorityClass::Standard,
                valid_for_minutes,
                minimum_age: 0,
                overrides: HashMap::new(),
            }
        }

        /// VIP day passes valid for `valid_for_minutes`
        #[must_use]
        pub fn vip(valid_for_minutes: u32) -> Self {
            Self {
                class: PriorityClass::Vip,
                ..Self::standard(valid_for_minutes)
            }
        }

        /// Issue `class` to `skier` instead of the default
        #[must_use]
        pub fn with_class(mut self, skier: SkierId, class: PriorityClass) -> Self {
            self.overrides.insert(skier, class);
            self
        }

        /// Refuse skiers younger than `age`
        #[must_use]
        pub const fn with_minimum_age(mut self, age: u8) -> Self {
            self.minimum_age = age;
            self
        }
    }

    impl EntitlementSource for FixedEntitlements {
        fn issue(&self, skier: SkierId, age: u8) -> Result<Entitlement, EntitlementRejected> {
            if age < self.minimum_age {
                return Err(EntitlementRejected::TooYoung {
                    skier,
                    age,
                    minimum: self.minimum_age,
                });
            }
            let class = self.overrides.get(&skier).copied().unwrap_or(self.class);
            Ok(Entitlement::new(
                skier,
                class,
                PassKind::Day,
                self.valid_for_minutes,
            ))
        }
    }

    /// Statistics sink that keeps every event in order
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<RideEvent>>,
    }

    impl RecordingSink {
        /// Empty sink
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every recorded event, oldest first
        #[must_use]
        pub fn events(&self) -> Vec<RideEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Events recorded for `skier`
        #[must_use]
        pub fn rides_of(&self, skier: SkierId) -> Vec<RideEvent> {
            self.events()
                .into_iter()
                .filter(|event| event.skier == skier)
                .collect()
        }
    }

    impl StatisticsSink for RecordingSink {
        fn record(&self, event: RideEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use chairlift_core::config::{
        CapacityConfig, PopulationConfig, RideConfig, SessionConfig, ShutdownConfig,
        SimulationConfig, StaffConfig,
    };
    use chairlift_core::entitlement::{Entitlement, PassKind, PriorityClass};
    use chairlift_core::environment::Clock;
    use chairlift_core::stats::StatisticsSink;
    use chairlift_core::{Skier, SkierId};
    use chairlift_runtime::Resort;
    use std::sync::Arc;

    /// Small, fast configuration for tests on virtual time
    ///
    /// One simulated hour of 60 ticks at 100ms, tiny capacities, quick rides,
    /// no workers, and short shutdown delays.
    #[must_use]
    pub fn test_config() -> SimulationConfig {
        SimulationConfig {
            session: SessionConfig {
                opening_hour: 8,
                closing_hour: 9,
                minutes_per_tick: 1,
                tick_interval_ms: 100,
            },
            population: PopulationConfig {
                skiers: 10,
                arrival_jitter_ms: 20,
                max_dependents_per_guardian: 2,
                seed: Some(7),
            },
            capacity: CapacityConfig {
                gates: 2,
                platform: 4,
                chairs: 2,
                seats_per_chair: 1,
                vip_chairs: 1,
            },
            ride: RideConfig {
                ascent_ticks: 5,
                ascent_tick_ms: 10,
                descent_ms: [20, 40, 60],
            },
            staff: StaffConfig {
                workers: 0,
                stop_probability: 0.0,
                poll_interval_ms: 100,
                outage_ms: 200,
            },
            shutdown: ShutdownConfig {
                grace_ms: 50,
                drain_poll_ms: 10,
                task_timeout_ms: 500,
            },
        }
    }

    /// Build a resort for `config` around the given seams
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn resort(
        config: &SimulationConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn StatisticsSink>,
    ) -> Arc<Resort> {
        Arc::new(Resort::new(config, clock, sink))
    }

    /// Let every runnable task make progress without advancing time
    ///
    /// Useful on a paused runtime before asserting on shared state.
    pub async fn settle() {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    /// Install a test subscriber honouring `RUST_LOG`
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Adult skier with id `id`
    #[must_use]
    pub const fn adult(id: u32) -> Skier {
        Skier::new(SkierId(id), 30)
    }

    /// Day pass of the given class
    #[must_use]
    pub const fn pass(id: u32, class: PriorityClass, valid_for_minutes: u32) -> Entitlement {
        Entitlement::new(SkierId(id), class, PassKind::Day, valid_for_minutes)
    }
}

/// Property-based testing utilities
///
/// Strategies for domain types, for use with `proptest!`.
pub mod properties {
    use chairlift_core::lift::{LiftAction, Operator};
    use chairlift_core::station::StationAction;
    use proptest::prelude::*;

    /// Any operator
    pub fn operator() -> impl Strategy<Value = Operator> {
        prop_oneof![
            (1u8..=4).prop_map(Operator::Worker),
            Just(Operator::Console),
            Just(Operator::Coordinator),
        ]
    }

    /// Routine requests and shutdown, excluding the permanent halt
    pub fn lift_action() -> impl Strategy<Value = LiftAction> {
        prop_oneof![
            operator().prop_map(|by| LiftAction::RequestStop { by }),
            operator().prop_map(|by| LiftAction::RequestResume { by }),
            Just(LiftAction::BeginShutdown),
        ]
    }

    /// Station actions a well-behaved skier population could issue
    ///
    /// Counter underflows are filtered by the caller, who knows the state.
    pub fn station_action() -> impl Strategy<Value = StationAction> {
        prop_oneof![
            Just(StationAction::JoinQueue),
            Just(StationAction::LeaveQueue),
            Just(StationAction::EnterPlatform),
            Just(StationAction::LeavePlatform),
            Just(StationAction::Close),
        ]
    }

    /// `(capacity, holders, hold_ms)` triples for capacity-gate stress tests
    pub fn capacity_scenario() -> impl Strategy<Value = (usize, usize, Vec<u64>)> {
        (1usize..=6, 1usize..=24).prop_flat_map(|(capacity, holders)| {
            (
                Just(capacity),
                Just(holders),
                proptest::collection::vec(0u64..50, holders),
            )
        })
    }
}

// Re-export commonly used items
pub use mocks::{FixedEntitlements, ManualClock, RecordingSink, test_clock};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chairlift_core::{GateId, Route};

    #[test]
    fn test_manual_clock() {
        let clock = test_clock();
        clock.advance(30);
        clock.advance(15);
        assert_eq!(clock.minutes_elapsed(), 45);
    }

    #[test]
    fn test_fixed_entitlements() {
        let source = FixedEntitlements::standard(60)
            .with_class(SkierId(2), PriorityClass::Vip)
            .with_minimum_age(4);

        let standard = source.issue(SkierId(1), 30).unwrap();
        assert_eq!(standard.class(), PriorityClass::Standard);
        assert_eq!(standard.valid_for_minutes(), 60);

        assert_eq!(source.issue(SkierId(2), 30).unwrap().class(), PriorityClass::Vip);
        assert!(source.issue(SkierId(3), 3).is_err());
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.record(RideEvent {
            skier: SkierId(1),
            gate: GateId(0),
            route: Route::T2,
            completed_rides: 1,
            class: PriorityClass::Standard,
        });

        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.rides_of(SkierId(1)).len(), 1);
        assert!(sink.rides_of(SkierId(2)).is_empty());
    }

    #[test]
    fn test_config_is_valid() {
        helpers::test_config().validate().unwrap();
    }
}
