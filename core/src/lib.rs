//! # Chairlift Core
//!
//! Domain types and pure state machines for the chairlift simulation.
//!
//! This crate holds everything about the resort that can be expressed without
//! a scheduler: identifiers, entitlements, guardianship rules, descent routes,
//! ride events, configuration, and the two global state machines (the lift and
//! the station) written as reducers.
//!
//! ## Core Concepts
//!
//! - **State**: Owned data for one global concern (`LiftState`, `StationState`)
//! - **Action**: Every transition a task may request on that state
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: What the runtime must do after the transition (wake waiters or nothing)
//! - **Environment**: Injected collaborators (`Clock`, `EntitlementSource`, `StatisticsSink`)
//!
//! The async half lives in `chairlift-runtime`, which keeps each state behind a
//! single lock and broadcasts to parked tasks whenever a reducer asks for it.
//!
//! ## Example
//!
//! ```
//! use chairlift_core::lift::{LiftAction, LiftReducer, LiftState, Operator};
//! use chairlift_core::reducer::Reducer;
//! use chairlift_core::effect::Effect;
//!
//! let mut state = LiftState::default();
//! let effects = LiftReducer.reduce(
//!     &mut state,
//!     LiftAction::RequestStop { by: Operator::Worker(1) },
//!     &(),
//! );
//! assert!(!state.running);
//! assert!(Effect::wakes(&effects));
//! ```

pub use smallvec::{smallvec, SmallVec};

pub mod config;
pub mod entitlement;
pub mod lift;
pub mod route;
pub mod skier;
pub mod station;
pub mod stats;

pub use config::{ConfigError, SimulationConfig};
pub use entitlement::{Entitlement, EntitlementRejected, EntitlementSource, PassKind, PriorityClass};
pub use route::Route;
pub use skier::{AdmissionRejection, GateId, GuardianRegistry, Guardianship, Skier, SkierId};
pub use stats::{Diagnostics, RideEvent, StatisticsSink};

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never block and never touch a lock; the runtime applies them under the
/// lock that protects the state and acts on the returned effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for global state machines
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The transition requests this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for StationReducer {
    ///     type State = StationState;
    ///     type Action = StationAction;
    ///     type Environment = ();
    ///
    ///     fn reduce(&self, state: &mut StationState, action: StationAction, _env: &())
    ///         -> SmallVec<[Effect; 4]>
    ///     {
    ///         match action {
    ///             StationAction::Close => { state.open = false; smallvec![Effect::WakeAll] }
    ///             _ => smallvec![Effect::None],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Checks whether the transition applies to the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions for the runtime
        ///
        /// A request that does not apply (a stop while already stopped, for
        /// example) must leave the state untouched and return `Effect::None`.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect; 4]>;
    }
}

/// Effect module - What the runtime does after a transition
pub mod effect {
    /// Effect description returned by reducers
    ///
    /// Effects are NOT executed by the reducer. The runtime inspects them after
    /// the state has been updated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Effect {
        /// No-op: the action did not change anything observable
        None,

        /// Wake every task parked on this state so it re-checks its predicate
        WakeAll,
    }

    impl Effect {
        /// Whether any of the effects asks for a broadcast wake-up
        #[must_use]
        pub fn wakes(effects: &[Effect]) -> bool {
            effects.iter().any(|effect| matches!(effect, Effect::WakeAll))
        }
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::NaiveTime;

    /// Clock trait - the compressed simulated clock
    ///
    /// The simulation measures time in whole simulated minutes since the
    /// station opened. It is only used to expire entitlements and to close the
    /// station; ride phases are timed with real (or virtual, in tests) sleeps.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed minute for deterministic tests
    /// struct FrozenClock(u32);
    /// impl Clock for FrozenClock {
    ///     fn minutes_elapsed(&self) -> u32 {
    ///         self.0
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Simulated minutes since opening
        fn minutes_elapsed(&self) -> u32;
    }

    /// Local resort time for a number of minutes after opening
    ///
    /// Wraps around midnight, which a single ski day never reaches.
    #[must_use]
    pub fn resort_time(opening_hour: u8, minutes_elapsed: u32) -> NaiveTime {
        let opening = NaiveTime::from_hms_opt(u32::from(opening_hour) % 24, 0, 0)
            .unwrap_or(NaiveTime::MIN);
        opening + chrono::Duration::minutes(i64::from(minutes_elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::resort_time;
    use chrono::NaiveTime;

    #[test]
    fn test_effect_wakes() {
        assert!(!Effect::wakes(&[]));
        assert!(!Effect::wakes(&[Effect::None]));
        assert!(Effect::wakes(&[Effect::None, Effect::WakeAll]));
    }

    #[test]
    fn test_resort_time() {
        assert_eq!(resort_time(8, 0), NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN));
        assert_eq!(resort_time(8, 90), NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN));
    }
}
