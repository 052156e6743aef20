//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use chairlift_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Several actions may be given; they are applied in order and only the
/// effects of the last one are checked.
///
/// # Example
///
/// ```
/// use chairlift_core::lift::{LiftAction, LiftReducer, LiftState, Operator};
/// use chairlift_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(LiftReducer)
///     .with_env(())
///     .given_state(LiftState::default())
///     .when_action(LiftAction::RequestStop { by: Operator::Worker(1) })
///     .when_action(LiftAction::RequestStop { by: Operator::Worker(2) })
///     .then_state(|state| {
///         assert_eq!(state.stopped_by, Some(Operator::Worker(1)));
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: Option<R::Environment>,
    initial_state: Option<R::State>,
    actions: Vec<R::Action>,
    state_assertions: Vec<StateAssertion<R::State>>,
    effect_assertions: Vec<EffectAssertion>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to apply (When)
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(!self.actions.is_empty(), "Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use chairlift_core::effect::Effect;

    /// Assert that the transition was rejected and wakes nobody
    ///
    /// # Panics
    ///
    /// Panics if any effect asks for a wake-up.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            !Effect::wakes(effects),
            "Expected no wake-up, but found {effects:?}"
        );
    }

    /// Assert that the transition wakes every waiter
    ///
    /// # Panics
    ///
    /// Panics if no effect asks for a wake-up.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_wakes(effects: &[Effect]) {
        assert!(
            Effect::wakes(effects),
            "Expected a wake-up, but found {effects:?}"
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chairlift_core::lift::{LiftAction, LiftReducer, LiftState, Operator};
    use chairlift_core::station::{StationAction, StationReducer, StationState};

    #[test]
    fn test_reducer_test_stop() {
        ReducerTest::new(LiftReducer)
            .with_env(())
            .given_state(LiftState::default())
            .when_action(LiftAction::RequestStop { by: Operator::Worker(1) })
            .then_state(|state| {
                assert!(!state.running);
                assert!(state.draining);
            })
            .then_effects(assertions::assert_wakes)
            .run();
    }

    #[test]
    fn test_reducer_test_sequence() {
        ReducerTest::new(StationReducer)
            .with_env(())
            .given_state(StationState::default())
            .when_action(StationAction::JoinQueue)
            .when_action(StationAction::EnterPlatform)
            .when_action(StationAction::Close)
            .then_state(|state| {
                assert_eq!((state.in_queue, state.on_platform), (0, 1));
                assert!(!state.is_drained());
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects(&[Effect::None]);
        assertions::assert_no_effects(&[]);
    }

    #[test]
    #[should_panic(expected = "Expected a wake-up")]
    fn test_assert_wakes_fails_on_none() {
        assertions::assert_wakes(&[Effect::None]);
    }
}
