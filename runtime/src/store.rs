//! Store runtime for the global state machines.
//!
//! A [`Store`] owns one reducer's state behind a `tokio::sync::watch` channel.
//! The channel's lock is the single exclusion lock for that state, and its
//! change notification is the broadcast wake-up: every transition a reducer
//! reports with [`Effect::WakeAll`] wakes every parked waiter, which then
//! re-evaluates its own predicate.

use crate::error::StoreError;
use chairlift_core::{effect::Effect, reducer::Reducer};
use smallvec::SmallVec;
use tokio::sync::watch;

/// The Store - runtime coordinator for a reducer
///
/// # Example
///
/// ```
/// use chairlift_core::lift::{LiftAction, LiftReducer, LiftState, Operator};
/// use chairlift_runtime::store::Store;
///
/// let store = Store::new(LiftState::default(), LiftReducer, ());
/// store.send(LiftAction::RequestStop { by: Operator::Console });
/// assert!(!store.state(|s| s.running));
/// ```
pub struct Store<R: Reducer> {
    state: watch::Sender<R::State>,
    reducer: R,
    environment: R::Environment,
}

impl<R: Reducer> Store<R> {
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
        let (state, _) = watch::channel(initial_state);
        Self {
            state,
            reducer,
            environment,
        }
    }

    /// Apply an action under the state lock
    ///
    /// Waiters are notified only when the reducer asks for a wake-up, so a
    /// rejected request (a stop while already stopped, for example) is
    /// invisible to them.
    ///
    /// # Panics
    ///
    /// Propagates reducer assertions (resource-protocol violations).
    pub fn send(&self, action: R::Action) -> SmallVec<[Effect; 4]> {
        let mut effects = SmallVec::new();
        self.state.send_if_modified(|state| {
            effects = self.reducer.reduce(state, action, &self.environment);
            Effect::wakes(&effects)
        });
        effects
    }

    /// Read a projection of the current state
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&R::State) -> T,
    {
        f(&self.state.borrow())
    }

    /// Park until `predicate` holds, then return a projection of that state
    ///
    /// The predicate is checked immediately and again after every broadcast,
    /// so a stale or spurious wake-up simply parks the task again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] if the store is dropped while waiting.
    pub async fn wait_until<P, F, T>(&self, mut predicate: P, project: F) -> Result<T, StoreError>
    where
        P: FnMut(&R::State) -> bool,
        F: FnOnce(&R::State) -> T,
    {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| StoreError::Closed)?;
        Ok(project(&state))
    }

    /// Number of tasks currently parked on this store
    #[must_use]
    pub fn waiters(&self) -> usize {
        self.state.receiver_count()
    }
}
