//! Lift handle: routine stop/resume, shutdown, and the running wait point.

use crate::error::LiftError;
use crate::metrics::LiftMetrics;
use crate::store::Store;
use chairlift_core::effect::Effect;
use chairlift_core::lift::{LiftAction, LiftReducer, LiftState, Operator};
use std::sync::Arc;

/// Shared lift state
///
/// Cloning yields another handle to the same lift.
#[derive(Clone)]
pub struct Lift {
    store: Arc<Store<LiftReducer>>,
}

impl Default for Lift {
    fn default() -> Self {
        Self::new()
    }
}

impl Lift {
    /// Running lift
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(Store::new(LiftState::default(), LiftReducer, ())),
        }
    }

    /// Routine stop
    ///
    /// Idempotent: returns `false` and changes nothing if the lift is already
    /// stopped, the station is shutting down, or the lift is halted.
    pub fn request_stop(&self, by: Operator) -> bool {
        let applied = self.apply(LiftAction::RequestStop { by });
        if applied {
            LiftMetrics::record_stop();
            tracing::warn!(operator = %by, "Lift stopped");
        } else {
            tracing::debug!(operator = %by, "Stop request ignored");
        }
        applied
    }

    /// Routine resume
    ///
    /// Idempotent: returns `false` and changes nothing if the lift is already
    /// running, the station is shutting down, or the lift is halted.
    pub fn request_resume(&self, by: Operator) -> bool {
        let applied = self.apply(LiftAction::RequestResume { by });
        if applied {
            LiftMetrics::record_resume();
            tracing::info!(operator = %by, "Lift resumed");
        } else {
            tracing::debug!(operator = %by, "Resume request ignored");
        }
        applied
    }

    /// Enter shutdown: ignore routine requests and keep running until halted
    pub fn begin_shutdown(&self) -> bool {
        let applied = self.apply(LiftAction::BeginShutdown);
        if applied {
            tracing::info!("Lift running until the station drains");
        }
        applied
    }

    /// Permanent stop
    pub fn halt(&self) -> bool {
        let applied = self.apply(LiftAction::Halt);
        if applied {
            tracing::info!("Lift halted for the day");
        }
        applied
    }

    /// Whether chairs are moving
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.store.state(|s| s.running)
    }

    /// Whether the lift has been halted for the day
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.store.state(|s| s.halted)
    }

    /// Full state snapshot
    #[must_use]
    pub fn state(&self) -> LiftState {
        self.store.state(|s| *s)
    }

    /// Park until the lift runs
    ///
    /// Every wake-up re-checks the state, so a stop that lands between a
    /// resume and this task being scheduled parks it again.
    ///
    /// # Errors
    ///
    /// Returns [`LiftError::Halted`] if the lift is, or becomes, halted.
    pub async fn wait_until_running(&self) -> Result<(), LiftError> {
        let halted = self
            .store
            .wait_until(LiftState::admits_boarding, |s| s.halted)
            .await?;
        if halted { Err(LiftError::Halted) } else { Ok(()) }
    }

    /// Tasks currently parked on the lift
    #[must_use]
    pub fn waiters(&self) -> usize {
        self.store.waiters()
    }

    fn apply(&self, action: LiftAction) -> bool {
        Effect::wakes(&self.store.send(action))
    }
}
