//! Lift state machine.
//!
//! The lift is either running or stopped. Workers and operators pause and
//! resume it at any time, including while skiers are mid-ascent. Shutdown is
//! the only path to a permanent stop:
//!
//! ```text
//!             RequestStop                 RequestResume
//!   RUNNING ─────────────▶ STOPPED ─────────────────────▶ RUNNING
//!      │                      │
//!      │ BeginShutdown        │ BeginShutdown (resumes so the station can drain)
//!      ▼                      ▼
//!   CLOSING (stop/resume requests ignored) ──Halt──▶ HALTED
//! ```
//!
//! Every applied transition asks the runtime to wake all waiters; a rejected
//! request changes nothing and wakes nobody.

use crate::effect::Effect;
use crate::reducer::Reducer;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Who asked for a lift transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Station worker with the given number
    Worker(u8),
    /// External operator control (signal, console)
    Console,
    /// Shutdown coordinator
    Coordinator,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker(id) => write!(f, "worker #{id}"),
            Self::Console => write!(f, "console"),
            Self::Coordinator => write!(f, "shutdown coordinator"),
        }
    }
}

/// Global lift state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // Each flag is an independent part of the protocol
pub struct LiftState {
    /// Chairs are moving
    pub running: bool,
    /// A routine stop is in progress and awaits its resume
    pub draining: bool,
    /// Shutdown has begun; routine stop/resume requests are ignored
    pub closing: bool,
    /// Permanently stopped
    pub halted: bool,
    /// Who issued the current stop, if stopped
    pub stopped_by: Option<Operator>,
    /// Number of routine stops so far
    pub stops: u32,
}

impl Default for LiftState {
    fn default() -> Self {
        Self {
            running: true,
            draining: false,
            closing: false,
            halted: false,
            stopped_by: None,
            stops: 0,
        }
    }
}

impl LiftState {
    /// Predicate every lift wait point parks on
    ///
    /// Waiters resume when the lift runs again or when it has been halted (in
    /// which case they abandon the ride).
    #[must_use]
    pub const fn admits_boarding(&self) -> bool {
        self.running || self.halted
    }
}

/// Lift transition requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftAction {
    /// Routine stop; ignored when already stopped, closing, or halted
    RequestStop {
        /// Requesting party
        by: Operator,
    },
    /// Routine resume; ignored unless stopped and not closing
    RequestResume {
        /// Requesting party
        by: Operator,
    },
    /// Station closed: stop honouring routine requests and run until drained
    BeginShutdown,
    /// Permanent stop, issued once the station has drained
    Halt,
}

/// Reducer for [`LiftState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LiftReducer;

impl Reducer for LiftReducer {
    type State = LiftState;
    type Action = LiftAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect; 4]> {
        match action {
            LiftAction::RequestStop { by } => {
                if !state.running || state.draining || state.closing || state.halted {
                    return smallvec![Effect::None];
                }
                state.running = false;
                state.draining = true;
                state.stopped_by = Some(by);
                state.stops += 1;
                smallvec![Effect::WakeAll]
            },
            LiftAction::RequestResume { .. } => {
                if state.running || state.closing || state.halted {
                    return smallvec![Effect::None];
                }
                state.running = true;
                state.draining = false;
                state.stopped_by = None;
                smallvec![Effect::WakeAll]
            },
            LiftAction::BeginShutdown => {
                if state.closing || state.halted {
                    return smallvec![Effect::None];
                }
                state.closing = true;
                state.running = true;
                state.draining = false;
                state.stopped_by = None;
                smallvec![Effect::WakeAll]
            },
            LiftAction::Halt => {
                if state.halted {
                    return smallvec![Effect::None];
                }
                state.closing = true;
                state.halted = true;
                state.running = false;
                state.draining = false;
                state.stopped_by = Some(Operator::Coordinator);
                smallvec![Effect::WakeAll]
            },
        }
    }
}
