//! Station state: the open flag and the in-flight counters.
//!
//! A skier is *in queue* from the moment it starts an admission handshake
//! until it holds a platform slot, and *on platform* from then until it has
//! released its chair and platform slots. The station is drained once it is
//! closed and both counters are zero.

use crate::effect::Effect;
use crate::reducer::Reducer;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Global station state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationState {
    /// Admitting new rides
    pub open: bool,
    /// Skiers between admission and platform entry
    pub in_queue: u32,
    /// Skiers holding a platform slot
    pub on_platform: u32,
}

impl Default for StationState {
    fn default() -> Self {
        Self {
            open: true,
            in_queue: 0,
            on_platform: 0,
        }
    }
}

impl StationState {
    /// Skiers currently queued or on the platform
    #[must_use]
    pub const fn in_flight(&self) -> u32 {
        self.in_queue + self.on_platform
    }

    /// Closed with nobody left in flight
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        !self.open && self.in_flight() == 0
    }
}

/// Station transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationAction {
    /// Stop admitting new rides
    Close,
    /// A skier starts its admission handshake; refused once closed
    JoinQueue,
    /// A queued skier gives up before reaching the platform
    LeaveQueue,
    /// A queued skier obtained a platform slot
    EnterPlatform,
    /// A skier released its platform slot
    LeavePlatform,
}

/// Reducer for [`StationState`]
///
/// # Panics
///
/// Decrementing a counter that is already zero means a skier left a place it
/// never entered. That is a resource-protocol violation and panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationReducer;

impl Reducer for StationReducer {
    type State = StationState;
    type Action = StationAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect; 4]> {
        match action {
            StationAction::Close => {
                if !state.open {
                    return smallvec![Effect::None];
                }
                state.open = false;
            },
            StationAction::JoinQueue => {
                if !state.open {
                    return smallvec![Effect::None];
                }
                state.in_queue += 1;
            },
            StationAction::LeaveQueue => {
                assert!(state.in_queue > 0, "skier left an empty admission queue");
                state.in_queue -= 1;
            },
            StationAction::EnterPlatform => {
                assert!(state.in_queue > 0, "skier entered the platform without queueing");
                state.in_queue -= 1;
                state.on_platform += 1;
            },
            StationAction::LeavePlatform => {
                assert!(state.on_platform > 0, "skier left an empty platform");
                state.on_platform -= 1;
            },
        }
        smallvec![Effect::WakeAll]
    }
}
