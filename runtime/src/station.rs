//! Station handle: the open flag and the in-flight counters.
//!
//! Counters move through RAII places so that every path out of the ride
//! pipeline (normal release, closed gate, halted lift, task abort) decrements
//! exactly what it incremented.

use crate::error::StoreError;
use crate::metrics::StationMetrics;
use crate::store::Store;
use chairlift_core::effect::Effect;
use chairlift_core::station::{StationAction, StationReducer, StationState};
use std::sync::Arc;

/// Shared station state
#[derive(Clone)]
pub struct Station {
    store: Arc<Store<StationReducer>>,
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}

impl Station {
    /// Open station with nobody in flight
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(Store::new(StationState::default(), StationReducer, ())),
        }
    }

    /// Stop admitting new rides
    ///
    /// Returns `true` if this call closed the station.
    pub fn close(&self) -> bool {
        let closed = Effect::wakes(&self.store.send(StationAction::Close));
        if closed {
            let (in_queue, on_platform) = self.counts();
            tracing::info!(in_queue, on_platform, "Station closed");
        }
        closed
    }

    /// Whether the station still admits rides
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.store.state(|s| s.open)
    }

    /// `(in_queue, on_platform)`
    #[must_use]
    pub fn counts(&self) -> (u32, u32) {
        self.store.state(|s| (s.in_queue, s.on_platform))
    }

    /// Full state snapshot
    #[must_use]
    pub fn state(&self) -> StationState {
        self.store.state(|s| *s)
    }

    /// Start an admission handshake
    ///
    /// Returns `None` once the station is closed; the check and the
    /// increment happen under the same lock.
    #[must_use]
    pub fn join_queue(&self) -> Option<QueuePlace> {
        if !self.apply(StationAction::JoinQueue) {
            return None;
        }
        Some(QueuePlace {
            station: self.clone(),
            active: true,
        })
    }

    /// Park until the station closes
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] if the station state is dropped.
    pub async fn wait_until_closed(&self) -> Result<(), StoreError> {
        self.store.wait_until(|s| !s.open, |_| ()).await
    }

    fn apply(&self, action: StationAction) -> bool {
        let applied = Effect::wakes(&self.store.send(action));
        if applied {
            let (in_queue, on_platform) = self.counts();
            StationMetrics::record_counts(in_queue, on_platform);
        }
        applied
    }
}

/// A skier counted in the admission queue
///
/// Dropping it leaves the queue.
#[must_use = "dropping a queue place leaves the queue"]
pub struct QueuePlace {
    station: Station,
    active: bool,
}

impl QueuePlace {
    /// Move from the queue onto the platform in one transition
    pub fn enter_platform(mut self) -> PlatformPlace {
        self.active = false;
        self.station.apply(StationAction::EnterPlatform);
        PlatformPlace {
            station: self.station.clone(),
        }
    }
}

impl Drop for QueuePlace {
    fn drop(&mut self) {
        if self.active {
            self.station.apply(StationAction::LeaveQueue);
        }
    }
}

/// A skier counted on the platform
///
/// Dropping it leaves the platform.
#[must_use = "dropping a platform place leaves the platform"]
pub struct PlatformPlace {
    station: Station,
}

impl Drop for PlatformPlace {
    fn drop(&mut self) {
        self.station.apply(StationAction::LeavePlatform);
    }
}
