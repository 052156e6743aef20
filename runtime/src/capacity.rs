//! Capacity gates: bounded slot pools.
//!
//! One gate guards the boarding platform, one the standard chairs and one the
//! VIP chairs. Each is a counting semaphore plus an outstanding counter that
//! can be observed from outside.
//!
//! ```text
//!   acquire ──▶ [permit] ──▶ outstanding += 1 ──▶ Slot
//!   Slot dropped ──▶ outstanding -= 1 ──▶ permit returned ──▶ next waiter
//! ```
//!
//! The counter is bumped only while the permit is held and decremented before
//! the permit goes back, so `outstanding <= capacity` holds at every instant.

use crate::error::CapacityError;
use crate::metrics::CapacityMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

struct Inner {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    capacity: usize,
    outstanding: AtomicUsize,
    peak: AtomicUsize,
}

/// Bounded pool of interchangeable slots
///
/// Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct CapacityGate {
    inner: Arc<Inner>,
}

impl CapacityGate {
    /// Create a pool with `capacity` slots
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero, or larger than
    /// [`chairlift_core::config::MAX_CAPACITY`].
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity gate {name} needs at least one slot");
        Self {
            inner: Arc::new(Inner {
                name,
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                outstanding: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Wait for a free slot
    ///
    /// Waiters are served in FIFO order.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::Closed`] if the gate is closed before or while
    /// waiting.
    pub async fn acquire(&self) -> Result<Slot, CapacityError> {
        let started = Instant::now();
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| CapacityError::Closed(self.inner.name))?;
        CapacityMetrics::record_wait(self.inner.name, started.elapsed());
        Ok(self.occupy(permit))
    }

    /// Take a free slot without waiting
    ///
    /// Returns `None` if every slot is held or the gate is closed.
    #[must_use]
    pub fn try_acquire(&self) -> Option<Slot> {
        Arc::clone(&self.inner.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| self.occupy(permit))
    }

    /// Stop handing out slots and fail every pending `acquire`
    ///
    /// Slots already held stay valid and are released normally.
    pub fn close(&self) {
        self.inner.semaphore.close();
        tracing::debug!(pool = self.inner.name, "Capacity gate closed");
    }

    /// Pool name used in logs and metrics
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Configured number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Slots currently held
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Slots currently free
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.semaphore.available_permits()
    }

    /// Highest number of slots ever held at once
    #[must_use]
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Acquire)
    }

    fn occupy(&self, permit: OwnedSemaphorePermit) -> Slot {
        let outstanding = self.inner.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        assert!(
            outstanding <= self.inner.capacity,
            "capacity gate {} over-committed: {outstanding} > {}",
            self.inner.name,
            self.inner.capacity
        );
        self.inner.peak.fetch_max(outstanding, Ordering::AcqRel);
        CapacityMetrics::record_outstanding(self.inner.name, outstanding);

        Slot {
            gate: self.clone(),
            permit: Some(permit),
        }
    }

    fn vacate(&self) {
        let previous = self.inner.outstanding.fetch_sub(1, Ordering::AcqRel);
        assert!(
            previous > 0,
            "capacity gate {} released more slots than were acquired",
            self.inner.name
        );
        CapacityMetrics::record_outstanding(self.inner.name, previous - 1);
    }
}

impl std::fmt::Debug for CapacityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapacityGate")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}

/// One held slot of a [`CapacityGate`]
///
/// Released exactly once, either explicitly with [`Slot::release`] or when
/// dropped.
#[must_use = "dropping a slot releases it immediately"]
pub struct Slot {
    gate: CapacityGate,
    permit: Option<OwnedSemaphorePermit>,
}

impl Slot {
    /// Give the slot back
    pub fn release(self) {
        drop(self);
    }

    /// Pool this slot belongs to
    #[must_use]
    pub fn pool(&self) -> &'static str {
        self.gate.name()
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            self.gate.vacate();
            drop(permit);
        }
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").field("pool", &self.pool()).finish()
    }
}
