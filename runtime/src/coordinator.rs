//! Shutdown coordinator.
//!
//! ```text
//!   station closed ──▶ lift enters shutdown (keeps running)
//!        │
//!        ▼
//!   poll in-flight counters until both are zero
//!        │
//!        ▼
//!   grace delay ──▶ still drained? ──no──▶ back to polling
//!        │ yes
//!        ▼
//!   lift halted (wakes every waiter) ──▶ shutdown broadcast to background tasks
//! ```
//!
//! Polling is the one place the simulation does not park on a wake-up: the
//! drain condition only ever resolves, so a bounded poll interval suffices.

use crate::error::StoreError;
use crate::lift::Lift;
use crate::metrics::StationMetrics;
use crate::station::Station;
use chairlift_core::config::ShutdownConfig;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// How the day ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Time from station close until the station was drained
    pub drain_wait: Duration,
    /// Drain polls that found skiers still in flight
    pub busy_polls: u32,
}

/// Drains the station, then stops the lift for good
pub struct ShutdownCoordinator {
    station: Station,
    lift: Lift,
    grace: Duration,
    poll: Duration,
    shutdown: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    /// Coordinator for `station` and `lift`
    #[must_use]
    pub fn new(station: Station, lift: Lift, config: &ShutdownConfig) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            station,
            lift,
            grace: config.grace(),
            poll: config.drain_poll(),
            shutdown,
        }
    }

    /// Receiver notified once the lift has halted
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Sender background tasks subscribe through
    #[must_use]
    pub const fn shutdown_sender(&self) -> &broadcast::Sender<()> {
        &self.shutdown
    }

    /// Wait for the station to close, drain it, and halt the lift
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] if the station state is dropped.
    pub async fn run(self) -> Result<ShutdownReport, StoreError> {
        self.station.wait_until_closed().await?;
        let closed_at = Instant::now();
        tracing::info!("Station closed, draining");
        self.lift.begin_shutdown();

        let mut busy_polls = 0;
        loop {
            busy_polls += self.wait_for_drain().await;
            tokio::time::sleep(self.grace).await;
            if self.station.state().is_drained() {
                break;
            }
            tracing::debug!("Skiers back in flight during grace delay");
        }

        let drain_wait = closed_at.elapsed();
        StationMetrics::record_drain(drain_wait);

        self.lift.halt();
        // No receivers simply means nothing is left to notify
        let _ = self.shutdown.send(());
        tracing::info!(drain_ms = drain_wait.as_millis(), "Station drained, lift halted");

        Ok(ShutdownReport {
            drain_wait,
            busy_polls,
        })
    }

    async fn wait_for_drain(&self) -> u32 {
        let mut busy_polls = 0;
        loop {
            let state = self.station.state();
            if state.is_drained() {
                return busy_polls;
            }
            tracing::debug!(
                in_queue = state.in_queue,
                on_platform = state.on_platform,
                "Waiting for skiers to leave"
            );
            busy_polls += 1;
            tokio::time::sleep(self.poll).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chairlift_core::lift::Operator;

    fn config() -> ShutdownConfig {
        ShutdownConfig {
            grace_ms: 500,
            drain_poll_ms: 100,
            task_timeout_ms: 1000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_halts_only_after_drain() {
        let station = Station::new();
        let lift = Lift::new();
        let coordinator = ShutdownCoordinator::new(station.clone(), lift.clone(), &config());
        let mut notified = coordinator.subscribe();
        let task = tokio::spawn(coordinator.run());

        let place = station.join_queue().unwrap().enter_platform();
        station.close();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!lift.is_halted());
        assert!(lift.is_running());

        drop(place);
        let report = task.await.unwrap().unwrap();

        assert!(lift.is_halted());
        assert!(report.busy_polls >= 30);
        assert!(report.drain_wait >= Duration::from_millis(3500));
        notified.recv().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_resumes_paused_lift_for_drain() {
        let station = Station::new();
        let lift = Lift::new();
        lift.request_stop(Operator::Worker(1));

        let coordinator = ShutdownCoordinator::new(station.clone(), lift.clone(), &config());
        let task = tokio::spawn(coordinator.run());
        let place = station.join_queue().unwrap();
        station.close();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(lift.is_running());
        assert!(!lift.request_stop(Operator::Worker(2)));

        drop(place);
        task.await.unwrap().unwrap();
        assert!(lift.is_halted());
    }
}
