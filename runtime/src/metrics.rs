//! Prometheus metrics for the simulated day.
//!
//! Every component records through the `metrics` facade. Without an installed
//! recorder the macros are no-ops, so tests never need one; the binary installs
//! a [`MetricsRecorder`] and renders the exposition at the end of the day.
//!
//! # Example
//!
//! ```rust,no_run
//! use chairlift_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = MetricsRecorder::install()?;
//! // ... run the simulation ...
//! if let Some(rendered) = recorder.render() {
//!     println!("{rendered}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Completed rides, labelled by priority class
pub const RIDES_COMPLETED: &str = "chairlift_rides_completed_total";
/// Skiers refused before touching any resource
pub const ADMISSION_REJECTIONS: &str = "chairlift_admission_rejections_total";
/// Hand-offs per admission gate
pub const GATE_PASSES: &str = "chairlift_gate_passes_total";
/// Applied routine lift stops
pub const LIFT_STOPS: &str = "chairlift_lift_stops_total";
/// Applied routine lift resumes
pub const LIFT_RESUMES: &str = "chairlift_lift_resumes_total";
/// Ascent ticks lost to a stopped lift
pub const ASCENT_STALLED_TICKS: &str = "chairlift_ascent_stalled_ticks_total";
/// Slots currently held, labelled by pool
pub const CAPACITY_OUTSTANDING: &str = "chairlift_capacity_outstanding";
/// Time spent waiting for a slot, labelled by pool
pub const CAPACITY_WAIT: &str = "chairlift_capacity_wait_duration_seconds";
/// Skiers between admission and the platform
pub const STATION_IN_QUEUE: &str = "chairlift_station_in_queue";
/// Skiers on the platform
pub const STATION_ON_PLATFORM: &str = "chairlift_station_on_platform";
/// Skiers that left the station, labelled by reason
pub const SKIERS_FINISHED: &str = "chairlift_skiers_finished_total";
/// Time from station close to a drained station
pub const SHUTDOWN_DRAIN: &str = "chairlift_shutdown_drain_duration_seconds";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed, this logs a warning and returns a
    /// recorder that renders nothing.
    pub fn install() -> Result<Self, MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                tracing::debug!("Prometheus recorder installed");
                Ok(Self {
                    handle: Some(handle),
                })
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(Self { handle: None })
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(RIDES_COMPLETED, "Total number of completed rides");
    describe_counter!(
        ADMISSION_REJECTIONS,
        "Total number of skiers refused at the eligibility check"
    );
    describe_counter!(GATE_PASSES, "Total number of admission gate hand-offs");

    describe_counter!(LIFT_STOPS, "Total number of routine lift stops");
    describe_counter!(LIFT_RESUMES, "Total number of routine lift resumes");
    describe_counter!(
        ASCENT_STALLED_TICKS,
        "Total number of ascent ticks lost to a stopped lift"
    );

    describe_gauge!(CAPACITY_OUTSTANDING, "Slots currently held per capacity pool");
    describe_histogram!(CAPACITY_WAIT, "Time spent waiting for a capacity slot");

    describe_gauge!(STATION_IN_QUEUE, "Skiers between admission and the platform");
    describe_gauge!(STATION_ON_PLATFORM, "Skiers holding a platform slot");
    describe_counter!(SKIERS_FINISHED, "Total number of skiers that left the station");

    describe_histogram!(SHUTDOWN_DRAIN, "Time from station close until drained");
}

/// Capacity pool metrics recorder.
pub struct CapacityMetrics;

impl CapacityMetrics {
    /// Record the current number of held slots.
    #[allow(clippy::cast_precision_loss)] // Slot counts are far below 2^52
    pub fn record_outstanding(pool: &'static str, outstanding: usize) {
        gauge!(CAPACITY_OUTSTANDING, "pool" => pool).set(outstanding as f64);
    }

    /// Record how long an acquisition waited.
    pub fn record_wait(pool: &'static str, waited: Duration) {
        histogram!(CAPACITY_WAIT, "pool" => pool).record(waited.as_secs_f64());
    }
}

/// Station metrics recorder.
pub struct StationMetrics;

impl StationMetrics {
    /// Record the in-flight counters.
    pub fn record_counts(in_queue: u32, on_platform: u32) {
        gauge!(STATION_IN_QUEUE).set(f64::from(in_queue));
        gauge!(STATION_ON_PLATFORM).set(f64::from(on_platform));
    }

    /// Record the time the station took to drain.
    pub fn record_drain(duration: Duration) {
        histogram!(SHUTDOWN_DRAIN).record(duration.as_secs_f64());
    }
}

/// Ride pipeline metrics recorder.
pub struct RideMetrics;

impl RideMetrics {
    /// Record a completed ride.
    pub fn record_ride(class: chairlift_core::PriorityClass) {
        counter!(RIDES_COMPLETED, "class" => class.to_string()).increment(1);
    }

    /// Record an admission gate hand-off.
    pub fn record_gate_pass(gate: chairlift_core::GateId) {
        counter!(GATE_PASSES, "gate" => gate.to_string()).increment(1);
    }

    /// Record ticks lost to a stopped lift.
    pub fn record_stalled_ticks(ticks: u32) {
        counter!(ASCENT_STALLED_TICKS).increment(u64::from(ticks));
    }

    /// Record an eligibility rejection.
    pub fn record_rejection() {
        counter!(ADMISSION_REJECTIONS).increment(1);
    }

    /// Record a skier leaving the station.
    pub fn record_finished(reason: &'static str) {
        counter!(SKIERS_FINISHED, "reason" => reason).increment(1);
    }
}

/// Lift metrics recorder.
pub struct LiftMetrics;

impl LiftMetrics {
    /// Record an applied routine stop.
    pub fn record_stop() {
        counter!(LIFT_STOPS).increment(1);
    }

    /// Record an applied routine resume.
    pub fn record_resume() {
        counter!(LIFT_RESUMES).increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chairlift_core::{GateId, PriorityClass};

    #[test]
    fn test_recorder_renders_recorded_metrics() {
        let recorder = MetricsRecorder::install().unwrap();

        RideMetrics::record_ride(PriorityClass::Vip);
        RideMetrics::record_gate_pass(GateId(0));
        LiftMetrics::record_stop();
        CapacityMetrics::record_outstanding("platform", 3);

        // Another test binary thread may have installed the recorder first
        if let Some(rendered) = recorder.render() {
            assert!(rendered.contains(RIDES_COMPLETED));
            assert!(rendered.contains("class=\"vip\""));
            assert!(rendered.contains(LIFT_STOPS));
            assert!(rendered.contains(CAPACITY_OUTSTANDING));
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        StationMetrics::record_counts(1, 2);
        StationMetrics::record_drain(Duration::from_millis(5));
        RideMetrics::record_finished("expired");
    }
}
