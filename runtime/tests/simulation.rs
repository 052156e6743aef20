//! Whole simulated days on virtual time.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chairlift_core::{PriorityClass, RideEvent, SkierId, StatisticsSink};
use chairlift_runtime::{ExitReason, RideLedger, Simulation, SimulationError};
use chairlift_testing::{FixedEntitlements, RecordingSink, helpers};
use std::sync::Arc;
use std::time::Duration;

/// Sink whose backing store is gone
struct UnavailableSink;

impl StatisticsSink for UnavailableSink {
    #[allow(clippy::panic)] // Simulates a failing skier task
    fn record(&self, event: RideEvent) {
        panic!("statistics store unavailable for {}", event.skier);
    }
}

#[tokio::test(start_paused = true)]
async fn test_short_day_with_workers() {
    helpers::init_tracing();
    let mut config = helpers::test_config();
    config.staff.workers = 2;
    config.staff.stop_probability = 0.3;

    let tickets = FixedEntitlements::standard(config.session.session_minutes())
        .with_class(SkierId(0), PriorityClass::Vip)
        .with_class(SkierId(3), PriorityClass::Vip);
    let sink = Arc::new(RecordingSink::new());

    let simulation = Simulation::new(config, Arc::new(tickets), sink.clone()).unwrap();
    let control = simulation.control();
    let summary = simulation.run().await.unwrap();

    assert_eq!(summary.outcomes.len(), 10);
    assert_eq!(summary.tickets_refused, 0);
    assert_eq!(summary.simulated_minutes, 60);
    assert_eq!(usize::try_from(summary.total_rides()).unwrap(), sink.events().len());
    assert!(summary.total_rides() > 0);

    assert!(summary.platform_peak <= 4);
    assert!(summary.chairs_peak <= 2);
    assert!(summary.vip_chairs_peak <= 1);
    assert!(summary.gate_passes >= summary.total_rides());
    assert_eq!(summary.workers.len(), 2);

    for outcome in &summary.outcomes {
        if matches!(outcome.exit, ExitReason::Rejected(_)) {
            assert_eq!(outcome.rides, 0);
        }
    }
    for event in sink.events() {
        let expected = if event.skier == SkierId(0) || event.skier == SkierId(3) {
            PriorityClass::Vip
        } else {
            PriorityClass::Standard
        };
        assert_eq!(event.class, expected);
    }

    let snapshot = control.snapshot();
    assert!(!snapshot.station_open);
    assert!(!snapshot.lift_running);
    assert_eq!(snapshot.actors_on_platform, 0);
    assert_eq!(snapshot.actors_in_lift_queue, 0);
}

#[tokio::test(start_paused = true)]
async fn test_early_close_drains_and_reports() {
    let mut config = helpers::test_config();
    config.population.arrival_jitter_ms = 0;
    let ledger = Arc::new(RideLedger::new());

    let simulation = Simulation::new(
        config,
        Arc::new(FixedEntitlements::standard(600)),
        ledger.clone(),
    )
    .unwrap();
    let control = simulation.control();
    let day = tokio::spawn(simulation.run());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(control.close_station());
    assert!(!control.close_station());

    let summary = day.await.unwrap().unwrap();
    assert!(summary.simulated_minutes < 60);
    for outcome in &summary.outcomes {
        assert!(matches!(
            outcome.exit,
            ExitReason::StationClosed | ExitReason::Rejected(_)
        ));
    }

    let report = ledger.report();
    assert_eq!(report.total_rides, summary.total_rides());
    assert_eq!(report.route_descents.iter().sum::<u64>(), summary.total_rides());
    assert_eq!(report.gate_entries.values().sum::<u64>(), summary.total_rides());
}

#[tokio::test(start_paused = true)]
async fn test_refused_tickets_are_counted() {
    let mut config = helpers::test_config();
    config.population.skiers = 20;

    // Arrivals are 4..=78; nobody under 79 gets a pass
    let tickets = FixedEntitlements::standard(60).with_minimum_age(79);
    let simulation =
        Simulation::new(config, Arc::new(tickets), Arc::new(RecordingSink::new())).unwrap();
    let summary = simulation.run().await.unwrap();

    assert_eq!(summary.tickets_refused, 20);
    assert!(summary.outcomes.is_empty());
    assert_eq!(summary.total_rides(), 0);
    assert_eq!(summary.gate_passes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_vip_only_day_never_touches_standard_chairs() {
    let simulation = Simulation::new(
        helpers::test_config(),
        Arc::new(FixedEntitlements::vip(60)),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();
    let summary = simulation.run().await.unwrap();

    assert!(summary.total_rides() > 0);
    assert_eq!(summary.chairs_peak, 0);
    assert_eq!(summary.vip_chairs_peak, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_skier_cancels_the_whole_day() {
    let metrics = tokio::runtime::Handle::current().metrics();
    let before = metrics.num_alive_tasks();

    let simulation = Simulation::new(
        helpers::test_config(),
        Arc::new(FixedEntitlements::standard(60)),
        Arc::new(UnavailableSink),
    )
    .unwrap();
    let control = simulation.control();
    let result = simulation.run().await;
    assert!(matches!(result, Err(SimulationError::ActorFailed(_))));
    assert!(!control.snapshot().station_open);
    drop(control);

    // Give aborted tasks time to be torn down
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(metrics.num_alive_tasks(), before);
}

#[tokio::test]
async fn test_invalid_config_is_refused() {
    let mut config = helpers::test_config();
    config.capacity.platform = 0;

    let result = Simulation::new(
        config,
        Arc::new(FixedEntitlements::standard(60)),
        Arc::new(RecordingSink::new()),
    );
    assert!(result.is_err());
}
