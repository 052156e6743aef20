//! End-to-end tests of the ride pipeline against a shared resort.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use chairlift_core::config::SimulationConfig;
use chairlift_core::lift::Operator;
use chairlift_core::{AdmissionRejection, PriorityClass, Skier, SkierId};
use chairlift_runtime::{ExitReason, Resort, SkierActor, SkierOutcome};
use chairlift_testing::{ManualClock, RecordingSink, helpers};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

fn config(platform: usize, chairs: usize, vip_chairs: usize) -> SimulationConfig {
    let mut config = helpers::test_config();
    config.capacity.platform = platform;
    config.capacity.chairs = chairs;
    config.capacity.seats_per_chair = 1;
    config.capacity.vip_chairs = vip_chairs;
    config
}

fn spawn_skier(resort: &Arc<Resort>, skier: Skier, class: PriorityClass) -> JoinHandle<SkierOutcome> {
    let id = skier.id.0;
    let actor = SkierActor::new(skier, helpers::pass(id, class, 60), u64::from(id));
    tokio::spawn(actor.run(Arc::clone(resort)))
}

#[tokio::test(start_paused = true)]
async fn test_three_skiers_share_two_platform_slots_and_one_seat() {
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config(2, 1, 1), Arc::new(ManualClock::new()), sink.clone());

    let skiers: Vec<_> = (0..3)
        .map(|id| spawn_skier(&resort, helpers::adult(id), PriorityClass::Standard))
        .collect();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(resort.platform.outstanding() <= 2);
    assert!(resort.chairs.outstanding() <= 1);

    resort.station.close();
    let mut outcomes = Vec::new();
    for skier in skiers {
        outcomes.push(skier.await.unwrap());
    }

    assert_eq!(resort.platform.peak(), 2);
    assert_eq!(resort.chairs.peak(), 1);
    assert_eq!(resort.vip_chairs.peak(), 0);
    assert_eq!(resort.platform.outstanding(), 0);
    assert_eq!(resort.chairs.outstanding(), 0);
    assert_eq!(resort.station.counts(), (0, 0));

    let total: u32 = outcomes.iter().map(|o| o.rides).sum();
    assert_eq!(usize::try_from(total).unwrap(), sink.events().len());
    for outcome in &outcomes {
        assert_eq!(outcome.exit, ExitReason::StationClosed);
        assert!(outcome.rides > 0, "{} never rode", outcome.skier);
    }
}

#[tokio::test(start_paused = true)]
async fn test_third_skier_waits_in_queue_for_a_platform_slot() {
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config(2, 1, 1), clock.clone(), sink.clone());

    let skiers: Vec<_> = (0..3)
        .map(|id| {
            let actor = SkierActor::new(
                helpers::adult(id),
                helpers::pass(id, PriorityClass::Standard, 1),
                u64::from(id),
            );
            tokio::spawn(actor.run(Arc::clone(&resort)))
        })
        .collect();

    // First skier mid-ascent, second waiting for the seat, third queued
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(resort.station.counts(), (1, 2));
    assert_eq!(resort.platform.outstanding(), 2);
    assert_eq!(resort.chairs.outstanding(), 1);
    assert!(sink.events().is_empty());

    // Passes run out; every skier finishes the ride already started
    clock.set(1);
    for skier in skiers {
        let outcome = skier.await.unwrap();
        assert_eq!(outcome.exit, ExitReason::Expired);
        assert_eq!(outcome.rides, 1);
    }

    assert_eq!(sink.events().len(), 3);
    assert_eq!(resort.platform.peak(), 2);
    assert_eq!(resort.chairs.peak(), 1);
    assert_eq!(resort.platform.outstanding(), 0);
    assert_eq!(resort.chairs.outstanding(), 0);
    assert_eq!(resort.station.counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn test_closed_pools_turn_skiers_away() {
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config(1, 1, 1), Arc::new(ManualClock::new()), sink.clone());

    // The only platform slot is taken, so the skier waits on the pool
    let held = resort.platform.try_acquire().unwrap();
    let skier = spawn_skier(&resort, helpers::adult(4), PriorityClass::Standard);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(resort.station.counts(), (1, 0));

    resort.close_pools();
    let outcome = skier.await.unwrap();
    assert_eq!(outcome.exit, ExitReason::StationClosed);
    assert_eq!(outcome.rides, 0);
    assert_eq!(resort.station.counts(), (0, 0));

    drop(held);
    assert!(resort.chairs.acquire().await.is_err());
    assert!(resort.vip_chairs.try_acquire().is_none());
    assert!(sink.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_ascent_keeps_seat_and_freezes_progress() {
    let mut config = config(2, 1, 1);
    config.ride.ascent_tick_ms = 100;
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config, Arc::new(ManualClock::new()), sink.clone());

    let skier = spawn_skier(&resort, helpers::adult(1), PriorityClass::Standard);

    // Two ticks counted, third in progress
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(resort.lift.request_stop(Operator::Worker(1)));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(sink.events().is_empty());
    assert_eq!(resort.chairs.outstanding(), 1);
    assert_eq!(resort.platform.outstanding(), 1);
    assert_eq!(resort.station.counts(), (0, 1));

    assert!(resort.lift.request_resume(Operator::Worker(1)));
    tokio::time::sleep(Duration::from_millis(500)).await;

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].skier, SkierId(1));
    assert_eq!(events[0].completed_rides, 1);

    resort.station.close();
    let outcome = skier.await.unwrap();
    assert!(outcome.rides >= 1);
    assert_eq!(outcome.exit, ExitReason::StationClosed);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_child_touches_no_resource() {
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config(2, 1, 1), Arc::new(ManualClock::new()), sink.clone());

    let orphan = Skier::dependent(SkierId(5), 6, SkierId(99));
    let outcome = spawn_skier(&resort, orphan, PriorityClass::Standard).await.unwrap();

    assert_eq!(
        outcome.exit,
        ExitReason::Rejected(AdmissionRejection::GuardianUnavailable {
            skier: SkierId(5),
            guardian: SkierId(99),
        })
    );
    assert_eq!(outcome.rides, 0);
    assert_eq!(resort.platform.peak(), 0);
    assert_eq!(resort.chairs.peak(), 0);
    assert_eq!(resort.vip_chairs.peak(), 0);
    assert_eq!(resort.station.counts(), (0, 0));
    assert!(sink.events().is_empty());

    resort.station.close();
    assert_eq!(resort.gates.join().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_guardian_supervises_child_until_leaving() {
    let mut config = config(4, 2, 1);
    config.population.max_dependents_per_guardian = 1;
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config, Arc::new(ManualClock::new()), sink.clone());

    let guardian = spawn_skier(&resort, Skier::guardian(SkierId(0), 40), PriorityClass::Standard);
    helpers::settle().await;
    assert_eq!(resort.dependents_of(SkierId(0)), Some(0));

    let child = spawn_skier(&resort, Skier::dependent(SkierId(1), 6, SkierId(0)), PriorityClass::Standard);
    helpers::settle().await;
    assert_eq!(resort.dependents_of(SkierId(0)), Some(1));

    let sibling = Skier::dependent(SkierId(2), 7, SkierId(0));
    let refused = spawn_skier(&resort, sibling, PriorityClass::Standard).await.unwrap();
    assert!(matches!(
        refused.exit,
        ExitReason::Rejected(AdmissionRejection::GuardianAtCapacity { max: 1, .. })
    ));

    tokio::time::sleep(Duration::from_millis(500)).await;
    resort.station.close();
    assert!(guardian.await.unwrap().rides > 0);
    assert!(child.await.unwrap().rides > 0);
    assert_eq!(resort.dependents_of(SkierId(0)), None);
}

#[tokio::test(start_paused = true)]
async fn test_vip_rides_while_standard_pool_is_full() {
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config(4, 1, 1), Arc::new(ManualClock::new()), sink.clone());

    // Occupy the only standard seat
    let held = resort.chairs.try_acquire().unwrap();

    let standard = spawn_skier(&resort, helpers::adult(1), PriorityClass::Standard);
    let vip = spawn_skier(&resort, helpers::adult(2), PriorityClass::Vip);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(sink.rides_of(SkierId(1)).is_empty());
    let vip_rides = sink.rides_of(SkierId(2));
    assert!(!vip_rides.is_empty());
    assert!(vip_rides.iter().all(|event| event.class == PriorityClass::Vip));
    assert_eq!(resort.chairs.peak(), 1);

    held.release();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!sink.rides_of(SkierId(1)).is_empty());

    resort.station.close();
    assert!(standard.await.unwrap().rides > 0);
    assert!(vip.await.unwrap().rides > 0);
    assert_eq!(resort.vip_chairs.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_pass_ends_the_day() {
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(RecordingSink::new());
    let resort = helpers::resort(&config(2, 1, 1), clock.clone(), sink.clone());

    let skier = spawn_skier(&resort, helpers::adult(3), PriorityClass::Standard);
    tokio::time::sleep(Duration::from_millis(300)).await;
    clock.set(60);

    let outcome = skier.await.unwrap();
    assert_eq!(outcome.exit, ExitReason::Expired);
    assert!(outcome.rides > 0);
    assert_eq!(usize::try_from(outcome.rides).unwrap(), sink.events().len());
    assert_eq!(resort.station.counts(), (0, 0));
}
