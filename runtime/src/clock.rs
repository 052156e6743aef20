//! Compressed simulated clock.
//!
//! One real tick advances the clock by a fixed number of simulated minutes.
//! The clock only expires entitlements and closes the station at the end of
//! the session; ride phases are timed by plain sleeps.

use crate::station::Station;
use chairlift_core::config::SessionConfig;
use chairlift_core::environment::{Clock, resort_time};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::MissedTickBehavior;

/// Simulated minutes since opening
#[derive(Debug, Default)]
pub struct SimClock {
    minutes: AtomicU32,
}

impl SimClock {
    /// Clock at opening time
    #[must_use]
    pub const fn new() -> Self {
        Self {
            minutes: AtomicU32::new(0),
        }
    }

    /// Move the clock forward without passing `limit`, returning the new
    /// reading
    pub fn advance(&self, minutes: u32, limit: u32) -> u32 {
        let step = |now: u32| now.saturating_add(minutes).min(limit);
        match self
            .minutes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| Some(step(now)))
        {
            Ok(previous) | Err(previous) => step(previous),
        }
    }
}

impl Clock for SimClock {
    fn minutes_elapsed(&self) -> u32 {
        self.minutes.load(Ordering::Acquire)
    }
}

/// Drive the clock until the session ends, then close the station
///
/// Returns early, without touching the clock further, if the station is
/// closed by someone else.
pub async fn run_clock(clock: Arc<SimClock>, station: Station, session: SessionConfig) {
    let session_minutes = session.session_minutes();
    let mut ticker = tokio::time::interval(session.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval fires immediately
    ticker.tick().await;

    tracing::info!(
        opens = %resort_time(session.opening_hour, 0),
        closes = %resort_time(session.opening_hour, session_minutes),
        "Station open"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = station.wait_until_closed() => {
                tracing::debug!(minute = clock.minutes_elapsed(), "Clock stopped early");
                return;
            },
        }

        let before = clock.minutes_elapsed();
        let now = clock.advance(session.minutes_per_tick, session_minutes);

        if now / 60 > before / 60 {
            tracing::info!(
                time = %resort_time(session.opening_hour, now),
                minute = now,
                "Hour passed"
            );
        }

        if now >= session_minutes {
            tracing::info!(time = %resort_time(session.opening_hour, now), "Closing time");
            station.close();
            return;
        }
    }
}
