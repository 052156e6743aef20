//! Arriving skiers.

use chairlift_core::config::PopulationConfig;
use chairlift_core::skier::{can_supervise, is_child_age};
use chairlift_core::{Skier, SkierId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Youngest arriving skier
pub const MIN_ARRIVAL_AGE: u8 = 4;

/// Oldest arriving skier
pub const MAX_ARRIVAL_AGE: u8 = 78;

/// Seeded generator of arriving skiers
///
/// Children name a guardian drawn uniformly from the ids issued so far,
/// their own included, so some of them are bound to be turned away.
pub struct Population {
    rng: StdRng,
    issued: u32,
    arrival_jitter: Duration,
}

impl Population {
    /// Generator for `config`, seeded with `seed`
    #[must_use]
    pub fn new(config: &PopulationConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: 0,
            arrival_jitter: config.arrival_jitter(),
        }
    }

    /// Next arriving skier
    pub fn next_skier(&mut self) -> Skier {
        let id = SkierId(self.issued);
        self.issued += 1;

        let age = self.rng.gen_range(MIN_ARRIVAL_AGE..=MAX_ARRIVAL_AGE);
        if is_child_age(age) {
            let guardian = SkierId(self.rng.gen_range(0..=id.0));
            Skier::dependent(id, age, guardian)
        } else if can_supervise(age) {
            Skier::guardian(id, age)
        } else {
            Skier::new(id, age)
        }
    }

    /// Random delay before the next arrival
    pub fn arrival_delay(&mut self) -> Duration {
        if self.arrival_jitter.is_zero() {
            return Duration::ZERO;
        }
        self.rng.gen_range(Duration::ZERO..=self.arrival_jitter)
    }

    /// Skiers generated so far
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.issued
    }
}
