//! The resort's ticket office.

use chairlift_core::entitlement::{
    Entitlement, EntitlementRejected, EntitlementSource, PassKind, PriorityClass,
};
use chairlift_core::SkierId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Youngest skier a pass is sold to
pub const MINIMUM_AGE: u8 = 4;

/// Skiers younger than this pay the reduced price
pub const DISCOUNT_BELOW: u8 = 12;

/// Skiers older than this pay the reduced price
pub const DISCOUNT_ABOVE: u8 = 65;

/// Share of passes sold as VIP
pub const VIP_PROBABILITY: f64 = 0.2;

/// Randomised entitlement source
///
/// Every pass kind is equally likely. Day passes last the whole session.
pub struct TicketOffice {
    rng: Mutex<StdRng>,
    session_minutes: u32,
}

impl TicketOffice {
    /// Ticket office for a session of `session_minutes`, seeded when `seed` is set
    #[must_use]
    pub fn new(session_minutes: u32, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng: Mutex::new(rng),
            session_minutes,
        }
    }
}

/// Whether a skier of `age` pays the reduced price
#[must_use]
pub const fn is_discounted_age(age: u8) -> bool {
    age < DISCOUNT_BELOW || age > DISCOUNT_ABOVE
}

impl EntitlementSource for TicketOffice {
    fn issue(&self, skier: SkierId, age: u8) -> Result<Entitlement, EntitlementRejected> {
        if age < MINIMUM_AGE {
            return Err(EntitlementRejected::TooYoung {
                skier,
                age,
                minimum: MINIMUM_AGE,
            });
        }

        let (pass, class) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let pass = PassKind::ALL
                .choose(&mut *rng)
                .copied()
                .unwrap_or(PassKind::Day);
            let class = if rng.gen_bool(VIP_PROBABILITY) {
                PriorityClass::Vip
            } else {
                PriorityClass::Standard
            };
            (pass, class)
        };

        let mut entitlement =
            Entitlement::new(skier, class, pass, pass.validity_minutes(self.session_minutes));
        if is_discounted_age(age) {
            entitlement = entitlement.discounted();
            tracing::info!(skier = %skier, age, %pass, "Discounted pass sold");
        }

        tracing::debug!(
            skier = %skier,
            %pass,
            %class,
            valid_for_minutes = entitlement.valid_for_minutes(),
            "Pass issued"
        );
        Ok(entitlement)
    }
}
