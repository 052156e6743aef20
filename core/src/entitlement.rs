//! Entitlements (lift passes) and the source that issues them.

use crate::skier::SkierId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Priority class of an entitlement
///
/// VIP entitlements board from a dedicated chair pool; they never preempt
/// standard skiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    /// Boards from the shared chair pool
    Standard,
    /// Boards from the VIP chair pool
    Vip,
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Vip => write!(f, "vip"),
        }
    }
}

/// Kind of pass sold at the ticket office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// Valid for one hour
    OneHour,
    /// Valid for two hours
    TwoHours,
    /// Valid for three hours
    ThreeHours,
    /// Valid until the station closes
    Day,
}

impl PassKind {
    /// All pass kinds, in ticket office order
    pub const ALL: [Self; 4] = [Self::OneHour, Self::TwoHours, Self::ThreeHours, Self::Day];

    /// Validity window in simulated minutes for a session of `session_minutes`
    #[must_use]
    pub const fn validity_minutes(self, session_minutes: u32) -> u32 {
        match self {
            Self::OneHour => 60,
            Self::TwoHours => 120,
            Self::ThreeHours => 180,
            Self::Day => session_minutes,
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneHour => write!(f, "Tk1"),
            Self::TwoHours => write!(f, "Tk2"),
            Self::ThreeHours => write!(f, "Tk3"),
            Self::Day => write!(f, "day"),
        }
    }
}

/// Time-bounded, priority-classed right to ride
///
/// Owned exclusively by the skier holding it and dropped with the skier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    id: SkierId,
    class: PriorityClass,
    pass: PassKind,
    valid_for_minutes: u32,
    discounted: bool,
    usage: u32,
}

impl Entitlement {
    /// Create an unused entitlement
    #[must_use]
    pub const fn new(
        id: SkierId,
        class: PriorityClass,
        pass: PassKind,
        valid_for_minutes: u32,
    ) -> Self {
        Self {
            id,
            class,
            pass,
            valid_for_minutes,
            discounted: false,
            usage: 0,
        }
    }

    /// Mark the entitlement as sold at a discount
    #[must_use]
    pub const fn discounted(mut self) -> Self {
        self.discounted = true;
        self
    }

    /// Holder of the entitlement
    #[must_use]
    pub const fn id(&self) -> SkierId {
        self.id
    }

    /// Priority class
    #[must_use]
    pub const fn class(&self) -> PriorityClass {
        self.class
    }

    /// Pass kind
    #[must_use]
    pub const fn pass(&self) -> PassKind {
        self.pass
    }

    /// Validity window in simulated minutes since opening
    #[must_use]
    pub const fn valid_for_minutes(&self) -> u32 {
        self.valid_for_minutes
    }

    /// Whether the pass was sold at a discount
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.discounted
    }

    /// Rides completed with this entitlement
    #[must_use]
    pub const fn usage_count(&self) -> u32 {
        self.usage
    }

    /// Whether the entitlement may still start a ride at `minute`
    #[must_use]
    pub const fn is_valid_at(&self, minute: u32) -> bool {
        minute < self.valid_for_minutes
    }

    /// Count one completed ride, returning the new total
    pub const fn record_ride(&mut self) -> u32 {
        self.usage += 1;
        self.usage
    }
}

/// Why the entitlement source refused to issue a pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntitlementRejected {
    /// The skier is below the minimum age for the lift
    #[error("skier {skier} is {age}, below the minimum age of {minimum}")]
    TooYoung {
        /// The refused skier
        skier: SkierId,
        /// Their age
        age: u8,
        /// Minimum age accepted
        minimum: u8,
    },
}

/// Issues entitlements to arriving skiers
///
/// The core treats the validity window and priority class as opaque inputs;
/// pricing and discounts belong to the implementation.
pub trait EntitlementSource: Send + Sync {
    /// Issue an entitlement for `skier` of the given `age`
    ///
    /// # Errors
    ///
    /// Returns [`EntitlementRejected`] if no pass can be sold to this skier.
    fn issue(&self, skier: SkierId, age: u8) -> Result<Entitlement, EntitlementRejected>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_windows() {
        assert_eq!(PassKind::OneHour.validity_minutes(120), 60);
        assert_eq!(PassKind::TwoHours.validity_minutes(120), 120);
        assert_eq!(PassKind::ThreeHours.validity_minutes(120), 180);
        assert_eq!(PassKind::Day.validity_minutes(120), 120);
        assert_eq!(PassKind::Day.validity_minutes(480), 480);
    }

    #[test]
    fn test_entitlement_expiry_is_exclusive() {
        let pass = Entitlement::new(SkierId(1), PriorityClass::Standard, PassKind::OneHour, 60);
        assert!(pass.is_valid_at(0));
        assert!(pass.is_valid_at(59));
        assert!(!pass.is_valid_at(60));
    }

    #[test]
    fn test_record_ride_counts_up() {
        let mut pass = Entitlement::new(SkierId(1), PriorityClass::Vip, PassKind::Day, 120);
        assert_eq!(pass.usage_count(), 0);
        assert_eq!(pass.record_ride(), 1);
        assert_eq!(pass.record_ride(), 2);
        assert_eq!(pass.usage_count(), 2);
    }

    #[test]
    fn test_discount_flag() {
        let pass = Entitlement::new(SkierId(1), PriorityClass::Standard, PassKind::Day, 120);
        assert!(!pass.is_discounted());
        assert!(pass.discounted().is_discounted());
    }
}
