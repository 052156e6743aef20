//! Skiers, guardianship, and the admission eligibility rules.
//!
//! A child may only ride while a live guardian vouches for them, and a
//! guardian may only supervise a bounded number of children. Both rules are
//! checked once, before the skier touches any shared resource.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Youngest age at which a skier counts as a child needing a guardian.
pub const CHILD_MIN_AGE: u8 = 4;

/// Oldest age at which a skier counts as a child needing a guardian.
pub const CHILD_MAX_AGE: u8 = 8;

/// Youngest age at which a skier may act as a guardian.
pub const GUARDIAN_MIN_AGE: u8 = 18;

/// Oldest age at which a skier may act as a guardian.
pub const GUARDIAN_MAX_AGE: u8 = 65;

/// Skier identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkierId(pub u32);

impl fmt::Display for SkierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Admission gate identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GateId(pub usize);

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0 + 1)
    }
}

/// How a skier relates to other skiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guardianship {
    /// Rides alone
    None,
    /// Adult currently supervising the given number of dependents
    GuardianOf(u8),
    /// Child who must be supervised by the given guardian
    DependentOf(SkierId),
}

/// One unit of simulated demand for the lift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skier {
    /// Skier identifier
    pub id: SkierId,
    /// Age in years
    pub age: u8,
    /// Guardian relationship
    pub guardianship: Guardianship,
}

impl Skier {
    /// Create a skier riding alone
    #[must_use]
    pub const fn new(id: SkierId, age: u8) -> Self {
        Self {
            id,
            age,
            guardianship: Guardianship::None,
        }
    }

    /// Create a child supervised by `guardian`
    #[must_use]
    pub const fn dependent(id: SkierId, age: u8, guardian: SkierId) -> Self {
        Self {
            id,
            age,
            guardianship: Guardianship::DependentOf(guardian),
        }
    }

    /// Create an adult who can supervise children
    #[must_use]
    pub const fn guardian(id: SkierId, age: u8) -> Self {
        Self {
            id,
            age,
            guardianship: Guardianship::GuardianOf(0),
        }
    }

    /// Whether this skier's age requires a guardian
    #[must_use]
    pub const fn is_child(&self) -> bool {
        is_child_age(self.age)
    }
}

/// Ages that must ride under supervision
#[must_use]
pub const fn is_child_age(age: u8) -> bool {
    age >= CHILD_MIN_AGE && age <= CHILD_MAX_AGE
}

/// Ages allowed to supervise children
#[must_use]
pub const fn can_supervise(age: u8) -> bool {
    age >= GUARDIAN_MIN_AGE && age <= GUARDIAN_MAX_AGE
}

/// Why a skier was turned away before consuming any resource
///
/// Rejections are terminal for the skier and never affect anyone else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionRejection {
    /// A child arrived without naming a guardian
    #[error("skier {skier} is a child without a guardian")]
    NoGuardian {
        /// The rejected child
        skier: SkierId,
    },

    /// The named guardian is not a live guardian at the station
    #[error("skier {skier} names {guardian}, who is not a guardian on site")]
    GuardianUnavailable {
        /// The rejected child
        skier: SkierId,
        /// The guardian the child named
        guardian: SkierId,
    },

    /// The named guardian already supervises the maximum number of children
    #[error("guardian {guardian} of skier {skier} already supervises {max} children")]
    GuardianAtCapacity {
        /// The rejected child
        skier: SkierId,
        /// The guardian the child named
        guardian: SkierId,
        /// The supervision limit
        max: u8,
    },
}

impl AdmissionRejection {
    /// The skier that was rejected
    #[must_use]
    pub const fn skier(&self) -> SkierId {
        match self {
            Self::NoGuardian { skier }
            | Self::GuardianUnavailable { skier, .. }
            | Self::GuardianAtCapacity { skier, .. } => *skier,
        }
    }
}

/// Live guardians and how many children each currently supervises
///
/// The registry is plain data; the runtime keeps it behind a mutex.
#[derive(Debug, Clone, Default)]
pub struct GuardianRegistry {
    guardians: HashMap<SkierId, u8>,
    max_dependents: u8,
}

impl GuardianRegistry {
    /// Create a registry allowing `max_dependents` children per guardian
    #[must_use]
    pub fn new(max_dependents: u8) -> Self {
        Self {
            guardians: HashMap::new(),
            max_dependents,
        }
    }

    /// Register a skier as a live guardian
    ///
    /// Returns `false` if the skier is too young or too old to supervise.
    pub fn enroll(&mut self, skier: &Skier) -> bool {
        if !can_supervise(skier.age) {
            return false;
        }
        self.guardians.entry(skier.id).or_insert(0);
        true
    }

    /// Check whether `skier` may ride, attaching it to its guardian if needed
    ///
    /// Adults and teenagers are always eligible. Children must name a live
    /// guardian with spare supervision capacity; on success the guardian's
    /// dependent count is incremented and the child's `guardianship` is left
    /// pointing at it.
    ///
    /// # Errors
    ///
    /// Returns an [`AdmissionRejection`] when the child has no guardian, the
    /// guardian is not live, or the guardian is already at capacity.
    pub fn admit(&mut self, skier: &Skier) -> Result<(), AdmissionRejection> {
        let guardian = match skier.guardianship {
            Guardianship::DependentOf(guardian) => guardian,
            Guardianship::None if skier.is_child() => {
                return Err(AdmissionRejection::NoGuardian { skier: skier.id });
            },
            Guardianship::None | Guardianship::GuardianOf(_) => return Ok(()),
        };

        let Some(supervised) = self.guardians.get_mut(&guardian) else {
            return Err(AdmissionRejection::GuardianUnavailable {
                skier: skier.id,
                guardian,
            });
        };

        if *supervised >= self.max_dependents {
            return Err(AdmissionRejection::GuardianAtCapacity {
                skier: skier.id,
                guardian,
                max: self.max_dependents,
            });
        }

        *supervised += 1;
        Ok(())
    }

    /// Remove a skier leaving the station
    ///
    /// A departing guardian stops accepting children; a departing child frees
    /// a supervision slot on its guardian.
    pub fn withdraw(&mut self, skier: &Skier) {
        match skier.guardianship {
            Guardianship::DependentOf(guardian) => {
                if let Some(supervised) = self.guardians.get_mut(&guardian) {
                    *supervised = supervised.saturating_sub(1);
                }
            },
            Guardianship::GuardianOf(_) | Guardianship::None => {
                self.guardians.remove(&skier.id);
            },
        }
    }

    /// Number of children currently supervised by `guardian`
    #[must_use]
    pub fn dependents_of(&self, guardian: SkierId) -> Option<u8> {
        self.guardians.get(&guardian).copied()
    }

    /// Whether `guardian` is a live guardian
    #[must_use]
    pub fn is_live(&self, guardian: SkierId) -> bool {
        self.guardians.contains_key(&guardian)
    }
}
