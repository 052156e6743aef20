//! Descent routes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marked descent back to the valley station
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Short route
    T1,
    /// Medium route
    T2,
    /// Long route
    T3,
}

impl Route {
    /// Every route, in order
    pub const ALL: [Self; 3] = [Self::T1, Self::T2, Self::T3];

    /// Position of the route in [`Route::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::T1 => 0,
            Self::T2 => 1,
            Self::T3 => 2,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T1 => write!(f, "T1"),
            Self::T2 => write!(f, "T2"),
            Self::T3 => write!(f, "T3"),
        }
    }
}
