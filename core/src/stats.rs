//! Ride events, the statistics sink seam, and the diagnostics snapshot.

use crate::entitlement::PriorityClass;
use crate::route::Route;
use crate::skier::{GateId, SkierId};
use serde::{Deserialize, Serialize};

/// One completed ride
///
/// Emitted once per ride, after the chair and platform slots have been
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideEvent {
    /// Rider
    pub skier: SkierId,
    /// Admission gate the rider passed
    pub gate: GateId,
    /// Descent route chosen after the ride
    pub route: Route,
    /// Rides completed by this skier so far, this one included
    pub completed_rides: u32,
    /// Pool the rider boarded from
    pub class: PriorityClass,
}

/// Append-only receiver of ride events
///
/// The simulation never reads the stream back. Implementations serialise
/// their own mutation.
pub trait StatisticsSink: Send + Sync {
    /// Record one completed ride
    fn record(&self, event: RideEvent);
}

/// Read-only snapshot for operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Simulated minutes since opening
    pub simulated_minutes_elapsed: u32,
    /// Skiers holding a platform slot
    pub actors_on_platform: u32,
    /// Skiers between admission and the platform
    pub actors_in_lift_queue: u32,
    /// Whether the lift is currently running
    pub lift_running: bool,
    /// Whether the station is admitting new rides
    pub station_open: bool,
}
