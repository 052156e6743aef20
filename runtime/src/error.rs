//! Error types for the simulation runtime.

use thiserror::Error;

/// Errors from a [`Store`](crate::store::Store)
#[derive(Error, Debug)]
pub enum StoreError {
    /// Every handle to the store was dropped while a task was waiting on it
    #[error("State store dropped while waiting")]
    Closed,
}

/// Errors from a [`CapacityGate`](crate::capacity::CapacityGate)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// The gate was closed and no longer hands out slots
    #[error("Capacity gate {0} is closed")]
    Closed(&'static str),
}

/// Errors from the [`AdmissionGates`](crate::gates::AdmissionGates)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The gate stopped accepting requests because the station closed
    #[error("Admission gate {0} is closed")]
    Closed(chairlift_core::GateId),

    /// No gate with this index exists
    #[error("No admission gate {0}")]
    Unknown(chairlift_core::GateId),
}

/// Errors from the [`Lift`](crate::lift::Lift)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftError {
    /// The lift has been stopped for the day
    #[error("Lift halted for the day")]
    Halted,

    /// The lift state store went away
    #[error("Lift state unavailable")]
    Unavailable,
}

impl From<StoreError> for LiftError {
    fn from(_: StoreError) -> Self {
        Self::Unavailable
    }
}

/// Errors that abort a whole simulated day
#[derive(Error, Debug)]
pub enum SimulationError {
    /// An actor or background task panicked
    ///
    /// Resource-protocol violations (a slot released twice, a counter
    /// underflow) are assertions, so they surface here.
    #[error("Simulation task failed: {0}")]
    ActorFailed(#[from] tokio::task::JoinError),

    /// The configuration cannot describe a runnable day
    #[error(transparent)]
    Config(#[from] chairlift_core::ConfigError),
}
