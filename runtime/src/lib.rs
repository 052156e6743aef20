//! # Chairlift Runtime
//!
//! Async machinery for the chairlift simulation.
//!
//! This crate turns the pure reducers and domain types of `chairlift-core`
//! into running tasks on tokio.
//!
//! ## Core Components
//!
//! - **Store**: Owns one reducer's state behind a watch channel and wakes
//!   parked tasks when a transition asks for it
//! - **Capacity gates**: Bounded slot pools for the platform and both chair pools
//! - **Admission gates**: Turnstile handler tasks answering one skier at a time
//! - **Lift / Station**: Typed handles over the two global state machines
//! - **Ride pipeline**: One task per skier walking through the ride phases
//! - **Workers**: Staff tasks pausing and resuming the lift
//! - **Shutdown coordinator**: Drains the station before stopping the lift for good
//! - **Simulation**: Supervises every task of one simulated day
//!
//! ## Example
//!
//! ```ignore
//! use chairlift_runtime::{RideLedger, Simulation};
//!
//! let ledger = Arc::new(RideLedger::new());
//! let simulation = Simulation::new(config, ticket_office, ledger.clone())?;
//!
//! let control = simulation.control();
//! control.request_stop();
//!
//! let summary = simulation.run().await?;
//! println!("{}", ledger.report());
//! ```

pub mod capacity;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod gates;
pub mod ledger;
pub mod lift;
pub mod metrics;
pub mod pipeline;
pub mod population;
pub mod resort;
pub mod simulation;
pub mod station;
pub mod store;
pub mod worker;

pub use capacity::{CapacityGate, Slot};
pub use clock::{SimClock, run_clock};
pub use coordinator::{ShutdownCoordinator, ShutdownReport};
pub use error::{CapacityError, GateError, LiftError, SimulationError, StoreError};
pub use gates::{AdmissionGates, GatePass};
pub use ledger::{DailyReport, RideLedger};
pub use lift::Lift;
pub use pipeline::{AscentReport, ExitReason, SkierActor, SkierOutcome, ascend};
pub use population::Population;
pub use resort::Resort;
pub use simulation::{ControlHandle, Simulation, SimulationSummary};
pub use station::{PlatformPlace, QueuePlace, Station};
pub use store::Store;
pub use worker::{HandoffReply, HandoffRequest, Worker, WorkerReport, crew};
