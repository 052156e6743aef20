//! # Chairlift Simulator
//!
//! Process shell around `chairlift-runtime`: the ticket office selling passes
//! to arriving skiers and the signal wiring for operator controls. The
//! `chairlift` binary ties them to a [`Simulation`](chairlift_runtime::Simulation).

pub mod signals;
pub mod ticket_office;

pub use signals::OperatorSignal;
pub use ticket_office::TicketOffice;
