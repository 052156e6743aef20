//! Admission gate array.
//!
//! Each gate is a dedicated handler task behind a one-slot lane. A skier
//! sends a pass request with a reply channel and parks on the reply; the
//! handler announces the hand-off and answers. Gates keep no occupancy count
//! of their own: once answered, the skier competes for the platform on its
//! own.
//!
//! When the station closes a handler closes its lane, which fails every
//! sender still waiting for room, answers the request already buffered, and
//! exits.

use crate::error::GateError;
use crate::metrics::RideMetrics;
use crate::station::Station;
use chairlift_core::{GateId, SkierId};
use std::sync::{Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};

/// Proof that a skier passed an admission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePass {
    /// Gate that handed the skier through
    pub gate: GateId,
}

struct PassRequest {
    skier: SkierId,
    reply: oneshot::Sender<GatePass>,
}

/// Fixed set of independent turnstiles
pub struct AdmissionGates {
    lanes: Vec<mpsc::Sender<PassRequest>>,
    handlers: Mutex<Option<JoinSet<u64>>>,
}

impl AdmissionGates {
    /// Spawn `count` gate handlers that stay open until `station` closes
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn open(count: usize, station: &Station) -> Self {
        let mut handlers = JoinSet::new();
        let lanes = (0..count)
            .map(|index| {
                let (lane, requests) = mpsc::channel(1);
                handlers.spawn(handle_gate(GateId(index), requests, station.clone()));
                lane
            })
            .collect();

        Self {
            lanes,
            handlers: Mutex::new(Some(handlers)),
        }
    }

    /// Number of gates
    #[must_use]
    pub fn gate_count(&self) -> usize {
        self.lanes.len()
    }

    /// Ask `gate` to hand `skier` through and wait for the answer
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Unknown`] for a gate index out of range and
    /// [`GateError::Closed`] if the gate stopped accepting requests before
    /// this one was buffered.
    pub async fn pass_through(&self, gate: GateId, skier: SkierId) -> Result<GatePass, GateError> {
        let lane = self.lanes.get(gate.0).ok_or(GateError::Unknown(gate))?;
        let (reply, answer) = oneshot::channel();

        lane.send(PassRequest { skier, reply })
            .await
            .map_err(|_| GateError::Closed(gate))?;
        answer.await.map_err(|_| GateError::Closed(gate))
    }

    /// Wait for every handler to exit, returning the total number of hand-offs
    ///
    /// Handlers exit once the station has closed. A second call returns zero.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] of a handler that panicked.
    pub async fn join(&self) -> Result<u64, JoinError> {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut handlers) = handlers else {
            return Ok(0);
        };

        let mut total = 0;
        while let Some(passes) = handlers.join_next().await {
            total += passes?;
        }
        Ok(total)
    }
}

async fn handle_gate(gate: GateId, mut requests: mpsc::Receiver<PassRequest>, station: Station) -> u64 {
    let mut passes = 0;

    loop {
        tokio::select! {
            biased;
            request = requests.recv() => match request {
                Some(request) => {
                    hand_off(gate, request);
                    passes += 1;
                },
                None => return passes,
            },
            _ = station.wait_until_closed() => break,
        }
    }

    requests.close();
    while let Some(request) = requests.recv().await {
        hand_off(gate, request);
        passes += 1;
    }

    tracing::debug!(gate = %gate, passes, "Admission gate closed");
    passes
}

fn hand_off(gate: GateId, request: PassRequest) {
    tracing::debug!(gate = %gate, skier = %request.skier, "Gate hand-off");
    RideMetrics::record_gate_pass(gate);
    // The skier may have been aborted while waiting
    let _ = request.reply.send(GatePass { gate });
}
