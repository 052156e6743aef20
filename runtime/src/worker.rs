//! Station workers.
//!
//! Each worker polls at a fixed interval and, with a configured probability,
//! pauses the lift for a routine outage. Before resuming it confirms with the
//! next worker in the crew over a typed request/reply exchange. Workers keep
//! answering their own inbox while they wait, so two workers confirming with
//! each other never deadlock.
//!
//! Workers only issue routine requests; a permanent stop is the shutdown
//! coordinator's job.

use crate::lift::Lift;
use chairlift_core::config::StaffConfig;
use chairlift_core::lift::Operator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::pin::pin;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

/// "Ready to resume?" sent to the peer worker
#[derive(Debug)]
pub struct HandoffRequest {
    /// Requesting worker
    pub from: u8,
    /// Where the peer answers
    pub reply: oneshot::Sender<HandoffReply>,
}

/// Peer's acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffReply {
    /// Answering worker
    pub from: u8,
}

/// What a worker did during the day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker number
    pub id: u8,
    /// Routine stops this worker applied
    pub stops: u32,
    /// Peer confirmations this worker answered
    pub handoffs_answered: u32,
}

enum Interrupt {
    Shutdown,
}

/// One station worker
pub struct Worker {
    id: u8,
    lift: Lift,
    inbox: mpsc::Receiver<HandoffRequest>,
    peer: Option<mpsc::Sender<HandoffRequest>>,
    staff: StaffConfig,
    rng: StdRng,
    shutdown: broadcast::Receiver<()>,
    report: WorkerReport,
}

/// Build `staff.workers` workers arranged in a ring
///
/// Worker `i` confirms with worker `i + 1`; a single worker has no peer and
/// resumes without confirmation.
#[must_use]
pub fn crew(
    lift: &Lift,
    staff: &StaffConfig,
    seed: u64,
    shutdown: &broadcast::Sender<()>,
) -> Vec<Worker> {
    let count = usize::from(staff.workers);
    let (senders, inboxes): (Vec<_>, Vec<_>) = (0..count).map(|_| mpsc::channel(1)).unzip();

    inboxes
        .into_iter()
        .enumerate()
        .map(|(index, inbox)| {
            let id = u8::try_from(index + 1).unwrap_or(u8::MAX);
            let peer = (count > 1).then(|| senders[(index + 1) % count].clone());
            Worker {
                id,
                lift: lift.clone(),
                inbox,
                peer,
                staff: staff.clone(),
                rng: StdRng::seed_from_u64(seed.wrapping_add(u64::from(id))),
                shutdown: shutdown.subscribe(),
                report: WorkerReport {
                    id,
                    ..WorkerReport::default()
                },
            }
        })
        .collect()
}

impl Worker {
    /// Worker number, starting at 1
    #[must_use]
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Poll until the shutdown broadcast arrives
    pub async fn run(mut self) -> WorkerReport {
        let mut poll = tokio::time::interval(self.staff.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        poll.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.recv() => break,
                Some(request) = self.inbox.recv() => self.answer(request),
                _ = poll.tick() => {
                    if self.rng.gen_bool(self.staff.stop_probability)
                        && matches!(self.routine_stop().await, Err(Interrupt::Shutdown))
                    {
                        break;
                    }
                },
            }
        }

        tracing::debug!(worker = self.id, stops = self.report.stops, "Worker off duty");
        self.report
    }

    async fn routine_stop(&mut self) -> Result<(), Interrupt> {
        let me = Operator::Worker(self.id);
        if !self.lift.request_stop(me) {
            return Ok(());
        }
        self.report.stops += 1;

        let mut outage = pin!(tokio::time::sleep(self.staff.outage()));
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.recv() => return Err(Interrupt::Shutdown),
                Some(request) = self.inbox.recv() => self.answer(request),
                () = &mut outage => break,
            }
        }

        self.confirm_with_peer().await?;
        self.lift.request_resume(me);
        Ok(())
    }

    async fn confirm_with_peer(&mut self) -> Result<(), Interrupt> {
        let Some(peer) = self.peer.clone() else {
            return Ok(());
        };

        let (reply, answer) = oneshot::channel();
        let request = HandoffRequest {
            from: self.id,
            reply,
        };
        if peer.send(request).await.is_err() {
            tracing::debug!(worker = self.id, "Peer off duty, resuming alone");
            return Ok(());
        }

        let mut answer = pin!(answer);
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.recv() => return Err(Interrupt::Shutdown),
                Some(request) = self.inbox.recv() => self.answer(request),
                reply = &mut answer => {
                    match reply {
                        Ok(HandoffReply { from }) => {
                            tracing::debug!(worker = self.id, peer = from, "Peer confirmed resume");
                        },
                        Err(_) => {
                            tracing::debug!(worker = self.id, "Peer left before confirming");
                        },
                    }
                    return Ok(());
                },
            }
        }
    }

    fn answer(&mut self, request: HandoffRequest) {
        tracing::debug!(worker = self.id, peer = request.from, "Confirming resume for peer");
        self.report.handoffs_answered += 1;
        let _ = request.reply.send(HandoffReply { from: self.id });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::time::Duration;

    fn staff(workers: u8, stop_probability: f64) -> StaffConfig {
        StaffConfig {
            workers,
            stop_probability,
            poll_interval_ms: 100,
            outage_ms: 250,
        }
    }

    #[test]
    fn test_crew_is_numbered_from_one() {
        let (shutdown, _) = broadcast::channel(1);
        let workers = crew(&Lift::new(), &staff(3, 0.0), 7, &shutdown);
        let ids: Vec<_> = workers.iter().map(Worker::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_workers_never_stop_lift() {
        let lift = Lift::new();
        let (shutdown, _) = broadcast::channel(1);
        let workers = crew(&lift, &staff(2, 0.0), 1, &shutdown);
        let handles: Vec<_> = workers.into_iter().map(|w| tokio::spawn(w.run())).collect();

        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown.send(()).unwrap();

        for handle in handles {
            assert_eq!(handle.await.unwrap().stops, 0);
        }
        assert_eq!(lift.state().stops, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_stops_and_resumes() {
        let lift = Lift::new();
        let (shutdown, _) = broadcast::channel(1);
        let worker = crew(&lift, &staff(1, 1.0), 1, &shutdown).pop().unwrap();
        let handle = tokio::spawn(worker.run());

        // First poll at 100ms stops the lift for 250ms
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!lift.is_running());
        assert_eq!(lift.state().stopped_by, Some(Operator::Worker(1)));

        // A second applied stop proves the first one was resumed
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(lift.state().stops >= 2);

        shutdown.send(()).unwrap();
        let report = handle.await.unwrap();
        assert_eq!(report.stops, lift.state().stops);
    }
}
