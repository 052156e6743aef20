//! Operator controls delivered as process signals.
//!
//! | Signal            | Control                          |
//! |-------------------|----------------------------------|
//! | `SIGUSR1`         | stop the lift                    |
//! | `SIGUSR2`         | resume the lift                  |
//! | `SIGHUP`          | log a diagnostics snapshot       |
//! | `SIGINT`/`SIGTERM`| close the station and drain      |
//!
//! Handlers never touch shared state themselves; they go through the
//! [`ControlHandle`], which performs the same locked transitions as the
//! workers do.

use chairlift_runtime::ControlHandle;

/// One operator request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSignal {
    /// Pause the lift
    Stop,
    /// Resume the lift
    Resume,
    /// Log the current diagnostics
    Snapshot,
    /// Close the station early
    Close,
}

/// Apply `signal` through `control`
///
/// Returns whether the request changed anything.
pub fn apply(control: &ControlHandle, signal: OperatorSignal) -> bool {
    match signal {
        OperatorSignal::Stop => {
            let stopped = control.request_stop();
            if !stopped {
                tracing::info!("Stop request ignored: lift already stopped or shutting down");
            }
            stopped
        },
        OperatorSignal::Resume => {
            let resumed = control.request_resume();
            if !resumed {
                tracing::info!("Resume request ignored: lift running or shutting down");
            }
            resumed
        },
        OperatorSignal::Snapshot => {
            let snapshot = control.snapshot();
            tracing::info!(
                minutes = snapshot.simulated_minutes_elapsed,
                on_platform = snapshot.actors_on_platform,
                in_queue = snapshot.actors_in_lift_queue,
                lift_running = snapshot.lift_running,
                station_open = snapshot.station_open,
                "Diagnostics"
            );
            true
        },
        OperatorSignal::Close => {
            let closed = control.close_station();
            if closed {
                tracing::warn!("Station closed by operator, draining");
            } else {
                tracing::info!("Station already closed");
            }
            closed
        },
    }
}

/// Forward process signals to `control` until every signal stream ends
///
/// Meant to be spawned and aborted once the day is over.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
#[cfg(unix)]
pub async fn forward(control: ControlHandle) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut stop = signal(SignalKind::user_defined1())?;
    let mut resume = signal(SignalKind::user_defined2())?;
    let mut snapshot = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        let request = tokio::select! {
            Some(()) = stop.recv() => OperatorSignal::Stop,
            Some(()) = resume.recv() => OperatorSignal::Resume,
            Some(()) = snapshot.recv() => OperatorSignal::Snapshot,
            Some(()) = interrupt.recv() => OperatorSignal::Close,
            Some(()) = terminate.recv() => OperatorSignal::Close,
            else => return Ok(()),
        };
        tracing::debug!(?request, "Operator signal received");
        apply(&control, request);
    }
}

/// Forward Ctrl+C to `control`
///
/// # Errors
///
/// Returns an error if the Ctrl+C handler cannot be installed.
#[cfg(not(unix))]
pub async fn forward(control: ControlHandle) -> std::io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        apply(&control, OperatorSignal::Close);
    }
}
