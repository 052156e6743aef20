//! Chairlift simulation.
//!
//! Runs one simulated day at the resort and prints the daily report.
//!
//! Configuration comes from the TOML file named by `CHAIRLIFT_CONFIG`, or from
//! `CHAIRLIFT_*` environment variables over the defaults. Set
//! `CHAIRLIFT_PRINT_METRICS=1` to print Prometheus metrics after the report.

use chairlift_core::SimulationConfig;
use chairlift_runtime::metrics::MetricsRecorder;
use chairlift_runtime::{RideLedger, Simulation};
use chairlift_sim::{TicketOffice, signals};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chairlift=info,chairlift_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match std::env::var("CHAIRLIFT_CONFIG") {
        Ok(path) => SimulationConfig::load(&path)?,
        Err(_) => SimulationConfig::from_env()?,
    };
    tracing::info!(
        skiers = config.population.skiers,
        gates = config.capacity.gates,
        platform = config.capacity.platform,
        chairs = config.capacity.chairs,
        vip_chairs = config.capacity.vip_chairs,
        workers = config.staff.workers,
        "Configuration loaded"
    );

    let metrics = if std::env::var("CHAIRLIFT_PRINT_METRICS").is_ok_and(|v| v == "1") {
        Some(MetricsRecorder::install()?)
    } else {
        None
    };

    let tickets = Arc::new(TicketOffice::new(
        config.session.session_minutes(),
        config.population.seed,
    ));
    let ledger = Arc::new(RideLedger::new());

    let simulation = Simulation::new(config, tickets, ledger.clone())?;
    let operator = tokio::spawn(signals::forward(simulation.control()));

    tracing::info!(
        pid = std::process::id(),
        "Station open (SIGUSR1 stops the lift, SIGUSR2 resumes it, SIGHUP logs a snapshot)"
    );
    let summary = simulation.run().await;
    operator.abort();
    let summary = summary?;

    println!("{}", ledger.report());
    println!(
        "Skiers: {} served, {} turned away at the gate, {} without a pass",
        summary.outcomes.len() - summary.rejected(),
        summary.rejected(),
        summary.tickets_refused
    );
    println!(
        "Peaks: platform {}, chairs {}, VIP chairs {}",
        summary.platform_peak, summary.chairs_peak, summary.vip_chairs_peak
    );
    for worker in &summary.workers {
        println!(
            "Worker #{}: {} stops, {} hand-offs answered",
            worker.id, worker.stops, worker.handoffs_answered
        );
    }
    println!(
        "Drain took {:?} ({} polls)",
        summary.shutdown.drain_wait, summary.shutdown.busy_polls
    );

    if let Some(rendered) = metrics.as_ref().and_then(MetricsRecorder::render) {
        println!("{rendered}");
    }

    Ok(())
}
