//! Scenario execution

use anyhow::Result;
use glide_animation::{RunCounter, Snapshot, Worker};
use tracing::{debug, info};

use crate::config::Scenario;

/// Run a scenario to completion, reporting every sample to `report`
///
/// Returns the final position once every run has settled.
pub async fn run<F>(scenario: &Scenario, report: F) -> Result<f64>
where
    F: Fn(&Snapshot) + Send + Sync + 'static,
{
    let notify = RunCounter::new();
    let worker = Worker::from_config(&scenario.worker, Some(notify.clone()));

    info!(
        "Starting run toward {} over {}ms",
        scenario.initial.to, scenario.initial.duration_ms
    );
    worker
        .start(scenario.initial.to_options().on_update(report))
        .await?;

    if let Some(redirect) = &scenario.redirect {
        tokio::time::sleep(redirect.after()).await;
        info!(
            "Redirecting from {:.3} toward {} over {}ms",
            worker.position(),
            redirect.run.to,
            redirect.run.duration_ms
        );
        worker.start(redirect.run.to_options()).await?;
    }

    notify.settled().await;
    debug!("All runs settled");

    Ok(worker.position())
}

/// Progress line printed for every sample
pub fn progress_line(snapshot: &Snapshot) -> String {
    format!(
        "notify: {}, pt: {}",
        snapshot.in_flight.unwrap_or_default(),
        snapshot.pt.round()
    )
}
