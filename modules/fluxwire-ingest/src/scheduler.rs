//! Interval-driven ingestion with a single-instance lock: a new cycle never
//! starts while one is still running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use fluxwire_common::IngestionRun;

use crate::pipeline::IngestionPipeline;

pub struct Scheduler {
    pipeline: Arc<IngestionPipeline>,
    interval: Duration,
    in_progress: Arc<AtomicBool>,
}

#[derive(Debug, thiserror::Error)]
#[error("an ingestion run is already in progress")]
pub struct RunInProgress;

impl Scheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>, interval_minutes: u64) -> Self {
        Self {
            pipeline,
            interval: Duration::from_secs(interval_minutes * 60),
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trigger one run now. Fails fast when a run is already in flight
    /// (max_instances = 1).
    pub async fn trigger(&self) -> Result<anyhow::Result<IngestionRun>, RunInProgress> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            return Err(RunInProgress);
        }

        let result = self.pipeline.run().await;
        self.in_progress.store(false, Ordering::SeqCst);
        Ok(result)
    }

    /// Run immediately, then on every interval tick until `shutdown` is set.
    /// On shutdown the current run winds down via the pipeline cancel flag
    /// and its partial stats are recorded before returning.
    pub async fn run_loop(&self, shutdown: Arc<AtomicBool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "ingestion scheduler starting"
        );

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("scheduler shutdown requested");
                return;
            }

            match self.trigger().await {
                Ok(Ok(run)) => {
                    info!(run_id = run.id, status = %run.status, "scheduled run finished")
                }
                Ok(Err(e)) => error!(error = %e, "scheduled run failed"),
                Err(RunInProgress) => info!("previous run still in progress, skipping tick"),
            }

            // Sleep in small steps so shutdown is honoured promptly.
            let mut remaining = self.interval;
            while !remaining.is_zero() {
                if shutdown.load(Ordering::SeqCst) {
                    info!("scheduler shutdown requested");
                    return;
                }
                let step = remaining.min(Duration::from_secs(1));
                tokio::time::sleep(step).await;
                remaining -= step;
            }
        }
    }
}
