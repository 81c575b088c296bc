//! Periodic re-runs of a [`ScheduledJob`].
//!
//! The first run starts immediately, later runs on a fixed interval. A run is
//! always awaited before the next tick is taken, so runs never overlap; a tick
//! that falls inside a long run is skipped. Failing and panicking runs are
//! logged and the loop carries on. Resolving the shutdown future aborts an
//! in-flight run and ends the loop.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::contract::ScheduledJob;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Runs started, including an aborted one.
    pub runs: usize,
    /// Runs that returned an error or panicked.
    pub failures: usize,
    /// Whether shutdown interrupted a run in flight.
    pub aborted: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn run(
        &self,
        job: Arc<dyn ScheduledJob>,
        mut shutdown: BoxFuture<'static, ()>,
    ) -> SchedulerStats {
        let name = job.name();
        let mut stats = SchedulerStats::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(job = %name, interval_secs = self.interval.as_secs(), "Scheduler started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(job = %name, "Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {}
            }

            stats.runs += 1;
            let started_at = chrono::Local::now();
            info!(job = %name, run = stats.runs, started_at = %started_at.to_rfc3339(), "Starting scheduled run");

            let task_job = Arc::clone(&job);
            let mut handle = tokio::spawn(async move { task_job.run_once().await });

            let outcome = tokio::select! {
                _ = &mut shutdown => None,
                outcome = &mut handle => Some(outcome),
            };
            let Some(outcome) = outcome else {
                handle.abort();
                stats.aborted = true;
                warn!(job = %name, run = stats.runs, "Shutdown requested, aborted in-flight run");
                break;
            };

            let finished_at = chrono::Local::now();
            match outcome {
                Ok(Ok(())) => {
                    info!(job = %name, run = stats.runs, finished_at = %finished_at.to_rfc3339(), "Scheduled run succeeded");
                }
                Ok(Err(e)) => {
                    stats.failures += 1;
                    error!(job = %name, run = stats.runs, finished_at = %finished_at.to_rfc3339(), error = %e, "Scheduled run failed");
                }
                Err(e) if e.is_panic() => {
                    stats.failures += 1;
                    error!(job = %name, run = stats.runs, finished_at = %finished_at.to_rfc3339(), "Scheduled run panicked");
                }
                Err(e) => {
                    stats.failures += 1;
                    error!(job = %name, run = stats.runs, error = %e, "Scheduled run was cancelled");
                }
            }

            if let Ok(step) = chrono::Duration::from_std(self.interval) {
                info!(job = %name, next_run = %(started_at + step).to_rfc3339(), "Next run scheduled");
            }
        }

        stats
    }
}
