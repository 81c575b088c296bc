//! The unit of work the `schedule` command repeats: sync, then generate.

use async_trait::async_trait;
use doc_sync_core::contract::{JobError, ScheduledJob};
use doc_sync_core::fetch::DefaultFetcher;
use doc_sync_core::generate::generate;
use doc_sync_core::synchronise::synchronise;
use tracing::{error, info};

use crate::load_config::CliConfig;

/// Runs every pipeline the configuration has a section for.
pub struct SiteJob {
    config: CliConfig,
}

impl SiteJob {
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ScheduledJob for SiteJob {
    fn name(&self) -> String {
        "doc-sync".to_string()
    }

    /// A failing sync does not stop the generation step; the first error is
    /// returned once both have had their turn.
    async fn run_once(&self) -> Result<(), JobError> {
        let mut first_error: Option<JobError> = None;

        if let Some(sync) = &self.config.sync {
            let outcome = match DefaultFetcher::new(sync.timeout()) {
                Ok(fetcher) => synchronise(&self.config.site, sync, &fetcher).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(report) => {
                    println!("{report}");
                    info!(coverage = report.coverage_percent(), "Scheduled sync finished");
                }
                Err(e) => {
                    error!(error = %e, "Scheduled sync failed");
                    if first_error.is_none() {
                        first_error = Some(Box::new(e));
                    }
                }
            }
        }

        if let Some(config) = &self.config.generate {
            match generate(&self.config.site, config) {
                Ok(report) => {
                    println!("{report}");
                    info!(coverage = report.coverage_percent(), "Scheduled generation finished");
                }
                Err(e) => {
                    error!(error = %e, "Scheduled generation failed");
                    if first_error.is_none() {
                        first_error = Some(Box::new(e));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
