//! CLI interface for doc-sync: command parsing and routing to the pipelines of
//! `doc-sync-core`.
//!
//! All pipeline logic lives in [`doc_sync_core`]; this module loads the
//! configuration, runs the requested pipeline and prints its report. [`run`]
//! is also the entrypoint for integration tests.
use crate::job::SiteJob;
use crate::load_config::resolve_config;
use crate::signal::shutdown_signal;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_sync_core::config::ScheduleConfig;
use doc_sync_core::fetch::DefaultFetcher;
use doc_sync_core::generate::generate;
use doc_sync_core::schedule::Scheduler;
use doc_sync_core::synchronise::synchronise;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for doc-sync: keep a documentation site in sync with repository markdown.
#[derive(Parser)]
#[clap(
    name = "doc-sync",
    version,
    about = "Sync repository markdown into a Docusaurus docs tree and regenerate per-module pages"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the mapped documents and write them into the site once
    Sync {
        /// Path to the YAML config file; the built-in config is used when omitted
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Regenerate the per-module docs from a local checkout once
    Generate {
        /// Path to the YAML config file; the built-in config is used when omitted
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Run sync and generate now, then periodically until interrupted
    Schedule {
        /// Path to the YAML config file; the built-in config is used when omitted
        #[clap(long)]
        config: Option<PathBuf>,
        /// Hours between runs, overriding `schedule.interval_hours`
        #[clap(long)]
        interval_hours: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let config = resolve_config(config.as_deref())?;
            let sync = config.sync()?;
            tracing::info!(command = "sync", "Starting documentation sync");
            let fetcher = DefaultFetcher::new(sync.timeout())?;
            let report = synchronise(&config.site, sync, &fetcher)
                .await
                .inspect_err(|e| tracing::error!(command = "sync", error = %e, "Sync failed"))
                .context("Documentation sync failed")?;
            println!("{report}");
            Ok(())
        }
        Commands::Generate { config } => {
            let config = resolve_config(config.as_deref())?;
            let generate_config = config.generate()?;
            tracing::info!(command = "generate", "Starting documentation generation");
            let report = generate(&config.site, generate_config)
                .inspect_err(|e| {
                    tracing::error!(command = "generate", error = %e, "Generation failed")
                })
                .context("Documentation generation failed")?;
            println!("{report}");
            Ok(())
        }
        Commands::Schedule {
            config,
            interval_hours,
        } => {
            let config = resolve_config(config.as_deref())?;
            let schedule = match interval_hours {
                Some(interval_hours) => ScheduleConfig { interval_hours },
                None => config.schedule.clone(),
            };
            schedule.validate()?;
            let interval = schedule.interval();
            tracing::info!(
                command = "schedule",
                interval_hours = interval.as_secs() / 3600,
                "Starting scheduler"
            );
            let stats = Scheduler::new(interval)
                .run(Arc::new(SiteJob::new(config)), shutdown_signal().boxed())
                .await;
            tracing::info!(
                command = "schedule",
                runs = stats.runs,
                failures = stats.failures,
                "Scheduler stopped"
            );
            Ok(())
        }
    }
}
