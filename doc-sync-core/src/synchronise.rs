//! Sync pipeline: declared mapping table → site docs tree.
//!
//! For every [`DocMapping`], in declaration order:
//!   - locate the source in its repository ([`SourceLocator`]);
//!   - fetch it through a [`Fetcher`];
//!   - transform found content, or write a placeholder when the source does not
//!     exist; transient failures are reported and nothing is written;
//!   - record the written doc in the sidebar manifest.
//!
//! The manifest is merged into the site's sidebars file at the end of the run.
//!
//! # Error Handling
//! Fetch problems never abort the run. A failed write or manifest merge does,
//! and is returned as a [`SyncError`].

use tracing::{error, info, warn};

use crate::config::{normalize_relative, DocMapping, Repository, SiteConfig, SyncConfig};
use crate::contract::{FetchError, Fetcher};
use crate::error::SyncError;
use crate::locate::SourceLocator;
use crate::markup::LinkBase;
use crate::sidebar::{doc_id, label_for, ManifestBuilder};
use crate::transform::{self, base_name, DocContext};
use crate::write::{DocWriter, ItemReport, Outcome, RunReport};

pub const REPORT_TITLE: &str = "Documentation Sync Report";

/// Category of docs at the top of the docs dir, in the run report.
const TOP_LEVEL_CATEGORY: &str = "docs";

pub async fn synchronise<F>(
    site: &SiteConfig,
    config: &SyncConfig,
    fetcher: &F,
) -> Result<RunReport, SyncError>
where
    F: Fetcher + ?Sized,
{
    config.validate()?;
    info!(
        mappings = config.mappings.len(),
        site_root = %site.root.display(),
        "Starting documentation sync"
    );

    let locator = SourceLocator::new(&config.raw_base_url);
    let mut writer = DocWriter::new(&site.root);
    let mut manifest = ManifestBuilder::new(&config.sidebar_id);
    let mut report = RunReport::new(REPORT_TITLE);

    for mapping in &config.mappings {
        let repo = config.repository(&mapping.repo).ok_or_else(|| {
            SyncError::Config(format!("unknown repository '{}'", mapping.repo))
        })?;
        let destination = normalize_relative(&mapping.destination).ok_or_else(|| {
            SyncError::Config(format!("invalid destination '{}'", mapping.destination))
        })?;
        let id = doc_id(&site.docs_dir, &destination);
        let category = id
            .as_deref()
            .and_then(|id| id.split_once('/'))
            .map(|(first, _)| first.to_string());

        let location = locator.locate(repo, &mapping.source);
        let ctx = document_context(config, repo, mapping);

        let (doc, item) = match fetcher.fetch(&location).await {
            Ok(raw) => {
                info!(source = %mapping.source, destination = %destination.display(), "Synced document");
                (
                    transform::transform(&raw, &ctx),
                    ItemReport::new(report_category(&category), &mapping.destination, Outcome::Success)
                        .with_detail(location.to_string()),
                )
            }
            Err(FetchError::NotFound) => {
                warn!(source = %mapping.source, location = %location, "Source not found, writing placeholder");
                (
                    transform::placeholder(&ctx),
                    ItemReport::new(report_category(&category), &mapping.destination, Outcome::Placeholder)
                        .with_detail(format!("not found at {location}")),
                )
            }
            Err(FetchError::Transient(reason)) => {
                error!(source = %mapping.source, location = %location, reason = %reason, "Fetch failed, skipping document");
                report.record(
                    ItemReport::new(report_category(&category), &mapping.destination, Outcome::Error)
                        .with_detail(reason),
                );
                continue;
            }
        };

        writer.write(&destination, &doc.render())?;
        report.record(item);

        match id {
            Some(id) => {
                let label = category.as_deref().map(label_for);
                let group = category.as_deref().zip(label.as_deref());
                manifest.record(group, id);
            }
            None => warn!(
                destination = %destination.display(),
                docs_dir = %site.docs_dir.display(),
                "Destination is outside the docs dir, leaving it out of the sidebar"
            ),
        }
    }

    manifest.build().persist(&mut writer, &site.sidebar_path)?;

    let totals = report.totals();
    info!(
        total = totals.total,
        success = totals.success,
        placeholder = totals.placeholder,
        error = totals.error,
        "Documentation sync complete"
    );
    Ok(report)
}

fn report_category(category: &Option<String>) -> &str {
    category.as_deref().unwrap_or(TOP_LEVEL_CATEGORY)
}

fn document_context(config: &SyncConfig, repo: &Repository, mapping: &DocMapping) -> DocContext {
    let web_base = config.web_base_url.trim_end_matches('/');
    DocContext::new(base_name(&mapping.source))
        .with_links(LinkBase::for_document(web_base, repo, &mapping.source))
        .with_project_url(format!("{web_base}/{}", repo.slug))
}

