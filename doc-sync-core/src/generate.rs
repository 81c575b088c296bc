//! Generation pipeline: module READMEs of a local checkout → a per-module docs
//! tree at `<docs_dir>/<output_dir>/<type>/<module>.md`.
//!
//! The output directory is owned by this pipeline and rebuilt from scratch on
//! every run, so modules that disappeared from the checkout disappear from the
//! site too. Modules without a README get a placeholder page.

use std::path::Path;
use tracing::{info, warn};

use crate::config::{normalize_relative, GenerateConfig, SiteConfig};
use crate::error::SyncError;
use crate::markup::LinkBase;
use crate::scan::{ModuleDescriptor, ModuleScanner, ScanConfig};
use crate::sidebar::{doc_id, ManifestBuilder};
use crate::transform::{self, DocContext};
use crate::write::{DocWriter, ItemReport, Outcome, RunReport};

pub const REPORT_TITLE: &str = "Documentation Generation Report";

pub fn generate(site: &SiteConfig, config: &GenerateConfig) -> Result<RunReport, SyncError> {
    config.validate()?;
    let output_dir = normalize_relative(&config.output_dir.to_string_lossy()).ok_or_else(|| {
        SyncError::Config(format!(
            "invalid generate.output_dir '{}'",
            config.output_dir.display()
        ))
    })?;

    let inventory = ModuleScanner::new(ScanConfig::from_generate(config)).scan()?;
    if inventory.is_empty() {
        warn!(source_root = %config.source_root.display(), "No modules found");
    }

    let mut writer = DocWriter::new(&site.root);
    let output = site.docs_dir.join(&output_dir);
    writer.reset_dir(&output)?;

    let mut manifest =
        ManifestBuilder::new(&config.sidebar_id).with_root_category(&config.sidebar_label);
    let mut report = RunReport::new(REPORT_TITLE);

    for (module_type, modules) in inventory.groups() {
        let label = module_type.label();
        for module in modules {
            let relative = output
                .join(module_type.as_str())
                .join(format!("{}.md", module.name));
            let ctx = module_context(config, module);

            let (doc, item) = match &module.readme_content {
                Some(content) => (
                    transform::transform(content, &ctx),
                    ItemReport::new(module_type.as_str(), &module.name, Outcome::Success)
                        .with_detail(display_relative(module.readme_path.as_deref())),
                ),
                None => {
                    warn!(module = %module.name, "Module has no README, writing placeholder");
                    (
                        transform::placeholder(&ctx),
                        ItemReport::new(module_type.as_str(), &module.name, Outcome::Placeholder)
                            .with_detail("no README"),
                    )
                }
            };

            writer.write(&relative, &doc.render())?;
            report.record(item);
            if let Some(id) = doc_id(&site.docs_dir, &relative) {
                manifest.record(Some((module_type.as_str(), label.as_str())), id);
            }
        }
    }

    manifest.build().persist(&mut writer, &site.sidebar_path)?;

    let totals = report.totals();
    info!(
        modules = totals.total,
        with_readme = totals.success,
        without_readme = totals.placeholder,
        coverage = report.coverage_percent(),
        output = %output.display(),
        "Documentation generation complete"
    );
    Ok(report)
}

fn module_context(config: &GenerateConfig, module: &ModuleDescriptor) -> DocContext {
    let mut ctx = DocContext::new(&module.name);
    if let Some(repo) = &config.repository {
        let web_base = config.web_base_url.trim_end_matches('/');
        if let Some(readme) = &module.readme_path {
            ctx = ctx.with_links(LinkBase::for_document(
                web_base,
                repo,
                &display_relative(Some(readme)),
            ));
        }
        ctx = ctx.with_project_url(format!("{web_base}/{}", repo.slug));
    }
    ctx
}

/// Repository-style path with forward slashes.
fn display_relative(path: Option<&Path>) -> String {
    path.map(|p| {
        p.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    })
    .unwrap_or_default()
}
