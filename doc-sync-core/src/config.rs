use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::SyncError;

pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_INTERVAL_HOURS: u64 = 5;

/// Layout of the documentation site being written to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Docs directory relative to `root`; doc ids are computed against it.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    /// Sidebar manifest relative to `root`.
    #[serde(default = "default_sidebar_path")]
    pub sidebar_path: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            docs_dir: default_docs_dir(),
            sidebar_path: default_sidebar_path(),
        }
    }
}

/// A repository documents are pulled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    /// `org/repo` on the content host.
    pub slug: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Co-located checkout; when set, documents are read from disk.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
}

/// Declared pairing of a source document to a destination in the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMapping {
    /// Path inside the source repository.
    pub source: String,
    /// Id of the [`Repository`] the source lives in.
    pub repo: String,
    /// Path relative to the site root.
    pub destination: String,
}

/// Configuration of the fetch-based sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_sync_sidebar_id")]
    pub sidebar_id: String,
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub mappings: Vec<DocMapping>,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            repositories = self.repositories.len(),
            mappings = self.mappings.len(),
            raw_base_url = %self.raw_base_url,
            "Loaded sync config"
        );
        debug!(?self, "Sync config loaded (full debug)");
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn repository(&self, id: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.id == id)
    }

    /// Rejects configurations a run could not process unambiguously.
    ///
    /// Two mappings writing the same destination are an error rather than a
    /// silent last-one-wins.
    pub fn validate(&self) -> Result<(), SyncError> {
        let mut ids = HashSet::new();
        for repo in &self.repositories {
            validate_repository(repo)?;
            if !ids.insert(repo.id.as_str()) {
                return Err(SyncError::Config(format!(
                    "repository id '{}' is declared more than once",
                    repo.id
                )));
            }
        }

        let mut destinations: HashMap<PathBuf, &DocMapping> = HashMap::new();
        for mapping in &self.mappings {
            if !ids.contains(mapping.repo.as_str()) {
                return Err(SyncError::Config(format!(
                    "mapping for '{}' references unknown repository '{}'",
                    mapping.source, mapping.repo
                )));
            }
            if mapping.source.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "mapping to '{}' has an empty source path",
                    mapping.destination
                )));
            }
            let normalized = normalize_relative(&mapping.destination).ok_or_else(|| {
                SyncError::Config(format!(
                    "destination '{}' must be a relative path inside the site",
                    mapping.destination
                ))
            })?;
            if let Some(previous) = destinations.insert(normalized, mapping) {
                return Err(SyncError::Config(format!(
                    "destination '{}' is declared by both {}:{} and {}:{}",
                    mapping.destination,
                    previous.repo,
                    previous.source,
                    mapping.repo,
                    mapping.source
                )));
            }
        }
        Ok(())
    }
}

/// Configuration of the scanner-based generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Local checkout of the modular codebase.
    pub source_root: PathBuf,
    /// Output directory relative to the site's docs dir. Rebuilt on every run.
    pub output_dir: PathBuf,
    /// Where the checkout lives remotely; enables link rewriting.
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
    #[serde(default = "default_generate_sidebar_id")]
    pub sidebar_id: String,
    #[serde(default = "default_generate_sidebar_label")]
    pub sidebar_label: String,
    #[serde(default = "default_module_folders")]
    pub module_folders: Vec<String>,
    #[serde(default = "default_readme_candidates")]
    pub readme_candidates: Vec<String>,
}

impl GenerateConfig {
    pub fn trace_loaded(&self) {
        info!(
            source_root = %self.source_root.display(),
            output_dir = %self.output_dir.display(),
            module_folders = ?self.module_folders,
            "Loaded generate config"
        );
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if let Some(repo) = &self.repository {
            validate_repository(repo)?;
        }
        if normalize_relative(&self.output_dir.to_string_lossy()).is_none() {
            return Err(SyncError::Config(format!(
                "generate.output_dir '{}' must be a non-empty relative path",
                self.output_dir.display()
            )));
        }
        if self.readme_candidates.is_empty() {
            return Err(SyncError::Config(
                "generate.readme_candidates must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 60 * 60)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.interval_hours == 0 {
            return Err(SyncError::Config(
                "schedule.interval_hours must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn validate_repository(repo: &Repository) -> Result<(), SyncError> {
    let mut parts = repo.slug.split('/');
    let well_formed = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(org), Some(name), None) if !org.is_empty() && !name.is_empty()
    );
    if !well_formed {
        return Err(SyncError::Config(format!(
            "repository '{}' has slug '{}', expected 'org/repo'",
            repo.id, repo.slug
        )));
    }
    if repo.branch.trim().is_empty() {
        return Err(SyncError::Config(format!(
            "repository '{}' has an empty branch",
            repo.id
        )));
    }
    Ok(())
}

/// Normalizes a relative path, dropping `.` segments. `None` for empty,
/// absolute or escaping (`..`) paths.
pub(crate) fn normalize_relative(raw: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_sidebar_path() -> PathBuf {
    PathBuf::from("sidebars.js")
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_raw_base_url() -> String {
    DEFAULT_RAW_BASE_URL.to_string()
}

fn default_web_base_url() -> String {
    DEFAULT_WEB_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_sync_sidebar_id() -> String {
    "syncedSidebar".to_string()
}

fn default_generate_sidebar_id() -> String {
    "strategizCoreSidebar".to_string()
}

fn default_generate_sidebar_label() -> String {
    "Strategiz Core".to_string()
}

fn default_module_folders() -> Vec<String> {
    ["service", "client", "business", "data", "framework"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_readme_candidates() -> Vec<String> {
    vec!["README.md".to_string(), "docs/README.md".to_string()]
}

fn default_interval_hours() -> u64 {
    DEFAULT_INTERVAL_HOURS
}
