/// `load_config` module: parses the YAML run configuration into the typed
/// configs of `doc-sync-core`.
///
/// This is the only place where YAML is read. Every section is validated here,
/// so a bad mapping table is reported before anything is fetched or written.
///
/// # Sources
/// - a file given with `--config`;
/// - otherwise the compiled-in `default-config.yaml` (the Strategiz mapping table).
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use doc_sync_core::config::{GenerateConfig, ScheduleConfig, SiteConfig, SyncConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_CONFIG: &str = include_str!("../default-config.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub sync: Option<SyncConfig>,
    #[serde(default)]
    pub generate: Option<GenerateConfig>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl CliConfig {
    pub fn sync(&self) -> Result<&SyncConfig> {
        self.sync
            .as_ref()
            .context("configuration has no 'sync' section")
    }

    pub fn generate(&self) -> Result<&GenerateConfig> {
        self.generate
            .as_ref()
            .context("configuration has no 'generate' section")
    }
}

/// Loads and validates a YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    parse_config(&config_content)
        .with_context(|| format!("Invalid config file {}", path_ref.display()))
}

/// The compiled-in configuration.
pub fn load_default() -> Result<CliConfig> {
    info!("No config file given, using the built-in configuration");
    parse_config(DEFAULT_CONFIG).context("Invalid built-in configuration")
}

/// `--config` when given, otherwise the built-in configuration.
pub fn resolve_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => load_default(),
    }
}

pub fn parse_config(content: &str) -> Result<CliConfig> {
    let config: CliConfig = match serde_yaml::from_str(content) {
        Ok(conf) => {
            info!("Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(sync) = &config.sync {
        sync.validate()?;
        sync.trace_loaded();
    }
    if let Some(generate) = &config.generate {
        generate.validate()?;
        generate.trace_loaded();
    }
    config.schedule.validate()?;
    Ok(config)
}
