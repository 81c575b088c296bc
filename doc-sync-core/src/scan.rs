//! Module discovery for the generation pipeline.
//!
//! The codebase is laid out as `<type folder>/<prefix>-<name>/`, e.g.
//! `service/service-auth/`. Each module directory may carry a README at one of
//! a few candidate locations. `application/` at the root is a single module of
//! its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::GenerateConfig;
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Service,
    Client,
    Business,
    Data,
    Framework,
    Application,
}

impl ModuleType {
    /// Directory name prefixes that classify a module, checked in order.
    pub const PREFIXES: [(&'static str, ModuleType); 5] = [
        ("service-", ModuleType::Service),
        ("client-", ModuleType::Client),
        ("business-", ModuleType::Business),
        ("data-", ModuleType::Data),
        ("framework-", ModuleType::Framework),
    ];

    pub const ALL: [ModuleType; 6] = [
        ModuleType::Service,
        ModuleType::Client,
        ModuleType::Business,
        ModuleType::Data,
        ModuleType::Framework,
        ModuleType::Application,
    ];

    pub fn from_dir_name(name: &str) -> Option<ModuleType> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Service => "service",
            ModuleType::Client => "client",
            ModuleType::Business => "business",
            ModuleType::Data => "data",
            ModuleType::Framework => "framework",
            ModuleType::Application => "application",
        }
    }

    /// Sidebar label: `service` -> `Service`.
    pub fn label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub module_type: ModuleType,
    pub source_dir: PathBuf,
    pub readme_content: Option<String>,
    /// Path of the README that was found, relative to the scan root.
    pub readme_path: Option<PathBuf>,
}

impl ModuleDescriptor {
    pub fn has_readme(&self) -> bool {
        self.readme_content.is_some()
    }
}

/// Discovered modules grouped by type, in [`ModuleType::ALL`] order.
#[derive(Debug, Clone, Default)]
pub struct ModuleInventory {
    groups: Vec<(ModuleType, Vec<ModuleDescriptor>)>,
}

impl ModuleInventory {
    fn push(&mut self, module: ModuleDescriptor) {
        match self.groups.iter_mut().find(|(kind, _)| *kind == module.module_type) {
            Some((_, modules)) => modules.push(module),
            None => self.groups.push((module.module_type, vec![module])),
        }
    }

    fn sort_groups(&mut self) {
        self.groups
            .sort_by_key(|(kind, _)| ModuleType::ALL.iter().position(|k| k == kind));
    }

    /// Non-empty groups only.
    pub fn groups(&self) -> impl Iterator<Item = (ModuleType, &[ModuleDescriptor])> {
        self.groups
            .iter()
            .filter(|(_, modules)| !modules.is_empty())
            .map(|(kind, modules)| (*kind, modules.as_slice()))
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.groups.iter().flat_map(|(_, modules)| modules.iter())
    }

    pub fn len(&self) -> usize {
        self.modules().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub module_folders: Vec<String>,
    pub readme_candidates: Vec<String>,
    pub application_dir: String,
    pub application_readme: String,
}

impl ScanConfig {
    pub fn from_generate(config: &GenerateConfig) -> Self {
        Self {
            root: config.source_root.clone(),
            module_folders: config.module_folders.clone(),
            readme_candidates: config.readme_candidates.clone(),
            application_dir: "application".to_string(),
            application_readme: "README.md".to_string(),
        }
    }
}

pub struct ModuleScanner {
    config: ScanConfig,
}

impl ModuleScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Walks the module folders. Missing folders and READMEs are not errors; an
    /// unreadable scan root or module folder is.
    pub fn scan(&self) -> Result<ModuleInventory, SyncError> {
        let root = &self.config.root;
        info!(root = %root.display(), "Scanning for modules");
        if !root.is_dir() {
            return Err(SyncError::Scan {
                path: root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "scan root is not a directory",
                ),
            });
        }

        let mut inventory = ModuleInventory::default();
        for folder in &self.config.module_folders {
            let folder_path = root.join(folder);
            if !folder_path.is_dir() {
                debug!(folder = %folder_path.display(), "Module folder missing, skipping");
                continue;
            }
            info!(folder = %folder, "Scanning module folder");

            for dir_name in sorted_subdirectories(&folder_path)? {
                let Some(module_type) = ModuleType::from_dir_name(&dir_name) else {
                    debug!(folder = %folder, dir = %dir_name, "Directory matches no module prefix, excluding");
                    continue;
                };
                let module_dir = folder_path.join(&dir_name);
                let (readme_content, readme_path) =
                    self.find_readme(&module_dir, &self.config.readme_candidates);
                inventory.push(ModuleDescriptor {
                    name: dir_name,
                    module_type,
                    source_dir: module_dir,
                    readme_content,
                    readme_path,
                });
            }
        }

        let application_dir = root.join(&self.config.application_dir);
        if application_dir.is_dir() {
            let candidates = [self.config.application_readme.clone()];
            let (readme_content, readme_path) = self.find_readme(&application_dir, &candidates);
            inventory.push(ModuleDescriptor {
                name: self.config.application_dir.clone(),
                module_type: ModuleType::Application,
                source_dir: application_dir,
                readme_content,
                readme_path,
            });
        }

        inventory.sort_groups();
        info!(
            modules = inventory.len(),
            with_readme = inventory.modules().filter(|m| m.has_readme()).count(),
            "Module scan complete"
        );
        Ok(inventory)
    }

    fn find_readme(
        &self,
        module_dir: &Path,
        candidates: &[String],
    ) -> (Option<String>, Option<PathBuf>) {
        for candidate in candidates {
            let path = module_dir.join(candidate);
            if !path.is_file() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let relative = path
                        .strip_prefix(&self.config.root)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| path.clone());
                    debug!(readme = %relative.display(), "Found README");
                    return (Some(content), Some(relative));
                }
                Err(e) => {
                    warn!(error = ?e, path = %path.display(), "README exists but could not be read");
                }
            }
        }
        (None, None)
    }
}

fn sorted_subdirectories(dir: &Path) -> Result<Vec<String>, SyncError> {
    let scan_error = |source| SyncError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
