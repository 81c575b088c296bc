//! Destination writes and the end-of-run report.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::SyncError;

/// Writes files below a site root, each destination at most once.
#[derive(Debug)]
pub struct DocWriter {
    root: PathBuf,
    written: HashSet<PathBuf>,
}

impl DocWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `content` to `relative`, creating parent directories.
    ///
    /// The content goes to a temporary file in the destination directory which
    /// is then renamed over the destination, so readers never see a partial file.
    pub fn write(&mut self, relative: &Path, content: &str) -> Result<PathBuf, SyncError> {
        let path = self.root.join(relative);
        if !self.written.insert(path.clone()) {
            return Err(SyncError::DuplicateWrite(path));
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        std::fs::create_dir_all(&dir).map_err(|e| SyncError::write(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| SyncError::write(&path, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| SyncError::write(&path, e))?;
        tmp.persist(&path)
            .map_err(|e| SyncError::write(&path, e.error))?;

        debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(path)
    }

    /// Removes `relative` with everything below it and recreates it empty.
    pub fn reset_dir(&self, relative: &Path) -> Result<PathBuf, SyncError> {
        let path = self.root.join(relative);
        match std::fs::remove_dir_all(&path) {
            Ok(()) => info!(dir = %path.display(), "Removed previous output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::write(&path, e)),
        }
        std::fs::create_dir_all(&path).map_err(|e| SyncError::write(&path, e))?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Placeholder,
    Error,
}

impl Outcome {
    fn marker(&self) -> &'static str {
        match self {
            Outcome::Success => "✓",
            Outcome::Placeholder => "⚠",
            Outcome::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub category: String,
    pub name: String,
    pub outcome: Outcome,
    pub detail: Option<String>,
}

impl ItemReport {
    pub fn new(category: impl Into<String>, name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: usize,
    pub success: usize,
    pub placeholder: usize,
    pub error: usize,
}

/// Outcome of every item of a run, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub title: String,
    items: Vec<ItemReport>,
}

impl RunReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    pub fn record(&mut self, item: ItemReport) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ItemReport] {
        &self.items
    }

    pub fn totals(&self) -> Totals {
        self.items.iter().fold(Totals::default(), |mut t, item| {
            t.total += 1;
            match item.outcome {
                Outcome::Success => t.success += 1,
                Outcome::Placeholder => t.placeholder += 1,
                Outcome::Error => t.error += 1,
            }
            t
        })
    }

    /// Items grouped by category, categories in first-seen order.
    pub fn by_category(&self) -> Vec<(&str, Vec<&ItemReport>)> {
        let mut groups: Vec<(&str, Vec<&ItemReport>)> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|(c, _)| *c == item.category) {
                Some((_, items)) => items.push(item),
                None => groups.push((item.category.as_str(), vec![item])),
            }
        }
        groups
    }

    /// Successes over total, rounded to a whole percent.
    pub fn coverage_percent(&self) -> u32 {
        let totals = self.totals();
        if totals.total == 0 {
            return 0;
        }
        ((totals.success as f64 / totals.total as f64) * 100.0).round() as u32
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        for (category, items) in self.by_category() {
            writeln!(f)?;
            writeln!(f, "{}:", category.to_uppercase())?;
            for item in items {
                match &item.detail {
                    Some(detail) => {
                        writeln!(f, "  {} {} ({detail})", item.outcome.marker(), item.name)?
                    }
                    None => writeln!(f, "  {} {}", item.outcome.marker(), item.name)?,
                }
            }
        }
        let totals = self.totals();
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "  Total: {}", totals.total)?;
        writeln!(f, "  Success: {}", totals.success)?;
        writeln!(f, "  Placeholder: {}", totals.placeholder)?;
        writeln!(f, "  Error: {}", totals.error)?;
        write!(f, "  Coverage: {}%", self.coverage_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_write_to_same_destination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DocWriter::new(dir.path());
        writer.write(Path::new("docs/a.md"), "one").unwrap();
        let err = writer.write(Path::new("docs/a.md"), "two").unwrap_err();
        assert!(matches!(err, SyncError::DuplicateWrite(_)));
        let content = std::fs::read_to_string(dir.path().join("docs/a.md")).unwrap();
        assert_eq!(content, "one");
    }

    #[test]
    fn write_replaces_existing_file_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "a much longer previous content").unwrap();
        DocWriter::new(dir.path())
            .write(Path::new("a.md"), "new")
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.md")).unwrap(), "new");
    }

    #[test]
    fn coverage_rounds_and_handles_empty_report() {
        let mut report = RunReport::new("Report");
        assert_eq!(report.coverage_percent(), 0);
        report.record(ItemReport::new("a", "x", Outcome::Success));
        report.record(ItemReport::new("a", "y", Outcome::Placeholder));
        report.record(ItemReport::new("b", "z", Outcome::Success));
        assert_eq!(report.coverage_percent(), 67);
        let totals = report.totals();
        assert_eq!((totals.total, totals.success, totals.placeholder), (3, 2, 1));
        let categories: Vec<_> = report.by_category().into_iter().map(|(c, _)| c).collect();
        assert_eq!(categories, ["a", "b"]);
    }
}
