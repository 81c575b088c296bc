//! Sidebar manifest: category tree of the docs written in a run, and its merge
//! into the site's hand-maintained `sidebars.js`.
//!
//! Each pipeline owns one marker-delimited block of the sidebars object:
//!
//! ```js
//! const sidebars = {
//!   // @generated-begin syncedSidebar
//!   "syncedSidebar": [ ... ],
//!   // @generated-end syncedSidebar
//!   tutorialSidebar: [...],
//! };
//! ```
//!
//! Everything outside the block is left exactly as it was.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::error::SyncError;
use crate::write::DocWriter;

const SIDEBARS_OPENING: &str = "const sidebars = {";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SidebarItem {
    Doc(String),
    Category(SidebarCategory),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarCategory {
    #[serde(rename = "type")]
    kind: &'static str,
    pub label: String,
    pub items: Vec<SidebarItem>,
}

impl SidebarCategory {
    pub fn new(label: impl Into<String>, items: Vec<SidebarItem>) -> Self {
        Self {
            kind: "category",
            label: label.into(),
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarManifest {
    pub id: String,
    pub items: Vec<SidebarItem>,
}

/// Collects written docs in order and groups them into categories.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    id: String,
    root_label: Option<String>,
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
enum Entry {
    Doc(String),
    Group {
        key: String,
        label: String,
        docs: Vec<String>,
    },
}

impl ManifestBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root_label: None,
            entries: Vec::new(),
        }
    }

    /// Nest every entry under a single top-level category.
    pub fn with_root_category(mut self, label: impl Into<String>) -> Self {
        self.root_label = Some(label.into());
        self
    }

    /// Adds a written doc. `group` is `(key, label)`; docs without a group are
    /// top-level entries. Groups keep the position of their first doc.
    pub fn record(&mut self, group: Option<(&str, &str)>, doc_id: impl Into<String>) {
        let doc_id = doc_id.into();
        let Some((key, label)) = group else {
            self.entries.push(Entry::Doc(doc_id));
            return;
        };
        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Group { key: k, docs, .. } if k == key => Some(docs),
            _ => None,
        });
        match existing {
            Some(docs) => docs.push(doc_id),
            None => self.entries.push(Entry::Group {
                key: key.to_string(),
                label: label.to_string(),
                docs: vec![doc_id],
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> SidebarManifest {
        let items: Vec<SidebarItem> = self
            .entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Doc(id) => SidebarItem::Doc(id),
                Entry::Group { label, docs, .. } => SidebarItem::Category(SidebarCategory::new(
                    label,
                    docs.into_iter().map(SidebarItem::Doc).collect(),
                )),
            })
            .collect();
        let items = match self.root_label {
            Some(label) if !items.is_empty() => {
                vec![SidebarItem::Category(SidebarCategory::new(label, items))]
            }
            _ => items,
        };
        SidebarManifest { id: self.id, items }
    }
}

impl SidebarManifest {
    fn begin_marker(&self) -> String {
        format!("// @generated-begin {}", self.id)
    }

    fn end_marker(&self) -> String {
        format!("// @generated-end {}", self.id)
    }

    /// Marker-delimited JS property holding this sidebar, indented for the
    /// top level of the sidebars object. Ends with a newline.
    pub fn render_block(&self) -> Result<String, SyncError> {
        let key = serde_json::to_string(&self.id)
            .map_err(|e| SyncError::Manifest(format!("failed to encode sidebar id: {e}")))?;
        let value = serde_json::to_string_pretty(&self.items)
            .map_err(|e| SyncError::Manifest(format!("failed to encode sidebar items: {e}")))?;
        let value = value.lines().collect::<Vec<_>>().join("\n  ");
        Ok(format!(
            "  {}\n  {key}: {value},\n  {}\n",
            self.begin_marker(),
            self.end_marker()
        ))
    }

    /// Merges this sidebar into the contents of an existing sidebars file,
    /// replacing a previous block with the same id. `None` means no file yet.
    pub fn merge_into(&self, existing: Option<&str>) -> Result<String, SyncError> {
        let block = self.render_block()?;
        let Some(existing) = existing else {
            return Ok(template(&block));
        };

        let begin = find_marker(existing, &self.begin_marker());
        let end = find_marker(existing, &self.end_marker());
        match (begin, end) {
            (Some(begin), Some(end)) if begin < end => {
                let start = line_start(existing, begin);
                let stop = line_end(existing, end);
                Ok(format!("{}{}{}", &existing[..start], block, &existing[stop..]))
            }
            (None, None) => {
                let opening = existing.find(SIDEBARS_OPENING).ok_or_else(|| {
                    SyncError::Manifest(format!(
                        "sidebars file has no '{SIDEBARS_OPENING}' to insert '{}' into",
                        self.id
                    ))
                })?;
                let insert_at = line_end(existing, opening);
                let mut merged = existing[..insert_at].to_string();
                if !merged.ends_with('\n') {
                    merged.push('\n');
                }
                merged.push_str(&block);
                merged.push_str(&existing[insert_at..]);
                Ok(merged)
            }
            _ => Err(SyncError::Manifest(format!(
                "sidebars file has unbalanced generated markers for '{}'",
                self.id
            ))),
        }
    }

    /// Reads the sidebars file at `relative` (under the writer root), merges
    /// this sidebar into it and writes it back.
    pub fn persist(&self, writer: &mut DocWriter, relative: &Path) -> Result<PathBuf, SyncError> {
        let path = writer.root().join(relative);
        let existing = match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No sidebars file yet, writing a fresh one");
                None
            }
            Err(e) => {
                return Err(SyncError::Manifest(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        let merged = self.merge_into(existing.as_deref())?;
        let written = writer.write(relative, &merged)?;
        info!(sidebar = %self.id, path = %written.display(), entries = self.items.len(), "Updated sidebar manifest");
        Ok(written)
    }
}

/// Doc id of `destination` relative to `docs_dir`: `docs/auth/totp.md` ->
/// `auth/totp`. `None` when the destination is outside the docs dir.
pub fn doc_id(docs_dir: &Path, destination: &Path) -> Option<String> {
    let docs_dir: PathBuf = docs_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let relative = destination.strip_prefix(&docs_dir).ok()?;
    let without_ext = relative.with_extension("");
    let parts: Vec<String> = without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// `auth` -> `Auth`, `email-otp` -> `Email Otp`.
pub fn label_for(key: &str) -> String {
    key.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Offset of `marker` where it is the whole remainder of its line, so the
/// marker of `docs` does not match the one of `docsExtra`.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    text.match_indices(marker).map(|(at, _)| at).find(|&at| {
        let rest = &text[at + marker.len()..];
        let line = rest.split('\n').next().unwrap_or("");
        line.trim_end().is_empty()
    })
}

fn line_start(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map(|nl| nl + 1).unwrap_or(0)
}

fn line_end(text: &str, at: usize) -> usize {
    text[at..].find('\n').map(|nl| at + nl + 1).unwrap_or(text.len())
}

fn template(block: &str) -> String {
    format!(
        "/**
 * Creating a sidebar enables you to:
 - create an ordered group of docs
 - render a sidebar for each doc of that group
 - provide next/previous navigation

 The sidebars can be generated from the filesystem, or explicitly defined here.

 Create as many sidebars as you want.
 */

// @ts-check

/** @type {{import('@docusaurus/plugin-content-docs').SidebarsConfig}} */
{SIDEBARS_OPENING}
{block}
  // Keep existing manual sidebars
  tutorialSidebar: [{{type: 'autogenerated', dirName: '.'}}],
}};

module.exports = sidebars;
"
    )
}
