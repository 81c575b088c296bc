//! Turns fetched markdown into site-ready documents.
//!
//! Every input yields a well-formed document: [`transform`] for content that
//! was found, [`placeholder`] for content that was not. Neither can fail.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{debug, error};

use crate::markup::{self, LinkBase};

/// Frontmatter descriptions are cut to this many characters.
pub const DESCRIPTION_LIMIT: usize = 160;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub description: String,
    /// Keys of a frontmatter block the source already carried.
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformedDoc {
    pub front_matter: FrontMatter,
    pub body: String,
}

impl TransformedDoc {
    pub fn title(&self) -> &str {
        &self.front_matter.title
    }

    pub fn description(&self) -> &str {
        &self.front_matter.description
    }

    /// Frontmatter block, blank line, body.
    pub fn render(&self) -> String {
        let yaml = match serde_yaml::to_string(&self.front_matter) {
            Ok(yaml) => yaml,
            Err(e) => {
                error!(error = ?e, title = %self.front_matter.title, "Failed to serialize frontmatter, falling back to quoted fields");
                format!(
                    "title: {:?}\ndescription: {:?}\n",
                    self.front_matter.title, self.front_matter.description
                )
            }
        };
        format!("---\n{yaml}---\n\n{}", self.body)
    }
}

/// What the transformer needs to know about the document besides its content.
#[derive(Debug, Clone, Default)]
pub struct DocContext {
    /// Title used when the content has no level-1 heading.
    pub fallback_title: String,
    /// Enables relative link rewriting.
    pub links: Option<LinkBase>,
    /// Linked from placeholder documents.
    pub project_url: Option<String>,
}

impl DocContext {
    pub fn new(fallback_title: impl Into<String>) -> Self {
        Self {
            fallback_title: fallback_title.into(),
            ..Self::default()
        }
    }

    pub fn with_links(mut self, links: LinkBase) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_project_url(mut self, url: impl Into<String>) -> Self {
        self.project_url = Some(url.into());
        self
    }
}

/// File stem of a source path: `docs/TOTP.md` -> `TOTP`.
pub fn base_name(source_path: &str) -> String {
    Path::new(source_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_path.to_string())
}

pub fn default_description(title: &str) -> String {
    format!("Documentation for {title}")
}

/// Rewrites `raw` for the site.
///
/// An existing leading frontmatter block is absorbed, so transforming already
/// transformed output gives back the same document.
pub fn transform(raw: &str, ctx: &DocContext) -> TransformedDoc {
    let (existing, body) = split_front_matter(raw);
    let body = body.trim_start_matches(|c| c == '\n' || c == '\r');

    let heading = first_heading(body);
    let title = existing
        .title
        .clone()
        .or_else(|| heading.as_ref().map(|(title, _)| title.clone()))
        .unwrap_or_else(|| ctx.fallback_title.clone());
    let description = existing
        .description
        .clone()
        .or_else(|| heading.as_ref().and_then(|(_, line)| first_paragraph_after(body, *line)))
        .unwrap_or_else(|| default_description(&title));

    debug!(title = %title, description_len = description.len(), "Derived frontmatter");

    TransformedDoc {
        front_matter: FrontMatter {
            title,
            description,
            extra: existing.extra,
        },
        body: markup::neutralize(body, ctx.links.as_ref()),
    }
}

/// Stand-in document for a source that could not be found.
pub fn placeholder(ctx: &DocContext) -> TransformedDoc {
    let title = ctx.fallback_title.clone();
    let source_line = match &ctx.project_url {
        Some(url) => format!(" Until then, see the [source project]({url}) for details."),
        None => String::new(),
    };
    let body = format!(
        "# {title}\n\n:::info Documentation coming soon\n\nThis page has not been written yet.{source_line}\n\n:::\n"
    );
    TransformedDoc {
        front_matter: FrontMatter {
            description: default_description(&title),
            title,
            extra: Mapping::new(),
        },
        body: markup::neutralize(&body, None),
    }
}

#[derive(Debug, Default)]
struct ExistingFrontMatter {
    title: Option<String>,
    description: Option<String>,
    extra: Mapping,
}

#[derive(Deserialize)]
struct RawFrontMatter {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(flatten)]
    extra: Mapping,
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Splits a leading `---` YAML block off `raw`. Content whose leading block is
/// not a YAML mapping is returned whole.
fn split_front_matter(raw: &str) -> (ExistingFrontMatter, &str) {
    let content = raw.trim_start_matches('\u{feff}');
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (ExistingFrontMatter::default(), content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            if yaml.trim().is_empty() {
                return (ExistingFrontMatter::default(), body);
            }
            return match serde_yaml::from_str::<RawFrontMatter>(yaml) {
                Ok(parsed) => (
                    ExistingFrontMatter {
                        title: parsed.title.and_then(scalar_to_string),
                        description: parsed.description.and_then(scalar_to_string),
                        extra: parsed.extra,
                    },
                    body,
                ),
                Err(e) => {
                    debug!(error = %e, "Leading block is not YAML frontmatter, keeping it in the body");
                    (ExistingFrontMatter::default(), content)
                }
            };
        }
        offset += line.len();
    }
    (ExistingFrontMatter::default(), content)
}

/// First level-1 heading outside fenced code, with its line index.
fn first_heading(body: &str) -> Option<(String, usize)> {
    markup::classify_lines(body)
        .into_iter()
        .enumerate()
        .filter(|(_, (fenced, _))| !fenced)
        .find_map(|(index, (_, line))| {
            let text = line.strip_prefix("# ")?;
            let text = text.trim().trim_end_matches('#').trim_end();
            (!text.is_empty()).then(|| (text.to_string(), index))
        })
}

fn starts_paragraph(line: &str) -> bool {
    let trimmed = line.trim_start();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    let ordered_list = trimmed
        .split_once(['.', ')'])
        .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    !(matches!(first, '#' | '|' | '>' | '-' | '*' | '+' | '<' | '!' | '=' | '`' | '~')
        || trimmed.starts_with("[!")
        || trimmed.starts_with(":::")
        || ordered_list)
}

/// The paragraph right after the heading at `heading_line`, cut to
/// [`DESCRIPTION_LIMIT`] characters.
fn first_paragraph_after(body: &str, heading_line: usize) -> Option<String> {
    let lines = markup::classify_lines(body);
    let mut rest = lines
        .into_iter()
        .skip(heading_line + 1)
        .skip_while(|(fenced, line)| !fenced && line.trim().is_empty())
        .peekable();

    match rest.peek() {
        Some((false, line)) if starts_paragraph(line) => {}
        _ => return None,
    }

    let paragraph = rest
        .take_while(|(fenced, line)| !fenced && !line.trim().is_empty())
        .map(|(_, line)| line.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let description: String = paragraph.chars().take(DESCRIPTION_LIMIT).collect();
    let description = description.trim_end().to_string();
    Some(description).filter(|d| !d.is_empty())
}
