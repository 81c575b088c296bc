//! Single-pass markdown span classifier and MDX-safe renderer.
//!
//! MDX treats anything shaped like `<Name ...>` as a JSX element, so README
//! prose such as `returns List<UserEntity>` breaks the site build. The body is
//! split once into spans:
//!
//! - fenced code blocks and inline code, emitted byte for byte;
//! - generic-type tokens (`Map<String, Object>`, `Map&lt;K, V&gt;`), emitted as
//!   inline code;
//! - tag-like tokens (`<UserEntity>`, `<my-tag>`, `&lt;div&gt;`, `</div>`),
//!   emitted as inline code;
//! - plain text, where relative links are rewritten against the source
//!   repository.
//!
//! Tokens that contain a `/` after the tag name (URL autolinks, self-closing
//! tags, `<a href="https://...">`) are valid MDX and stay untouched, and so
//! does the closing tag of an element left that way. An opener with no `>`
//! before a blank line is quoted up to its name.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::config::Repository;

/// Upper bound on the length of a generic-type token, in bytes.
const MAX_GENERIC_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    FencedCode(&'a str),
    InlineCode(&'a str),
    GenericType(&'a str),
    Tag(&'a str),
    Text(&'a str),
}

/// Base for turning repository-relative link targets into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBase {
    /// `https://github.com/org/repo/blob/branch`
    blob_root: String,
    /// Directory of the document inside the repository, without slashes at the ends.
    base_dir: String,
}

impl LinkBase {
    pub fn new(web_base_url: &str, repo: &Repository, base_dir: &str) -> Self {
        Self {
            blob_root: format!(
                "{}/{}/blob/{}",
                web_base_url.trim_end_matches('/'),
                repo.slug.trim_matches('/'),
                repo.branch
            ),
            base_dir: base_dir.trim_matches('/').to_string(),
        }
    }

    /// Link base for a document at `source_path` inside `repo`.
    pub fn for_document(web_base_url: &str, repo: &Repository, source_path: &str) -> Self {
        let trimmed = source_path.trim_start_matches("./").trim_start_matches('/');
        let dir = trimmed.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        Self::new(web_base_url, repo, dir)
    }

    pub fn resolve(&self, target: &str) -> String {
        if let Some(rooted) = target.strip_prefix('/') {
            format!("{}/{}", self.blob_root, rooted)
        } else if self.base_dir.is_empty() {
            format!("{}/{}", self.blob_root, target)
        } else {
            format!("{}/{}/{}", self.blob_root, self.base_dir, target)
        }
    }
}

/// Splits `input` into classified spans. Concatenating the raw text of all
/// spans gives back `input`.
pub fn tokenize(input: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut raw_open = Vec::new();
    for (fenced, block) in split_fences(input) {
        if fenced {
            spans.push(Span::FencedCode(block));
        } else {
            scan_inline(block, &mut spans, &mut raw_open);
        }
    }
    spans
}

/// Renders `input` so that no JSX-like token survives outside code and every
/// relative link points at the source repository.
pub fn neutralize(input: &str, links: Option<&LinkBase>) -> String {
    let mut out = String::with_capacity(input.len() + 64);
    for span in tokenize(input) {
        match span {
            Span::FencedCode(raw) | Span::InlineCode(raw) => out.push_str(raw),
            Span::GenericType(raw) | Span::Tag(raw) => {
                out.push('`');
                out.push_str(&decode_angle_entities(raw));
                out.push('`');
            }
            Span::Text(raw) => match links {
                Some(base) => {
                    let at_line_start = out.is_empty() || out.ends_with('\n');
                    out.push_str(&rewrite_links(raw, base, at_line_start));
                }
                None => out.push_str(raw),
            },
        }
    }
    out
}

/// Lines of `input` tagged with whether they belong to a fenced code block.
pub(crate) fn classify_lines(input: &str) -> Vec<(bool, &str)> {
    split_fences(input)
        .into_iter()
        .flat_map(|(fenced, block)| block.lines().map(move |line| (fenced, line)))
        .collect()
}

struct Fence {
    marker: u8,
    len: usize,
}

fn fence_open(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    let marker = *trimmed.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = trimmed.bytes().take_while(|&b| b == marker).count();
    if len < 3 || (marker == b'`' && trimmed[len..].contains('`')) {
        return None;
    }
    Some(Fence { marker, len })
}

fn fence_closes(line: &str, fence: &Fence) -> bool {
    let trimmed = line.trim();
    let len = trimmed.bytes().take_while(|&b| b == fence.marker).count();
    len >= fence.len && len == trimmed.len()
}

/// `(is_fenced, slice)` blocks; an unterminated fence runs to the end of input.
fn split_fences(input: &str) -> Vec<(bool, &str)> {
    let mut blocks = Vec::new();
    let mut block_start = 0;
    let mut offset = 0;
    let mut open: Option<Fence> = None;

    for line in input.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(|c| c == '\n' || c == '\r');
        match &open {
            None => {
                if let Some(fence) = fence_open(content) {
                    if line_start > block_start {
                        blocks.push((false, &input[block_start..line_start]));
                    }
                    block_start = line_start;
                    open = Some(fence);
                }
            }
            Some(fence) => {
                if fence_closes(content, fence) {
                    blocks.push((true, &input[block_start..offset]));
                    block_start = offset;
                    open = None;
                }
            }
        }
    }
    if block_start < input.len() {
        blocks.push((open.is_some(), &input[block_start..]));
    }
    blocks
}

fn push_text<'a>(spans: &mut Vec<Span<'a>>, text: &'a str) {
    if !text.is_empty() {
        spans.push(Span::Text(text));
    }
}

/// `raw_open` holds names of elements left as JSX whose closing tag is still
/// to come.
fn scan_inline<'a>(text: &'a str, spans: &mut Vec<Span<'a>>, raw_open: &mut Vec<&'a str>) {
    let bytes = text.as_bytes();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => {
                let run = run_length(bytes, i, b'`');
                match closing_run(bytes, i + run, run) {
                    Some(end) => {
                        push_text(spans, &text[plain_start..i]);
                        spans.push(Span::InlineCode(&text[i..end]));
                        i = end;
                        plain_start = end;
                    }
                    None => i += run,
                }
            }
            b'<' | b'&' => {
                let Some(open_len) = opener_len(text, i) else {
                    i += 1;
                    continue;
                };
                let ident_start = ident_start_before(bytes, i, plain_start);
                if ident_start < i && bytes[ident_start].is_ascii_alphabetic() {
                    if let Some(end) = type_args_end(text, i) {
                        push_text(spans, &text[plain_start..ident_start]);
                        spans.push(Span::GenericType(&text[ident_start..end]));
                        i = end;
                        plain_start = end;
                        continue;
                    }
                }
                let quote_end = match tag_token(text, i) {
                    Some(TagToken::Quoted(end)) => end,
                    Some(TagToken::RawOpen { name, end }) => {
                        raw_open.push(name);
                        i = end;
                        continue;
                    }
                    Some(TagToken::Closing { name, end }) => {
                        match raw_open.iter().rposition(|open| *open == name) {
                            Some(pos) => {
                                raw_open.truncate(pos);
                                i = end;
                                continue;
                            }
                            None => end,
                        }
                    }
                    None => {
                        i += open_len;
                        continue;
                    }
                };
                push_text(spans, &text[plain_start..i]);
                spans.push(Span::Tag(&text[i..quote_end]));
                i = quote_end;
                plain_start = quote_end;
            }
            _ => i += 1,
        }
    }
    push_text(spans, &text[plain_start..]);
}

fn run_length(bytes: &[u8], start: usize, byte: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == byte).count()
}

/// End of the first backtick run of exactly `len` starting at or after `from`.
/// Code spans do not cross a blank line.
fn closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'`' => {
                let run = run_length(bytes, j, b'`');
                if run == len {
                    return Some(j + run);
                }
                j += run;
            }
            b'\n' if blank_line_follows(bytes, j) => return None,
            _ => j += 1,
        }
    }
    None
}

/// True when the newline at `nl` is followed by a whitespace-only line.
fn blank_line_follows(bytes: &[u8], nl: usize) -> bool {
    let blank = bytes[nl + 1..]
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t' || b == b'\r')
        .count();
    bytes.get(nl + 1 + blank) == Some(&b'\n')
}

fn opener_len(text: &str, at: usize) -> Option<usize> {
    let rest = &text[at..];
    if rest.starts_with('<') {
        Some(1)
    } else if rest.starts_with("&lt;") {
        Some(4)
    } else {
        None
    }
}

fn closer_len(text: &str, at: usize) -> Option<usize> {
    let rest = &text[at..];
    if rest.starts_with('>') {
        Some(1)
    } else if rest.starts_with("&gt;") {
        Some(4)
    } else {
        None
    }
}

fn ident_start_before(bytes: &[u8], at: usize, floor: usize) -> usize {
    let mut j = at;
    while j > floor && (bytes[j - 1].is_ascii_alphanumeric() || bytes[j - 1] == b'_') {
        j -= 1;
    }
    j
}

/// End of a balanced `<...>` type argument list opening at `open`.
fn type_args_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut saw_name = false;
    let mut j = open;

    while j < bytes.len() && j - open <= MAX_GENERIC_LEN {
        if let Some(n) = opener_len(text, j) {
            depth += 1;
            j += n;
            continue;
        }
        if let Some(n) = closer_len(text, j) {
            depth -= 1;
            j += n;
            if depth == 0 {
                return saw_name.then_some(j);
            }
            continue;
        }
        match bytes[j] {
            b if b.is_ascii_alphanumeric() || b == b'_' => saw_name = true,
            b' ' | b',' | b'.' | b'?' | b'[' | b']' | b':' | b'*' => {}
            _ => return None,
        }
        j += 1;
    }
    None
}

fn tag_name_end(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start)?.is_ascii_alphabetic() {
        return None;
    }
    let len = bytes[start..]
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        .count();
    Some(start + len)
}

enum TagToken<'a> {
    /// Quote `start..end` as inline code.
    Quoted(usize),
    /// An element with attributes that MDX accepts as written.
    RawOpen { name: &'a str, end: usize },
    Closing { name: &'a str, end: usize },
}

/// Classifies the tag-like token starting at `start` (`<` or `&lt;`).
fn tag_token(text: &str, start: usize) -> Option<TagToken<'_>> {
    let bytes = text.as_bytes();

    if text[start..].starts_with("&lt;") {
        let name_end = tag_name_end(bytes, start + 4)?;
        return text[name_end..]
            .starts_with("&gt;")
            .then_some(TagToken::Quoted(name_end + 4));
    }

    let closing = bytes.get(start + 1) == Some(&b'/');
    let name_start = if closing { start + 2 } else { start + 1 };
    let name_end = tag_name_end(bytes, name_start)?;
    let name = &text[name_start..name_end];

    if closing {
        let k = name_end + bytes[name_end..].iter().take_while(|&&b| b == b' ').count();
        return (bytes.get(k) == Some(&b'>')).then_some(TagToken::Closing { name, end: k + 1 });
    }

    let mut saw_slash = false;
    let mut k = name_end;
    while k < bytes.len() {
        match bytes[k] {
            b'>' if !saw_slash => return Some(TagToken::Quoted(k + 1)),
            b'>' => {
                let has_attributes = bytes[name_end].is_ascii_whitespace();
                if bytes[k - 1] == b'/' || !has_attributes {
                    return None;
                }
                return Some(TagToken::RawOpen { name, end: k + 1 });
            }
            b'/' => saw_slash = true,
            b'<' | b'`' => break,
            b'\n' if blank_line_follows(bytes, k) => break,
            _ => {}
        }
        k += 1;
    }
    // Unterminated opener.
    Some(TagToken::Quoted(name_end))
}

fn decode_angle_entities(raw: &str) -> String {
    raw.replace("&lt;", "<").replace("&gt;", ">")
}

fn inline_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\]\((\s*)([^)\s]+)((?:\s+(?:"[^"]*"|'[^']*'))?\s*)\)"#)
            .expect("inline link pattern is valid")
    })
}

fn reference_definition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^( {0,3}\[[^\]^\n][^\]\n]*\]:[ \t]*)(\S+)")
            .expect("reference definition pattern is valid")
    })
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern is valid")
    })
}

/// True for targets that must not be rewritten: URLs with a scheme,
/// protocol-relative URLs and in-page anchors.
pub fn is_absolute_target(target: &str) -> bool {
    target.starts_with('#') || target.starts_with("//") || scheme_pattern().is_match(target)
}

fn rewrite_target(target: &str, base: &LinkBase) -> String {
    if is_absolute_target(target) {
        target.to_string()
    } else {
        base.resolve(target)
    }
}

fn rewrite_links(text: &str, base: &LinkBase, at_line_start: bool) -> String {
    let inline = inline_link_pattern().replace_all(text, |caps: &Captures<'_>| {
        format!(
            "]({}{}{})",
            &caps[1],
            rewrite_target(&caps[2], base),
            &caps[3]
        )
    });

    // A span that starts mid-line cannot begin with a reference definition.
    let (head, tail) = if at_line_start {
        ("", inline.as_ref())
    } else {
        match inline.find('\n') {
            Some(nl) => inline.split_at(nl + 1),
            None => return inline.to_string(),
        }
    };
    let tail = reference_definition_pattern().replace_all(tail, |caps: &Captures<'_>| {
        format!("{}{}", &caps[1], rewrite_target(&caps[2], base))
    });
    format!("{head}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> LinkBase {
        let repo = Repository {
            id: "core".into(),
            slug: "org/repo".into(),
            branch: "main".into(),
            local_path: None,
        };
        LinkBase::for_document("https://github.com", &repo, "service/auth/README.md")
    }

    #[test]
    fn spans_concatenate_back_to_input() {
        let input = "# T\n\nUse `x<y>` and Map<K, V> or <div>.\n```\nList<T>\n```\ntail &lt;b&gt;\n";
        let joined: String = tokenize(input)
            .into_iter()
            .map(|span| match span {
                Span::FencedCode(s)
                | Span::InlineCode(s)
                | Span::GenericType(s)
                | Span::Tag(s)
                | Span::Text(s) => s,
            })
            .collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn classifies_each_kind_of_span() {
        let spans = tokenize("a `c` Map<K, V> <UserEntity> </p>\n~~~\n<x>\n~~~\n");
        assert_eq!(
            spans,
            vec![
                Span::Text("a "),
                Span::InlineCode("`c`"),
                Span::Text(" "),
                Span::GenericType("Map<K, V>"),
                Span::Text(" "),
                Span::Tag("<UserEntity>"),
                Span::Text(" "),
                Span::Tag("</p>"),
                Span::Text("\n"),
                Span::FencedCode("~~~\n<x>\n~~~\n"),
            ]
        );
    }

    #[test]
    fn nested_generics_are_one_token() {
        let spans = tokenize("returns Map<String, List<Long>> now");
        assert_eq!(spans[1], Span::GenericType("Map<String, List<Long>>"));
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let spans = tokenize("intro\n```java\nList<T> items;\n");
        assert_eq!(spans.last(), Some(&Span::FencedCode("```java\nList<T> items;\n")));
    }

    #[test]
    fn unmatched_backtick_is_plain_text() {
        let out = neutralize("a ` b <Tag> c", None);
        assert_eq!(out, "a ` b `<Tag>` c");
    }

    #[test]
    fn comparisons_and_autolinks_are_left_alone() {
        let input = "if a < b and c <= d see <https://example.com/x> or <br/>";
        assert_eq!(neutralize(input, None), input);
    }

    #[test]
    fn anchor_with_url_attribute_stays_a_balanced_element() {
        let input = "Visit <a href=\"https://x.io\">site</a> now.\n";
        assert_eq!(neutralize(input, None), input);
    }

    #[test]
    fn stray_closing_tag_is_quoted_but_one_closing_a_raw_element_is_not() {
        let out = neutralize("<a href=\"/x\">a</a> then </a>\n", None);
        assert_eq!(out, "<a href=\"/x\">a</a> then `</a>`\n");
    }

    #[test]
    fn tag_split_across_lines_is_quoted_with_its_closer() {
        let out = neutralize("Before <div\n  class=\"x\">inside</div> after\n", None);
        assert_eq!(out, "Before `<div\n  class=\"x\">`inside`</div>` after\n");
    }

    #[test]
    fn unterminated_opener_is_quoted_up_to_its_name() {
        assert_eq!(
            neutralize("Use <Component to render\n", None),
            "Use `<Component` to render\n"
        );
        assert_eq!(
            neutralize("Open <Panel\n\nwith text>\n", None),
            "Open `<Panel`\n\nwith text>\n"
        );
    }

    #[test]
    fn relative_targets_resolve_against_document_directory() {
        let b = base();
        assert_eq!(
            b.resolve("./TOTP.md"),
            "https://github.com/org/repo/blob/main/service/auth/./TOTP.md"
        );
        assert_eq!(
            b.resolve("/docs/DEPLOY.md"),
            "https://github.com/org/repo/blob/main/docs/DEPLOY.md"
        );
    }

    #[test]
    fn anchors_and_schemes_are_absolute() {
        assert!(is_absolute_target("#usage"));
        assert!(is_absolute_target("mailto:team@example.com"));
        assert!(is_absolute_target("https://example.com"));
        assert!(!is_absolute_target("../client/README.md"));
    }

    #[test]
    fn reference_definitions_are_rewritten_but_footnotes_are_not() {
        let out = neutralize("[guide]: ./guide.md\n[^1]: a note\n", Some(&base()));
        assert_eq!(
            out,
            "[guide]: https://github.com/org/repo/blob/main/service/auth/./guide.md\n[^1]: a note\n"
        );
    }
}
