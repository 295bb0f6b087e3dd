//! Domain types for a stencil run.
//!
//! Everything here is owned by one invocation; nothing outlives it except
//! the files the writer puts on disk.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Lines that open a block comment are skipped without ending the header.
pub const BLOCK_COMMENT_OPENER: &str = "/*";

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

/// The two-character token that introduces a directive line (`##` by default).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker(String);

impl Marker {
    /// Returns `None` unless `token` is exactly two non-whitespace characters.
    pub fn new(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) if !a.is_whitespace() && !b.is_whitespace() => {
                Some(Self(token.to_owned()))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the (already trimmed) line is the marker followed by a space.
    pub fn opens(&self, trimmed: &str) -> bool {
        trimmed
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with(' '))
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self("##".to_owned())
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// TemplateSource
// ---------------------------------------------------------------------------

/// A template file: its path, raw text, and the extent of its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub path: PathBuf,
    pub text: String,
    marker: Marker,
    header_len: usize,
}

impl TemplateSource {
    /// Wrap `text` read from `path`, locating the header with `marker`.
    ///
    /// The header is the leading run of lines that either open a block
    /// comment or start with the marker. The first other line ends it.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, marker: &Marker) -> Self {
        let text = text.into();
        let header_len = text
            .lines()
            .take_while(|line| {
                let trimmed = line.trim();
                trimmed.starts_with(BLOCK_COMMENT_OPENER) || marker.opens(trimmed)
            })
            .count();
        Self {
            path: path.into(),
            text,
            marker: marker.clone(),
            header_len,
        }
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// Header lines in source order, each paired with its 1-based line number.
    pub fn header_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.text
            .lines()
            .take(self.header_len)
            .enumerate()
            .map(|(i, line)| (i + 1, line))
    }

    /// The template body handed to the engine: the full text with the
    /// header's directive lines removed.
    pub fn body(&self) -> String {
        self.text
            .lines()
            .enumerate()
            .filter(|(i, line)| !(*i < self.header_len && self.marker.opens(line.trim())))
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Directory holding the template, used as the default include root.
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

// ---------------------------------------------------------------------------
// Directive / Binding
// ---------------------------------------------------------------------------

/// One header line declaring an output target and its raw variable list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Output file name, relative to the output directory.
    pub filename: String,
    /// Unparsed `k1=v1;k2=v2;` list.
    pub vars: String,
    /// Position among the header's directives, starting at 0.
    pub index: usize,
    /// 1-based line number in the template.
    pub line: usize,
}

/// Resolved key → value pairs for one render. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(BTreeMap<String, String>);

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair; an existing key is overwritten.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Binding {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut binding = Binding::new();
        for (k, v) in iter {
            binding.insert(k, v);
        }
        binding
    }
}

// ---------------------------------------------------------------------------
// RenderJob / RenderedOutput
// ---------------------------------------------------------------------------

/// One unit of work: the shared template, one directive, its bindings.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub source: &'a TemplateSource,
    pub directive: Directive,
    pub binding: Binding,
}

impl<'a> RenderJob<'a> {
    /// The synthetic job used when a template is rendered as a single
    /// target with no bindings.
    pub fn implicit(source: &'a TemplateSource, filename: impl Into<String>) -> Self {
        RenderJob {
            source,
            directive: Directive {
                filename: filename.into(),
                vars: String::new(),
                index: 0,
                line: 0,
            },
            binding: Binding::new(),
        }
    }
}

/// Outcome of the formatting step for one written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormatStatus {
    Formatted,
    FormatSkipped { reason: String },
}

impl FormatStatus {
    pub fn skipped(reason: impl Into<String>) -> Self {
        FormatStatus::FormatSkipped {
            reason: reason.into(),
        }
    }

    pub fn is_formatted(&self) -> bool {
        matches!(self, FormatStatus::Formatted)
    }
}

impl fmt::Display for FormatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatStatus::Formatted => write!(f, "formatted"),
            FormatStatus::FormatSkipped { reason } => write!(f, "format skipped: {reason}"),
        }
    }
}

/// A file the run produced. Exists on disk regardless of `format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedOutput {
    pub path: PathBuf,
    /// Rendered text as handed to the writer, before any formatting.
    #[serde(skip)]
    pub text: String,
    /// Size of the file on disk once the formatter has run.
    pub bytes: u64,
    #[serde(flatten)]
    pub format: FormatStatus,
}

impl RenderedOutput {
    pub fn new(path: impl Into<PathBuf>, text: String, bytes: u64, format: FormatStatus) -> Self {
        RenderedOutput {
            path: path.into(),
            text,
            bytes,
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TPL: &str = "/* generated */\n## a.hpp x=1;\n## b.hpp x=2;\nbody ${x}\n## not header\n";

    #[test]
    fn marker_requires_two_visible_chars() {
        assert!(Marker::new("##").is_some());
        assert!(Marker::new("//").is_some());
        assert!(Marker::new("#").is_none());
        assert!(Marker::new("###").is_none());
        assert!(Marker::new("# ").is_none());
    }

    #[test]
    fn marker_needs_trailing_space() {
        let m = Marker::default();
        assert!(m.opens("## out.txt a=1;"));
        assert!(!m.opens("##out.txt"));
        assert!(!m.opens("##"));
    }

    #[test]
    fn header_stops_at_first_body_line() {
        let src = TemplateSource::new("t.mako", TPL, &Marker::default());
        let header: Vec<_> = src.header_lines().collect();
        assert_eq!(header.len(), 3);
        assert_eq!(header[1], (2, "## a.hpp x=1;"));
    }

    #[test]
    fn body_drops_header_directives_only() {
        let src = TemplateSource::new("t.mako", TPL, &Marker::default());
        assert_eq!(src.body(), "/* generated */\nbody ${x}\n## not header");
    }

    #[test]
    fn dir_defaults_to_current() {
        let src = TemplateSource::new("t.mako", "", &Marker::default());
        assert_eq!(src.dir(), Path::new("."));
        let src = TemplateSource::new("gen/t.mako", "", &Marker::default());
        assert_eq!(src.dir(), Path::new("gen"));
    }

    #[test]
    fn rendered_output_serializes_status_flat() {
        let out = RenderedOutput::new("/tmp/x", "abc".into(), 5, FormatStatus::skipped("missing"));
        let json = serde_yaml::to_string(&out).unwrap();
        assert!(json.contains("status: format_skipped"));
        assert!(json.contains("reason: missing"));
        assert!(json.contains("bytes: 5"));
    }
}
