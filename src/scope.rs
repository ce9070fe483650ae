//! Scope extraction: recover the exact source text of named functions
//!
//! GS declares functions as `fn name(params) { body }`. The scanner finds each
//! header, then walks forward from the opening brace keeping a nesting depth
//! until the matching closing brace. It is a structural scanner, not a lexer:
//! in [`ScanMode::Naive`] a brace inside a string or comment counts like any
//! other brace.

use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;

/// Header pattern for GS function declarations
pub const GS_FUNCTION_HEADER: &str =
    r"(?m)^\s*fn\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\([^)]*\)\s*\{";

/// One extracted function, owned by the [`ScopeMap`] that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    /// Declared function name
    pub name: String,
    /// Byte offset of the first character of the span (after trimming)
    pub start: usize,
    /// Byte offset one past the last character of the span
    pub end: usize,
    /// 1-based line of `start`
    pub first_line: usize,
    text: String,
}

impl SourceSpan {
    /// Build a span over `source[start..end]`
    pub fn new(name: impl Into<String>, source: &str, start: usize, end: usize) -> Self {
        let first_line = source[..start].matches('\n').count() + 1;
        Self {
            name: name.into(),
            start,
            end,
            first_line,
            text: source[start..end].to_string(),
        }
    }

    /// The exact extracted source text
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Name-keyed spans in document order
///
/// Function names are the join key across both languages, so a repeated
/// top-level name is reported rather than silently overwritten: the first
/// declaration is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMap {
    spans: Vec<SourceSpan>,
    index: HashMap<String, usize>,
}

impl ScopeMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a span; returns false (and keeps the existing one) on a duplicate name
    pub fn insert(&mut self, span: SourceSpan) -> bool {
        if let Some(&existing) = self.index.get(&span.name) {
            tracing::warn!(
                "Duplicate function `{}` at line {} (keeping the declaration at line {})",
                span.name,
                span.first_line,
                self.spans[existing].first_line
            );
            return false;
        }
        self.index.insert(span.name.clone(), self.spans.len());
        self.spans.push(span);
        true
    }

    /// Look up a span by function name
    pub fn get(&self, name: &str) -> Option<&SourceSpan> {
        self.index.get(name).map(|&i| &self.spans[i])
    }

    /// Look up the source text of a function
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).map(SourceSpan::text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate spans in document order
    pub fn iter(&self) -> impl Iterator<Item = &SourceSpan> {
        self.spans.iter()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// How braces inside literals are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Every `{`/`}` byte is structural
    #[default]
    Naive,
    /// Skip GS string literals and `#`, `//`, `/* */` comments while counting
    SkipLiterals,
}

/// Brace-delimited scope extractor
#[derive(Debug, Clone)]
pub struct BraceScanner {
    header: Regex,
    mode: ScanMode,
}

impl BraceScanner {
    /// Scanner for GS `fn` declarations
    pub fn gs() -> Result<Self> {
        Self::with_header(GS_FUNCTION_HEADER)
    }

    /// Scanner for a custom header pattern
    ///
    /// The name is taken from the `name` capture group, or the first group
    /// when there is none.
    pub fn with_header(pattern: &str) -> Result<Self> {
        Ok(Self {
            header: Regex::new(pattern)?,
            mode: ScanMode::Naive,
        })
    }

    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Extract every function whose body is balanced
    ///
    /// Line endings are normalized to `\n` first, so span offsets refer to
    /// the normalized text.
    pub fn extract(&self, source: &str) -> ScopeMap {
        let text = normalize_newlines(source);
        let mut scopes = ScopeMap::new();

        for caps in self.header.captures_iter(&text) {
            let (Some(whole), Some(name)) = (
                caps.get(0),
                caps.name("name").or_else(|| caps.get(1)),
            ) else {
                continue;
            };

            // The header pattern normally ends on the brace itself
            let search_from = whole.end().saturating_sub(1).max(whole.start());
            let Some(open) = text[search_from..].find('{').map(|i| i + search_from) else {
                tracing::debug!("Header `{}` has no opening brace, skipping", name.as_str());
                continue;
            };

            let Some(close) = find_matching_brace(&text, open, self.mode) else {
                tracing::warn!(
                    "Body of `{}` never closes, skipping",
                    name.as_str()
                );
                continue;
            };

            let raw = &text[whole.start()..=close];
            let start = whole.start() + (raw.len() - raw.trim_start().len());
            let end = close + 1;
            scopes.insert(SourceSpan::new(name.as_str(), &text, start, end));
        }

        tracing::debug!("Extracted {} brace-delimited scopes", scopes.len());
        scopes
    }
}

/// Normalize `\r\n` line endings to `\n`
pub fn normalize_newlines(source: &str) -> String {
    if source.contains('\r') {
        source.replace("\r\n", "\n")
    } else {
        source.to_string()
    }
}

/// Find the `}` closing the `{` at byte offset `open`
pub fn find_matching_brace(text: &str, open: usize, mode: ScanMode) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' if mode == ScanMode::SkipLiterals => {
                i = skip_string(bytes, i)?;
            }
            b'#' if mode == ScanMode::SkipLiterals => {
                i = skip_line(bytes, i);
            }
            b'/' if mode == ScanMode::SkipLiterals => match bytes.get(i + 1) {
                Some(b'/') => i = skip_line(bytes, i),
                Some(b'*') => i = skip_block_comment(bytes, i)?,
                _ => {}
            },
            _ => {}
        }
        i += 1;
    }

    None
}

/// Returns the offset of the closing quote
fn skip_string(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Returns the offset of the terminating newline (or the last byte)
fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len().saturating_sub(1), |p| start + p)
}

/// Returns the offset of the `/` ending the comment
fn skip_block_comment(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}
