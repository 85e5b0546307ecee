//! Response Normalizer - strips markdown artifacts from provider text.
//!
//! Providers frequently wrap their verdict in emphasis or headers
//! (`**FALSE**`, `## TRUE`). Classification runs on plain text, so the
//! markup is removed first while the content and its case are kept.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines opening or closing a fenced code block.
static FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*```.*$").unwrap());

/// Leading `#` header markers, including stacked ones like `## #`.
static HEADER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:#+[ \t]*)+").unwrap());

/// Markdown cleanup applied to every response before interpretation.
///
/// The passes run in a fixed order and no pass can reintroduce markup an
/// earlier pass removed, so normalizing twice equals normalizing once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Remove fences, inline code, emphasis and header markers.
    pub fn normalize(&self, text: &str) -> String {
        let text = strip_fence_lines(text);
        let text = text.replace('`', "");
        let text = text.replace('*', "");
        let text = strip_underscore_emphasis(&text);
        let text = text.replace("~~", "");
        HEADER_PREFIX.replace_all(&text, "").into_owned()
    }
}

/// Drop fence delimiter lines; the enclosed content is kept.
fn strip_fence_lines(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if !FENCE_LINE.is_match(content) {
            out.push_str(line);
        }
    }
    out
}

/// Remove `_` / `__` runs used as emphasis delimiters.
///
/// A run is a delimiter unless it sits between two alphanumeric characters,
/// so identifiers like `policy_limited` survive.
fn strip_underscore_emphasis(text: &str) -> String {
    if !text.contains('_') {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '_' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i] == '_' {
            i += 1;
        }

        let before = start.checked_sub(1).map(|j| chars[j]);
        let after = chars.get(i).copied();
        let joins_words = matches!(before, Some(c) if c.is_alphanumeric())
            && matches!(after, Some(c) if c.is_alphanumeric());

        if joins_words {
            out.extend(&chars[start..i]);
        }
    }

    out
}
