//! Balanced-group scanning over raw RTF text.
//!
//! RTF nests structure with braces: `{\pict ...}`, `{\*\blipuid ...}`. A
//! full tokenizer is overkill for locating picture payloads, so this module
//! does a single forward pass that tracks brace depth and nothing else.
//!
//! ## Structural vs. literal braces
//!
//! A `{` opens a group only when the previous non-whitespace character is
//! not `\` and the next non-whitespace character is `\` (every RTF group
//! starts with a control word). A `}` closes a group only when the previous
//! non-whitespace character is not `\`. Escaped `\{` and `\}` are literal
//! text and never move the depth counter.
//!
//! ## Group patterns
//!
//! Callers select groups by the name of their first control word:
//!
//! ```text
//! GroupPattern::named("pict")                  {\pict ...}
//! GroupPattern::named("(?:header|footer)[lrf]?")  {\headerl ...} {\footer ...}
//! GroupPattern::except("pict")                 {\*\blipuid ...} but not {\pict ...}
//! ```
//!
//! Named patterns are regular expressions anchored at the start of the name
//! and matched as a prefix, so `named("pict")` also selects `{\pictxyz`.
//! [`GroupPattern::Except`] is the complement: any group whose name does not
//! start with the given text.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid group name pattern `{pattern}`: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Selects groups by the control word that follows their opening `{\`.
#[derive(Debug, Clone)]
pub enum GroupPattern {
    /// Name must match the (start-anchored) regular expression.
    Named(Regex),
    /// Name must *not* start with the given text.
    Except(String),
}

impl GroupPattern {
    /// Compile a name pattern. The expression is anchored at the first
    /// character of the control word; it is not anchored at the end.
    pub fn named(pattern: &str) -> Result<Self, PatternError> {
        Regex::new(&format!("^(?:{pattern})"))
            .map(GroupPattern::Named)
            .map_err(|source| PatternError::Invalid {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Match any group whose name does not start with `name`.
    pub fn except(name: &str) -> Self {
        GroupPattern::Except(name.to_string())
    }

    /// Test the text immediately after `{\`.
    fn matches_at(&self, rest: &str) -> bool {
        match self {
            GroupPattern::Named(re) => re.is_match(rest),
            GroupPattern::Except(name) => !rest.starts_with(name.as_str()),
        }
    }
}

/// A balanced `{\name ...}` region of the scanned text.
///
/// `end` is exclusive: it points just past the closing `}`. For an
/// unterminated group it is the length of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group<'a> {
    pub start: usize,
    pub end: usize,
    pub content: &'a str,
}

// ---------------------------------------------------------------------------
// Character helpers
// ---------------------------------------------------------------------------

/// First non-whitespace byte before `index`, if any.
fn prev_non_whitespace(bytes: &[u8], index: usize) -> Option<u8> {
    bytes[..index]
        .iter()
        .rev()
        .copied()
        .find(|b| !b.is_ascii_whitespace())
}

/// Position of the first non-whitespace byte after `index`, if any.
fn next_non_whitespace_pos(bytes: &[u8], index: usize) -> Option<usize> {
    bytes
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(pos, _)| pos)
}

/// True when the `{` at `index` is an unescaped group start.
fn is_group_start(bytes: &[u8], index: usize) -> bool {
    bytes[index] == b'{'
        && prev_non_whitespace(bytes, index) != Some(b'\\')
        && next_non_whitespace_pos(bytes, index).map(|p| bytes[p]) == Some(b'\\')
}

/// True when the `}` at `index` is an unescaped group end.
fn is_group_end(bytes: &[u8], index: usize) -> bool {
    bytes[index] == b'}' && prev_non_whitespace(bytes, index) != Some(b'\\')
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Locate the next opening `{\<name>` matching `pattern` at or after `from`.
fn find_opening(text: &str, pattern: &GroupPattern, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while pos < bytes.len() {
        let open = pos + bytes[pos..].iter().position(|&b| b == b'{')?;
        pos = open + 1;

        if !is_group_start(bytes, open) {
            continue;
        }
        // is_group_start guarantees a backslash follows
        let Some(backslash) = next_non_whitespace_pos(bytes, open) else {
            continue;
        };
        if pattern.matches_at(&text[backslash + 1..]) {
            return Some(open);
        }
    }
    None
}

/// Find the first group matching `pattern` that opens at or after `from`.
///
/// Depth starts at 1 on the opening brace and the scan ends on the brace
/// that returns it to 0. Escaped braces never change the depth.
pub fn find_group<'a>(text: &'a str, pattern: &GroupPattern, from: usize) -> Option<Group<'a>> {
    if from >= text.len() {
        return None;
    }
    let start = find_opening(text, pattern, from)?;
    let bytes = text.as_bytes();

    let mut depth: usize = 1;
    let mut end = bytes.len();
    for index in start + 1..bytes.len() {
        match bytes[index] {
            b'{' if is_group_start(bytes, index) => depth += 1,
            b'}' if depth > 0 && is_group_end(bytes, index) => {
                depth -= 1;
                if depth == 0 {
                    end = index + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    Some(Group {
        start,
        end,
        content: &text[start..end],
    })
}

/// All non-overlapping groups matching `pattern`, left to right.
///
/// Each search resumes at the previous group's `end`, so groups nested
/// inside an earlier match are not reported separately.
pub fn find_all_groups<'a>(text: &'a str, pattern: &GroupPattern) -> Vec<Group<'a>> {
    let mut groups = Vec::new();
    let mut from = 0;
    while let Some(group) = find_group(text, pattern, from) {
        from = group.end;
        groups.push(group);
    }
    groups
}

/// Remove every group matching `pattern`, rescanning from the start after
/// each removal since offsets shift.
pub fn remove_all_groups(text: &str, pattern: &GroupPattern) -> String {
    let mut result = text.to_string();
    while let Some(group) = find_group(&result, pattern, 0) {
        let range = group.start..group.end;
        result.replace_range(range, "");
    }
    result
}
