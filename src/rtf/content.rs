//! Payload isolation for a single RTF group.
//!
//! A Word `\pict` group mixes three kinds of text:
//!
//! ```text
//! {\pict{\*\picprop ...}\picw100\pich100\pngblip\bliptag-12{\*\blipuid 9f..}89504e47
//! 0d0a1a0a...}
//!  ^^^^^^^^^^^^^^^^^^^^^ property subgroups     ^^^^^^^^^^^^^^^^ payload
//!                       ^^^^^^^^^^^^^^^^^^^^^^^^ leading control words
//! ```
//!
//! [`extract_content`] drops the subgroups and the leading control words,
//! leaving the payload text (hex digits for pictures, possibly broken over
//! several lines).

use super::groups::{GroupPattern, remove_all_groups};
use regex::Regex;
use std::sync::LazyLock;

static GROUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\s*\\(\w+)").expect("group name regex"));

static LEADING_CONTROL_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\s*(?:\\[\w-]+\s*)+").expect("control word regex"));

// RTF writers sometimes put payload right after a subgroup's `}`.
static SUBGROUP_WITHOUT_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}([^{\s]+)").expect("subgroup spacing regex"));

/// Name of the group's first control word (`pict` for `{\pict ...}`).
///
/// Returns `None` for text that does not start with `{\word`.
pub fn group_name(group: &str) -> Option<&str> {
    GROUP_NAME
        .captures(group)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Strip everything but the payload from one group's text.
///
/// Subgroups are removed unless they share the group's own name. When the
/// name cannot be determined the subgroups are kept and extraction proceeds
/// on whatever text remains.
pub fn extract_content(group: &str) -> String {
    let spaced = SUBGROUP_WITHOUT_SPACE.replace_all(group, "} $1");

    let isolated = match group_name(group) {
        Some(name) => remove_all_groups(&spaced, &GroupPattern::except(name)),
        None => {
            tracing::debug!(
                prefix = %group.chars().take(24).collect::<String>(),
                "group has no control word name; skipping subgroup isolation"
            );
            spaced.into_owned()
        }
    };

    let without_words = LEADING_CONTROL_WORDS.replace(&isolated, "");
    let trimmed = without_words.trim();
    trimmed.strip_suffix('}').unwrap_or(trimmed).to_string()
}
