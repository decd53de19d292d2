//! Picture collection: RTF document → ordered image records.
//!
//! The output order matters. HTML clipboard payloads carry one `<img>` per
//! picture occurrence, in document order, and the two lists are later zipped
//! by position. The rules below exist to keep the RTF side aligned with what
//! a word processor puts into the HTML side.
//!
//! ## Preprocessing
//!
//! Groups that never produce an HTML `<img>` are stripped first:
//!
//! | Group | Why it is removed |
//! |-------|-------------------|
//! | `\header`, `\footer` (+ `l`/`r`/`f`) | page furniture, not pasted |
//! | `\nonshppict` | legacy WMF copy of a picture that also appears as `\shppict` |
//! | `\shprslt` | drawing-object fallback rendering |
//!
//! ## Per-picture decisions
//!
//! ```text
//! \defshp present            → WordArt shape, skip
//! fHorizRule present         → horizontal rule, skip
//! same id, payload, same type      → duplicate: push the same record again
//! same id, payload, other type,
//!   and that record is the last    → alternate format: skip
//! same id otherwise                → replace that record in place
//! new or missing id                → append
//! ```
//!
//! Ids come from `\blipuid` (preferred) or `\bliptag`. Some producers emit
//! neither; such pictures are always treated as new.

use super::content::extract_content;
use super::groups::{GroupPattern, PatternError, find_all_groups, remove_all_groups};
use crate::image_type::{ImageType, classify_by_marker};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Groups removed before pictures are collected.
pub const REMOVED_GROUPS_PATTERN: &str = "(?:header|footer)[lrf]?|nonshppict|shprslt";

static BLIP_UID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\blipuid (\w+)\}").expect("blipuid regex"));

static BLIP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\bliptag(-?\d+)").expect("bliptag regex"));

/// One picture extracted from RTF.
///
/// `hex` is only kept for supported raster types; metafiles and unknown
/// pictures carry no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

impl ImageRecord {
    /// True once a non-empty payload has been extracted.
    pub fn has_payload(&self) -> bool {
        self.hex.as_deref().is_some_and(|hex| !hex.is_empty())
    }
}

/// Ordered pictures. Duplicate occurrences share one `Arc`.
pub type ImageSequence = Vec<Arc<ImageRecord>>;

/// Blip id of a picture group: `\blipuid` wins over `\bliptag`.
pub fn blip_id(group: &str) -> Option<String> {
    BLIP_UID
        .captures(group)
        .or_else(|| BLIP_TAG.captures(group))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Collects picture records from RTF documents.
#[derive(Debug, Clone)]
pub struct RtfImageCollector {
    removed: GroupPattern,
    pict: GroupPattern,
}

impl Default for RtfImageCollector {
    fn default() -> Self {
        Self::new(&[]).expect("default group patterns compile")
    }
}

impl RtfImageCollector {
    /// Build a collector stripping `extra_removed_groups` in addition to the
    /// standard set.
    ///
    /// Payloads are kept for every raster type whatever the caller will later
    /// inline: the duplicate and alternate-format rules depend on them, so the
    /// shape of the sequence never changes with the supported set.
    pub fn new(extra_removed_groups: &[String]) -> Result<Self, PatternError> {
        let mut removed = REMOVED_GROUPS_PATTERN.to_string();
        for name in extra_removed_groups {
            removed.push('|');
            removed.push_str(&regex::escape(name));
        }
        Ok(Self {
            removed: GroupPattern::named(&removed)?,
            pict: GroupPattern::named("pict")?,
        })
    }

    /// Extract the ordered picture sequence from an RTF document.
    pub fn collect(&self, rtf: &str) -> ImageSequence {
        let filtered = remove_all_groups(rtf, &self.removed);
        let groups = find_all_groups(&filtered, &self.pict);

        let mut images: ImageSequence = Vec::with_capacity(groups.len());
        // id → index of the first record carrying it
        let mut first_by_id: HashMap<String, usize> = HashMap::new();

        for (position, group) in groups.iter().enumerate() {
            let text = group.content;

            if text.contains(r"\defshp") {
                tracing::debug!(position, "skipping WordArt shape");
                continue;
            }
            if text.contains("fHorizRule") {
                tracing::debug!(position, "skipping horizontal rule");
                continue;
            }

            let id = blip_id(text);
            let image_type = classify_by_marker(text);
            let existing = id.as_deref().and_then(|id| first_by_id.get(id).copied());

            if let Some(index) = existing {
                let prior = Arc::clone(&images[index]);
                if prior.has_payload() {
                    if prior.image_type == image_type {
                        tracing::debug!(position, index, "picture repeats an earlier one");
                        images.push(prior);
                        continue;
                    }
                    if index + 1 == images.len() {
                        tracing::debug!(
                            position,
                            %image_type,
                            "skipping alternate format of the previous picture"
                        );
                        continue;
                    }
                }
            }

            let hex = image_type
                .is_raster()
                .then(|| compact(&extract_content(text)));
            let record = Arc::new(ImageRecord {
                id: id.clone(),
                image_type,
                hex,
            });

            match existing {
                Some(index) => {
                    tracing::debug!(position, index, "replacing earlier picture with same id");
                    images[index] = record;
                }
                None => {
                    if let Some(id) = id {
                        first_by_id.insert(id, images.len());
                    }
                    images.push(record);
                }
            }
        }

        images
    }
}

/// Extract pictures using the standard set of removed groups.
pub fn extract_images_from_rtf(rtf: &str) -> ImageSequence {
    RtfImageCollector::default().collect(rtf)
}

fn compact(payload: &str) -> String {
    payload.chars().filter(|c| !c.is_whitespace()).collect()
}
