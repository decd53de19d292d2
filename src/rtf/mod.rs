//! RTF picture extraction.
//!
//! Only enough of RTF is understood to find `\pict` groups and pull out their
//! hex payloads:
//!
//! - [`groups`]: brace-balanced group scanning and removal
//! - [`content`]: strips subgroups and control words from one group
//! - [`collect`]: orders and deduplicates pictures across a document

pub mod collect;
pub mod content;
pub mod groups;

pub use collect::{
    ImageRecord, ImageSequence, REMOVED_GROUPS_PATTERN, RtfImageCollector, blip_id,
    extract_images_from_rtf,
};
pub use content::{extract_content, group_name};
pub use groups::{
    Group, GroupPattern, PatternError, find_all_groups, find_group, remove_all_groups,
};
