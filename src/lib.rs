//! # pict-paste
//!
//! Recovers pictures from word-processor clipboard payloads.
//!
//! When content is copied from a desktop word processor, the clipboard holds
//! two flavors of the same document. The HTML flavor references pictures as
//! local files (`file:///C:/.../clip_image001.png`) that a web editor cannot
//! read; the RTF flavor carries the picture bytes as hex. This crate pairs
//! the two and rewrites the HTML so every picture is an inline `data:` URL.
//!
//! # Pipeline
//!
//! ```text
//! RTF  → strip headers/footers/fallbacks → \pict groups → ImageRecord[] ─┐
//!                                                                        ├─► data: URLs in HTML
//! HTML → <img src> list ─────────────────────────────────────────────────┘
//! ```
//!
//! Pairing is purely positional: the i-th `<img>` belongs to the i-th RTF
//! picture. When the counts disagree nothing is rewritten. Pastes without
//! RTF fall back to loading `blob:` object URLs through an
//! [`object_url::ObjectUrlLoader`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`rtf`] | Brace-aware group scanning, content extraction, picture collection |
//! | [`image_type`] | Image type taxonomy: RTF blip markers and file signatures |
//! | [`codec`] | Hex → Base64 `data:` URL encoding |
//! | [`html`] | `<img>` discovery and `src` substitution |
//! | [`object_url`] | `blob:` fallback: parallel loading, signature sniffing |
//! | [`paste`] | The top-level [`paste::ImageFilter`] and its issue taxonomy |
//! | [`config`] | `pict-paste.toml` loading, validation, merging |
//! | [`export`] | Picture summaries and on-disk export for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Fail the Paste
//!
//! A paste must always produce HTML. Every problem (count mismatch,
//! metafile pictures, unreadable object URLs) is reported as a
//! [`paste::PasteIssue`] alongside the result, and the affected `<img>` keeps
//! its original `src`. The host decides whether to notify the user.
//!
//! ## Shared Duplicates
//!
//! Word emits the same picture several times (once per display variant).
//! Duplicates share one `Arc<ImageRecord>`, so the payload is held once and
//! "is this the same picture" is pointer identity.

pub mod codec;
pub mod config;
pub mod export;
pub mod html;
pub mod image_type;
pub mod object_url;
pub mod output;
pub mod paste;
pub mod rtf;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use paste::{ImageFilter, PasteIssue, PasteOutcome, rewrite_html_image_sources};
