//! Top-level paste filter: HTML + optional RTF in, HTML with inlined images out.
//!
//! ```text
//! html ──► <img> sources ──┐
//!                          ├─► positional pairing ─► file:// → data: URLs
//! rtf  ──► picture records ┘
//!
//! (no rtf) ──► blob: sources ─► ObjectUrlLoader (parallel) ─► data: URLs
//! ```
//!
//! The filter never fails. Every problem is recorded as a [`PasteIssue`] in
//! the [`PasteOutcome`] and logged; whatever could not be resolved stays as
//! it was in the input HTML.

use crate::config::{PasteConfig, effective_threads};
use crate::html::{apply_placements, extract_img_sources};
use crate::image_type::{DEFAULT_SUPPORTED_TYPES, ImageType};
use crate::object_url::{ObjectUrlLoader, object_urls, resolve_object_urls};
use crate::rtf::{PatternError, RtfImageCollector};
use serde::Serialize;
use thiserror::Error;

/// Something that kept part of a paste from being resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PasteIssue {
    /// HTML and RTF disagree on the number of pictures; nothing was replaced.
    #[error("image count mismatch: RTF has {rtf}, HTML has {html}")]
    CountMismatch { rtf: usize, html: usize },
    /// The picture at `index` has a type that cannot be inlined.
    #[error("unsupported image type {image_type} at index {index}")]
    UnsupportedImageType { image_type: ImageType, index: usize },
    /// Object-URL bytes match no known image signature.
    #[error("unrecognized file signature for {url} (object URL {index})")]
    UnrecognizedSignature { url: String, index: usize },
    /// Object-URL bytes could not be loaded.
    #[error("failed to load {url} (object URL {index}): {reason}")]
    LoadFailed {
        url: String,
        index: usize,
        reason: String,
    },
    /// No RTF flavor and no way to load object URLs.
    #[error("no RTF payload and no object-URL loader; {count} blob image(s) left as-is")]
    FallbackUnavailable { count: usize },
}

impl PasteIssue {
    /// Stable identifier for scripting and log filtering.
    pub fn code(&self) -> &'static str {
        match self {
            PasteIssue::CountMismatch { .. } => "failed-image-extraction",
            PasteIssue::UnsupportedImageType { .. } => "unsupported-image",
            PasteIssue::UnrecognizedSignature { .. } => "unrecognized-signature",
            PasteIssue::LoadFailed { .. } => "load-failed",
            PasteIssue::FallbackUnavailable { .. } => "fallback-unavailable",
        }
    }

    /// Whether the whole paste was abandoned rather than a single image.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PasteIssue::CountMismatch { .. })
    }
}

/// Result of running the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    pub html: String,
    pub issues: Vec<PasteIssue>,
}

impl PasteOutcome {
    fn unchanged(html: &str) -> Self {
        Self {
            html: html.to_string(),
            issues: Vec::new(),
        }
    }
}

/// Host editor capability: may the document contain `<img src>` at all?
pub trait ImageSchema {
    fn allows_image_sources(&self) -> bool;
}

/// Schema that accepts images.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveSchema;

impl ImageSchema for PermissiveSchema {
    fn allows_image_sources(&self) -> bool {
        true
    }
}

/// Schema that rejects images; every paste is left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOnlySchema;

impl ImageSchema for TextOnlySchema {
    fn allows_image_sources(&self) -> bool {
        false
    }
}

/// Paste image filter with its collaborators.
pub struct ImageFilter<'a> {
    collector: RtfImageCollector,
    supported: Vec<ImageType>,
    schema: &'a dyn ImageSchema,
    loader: Option<&'a dyn ObjectUrlLoader>,
    fallback_enabled: bool,
    threads: usize,
}

impl Default for ImageFilter<'_> {
    fn default() -> Self {
        Self {
            collector: RtfImageCollector::default(),
            supported: DEFAULT_SUPPORTED_TYPES.to_vec(),
            schema: &PermissiveSchema,
            loader: None,
            fallback_enabled: true,
            threads: effective_threads(&Default::default()),
        }
    }
}

impl<'a> ImageFilter<'a> {
    /// Build a filter from a validated configuration.
    pub fn from_config(config: &PasteConfig) -> Result<Self, PatternError> {
        Ok(Self {
            collector: RtfImageCollector::new(&config.rtf.extra_removed_groups)?,
            supported: config.images.supported_types.clone(),
            fallback_enabled: config.fallback.enabled,
            threads: effective_threads(&config.processing),
            ..Self::default()
        })
    }

    pub fn with_schema(mut self, schema: &'a dyn ImageSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_loader(mut self, loader: &'a dyn ObjectUrlLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// The collector used for the RTF flavor.
    pub fn collector(&self) -> &RtfImageCollector {
        &self.collector
    }

    /// Inline the images of one paste.
    pub fn apply(&self, html: &str, rtf: Option<&str>) -> PasteOutcome {
        if !self.schema.allows_image_sources() {
            tracing::debug!("document schema rejects <img src>; leaving paste as-is");
            return PasteOutcome::unchanged(html);
        }

        let sources = extract_img_sources(html);
        if sources.is_empty() {
            return PasteOutcome::unchanged(html);
        }

        let outcome = match rtf {
            Some(rtf) => self.apply_rtf(html, rtf, &sources),
            None => self.apply_object_urls(html, &sources),
        };

        for issue in &outcome.issues {
            tracing::warn!(code = issue.code(), "{issue}");
        }
        outcome
    }

    fn apply_rtf(&self, html: &str, rtf: &str, sources: &[String]) -> PasteOutcome {
        let images = self.collector.collect(rtf);
        if images.is_empty() {
            return PasteOutcome::unchanged(html);
        }
        tracing::debug!(
            html = sources.len(),
            rtf = images.len(),
            "pairing pictures with <img> tags"
        );
        let (html, issues) = apply_placements(html, sources, &images, &self.supported);
        PasteOutcome { html, issues }
    }

    fn apply_object_urls(&self, html: &str, sources: &[String]) -> PasteOutcome {
        if !self.fallback_enabled {
            tracing::debug!("object-URL fallback disabled; leaving paste as-is");
            return PasteOutcome::unchanged(html);
        }
        match self.loader {
            Some(loader) => {
                let (html, issues) =
                    resolve_object_urls(html, sources, loader, &self.supported, self.threads);
                PasteOutcome { html, issues }
            }
            None => {
                let count = object_urls(sources).len();
                let issues = if count > 0 {
                    vec![PasteIssue::FallbackUnavailable { count }]
                } else {
                    Vec::new()
                };
                PasteOutcome {
                    html: html.to_string(),
                    issues,
                }
            }
        }
    }
}

/// Inline RTF pictures into `html` with default settings.
///
/// Without RTF nothing can be done here; object URLs need an
/// [`ImageFilter`] with a loader.
pub fn rewrite_html_image_sources(html: &str, rtf: Option<&str>) -> String {
    ImageFilter::default().apply(html, rtf).html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_url::tests::MockLoader;
    use crate::test_helpers::*;

    // =========================================================================
    // RTF path
    // =========================================================================

    #[test]
    fn end_to_end_single_png() {
        let rtf = r"{\rtf1{\pict\pngblip 89504e470d0a1a0a}}";
        let html = r#"<img src="file://img1.png">"#;
        let out = rewrite_html_image_sources(html, Some(rtf));
        assert!(out.contains(r#"src="data:image/png;base64,iVBORw0KGgo=""#));
    }

    #[test]
    fn count_mismatch_returns_input_byte_for_byte() {
        let rtf = rtf_doc(&[pict("pngblip", Some("a"), PNG_HEX)]);
        let html = html_doc(&[img("file:///1.png"), img("file:///2.png")]);
        let outcome = ImageFilter::default().apply(&html, Some(&rtf));
        assert_eq!(outcome.html, html);
        assert_eq!(outcome.issues, vec![PasteIssue::CountMismatch { rtf: 1, html: 2 }]);
        assert!(outcome.issues[0].is_fatal());
    }

    #[test]
    fn rtf_without_pictures_is_a_no_op() {
        let html = html_doc(&[img("file:///1.png")]);
        let outcome = ImageFilter::default().apply(&html, Some(r"{\rtf1 text only}"));
        assert_eq!(outcome, PasteOutcome::unchanged(&html));
    }

    #[test]
    fn html_without_images_is_a_no_op() {
        let rtf = rtf_doc(&[pict("pngblip", Some("a"), PNG_HEX)]);
        let outcome = ImageFilter::default().apply("<p>hello</p>", Some(&rtf));
        assert_eq!(outcome, PasteOutcome::unchanged("<p>hello</p>"));
    }

    #[test]
    fn text_only_schema_is_a_no_op() {
        let rtf = rtf_doc(&[pict("pngblip", Some("a"), PNG_HEX)]);
        let html = html_doc(&[img("file:///1.png")]);
        let outcome = ImageFilter::default()
            .with_schema(&TextOnlySchema)
            .apply(&html, Some(&rtf));
        assert_eq!(outcome.html, html);
    }

    #[test]
    fn config_narrows_supported_types() {
        let mut config = PasteConfig::default();
        config.images.supported_types = vec![ImageType::Png];
        let filter = ImageFilter::from_config(&config).unwrap();

        let rtf = rtf_doc(&[
            pict("pngblip", Some("a"), PNG_HEX),
            pict("jpegblip", Some("b"), JPEG_HEX),
        ]);
        let html = html_doc(&[img("file:///1.png"), img("file:///2.jpg")]);
        let outcome = filter.apply(&html, Some(&rtf));
        assert_eq!(outcome.html, html_doc(&[img(PNG_DATA_URL), img("file:///2.jpg")]));
        assert_eq!(
            outcome.issues,
            vec![PasteIssue::UnsupportedImageType {
                image_type: ImageType::Jpeg,
                index: 1
            }]
        );
    }

    // =========================================================================
    // Object-URL path
    // =========================================================================

    #[test]
    fn no_rtf_without_loader_reports_fallback_unavailable() {
        let html = html_doc(&[img("blob:abc")]);
        let outcome = ImageFilter::default().apply(&html, None);
        assert_eq!(outcome.html, html);
        assert_eq!(outcome.issues, vec![PasteIssue::FallbackUnavailable { count: 1 }]);
    }

    #[test]
    fn no_rtf_with_only_file_sources_reports_nothing() {
        let html = html_doc(&[img("file:///a.png")]);
        let outcome = ImageFilter::default().apply(&html, None);
        assert_eq!(outcome, PasteOutcome::unchanged(&html));
    }

    #[test]
    fn no_rtf_with_loader_inlines_blobs() {
        let png: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
        let loader = MockLoader::with(&[("blob:abc", png)]);
        let html = html_doc(&[img("blob:abc")]);
        let outcome = ImageFilter::default().with_loader(&loader).apply(&html, None);
        assert_eq!(outcome.html, html_doc(&[img(PNG_DATA_URL)]));
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn narrowed_types_keep_duplicate_pairing() {
        let mut config = PasteConfig::default();
        config.images.supported_types = vec![ImageType::Png];
        let filter = ImageFilter::from_config(&config).unwrap();

        let rtf = rtf_doc(&[
            pict("pngblip", Some("p"), PNG_HEX),
            pict("jpegblip", Some("j"), JPEG_HEX),
            pict("jpegblip", Some("j"), JPEG_HEX),
        ]);
        let html = html_doc(&[
            img("file:///1.png"),
            img("file:///2.jpg"),
            img("file:///2.jpg"),
        ]);
        let outcome = filter.apply(&html, Some(&rtf));
        assert_eq!(
            outcome.html,
            html_doc(&[
                img(PNG_DATA_URL),
                img("file:///2.jpg"),
                img("file:///2.jpg"),
            ])
        );
        assert_eq!(
            outcome.issues,
            vec![
                PasteIssue::UnsupportedImageType {
                    image_type: ImageType::Jpeg,
                    index: 1
                },
                PasteIssue::UnsupportedImageType {
                    image_type: ImageType::Jpeg,
                    index: 2
                },
            ]
        );
    }

    #[test]
    fn disabled_fallback_reports_nothing() {
        let mut config = PasteConfig::default();
        config.fallback.enabled = false;
        let html = html_doc(&[img("blob:abc")]);
        let outcome = ImageFilter::from_config(&config).unwrap().apply(&html, None);
        assert_eq!(outcome, PasteOutcome::unchanged(&html));
    }

    #[test]
    fn disabled_fallback_ignores_loader() {
        let mut config = PasteConfig::default();
        config.fallback.enabled = false;
        let loader = MockLoader::default();
        let filter = ImageFilter::from_config(&config).unwrap().with_loader(&loader);
        let html = html_doc(&[img("blob:abc")]);
        let outcome = filter.apply(&html, None);
        assert_eq!(outcome, PasteOutcome::unchanged(&html));
        assert!(loader.requested().is_empty());
    }

    // =========================================================================
    // Issues
    // =========================================================================

    #[test]
    fn issue_messages_and_codes() {
        let issue = PasteIssue::CountMismatch { rtf: 1, html: 2 };
        assert_eq!(issue.to_string(), "image count mismatch: RTF has 1, HTML has 2");
        assert_eq!(issue.code(), "failed-image-extraction");

        let issue = PasteIssue::UnsupportedImageType {
            image_type: ImageType::Emf,
            index: 3,
        };
        assert_eq!(issue.to_string(), "unsupported image type image/emf at index 3");
        assert!(!issue.is_fatal());
    }

    #[test]
    fn issues_serialize_with_kind_tag() {
        let json = serde_json::to_value(PasteIssue::CountMismatch { rtf: 0, html: 1 }).unwrap();
        assert_eq!(json["kind"], "count_mismatch");
        assert_eq!(json["html"], 1);
    }
}
