//! CLI output formatting for every command.
//!
//! # Picture Display Contract
//!
//! Every picture is shown by its 1-based position in the paste, then its
//! type, with identity and size as indented context:
//!
//! ```text
//! 001 image/png (8 bytes, 96x96)
//!     Id: 4f2a01c0b5e3d7a9
//! 002 image/emf (no payload)
//! 003 image/png → same as 001
//! ```
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! Pictures
//! 001 image/png (1204 bytes, 96x96)
//!     Id: 8f3e...
//! 002 image/png → same as 001
//!
//! 2 pictures, 1 unique
//! ```
//!
//! ## Extract
//!
//! ```text
//! 001 image/png → out/001-3f1a9c0e2b7d.png
//! 002 image/emf: skipped
//! 003 image/png → same as 001
//!
//! Wrote 1 file
//! ```
//!
//! ## Rewrite issues
//!
//! ```text
//! Issues
//!     failed-image-extraction: image count mismatch: RTF has 2, HTML has 3
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper. Format functions are pure: no I/O, no
//! side effects.

use crate::export::{ExportStatus, ExportedImage, ImageSummary};
use crate::paste::PasteIssue;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line for a picture at 0-based `index`.
///
/// ```text
/// 001 image/png
/// ```
fn picture_header(index: usize, mime: &str) -> String {
    format!("{} {}", format_index(index + 1), mime)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Inspect
// ============================================================================

/// Format the picture inventory of an RTF document.
pub fn format_inspect(summaries: &[ImageSummary]) -> Vec<String> {
    if summaries.is_empty() {
        return vec!["No pictures found".to_string()];
    }

    let mut lines = vec!["Pictures".to_string()];
    for summary in summaries {
        let header = picture_header(summary.index, summary.image_type.mime());
        if let Some(first) = summary.shared_with {
            lines.push(format!("{header} → same as {}", format_index(first + 1)));
            continue;
        }

        let detail = match (summary.payload_bytes, summary.dimensions) {
            (0, _) => "no payload".to_string(),
            (bytes, Some(dim)) => format!("{bytes} bytes, {}x{}", dim.width, dim.height),
            (bytes, None) => format!("{bytes} bytes"),
        };
        lines.push(format!("{header} ({detail})"));
        if let Some(id) = &summary.id {
            lines.push(format!("{}Id: {}", indent(1), id));
        }
    }

    let unique = summaries.iter().filter(|s| s.shared_with.is_none()).count();
    lines.push(String::new());
    lines.push(format!(
        "{}, {} unique",
        plural(summaries.len(), "picture"),
        unique
    ));
    lines
}

/// Print the picture inventory to stdout.
pub fn print_inspect(summaries: &[ImageSummary]) {
    for line in format_inspect(summaries) {
        println!("{}", line);
    }
}

// ============================================================================
// Extract
// ============================================================================

/// Format export results, one line per picture.
pub fn format_export(results: &[ExportedImage]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut written = 0;
    for result in results {
        let position = format_index(result.index + 1);
        match &result.status {
            ExportStatus::Written(path) => {
                written += 1;
                lines.push(format!("{position} → {}", path.display()));
            }
            ExportStatus::Shared { index, .. } => {
                lines.push(format!("{position} → same as {}", format_index(index + 1)));
            }
            ExportStatus::Skipped(image_type) => {
                lines.push(format!("{position} {}: skipped", image_type.mime()));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!("Wrote {}", plural(written, "file")));
    lines
}

/// Print export results to stdout.
pub fn print_export(results: &[ExportedImage]) {
    for line in format_export(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Rewrite issues
// ============================================================================

/// Format paste issues with their notification code. Empty when clean.
pub fn format_issues(issues: &[PasteIssue]) -> Vec<String> {
    if issues.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Issues".to_string()];
    lines.extend(
        issues
            .iter()
            .map(|issue| format!("{}{}: {}", indent(1), issue.code(), issue)),
    );
    lines
}

/// Print paste issues to stderr so stdout stays clean HTML.
pub fn print_issues(issues: &[PasteIssue]) {
    for line in format_issues(issues) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Dimensions;
    use crate::image_type::ImageType;
    use std::path::PathBuf;

    fn summary(index: usize, image_type: ImageType, bytes: usize) -> ImageSummary {
        ImageSummary {
            index,
            id: Some(format!("id{index}")),
            image_type,
            payload_bytes: bytes,
            shared_with: None,
            dimensions: None,
        }
    }

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_triple_digit() {
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
        assert_eq!(plural(3, "picture"), "3 pictures");
    }

    // =========================================================================
    // Inspect
    // =========================================================================

    #[test]
    fn inspect_empty() {
        assert_eq!(format_inspect(&[]), vec!["No pictures found"]);
    }

    #[test]
    fn inspect_lists_pictures_with_context() {
        let mut png = summary(0, ImageType::Png, 1204);
        png.dimensions = Some(Dimensions {
            width: 96,
            height: 48,
        });
        let emf = summary(1, ImageType::Emf, 0);
        let mut dup = summary(2, ImageType::Png, 1204);
        dup.shared_with = Some(0);

        let lines = format_inspect(&[png, emf, dup]);
        assert_eq!(
            lines,
            vec![
                "Pictures",
                "001 image/png (1204 bytes, 96x48)",
                "    Id: id0",
                "002 image/emf (no payload)",
                "    Id: id1",
                "003 image/png → same as 001",
                "",
                "3 pictures, 2 unique",
            ]
        );
    }

    #[test]
    fn inspect_without_id_or_dimensions() {
        let mut gif = summary(0, ImageType::Gif, 10);
        gif.id = None;
        let lines = format_inspect(&[gif]);
        assert_eq!(lines[1], "001 image/gif (10 bytes)");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "1 picture, 1 unique");
    }

    // =========================================================================
    // Extract
    // =========================================================================

    #[test]
    fn export_lines() {
        let path = PathBuf::from("out/001-abc.png");
        let results = vec![
            ExportedImage {
                index: 0,
                status: ExportStatus::Written(path.clone()),
            },
            ExportedImage {
                index: 1,
                status: ExportStatus::Skipped(ImageType::Wmf),
            },
            ExportedImage {
                index: 2,
                status: ExportStatus::Shared { index: 0, path },
            },
        ];
        assert_eq!(
            format_export(&results),
            vec![
                "001 → out/001-abc.png",
                "002 image/wmf: skipped",
                "003 → same as 001",
                "",
                "Wrote 1 file",
            ]
        );
    }

    // =========================================================================
    // Issues
    // =========================================================================

    #[test]
    fn no_issues_no_output() {
        assert!(format_issues(&[]).is_empty());
    }

    #[test]
    fn issues_carry_codes() {
        let lines = format_issues(&[
            PasteIssue::CountMismatch { rtf: 2, html: 3 },
            PasteIssue::UnsupportedImageType {
                image_type: ImageType::Emf,
                index: 1,
            },
        ]);
        assert_eq!(lines[0], "Issues");
        assert!(lines[1].starts_with("    failed-image-extraction: "));
        assert!(lines[2].starts_with("    unsupported-image: "));
    }
}
