//! Picture inspection and export.
//!
//! Backs the `inspect` and `extract` commands. Both work on the
//! [`ImageSequence`] produced by the RTF collector, so what they report is
//! exactly what a paste would inline.
//!
//! ## Export layout
//!
//! ```text
//! out/
//! ├── 001-3f1a9c0e2b7d.png
//! ├── 002-9b04d1e8aa52.jpg
//! └── 004-c0ffee0dd00d.gif      # 003 was a metafile: skipped
//! ```
//!
//! Files are named `<position>-<sha256 prefix>.<ext>`. A picture that occurs
//! several times is written once; later occurrences point at the first file.

use crate::codec::{CodecError, decode_hex};
use crate::image_type::ImageType;
use crate::rtf::{ImageRecord, ImageSequence};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("picture {index}: {source}")]
    Codec {
        index: usize,
        #[source]
        source: CodecError,
    },
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Read width and height without decoding pixel data.
pub fn read_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok((width, height)) => Some(Dimensions { width, height }),
        Err(err) => {
            tracing::debug!(error = %err, "cannot read picture dimensions");
            None
        }
    }
}

/// Hex SHA-256 of the decoded bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Summary of one extracted picture, as shown by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub index: usize,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    /// Decoded payload size; zero when no payload was kept.
    pub payload_bytes: usize,
    /// Index of the earlier occurrence this one duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

/// Index of the first occurrence of each shared record.
fn first_occurrences(images: &ImageSequence) -> Vec<Option<usize>> {
    let mut seen: HashMap<*const ImageRecord, usize> = HashMap::new();
    images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let first = *seen.entry(Arc::as_ptr(image)).or_insert(index);
            (first != index).then_some(first)
        })
        .collect()
}

fn decoded_payload(record: &ImageRecord) -> Option<Vec<u8>> {
    record.hex.as_deref().and_then(|hex| decode_hex(hex).ok())
}

/// Describe every picture in the sequence.
pub fn summarize(images: &ImageSequence) -> Vec<ImageSummary> {
    let shared = first_occurrences(images);
    images
        .iter()
        .zip(shared)
        .enumerate()
        .map(|(index, (image, shared_with))| {
            let bytes = decoded_payload(image);
            ImageSummary {
                index,
                id: image.id.clone(),
                image_type: image.image_type,
                payload_bytes: bytes.as_ref().map_or(0, Vec::len),
                shared_with,
                dimensions: bytes.as_deref().and_then(read_dimensions),
            }
        })
        .collect()
}

/// What happened to one picture during export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Written(PathBuf),
    /// Duplicate of an earlier picture; no new file.
    Shared { index: usize, path: PathBuf },
    /// No payload, or a type outside the supported list.
    Skipped(ImageType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub index: usize,
    pub status: ExportStatus,
}

/// Write every supported picture with a payload into `out_dir`.
pub fn export_images(
    images: &ImageSequence,
    supported: &[ImageType],
    out_dir: &Path,
) -> Result<Vec<ExportedImage>, ExportError> {
    fs::create_dir_all(out_dir)?;
    let shared = first_occurrences(images);
    let mut results: Vec<ExportedImage> = Vec::with_capacity(images.len());

    for (index, (image, shared_with)) in images.iter().zip(shared).enumerate() {
        if let Some(first) = shared_with {
            let status = match &results[first].status {
                ExportStatus::Written(path) | ExportStatus::Shared { path, .. } => {
                    ExportStatus::Shared {
                        index: first,
                        path: path.clone(),
                    }
                }
                skipped => skipped.clone(),
            };
            results.push(ExportedImage { index, status });
            continue;
        }

        let status = match image.hex.as_deref() {
            Some(hex) if supported.contains(&image.image_type) => {
                let bytes =
                    decode_hex(hex).map_err(|source| ExportError::Codec { index, source })?;
                let name = format!(
                    "{:0>3}-{}.{}",
                    index + 1,
                    &content_hash(&bytes)[..12],
                    image.image_type.extension()
                );
                let path = out_dir.join(name);
                fs::write(&path, &bytes)?;
                tracing::debug!(index, path = %path.display(), "wrote picture");
                ExportStatus::Written(path)
            }
            _ => ExportStatus::Skipped(image.image_type),
        };
        results.push(ExportedImage { index, status });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_type::DEFAULT_SUPPORTED_TYPES;
    use crate::test_helpers::*;
    use image::{ImageFormat, RgbImage};
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn sequence_with_duplicate() -> ImageSequence {
        let shared = Arc::new(record("a", ImageType::Png, Some(PNG_HEX)));
        vec![
            shared.clone(),
            Arc::new(record("b", ImageType::Emf, None)),
            shared,
        ]
    }

    // =========================================================================
    // read_dimensions / content_hash
    // =========================================================================

    #[test]
    fn reads_real_png_dimensions() {
        assert_eq!(
            read_dimensions(&png_bytes(7, 3)),
            Some(Dimensions {
                width: 7,
                height: 3
            })
        );
    }

    #[test]
    fn truncated_image_has_no_dimensions() {
        assert_eq!(read_dimensions(&[0x89, 0x50, 0x4e, 0x47]), None);
        assert_eq!(read_dimensions(b"not an image"), None);
    }

    #[test]
    fn hash_of_empty_input() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    // =========================================================================
    // summarize
    // =========================================================================

    #[test]
    fn summary_marks_shared_occurrences() {
        let summaries = summarize(&sequence_with_duplicate());
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].shared_with, None);
        assert_eq!(summaries[1].shared_with, None);
        assert_eq!(summaries[2].shared_with, Some(0));
        assert_eq!(summaries[0].payload_bytes, 8);
        assert_eq!(summaries[1].payload_bytes, 0);
        assert_eq!(summaries[1].image_type, ImageType::Emf);
    }

    #[test]
    fn equal_but_distinct_records_are_not_shared() {
        let images: ImageSequence = vec![
            Arc::new(record("a", ImageType::Png, Some(PNG_HEX))),
            Arc::new(record("a", ImageType::Png, Some(PNG_HEX))),
        ];
        let summaries = summarize(&images);
        assert!(summaries.iter().all(|s| s.shared_with.is_none()));
    }

    #[test]
    fn summary_includes_dimensions() {
        let hex = hex::encode(png_bytes(12, 5));
        let images: ImageSequence = vec![Arc::new(record("a", ImageType::Png, Some(&hex)))];
        let summaries = summarize(&images);
        assert_eq!(
            summaries[0].dimensions,
            Some(Dimensions {
                width: 12,
                height: 5
            })
        );
    }

    #[test]
    fn summary_serializes_type_field() {
        let summaries = summarize(&sequence_with_duplicate());
        let json = serde_json::to_value(&summaries).unwrap();
        assert_eq!(json[0]["type"], "png");
        assert_eq!(json[2]["shared_with"], 0);
        assert!(json[1].get("shared_with").is_none());
    }

    // =========================================================================
    // export_images
    // =========================================================================

    #[test]
    fn export_writes_each_picture_once() {
        let tmp = TempDir::new().unwrap();
        let results =
            export_images(&sequence_with_duplicate(), DEFAULT_SUPPORTED_TYPES, tmp.path()).unwrap();

        let ExportStatus::Written(path) = &results[0].status else {
            panic!("expected first picture to be written: {:?}", results[0]);
        };
        assert_eq!(fs::read(path).unwrap(), hex::decode(PNG_HEX).unwrap());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("001-"));
        assert!(name.ends_with(".png"));

        assert_eq!(results[1].status, ExportStatus::Skipped(ImageType::Emf));
        assert_eq!(
            results[2].status,
            ExportStatus::Shared {
                index: 0,
                path: path.clone()
            }
        );
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn export_respects_supported_types() {
        let tmp = TempDir::new().unwrap();
        let images: ImageSequence = vec![Arc::new(record("j", ImageType::Jpeg, Some(JPEG_HEX)))];
        let results = export_images(&images, &[ImageType::Png], tmp.path()).unwrap();
        assert_eq!(results[0].status, ExportStatus::Skipped(ImageType::Jpeg));
    }

    #[test]
    fn export_creates_output_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested").join("out");
        let images: ImageSequence = vec![Arc::new(record("j", ImageType::Jpeg, Some(JPEG_HEX)))];
        export_images(&images, DEFAULT_SUPPORTED_TYPES, &out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn export_reports_malformed_hex() {
        let tmp = TempDir::new().unwrap();
        let images: ImageSequence = vec![Arc::new(record("x", ImageType::Png, Some("abc")))];
        let err = export_images(&images, DEFAULT_SUPPORTED_TYPES, tmp.path()).unwrap_err();
        assert!(matches!(err, ExportError::Codec { index: 0, .. }));
    }
}
