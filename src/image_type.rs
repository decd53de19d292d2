//! Image type recognition.
//!
//! Two independent classifiers:
//!
//! - [`classify_by_marker`] reads the blip control word inside an RTF `\pict`
//!   group (`\pngblip`, `\jpegblip`, `\emfblip`, `\wmetafileN`).
//! - [`classify_by_signature`] sniffs the first bytes of a raw file. Used for
//!   object-URL sources where no RTF markers exist.
//!
//! Both walk a fixed table in order and return the first hit, so a group that
//! carries two markers classifies by whichever comes first in [`MARKERS`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Kind of image carried by a picture group or a raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Emf,
    Wmf,
    Unknown,
}

impl ImageType {
    /// MIME type; `unknown` for unrecognized images.
    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
            ImageType::Gif => "image/gif",
            ImageType::Emf => "image/emf",
            ImageType::Wmf => "image/wmf",
            ImageType::Unknown => "unknown",
        }
    }

    /// File extension used when writing decoded images to disk.
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpg",
            ImageType::Gif => "gif",
            ImageType::Emf => "emf",
            ImageType::Wmf => "wmf",
            ImageType::Unknown => "bin",
        }
    }

    /// Raster formats a browser renders from a `data:` URL.
    pub fn is_raster(self) -> bool {
        matches!(self, ImageType::Png | ImageType::Jpeg | ImageType::Gif)
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Types embedded as `data:` URLs unless configuration narrows the set.
pub const DEFAULT_SUPPORTED_TYPES: &[ImageType] =
    &[ImageType::Png, ImageType::Jpeg, ImageType::Gif];

/// RTF blip markers in priority order.
pub static MARKERS: LazyLock<Vec<(Regex, ImageType)>> = LazyLock::new(|| {
    [
        (r"\\pngblip", ImageType::Png),
        (r"\\jpegblip", ImageType::Jpeg),
        (r"\\emfblip", ImageType::Emf),
        (r"\\wmetafile\d", ImageType::Wmf),
    ]
    .into_iter()
    .map(|(pattern, ty)| (Regex::new(pattern).expect("marker regex"), ty))
    .collect()
});

/// File signatures (lowercase hex prefixes) in priority order.
pub const SIGNATURES: &[(&str, ImageType)] = &[
    ("ffd8ff", ImageType::Jpeg),
    ("47494638", ImageType::Gif),
    ("89504e47", ImageType::Png),
];

/// Classify a picture group by its blip marker. No marker → `Unknown`.
pub fn classify_by_marker(group: &str) -> ImageType {
    MARKERS
        .iter()
        .find(|(marker, _)| marker.is_match(group))
        .map(|(_, ty)| *ty)
        .unwrap_or(ImageType::Unknown)
}

/// Classify raw file bytes by their first four bytes.
pub fn classify_by_signature(bytes: &[u8]) -> Option<ImageType> {
    let head = hex::encode(&bytes[..bytes.len().min(4)]);
    SIGNATURES
        .iter()
        .find(|(signature, _)| head.starts_with(signature))
        .map(|(_, ty)| *ty)
}
