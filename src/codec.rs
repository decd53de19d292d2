//! Hex payload → Base64 `data:` URL conversion.
//!
//! RTF stores picture bytes as hex digits; HTML wants them inline as
//! `data:<mime>;base64,<payload>`. The object-URL fallback already has raw
//! bytes, so [`encode`] accepts either form through [`Payload`].

use crate::image_type::{DEFAULT_SUPPORTED_TYPES, ImageType};
use crate::rtf::ImageRecord;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("hex payload has odd length {0}")]
    OddLength(usize),
    #[error("invalid hex digit {character:?} at offset {index}")]
    InvalidDigit { character: char, index: usize },
}

/// Image bytes, either still hex-encoded or already raw.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Hex(&'a str),
    Bytes(&'a [u8]),
}

/// Decode a whitespace-free hex string, two digits per byte.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, CodecError> {
    if hex.len() % 2 != 0 {
        return Err(CodecError::OddLength(hex.len()));
    }
    hex::decode(hex).map_err(|err| match err {
        hex::FromHexError::InvalidHexCharacter { c, index } => CodecError::InvalidDigit {
            character: c,
            index,
        },
        _ => CodecError::OddLength(hex.len()),
    })
}

/// Standard Base64 (`+/` alphabet, `=` padding).
pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Build a `data:` URL, or `None` when the type is absent or not in
/// `supported`.
pub fn encode(
    payload: Payload<'_>,
    image_type: Option<ImageType>,
    supported: &[ImageType],
) -> Result<Option<String>, CodecError> {
    let Some(image_type) = image_type.filter(|ty| supported.contains(ty)) else {
        return Ok(None);
    };

    let base64 = match payload {
        Payload::Hex(hex) => base64_encode(&decode_hex(hex)?),
        Payload::Bytes(bytes) => base64_encode(bytes),
    };
    Ok(Some(format!("data:{};base64,{}", image_type.mime(), base64)))
}

/// `data:` URL for an extracted record, using the default supported types.
pub fn build_data_url(record: &ImageRecord) -> Option<String> {
    build_data_url_with(record, DEFAULT_SUPPORTED_TYPES)
}

/// `data:` URL for an extracted record. Records without a payload, of an
/// unsupported type, or with malformed hex yield `None`.
pub fn build_data_url_with(record: &ImageRecord, supported: &[ImageType]) -> Option<String> {
    let hex = record.hex.as_deref()?;
    match encode(Payload::Hex(hex), Some(record.image_type), supported) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(id = ?record.id, error = %err, "discarding malformed picture payload");
            None
        }
    }
}
