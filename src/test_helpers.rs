//! Shared fixture builders for the unit test suite.
//!
//! Word-style RTF is verbose; these helpers produce realistic picture groups
//! (property subgroups, size control words, blip ids) so individual tests can
//! state only what they care about.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let rtf = rtf_doc(&[
//!     pict("pngblip", Some("a1"), PNG_HEX),
//!     pict("emfblip", Some("a1"), "0100"),
//! ]);
//! let html = html_doc(&[img("file:///C:/Temp/image001.png")]);
//! ```

use crate::image_type::ImageType;
use crate::rtf::ImageRecord;

/// PNG file signature as hex.
pub const PNG_HEX: &str = "89504e470d0a1a0a";

/// Start of a JFIF JPEG as hex.
pub const JPEG_HEX: &str = "ffd8ffe000104a464946";

/// `data:` URL of [`PNG_HEX`].
pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

/// `data:` URL of [`JPEG_HEX`].
pub const JPEG_DATA_URL: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

// =========================================================================
// RTF
// =========================================================================

/// A `\pict` group the way Word writes it.
///
/// With an id, the group carries a `\picprop` subgroup and a `\blipuid`
/// subgroup directly followed by the payload. Without one it is a bare
/// group, as written by some non-Word producers.
pub fn pict(marker: &str, id: Option<&str>, hex: &str) -> String {
    match id {
        Some(id) => format!(
            "{{\\pict{{\\*\\picprop\\shplid1025{{\\sp{{\\sn shapeType}}{{\\sv 75}}}}}}\
             \\picscalex100\\picscaley100\\picw1764\\pich1764\\picwgoal1000\\pichgoal1000\
             \\{marker}{{\\*\\blipuid {id}}}{hex}}}"
        ),
        None => format!("{{\\pict\\picw1764\\pich1764\\{marker} {hex}}}"),
    }
}

/// Wrap groups in a minimal RTF document.
pub fn rtf_doc(groups: &[String]) -> String {
    format!("{{\\rtf1\\ansi\\deff0 {}\\par}}", groups.join("\n"))
}

// =========================================================================
// HTML
// =========================================================================

/// An `<img>` tag the way Word's HTML clipboard flavor writes it.
pub fn img(src: &str) -> String {
    format!(r#"<img width="96" height="96" src="{src}" alt="Picture">"#)
}

/// Wrap tags in a minimal HTML fragment.
pub fn html_doc(tags: &[String]) -> String {
    format!(
        "<html><body><!--StartFragment--><p>{}</p><!--EndFragment--></body></html>",
        tags.join("</p><p>")
    )
}

// =========================================================================
// Records
// =========================================================================

/// A record with the given type and payload.
pub fn record(id: &str, image_type: ImageType, hex: Option<&str>) -> ImageRecord {
    ImageRecord {
        id: Some(id.to_string()),
        image_type,
        hex: hex.map(String::from),
    }
}
