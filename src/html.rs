//! `<img>` discovery and in-place `src` substitution in clipboard HTML.
//!
//! Word's HTML clipboard flavor references pictures as local files
//! (`file:///C:/Users/.../clip_image001.png`) that do not exist outside the
//! copying machine. The RTF flavor carries the actual bytes. Both list
//! pictures in document order, so the i-th `<img>` belongs to the i-th RTF
//! picture.
//!
//! Only `file://` sources are rewritten. VML-only duplicates, `blob:` URLs
//! and existing `data:` URLs keep their position in the pairing but are left
//! untouched.

use crate::codec::build_data_url_with;
use crate::image_type::ImageType;
use crate::paste::PasteIssue;
use crate::rtf::ImageSequence;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src="([^"]+)[^>]+"#).expect("img src regex"));

/// Raw `src` values of every `<img>` tag, in document order.
pub fn extract_img_sources(html: &str) -> Vec<String> {
    IMG_SRC
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace `path` with `data_url` in the first `<img ... src="path` occurrence.
///
/// The path is matched literally; Windows paths with backslashes are safe.
pub fn replace_img_src(html: &str, path: &str, data_url: &str) -> String {
    let pattern = format!(r#"(<img [^>]*src=["']?){}"#, regex::escape(path));
    match Regex::new(&pattern) {
        Ok(re) => re
            .replacen(html, 1, |caps: &Captures| format!("{}{}", &caps[1], data_url))
            .into_owned(),
        Err(err) => {
            tracing::warn!(path, error = %err, "cannot build img pattern; leaving source as-is");
            html.to_string()
        }
    }
}

/// Replace every `<img>` whose `src` is exactly `url` with `data_url`.
pub fn replace_all_img_src(html: &str, url: &str, data_url: &str) -> String {
    let pattern = format!(
        r#"(<img\s[^>]*?src=["']?){}(["'\s>/])"#,
        regex::escape(url)
    );
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(html, |caps: &Captures| {
                format!("{}{}{}", &caps[1], data_url, &caps[2])
            })
            .into_owned(),
        Err(err) => {
            tracing::warn!(url, error = %err, "cannot build img pattern; leaving source as-is");
            html.to_string()
        }
    }
}

/// Pair `<img>` sources with extracted pictures by position and inline the
/// `file://` ones.
///
/// A count mismatch aborts without touching the HTML. Pictures that cannot be
/// encoded leave their placeholder alone and are reported individually.
pub fn apply_placements(
    html: &str,
    sources: &[String],
    images: &ImageSequence,
    supported: &[ImageType],
) -> (String, Vec<PasteIssue>) {
    if sources.len() != images.len() {
        return (
            html.to_string(),
            vec![PasteIssue::CountMismatch {
                rtf: images.len(),
                html: sources.len(),
            }],
        );
    }

    let mut result = html.to_string();
    let mut issues = Vec::new();
    for (index, (source, image)) in sources.iter().zip(images).enumerate() {
        if !source.starts_with("file://") {
            continue;
        }
        match build_data_url_with(image, supported) {
            Some(data_url) => result = replace_img_src(&result, source, &data_url),
            None => issues.push(PasteIssue::UnsupportedImageType {
                image_type: image.image_type,
                index,
            }),
        }
    }
    (result, issues)
}
