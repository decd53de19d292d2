//! Fallback for pastes without an RTF flavor.
//!
//! Some sources (browsers, screenshot tools) put `<img src="blob:...">` into
//! the HTML flavor and no RTF at all. The bytes behind those object URLs can
//! only be fetched by the host, so loading goes through the
//! [`ObjectUrlLoader`] trait.
//!
//! ## Ordering contract
//!
//! Distinct URLs are loaded concurrently on a rayon pool. Completion order is
//! irrelevant: results are gathered into a vector indexed like the
//! deduplicated URL list, and only then applied to the HTML, one URL at a
//! time in that order. A failed load or an unrecognized file signature
//! resolves to no data URL; its placeholders are left as they are.

use crate::codec::{Payload, encode};
use crate::html::replace_all_img_src;
use crate::image_type::{ImageType, classify_by_signature};
use crate::paste::PasteIssue;
use rayon::prelude::*;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("object URL cannot be mapped to a file: {0}")]
    Unmappable(String),
    #[error("object URL not available: {0}")]
    NotFound(String),
}

/// Fetches the bytes behind an object URL.
///
/// Implementations must be `Sync`: loads run in parallel.
pub trait ObjectUrlLoader: Sync {
    fn load(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Resolves `blob:` URLs to files in a directory, keyed by the last path
/// segment of the URL.
///
/// ```text
/// blob:https://example.com/4f1c-aa09   →  <root>/4f1c-aa09
/// blob:4f1c-aa09                       →  <root>/4f1c-aa09
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File backing `url`, or an error if the URL has no usable name.
    pub fn path_for(&self, url: &str) -> Result<PathBuf, LoadError> {
        let rest = strip_blob_scheme(url).ok_or_else(|| LoadError::Unmappable(url.to_string()))?;
        let name = rest.rsplit('/').next().unwrap_or(rest);
        let is_plain_name = !name.is_empty()
            && Path::new(name)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain_name {
            return Err(LoadError::Unmappable(url.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl ObjectUrlLoader for DirectoryLoader {
    fn load(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.path_for(url)?;
        if !path.is_file() {
            return Err(LoadError::NotFound(url.to_string()));
        }
        Ok(std::fs::read(path)?)
    }
}

fn strip_blob_scheme(url: &str) -> Option<&str> {
    let scheme = url.get(..5)?;
    scheme.eq_ignore_ascii_case("blob:").then(|| &url[5..])
}

/// Distinct `blob:` sources (case-insensitive scheme), first-seen order.
pub fn object_urls(sources: &[String]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for source in sources {
        if strip_blob_scheme(source).is_some() && !urls.contains(source) {
            urls.push(source.clone());
        }
    }
    urls
}

/// Outcome of loading one object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: String,
    pub data_url: Option<String>,
    pub issue: Option<PasteIssue>,
}

fn resolve_one(
    index: usize,
    url: &str,
    loader: &dyn ObjectUrlLoader,
    supported: &[ImageType],
) -> Resolution {
    let failed = |issue: PasteIssue| Resolution {
        url: url.to_string(),
        data_url: None,
        issue: Some(issue),
    };

    let bytes = match loader.load(url) {
        Ok(bytes) => bytes,
        Err(err) => {
            return failed(PasteIssue::LoadFailed {
                url: url.to_string(),
                index,
                reason: err.to_string(),
            });
        }
    };

    let Some(image_type) = classify_by_signature(&bytes) else {
        return failed(PasteIssue::UnrecognizedSignature {
            url: url.to_string(),
            index,
        });
    };

    match encode(Payload::Bytes(&bytes), Some(image_type), supported) {
        Ok(Some(data_url)) => Resolution {
            url: url.to_string(),
            data_url: Some(data_url),
            issue: None,
        },
        // Raw bytes cannot fail to encode; only the supported set can reject.
        _ => failed(PasteIssue::UnsupportedImageType { image_type, index }),
    }
}

/// Load all `urls` concurrently with at most `threads` workers. The result
/// is indexed like `urls`.
pub fn load_all(
    urls: &[String],
    loader: &dyn ObjectUrlLoader,
    supported: &[ImageType],
    threads: usize,
) -> Vec<Resolution> {
    let run = || {
        urls.par_iter()
            .enumerate()
            .map(|(index, url)| resolve_one(index, url, loader, supported))
            .collect::<Vec<_>>()
    };

    match rayon::ThreadPoolBuilder::new().num_threads(threads.max(1)).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            tracing::debug!(error = %err, "falling back to the global rayon pool");
            run()
        }
    }
}

/// Resolve every `blob:` source in `html` and inline the recognized ones.
pub fn resolve_object_urls(
    html: &str,
    sources: &[String],
    loader: &dyn ObjectUrlLoader,
    supported: &[ImageType],
    threads: usize,
) -> (String, Vec<PasteIssue>) {
    let urls = object_urls(sources);
    if urls.is_empty() {
        return (html.to_string(), Vec::new());
    }

    let resolutions = load_all(&urls, loader, supported, threads);

    let mut result = html.to_string();
    let mut issues = Vec::new();
    for resolution in resolutions {
        match (resolution.data_url, resolution.issue) {
            (Some(data_url), _) => {
                result = replace_all_img_src(&result, &resolution.url, &data_url);
            }
            (None, Some(issue)) => issues.push(issue),
            (None, None) => {}
        }
    }
    (result, issues)
}
