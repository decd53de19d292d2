//! Filter configuration.
//!
//! Handles loading, validating, and merging `pict-paste.toml`. Stock defaults
//! are overridden by the user file, key by key; a missing file means stock
//! defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! supported_types = ["png", "jpeg", "gif"]  # Types inlined as data: URLs
//!
//! [rtf]
//! extra_removed_groups = []   # Group names ignored in addition to headers,
//!                             # footers, \nonshppict and \shprslt
//!
//! [fallback]
//! enabled = true              # Resolve blob: images when no RTF is present
//!
//! [processing]
//! max_processes = 4           # Max parallel object-URL loads (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! # Only inline PNG pictures
//! [images]
//! supported_types = ["png"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::image_type::{DEFAULT_SUPPORTED_TYPES, ImageType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Filter configuration loaded from `pict-paste.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasteConfig {
    /// Which image types are inlined.
    pub images: ImagesConfig,
    /// RTF preprocessing.
    pub rtf: RtfConfig,
    /// Object-URL fallback for pastes without RTF.
    pub fallback: FallbackConfig,
    /// Parallel loading settings.
    pub processing: ProcessingConfig,
}

impl PasteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.supported_types.is_empty() {
            return Err(ConfigError::Validation(
                "images.supported_types must not be empty".into(),
            ));
        }
        if let Some(ty) = self.images.supported_types.iter().find(|ty| !ty.is_raster()) {
            return Err(ConfigError::Validation(format!(
                "images.supported_types: {ty} cannot be inlined (png, jpeg and gif only)"
            )));
        }
        if let Some(name) = self
            .rtf
            .extra_removed_groups
            .iter()
            .find(|name| !is_group_name(name))
        {
            return Err(ConfigError::Validation(format!(
                "rtf.extra_removed_groups: {name:?} is not an RTF control word"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A control-word name as written after `{\`: ASCII letters, or `*`.
fn is_group_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == '*')
}

/// Image type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Types inlined as `data:` URLs. Raster types only.
    pub supported_types: Vec<ImageType>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            supported_types: DEFAULT_SUPPORTED_TYPES.to_vec(),
        }
    }
}

/// RTF preprocessing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RtfConfig {
    /// Control-word names of extra groups to strip before collecting pictures.
    pub extra_removed_groups: Vec<String>,
}

/// Object-URL fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub enabled: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of concurrent object-URL loads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PasteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PasteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PasteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged over stock defaults and validated.
pub fn load_config(path: &Path) -> Result<PasteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pict-paste configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Image types
# ---------------------------------------------------------------------------
[images]
# Picture types inlined as data: URLs. Only raster types browsers render are
# accepted: "png", "jpeg", "gif". Pictures of other types (EMF/WMF metafiles,
# unknown blips) keep their original src and are reported.
supported_types = ["png", "jpeg", "gif"]

# ---------------------------------------------------------------------------
# RTF preprocessing
# ---------------------------------------------------------------------------
[rtf]
# Extra groups whose pictures never appear in the HTML flavor, by control
# word name (e.g. "annotation"). Headers, footers, \nonshppict and \shprslt
# are always stripped.
extra_removed_groups = []

# ---------------------------------------------------------------------------
# Object-URL fallback
# ---------------------------------------------------------------------------
[fallback]
# When the paste has no RTF flavor, load blob: images and inline them.
enabled = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum concurrent object-URL loads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
