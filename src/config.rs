//! Media configuration module.
//!
//! Handles loading, validating, and merging `folio.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! media_root = "media"      # Directory holding uploaded images
//! media_url = "/media/"     # Public URL prefix for that directory
//!
//! [variants]
//! directory = "_variants"   # Reserved subdirectory next to each source
//! quality = 88              # JPEG quality (1-100)
//!
//! [presets.card]
//! width = 800
//! height = 450
//!
//! [presets.hero]
//! width = 1600
//! height = 900
//!
//! [processing]
//! max_processes = 4         # Max parallel workers for `warm` (omit for auto)
//! ```
//!
//! Extra `[presets.<name>]` tables add presets alongside `card` and `hero`.
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CropFocus, Quality};
use crate::naming::is_variant_slug;
use crate::variants::{DEFAULT_VARIANTS_DIR, VariantOptions, VariantSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Media configuration loaded from `folio.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Directory holding uploaded images.
    pub media_root: String,
    /// Public URL prefix under which `media_root` is served.
    pub media_url: String,
    /// Derived-file layout and encoding.
    pub variants: VariantsConfig,
    /// Named crop boxes, keyed by the slug used in derived file names.
    pub presets: BTreeMap<String, PresetConfig>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_root: "media".to_string(),
            media_url: "/media/".to_string(),
            variants: VariantsConfig::default(),
            presets: default_presets(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_presets() -> BTreeMap<String, PresetConfig> {
    [crate::featured::CARD, crate::featured::HERO]
        .into_iter()
        .map(|p| {
            (
                p.name.to_string(),
                PresetConfig {
                    width: p.width,
                    height: p.height,
                },
            )
        })
        .collect()
}

impl MediaConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.variants.quality) {
            return Err(ConfigError::Validation(
                "variants.quality must be 1-100".into(),
            ));
        }
        let dir = self.variants.directory.as_str();
        if dir.is_empty() || dir == "." || dir == ".." || dir.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "variants.directory must be a single directory name".into(),
            ));
        }
        if self.presets.is_empty() {
            return Err(ConfigError::Validation(
                "at least one preset is required".into(),
            ));
        }
        for (name, preset) in &self.presets {
            if !is_variant_slug(name) {
                return Err(ConfigError::Validation(format!(
                    "preset name {name:?} must use only a-z, 0-9 and '-'"
                )));
            }
            if preset.width == 0 || preset.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "presets.{name} width and height must be non-zero"
                )));
            }
        }
        Ok(())
    }

    pub fn variant_options(&self) -> VariantOptions {
        VariantOptions {
            quality: Quality::new(self.variants.quality),
            variants_dir: self.variants.directory.clone(),
        }
    }

    /// Spec for one named preset at the given focus.
    pub fn preset(&self, name: &str, focus: CropFocus) -> Option<VariantSpec> {
        self.presets
            .get(name)
            .map(|p| VariantSpec::new(name, p.width, p.height).with_focus(focus))
    }

    /// Specs for every configured preset, in name order.
    pub fn preset_specs(&self, focus: CropFocus) -> Vec<VariantSpec> {
        self.presets
            .iter()
            .map(|(name, p)| VariantSpec::new(name.as_str(), p.width, p.height).with_focus(focus))
            .collect()
    }
}

/// Derived-file layout and encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    /// Reserved subdirectory created next to each source image.
    pub directory: String,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_VARIANTS_DIR.to_string(),
            quality: Quality::default().value(),
        }
    }
}

/// A fixed crop box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    pub width: u32,
    pub height: u32,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers for batch warming.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
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
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(MediaConfig::default())?)
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<MediaConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MediaConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<MediaConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `folio.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-media configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory holding uploaded images (featured images, project shots, ...).
media_root = "media"

# Public URL prefix under which media_root is served.
media_url = "/media/"

# ---------------------------------------------------------------------------
# Derived variants
# ---------------------------------------------------------------------------
[variants]
# Reserved subdirectory created next to each source image.
# blog/featured/cover.png -> blog/featured/_variants/cover__card_800x450.jpg
directory = "_variants"

# JPEG encoding quality (1 = worst, 100 = best).
quality = 88

# ---------------------------------------------------------------------------
# Presets
# ---------------------------------------------------------------------------
# Each preset is a fixed crop box. The name appears in derived file names,
# so use lowercase letters, digits and '-'. Add more tables to add presets.

# Card preview on blog listing pages.
[presets.card]
width = 800
height = 450

# Full-width image at the top of a post.
[presets.hero]
width = 1600
height = 900

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `folio-media warm`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
