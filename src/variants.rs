//! Lazily generated, cached image variants.
//!
//! A featured image is uploaded once at whatever size the author had on hand.
//! Pages need it at fixed boxes (an 800×450 card, a 1600×900 hero). This
//! module turns `(source, variant)` into a URL for a correctly cropped JPEG,
//! building the JPEG on first request and reusing it afterwards.
//!
//! # Resolution
//!
//! ```text
//! resolve(source, spec)
//!   source empty?                       → ""            (no image set)
//!   name = variant_file_name(key)
//!   exists(name) and not stale?         → url(name)     (Cached)
//!   open source → fit → delete stale → save
//!     ok                                → url(name)     (Generated / Regenerated)
//!     any error                         → url(source)   (Fallback)
//! ```
//!
//! ## Freshness
//!
//! A stored variant is fresh when it exists and, if the storage can expose
//! local paths, its modification time is not older than the source's. Remote
//! stores without paths fall back to existence alone. When the paths cannot
//! be resolved the variant is trusted; when modification times cannot be read
//! it is rebuilt.
//!
//! ## Failure policy
//!
//! A broken crop must never break a page. Every regeneration error (unreadable
//! source, corrupt image, failed delete of a stale file, failed write) is
//! logged and the caller gets the original image URL instead. Nothing is
//! retried, and a stale file whose delete fails is left in place.
//!
//! ## Concurrency
//!
//! There is no locking around check-then-write. Two concurrent first requests
//! for the same key both build and both write; the name is a pure function of
//! the key and the encoder is deterministic, so the last writer wins with
//! identical bytes.

use crate::imaging::{BackendError, CropFocus, FitParams, ImageBackend, Quality, RustBackend};
use crate::naming::{is_variant_slug, variant_file_name};
use crate::storage::{LocalPaths, Storage, StorageError};
use std::fmt;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

/// Reserved subdirectory, next to each source, holding its variants.
pub const DEFAULT_VARIANTS_DIR: &str = "_variants";

#[derive(Error, Debug)]
pub enum VariantError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Image error: {0}")]
    Backend(#[from] BackendError),
    #[error("Invalid variant name {0:?}: use only a-z, 0-9 and '-'")]
    InvalidName(String),
}

/// The caller-chosen half of a variant key: what box, cropped where.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    /// Short slug used in the derived file name (`card`, `hero`).
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub focus: CropFocus,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            focus: CropFocus::CENTER,
        }
    }

    pub fn with_focus(mut self, focus: CropFocus) -> Self {
        self.focus = focus;
        self
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Full identity of a derived asset. Equal keys always map to the same
/// derived name, distinct keys never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey<'a> {
    pub source: &'a str,
    pub spec: &'a VariantSpec,
}

impl<'a> VariantKey<'a> {
    pub fn new(source: &'a str, spec: &'a VariantSpec) -> Self {
        Self { source, spec }
    }

    pub fn file_name(&self, variants_dir: &str) -> String {
        variant_file_name(
            self.source,
            variants_dir,
            &self.spec.name,
            self.spec.size(),
            self.spec.focus,
        )
    }
}

/// Encoder and layout settings shared by every resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOptions {
    pub quality: Quality,
    pub variants_dir: String,
}

impl Default for VariantOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            variants_dir: DEFAULT_VARIANTS_DIR.to_string(),
        }
    }
}

/// What a single resolution did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No source image; nothing was touched.
    Empty,
    /// A fresh variant was already stored.
    Cached,
    /// The variant did not exist and was built.
    Generated,
    /// A stale variant was replaced.
    Regenerated,
    /// Building failed; the URL points at the original image.
    Fallback(String),
}

/// URL handed back to the caller plus what happened to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: String,
    /// Storage name of the variant, absent for `Empty` and `Fallback`.
    pub variant: Option<String>,
    pub outcome: Outcome,
}

impl Resolution {
    fn empty() -> Self {
        Self {
            url: String::new(),
            variant: None,
            outcome: Outcome::Empty,
        }
    }
}

/// Resolves variant URLs against a storage, building missing or stale ones.
pub struct VariantResolver<'s, S: Storage + ?Sized, B: ImageBackend = RustBackend> {
    storage: &'s S,
    backend: B,
    options: VariantOptions,
}

impl<'s, S: Storage + ?Sized> VariantResolver<'s, S, RustBackend> {
    pub fn new(storage: &'s S) -> Self {
        Self::with_backend(storage, RustBackend::new())
    }
}

impl<'s, S: Storage + ?Sized, B: ImageBackend> VariantResolver<'s, S, B> {
    pub fn with_backend(storage: &'s S, backend: B) -> Self {
        Self {
            storage,
            backend,
            options: VariantOptions::default(),
        }
    }

    pub fn with_options(mut self, options: VariantOptions) -> Self {
        self.options = options;
        self
    }

    pub fn storage(&self) -> &S {
        self.storage
    }

    pub fn options(&self) -> &VariantOptions {
        &self.options
    }

    /// URL for `source` cropped to `spec`; `""` when there is no source.
    ///
    /// Never fails: regeneration errors degrade to the original image URL.
    pub fn resolve(&self, source: &str, spec: &VariantSpec) -> String {
        self.resolve_detailed(source, spec).url
    }

    /// Like [`resolve`](Self::resolve), also reporting what happened.
    pub fn resolve_detailed(&self, source: &str, spec: &VariantSpec) -> Resolution {
        if source.is_empty() {
            return Resolution::empty();
        }
        if !is_variant_slug(&spec.name) {
            let error = VariantError::InvalidName(spec.name.clone());
            warn!(source, %error, "cannot name variant, serving original");
            return self.fallback(source, &error);
        }

        let variant_name = VariantKey::new(source, spec).file_name(&self.options.variants_dir);
        let exists = self.storage.exists(&variant_name);
        let stale = exists
            && self
                .storage
                .local_paths()
                .is_some_and(|paths| is_older_than_source(paths, source, &variant_name));

        if exists && !stale {
            debug!(source, variant = %variant_name, "variant cache hit");
            return Resolution {
                url: self.storage.url(&variant_name),
                variant: Some(variant_name),
                outcome: Outcome::Cached,
            };
        }

        match self.regenerate(source, &variant_name, spec) {
            Ok(()) => {
                debug!(source, variant = %variant_name, stale, "variant written");
                Resolution {
                    url: self.storage.url(&variant_name),
                    variant: Some(variant_name),
                    outcome: if stale {
                        Outcome::Regenerated
                    } else {
                        Outcome::Generated
                    },
                }
            }
            Err(error) => {
                warn!(
                    source,
                    variant = %variant_name,
                    %error,
                    "variant regeneration failed, serving original"
                );
                self.fallback(source, &error)
            }
        }
    }

    fn fallback(&self, source: &str, error: &VariantError) -> Resolution {
        Resolution {
            url: self.storage.url(source),
            variant: None,
            outcome: Outcome::Fallback(error.to_string()),
        }
    }

    /// Build the variant bytes, drop any stale copy, store the new one.
    fn regenerate(
        &self,
        source: &str,
        variant_name: &str,
        spec: &VariantSpec,
    ) -> Result<(), VariantError> {
        let params = FitParams {
            width: spec.width,
            height: spec.height,
            focus: spec.focus,
            quality: self.options.quality,
        };
        let bytes = {
            let mut reader = self.storage.open(source)?;
            self.backend.fit(&mut *reader, &params)?
        };

        if self.storage.exists(variant_name) {
            self.storage.delete(variant_name)?;
        }
        self.storage.save(variant_name, &bytes)?;
        Ok(())
    }
}

/// Whether the stored variant predates its source.
fn is_older_than_source(paths: &dyn LocalPaths, source: &str, variant: &str) -> bool {
    let (Ok(source_path), Ok(variant_path)) = (paths.path(source), paths.path(variant)) else {
        return false;
    };
    match (modified(&variant_path), modified(&source_path)) {
        (Ok(variant_time), Ok(source_time)) => variant_time < source_time,
        _ => true,
    }
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Summary of variant outcomes for a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VariantStats {
    pub cached: u32,
    pub generated: u32,
    pub regenerated: u32,
    pub fallbacks: u32,
    pub empty: u32,
}

impl VariantStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Empty => self.empty += 1,
            Outcome::Cached => self.cached += 1,
            Outcome::Generated => self.generated += 1,
            Outcome::Regenerated => self.regenerated += 1,
            Outcome::Fallback(_) => self.fallbacks += 1,
        }
    }

    pub fn merge(mut self, other: &VariantStats) -> Self {
        self.cached += other.cached;
        self.generated += other.generated;
        self.regenerated += other.regenerated;
        self.fallbacks += other.fallbacks;
        self.empty += other.empty;
        self
    }

    pub fn total(&self) -> u32 {
        self.cached + self.generated + self.regenerated + self.fallbacks
    }
}

impl fmt::Display for VariantStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} generated", self.cached, self.generated)?;
        if self.regenerated > 0 {
            write!(f, ", {} refreshed", self.regenerated)?;
        }
        if self.fallbacks > 0 {
            write!(f, ", {} failed", self.fallbacks)?;
        }
        write!(f, " ({} total)", self.total())
    }
}
