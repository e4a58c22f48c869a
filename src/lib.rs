//! # Folio Media
//!
//! Lazily generated, cached image variants for a portfolio site.
//!
//! Authors upload one featured image per blog post at whatever size they
//! have. Listing pages want it as an 800×450 card, post pages as a 1600×900
//! hero, both cropped around a focus point the author picked. This crate
//! turns `(source image, variant)` into the URL of a correctly cropped JPEG,
//! building it on first request and serving the stored copy afterwards.
//!
//! ```text
//! media/blog/featured/cover.png
//!   card  →  media/blog/featured/_variants/cover__card_800x450.jpg
//!   hero  →  media/blog/featured/_variants/cover__hero_1600x900_fx30_fy50.jpg
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`variants`] | The resolver: cache lookup, freshness, regeneration, fallback |
//! | [`imaging`] | Pure-Rust decode, orient, flatten, fit crop, JPEG encode |
//! | [`storage`] | Named-blob storage trait, filesystem and in-memory stores |
//! | [`naming`] | Derived file names as a pure function of the variant key |
//! | [`featured`] | Card/hero presets and the post's focus point |
//! | [`config`] | `folio.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The File Name Is the Cache Key
//!
//! There is no index or database of variants. The derived name encodes the
//! source path, variant, box size, and (when not centered) the focus point,
//! so checking the cache is a single existence test. Moving the focus point
//! produces a different name; replacing the source is caught by comparing
//! modification times when the storage can expose local paths.
//!
//! ## Never Break the Page
//!
//! [`VariantResolver::resolve`](variants::VariantResolver::resolve) returns a
//! `String`, not a `Result`. Every failure while building a variant is
//! logged with `tracing` and the original image URL is returned instead.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling (Lanczos3), and JPEG encoding all use the `image`
//! crate. No system libraries are required.

pub mod config;
pub mod featured;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod storage;
pub mod variants;

#[cfg(test)]
pub(crate) mod test_helpers;
