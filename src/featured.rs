//! Featured images on blog posts.
//!
//! A post may carry one featured image plus a focus point chosen by the
//! author (percent from the left, percent from the top). Listing pages show
//! it as a card, the post page as a hero; both are fit crops anchored at the
//! same focus point.

use crate::imaging::CropFocus;
use crate::imaging::ImageBackend;
use crate::storage::Storage;
use crate::variants::{VariantResolver, VariantSpec};

/// Card preview on listing pages.
pub const CARD: Preset = Preset {
    name: "card",
    width: 800,
    height: 450,
};

/// Full-width image at the top of a post.
pub const HERO: Preset = Preset {
    name: "hero",
    width: 1600,
    height: 900,
};

/// Focus used when the author never picked one.
pub const DEFAULT_FOCUS_PERCENT: u8 = 50;

/// A named, fixed-size crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl Preset {
    pub fn spec(self, focus: CropFocus) -> VariantSpec {
        VariantSpec::new(self.name, self.width, self.height).with_focus(focus)
    }
}

/// Clamp an author-supplied focus percentage into `0..=100`.
///
/// Only a missing value means "center". An explicit `0` is the left (or top)
/// edge and is kept as `0`, never treated as unset.
pub fn clamp_focus_percent(value: Option<i64>) -> u8 {
    value
        .map(|v| v.clamp(0, 100) as u8)
        .unwrap_or(DEFAULT_FOCUS_PERCENT)
}

/// The featured-image fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturedImage {
    /// Storage name of the uploaded image, if any.
    pub name: Option<String>,
    pub focus_x: Option<i64>,
    pub focus_y: Option<i64>,
}

impl FeaturedImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_focus(mut self, x: i64, y: i64) -> Self {
        self.focus_x = Some(x);
        self.focus_y = Some(y);
        self
    }

    pub fn has_image(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Clamped crop focus for this post.
    pub fn focus(&self) -> CropFocus {
        CropFocus::new(
            clamp_focus_percent(self.focus_x),
            clamp_focus_percent(self.focus_y),
        )
    }

    /// Token identifying the current focus, e.g. `fx30_fy50`.
    pub fn focus_token(&self) -> String {
        self.focus().token()
    }

    pub fn card_url<S, B>(&self, resolver: &VariantResolver<'_, S, B>) -> String
    where
        S: Storage + ?Sized,
        B: ImageBackend,
    {
        self.preset_url(CARD, resolver)
    }

    pub fn hero_url<S, B>(&self, resolver: &VariantResolver<'_, S, B>) -> String
    where
        S: Storage + ?Sized,
        B: ImageBackend,
    {
        self.preset_url(HERO, resolver)
    }

    /// URL for any preset, `""` when the post has no featured image.
    pub fn preset_url<S, B>(&self, preset: Preset, resolver: &VariantResolver<'_, S, B>) -> String
    where
        S: Storage + ?Sized,
        B: ImageBackend,
    {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => resolver.resolve(name, &preset.spec(self.focus())),
            _ => String::new(),
        }
    }
}
