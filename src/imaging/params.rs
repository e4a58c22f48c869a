//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the variant resolver (which decides which variant to
//! build) and the [`backend`](super::backend) (which does the pixel work).
//! Keeping them separate lets tests swap in a mock backend without touching
//! resolver logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 88). Clamped on construction.
//! - [`CropFocus`]: Focus point for the fit crop, as whole percentages.
//! - [`FitParams`]: Full specification for a fit crop: target box, focus, quality.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(88)
    }
}

/// Where a fit crop is anchored, in whole percent of the excess.
///
/// `x = 0` keeps the left edge, `x = 100` keeps the right edge; `y` runs from
/// top to bottom the same way. Values are not clamped here: callers own
/// the range, and the crop offset math clamps to the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropFocus {
    pub x: u8,
    pub y: u8,
}

impl CropFocus {
    pub const CENTER: CropFocus = CropFocus { x: 50, y: 50 };

    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Focus as fractions, `(0.5, 0.5)` for the center.
    pub fn fractions(self) -> (f64, f64) {
        (f64::from(self.x) / 100.0, f64::from(self.y) / 100.0)
    }

    pub fn is_center(self) -> bool {
        self == Self::CENTER
    }

    /// Cache-busting token embedded in derived file names, e.g. `fx30_fy50`.
    pub fn token(self) -> String {
        format!("fx{}_fy{}", self.x, self.y)
    }
}

impl Default for CropFocus {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Parameters for a fit crop (cover-resize + focus crop + JPEG encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitParams {
    pub width: u32,
    pub height: u32,
    pub focus: CropFocus,
    pub quality: Quality,
}
