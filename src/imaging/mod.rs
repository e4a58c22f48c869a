//! Image processing in pure Rust, with no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orient** | `image` decoders, EXIF orientation |
//! | **Flatten** | alpha composited onto white |
//! | **Fit crop** | focus crop at target aspect + Lanczos3 resize |
//! | **Encode** | JPEG, quality 88 by default |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing the fit operation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{calculate_crop_offset, calculate_crop_size};
pub use params::{CropFocus, FitParams, Quality};
pub use rust_backend::{ColorMode, RustBackend, supported_input_extensions};
