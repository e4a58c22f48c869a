//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image` crate, format guessed from content |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Flatten alpha | alpha blend onto white, per pixel |
//! | Focus crop | `image::imageops::crop_imm`, target aspect, in source pixels |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_crop_offset, calculate_crop_size};
use super::params::FitParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat, ImageReader,
    Rgb, RgbImage, Rgba, RgbaImage,
};
use std::io::{Cursor, Read};
use std::sync::LazyLock;

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// How a decoded image's pixels reach 8-bit RGB before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Already 8-bit RGB, passed through untouched.
    Rgb,
    /// Carries an alpha channel; composited onto white.
    ///
    /// Palette images land here too: the decoders expand indexed pixels
    /// (including `tRNS` / GIF transparency) into an RGBA buffer, so palette
    /// transparency is honored rather than dropped.
    Alpha,
    /// Anything else (grayscale, 16-bit, float); generic conversion.
    Other,
}

impl ColorMode {
    pub fn of(img: &DynamicImage) -> Self {
        match img {
            DynamicImage::ImageRgb8(_) => ColorMode::Rgb,
            other if other.color().has_alpha() => ColorMode::Alpha,
            _ => ColorMode::Other,
        }
    }
}

/// Decode an image from a byte stream and apply its EXIF orientation.
fn load_image(source: &mut dyn Read) -> Result<DynamicImage, BackendError> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;

    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| BackendError::Decode(e.to_string()))?;
    // A missing or unreadable EXIF block just means "already upright"
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| BackendError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Reduce any decoded image to opaque 8-bit RGB.
pub(crate) fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    match ColorMode::of(&img) {
        ColorMode::Rgb => img.into_rgb8(),
        ColorMode::Alpha => composite_on_white(&img.into_rgba8()),
        ColorMode::Other => img.into_rgb8(),
    }
}

/// Blend every pixel onto a white background, using alpha as the mask.
fn composite_on_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Crop the target aspect out of the source at the focus point, then resize
/// that region to exactly the target size.
///
/// Cropping first keeps every intermediate buffer no larger than the source.
pub(crate) fn fit_image(rgb: RgbImage, params: &FitParams) -> RgbImage {
    let source = rgb.dimensions();
    let target = (params.width, params.height);
    let crop = calculate_crop_size(source, target);
    let (x, y) = calculate_crop_offset(source, crop, params.focus);

    let region = if crop == source {
        rgb
    } else {
        image::imageops::crop_imm(&rgb, x, y, crop.0, crop.1).to_image()
    };

    if region.dimensions() == target {
        region
    } else {
        image::imageops::resize(&region, target.0, target.1, FilterType::Lanczos3)
    }
}

/// Encode opaque RGB pixels as a baseline JPEG.
fn encode_jpeg(rgb: &RgbImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let quality = u8::try_from(quality.clamp(1, 100)).unwrap_or(100);
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn fit(&self, source: &mut dyn Read, params: &FitParams) -> Result<Vec<u8>, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::Encode(format!(
                "Target size must be non-zero, got {}x{}",
                params.width, params.height
            )));
        }

        let img = load_image(source)?;
        if img.width() == 0 || img.height() == 0 {
            return Err(BackendError::Decode("Source image has no pixels".into()));
        }

        let rgb = flatten_to_rgb(img);
        let fitted = fit_image(rgb, params);
        encode_jpeg(&fitted, params.quality.value())
    }
}
