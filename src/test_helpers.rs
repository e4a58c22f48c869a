//! Shared test utilities for the folio-media test suite.
//!
//! Provides synthetic image builders and a temp-dir media root so tests can
//! exercise the variant cache without fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, storage) = temp_media_root();
//! write_source(&storage, "blog/featured/cover.jpg", &jpeg_bytes(1200, 800));
//! ```

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageEncoder, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

use crate::storage::{FileSystemStorage, Storage};

// =========================================================================
// Synthetic images
// =========================================================================

/// Gradient RGB image, distinct enough per pixel that crops are visible.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a gradient image as JPEG bytes.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_rgb(width, height);
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode any image as PNG bytes (keeps alpha).
pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Opaque dark-blue RGBA image whose four 20x20 corners are fully transparent.
pub fn transparent_corners_rgba(width: u32, height: u32) -> RgbaImage {
    const CORNER: u32 = 20;
    RgbaImage::from_fn(width, height, |x, y| {
        let near_x = x < CORNER || x >= width.saturating_sub(CORNER);
        let near_y = y < CORNER || y >= height.saturating_sub(CORNER);
        if near_x && near_y {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([20, 40, 120, 255])
        }
    })
}

/// Insert an EXIF APP1 segment carrying `orientation` right after the JPEG
/// start-of-image marker.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let [hi, lo] = orientation.to_be_bytes();
    // Big-endian TIFF header, one IFD entry: tag 0x0112 SHORT x1
    let tiff: [u8; 26] = [
        b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, // header, IFD at 8
        0x00, 0x01, // one entry
        0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, hi, lo, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, // no next IFD
    ];
    let payload_len = (2 + 6 + tiff.len()) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload_len as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&payload_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Indexed PNG: palette entry 0 is fully transparent (via `tRNS`), entry 1
/// is opaque blue. The left half uses entry 0, the right half entry 1.
pub fn indexed_png_left_transparent(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(vec![0u8, 0, 0, 0, 0, 255]);
        encoder.set_trns(vec![0u8]);
        let mut writer = encoder.write_header().unwrap();
        let data: Vec<u8> = (0..height)
            .flat_map(|_| (0..width).map(move |x| u8::from(x >= width / 2)))
            .collect();
        writer.write_image_data(&data).unwrap();
    }
    buf
}

/// Encode an RGBA image as a palette GIF (alpha 0 becomes the transparent index).
pub fn gif_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut buf);
        encoder
            .encode(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgba8)
            .unwrap();
    }
    buf
}

// =========================================================================
// Storage fixtures
// =========================================================================

/// Empty media root in a temp directory, served under `/media/`.
pub fn temp_media_root() -> (TempDir, FileSystemStorage) {
    let tmp = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(tmp.path(), "/media/");
    (tmp, storage)
}

/// Save source bytes into any storage. Panics on failure.
pub fn write_source(storage: &dyn Storage, name: &str, bytes: &[u8]) {
    storage
        .save(name, bytes)
        .unwrap_or_else(|e| panic!("failed to write fixture '{name}': {e}"));
}

/// Set a file's modification time to `secs` seconds after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let time = std::time::UNIX_EPOCH + std::time::Duration::from_secs(secs);
    std::fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(time))
        .unwrap_or_else(|e| panic!("failed to set mtime on {}: {e}", path.display()));
}
