//! Pure calculation functions for fit-crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropFocus;

/// Calculate the largest region of the source that has the target's aspect
/// ratio (crop before resize).
///
/// One edge keeps the full source length; the other is the matching length
/// for the target aspect, rounded to the nearest pixel and kept within
/// `1..=source`. Cropping this region and resizing it to `target` gives an
/// exact-size result whose memory cost is bounded by the source, whatever the
/// target or the source's aspect ratio.
///
/// Aspect ratios are compared by cross-multiplication in `u64`; every
/// product of two `u32`s fits, so no intermediate can overflow or truncate.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height), both non-zero
/// * `target` - Target box dimensions (width, height), both non-zero
///
/// # Returns
/// * `(width, height)` - Crop size in source pixels, never larger than `source`
pub fn calculate_crop_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (u64::from(source.0), u64::from(source.1));
    let (tgt_w, tgt_h) = (u64::from(target.0), u64::from(target.1));

    if src_w * tgt_h > tgt_w * src_h {
        // Source is wider: keep full height, trim width
        let w = (src_h * tgt_w + tgt_h / 2) / tgt_h;
        (clamp_edge(w, source.0), source.1)
    } else {
        // Source is taller (or same ratio): keep full width, trim height
        let h = (src_w * tgt_h + tgt_w / 2) / tgt_w;
        (source.0, clamp_edge(h, source.1))
    }
}

fn clamp_edge(length: u64, max: u32) -> u32 {
    // Clamped to a u32 bound, so the conversion cannot fail
    u32::try_from(length.clamp(1, u64::from(max))).unwrap_or(max)
}

/// Calculate the top-left corner of a crop box inside a larger image.
///
/// The excess on each axis is split according to the focus: 0% keeps the
/// leading edge, 50% centers, 100% keeps the trailing edge. The offset is
/// clamped so the crop box always lies inside `outer`, which also absorbs
/// out-of-range focus values.
pub fn calculate_crop_offset(outer: (u32, u32), crop: (u32, u32), focus: CropFocus) -> (u32, u32) {
    let (fx, fy) = focus.fractions();
    (
        axis_offset(outer.0, crop.0, fx),
        axis_offset(outer.1, crop.1, fy),
    )
}

fn axis_offset(outer: u32, crop: u32, fraction: f64) -> u32 {
    let excess = outer.saturating_sub(crop);
    let offset = (f64::from(excess) * fraction).round();
    (offset.max(0.0) as u32).min(excess)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_crop_size tests
    // =========================================================================

    #[test]
    fn crop_landscape_source_for_wide_card() {
        // 1200x800 (3:2) → 800x450 (16:9): full width, h = 1200 * 9/16 = 675
        assert_eq!(calculate_crop_size((1200, 800), (800, 450)), (1200, 675));
    }

    #[test]
    fn crop_is_independent_of_upscaling() {
        // Same aspect as the card, so the same region is kept for the hero
        assert_eq!(calculate_crop_size((1200, 800), (1600, 900)), (1200, 675));
    }

    #[test]
    fn crop_wider_source_for_portrait_target() {
        // 800x600 → 400x500: full height, w = 600 * 4/5 = 480
        assert_eq!(calculate_crop_size((800, 600), (400, 500)), (480, 600));
    }

    #[test]
    fn crop_taller_source_for_landscape_target() {
        // 600x800 → 500x400: full width, h = 600 * 4/5 = 480
        assert_eq!(calculate_crop_size((600, 800), (500, 400)), (600, 480));
    }

    #[test]
    fn crop_same_aspect_ratio_keeps_everything() {
        assert_eq!(calculate_crop_size((800, 600), (400, 300)), (800, 600));
        assert_eq!(calculate_crop_size((1920, 1080), (1600, 900)), (1920, 1080));
    }

    #[test]
    fn crop_rounds_to_nearest_pixel() {
        // 1000x333 → 100x100: full height, width 333
        assert_eq!(calculate_crop_size((1000, 333), (100, 100)), (333, 333));
        // 1000x335 → 200x100: height 500 would exceed, so full height, w = 670
        assert_eq!(calculate_crop_size((1000, 335), (200, 100)), (670, 335));
    }

    #[test]
    fn crop_never_exceeds_source() {
        for (source, target) in [
            ((2, 1000), (800, 450)),
            ((1000, 2), (450, 800)),
            ((1, 1), (1600, 900)),
            ((u32::MAX, 1), (1, u32::MAX)),
            ((1, 5_000_000), (1600, 900)),
        ] {
            let (w, h) = calculate_crop_size(source, target);
            assert!(w >= 1 && w <= source.0, "{source:?} → {target:?}: width {w}");
            assert!(h >= 1 && h <= source.1, "{source:?} → {target:?}: height {h}");
        }
    }

    #[test]
    fn crop_extreme_tall_source_stays_tiny() {
        // A 2px-wide strip for an 800x450 card keeps a 2x1 region, not a
        // multi-gigabyte cover image
        assert_eq!(calculate_crop_size((2, 1000), (800, 450)), (2, 1));
        assert_eq!(calculate_crop_size((1, 5_000_000), (1600, 900)), (1, 1));
    }

    // =========================================================================
    // calculate_crop_offset tests
    // =========================================================================

    #[test]
    fn offset_centered() {
        assert_eq!(
            calculate_crop_offset((800, 534), (800, 450), CropFocus::CENTER),
            (0, 42)
        );
        // 1200x800 source, 1200x675 card region: 125px excess, 62.5 rounds up
        assert_eq!(
            calculate_crop_offset((1200, 800), (1200, 675), CropFocus::CENTER),
            (0, 63)
        );
    }

    #[test]
    fn offset_top_and_bottom() {
        assert_eq!(
            calculate_crop_offset((800, 534), (800, 450), CropFocus::new(50, 0)),
            (0, 0)
        );
        assert_eq!(
            calculate_crop_offset((800, 534), (800, 450), CropFocus::new(50, 100)),
            (0, 84)
        );
    }

    #[test]
    fn offset_left_third() {
        // 667x500 → 400x500, excess 267, 30% → 80.1 → 80
        assert_eq!(
            calculate_crop_offset((667, 500), (400, 500), CropFocus::new(30, 50)),
            (80, 0)
        );
    }

    #[test]
    fn offset_out_of_range_focus_is_clamped() {
        assert_eq!(
            calculate_crop_offset((800, 534), (800, 450), CropFocus::new(200, 255)),
            (0, 84)
        );
    }

    #[test]
    fn offset_no_excess() {
        assert_eq!(
            calculate_crop_offset((400, 300), (400, 300), CropFocus::new(0, 100)),
            (0, 0)
        );
    }
}
