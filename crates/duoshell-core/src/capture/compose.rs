//! Composite image construction.
//!
//! Pure functions: the same two inputs always produce the same output
//! bytes, which the capture tests rely on.

use duoshell_types::Slot;
use image::{Rgba, RgbaImage, imageops};

/// Placeholder dimensions when neither panel produced a real frame.
pub const PLACEHOLDER_WIDTH: u32 = 1080;
pub const PLACEHOLDER_HEIGHT: u32 = 1920;

/// Placeholder fill colors, one per slot so a failed capture is visibly
/// attributable to its panel.
const TOP_PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0x37, 0x47, 0x4f, 0xff]);
const BOTTOM_PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0x4e, 0x34, 0x2e, 0xff]);

/// Vertically stack the two panel images on a transparent canvas.
///
/// Canvas is `max(width_top, width_bottom)` wide and
/// `height_top + height_bottom` tall; the narrower image is centered
/// horizontally. Remainder pixels stay transparent.
#[must_use]
pub fn composite(top: &RgbaImage, bottom: &RgbaImage) -> RgbaImage {
    let width = top.width().max(bottom.width());
    let height = top.height() + bottom.height();

    let mut canvas = RgbaImage::new(width, height);
    imageops::overlay(&mut canvas, top, i64::from((width - top.width()) / 2), 0);
    imageops::overlay(
        &mut canvas,
        bottom,
        i64::from((width - bottom.width()) / 2),
        i64::from(top.height()),
    );
    canvas
}

/// Deterministic solid-color stand-in for a failed panel capture.
#[must_use]
pub fn placeholder(slot: Slot, width: u32, height: u32) -> RgbaImage {
    let color = match slot {
        Slot::Top => TOP_PLACEHOLDER_COLOR,
        Slot::Bottom => BOTTOM_PLACEHOLDER_COLOR,
    };
    RgbaImage::from_pixel(width.max(1), height.max(1), color)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 0xff]))
    }

    #[test]
    fn test_composite_dimensions() {
        let top = solid(800, 600, 10);
        let bottom = solid(1080, 1920, 20);
        let out = composite(&top, &bottom);

        assert_eq!(out.width(), 1080);
        assert_eq!(out.height(), 600 + 1920);
    }

    #[test]
    fn test_composite_is_deterministic() {
        let top = solid(800, 600, 10);
        let bottom = solid(1080, 1920, 20);

        let a = composite(&top, &bottom);
        let b = composite(&top, &bottom);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_narrower_top_is_centered() {
        let top = solid(100, 10, 10);
        let bottom = solid(200, 10, 20);
        let out = composite(&top, &bottom);

        // Left edge of the top image = (200 - 100) / 2 = 50.
        assert_eq!(out.get_pixel(49, 0).0[3], 0, "left margin is transparent");
        assert_eq!(out.get_pixel(50, 0).0, [10, 10, 10, 0xff]);
        assert_eq!(out.get_pixel(149, 0).0, [10, 10, 10, 0xff]);
        assert_eq!(out.get_pixel(150, 0).0[3], 0, "right margin is transparent");
    }

    #[test]
    fn test_bottom_starts_below_top() {
        let top = solid(100, 10, 10);
        let bottom = solid(100, 10, 20);
        let out = composite(&top, &bottom);

        assert_eq!(out.get_pixel(0, 9).0, [10, 10, 10, 0xff]);
        assert_eq!(out.get_pixel(0, 10).0, [20, 20, 20, 0xff]);
    }

    #[test]
    fn test_equal_widths_have_no_margin() {
        let top = solid(64, 8, 10);
        let bottom = solid(64, 8, 20);
        let out = composite(&top, &bottom);

        assert_eq!(out.width(), 64);
        assert_eq!(out.get_pixel(0, 0).0, [10, 10, 10, 0xff]);
        assert_eq!(out.get_pixel(63, 15).0, [20, 20, 20, 0xff]);
    }

    #[test]
    fn test_placeholders_are_distinct_per_slot() {
        let top = placeholder(Slot::Top, 4, 4);
        let bottom = placeholder(Slot::Bottom, 4, 4);
        assert_ne!(top.get_pixel(0, 0), bottom.get_pixel(0, 0));
    }

    #[test]
    fn test_placeholder_is_solid() {
        let img = placeholder(Slot::Top, 8, 8);
        let first = *img.get_pixel(0, 0);
        assert!(img.pixels().all(|p| *p == first));
    }

    #[test]
    fn test_placeholder_clamps_zero_dimensions() {
        let img = placeholder(Slot::Bottom, 0, 0);
        assert_eq!(img.dimensions(), (1, 1));
    }
}
