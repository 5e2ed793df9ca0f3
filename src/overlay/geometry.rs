//! PDF Coordinate Mapper: page-space bounding boxes to canvas pixels.
//!
//! Pure arithmetic. The rendered canvas and the PDF page share an origin
//! and orientation; only the scale differs, and each page computes its own
//! render scale, so the mapping takes both page and canvas dimensions.

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, PageSize};

/// On-screen dimensions of one rendered page canvas, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasMetrics {
    pub width_px: f64,
    pub height_px: f64,
}

/// An absolutely positioned overlay rectangle, in CSS pixels relative to
/// the page container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Map a page-space bounding box to canvas pixels.
///
/// The 1px outset (x/y shifted out, width/height grown) is a border-drawing
/// allowance so the overlay border does not cover the glyphs it marks.
///
/// Returns `None` when the page dimensions are absent, non-positive or
/// non-finite, or the box has a negative extent: an unmappable box is an
/// input error the caller skips, never a numeric fault.
pub fn map_to_pixels(
    bbox: &BoundingBox,
    page: &PageSize,
    canvas: &CanvasMetrics,
) -> Option<PixelRect> {
    if !page.page_width.is_finite() || !page.page_height.is_finite() {
        return None;
    }
    if page.page_width <= 0.0 || page.page_height <= 0.0 {
        return None;
    }
    if !(bbox.w >= 0.0 && bbox.h >= 0.0) {
        return None;
    }

    let scale_x = canvas.width_px / page.page_width;
    let scale_y = canvas.height_px / page.page_height;

    Some(PixelRect {
        x: bbox.x * scale_x - 1.0,
        y: bbox.y * scale_y - 1.0,
        width: bbox.w * scale_x + 1.0,
        height: bbox.h * scale_y + 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: PageSize = PageSize {
        page_height: 792.0,
        page_width: 612.0,
    };

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox { p: 1, x, y, w, h }
    }

    #[test]
    fn test_identity_scale_applies_only_the_pad() {
        let canvas = CanvasMetrics {
            width_px: 612.0,
            height_px: 792.0,
        };
        let rect = map_to_pixels(&bbox(100.0, 200.0, 50.0, 10.0), &LETTER, &canvas).unwrap();

        assert_eq!(rect.x, 99.0);
        assert_eq!(rect.y, 199.0);
        assert_eq!(rect.width, 51.0);
        assert_eq!(rect.height, 11.0);
    }

    #[test]
    fn test_axes_scale_independently() {
        // canvas twice as wide, same height: only x/width double (pre-pad)
        let canvas = CanvasMetrics {
            width_px: 1224.0,
            height_px: 792.0,
        };
        let rect = map_to_pixels(&bbox(100.0, 200.0, 50.0, 10.0), &LETTER, &canvas).unwrap();

        assert_eq!(rect.x, 199.0);
        assert_eq!(rect.y, 199.0);
        assert_eq!(rect.width, 101.0);
        assert_eq!(rect.height, 11.0);
    }

    #[test]
    fn test_pure_function_same_inputs_same_output() {
        let canvas = CanvasMetrics {
            width_px: 918.0,
            height_px: 1188.0,
        };
        let b = bbox(70.2, 512.4, 41.9, 9.1);
        assert_eq!(
            map_to_pixels(&b, &LETTER, &canvas),
            map_to_pixels(&b, &LETTER, &canvas)
        );
    }

    #[test]
    fn test_doubling_canvas_doubles_pre_pad_values() {
        let canvas1 = CanvasMetrics {
            width_px: 612.0,
            height_px: 792.0,
        };
        let canvas2 = CanvasMetrics {
            width_px: 1224.0,
            height_px: 1584.0,
        };
        let b = bbox(100.0, 200.0, 50.0, 10.0);
        let r1 = map_to_pixels(&b, &LETTER, &canvas1).unwrap();
        let r2 = map_to_pixels(&b, &LETTER, &canvas2).unwrap();

        assert_eq!((r1.x + 1.0) * 2.0, r2.x + 1.0);
        assert_eq!((r1.y + 1.0) * 2.0, r2.y + 1.0);
        assert_eq!((r1.width - 1.0) * 2.0, r2.width - 1.0);
        assert_eq!((r1.height - 1.0) * 2.0, r2.height - 1.0);
    }

    #[test]
    fn test_degenerate_page_dimensions_yield_none() {
        let canvas = CanvasMetrics {
            width_px: 612.0,
            height_px: 792.0,
        };
        let b = bbox(10.0, 10.0, 5.0, 5.0);

        for page in [
            PageSize {
                page_height: 0.0,
                page_width: 612.0,
            },
            PageSize {
                page_height: 792.0,
                page_width: 0.0,
            },
            PageSize {
                page_height: -792.0,
                page_width: 612.0,
            },
            PageSize {
                page_height: f64::NAN,
                page_width: 612.0,
            },
        ] {
            assert!(map_to_pixels(&b, &page, &canvas).is_none());
        }
    }

    #[test]
    fn test_negative_box_extent_yields_none() {
        let canvas = CanvasMetrics {
            width_px: 612.0,
            height_px: 792.0,
        };
        assert!(map_to_pixels(&bbox(10.0, 10.0, -5.0, 5.0), &LETTER, &canvas).is_none());
        assert!(map_to_pixels(&bbox(10.0, 10.0, 5.0, f64::NAN), &LETTER, &canvas).is_none());
    }
}
