//! Cover-fit placement.
//!
//! Scales a source image until it covers the destination rectangle, then
//! crops the overflow around a focal point. No letterboxing, no stretching.

use image::{Rgba, RgbaImage};

use crate::geometry::RectF;

/// Tolerance for deciding that the width correction left the scale
/// unchanged, so the height may be corrected instead.
pub const COVER_RATIO_EPSILON: f64 = 1e-14;

/// Centre focus.
pub const CENTER: (f64, f64) = (0.5, 0.5);

/// Source sub-rectangle selected by [`cover_crop`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Source crop that, drawn into a `dst_w × dst_h` rectangle, covers it
/// exactly. `focus` is clamped to `[0, 1]` on both axes.
pub fn cover_crop(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64, focus: (f64, f64)) -> CropRect {
    let offset_x = focus.0.clamp(0.0, 1.0);
    let offset_y = focus.1.clamp(0.0, 1.0);

    let r = (dst_w / src_w).min(dst_h / src_h);
    let mut nw = src_w * r;
    let mut nh = src_h * r;

    let mut ar = 1.0;
    if nw < dst_w {
        ar = dst_w / nw;
    }
    if (ar - 1.0).abs() < COVER_RATIO_EPSILON && nh < dst_h {
        ar = dst_h / nh;
    }
    nw *= ar;
    nh *= ar;

    let mut cw = src_w / (nw / dst_w);
    let mut ch = src_h / (nh / dst_h);
    let mut cx = (src_w - cw) * offset_x;
    let mut cy = (src_h - ch) * offset_y;

    if cx < 0.0 {
        cx = 0.0;
    }
    if cy < 0.0 {
        cy = 0.0;
    }
    if cw > src_w {
        cw = src_w;
    }
    if ch > src_h {
        ch = src_h;
    }

    CropRect {
        x: cx,
        y: cy,
        w: cw,
        h: ch,
    }
}

/// Draw `crop` of `src` into `dest` on `canvas`, overwriting every pixel
/// whose centre lies inside `dest`. Samples bilinearly.
pub fn draw_cover(canvas: &mut RgbaImage, src: &RgbaImage, crop: &CropRect, dest: &RectF) {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || dest.w <= 0.0 || dest.h <= 0.0 {
        return;
    }

    let (x0, y0, x1, y1) = dest.pixel_bounds(canvas.width(), canvas.height());
    let sx_step = crop.w / dest.w;
    let sy_step = crop.h / dest.h;

    for py in y0..y1 {
        let sy = crop.y + (py as f64 + 0.5 - dest.y) * sy_step;
        for px in x0..x1 {
            let sx = crop.x + (px as f64 + 0.5 - dest.x) * sx_step;
            canvas.put_pixel(px, py, sample_bilinear(src, sx, sy));
        }
    }
}

/// Cover-fit `src` into `dest` around the centre.
pub fn draw_image_prop(canvas: &mut RgbaImage, src: &RgbaImage, dest: &RectF) {
    let crop = cover_crop(
        src.width() as f64,
        src.height() as f64,
        dest.w,
        dest.h,
        CENTER,
    );
    draw_cover(canvas, src, &crop, dest);
}

/// Sample at continuous coordinates, pixel centres at `i + 0.5`, edges clamped.
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = src.dimensions();
    let fx = (x - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (y - 0.5).clamp(0.0, (h - 1) as f64);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 + (p10[c] as f64 - p00[c] as f64) * tx;
        let bottom = p01[c] as f64 + (p11[c] as f64 - p01[c] as f64) * tx;
        out[c] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_wide_source_into_square_crops_sides() {
        let crop = cover_crop(800.0, 600.0, 100.0, 100.0, CENTER);
        assert!(close(crop.w, 600.0));
        assert!(close(crop.h, 600.0));
        assert!(close(crop.x, 100.0));
        assert!(close(crop.y, 0.0));
    }

    #[test]
    fn test_tall_source_into_wide_slot_crops_top_and_bottom() {
        let crop = cover_crop(600.0, 800.0, 468.0, 351.0, CENTER);
        assert!(close(crop.w, 600.0));
        assert!(close(crop.h, 450.0));
        assert!(close(crop.y, 175.0));
    }

    #[test]
    fn test_matching_aspect_uses_whole_source() {
        let crop = cover_crop(800.0, 600.0, 468.0, 351.0, CENTER);
        assert!(close(crop.x, 0.0));
        assert!(close(crop.y, 0.0));
        assert!(close(crop.w, 800.0));
        assert!(close(crop.h, 600.0));
    }

    #[test]
    fn test_focus_is_clamped() {
        let left = cover_crop(800.0, 600.0, 100.0, 100.0, (-3.0, 0.5));
        assert!(close(left.x, 0.0));
        let right = cover_crop(800.0, 600.0, 100.0, 100.0, (7.0, 0.5));
        assert!(close(right.x, 200.0));
    }

    #[test]
    fn test_square_into_square_is_centered() {
        let crop = cover_crop(300.0, 300.0, 50.0, 50.0, CENTER);
        assert!(close(crop.x, 0.0));
        assert!(close(crop.w, 300.0));
    }

    #[test]
    fn test_draw_cover_fills_destination() {
        let src = RgbaImage::from_pixel(8, 2, Rgba([200, 10, 10, 255]));
        let mut canvas = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let dest = RectF::new(2.0, 3.0, 10.0, 10.0);
        draw_image_prop(&mut canvas, &src, &dest);

        for y in 0..20 {
            for x in 0..20 {
                let inside = (2..12).contains(&x) && (3..13).contains(&y);
                let expected = if inside { [200, 10, 10, 255] } else { [0, 0, 0, 255] };
                assert_eq!(canvas.get_pixel(x, y).0, expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_draw_cover_keeps_centre_of_wide_source() {
        // Left third red, middle third green, right third blue.
        let mut src = RgbaImage::new(30, 10);
        for (x, _, px) in src.enumerate_pixels_mut() {
            *px = match x / 10 {
                0 => Rgba([255, 0, 0, 255]),
                1 => Rgba([0, 255, 0, 255]),
                _ => Rgba([0, 0, 255, 255]),
            };
        }
        let mut canvas = RgbaImage::new(10, 10);
        draw_image_prop(&mut canvas, &src, &RectF::new(0.0, 0.0, 10.0, 10.0));
        assert!(canvas.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }
}
