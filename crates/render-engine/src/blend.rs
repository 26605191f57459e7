//! Source-over compositing in 8-bit integer arithmetic.
//!
//! Canvases and layers hold straight-alpha RGBA; blending converts to
//! premultiplied form, composites, and converts back.

use image::{Rgba, RgbaImage};

pub type PremulRgba8 = [u8; 4];

pub fn premultiply(px: Rgba<u8>) -> PremulRgba8 {
    let [r, g, b, a] = px.0;
    let a16 = u16::from(a);
    [
        mul_div255(u16::from(r), a16),
        mul_div255(u16::from(g), a16),
        mul_div255(u16::from(b), a16),
        a,
    ]
}

pub fn unpremultiply(px: PremulRgba8) -> Rgba<u8> {
    let a = px[3];
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    if a == 255 {
        return Rgba(px);
    }
    let un = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
    Rgba([un(px[0]), un(px[1]), un(px[2]), a])
}

/// `src` over `dst`, with `src` further scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Blend one straight-alpha pixel onto another.
pub fn over_pixel(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    if src[3] == 255 && opacity >= 1.0 {
        return src;
    }
    unpremultiply(over(premultiply(dst), premultiply(src), opacity))
}

/// Composite `layer` onto `canvas` with its top-left corner at `(x, y)`.
/// Parts of the layer outside the canvas are dropped.
pub fn blend_layer(canvas: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    for (lx, ly, src) in layer.enumerate_pixels() {
        if src[3] == 0 {
            continue;
        }
        let cx = x + i64::from(lx);
        let cy = y + i64::from(ly);
        if cx < 0 || cy < 0 || cx >= cw || cy >= ch {
            continue;
        }
        let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
        *dst = over_pixel(*dst, *src, opacity);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
