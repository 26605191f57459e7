//! Color filter pipeline.
//!
//! Each filter function is a color matrix (or an alpha multiplier) from the
//! CSS Filter Effects definitions, applied in chain order to straight-alpha
//! sRGB values with clamping after every step.

use image::{Rgba, RgbaImage};
use snapbooth_model::{ColorFilter, FilterEffect};

/// 3×3 RGB matrix plus a constant added to every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorMatrix {
    m: [[f32; 3]; 3],
    offset: f32,
}

impl ColorMatrix {
    fn scale(k: f32) -> Self {
        Self {
            m: [[k, 0.0, 0.0], [0.0, k, 0.0], [0.0, 0.0, k]],
            offset: 0.0,
        }
    }

    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (row, value) in self.m.iter().zip(out.iter_mut()) {
            let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + self.offset;
            *value = v.clamp(0.0, 1.0);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Color(ColorMatrix),
    Alpha(f32),
}

fn grayscale(amount: f32) -> ColorMatrix {
    let a = 1.0 - amount.clamp(0.0, 1.0);
    ColorMatrix {
        m: [
            [0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a],
            [0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a],
            [0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a],
        ],
        offset: 0.0,
    }
}

fn sepia(amount: f32) -> ColorMatrix {
    let a = 1.0 - amount.clamp(0.0, 1.0);
    ColorMatrix {
        m: [
            [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
            [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
            [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
        ],
        offset: 0.0,
    }
}

fn saturate(amount: f32) -> ColorMatrix {
    let s = amount.max(0.0);
    ColorMatrix {
        m: [
            [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
        ],
        offset: 0.0,
    }
}

fn hue_rotate(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    ColorMatrix {
        m: [
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ],
        offset: 0.0,
    }
}

fn contrast(amount: f32) -> ColorMatrix {
    let c = amount.max(0.0);
    ColorMatrix {
        offset: 0.5 - 0.5 * c,
        ..ColorMatrix::scale(c)
    }
}

fn stage(effect: &FilterEffect) -> Stage {
    match *effect {
        FilterEffect::Grayscale(v) => Stage::Color(grayscale(v)),
        FilterEffect::Sepia(v) => Stage::Color(sepia(v)),
        FilterEffect::HueRotate(v) => Stage::Color(hue_rotate(v)),
        FilterEffect::Brightness(v) => Stage::Color(ColorMatrix::scale(v.max(0.0))),
        FilterEffect::Saturate(v) => Stage::Color(saturate(v)),
        FilterEffect::Contrast(v) => Stage::Color(contrast(v)),
        FilterEffect::Opacity(v) => Stage::Alpha(v.clamp(0.0, 1.0)),
    }
}

/// A compiled filter chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl FilterPipeline {
    /// Compile `effects`, dropping no-op steps.
    pub fn new<'a>(effects: impl IntoIterator<Item = &'a FilterEffect>) -> Self {
        Self {
            stages: effects
                .into_iter()
                .filter(|e| !e.is_identity())
                .map(stage)
                .collect(),
        }
    }

    /// The catalog filter followed by `brightness(percent%)`.
    pub fn for_edit(filter: &ColorFilter, brightness_percent: u32) -> Self {
        let brightness = FilterEffect::Brightness(brightness_percent as f32 / 100.0);
        Self::new(filter.chain.iter().chain(std::iter::once(&brightness)))
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply_pixel(&self, pixel: Rgba<u8>) -> Rgba<u8> {
        if self.stages.is_empty() || pixel[3] == 0 {
            return pixel;
        }

        let mut rgb = [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        ];
        let mut alpha = pixel[3] as f32 / 255.0;
        for stage in &self.stages {
            match stage {
                Stage::Color(matrix) => rgb = matrix.apply(rgb),
                Stage::Alpha(k) => alpha = (alpha * k).clamp(0.0, 1.0),
            }
        }

        let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), to_u8(alpha)])
    }

    /// Filter every pixel of `image` in place.
    pub fn apply(&self, image: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        for pixel in image.pixels_mut() {
            *pixel = self.apply_pixel(*pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapbooth_model::filter_by_name;

    fn px(r: u8, g: u8, b: u8) -> Rgba<u8> {
        Rgba([r, g, b, 255])
    }

    #[test]
    fn test_normal_at_full_brightness_is_identity() {
        let pipeline = FilterPipeline::for_edit(&ColorFilter::normal(), 100);
        assert!(pipeline.is_identity());
        assert_eq!(pipeline.apply_pixel(px(12, 34, 56)), px(12, 34, 56));
    }

    #[test]
    fn test_brightness_scales_channels() {
        let pipeline = FilterPipeline::for_edit(&ColorFilter::normal(), 50);
        assert_eq!(pipeline.apply_pixel(px(200, 100, 0)), px(100, 50, 0));

        let pipeline = FilterPipeline::for_edit(&ColorFilter::normal(), 150);
        assert_eq!(pipeline.apply_pixel(px(200, 100, 0)), px(255, 150, 0));
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let pipeline = FilterPipeline::new(&[FilterEffect::Grayscale(1.0)]);
        let out = pipeline.apply_pixel(px(255, 0, 0));
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
        // 0.2126 · 255
        assert_eq!(out[0], 54);
    }

    #[test]
    fn test_black_and_white_is_gray() {
        let pipeline = FilterPipeline::for_edit(&filter_by_name("B&W").unwrap(), 100);
        let out = pipeline.apply_pixel(px(10, 200, 90));
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn test_sepia_white_is_warm() {
        let pipeline = FilterPipeline::new(&[FilterEffect::Sepia(1.0)]);
        let out = pipeline.apply_pixel(px(255, 255, 255));
        // Rows sum to 1.351, 1.203, 0.937.
        assert_eq!(out, px(255, 255, 239));
    }

    #[test]
    fn test_contrast_pivots_on_mid_gray() {
        // 1.5·v − 63.75
        let pipeline = FilterPipeline::new(&[FilterEffect::Contrast(1.5)]);
        assert_eq!(pipeline.apply_pixel(px(100, 40, 200)), px(86, 0, 236));
    }

    #[test]
    fn test_hue_rotate_full_turn_is_identity() {
        let pipeline = FilterPipeline::new(&[FilterEffect::HueRotate(360.0)]);
        let out = pipeline.apply_pixel(px(200, 40, 90));
        for (a, b) in out.0.iter().zip([200u8, 40, 90, 255]) {
            assert!((*a as i32 - b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_hue_rotate_zero_is_dropped() {
        assert!(FilterPipeline::new(&[FilterEffect::HueRotate(0.0)]).is_identity());
    }

    #[test]
    fn test_opacity_only_touches_alpha() {
        let pipeline = FilterPipeline::new(&[FilterEffect::Opacity(0.8)]);
        assert_eq!(pipeline.apply_pixel(px(1, 2, 3)), Rgba([1, 2, 3, 204]));
    }

    #[test]
    fn test_saturate_zero_is_luminance() {
        let pipeline = FilterPipeline::new(&[FilterEffect::Saturate(0.0)]);
        let out = pipeline.apply_pixel(px(0, 255, 0));
        assert_eq!(out, px(182, 182, 182));
    }

    #[test]
    fn test_transparent_pixels_untouched() {
        let pipeline = FilterPipeline::new(&[FilterEffect::Sepia(1.0)]);
        assert_eq!(pipeline.apply_pixel(Rgba([9, 9, 9, 0])), Rgba([9, 9, 9, 0]));
    }

    #[test]
    fn test_every_catalog_filter_changes_gray() {
        for filter in snapbooth_model::filters().iter().skip(1) {
            let pipeline = FilterPipeline::for_edit(filter, 100);
            assert!(!pipeline.is_identity(), "{} compiled to identity", filter.name);
        }
    }

    #[test]
    fn test_apply_image() {
        let mut image = RgbaImage::from_pixel(3, 2, px(100, 100, 100));
        FilterPipeline::for_edit(&ColorFilter::normal(), 50).apply(&mut image);
        assert!(image.pixels().all(|p| *p == px(50, 50, 50)));
    }
}
