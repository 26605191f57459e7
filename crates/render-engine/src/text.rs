//! Text drawing.
//!
//! Text is rasterized onto a transparent layer filled with the text color
//! at zero alpha, so glyph coverage lands in the alpha channel only, and the
//! layer is then blended onto the canvas at the requested opacity.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::Serialize;
use snapbooth_common::config::RenderSettings;
use snapbooth_common::error::{BoothError, BoothResult};
use snapbooth_model::Color;

use crate::blend::blend_layer;

/// Monospace regular faces tried when no font is configured.
const REGULAR_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
    "/Library/Fonts/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Monospace bold faces tried when no bold font is configured.
const BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMonoBold.ttf",
    "/Library/Fonts/Courier New Bold.ttf",
    "C:\\Windows\\Fonts\\consolab.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Regular,
    Bold,
}

/// One line of text to draw, positioned by its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPlacement {
    pub text: String,
    /// Anchor x in export pixels.
    pub x: f64,
    pub baseline: f64,
    /// Em size in export pixels.
    pub size: f64,
    pub anchor: TextAnchor,
    pub weight: FontWeight,
    pub opacity: f32,
}

struct LoadedFont {
    font: FontVec,
    path: PathBuf,
}

/// Regular and bold faces. Either may be missing; bold falls back to
/// regular, and with no face at all text is skipped.
#[derive(Default)]
pub struct FontSet {
    regular: Option<LoadedFont>,
    bold: Option<LoadedFont>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular_path())
            .field("bold", &self.bold_path())
            .finish()
    }
}

impl FontSet {
    /// No fonts; renders without text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load explicit font files. Every given path must load.
    pub fn from_paths(regular: Option<&Path>, bold: Option<&Path>) -> BoothResult<Self> {
        Ok(Self {
            regular: regular.map(load_font).transpose()?,
            bold: bold.map(load_font).transpose()?,
        })
    }

    /// Search the usual system locations for monospace faces.
    pub fn discover() -> Self {
        Self {
            regular: first_loadable(REGULAR_CANDIDATES),
            bold: first_loadable(BOLD_CANDIDATES),
        }
    }

    /// Configured fonts where given, discovered ones otherwise. Unloadable
    /// configured fonts are reported and replaced by discovery.
    pub fn load(settings: &RenderSettings) -> Self {
        let configured = |path: &Option<PathBuf>| {
            path.as_deref().and_then(|p| match load_font(p) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "Configured font unusable");
                    None
                }
            })
        };

        let regular = configured(&settings.font_path).or_else(|| first_loadable(REGULAR_CANDIDATES));
        let bold = configured(&settings.bold_font_path).or_else(|| first_loadable(BOLD_CANDIDATES));
        let fonts = Self { regular, bold };

        if fonts.is_empty() {
            tracing::warn!("No usable monospace font found; composites will have no text");
        } else {
            tracing::debug!(
                regular = ?fonts.regular_path(),
                bold = ?fonts.bold_path(),
                "Fonts loaded"
            );
        }
        fonts
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_none() && self.bold.is_none()
    }

    pub fn regular_path(&self) -> Option<&Path> {
        self.regular.as_ref().map(|f| f.path.as_path())
    }

    pub fn bold_path(&self) -> Option<&Path> {
        self.bold.as_ref().map(|f| f.path.as_path())
    }

    /// Face for `weight`, falling back to whichever face is loaded.
    pub fn face(&self, weight: FontWeight) -> Option<&FontVec> {
        let (preferred, fallback) = match weight {
            FontWeight::Regular => (&self.regular, &self.bold),
            FontWeight::Bold => (&self.bold, &self.regular),
        };
        preferred.as_ref().or(fallback.as_ref()).map(|f| &f.font)
    }
}

fn load_font(path: &Path) -> BoothResult<LoadedFont> {
    if !path.exists() {
        return Err(BoothError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|e| BoothError::render(format!("invalid font {}: {e}", path.display())))?;
    Ok(LoadedFont {
        font,
        path: path.to_path_buf(),
    })
}

fn first_loadable(candidates: &[&str]) -> Option<LoadedFont> {
    candidates
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(|p| load_font(p).ok())
}

/// Glyph scale for an em size in pixels.
fn px_scale(font: &FontVec, em_px: f64) -> PxScale {
    let em_px = em_px as f32;
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(em_px * font.height_unscaled() / units),
        _ => PxScale::from(em_px),
    }
}

/// Measured width of `text` in pixels.
pub fn measure(font: &FontVec, em_px: f64, text: &str) -> u32 {
    text_size(px_scale(font, em_px), font, text).0
}

/// Draw `placement` onto `canvas` in `color`. Returns `false` when there is
/// nothing to draw or no font to draw it with.
pub fn draw_text(
    canvas: &mut RgbaImage,
    placement: &TextPlacement,
    fonts: &FontSet,
    color: Color,
) -> bool {
    if placement.text.is_empty() {
        return false;
    }
    let Some(font) = fonts.face(placement.weight) else {
        tracing::debug!(text = %placement.text, "Skipping text, no font");
        return false;
    };

    let scale = px_scale(font, placement.size);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let descent = scaled.descent();

    let width = measure(font, placement.size, &placement.text);
    if width == 0 {
        return false;
    }

    let pad = (placement.size / 4.0).ceil().max(1.0) as u32;
    let layer_width = width + 2 * pad;
    let layer_height = (ascent - descent).ceil().max(1.0) as u32 + 2 * pad;
    let mut layer = RgbaImage::from_pixel(
        layer_width,
        layer_height,
        Rgba([color.r, color.g, color.b, 0]),
    );
    draw_text_mut(
        &mut layer,
        Rgba([color.r, color.g, color.b, 255]),
        pad as i32,
        pad as i32,
        scale,
        font,
        &placement.text,
    );

    let left = match placement.anchor {
        TextAnchor::Left => placement.x,
        TextAnchor::Center => placement.x - width as f64 / 2.0,
        TextAnchor::Right => placement.x - width as f64,
    };
    let top = placement.baseline - ascent as f64;

    // The layer carries the text color; only its alpha is scaled.
    let opacity = placement.opacity * color.a as f32 / 255.0;
    blend_layer(
        canvas,
        &layer,
        left.round() as i64 - i64::from(pad),
        top.round() as i64 - i64::from(pad),
        opacity,
    );
    true
}
