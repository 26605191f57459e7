//! Composite geometry.
//!
//! All measurements are in export pixels. The header, footer and text sizes
//! are authored in preview points and multiplied by the render scale; the
//! outer padding and the slot gap are given directly in export pixels.

use serde::Serialize;
use snapbooth_common::error::{BoothError, BoothResult};
use snapbooth_model::{Color, LayoutDescriptor};

/// Brand label printed above the footer date.
pub const BRAND_LABEL: &str = "SNAP.BOOTH";

/// Fill drawn under every photo slot.
pub const PLACEHOLDER_COLOR: Color = Color::from_u24(0xf4f4f5);

/// Renderer dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderConfig {
    /// Export pixels per preview point.
    pub scale: f64,
    /// Outer padding, export pixels.
    pub padding: f64,
    /// Gap between slots, export pixels.
    pub gap: f64,
    /// Header band height, points.
    pub header_height: f64,
    /// Footer band height, points.
    pub footer_height: f64,
    /// Caption font size, points.
    pub caption_size: f64,
    /// Footer font size, points.
    pub footer_size: f64,
    /// Distance from the brand line's baseline to the date line's, points.
    pub footer_line_step: f64,
    /// Opacity of the footer text.
    pub footer_opacity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            padding: 24.0,
            gap: 16.0,
            header_height: 60.0,
            footer_height: 80.0,
            caption_size: 18.0,
            footer_size: 10.0,
            footer_line_step: 15.0,
            footer_opacity: 0.6,
        }
    }
}

impl RenderConfig {
    /// Padding and gap scaled along with everything else, so the export is
    /// an exact enlargement of the live preview.
    pub fn uniform() -> Self {
        let config = Self::default();
        Self {
            padding: config.padding * config.scale,
            gap: config.gap * config.scale,
            ..config
        }
    }

    pub fn validate(&self) -> BoothResult<()> {
        let values = [
            ("scale", self.scale),
            ("padding", self.padding),
            ("gap", self.gap),
            ("header_height", self.header_height),
            ("footer_height", self.footer_height),
            ("caption_size", self.caption_size),
            ("footer_size", self.footer_size),
            ("footer_line_step", self.footer_line_step),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(BoothError::render(format!("{name} must be >= 0, got {value}")));
            }
        }
        if self.scale <= 0.0 {
            return Err(BoothError::render("scale must be positive"));
        }
        Ok(())
    }
}

/// An axis-aligned rectangle in export pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RectF {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn intersects(&self, other: &RectF) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Pixel bounds `(x0, y0, x1, y1)`, edges rounded to the nearest pixel
    /// and clipped to a `width × height` canvas. Exclusive at the far edge.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clip = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;
        (
            clip(self.x, width),
            clip(self.y, height),
            clip(self.right(), width),
            clip(self.bottom(), height),
        )
    }
}

/// Canvas size and slot placement for one layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub padding: f64,
    pub gap: f64,
    pub header_height: f64,
    pub footer_height: f64,
    pub columns: u32,
    pub rows: u32,
    pub slot_count: u32,
    pub slot_width: f64,
    pub slot_height: f64,
}

impl CompositeGeometry {
    pub fn compute(layout: &LayoutDescriptor, config: &RenderConfig) -> BoothResult<Self> {
        config.validate()?;
        if layout.columns == 0 || layout.slot_count == 0 {
            return Err(BoothError::render(format!(
                "layout {} has no slots",
                layout.id
            )));
        }

        let scale = config.scale;
        let columns = layout.columns;
        let rows = layout.rows();
        let header_height = config.header_height * scale;
        let footer_height = config.footer_height * scale;

        let width = layout.family.base_width() as f64 * scale;
        let slot_width =
            (width - 2.0 * config.padding - (columns as f64 - 1.0) * config.gap) / columns as f64;
        if slot_width <= 0.0 {
            return Err(BoothError::render(format!(
                "layout {} leaves no room for slots at {width}px",
                layout.id
            )));
        }
        let slot_height = layout.aspect.height_for(slot_width);

        let content_height = rows as f64 * slot_height + (rows as f64 - 1.0) * config.gap;
        let height = config.padding + header_height + content_height + footer_height;

        Ok(Self {
            canvas_width: width as u32,
            canvas_height: height as u32,
            padding: config.padding,
            gap: config.gap,
            header_height,
            footer_height,
            columns,
            rows,
            slot_count: layout.slot_count,
            slot_width,
            slot_height,
        })
    }

    /// Grid cell of the slot at display position `idx`.
    pub fn cell(&self, idx: u32) -> (u32, u32) {
        (idx % self.columns, idx / self.columns)
    }

    /// Rectangle of the slot at display position `idx`.
    pub fn slot_rect(&self, idx: u32) -> RectF {
        let (col, row) = self.cell(idx);
        RectF::new(
            self.padding + col as f64 * (self.slot_width + self.gap),
            self.padding + self.header_height + row as f64 * (self.slot_height + self.gap),
            self.slot_width,
            self.slot_height,
        )
    }

    pub fn slot_rects(&self) -> Vec<RectF> {
        (0..self.slot_count).map(|idx| self.slot_rect(idx)).collect()
    }

    /// Baseline of the caption, centred vertically in the header band.
    pub fn caption_baseline(&self) -> f64 {
        self.padding + self.header_height / 2.0
    }

    /// Baseline of the last footer line.
    pub fn footer_baseline(&self) -> f64 {
        self.canvas_height as f64 - self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapbooth_model::{layout_by_id, LAYOUTS};

    fn geometry(id: &str) -> CompositeGeometry {
        CompositeGeometry::compute(&layout_by_id(id).unwrap(), &RenderConfig::default()).unwrap()
    }

    #[test]
    fn test_quad_grid_dimensions() {
        let g = geometry("grid-4");
        assert_eq!(g.canvas_width, 1000);
        assert_eq!(g.slot_width, 468.0);
        assert_eq!(g.slot_height, 351.0);
        // 24 + 120 + (2·351 + 16) + 160
        assert_eq!(g.canvas_height, 1022);
    }

    #[test]
    fn test_family_widths() {
        assert_eq!(geometry("strip-4").canvas_width, 600);
        assert_eq!(geometry("wide-3").canvas_width, 1000);
        assert_eq!(geometry("grid-6").canvas_width, 1000);
        assert_eq!(geometry("solo").canvas_width, 720);
    }

    #[test]
    fn test_slot_aspects() {
        let strip = geometry("strip-4");
        assert_eq!(strip.slot_width, 552.0);
        assert_eq!(strip.slot_height, 414.0);

        let wide = geometry("wide-3");
        assert_eq!(wide.slot_height, 952.0 * 9.0 / 16.0);

        let six = geometry("grid-6");
        assert_eq!(six.slot_width, six.slot_height);

        let solo = geometry("solo");
        assert_eq!(solo.slot_width, 672.0);
        assert!((solo.slot_height - 896.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_height_truncates() {
        // 24 + 120 + 3·535.5 + 2·16 + 160 = 1942.5
        assert_eq!(geometry("wide-3").canvas_height, 1942);
    }

    #[test]
    fn test_grid_cells() {
        let g = geometry("grid-4");
        assert_eq!(g.cell(0), (0, 0));
        assert_eq!(g.cell(1), (1, 0));
        assert_eq!(g.cell(2), (0, 1));
        assert_eq!(g.cell(3), (1, 1));

        let first = g.slot_rect(0);
        assert_eq!((first.x, first.y), (24.0, 144.0));
        let last = g.slot_rect(3);
        assert_eq!((last.x, last.y), (24.0 + 484.0, 144.0 + 367.0));
    }

    #[test]
    fn test_uniform_config_matches_preview_proportions() {
        let layout = layout_by_id("grid-4").unwrap();
        let g = CompositeGeometry::compute(&layout, &RenderConfig::uniform()).unwrap();
        assert_eq!(g.padding, 48.0);
        assert_eq!(g.gap, 32.0);
        assert_eq!(g.slot_width, 436.0);
    }

    #[test]
    fn test_slots_fit_inside_canvas() {
        for layout in LAYOUTS {
            let g = CompositeGeometry::compute(&layout, &RenderConfig::default()).unwrap();
            for rect in g.slot_rects() {
                assert!(rect.right() <= g.canvas_width as f64 - g.padding + 1e-9);
                assert!(rect.bottom() + g.footer_height <= g.canvas_height as f64 + 1.0);
            }
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        let layout = layout_by_id("grid-4").unwrap();
        let config = RenderConfig {
            padding: 600.0,
            ..RenderConfig::default()
        };
        assert!(CompositeGeometry::compute(&layout, &config).is_err());

        let config = RenderConfig {
            scale: 0.0,
            ..RenderConfig::default()
        };
        assert!(CompositeGeometry::compute(&layout, &config).is_err());
    }

    #[test]
    fn test_pixel_bounds_are_clipped() {
        let rect = RectF::new(-3.4, 10.5, 20.0, 100.0);
        assert_eq!(rect.pixel_bounds(12, 50), (0, 11, 12, 50));
    }
}
