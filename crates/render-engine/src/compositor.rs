//! Composite renderer.
//!
//! Draw order, back to front:
//! 1. background fill, then the diagonal gradient when the frame has one;
//! 2. the caption, upper-cased and centred in the header band;
//! 3. every slot: placeholder fill, then the cover-fit photo, each passed
//!    through the filter pipeline and blended source-over;
//! 4. the footer lines, unfiltered, at reduced opacity.
//!
//! Given identical inputs the output is identical; the only varying parts
//! of an export come in through the [`FooterStamp`].

use image::{Rgba, RgbaImage};
use snapbooth_common::clock::FooterStamp;
use snapbooth_common::error::{BoothError, BoothResult};
use snapbooth_model::{Color, ColorFilter, EditState, Frame, FrameStyle, LayoutDescriptor};

use crate::blend::blend_layer;
use crate::cover::{cover_crop, draw_cover, CENTER};
use crate::fx::FilterPipeline;
use crate::geometry::{CompositeGeometry, RectF, RenderConfig, BRAND_LABEL, PLACEHOLDER_COLOR};
use crate::text::{draw_text, FontSet, FontWeight, TextAnchor, TextPlacement};

/// Everything a render reads, borrowed.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Frames in display order.
    pub frames: &'a [&'a Frame],
    pub layout: &'a LayoutDescriptor,
    pub frame_style: &'a FrameStyle,
    pub filter: &'a ColorFilter,
    /// Percent.
    pub brightness: u32,
    pub caption: &'a str,
    pub stamp: &'a FooterStamp,
}

/// Renders composites with a fixed configuration and font set.
#[derive(Debug, Default)]
pub struct CompositeRenderer {
    config: RenderConfig,
    fonts: FontSet,
}

impl CompositeRenderer {
    pub fn new(config: RenderConfig, fonts: FontSet) -> Self {
        Self { config, fonts }
    }

    /// A renderer that draws no text.
    pub fn without_text(config: RenderConfig) -> Self {
        Self::new(config, FontSet::empty())
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn geometry(&self, layout: &LayoutDescriptor) -> BoothResult<CompositeGeometry> {
        CompositeGeometry::compute(layout, &self.config)
    }

    /// Render `frames`, captured in capture order, with the layout, style
    /// and photo order of `edit`.
    pub fn render(
        &self,
        frames: &[Frame],
        edit: &EditState,
        stamp: &FooterStamp,
    ) -> BoothResult<RgbaImage> {
        let ordered = edit.ordered(frames)?;
        self.render_request(&RenderRequest {
            frames: &ordered,
            layout: edit.layout(),
            frame_style: edit.frame(),
            filter: edit.filter(),
            brightness: edit.brightness(),
            caption: edit.caption(),
            stamp,
        })
    }

    pub fn render_request(&self, request: &RenderRequest<'_>) -> BoothResult<RgbaImage> {
        let geometry = self.geometry(request.layout)?;
        let (width, height) = (geometry.canvas_width, geometry.canvas_height);
        if width == 0 || height == 0 {
            return Err(BoothError::render(format!(
                "layout {} produced an empty canvas",
                request.layout.id
            )));
        }
        if let Some((idx, _)) = request
            .frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.width() == 0 || f.height() == 0)
        {
            return Err(BoothError::render(format!("frame {idx} is empty")));
        }

        tracing::debug!(
            layout = request.layout.id,
            frame = request.frame_style.id,
            filter = %request.filter.name,
            brightness = request.brightness,
            width,
            height,
            frames = request.frames.len(),
            "Rendering composite"
        );

        let mut canvas = paint_background(width, height, request.frame_style);
        let placements = plan_text(&geometry, &self.config, request.caption, request.stamp);
        let style_text = request.frame_style.text;

        // Header
        for placement in placements.iter().filter(|p| p.weight == FontWeight::Bold) {
            draw_text(&mut canvas, placement, &self.fonts, style_text);
        }

        // Photos
        let pipeline = FilterPipeline::for_edit(request.filter, request.brightness);
        if request.frames.len() > geometry.slot_count as usize {
            tracing::debug!(
                frames = request.frames.len(),
                slots = geometry.slot_count,
                "Ignoring frames beyond the layout's slots"
            );
        }
        for idx in 0..geometry.slot_count {
            let rect = geometry.slot_rect(idx);
            fill_slot(&mut canvas, &rect, PLACEHOLDER_COLOR, &pipeline);
            if let Some(frame) = request.frames.get(idx as usize) {
                draw_slot(&mut canvas, &rect, frame, &pipeline);
            }
        }

        // Footer
        for placement in placements.iter().filter(|p| p.weight == FontWeight::Regular) {
            draw_text(&mut canvas, placement, &self.fonts, style_text);
        }

        Ok(canvas)
    }
}

/// Where each line of text goes.
pub fn plan_text(
    geometry: &CompositeGeometry,
    config: &RenderConfig,
    caption: &str,
    stamp: &FooterStamp,
) -> Vec<TextPlacement> {
    let mut placements = Vec::with_capacity(4);

    if !caption.is_empty() {
        placements.push(TextPlacement {
            text: caption.to_uppercase(),
            x: geometry.canvas_width as f64 / 2.0,
            baseline: geometry.caption_baseline(),
            size: config.caption_size * config.scale,
            anchor: TextAnchor::Center,
            weight: FontWeight::Bold,
            opacity: 1.0,
        });
    }

    let footer = |text: &str, x: f64, baseline: f64, anchor: TextAnchor| TextPlacement {
        text: text.to_string(),
        x,
        baseline,
        size: config.footer_size * config.scale,
        anchor,
        weight: FontWeight::Regular,
        opacity: config.footer_opacity,
    };
    let left = geometry.padding;
    let right = geometry.canvas_width as f64 - geometry.padding;
    let bottom = geometry.footer_baseline();

    placements.push(footer(
        BRAND_LABEL,
        left,
        bottom - config.footer_line_step * config.scale,
        TextAnchor::Left,
    ));
    placements.push(footer(&stamp.date_time, left, bottom, TextAnchor::Left));
    placements.push(footer(&stamp.session_id, right, bottom, TextAnchor::Right));
    placements
}

/// Solid fill, overpainted by the frame's gradient when it has one.
fn paint_background(width: u32, height: u32, style: &FrameStyle) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, style.fill.to_rgba());
    let Some(gradient) = style.gradient else {
        return canvas;
    };

    // Gradient axis from (0, 0) to (width, height).
    let (dx, dy) = (width as f64, height as f64);
    let len_sq = dx * dx + dy * dy;
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        let t = ((x as f64 + 0.5) * dx + (y as f64 + 0.5) * dy) / len_sq;
        let color = Color::lerp(&gradient.from, &gradient.to, t);
        *px = color.to_rgba();
    }
    canvas
}

fn fill_slot(canvas: &mut RgbaImage, rect: &RectF, color: Color, pipeline: &FilterPipeline) {
    let (x0, y0, x1, y1) = rect.pixel_bounds(canvas.width(), canvas.height());
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    let filtered = pipeline.apply_pixel(color.to_rgba());
    let layer = RgbaImage::from_pixel(x1 - x0, y1 - y0, filtered);
    blend_layer(canvas, &layer, i64::from(x0), i64::from(y0), 1.0);
}

fn draw_slot(canvas: &mut RgbaImage, rect: &RectF, frame: &Frame, pipeline: &FilterPipeline) {
    let (x0, y0, x1, y1) = rect.pixel_bounds(canvas.width(), canvas.height());
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    // Render the slot on its own layer so the filter sees only the photo.
    let local = RectF::new(rect.x - x0 as f64, rect.y - y0 as f64, rect.w, rect.h);
    let mut layer = RgbaImage::from_pixel(x1 - x0, y1 - y0, Rgba([0, 0, 0, 0]));
    let crop = cover_crop(
        frame.width() as f64,
        frame.height() as f64,
        rect.w,
        rect.h,
        CENTER,
    );
    draw_cover(&mut layer, frame, &crop, &local);
    pipeline.apply(&mut layer);
    blend_layer(canvas, &layer, i64::from(x0), i64::from(y0), 1.0);
}
