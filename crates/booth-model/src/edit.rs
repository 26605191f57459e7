//! Edit state: the style choices and photo order applied at export.

use serde::Serialize;
use snapbooth_common::error::{BoothError, BoothResult};

use crate::filter::ColorFilter;
use crate::frame::FrameStyle;
use crate::layout::LayoutDescriptor;

/// Lowest accepted brightness, in percent.
pub const MIN_BRIGHTNESS: u32 = 50;
/// Highest accepted brightness, in percent.
pub const MAX_BRIGHTNESS: u32 = 150;
/// Longest accepted caption, in characters.
pub const MAX_CAPTION_CHARS: usize = 25;

/// Style and ordering state for the editing phase.
///
/// Mutated by user interaction and read, never written, by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditState {
    layout: LayoutDescriptor,
    frame: FrameStyle,
    filter: ColorFilter,
    brightness: u32,
    caption: String,
    photo_order: Vec<usize>,
}

impl EditState {
    /// Create edit state for `frame_count` captured frames in capture order.
    pub fn new(
        layout: LayoutDescriptor,
        frame: FrameStyle,
        filter: ColorFilter,
        frame_count: usize,
    ) -> Self {
        Self {
            layout,
            frame,
            filter,
            brightness: 100,
            caption: String::new(),
            photo_order: (0..frame_count).collect(),
        }
    }

    pub fn layout(&self) -> &LayoutDescriptor {
        &self.layout
    }

    pub fn frame(&self) -> &FrameStyle {
        &self.frame
    }

    pub fn filter(&self) -> &ColorFilter {
        &self.filter
    }

    /// Brightness in percent.
    pub fn brightness(&self) -> u32 {
        self.brightness
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Capture indices in display order.
    pub fn photo_order(&self) -> &[usize] {
        &self.photo_order
    }

    pub fn set_layout(&mut self, layout: LayoutDescriptor) {
        self.layout = layout;
    }

    pub fn set_frame(&mut self, frame: FrameStyle) {
        self.frame = frame;
    }

    pub fn set_filter(&mut self, filter: ColorFilter) {
        self.filter = filter;
    }

    /// Set brightness in percent, within `[50, 150]`.
    pub fn set_brightness(&mut self, percent: u32) -> BoothResult<()> {
        if !(MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&percent) {
            return Err(BoothError::validation(format!(
                "brightness {percent}% outside [{MIN_BRIGHTNESS}, {MAX_BRIGHTNESS}]"
            )));
        }
        self.brightness = percent;
        Ok(())
    }

    /// Set the caption, at most 25 characters.
    pub fn set_caption(&mut self, caption: impl Into<String>) -> BoothResult<()> {
        let caption = caption.into();
        let chars = caption.chars().count();
        if chars > MAX_CAPTION_CHARS {
            return Err(BoothError::validation(format!(
                "caption has {chars} characters, at most {MAX_CAPTION_CHARS} allowed"
            )));
        }
        self.caption = caption;
        Ok(())
    }

    /// Swap the photos shown at display positions `a` and `b`.
    pub fn swap(&mut self, a: usize, b: usize) -> BoothResult<()> {
        let len = self.photo_order.len();
        if a >= len || b >= len {
            return Err(BoothError::validation(format!(
                "cannot swap positions {a} and {b} of {len} photos"
            )));
        }
        self.photo_order.swap(a, b);
        Ok(())
    }

    /// Borrow `frames` in display order.
    pub fn ordered<'a, T>(&self, frames: &'a [T]) -> BoothResult<Vec<&'a T>> {
        self.photo_order
            .iter()
            .map(|&idx| {
                frames.get(idx).ok_or_else(|| {
                    BoothError::validation(format!(
                        "photo order refers to frame {idx} but only {} were captured",
                        frames.len()
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_by_name;
    use crate::frame::frame_by_id;
    use crate::layout::layout_by_id;

    fn edit_state(frames: usize) -> EditState {
        EditState::new(
            layout_by_id("grid-4").unwrap(),
            frame_by_id("white").unwrap(),
            ColorFilter::normal(),
            frames,
        )
    }

    #[test]
    fn test_initial_order_is_identity() {
        let edit = edit_state(4);
        assert_eq!(edit.photo_order(), &[0, 1, 2, 3]);
        assert_eq!(edit.brightness(), 100);
        assert_eq!(edit.caption(), "");
    }

    #[test]
    fn test_brightness_bounds() {
        let mut edit = edit_state(1);
        assert!(edit.set_brightness(50).is_ok());
        assert!(edit.set_brightness(150).is_ok());
        assert!(edit.set_brightness(49).is_err());
        assert!(edit.set_brightness(151).is_err());
        assert_eq!(edit.brightness(), 150);
    }

    #[test]
    fn test_caption_limit_counts_characters() {
        let mut edit = edit_state(1);
        assert!(edit.set_caption("a".repeat(25)).is_ok());
        assert!(edit.set_caption("a".repeat(26)).is_err());
        // 25 multi-byte characters still fit.
        assert!(edit.set_caption("é".repeat(25)).is_ok());
    }

    #[test]
    fn test_swap_and_ordered() {
        let mut edit = edit_state(3);
        edit.swap(0, 2).unwrap();
        let frames = ["a", "b", "c"];
        let ordered: Vec<&str> = edit.ordered(&frames).unwrap().into_iter().copied().collect();
        assert_eq!(ordered, vec!["c", "b", "a"]);
        assert!(edit.swap(0, 3).is_err());
    }

    #[test]
    fn test_ordered_rejects_stale_order() {
        let edit = edit_state(4);
        let frames = ["only", "two"];
        assert!(edit.ordered(&frames).is_err());
    }

    #[test]
    fn test_style_setters() {
        let mut edit = edit_state(2);
        edit.set_layout(layout_by_id("strip-4").unwrap());
        edit.set_frame(frame_by_id("gradient").unwrap());
        edit.set_filter(filter_by_name("Sepia").unwrap());
        assert_eq!(edit.layout().id, "strip-4");
        assert_eq!(edit.frame().id, "gradient");
        assert_eq!(edit.filter().name, "Sepia");
    }
}
