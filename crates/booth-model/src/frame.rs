//! Frame styles: the composite's background, text and border colors.

use serde::Serialize;
use snapbooth_common::error::{BoothError, BoothResult};

use crate::color::Color;

/// A two-stop linear gradient running from the top-left corner to the
/// bottom-right corner of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagonalGradient {
    pub from: Color,
    pub to: Color,
}

/// Immutable catalog entry describing a frame style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameStyle {
    pub id: &'static str,

    /// Solid background color.
    pub fill: Color,

    /// Painted over `fill` when present.
    pub gradient: Option<DiagonalGradient>,

    /// Caption and footer text color.
    pub text: Color,

    /// Border color, only drawn by the live preview.
    pub border: Color,
}

/// The frame style catalog.
pub const FRAMES: [FrameStyle; 6] = [
    FrameStyle {
        id: "white",
        fill: Color::from_u24(0xffffff),
        gradient: None,
        text: Color::from_u24(0x000000),
        border: Color::from_u24(0xe4e4e7),
    },
    FrameStyle {
        id: "black",
        fill: Color::from_u24(0x000000),
        gradient: None,
        text: Color::from_u24(0xffffff),
        border: Color::from_u24(0x27272a),
    },
    FrameStyle {
        id: "cream",
        fill: Color::from_u24(0xf5f5dc),
        gradient: None,
        text: Color::from_u24(0x5c4033),
        border: Color::from_u24(0xe8e8c8),
    },
    FrameStyle {
        id: "pink",
        fill: Color::from_u24(0xfbcfe8),
        gradient: None,
        text: Color::from_u24(0x831843),
        border: Color::from_u24(0xf9a8d4),
    },
    FrameStyle {
        id: "blue",
        fill: Color::from_u24(0xbfdbfe),
        gradient: None,
        text: Color::from_u24(0x1e3a8a),
        border: Color::from_u24(0x93c5fd),
    },
    FrameStyle {
        id: "gradient",
        fill: Color::from_u24(0x8b5cf6),
        gradient: Some(DiagonalGradient {
            from: Color::from_u24(0x8b5cf6),
            to: Color::from_u24(0xd946ef),
        }),
        text: Color::from_u24(0xffffff),
        // rgba(255, 255, 255, 0.2)
        border: Color::rgba(0xff, 0xff, 0xff, 51),
    },
];

/// Frame style used when nothing else is selected.
pub const DEFAULT_FRAME_ID: &str = "white";

/// Look up a frame style by id.
pub fn frame_by_id(id: &str) -> BoothResult<FrameStyle> {
    FRAMES
        .iter()
        .find(|frame| frame.id == id)
        .copied()
        .ok_or_else(|| {
            let known: Vec<&str> = FRAMES.iter().map(|f| f.id).collect();
            BoothError::validation(format!(
                "unknown frame {id:?} (expected one of: {})",
                known.join(", ")
            ))
        })
}
