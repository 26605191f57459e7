//! SnapBooth Capture Engine
//!
//! Drives a live video source through the timed capture sequence:
//! settle, then per shot a countdown, a shutter flash and a capture,
//! with a pause between shots.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              SequenceController              │
//! │  ┌──────────────┐        ┌────────────────┐  │
//! │  │ Capture loop │──grab─▶│  VideoSource   │  │
//! │  │ (tokio task) │        │ (camera, dir,  │  │
//! │  └──────┬───────┘        │  test pattern) │  │
//! │         │ run-id gated   └────────────────┘  │
//! │         ▼                                    │
//! │  ┌──────────────────┐   ┌─────────────────┐  │
//! │  │  CaptureSession  │   │ BoothEvent bus  │  │
//! │  │  frames, phase   │   │ ticks, flashes  │  │
//! │  └──────────────────┘   └─────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod sequence;
pub mod source;

pub use sequence::*;
pub use source::*;
