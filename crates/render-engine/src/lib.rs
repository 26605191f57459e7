//! SnapBooth Render Engine
//!
//! Turns the captured frames and the edit state of a session into one
//! high-resolution composite image and writes it to disk.
//!
//! # Pipeline
//!
//! ```text
//! layout ──────▶ CompositeGeometry (canvas size, slot rects)
//!                        │
//! frame style ───────────┼── background (solid / diagonal gradient)
//!                        │
//! caption ───────────────┼── header text
//!                        │
//! frames + order ────────┼── per slot: placeholder, cover-fit draw,
//! filter + brightness ───┘   FilterPipeline, source-over blend
//!                        │
//! FooterStamp ───────────┴── footer text (unfiltered, 60% opacity)
//!                        │
//!                        ▼
//!                  PNG  snapbooth-<millis>.png
//! ```

pub mod blend;
pub mod compositor;
pub mod cover;
pub mod export;
pub mod fx;
pub mod geometry;
pub mod text;

pub use compositor::*;
pub use export::*;
pub use geometry::*;
