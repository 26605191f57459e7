//! SnapBooth Data Model
//!
//! Defines the data contracts shared by the capture sequence and the
//! composite renderer:
//! - **Layouts:** slot count, grid shape and per-slot aspect ratio
//! - **Frames:** background fill, text and border colors
//! - **Filters:** ordered color-effect chains
//! - **Session:** the capture phase state and the captured frames
//! - **Edit:** style choices and photo order used for export
//!
//! Catalog entries are data-only; mapping ids to on-screen visuals is the
//! presentation layer's job.

pub mod color;
pub mod edit;
pub mod filter;
pub mod frame;
pub mod layout;
pub mod session;

pub use color::*;
pub use edit::*;
pub use filter::*;
pub use frame::*;
pub use layout::*;
pub use session::*;

/// A captured still image, straight (non-premultiplied) RGBA.
pub type Frame = image::RgbaImage;
