//! Video sources.
//!
//! The capture loop only needs two things from a camera: a readiness check
//! before a session begins, and the most current frame at shutter time.
//! Stream acquisition, permissions and preview display stay behind this
//! trait.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use snapbooth_common::error::{BoothError, BoothResult};
use snapbooth_model::Frame;

/// File extensions picked up by [`ImageSequenceSource::from_dir`].
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// A live video source the sequence controller captures from.
#[async_trait::async_trait]
pub trait VideoSource: Send + Sync {
    /// Make sure the source can deliver frames. Fails with
    /// [`BoothError::CameraUnavailable`] when it cannot.
    async fn open(&self) -> BoothResult<()>;

    /// The most current frame, or `None` when the source is not ready.
    fn current_frame(&self) -> Option<Frame>;

    /// Human-readable source name for logs.
    fn name(&self) -> &str;
}

/// Decode an image file into a frame.
pub fn load_frame(path: &Path) -> BoothResult<Frame> {
    if !path.exists() {
        return Err(BoothError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let image = image::open(path)
        .map_err(|e| BoothError::image_decode(format!("{}: {e}", path.display())))?;
    Ok(image.to_rgba8())
}

/// A source that always shows the same still image.
pub struct StillSource {
    name: String,
    frame: Frame,
}

impl StillSource {
    pub fn new(name: impl Into<String>, frame: Frame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    pub fn from_path(path: &Path) -> BoothResult<Self> {
        Ok(Self::new(path.display().to_string(), load_frame(path)?))
    }
}

#[async_trait::async_trait]
impl VideoSource for StillSource {
    async fn open(&self) -> BoothResult<()> {
        Ok(())
    }

    fn current_frame(&self) -> Option<Frame> {
        Some(self.frame.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A source that steps through a list of images, one per capture, wrapping
/// around at the end.
pub struct ImageSequenceSource {
    name: String,
    frames: Vec<Frame>,
    cursor: AtomicUsize,
}

impl ImageSequenceSource {
    pub fn new(name: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            name: name.into(),
            frames,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Load every image in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> BoothResult<Self> {
        if !dir.is_dir() {
            return Err(BoothError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let frames = paths
            .iter()
            .map(|path| load_frame(path))
            .collect::<BoothResult<Vec<_>>>()?;
        tracing::debug!(dir = %dir.display(), count = frames.len(), "Loaded image sequence");

        Ok(Self::new(dir.display().to_string(), frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait::async_trait]
impl VideoSource for ImageSequenceSource {
    async fn open(&self) -> BoothResult<()> {
        if self.frames.is_empty() {
            return Err(BoothError::camera_unavailable(format!(
                "no images found in {}",
                self.name
            )));
        }
        Ok(())
    }

    fn current_frame(&self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % self.frames.len();
        self.frames.get(idx).cloned()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Synthetic camera: a test card whose marker moves with every capture so
/// that successive shots are distinguishable.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    captures: AtomicUsize,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(16),
            height: height.max(16),
            captures: AtomicUsize::new(0),
        }
    }

    /// Render the pattern for the `n`th capture.
    pub fn pattern(&self, n: usize) -> RgbaImage {
        let (width, height) = (self.width, self.height);
        let mut img = RgbaImage::from_pixel(width, height, Rgba([40, 40, 50, 255]));

        // Color bars along the bottom quarter
        let bars = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
            Rgba([255, 255, 0, 255]),
            Rgba([255, 0, 255, 255]),
            Rgba([0, 255, 255, 255]),
        ];
        let bar_width = (width / bars.len() as u32).max(1);
        let bar_top = height - height / 4;
        for (i, color) in bars.iter().enumerate() {
            draw_filled_rect_mut(
                &mut img,
                Rect::at((i as u32 * bar_width) as i32, bar_top as i32)
                    .of_size(bar_width, height - bar_top),
                *color,
            );
        }

        // Corner markers
        let radius = (width.min(height) / 24).max(2) as i32;
        let inset = radius + radius / 2;
        for (x, y) in [
            (inset, inset),
            (width as i32 - inset, inset),
            (inset, bar_top as i32 - inset),
            (width as i32 - inset, bar_top as i32 - inset),
        ] {
            draw_filled_circle_mut(&mut img, (x, y), radius, Rgba([255, 50, 50, 255]));
        }

        // Moving marker, one step to the right per capture
        let steps = 8;
        let travel = width as i32 - 4 * inset;
        let x = 2 * inset + travel * (n % steps) as i32 / (steps as i32 - 1);
        draw_filled_circle_mut(
            &mut img,
            (x, bar_top as i32 / 2),
            radius * 2,
            Rgba([50, 255, 50, 255]),
        );

        img
    }
}

#[async_trait::async_trait]
impl VideoSource for TestPatternSource {
    async fn open(&self) -> BoothResult<()> {
        Ok(())
    }

    fn current_frame(&self) -> Option<Frame> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        Some(self.pattern(n))
    }

    fn name(&self) -> &str {
        "test-pattern"
    }
}

/// A source that replays a fixed script of frames and misses, then reports
/// not-ready forever.
///
/// Public so integration tests and downstream crates can drive
/// [`SequenceController`](crate::SequenceController) deterministically. It
/// holds no real camera state and is not meant for production sessions.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Option<Frame>>>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Option<Frame>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// `count` solid frames whose red channel encodes their position.
    pub fn numbered(count: usize) -> Self {
        Self::new((0..count).map(|i| Some(numbered_frame(i))))
    }

    /// A source whose `open` fails.
    pub fn unavailable() -> Self {
        let source = Self::new(Vec::new());
        source.available.store(false, Ordering::SeqCst);
        source
    }

    /// Number of `current_frame` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A 4×3 frame filled with `Rgba([i, 0, 0, 255])`.
///
/// Test fixture paired with [`ScriptedSource`]; the red channel makes shot
/// order visible after capture.
pub fn numbered_frame(i: usize) -> Frame {
    RgbaImage::from_pixel(4, 3, Rgba([(i % 256) as u8, 0, 0, 255]))
}

#[async_trait::async_trait]
impl VideoSource for ScriptedSource {
    async fn open(&self) -> BoothResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BoothError::camera_unavailable("scripted source is offline"))
        }
    }

    fn current_frame(&self) -> Option<Frame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        script.pop_front().flatten()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
