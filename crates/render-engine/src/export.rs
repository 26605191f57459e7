//! Export: decode inputs, render, encode PNG, write the file.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use snapbooth_common::clock::{export_file_name, FooterStamp};
use snapbooth_common::error::{BoothError, BoothResult};
use snapbooth_model::{EditState, Frame};

use crate::compositor::CompositeRenderer;

/// An export ready to run.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Directory the composite is written to.
    pub output_dir: PathBuf,

    /// File name inside `output_dir`.
    pub file_name: String,

    /// Footer text for this export.
    pub stamp: FooterStamp,
}

impl ExportJob {
    /// A job stamped with the current time and a fresh session id.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::at(output_dir, Local::now())
    }

    pub fn at(output_dir: impl Into<PathBuf>, time: DateTime<Local>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_name: export_file_name(&time),
            stamp: FooterStamp::at(time),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// Progress callback for exports.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Preparing,
    Rendering,
    Encoding,
    Writing,
    Complete,
    Failed,
}

impl ExportStage {
    fn progress(self) -> f64 {
        match self {
            ExportStage::Preparing => 0.0,
            ExportStage::Rendering => 0.1,
            ExportStage::Encoding => 0.7,
            ExportStage::Writing => 0.9,
            ExportStage::Complete => 1.0,
            ExportStage::Failed => 0.0,
        }
    }
}

fn report(progress: &Option<ProgressCallback>, stage: ExportStage) {
    if let Some(cb) = progress {
        cb(ExportProgress {
            progress: stage.progress(),
            stage,
        });
    }
}

/// Decode one encoded image.
pub fn decode_frame_bytes(bytes: &[u8]) -> BoothResult<Frame> {
    let image =
        image::load_from_memory(bytes).map_err(|e| BoothError::image_decode(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Decode all of `paths` in parallel. Either every frame decodes, in input
/// order, or the whole batch fails with the first error.
pub async fn decode_frames(paths: Vec<PathBuf>) -> BoothResult<Vec<Frame>> {
    let tasks: Vec<_> = paths
        .into_iter()
        .map(|path| {
            tokio::task::spawn_blocking(move || {
                if !path.exists() {
                    return Err(BoothError::FileNotFound { path });
                }
                let bytes = std::fs::read(&path)?;
                decode_frame_bytes(&bytes).map_err(|e| {
                    BoothError::image_decode(format!("{}: {e}", path.display()))
                })
            })
        })
        .collect();

    let mut frames = Vec::with_capacity(tasks.len());
    let mut first_error = None;
    for task in tasks {
        let result = task
            .await
            .map_err(|e| BoothError::image_decode(format!("decode task failed: {e}")))
            .and_then(|r| r);
        match result {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            tracing::debug!(count = frames.len(), "Decoded frames");
            Ok(frames)
        }
    }
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbaImage) -> BoothResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| BoothError::export(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// Write `bytes` to `path` through a temporary sibling so that a failed
/// write leaves nothing behind.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> BoothResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| BoothError::export(format!("{} has no parent directory", path.display())))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BoothError::export(format!("{} has no file name", path.display())))?;
    std::fs::create_dir_all(dir)
        .map_err(|e| BoothError::export(format!("cannot create {}: {e}", dir.display())))?;

    let partial = dir.join(format!(".{name}.partial"));
    let result = std::fs::write(&partial, bytes).and_then(|()| std::fs::rename(&partial, path));
    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(BoothError::export(format!(
            "cannot write {}: {e}",
            path.display()
        )));
    }
    Ok(())
}

/// Render `frames` with `edit`, encode and write the composite.
///
/// The inputs are owned copies; whatever happens here, the caller's session
/// is left as it was and the export can be retried.
pub async fn export_composite(
    renderer: Arc<CompositeRenderer>,
    frames: Vec<Frame>,
    edit: EditState,
    job: ExportJob,
    progress: Option<ProgressCallback>,
) -> BoothResult<PathBuf> {
    let output_path = job.output_path();
    tracing::info!(
        output = %output_path.display(),
        layout = edit.layout().id,
        frames = frames.len(),
        "Starting export"
    );
    report(&progress, ExportStage::Preparing);

    let result = run_export(renderer, frames, edit, job, &output_path, &progress).await;
    match &result {
        Ok(()) => {
            report(&progress, ExportStage::Complete);
            tracing::info!(output = %output_path.display(), "Export complete");
        }
        Err(e) => {
            report(&progress, ExportStage::Failed);
            tracing::warn!(error = %e, "Export failed");
        }
    }
    result.map(|()| output_path)
}

async fn run_export(
    renderer: Arc<CompositeRenderer>,
    frames: Vec<Frame>,
    edit: EditState,
    job: ExportJob,
    output_path: &Path,
    progress: &Option<ProgressCallback>,
) -> BoothResult<()> {
    report(progress, ExportStage::Rendering);
    let stamp = job.stamp;
    let composite = tokio::task::spawn_blocking(move || renderer.render(&frames, &edit, &stamp))
        .await
        .map_err(|e| BoothError::render(format!("render task failed: {e}")))??;
    let (width, height) = composite.dimensions();

    report(progress, ExportStage::Encoding);
    let bytes = tokio::task::spawn_blocking(move || encode_png(&composite))
        .await
        .map_err(|e| BoothError::export(format!("encode task failed: {e}")))??;
    tracing::debug!(width, height, bytes = bytes.len(), "Composite encoded");

    report(progress, ExportStage::Writing);
    let path = output_path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
        .await
        .map_err(|e| BoothError::export(format!("write task failed: {e}")))?
}
