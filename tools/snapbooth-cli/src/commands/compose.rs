//! Composite images that were captured elsewhere.

use std::path::PathBuf;

use snapbooth_common::config::AppConfig;
use snapbooth_model::{filter_by_name, frame_by_id, layout_by_id, EditState};
use snapbooth_render_engine::decode_frames;

use crate::StyleArgs;

pub async fn run(
    config: &AppConfig,
    images: Vec<PathBuf>,
    layout: Option<String>,
    style: StyleArgs,
) -> anyhow::Result<()> {
    let layout = layout_by_id(layout.as_deref().unwrap_or(&config.capture.layout))?;
    println!("Composing {} image(s) into {}", images.len(), layout.name);

    let frames = decode_frames(images)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load images: {e}"))?;
    if frames.len() > layout.slot_count as usize {
        println!(
            "  Note: {} only has {} slots; extra images are left out",
            layout.id, layout.slot_count
        );
    }

    let mut edit = EditState::new(
        layout,
        frame_by_id(&config.style.frame)?,
        filter_by_name(&config.style.filter)?,
        frames.len(),
    );
    edit.set_brightness(config.style.brightness)?;
    super::apply_style(&mut edit, &style)?;

    super::export(config, frames, edit, style.output.clone()).await?;
    Ok(())
}
