pub mod catalog;
pub mod check;
pub mod compose;
pub mod shoot;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use snapbooth_common::config::AppConfig;
use snapbooth_model::{filter_by_name, frame_by_id, ColorFilter, EditState, Frame};
use snapbooth_render_engine::text::FontSet;
use snapbooth_render_engine::{
    export_composite, CompositeRenderer, ExportJob, ExportProgress, ProgressCallback,
    RenderConfig,
};

use crate::StyleArgs;

/// A catalog filter by name, or a custom chain in CSS filter syntax.
pub fn resolve_filter(value: &str) -> anyhow::Result<ColorFilter> {
    if value.contains('(') {
        return ColorFilter::parse("Custom", value)
            .map_err(|e| anyhow::anyhow!("Invalid filter chain: {e}"));
    }
    filter_by_name(value).map_err(|e| anyhow::anyhow!("{e}"))
}

/// Apply the command-line style flags on top of `edit`.
pub fn apply_style(edit: &mut EditState, style: &StyleArgs) -> anyhow::Result<()> {
    if let Some(frame) = &style.frame {
        edit.set_frame(frame_by_id(frame)?);
    }
    if let Some(filter) = &style.filter {
        edit.set_filter(resolve_filter(filter)?);
    }
    if let Some(brightness) = style.brightness {
        edit.set_brightness(brightness)?;
    }
    if let Some(caption) = &style.caption {
        edit.set_caption(caption.as_str())?;
    }
    Ok(())
}

/// Render, encode and write the composite, printing progress.
pub async fn export(
    config: &AppConfig,
    frames: Vec<Frame>,
    edit: EditState,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let output_dir = output.unwrap_or_else(|| config.export_dir.clone());
    let renderer = Arc::new(CompositeRenderer::new(
        RenderConfig::default(),
        FontSet::load(&config.render),
    ));

    println!(
        "  Layout: {}  Frame: {}  Filter: {}  Brightness: {}%",
        edit.layout().id,
        edit.frame().id,
        edit.filter().name,
        edit.brightness()
    );

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        print!("\r  Export: {:>3.0}% ({:?})      ", p.progress * 100.0, p.stage);
        let _ = std::io::stdout().flush();
    });

    let job = ExportJob::new(output_dir);
    match export_composite(renderer, frames, edit, job, Some(progress_cb)).await {
        Ok(path) => {
            println!("\nSaved: {}", path.display());
            Ok(path)
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapbooth_model::{layout_by_id, FilterEffect};

    fn style() -> StyleArgs {
        StyleArgs {
            frame: None,
            filter: None,
            brightness: None,
            caption: None,
            output: None,
        }
    }

    fn edit() -> EditState {
        EditState::new(
            layout_by_id("grid-4").unwrap(),
            frame_by_id("white").unwrap(),
            ColorFilter::normal(),
            4,
        )
    }

    #[test]
    fn test_resolve_catalog_and_custom_filters() {
        assert_eq!(resolve_filter("vintage").unwrap().name, "Vintage");
        let custom = resolve_filter("sepia(30%) contrast(110%)").unwrap();
        assert_eq!(custom.name, "Custom");
        assert_eq!(custom.chain.len(), 2);
        assert!(matches!(custom.chain[0], FilterEffect::Sepia(_)));
        assert!(resolve_filter("Infrared").is_err());
        assert!(resolve_filter("blur(3px)").is_err());
    }

    #[test]
    fn test_apply_style_overrides_only_given_flags() {
        let mut state = edit();
        apply_style(&mut state, &style()).unwrap();
        assert_eq!(state, edit());

        let mut state = edit();
        let flags = StyleArgs {
            frame: Some("pink".to_string()),
            brightness: Some(120),
            caption: Some("Party".to_string()),
            ..style()
        };
        apply_style(&mut state, &flags).unwrap();
        assert_eq!(state.frame().id, "pink");
        assert_eq!(state.brightness(), 120);
        assert_eq!(state.caption(), "Party");
        assert_eq!(state.filter().name, "Normal");
    }

    #[test]
    fn test_apply_style_rejects_out_of_range() {
        let mut state = edit();
        let flags = StyleArgs {
            brightness: Some(200),
            ..style()
        };
        assert!(apply_style(&mut state, &flags).is_err());

        let flags = StyleArgs {
            caption: Some("x".repeat(26)),
            ..style()
        };
        assert!(apply_style(&mut state, &flags).is_err());
    }
}
