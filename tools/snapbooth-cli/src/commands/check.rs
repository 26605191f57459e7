//! Check fonts and configuration.

use snapbooth_capture_engine::ControllerOptions;
use snapbooth_common::config::{config_file_path, AppConfig};
use snapbooth_model::{layout_by_id, CaptureConfig};
use snapbooth_render_engine::text::FontSet;

pub fn run(config: &AppConfig, write_config: bool) -> anyhow::Result<()> {
    println!("SnapBooth System Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config: {}", path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", path.display());
    }
    println!("     Export directory: {}", config.export_dir.display());
    if write_config {
        config
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        println!("     Wrote {}", path.display());
    }

    let mut ready = true;

    match layout_by_id(&config.capture.layout)
        .and_then(|layout| CaptureConfig::new(layout, config.capture.countdown_secs))
    {
        Ok(capture) => println!(
            "[OK] Capture defaults: {} with {}s countdown",
            capture.layout.id, capture.countdown_secs
        ),
        Err(e) => {
            ready = false;
            println!("[FAIL] Capture defaults: {e}");
        }
    }

    match ControllerOptions::from_config(config) {
        Ok(options) => println!(
            "[OK] Style defaults: frame {}, filter {}, brightness {}%",
            options.style.frame.id, options.style.filter.name, options.style.brightness
        ),
        Err(e) => {
            ready = false;
            println!("[FAIL] Style defaults: {e}");
        }
    }

    let fonts = FontSet::load(&config.render);
    match (fonts.regular_path(), fonts.bold_path()) {
        (None, None) => {
            println!("[WARN] Fonts: none found; composites will have no caption or footer");
            println!("       Set render.font_path in the config to a TTF/OTF file");
        }
        (regular, bold) => {
            println!("[OK] Fonts:");
            let show = |p: Option<&std::path::Path>| {
                p.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(falls back to the other face)".to_string())
            };
            println!("     regular: {}", show(regular));
            println!("     bold:    {}", show(bold));
        }
    }

    println!();
    if ready {
        println!("SnapBooth is ready.");
    } else {
        println!("Some defaults are invalid. Fix the config file listed above.");
    }

    Ok(())
}
