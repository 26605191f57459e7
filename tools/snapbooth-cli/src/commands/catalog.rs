//! List the built-in catalogs.

use serde::Serialize;
use snapbooth_model::{filters, ColorFilter, FrameStyle, LayoutDescriptor, FRAMES, LAYOUTS};

#[derive(Serialize)]
struct Catalog {
    layouts: Vec<LayoutDescriptor>,
    frames: Vec<FrameStyle>,
    filters: Vec<ColorFilter>,
}

pub fn run(json: bool) -> anyhow::Result<()> {
    if json {
        let catalog = Catalog {
            layouts: LAYOUTS.to_vec(),
            frames: FRAMES.to_vec(),
            filters: filters(),
        };
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("Layouts");
    println!("{}", "=".repeat(50));
    for layout in LAYOUTS {
        let (w, h) = layout.aspect.ratio();
        println!(
            "  {:<8} {:<16} {} slot(s), {} column(s), {w}:{h}, {:?}",
            layout.id,
            layout.name,
            layout.slot_count,
            layout.columns,
            layout.family
        );
    }

    println!();
    println!("Frames");
    println!("{}", "=".repeat(50));
    for frame in FRAMES {
        let background = match frame.gradient {
            Some(g) => format!("{} -> {}", g.from.to_hex(), g.to.to_hex()),
            None => frame.fill.to_hex(),
        };
        println!(
            "  {:<8} background {:<20} text {}",
            frame.id,
            background,
            frame.text.to_hex()
        );
    }

    println!();
    println!("Filters");
    println!("{}", "=".repeat(50));
    for filter in filters() {
        println!("  {:<8} {}", filter.name, filter.css());
    }

    Ok(())
}
