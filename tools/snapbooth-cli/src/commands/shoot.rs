//! Run a timed capture sequence, then export the composite.

use std::path::Path;
use std::sync::Arc;

use snapbooth_capture_engine::{
    BoothEvent, ControllerOptions, ImageSequenceSource, SequenceController, SequenceTiming,
    StillSource, TestPatternSource, VideoSource,
};
use snapbooth_common::config::{AppConfig, MissedShotPolicy};
use snapbooth_model::{layout_by_id, CaptureConfig, Phase};
use tokio::sync::broadcast;

use crate::StyleArgs;

/// Synthetic camera resolution.
const PATTERN_SIZE: (u32, u32) = (640, 480);

pub struct ShootOptions {
    pub source: String,
    pub layout: Option<String>,
    pub countdown: Option<u32>,
    pub instant: bool,
    pub mirror: bool,
    pub retry_missed: bool,
    pub style: StyleArgs,
}

fn open_source(source: &str) -> anyhow::Result<Arc<dyn VideoSource>> {
    if source.eq_ignore_ascii_case("pattern") {
        return Ok(Arc::new(TestPatternSource::new(PATTERN_SIZE.0, PATTERN_SIZE.1)));
    }
    let path = Path::new(source);
    if path.is_dir() {
        Ok(Arc::new(ImageSequenceSource::from_dir(path)?))
    } else {
        Ok(Arc::new(StillSource::from_path(path)?))
    }
}

pub async fn run(config: &AppConfig, opts: ShootOptions) -> anyhow::Result<()> {
    let source = open_source(&opts.source)?;

    let mut options = ControllerOptions::from_config(config)?;
    options.mirror = opts.mirror && config.capture.mirror;
    if opts.instant {
        options.timing = SequenceTiming::instant();
    }
    if opts.retry_missed {
        options.missed_shot = MissedShotPolicy::RetryOnce;
    }

    let layout = layout_by_id(opts.layout.as_deref().unwrap_or(&config.capture.layout))?;
    let countdown = opts.countdown.unwrap_or(config.capture.countdown_secs);
    let capture = CaptureConfig::new(layout, countdown)?;

    println!("Shooting with {} ({})", source.name(), layout.name);
    println!(
        "  {} shots, {countdown}s countdown, about {:.1}s total",
        layout.slot_count,
        options
            .timing
            .expected_duration(layout.slot_count, countdown)
            .as_secs_f64()
    );

    let mut controller = SequenceController::new(source, options);
    let printer = tokio::spawn(print_events(controller.subscribe()));

    controller.start_session(capture).await?;
    let cancelled = tokio::select! {
        result = controller.wait() => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if cancelled {
        controller.restart();
        printer.abort();
        println!("\nCancelled; nothing was saved.");
        return Ok(());
    }
    if controller.phase() != Phase::Editing {
        printer.abort();
        anyhow::bail!("Sequence stopped in {:?}", controller.phase());
    }
    let _ = printer.await;

    let (frames, mut edit) = {
        let session = controller.session();
        let edit = session
            .edit()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Sequence ended without photos to edit"))?;
        (session.frames().to_vec(), edit)
    };
    if frames.is_empty() {
        anyhow::bail!("No shots were captured");
    }

    super::apply_style(&mut edit, &opts.style)?;
    super::export(config, frames, edit, opts.style.output.clone()).await?;
    Ok(())
}

/// Print sequence events until editing starts or the channel closes.
async fn print_events(mut events: broadcast::Receiver<BoothEvent>) {
    loop {
        match events.recv().await {
            Ok(BoothEvent::PhaseChanged { phase, .. }) => {
                println!("[{phase:?}]");
                if phase == Phase::Editing {
                    break;
                }
            }
            Ok(BoothEvent::CountdownTick { slot, remaining, .. }) => {
                println!("  Shot {}: {remaining}...", slot + 1);
            }
            Ok(BoothEvent::Flash { on: true, .. }) => println!("  * flash *"),
            Ok(BoothEvent::Flash { on: false, .. }) => {}
            Ok(BoothEvent::ShotCaptured {
                captured, target, ..
            }) => {
                println!("  Captured {captured}/{target}");
            }
            Ok(BoothEvent::ShotMissed { slot, .. }) => {
                println!("  Shot {} missed: camera had no frame", slot + 1);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
