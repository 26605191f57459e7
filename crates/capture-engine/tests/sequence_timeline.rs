//! Capture sequence behavior under simulated time.

use std::sync::Arc;
use std::time::Duration;

use snapbooth_capture_engine::{
    numbered_frame, BoothEvent, ControllerOptions, ScriptedSource, SequenceController,
    SequenceTiming, StillSource,
};
use snapbooth_common::config::MissedShotPolicy;
use snapbooth_common::error::BoothError;
use snapbooth_model::{layout_by_id, CaptureConfig, Phase};
use tokio::sync::broadcast::Receiver;

fn config(layout: &str, countdown: u32) -> CaptureConfig {
    CaptureConfig::new(layout_by_id(layout).unwrap(), countdown).unwrap()
}

fn options() -> ControllerOptions {
    ControllerOptions {
        mirror: false,
        ..ControllerOptions::default()
    }
}

fn drain(rx: &mut Receiver<BoothEvent>) -> Vec<BoothEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_full_run_takes_expected_time() {
    let source = Arc::new(ScriptedSource::numbered(4));
    let mut controller = SequenceController::new(source.clone(), options());

    let started = tokio::time::Instant::now();
    controller.start_session(config("grid-4", 3)).await.unwrap();
    assert_eq!(controller.phase(), Phase::Capturing);

    let phase = controller.wait().await.unwrap();
    let elapsed = started.elapsed();

    // 800 + 4·3·1000 + 3·1500
    let expected = Duration::from_millis(17_300);
    assert_eq!(phase, Phase::Editing);
    assert!(elapsed >= expected, "finished early: {elapsed:?}");
    assert!(elapsed < expected + Duration::from_millis(50), "finished late: {elapsed:?}");
    assert_eq!(source.calls(), 4);

    let session = controller.session();
    let reds: Vec<u8> = session.frames().iter().map(|f| f.get_pixel(0, 0)[0]).collect();
    assert_eq!(reds, vec![0, 1, 2, 3]);
    assert_eq!(session.edit().unwrap().photo_order(), &[0, 1, 2, 3]);
    assert_eq!(session.edit().unwrap().layout().id, "grid-4");
}

#[tokio::test(start_paused = true)]
async fn test_every_slot_count_and_countdown_takes_expected_time() {
    let timing = SequenceTiming::default();

    for (layout, slots) in [("solo", 1u32), ("wide-3", 3), ("grid-4", 4), ("grid-6", 6)] {
        for countdown in [3u32, 5, 10] {
            let source = Arc::new(ScriptedSource::numbered(slots as usize));
            let mut controller = SequenceController::new(source.clone(), options());
            let mut rx = controller.subscribe();

            let started = tokio::time::Instant::now();
            controller
                .start_session(config(layout, countdown))
                .await
                .unwrap();
            let phase = controller.wait().await.unwrap();
            let elapsed = started.elapsed();

            assert_eq!(phase, Phase::Editing, "{layout} cd={countdown}");
            assert_eq!(
                elapsed,
                timing.expected_duration(slots, countdown),
                "{layout} cd={countdown}"
            );
            assert_eq!(source.calls(), slots as usize, "{layout} cd={countdown}");

            let shots = drain(&mut rx)
                .iter()
                .filter(|e| matches!(e, BoothEvent::ShotCaptured { .. }))
                .count();
            assert_eq!(shots, slots as usize, "{layout} cd={countdown}");
            assert_eq!(controller.session().frames().len(), slots as usize);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_countdown_events_in_order() {
    let source = Arc::new(ScriptedSource::numbered(3));
    let mut controller = SequenceController::new(source, options());
    let mut rx = controller.subscribe();

    let run = controller.start_session(config("strip-4", 3)).await;
    // strip-4 has four slots; only three frames are scripted.
    let run = run.unwrap();
    controller.wait().await.unwrap();
    // Let the last flash timer fire.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let events = drain(&mut rx);
    assert!(events.iter().all(|e| e.run() == run));
    assert_eq!(
        events.first(),
        Some(&BoothEvent::PhaseChanged {
            run,
            phase: Phase::Capturing
        })
    );

    let ticks: Vec<(u32, u32)> = events
        .iter()
        .filter_map(|e| match e {
            BoothEvent::CountdownTick { slot, remaining, .. } => Some((*slot, *remaining)),
            _ => None,
        })
        .collect();
    let expected: Vec<(u32, u32)> = (0..4)
        .flat_map(|slot| (1..=3).rev().map(move |r| (slot, r)))
        .collect();
    assert_eq!(ticks, expected);

    let flashes_on = events
        .iter()
        .filter(|e| matches!(e, BoothEvent::Flash { on: true, .. }))
        .count();
    let flashes_off = events
        .iter()
        .filter(|e| matches!(e, BoothEvent::Flash { on: false, .. }))
        .count();
    assert_eq!(flashes_on, 4);
    assert_eq!(flashes_off, 4);

    let captured: Vec<(u32, usize)> = events
        .iter()
        .filter_map(|e| match e {
            BoothEvent::ShotCaptured { slot, captured, .. } => Some((*slot, *captured)),
            _ => None,
        })
        .collect();
    assert_eq!(captured, vec![(0, 1), (1, 2), (2, 3)]);
    assert!(events.contains(&BoothEvent::ShotMissed { run, slot: 3 }));
    assert!(events.contains(&BoothEvent::PhaseChanged {
        run,
        phase: Phase::Editing
    }));
}

#[tokio::test(start_paused = true)]
async fn test_missed_shot_leaves_slot_empty_and_still_finishes() {
    let source = Arc::new(ScriptedSource::new(vec![
        Some(numbered_frame(10)),
        None,
        Some(numbered_frame(30)),
    ]));
    let mut controller = SequenceController::new(source, options());

    controller.start_session(config("wide-3", 3)).await.unwrap();
    assert_eq!(controller.wait().await.unwrap(), Phase::Editing);

    let session = controller.session();
    let reds: Vec<u8> = session.frames().iter().map(|f| f.get_pixel(0, 0)[0]).collect();
    assert_eq!(reds, vec![10, 30]);
    assert_eq!(session.edit().unwrap().photo_order(), &[0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_once_recovers_late_frame() {
    let source = Arc::new(ScriptedSource::new(vec![None, Some(numbered_frame(42))]));
    let mut controller = SequenceController::new(
        source.clone(),
        ControllerOptions {
            missed_shot: MissedShotPolicy::RetryOnce,
            ..options()
        },
    );

    let started = tokio::time::Instant::now();
    controller.start_session(config("solo", 3)).await.unwrap();
    controller.wait().await.unwrap();

    // 800 + 3000 + 300 retry delay
    assert!(started.elapsed() >= Duration::from_millis(4_100));
    assert_eq!(source.calls(), 2);
    assert_eq!(controller.session().frames().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_during_capture_discards_everything() {
    let source = Arc::new(ScriptedSource::numbered(8));
    let mut controller = SequenceController::new(source.clone(), options());
    let mut rx = controller.subscribe();

    let first = controller.start_session(config("grid-4", 3)).await.unwrap();

    // Past the first capture, inside the second countdown.
    tokio::time::sleep(Duration::from_millis(800 + 3_000 + 1_500 + 1_200)).await;
    assert_eq!(controller.progress(), (1, 4));

    controller.restart();
    assert_eq!(controller.phase(), Phase::Setup);
    assert!(controller.session().frames().is_empty());
    let calls_at_restart = source.calls();

    let before_restart = drain(&mut rx);
    assert!(before_restart.iter().any(|e| e.run() == first));

    // Long enough for the abandoned run to have finished several times over.
    tokio::time::sleep(Duration::from_secs(60)).await;

    let after_restart = drain(&mut rx);
    assert!(
        after_restart.iter().all(|e| e.run() != first),
        "stale events: {after_restart:?}"
    );
    assert_eq!(source.calls(), calls_at_restart);
    assert_eq!(controller.phase(), Phase::Setup);
    assert!(controller.session().frames().is_empty());
    assert!(!controller.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_new_session_after_restart_starts_clean() {
    let source = Arc::new(ScriptedSource::numbered(8));
    let mut controller = SequenceController::new(source, options());

    controller.start_session(config("grid-4", 3)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    controller.restart();

    let second = controller.start_session(config("solo", 3)).await.unwrap();
    assert_eq!(controller.wait().await.unwrap(), Phase::Editing);

    let session = controller.session();
    assert_eq!(session.run_id(), second);
    assert_eq!(session.frames().len(), 1);
    assert_eq!(session.target_slots(), 1);
}

#[tokio::test]
async fn test_unavailable_camera_blocks_start() {
    let mut controller =
        SequenceController::new(Arc::new(ScriptedSource::unavailable()), options());

    let err = controller
        .start_session(config("grid-4", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, BoothError::CameraUnavailable { .. }));
    assert_eq!(controller.phase(), Phase::Setup);
    assert!(!controller.is_running());
}

#[tokio::test]
async fn test_start_rejected_outside_setup() {
    let source = Arc::new(StillSource::new("still", numbered_frame(1)));
    let mut controller = SequenceController::new(
        source,
        ControllerOptions {
            timing: SequenceTiming::instant(),
            ..options()
        },
    );

    controller.start_session(config("solo", 3)).await.unwrap();
    assert_eq!(controller.wait().await.unwrap(), Phase::Editing);

    let err = controller
        .start_session(config("solo", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, BoothError::Sequence { .. }));
    assert_eq!(controller.phase(), Phase::Editing);

    controller.restart();
    assert!(controller.start_session(config("solo", 3)).await.is_ok());
}

#[tokio::test]
async fn test_mirror_flips_captured_frames() {
    let mut frame = image::RgbaImage::from_pixel(2, 1, image::Rgba([0, 0, 0, 255]));
    frame.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    let source = Arc::new(StillSource::new("still", frame));
    let mut controller = SequenceController::new(
        source,
        ControllerOptions {
            timing: SequenceTiming::instant(),
            mirror: true,
            ..ControllerOptions::default()
        },
    );

    controller.start_session(config("solo", 3)).await.unwrap();
    controller.wait().await.unwrap();

    let session = controller.session();
    let captured = &session.frames()[0];
    assert_eq!(captured.get_pixel(0, 0)[0], 0);
    assert_eq!(captured.get_pixel(1, 0)[0], 255);
}

#[tokio::test]
async fn test_wait_without_session_returns_setup() {
    let mut controller = SequenceController::new(
        Arc::new(StillSource::new("still", numbered_frame(0))),
        options(),
    );
    assert_eq!(controller.wait().await.unwrap(), Phase::Setup);
}
