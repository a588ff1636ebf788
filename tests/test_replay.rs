//! End-to-end replay of a recorded session from disk.

mod common;

use std::path::Path;

use ringsizer::recording::{load_recording, replay};
use serde_json::json;

use common::*;

fn landmarks_json(hand: &ringsizer::HandLandmarks) -> serde_json::Value {
    serde_json::to_value(hand).expect("landmarks serialize")
}

fn write_recording(dir: &Path, frames: usize, depth: Option<(f32, f32)>) -> std::path::PathBuf {
    std::fs::create_dir_all(dir.join("frames")).unwrap();
    band_image(20).save(dir.join("frames/band.png")).unwrap();

    let hand = landmarks_json(&synthetic_hand(RING_CHAIN));
    let mut entries = vec![json!({
        "timestamp": 0.0,
        "landmarks": null,
        "image": "frames/band.png",
    })];
    for i in 1..=frames {
        let depth = depth.map(|(m, f)| json!({ "meters": m, "focalPx": f }));
        entries.push(json!({
            "timestamp": i as f64 * 0.5,
            "landmarks": hand.clone(),
            "image": "frames/band.png",
            "depth": depth,
        }));
    }

    let path = dir.join("session.json");
    let recording = json!({ "width": FRAME_SIZE, "height": FRAME_SIZE, "frames": entries });
    std::fs::write(&path, serde_json::to_string_pretty(&recording).unwrap()).unwrap();
    path
}

#[test]
fn test_replay_submits_open_and_success() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_recording(dir.path(), 8, None);
    let (recording, base_dir) = load_recording(&path)?;
    assert_eq!(recording.frames.len(), 9);

    let pipeline = MeasurementPipeline::new(MeasurementConfig::default());
    let mut session = MeasurementSession::new();
    session.select_finger(Finger::Ring);
    let sink = MemorySink::default();
    let client = ClientInfo {
        client_id: "acme".into(),
        device_model: None,
    };

    let summary = replay(&pipeline, &mut session, &recording, &base_dir, &sink, &client)?;
    // Frame 0 has no hand, frames 1..=5 complete the measurement
    assert_eq!(summary.frames, 6);
    assert_eq!(summary.skipped, 0);
    let result = summary.result.expect("measurement should complete");
    assert_eq!(result.size_eu, Some(63));

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event_type, EventType::Open);
    assert_eq!(records[1].event_type, EventType::Success);
    assert_eq!(records[1].size_eu, Some(63));
    assert_eq!(records[1].session_duration_seconds, Some(2.5));
    Ok(())
}

#[test]
fn test_replay_with_far_depth_never_completes() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_recording(dir.path(), 6, Some((1.4, 600.0)));
    let (recording, base_dir) = load_recording(&path)?;

    let pipeline = MeasurementPipeline::new(MeasurementConfig::default());
    let mut session = MeasurementSession::new();
    session.select_finger(Finger::Ring);
    let sink = MemorySink::default();

    let summary = replay(
        &pipeline,
        &mut session,
        &recording,
        &base_dir,
        &sink,
        &ClientInfo::default(),
    )?;
    assert!(summary.result.is_none());
    assert_eq!(summary.skipped, 6);
    assert_eq!(sink.records.lock().unwrap().len(), 1);
    Ok(())
}

#[test]
fn test_missing_frame_image_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_recording(dir.path(), 1, None);
    std::fs::remove_file(dir.path().join("frames/band.png"))?;
    let (recording, base_dir) = load_recording(&path)?;

    let pipeline = MeasurementPipeline::new(MeasurementConfig::default());
    let mut session = MeasurementSession::new();
    let result = replay(
        &pipeline,
        &mut session,
        &recording,
        &base_dir,
        &MemorySink::default(),
        &ClientInfo::default(),
    );
    assert!(result.is_err());
    Ok(())
}
