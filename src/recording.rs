//! Replay of recorded tracker output through the measurement pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::db::{ClientInfo, NewMeasurement};
use crate::core::sink::MeasurementSink;
use crate::detection::preprocessing::to_scratch;
use crate::detection::scale::DepthFrame;
use crate::models::{HandLandmarks, RingSizeResult};
use crate::pipeline::{FrameInput, FrameOutcome, MeasurementPipeline, MeasurementSession};

#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<RecordedFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedFrame {
    pub timestamp: f64,
    #[serde(default)]
    pub landmarks: Option<HandLandmarks>,
    /// Relative to the recording file
    pub image: PathBuf,
    #[serde(default)]
    pub depth: Option<RecordedDepth>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedDepth {
    pub meters: Option<f32>,
    pub focal_px: Option<f32>,
}

/// Parsed recording plus the directory its image paths are relative to
pub fn load_recording(path: &Path) -> anyhow::Result<(Recording, PathBuf)> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    let recording: Recording = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse recording {}", path.display()))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((recording, base_dir))
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub frames: usize,
    pub skipped: usize,
    pub result: Option<RingSizeResult>,
}

/// Feed every frame to `pipeline` until a result completes. One `open`
/// record is submitted up front and one `success` record when a result lands.
pub fn replay<S: MeasurementSink + ?Sized>(
    pipeline: &MeasurementPipeline,
    session: &mut MeasurementSession,
    recording: &Recording,
    base_dir: &Path,
    sink: &S,
    client: &ClientInfo,
) -> anyhow::Result<ReplaySummary> {
    sink.submit(NewMeasurement::open(session, client));

    let mut summary = ReplaySummary::default();
    for frame in &recording.frames {
        match &frame.depth {
            Some(depth) => session.on_depth_frame(DepthFrame::uniform(depth.meters, depth.focal_px)),
            None => session.clear_depth(),
        }

        let image_path = base_dir.join(&frame.image);
        let img = image::open(&image_path)
            .with_context(|| format!("Failed to open frame image {:?}", image_path))?;
        let scratch = to_scratch(&img);
        if scratch.dimensions() != (recording.width, recording.height) {
            debug!(
                "Frame {:?} is {:?}, recording declares {}x{}",
                image_path,
                scratch.dimensions(),
                recording.width,
                recording.height
            );
        }

        let input = FrameInput {
            landmarks: frame.landmarks.as_ref(),
            timestamp: frame.timestamp,
            width: scratch.width(),
            height: scratch.height(),
            pixels: &scratch,
        };
        summary.frames += 1;
        match pipeline.process_frame(session, &input) {
            FrameOutcome::Completed(result) => {
                info!("Result after {} frames", summary.frames);
                sink.submit(NewMeasurement::success(session, client, &result));
                summary.result = Some(result);
                break;
            }
            FrameOutcome::Skipped(reason) => {
                debug!("t={:.3}s skipped: {:?}", frame.timestamp, reason);
                summary.skipped += 1;
            }
            outcome => debug!("t={:.3}s {:?}", frame.timestamp, outcome),
        }
    }
    Ok(summary)
}
