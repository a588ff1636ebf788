//! Per-frame measurement state machine.
//!
//! The tracker pushes one [`FrameInput`] per detected frame. The pipeline is
//! stateless apart from its configuration; every piece of mutable state lives
//! in the [`MeasurementSession`] passed into [`MeasurementPipeline::process_frame`].

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MeasurementConfig;
use crate::detection::edges::estimate_thickness;
use crate::detection::frame::{build_frame, hand_guidance, HandGuidance};
use crate::detection::overlay::save_overlay;
use crate::detection::preprocessing::PixelSource;
use crate::detection::scale::{
    crude_thickness_px, resolve_scale, DepthFrame, DepthSource, ScaleOutcome, ThicknessSource,
};
use crate::detection::sizing::ring_size;
use crate::detection::stability::{StabilityFilter, StabilityUpdate};
use crate::models::{Confidence, DetectionMode, Finger, HandLandmarks, MeasurementFrame, RingSizeResult, ThicknessSample};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// One tracker callback: landmarks (if a hand was seen) and the frame they
/// were detected on.
pub struct FrameInput<'a> {
    pub landmarks: Option<&'a HandLandmarks>,
    /// Seconds, monotonic within a session
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a dyn PixelSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SkipReason {
    /// MCP and PIP collapse onto each other
    DegenerateFrame,
    /// Depth present but outside the accepted range (meters)
    DepthOutOfRange(f32),
    /// No usable pixel-to-millimeter reference
    ScaleUnavailable,
    /// Depth is live but the edge search failed
    EdgesRequired,
    /// Per-frame diameter outside the plausible finger range
    ImplausibleDiameter(f32),
    /// Stabilized diameter has no ring size
    OutOfSizeRange(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FrameOutcome {
    /// A result was already emitted; nothing was sampled
    Frozen,
    NoHand,
    NoFinger,
    Skipped(SkipReason),
    Accumulating {
        diameter_mm: f32,
        buffered: usize,
        mode: DetectionMode,
    },
    Completed(RingSizeResult),
}

/// Explicit state of one measuring session.
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    id: Uuid,
    finger: Option<Finger>,
    frozen: bool,
    /// Filter together with the detection mode it was configured for
    filter: Option<(DetectionMode, StabilityFilter)>,
    /// Lowest confidence among the samples of the current run
    run_confidence: Option<Confidence>,
    depth: Option<DepthFrame>,
    attempts: u32,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    guidance: Option<HandGuidance>,
    results: Vec<RingSizeResult>,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            finger: None,
            frozen: false,
            filter: None,
            run_confidence: None,
            depth: None,
            attempts: 0,
            first_timestamp: None,
            last_timestamp: None,
            guidance: None,
            results: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn finger(&self) -> Option<Finger> {
        self.finger
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Samples currently held by the stability filter
    pub fn buffered(&self) -> usize {
        self.filter.as_ref().map_or(0, |(_, f)| f.len())
    }

    /// Guidance computed from the most recent frame with a hand
    pub fn guidance(&self) -> Option<HandGuidance> {
        self.guidance
    }

    /// Every result completed in this session, oldest first
    pub fn results(&self) -> &[RingSizeResult] {
        &self.results
    }

    pub fn latest_result(&self) -> Option<&RingSizeResult> {
        self.results.last()
    }

    pub fn select_finger(&mut self, finger: Finger) {
        self.finger = Some(finger);
        self.attempts += 1;
        self.clear_buffer();
    }

    /// Depth-polling callback
    pub fn on_depth_frame(&mut self, depth: DepthFrame) {
        if self.frozen {
            return;
        }
        self.depth = Some(depth);
    }

    /// Depth sensor stopped reporting
    pub fn clear_depth(&mut self) {
        if self.frozen {
            return;
        }
        self.depth = None;
    }

    /// Unfreeze and return to finger selection
    pub fn resume(&mut self) {
        self.frozen = false;
        self.finger = None;
    }

    /// Resume and discard everything buffered so far
    pub fn restart(&mut self) {
        self.resume();
        self.clear_buffer();
        self.attempts += 1;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    pub fn duration_seconds(&self) -> f64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) if last > first => last - first,
            _ => 0.0,
        }
    }

    fn clear_buffer(&mut self) {
        self.filter = None;
        self.run_confidence = None;
    }

    fn touch(&mut self, timestamp: f64) {
        if self.first_timestamp.is_none() {
            self.first_timestamp = Some(timestamp);
        }
        self.last_timestamp = Some(timestamp);
    }

    /// Filter for `mode`, rebuilt whenever the incoming mode changes
    fn filter_for(&mut self, mode: DetectionMode, config: &MeasurementConfig) -> &mut StabilityFilter {
        if let Some((previous, filter)) = &self.filter
            && *previous != mode
        {
            debug!(
                "Detection mode changed {:?} -> {:?}, dropping {} buffered samples",
                previous,
                mode,
                filter.len()
            );
            self.clear_buffer();
        }
        let (_, filter) = self
            .filter
            .get_or_insert_with(|| (mode, StabilityFilter::new(config.stability.policy_for(mode))));
        filter
    }

    /// Fold `confidence` into the current run; a restarted run begins afresh
    fn fold_confidence(&mut self, confidence: Confidence, restarted: bool) -> Confidence {
        let lowest = match self.run_confidence {
            Some(current) if !restarted => current.min(confidence),
            _ => confidence,
        };
        self.run_confidence = Some(lowest);
        lowest
    }
}

/// Composable measurement pipeline
pub struct MeasurementPipeline {
    config: MeasurementConfig,
    debug: Option<DebugConfig>,
}

impl MeasurementPipeline {
    pub fn new(config: MeasurementConfig) -> Self {
        Self {
            config,
            debug: None,
        }
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Advance `session` by one tracker frame.
    pub fn process_frame(&self, session: &mut MeasurementSession, input: &FrameInput<'_>) -> FrameOutcome {
        if session.frozen {
            return FrameOutcome::Frozen;
        }
        session.touch(input.timestamp);

        let Some(hand) = input.landmarks else {
            return FrameOutcome::NoHand;
        };

        let guidance = hand_guidance(hand, input.width, input.height, &self.config.guidance);
        session.guidance = Some(guidance);

        let Some(finger) = session.finger else {
            return FrameOutcome::NoFinger;
        };

        let t = self.config.positions.for_finger(finger);
        let Some(frame) = build_frame(hand, finger, input.width, input.height, t) else {
            debug!("Degenerate {} axis, skipping frame", finger);
            return FrameOutcome::Skipped(SkipReason::DegenerateFrame);
        };

        let sample = estimate_thickness(input.pixels, &frame, finger.class(), &self.config.edge);
        let thickness = match &sample {
            Some(s) => ThicknessSource::Edges(s.thickness_px),
            None => {
                let px = crude_thickness_px(hand, finger, input.width, input.height);
                debug!("Edge search failed on {}, crude estimate {:.1}px", finger, px);
                ThicknessSource::Crude(px)
            }
        };

        let depth = session.depth.as_ref().map(|d| d as &dyn DepthSource);
        let scaled = match resolve_scale(
            thickness,
            hand,
            frame.center,
            input.width,
            input.height,
            depth,
            &self.config.scale,
        ) {
            ScaleOutcome::Resolved(scaled) => scaled,
            ScaleOutcome::DepthRejected(z) => {
                debug!("Depth {:.3}m out of range, skipping frame", z);
                return FrameOutcome::Skipped(SkipReason::DepthOutOfRange(z));
            }
            ScaleOutcome::EdgesRequired => {
                debug!("Edge search failed on {} with depth available, skipping frame", finger);
                return FrameOutcome::Skipped(SkipReason::EdgesRequired);
            }
            ScaleOutcome::Unresolved => {
                debug!("No scale reference for {}, skipping frame", finger);
                return FrameOutcome::Skipped(SkipReason::ScaleUnavailable);
            }
        };

        if !self.config.scale.is_plausible(scaled.diameter_mm) {
            debug!(
                "Implausible {} diameter {:.2}mm ({}), skipping frame",
                finger,
                scaled.diameter_mm,
                scaled.method.tag()
            );
            return FrameOutcome::Skipped(SkipReason::ImplausibleDiameter(scaled.diameter_mm));
        }

        let mode = scaled.method.detection_mode();
        let update = session.filter_for(mode, &self.config).push(scaled.diameter_mm);
        let confidence =
            session.fold_confidence(scaled.confidence, matches!(update, StabilityUpdate::Reset { .. }));
        let mean_mm = match update {
            StabilityUpdate::Accumulating { len, .. } => {
                return FrameOutcome::Accumulating {
                    diameter_mm: scaled.diameter_mm,
                    buffered: len,
                    mode,
                };
            }
            StabilityUpdate::Reset { discarded } => {
                debug!("Deviation on {}, discarded {} samples", finger, discarded);
                return FrameOutcome::Accumulating {
                    diameter_mm: scaled.diameter_mm,
                    buffered: session.buffered(),
                    mode,
                };
            }
            StabilityUpdate::Stable { mean_mm, frames } => {
                debug!("{} stable over {} frames at {:.2}mm", finger, frames, mean_mm);
                mean_mm
            }
        };

        let size = ring_size(mean_mm, self.config.sizing.policy);
        if !size.is_in_range() {
            debug!("Stabilized {:.2}mm has no ring size, continuing", mean_mm);
            if session.buffered() == 0 {
                session.run_confidence = None;
            }
            return FrameOutcome::Skipped(SkipReason::OutOfSizeRange(mean_mm));
        }

        let result = RingSizeResult {
            finger,
            diameter_mm: mean_mm,
            size_eu: size.eu,
            size_us: size.us,
            confidence,
            detection_mode: mode,
        };
        info!(
            "Measured {}: {:.2}mm, EU {:?}, US {:?} ({})",
            finger,
            mean_mm,
            result.size_eu,
            result.size_us,
            mode.label()
        );

        session.frozen = true;
        session.results.push(result.clone());
        self.save_debug_output(session, input, &frame, sample.as_ref());

        FrameOutcome::Completed(result)
    }

    /// Overlay of the completing frame; failures are logged and ignored
    fn save_debug_output(
        &self,
        session: &MeasurementSession,
        input: &FrameInput<'_>,
        frame: &MeasurementFrame,
        sample: Option<&ThicknessSample>,
    ) {
        let Some(debug_config) = self.debug.as_ref() else {
            return;
        };
        let finger = session.finger.map_or("none", Finger::name);
        let filename = format!("{:02}_{}.png", session.results.len(), finger);
        let path = debug_config.output_dir.join(&filename);
        match save_overlay(&path, input.pixels, frame, sample) {
            Ok(()) => debug!("Debug: saved {}", filename),
            Err(e) => warn!("{:#}", e),
        }
    }
}
