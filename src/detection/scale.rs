use serde::{Deserialize, Serialize};

use crate::config::ScaleConfig;
use crate::models::{landmarks, Confidence, DetectionMode, Finger, HandLandmarks, Point2};

/// Body dimension assumed when no depth sensor is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnthropometricReference {
    /// Wrist to middle fingertip
    #[default]
    HandLength,
    /// Index MCP to pinky MCP
    PalmWidth,
}

impl AnthropometricReference {
    pub fn landmark_pair(self) -> (usize, usize) {
        match self {
            AnthropometricReference::HandLength => (landmarks::WRIST, landmarks::MIDDLE_FINGER_TIP),
            AnthropometricReference::PalmWidth => (landmarks::INDEX_FINGER_MCP, landmarks::PINKY_MCP),
        }
    }
}

/// Optional metric depth collaborator (LiDAR / depth sensing)
pub trait DepthSource {
    /// Depth in meters at normalized image coordinates
    fn depth_at(&self, x_norm: f32, y_norm: f32) -> Option<f32>;
    fn focal_length_px(&self) -> Option<f32>;
}

/// Snapshot of the depth sensor, row-major, nearest-sample lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    meters: Vec<f32>,
    focal_px: Option<f32>,
}

impl DepthFrame {
    pub fn new(width: usize, height: usize, meters: Vec<f32>, focal_px: Option<f32>) -> anyhow::Result<Self> {
        if width == 0 || height == 0 || meters.len() != width * height {
            anyhow::bail!(
                "Depth map of {}x{} needs {} samples, got {}",
                width,
                height,
                width * height,
                meters.len()
            );
        }
        Ok(Self {
            width,
            height,
            meters,
            focal_px,
        })
    }

    /// Same reading everywhere; `None` means "no signal"
    pub fn uniform(meters: Option<f32>, focal_px: Option<f32>) -> Self {
        Self {
            width: 1,
            height: 1,
            meters: vec![meters.unwrap_or(f32::NAN)],
            focal_px,
        }
    }
}

impl DepthSource for DepthFrame {
    fn depth_at(&self, x_norm: f32, y_norm: f32) -> Option<f32> {
        if !x_norm.is_finite() || !y_norm.is_finite() {
            return None;
        }
        let col = ((x_norm * self.width as f32) as isize).clamp(0, self.width as isize - 1) as usize;
        let row = ((y_norm * self.height as f32) as isize).clamp(0, self.height as isize - 1) as usize;
        let z = self.meters[row * self.width + col];
        z.is_finite().then_some(z)
    }

    fn focal_length_px(&self) -> Option<f32> {
        self.focal_px.filter(|f| f.is_finite() && *f > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepthReading {
    /// No collaborator, no focal length, or no signal at the center
    Unavailable,
    /// Signal present but outside the accepted range
    OutOfRange(f32),
    Valid { z_m: f32, fx_px: f32 },
}

pub fn read_depth(
    depth: Option<&dyn DepthSource>,
    center: Point2,
    width: u32,
    height: u32,
    max_depth_m: f32,
) -> DepthReading {
    let Some(depth) = depth else {
        return DepthReading::Unavailable;
    };
    let (Some(z_m), Some(fx_px)) = (
        depth.depth_at(center.x / width as f32, center.y / height as f32),
        depth.focal_length_px(),
    ) else {
        return DepthReading::Unavailable;
    };
    if z_m > 0.0 && z_m < max_depth_m {
        DepthReading::Valid { z_m, fx_px }
    } else {
        DepthReading::OutOfRange(z_m)
    }
}

/// Pinhole back-projection of a pixel length at depth `z_m`
pub fn depth_diameter_mm(thickness_px: f32, z_m: f32, fx_px: f32) -> f32 {
    thickness_px * z_m / fx_px * 1000.0
}

/// Millimeters per pixel from the assumed body dimension; `None` below 1 px.
pub fn anthropometric_mm_per_px(
    hand: &HandLandmarks,
    cfg: &ScaleConfig,
    width: u32,
    height: u32,
) -> Option<f32> {
    let (a, b) = cfg.reference.landmark_pair();
    let reference_px = hand.pixel_distance(a, b, width, height);
    if !reference_px.is_finite() || reference_px < 1.0 {
        return None;
    }
    Some(cfg.reference_mm() / reference_px)
}

/// Landmark-only width estimate used when edge detection fails: the largest
/// pairwise distance among the finger's landmarks, corrected per finger.
pub fn crude_thickness_px(hand: &HandLandmarks, finger: Finger, width: u32, height: u32) -> f32 {
    let chain = finger.chain_indices();
    let mut max_px = 0.0f32;
    for (i, &a) in chain.iter().enumerate() {
        for &b in &chain[i + 1..] {
            max_px = max_px.max(hand.pixel_distance(a, b, width, height));
        }
    }
    max_px * finger.spread_correction()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScaleMethod {
    Depth,
    HandScale,
}

impl ScaleMethod {
    pub fn tag(self) -> &'static str {
        match self {
            ScaleMethod::Depth => "depth",
            ScaleMethod::HandScale => "hand-scale",
        }
    }

    pub fn detection_mode(self) -> DetectionMode {
        match self {
            ScaleMethod::Depth => DetectionMode::Depth,
            ScaleMethod::HandScale => DetectionMode::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledDiameter {
    pub diameter_mm: f32,
    pub thickness_px: f32,
    pub method: ScaleMethod,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleOutcome {
    Resolved(ScaledDiameter),
    /// Depth signal out of range: drop the frame
    DepthRejected(f32),
    /// Depth is live but only a crude thickness exists: drop the frame
    EdgesRequired,
    /// No usable scale reference
    Unresolved,
}

/// Where the pixel thickness came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThicknessSource {
    Edges(f32),
    Crude(f32),
}

/// Convert a pixel thickness to millimeters, depth first, anthropometric second.
pub fn resolve_scale(
    thickness: ThicknessSource,
    hand: &HandLandmarks,
    center: Point2,
    width: u32,
    height: u32,
    depth: Option<&dyn DepthSource>,
    cfg: &ScaleConfig,
) -> ScaleOutcome {
    let resolved = match read_depth(depth, center, width, height, cfg.max_depth_m) {
        DepthReading::OutOfRange(z) => return ScaleOutcome::DepthRejected(z),
        DepthReading::Valid { z_m, fx_px } => match thickness {
            ThicknessSource::Edges(px) => Some(ScaledDiameter {
                diameter_mm: depth_diameter_mm(px, z_m, fx_px),
                thickness_px: px,
                method: ScaleMethod::Depth,
                confidence: Confidence::High,
            }),
            ThicknessSource::Crude(_) => return ScaleOutcome::EdgesRequired,
        },
        DepthReading::Unavailable => {
            let (px, confidence) = match thickness {
                ThicknessSource::Edges(px) => (px, Confidence::Medium),
                ThicknessSource::Crude(px) => (px, Confidence::Low),
            };
            hand_scale(px, confidence, hand, cfg, width, height)
        }
    };

    match resolved {
        Some(d) if d.diameter_mm.is_finite() && d.diameter_mm > 0.0 => ScaleOutcome::Resolved(d),
        _ => ScaleOutcome::Unresolved,
    }
}

fn hand_scale(
    thickness_px: f32,
    confidence: Confidence,
    hand: &HandLandmarks,
    cfg: &ScaleConfig,
    width: u32,
    height: u32,
) -> Option<ScaledDiameter> {
    let ratio = anthropometric_mm_per_px(hand, cfg, width, height)?;
    Some(ScaledDiameter {
        diameter_mm: thickness_px * ratio,
        thickness_px,
        method: ScaleMethod::HandScale,
        confidence,
    })
}
