use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of landmarks the hand tracker reports per frame.
pub const LANDMARK_COUNT: usize = 21;

/// Hand landmark indices (MediaPipe hand landmark model convention)
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// A single landmark in normalized image coordinates (0.0 to 1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale to pixel space
    pub fn to_pixels(self, width: u32, height: u32) -> Point2 {
        Point2::new(self.x * width as f32, self.y * height as f32)
    }
}

impl From<[f32; 2]> for Landmark {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Landmark> for [f32; 2] {
    fn from(lm: Landmark) -> Self {
        [lm.x, lm.y]
    }
}

/// All 21 landmarks of one detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Pixel distance between two landmarks
    pub fn pixel_distance(&self, a: usize, b: usize, width: u32, height: u32) -> f32 {
        let pa = self.points[a].to_pixels(width, height);
        let pb = self.points[b].to_pixels(width, height);
        pa.distance(pb)
    }
}

impl TryFrom<Vec<Landmark>> for HandLandmarks {
    type Error = String;

    fn try_from(value: Vec<Landmark>) -> Result<Self, Self::Error> {
        let len = value.len();
        let points: [Landmark; LANDMARK_COUNT] = value
            .try_into()
            .map_err(|_| format!("expected {} landmarks, got {}", LANDMARK_COUNT, len))?;
        Ok(Self { points })
    }
}

impl From<HandLandmarks> for Vec<Landmark> {
    fn from(hand: HandLandmarks) -> Self {
        hand.points.to_vec()
    }
}

/// Search-bound class used by the edge estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerClass {
    Thumb,
    Standard,
}

/// A measurable finger. "No finger selected" is `Option::None` at the call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// (MCP, PIP) landmark indices anchoring the measurement frame
    pub fn anchor_indices(self) -> (usize, usize) {
        use landmarks::*;
        match self {
            Finger::Thumb => (THUMB_MCP, THUMB_IP),
            Finger::Index => (INDEX_FINGER_MCP, INDEX_FINGER_PIP),
            Finger::Middle => (MIDDLE_FINGER_MCP, MIDDLE_FINGER_PIP),
            Finger::Ring => (RING_FINGER_MCP, RING_FINGER_PIP),
            Finger::Pinky => (PINKY_MCP, PINKY_PIP),
        }
    }

    /// The four landmarks belonging to this finger, base to tip
    pub fn chain_indices(self) -> [usize; 4] {
        use landmarks::*;
        match self {
            Finger::Thumb => [THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP],
            Finger::Index => [INDEX_FINGER_MCP, INDEX_FINGER_PIP, INDEX_FINGER_DIP, INDEX_FINGER_TIP],
            Finger::Middle => [MIDDLE_FINGER_MCP, MIDDLE_FINGER_PIP, MIDDLE_FINGER_DIP, MIDDLE_FINGER_TIP],
            Finger::Ring => [RING_FINGER_MCP, RING_FINGER_PIP, RING_FINGER_DIP, RING_FINGER_TIP],
            Finger::Pinky => [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
        }
    }

    /// Default position ratio along MCP→PIP where the ring sits
    pub fn default_position(self) -> f32 {
        match self {
            Finger::Thumb => 0.30,
            Finger::Index | Finger::Middle | Finger::Ring => 0.55,
            Finger::Pinky => 0.65,
        }
    }

    /// Correction for the crude landmark-spread diameter estimate
    pub fn spread_correction(self) -> f32 {
        match self {
            Finger::Ring => 0.90,
            Finger::Pinky => 0.85,
            _ => 1.0,
        }
    }

    pub fn class(self) -> FingerClass {
        match self {
            Finger::Thumb => FingerClass::Thumb,
            _ => FingerClass::Standard,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Finger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thumb" => Ok(Finger::Thumb),
            "index" => Ok(Finger::Index),
            "middle" => Ok(Finger::Middle),
            "ring" => Ok(Finger::Ring),
            "pinky" => Ok(Finger::Pinky),
            other => Err(format!("unknown finger '{}'", other)),
        }
    }
}

/// Point in pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point2) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// `self + dir * t`
    pub fn offset(self, dir: UnitVector2, t: f32) -> Point2 {
        Point2::new(self.x + dir.x() * t, self.y + dir.y() * t)
    }
}

/// Unit-length direction. Only constructible through normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitVector2 {
    x: f32,
    y: f32,
}

impl UnitVector2 {
    /// Normalize `(dx, dy)`; `None` when the length is below `1e-6`.
    pub fn normalize(dx: f32, dy: f32) -> Option<Self> {
        let len = dx.hypot(dy);
        if !len.is_finite() || len < 1e-6 {
            return None;
        }
        Some(Self { x: dx / len, y: dy / len })
    }

    /// Rotate by +90°: `(x, y) -> (-y, x)`
    pub fn perpendicular(self) -> Self {
        Self { x: -self.y, y: self.x }
    }

    pub fn reversed(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }

    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }
}

/// Sampling frame at the ring position of one finger, in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementFrame {
    pub center: Point2,
    /// Perpendicular to the MCP→PIP axis
    pub normal: UnitVector2,
    /// MCP→PIP length in pixels
    pub axis_length: f32,
    pub mcp: Point2,
    pub pip: Point2,
}

/// Finger boundary found along one side of the normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgePeak {
    pub offset_px: f32,
    pub position: Point2,
    pub gradient_score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThicknessSample {
    pub thickness_px: f32,
    /// Boundary along `-normal`
    pub edge_near: Point2,
    /// Boundary along `+normal`
    pub edge_far: Point2,
}

/// Ordered from least to most trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// How pixels were converted to millimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionMode {
    Standard,
    #[serde(rename = "LiDAR")]
    Depth,
}

impl DetectionMode {
    /// Label used by the record store
    pub fn label(self) -> &'static str {
        match self {
            DetectionMode::Standard => "Standard",
            DetectionMode::Depth => "LiDAR",
        }
    }
}

impl TryFrom<&str> for DetectionMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Standard" => Ok(DetectionMode::Standard),
            "LiDAR" => Ok(DetectionMode::Depth),
            _ => Err(anyhow::anyhow!("Invalid detection mode: {}", value)),
        }
    }
}

/// Final, immutable result of one completed measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSizeResult {
    pub finger: Finger,
    pub diameter_mm: f32,
    #[serde(rename = "sizeEU")]
    pub size_eu: Option<i32>,
    #[serde(rename = "sizeUS")]
    pub size_us: Option<f32>,
    pub confidence: Confidence,
    pub detection_mode: DetectionMode,
}
