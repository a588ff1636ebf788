use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::detection::scale::AnthropometricReference;
use crate::detection::sizing::SizeMappingPolicy;
use crate::detection::stability::StabilityPolicy;
use crate::models::{DetectionMode, Finger};

/// Tunables for the whole measurement pipeline. Every section falls back to
/// its defaults when omitted from the JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub positions: FingerPositions,
    pub edge: EdgeSearchConfig,
    pub scale: ScaleConfig,
    pub stability: StabilityConfig,
    pub sizing: SizingConfig,
    pub guidance: GuidanceConfig,
}

/// Ratio along MCP→PIP at which each finger is measured
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FingerPositions {
    pub thumb: f32,
    pub index: f32,
    pub middle: f32,
    pub ring: f32,
    pub pinky: f32,
}

impl FingerPositions {
    pub fn for_finger(&self, finger: Finger) -> f32 {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }
}

impl Default for FingerPositions {
    fn default() -> Self {
        Self {
            thumb: Finger::Thumb.default_position(),
            index: Finger::Index.default_position(),
            middle: Finger::Middle.default_position(),
            ring: Finger::Ring.default_position(),
            pinky: Finger::Pinky.default_position(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeSearchConfig {
    /// Half-size of the square patch averaged per sample (1 → 3×3)
    pub patch_half_size: u32,
    /// Moving-average radius applied to the luma profile
    pub smooth_radius: usize,
    /// Lower bound of the adaptive gradient threshold
    pub min_threshold: f32,
    /// Percentile of the gradient distribution the threshold follows
    pub percentile: f32,
    pub threshold_factor: f32,
}

impl Default for EdgeSearchConfig {
    fn default() -> Self {
        Self {
            patch_half_size: 1,
            smooth_radius: 2,
            min_threshold: 6.0,
            percentile: 0.90,
            threshold_factor: 0.55,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub reference: AnthropometricReference,
    pub palm_width_mm: f32,
    pub hand_length_mm: f32,
    /// Depth readings at or beyond this distance (meters) discard the frame
    pub max_depth_m: f32,
    /// Plausible finger diameters; anything outside is discarded, not clamped
    pub min_diameter_mm: f32,
    pub max_diameter_mm: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            reference: AnthropometricReference::HandLength,
            palm_width_mm: 64.0,
            hand_length_mm: 180.0,
            max_depth_m: 1.0,
            min_diameter_mm: 10.0,
            max_diameter_mm: 28.0,
        }
    }
}

impl ScaleConfig {
    pub fn reference_mm(&self) -> f32 {
        match self.reference {
            AnthropometricReference::PalmWidth => self.palm_width_mm,
            AnthropometricReference::HandLength => self.hand_length_mm,
        }
    }

    pub fn is_plausible(&self, diameter_mm: f32) -> bool {
        diameter_mm.is_finite()
            && diameter_mm >= self.min_diameter_mm
            && diameter_mm <= self.max_diameter_mm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityPolicyKind {
    ResetOnDeviation,
    SlidingWindow,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StabilityTuning {
    pub tolerance_mm: f32,
    pub required_frames: usize,
}

impl Default for StabilityTuning {
    fn default() -> Self {
        Self {
            tolerance_mm: 0.5,
            required_frames: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub policy: StabilityPolicyKind,
    pub standard: StabilityTuning,
    pub depth: StabilityTuning,
    pub window_capacity: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            policy: StabilityPolicyKind::ResetOnDeviation,
            standard: StabilityTuning::default(),
            depth: StabilityTuning {
                tolerance_mm: 0.4,
                required_frames: 10,
            },
            window_capacity: 10,
        }
    }
}

impl StabilityConfig {
    /// Concrete policy for samples produced in `mode`
    pub fn policy_for(&self, mode: DetectionMode) -> StabilityPolicy {
        let tuning = match mode {
            DetectionMode::Standard => self.standard,
            DetectionMode::Depth => self.depth,
        };
        match self.policy {
            StabilityPolicyKind::ResetOnDeviation => StabilityPolicy::ResetOnDeviation {
                tolerance_mm: tuning.tolerance_mm,
                required_frames: tuning.required_frames.max(1),
            },
            StabilityPolicyKind::SlidingWindow => StabilityPolicy::SlidingWindow {
                capacity: self.window_capacity.max(1),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub policy: SizeMappingPolicy,
}

/// Wrist→middle-tip pixel length window for the distance hint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    pub min_hand_px: f32,
    pub max_hand_px: f32,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            min_hand_px: 200.0,
            max_hand_px: 300.0,
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<MeasurementConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: MeasurementConfig = serde_json::from_str(
            r#"{ "sizing": { "policy": "formula" }, "stability": { "policy": "sliding_window" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.sizing.policy, SizeMappingPolicy::Formula);
        assert_eq!(cfg.positions.pinky, 0.65);
        assert_eq!(
            cfg.stability.policy_for(DetectionMode::Depth),
            StabilityPolicy::SlidingWindow { capacity: 10 }
        );
    }

    #[test]
    fn depth_mode_is_stricter_than_standard() {
        let cfg = StabilityConfig::default();
        match (
            cfg.policy_for(DetectionMode::Standard),
            cfg.policy_for(DetectionMode::Depth),
        ) {
            (
                StabilityPolicy::ResetOnDeviation { tolerance_mm: ts, required_frames: rs },
                StabilityPolicy::ResetOnDeviation { tolerance_mm: td, required_frames: rd },
            ) => {
                assert!(td < ts);
                assert!(rd > rs);
            }
            other => panic!("unexpected policies {:?}", other),
        }
    }
}
