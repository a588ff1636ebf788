use serde::Serialize;

use crate::config::GuidanceConfig;
use crate::models::{landmarks, Finger, HandLandmarks, MeasurementFrame, Point2, UnitVector2};

/// Build the sampling frame for `finger` at ratio `t` along MCP→PIP.
///
/// Returns `None` when the MCP and PIP landmarks collapse onto each other
/// (occluded or degenerate hand).
pub fn build_frame(
    hand: &HandLandmarks,
    finger: Finger,
    width: u32,
    height: u32,
    t: f32,
) -> Option<MeasurementFrame> {
    let (mcp_idx, pip_idx) = finger.anchor_indices();
    let mcp = hand.get(mcp_idx).to_pixels(width, height);
    let pip = hand.get(pip_idx).to_pixels(width, height);

    let dx = pip.x - mcp.x;
    let dy = pip.y - mcp.y;
    let axis = UnitVector2::normalize(dx, dy)?;
    let axis_length = dx.hypot(dy);

    Some(MeasurementFrame {
        center: Point2::new(mcp.x + t * dx, mcp.y + t * dy),
        normal: axis.perpendicular(),
        axis_length,
        mcp,
        pip,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Handedness {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DistanceHint {
    /// Hand appears too small, bring it closer
    TooFar,
    /// Hand appears too large, move it away
    TooClose,
    Ok,
}

/// Per-frame feedback for the user, independent of the measurement itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandGuidance {
    pub handedness: Handedness,
    pub distance: DistanceHint,
    pub hand_length_px: f32,
}

pub fn hand_guidance(
    hand: &HandLandmarks,
    width: u32,
    height: u32,
    config: &GuidanceConfig,
) -> HandGuidance {
    let handedness = if hand.get(landmarks::THUMB_TIP).x < hand.get(landmarks::WRIST).x {
        Handedness::Left
    } else {
        Handedness::Right
    };

    let hand_length_px =
        hand.pixel_distance(landmarks::WRIST, landmarks::MIDDLE_FINGER_TIP, width, height);
    let distance = if hand_length_px < config.min_hand_px {
        DistanceHint::TooFar
    } else if hand_length_px > config.max_hand_px {
        DistanceHint::TooClose
    } else {
        DistanceHint::Ok
    };

    HandGuidance {
        handedness,
        distance,
        hand_length_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Landmark, LANDMARK_COUNT};

    fn hand_with(points: &[(usize, f32, f32)]) -> HandLandmarks {
        let mut lms = [Landmark::default(); LANDMARK_COUNT];
        for &(i, x, y) in points {
            lms[i] = Landmark::new(x, y);
        }
        HandLandmarks::new(lms)
    }

    #[test]
    fn frame_center_and_normal() {
        // Ring MCP at (100, 200), PIP at (100, 100) in a 1000x1000 image
        let hand = hand_with(&[(13, 0.1, 0.2), (14, 0.1, 0.1)]);
        let frame = build_frame(&hand, Finger::Ring, 1000, 1000, 0.55).unwrap();

        assert!((frame.axis_length - 100.0).abs() < 1e-3);
        assert!((frame.center.x - 100.0).abs() < 1e-3);
        assert!((frame.center.y - 145.0).abs() < 1e-3);
        // axis = (0, -1) → normal = (1, 0)
        assert!((frame.normal.x() - 1.0).abs() < 1e-6);
        assert!(frame.normal.y().abs() < 1e-6);
    }

    #[test]
    fn degenerate_axis_yields_none() {
        let hand = hand_with(&[(5, 0.4, 0.4), (6, 0.4, 0.4)]);
        assert!(build_frame(&hand, Finger::Index, 640, 480, 0.55).is_none());
    }

    #[test]
    fn thumb_uses_mcp_and_ip() {
        let hand = hand_with(&[(2, 0.0, 0.0), (3, 0.1, 0.0)]);
        let frame = build_frame(&hand, Finger::Thumb, 100, 100, 0.30).unwrap();
        assert!((frame.center.x - 3.0).abs() < 1e-4);
        assert!((frame.axis_length - 10.0).abs() < 1e-4);
    }

    #[test]
    fn guidance_distance_window() {
        let cfg = GuidanceConfig::default();
        let hand = hand_with(&[(0, 0.5, 0.9), (12, 0.5, 0.4), (4, 0.3, 0.7)]);
        // 0.5 * 480 = 240 px
        let g = hand_guidance(&hand, 640, 480, &cfg);
        assert_eq!(g.distance, DistanceHint::Ok);
        assert_eq!(g.handedness, Handedness::Left);

        let g = hand_guidance(&hand, 320, 240, &cfg);
        assert_eq!(g.distance, DistanceHint::TooFar);

        let g = hand_guidance(&hand, 1280, 960, &cfg);
        assert_eq!(g.distance, DistanceHint::TooClose);
    }
}
