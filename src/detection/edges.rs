//! Finger-edge localization along the measurement normal.
//!
//! Each side of the frame center is sampled into a 1-D luma profile, smoothed,
//! differentiated, and scanned for the nearest gradient peak above an adaptive
//! threshold. Both sides must succeed for a thickness sample.

use crate::config::EdgeSearchConfig;
use crate::detection::preprocessing::PixelSource;
use crate::models::{EdgePeak, FingerClass, MeasurementFrame, Point2, ThicknessSample, UnitVector2};

/// Ray length and dead zone around the center, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBounds {
    pub max_step_px: f32,
    pub min_dist_px: f32,
}

impl SearchBounds {
    /// Bounds scaled by the MCP→PIP length; `None` uses the fixed fallbacks.
    pub fn for_finger(class: FingerClass, axis_length: Option<f32>) -> Self {
        let len = axis_length.filter(|l| l.is_finite() && *l > 0.0);
        match (class, len) {
            (FingerClass::Thumb, Some(len)) => Self {
                max_step_px: (len * 0.55).min(85.0).max(40.0),
                min_dist_px: (len * 0.12).min(16.0).max(8.0),
            },
            (FingerClass::Thumb, None) => Self {
                max_step_px: 65.0,
                min_dist_px: 8.0,
            },
            (FingerClass::Standard, Some(len)) => Self {
                max_step_px: (len * 0.35).min(60.0).max(30.0),
                min_dist_px: (len * 0.08).min(12.0).max(6.0),
            },
            (FingerClass::Standard, None) => Self {
                max_step_px: 55.0,
                min_dist_px: 6.0,
            },
        }
    }
}

/// Symmetric moving average, window shrinks at the ends
pub fn smooth_1d(values: &[f32], radius: usize) -> Vec<f32> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(n.saturating_sub(1));
            let window = &values[lo..=hi];
            window.iter().sum::<f32>() / window.len() as f32
        })
        .collect()
}

/// Absolute first difference; index 0 is always zero
pub fn abs_gradient(values: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; values.len()];
    for i in 1..values.len() {
        out[i] = (values[i] - values[i - 1]).abs();
    }
    out
}

/// Nearest-rank percentile (`p` in `[0, 1]`), `0.0` for an empty slice
pub fn percentile(values: &[f32], p: f32) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = (sorted.len() as f32 * p).floor() as usize;
    sorted.get(idx).copied().unwrap_or(0.0)
}

fn is_local_max(grad: &[f32], i: usize) -> bool {
    let g = grad[i];
    g > grad[i - 1] && g >= grad[i + 1] && g > grad[i - 2] && g >= grad[i + 2]
}

/// Locate the finger boundary along `dir` starting at `center`.
pub fn find_edge_peak<P: PixelSource + ?Sized>(
    src: &P,
    center: Point2,
    dir: UnitVector2,
    bounds: SearchBounds,
    cfg: &EdgeSearchConfig,
) -> Option<EdgePeak> {
    let steps = bounds.max_step_px.floor().max(0.0) as usize;
    let mut samples = Vec::with_capacity(steps + 1);
    for t in 0..=steps {
        let p = center.offset(dir, t as f32);
        samples.push(src.patch_gray(p.x, p.y, cfg.patch_half_size)?);
    }

    let smoothed = smooth_1d(&samples, cfg.smooth_radius);
    let grad = abs_gradient(&smoothed);
    let threshold = cfg
        .min_threshold
        .max(percentile(&grad, cfg.percentile) * cfg.threshold_factor);

    // Ascending scan: the first qualifying peak is the one nearest the center
    (2..grad.len().saturating_sub(2))
        .filter(|&i| i as f32 >= bounds.min_dist_px)
        .find(|&i| is_local_max(&grad, i) && grad[i] >= threshold)
        .map(|i| EdgePeak {
            offset_px: i as f32,
            position: center.offset(dir, i as f32),
            gradient_score: grad[i],
        })
}

/// Finger thickness across the frame, or `None` if either side has no edge.
pub fn estimate_thickness<P: PixelSource + ?Sized>(
    src: &P,
    frame: &MeasurementFrame,
    class: FingerClass,
    cfg: &EdgeSearchConfig,
) -> Option<ThicknessSample> {
    let bounds = SearchBounds::for_finger(class, Some(frame.axis_length));
    let far = find_edge_peak(src, frame.center, frame.normal, bounds, cfg)?;
    let near = find_edge_peak(src, frame.center, frame.normal.reversed(), bounds, cfg)?;

    Some(ThicknessSample {
        thickness_px: far.offset_px + near.offset_px,
        edge_near: near.position,
        edge_far: far.position,
    })
}
