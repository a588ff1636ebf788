//! Aggregation of per-frame diameters into one stabilized value.
//!
//! A filter runs exactly one [`StabilityPolicy`], fixed at construction.
//!
//! - `ResetOnDeviation`: `empty → accumulating → (emit & clear)`. A sample
//!   further than the tolerance from the previous one restarts the run.
//! - `SlidingWindow`: `empty → accumulating → full`. The oldest sample is
//!   dropped past capacity; the running mean is always available and the
//!   window reports `Stable` on every push once it is full.

use std::collections::VecDeque;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StabilityPolicy {
    ResetOnDeviation {
        tolerance_mm: f32,
        required_frames: usize,
    },
    SlidingWindow {
        capacity: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StabilityUpdate {
    /// Not stable yet
    Accumulating { len: usize, mean_mm: f32 },
    /// The sample broke the run; the buffer now holds only that sample
    Reset { discarded: usize },
    /// Stabilized diameter
    Stable { mean_mm: f32, frames: usize },
}

#[derive(Debug, Clone)]
pub struct StabilityFilter {
    policy: StabilityPolicy,
    buffer: VecDeque<f32>,
}

impl StabilityFilter {
    pub fn new(policy: StabilityPolicy) -> Self {
        let capacity = match policy {
            StabilityPolicy::ResetOnDeviation { required_frames, .. } => required_frames,
            StabilityPolicy::SlidingWindow { capacity } => capacity + 1,
        };
        Self {
            policy,
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn policy(&self) -> StabilityPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Arithmetic mean of the buffered samples
    pub fn mean(&self) -> Option<f32> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.iter().sum::<f32>() / self.buffer.len() as f32)
    }

    pub fn push(&mut self, sample_mm: f32) -> StabilityUpdate {
        match self.policy {
            StabilityPolicy::ResetOnDeviation {
                tolerance_mm,
                required_frames,
            } => {
                let mut discarded = 0;
                if let Some(&last) = self.buffer.back() {
                    if (sample_mm - last).abs() > tolerance_mm {
                        discarded = self.buffer.len();
                        self.buffer.clear();
                    }
                }
                self.buffer.push_back(sample_mm);

                if self.buffer.len() >= required_frames {
                    let frames = self.buffer.len();
                    let mean_mm = self.mean().unwrap_or(sample_mm);
                    self.buffer.clear();
                    StabilityUpdate::Stable { mean_mm, frames }
                } else if discarded > 0 {
                    StabilityUpdate::Reset { discarded }
                } else {
                    StabilityUpdate::Accumulating {
                        len: self.buffer.len(),
                        mean_mm: self.mean().unwrap_or(sample_mm),
                    }
                }
            }
            StabilityPolicy::SlidingWindow { capacity } => {
                self.buffer.push_back(sample_mm);
                while self.buffer.len() > capacity {
                    self.buffer.pop_front();
                }
                let mean_mm = self.mean().unwrap_or(sample_mm);
                if self.buffer.len() >= capacity {
                    StabilityUpdate::Stable {
                        mean_mm,
                        frames: self.buffer.len(),
                    }
                } else {
                    StabilityUpdate::Accumulating {
                        len: self.buffer.len(),
                        mean_mm,
                    }
                }
            }
        }
    }
}
