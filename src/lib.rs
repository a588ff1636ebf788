pub mod config;
pub mod core;
pub mod detection;
pub mod models;
pub mod pipeline;
pub mod recording;

pub use config::{load_config, MeasurementConfig};
pub use models::{Confidence, DetectionMode, Finger, HandLandmarks, Landmark, RingSizeResult};
pub use pipeline::{DebugConfig, FrameInput, FrameOutcome, MeasurementPipeline, MeasurementSession, SkipReason};
