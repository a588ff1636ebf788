#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types for tests
pub use ringsizer::core::db::{
    ClientInfo, EventType, Measurement, MeasurementDb, MeasurementRepository, NewMeasurement,
};
pub use ringsizer::{
    Confidence, DetectionMode, Finger, FrameOutcome, MeasurementConfig, MeasurementPipeline,
    MeasurementSession, RingSizeResult, SkipReason,
};
