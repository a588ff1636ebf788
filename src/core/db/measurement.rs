use std::{future::Future, path::Path};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{DetectionMode, Finger, RingSizeResult};
use crate::pipeline::MeasurementSession;

/// `Open` is logged when a session starts, `Success` when a result completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Open,
    Success,
}

/// Who is measuring, attached to every record
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub client_id: String,
    pub device_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeasurement {
    pub session_id: Uuid,
    pub client_id: String,
    pub event_type: EventType,
    pub finger_name: Option<Finger>,
    #[serde(rename = "sizeEU")]
    pub size_eu: Option<i32>,
    #[serde(rename = "sizeUS")]
    pub size_us: Option<f32>,
    pub diameter_mm: Option<f32>,
    pub detection_mode: DetectionMode,
    pub device_model: Option<String>,
    pub session_duration_seconds: Option<f64>,
    pub attempts_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl NewMeasurement {
    pub fn open(session: &MeasurementSession, client: &ClientInfo) -> Self {
        Self {
            session_id: session.id(),
            client_id: client.client_id.clone(),
            event_type: EventType::Open,
            finger_name: session.finger(),
            size_eu: None,
            size_us: None,
            diameter_mm: None,
            detection_mode: DetectionMode::Standard,
            device_model: client.device_model.clone(),
            session_duration_seconds: None,
            attempts_count: session.attempts(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn success(session: &MeasurementSession, client: &ClientInfo, result: &RingSizeResult) -> Self {
        Self {
            session_id: session.id(),
            client_id: client.client_id.clone(),
            event_type: EventType::Success,
            finger_name: Some(result.finger),
            size_eu: result.size_eu,
            size_us: result.size_us,
            diameter_mm: Some(result.diameter_mm),
            detection_mode: result.detection_mode,
            device_model: client.device_model.clone(),
            session_duration_seconds: Some(session.duration_seconds()),
            attempts_count: session.attempts(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Stored record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: i64,
    pub session_id: Uuid,
    pub client_id: String,
    pub event_type: EventType,
    pub finger_name: Option<Finger>,
    #[serde(rename = "sizeEU")]
    pub size_eu: Option<i32>,
    #[serde(rename = "sizeUS")]
    pub size_us: Option<f32>,
    pub diameter_mm: Option<f32>,
    pub detection_mode: DetectionMode,
    pub device_model: Option<String>,
    pub session_duration_seconds: Option<f64>,
    pub attempts_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip)]
    pub(super) _guard: (),
}

pub trait MeasurementRepository {
    fn add_measurement(
        &self,
        measurement: NewMeasurement,
    ) -> impl Future<Output = anyhow::Result<Measurement>>;
    fn get_measurements(&self) -> impl Future<Output = anyhow::Result<Vec<Measurement>>>;
    fn get_client_measurements(
        &self,
        client_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<Measurement>>>;
    /// Write every record as CSV, returning the number of rows
    fn export_csv(&self, path: &Path) -> impl Future<Output = anyhow::Result<usize>>;
}
