use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::core::db::measurement::{EventType, Measurement};
use crate::models::{DetectionMode, Finger};

/// Raw `measurement` row as SQLite returns it
#[derive(Debug, sqlx::FromRow)]
pub(super) struct MeasurementRow {
    pub id: i64,
    pub session_id: String,
    pub client_id: String,
    pub event_type: String,
    pub finger_name: Option<String>,
    pub size_eu: Option<i64>,
    pub size_us: Option<f64>,
    pub diameter_mm: Option<f64>,
    pub detection_mode: String,
    pub device_model: Option<String>,
    pub session_duration_seconds: Option<f64>,
    pub attempts_count: i64,
    pub created_at: String,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Open => "open",
            EventType::Success => "success",
        }
    }
}

impl TryFrom<&str> for EventType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(EventType::Open),
            "success" => Ok(EventType::Success),
            _ => Err(anyhow::anyhow!("Invalid event type: {}", value)),
        }
    }
}

impl TryFrom<MeasurementRow> for Measurement {
    type Error = anyhow::Error;

    fn try_from(row: MeasurementRow) -> Result<Self, Self::Error> {
        let finger_name = row
            .finger_name
            .as_deref()
            .map(|name| name.parse::<Finger>().map_err(anyhow::Error::msg))
            .transpose()?;
        let size_eu = row.size_eu.map(i32::try_from).transpose()?;
        Ok(Measurement {
            id: row.id,
            session_id: Uuid::parse_str(&row.session_id)?,
            client_id: row.client_id,
            event_type: EventType::try_from(row.event_type.as_str())?,
            finger_name,
            size_eu,
            size_us: row.size_us.map(|v| v as f32),
            diameter_mm: row.diameter_mm.map(|v| v as f32),
            detection_mode: DetectionMode::try_from(row.detection_mode.as_str())?,
            device_model: row.device_model,
            session_duration_seconds: row.session_duration_seconds,
            attempts_count: u32::try_from(row.attempts_count)?,
            created_at: OffsetDateTime::parse(&row.created_at, &Rfc3339)?,
            _guard: (),
        })
    }
}

pub(super) fn format_timestamp(ts: OffsetDateTime) -> anyhow::Result<String> {
    Ok(ts.format(&Rfc3339)?)
}
