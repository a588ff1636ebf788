use std::io;

use crate::core::db::measurement::Measurement;
use crate::core::db::model::format_timestamp;

/// Column order of the flat export
pub const CSV_COLUMNS: [&str; 10] = [
    "clientId",
    "eventType",
    "fingerName",
    "sizeEU",
    "sizeUS",
    "diameterMm",
    "attemptsCount",
    "detectionMode",
    "deviceModel",
    "createdAt",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_csv<W: io::Write>(writer: W, records: &[Measurement]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_COLUMNS)?;
    for m in records {
        wtr.write_record([
            m.client_id.clone(),
            m.event_type.as_str().to_string(),
            opt(m.finger_name),
            opt(m.size_eu),
            opt(m.size_us),
            opt(m.diameter_mm),
            m.attempts_count.to_string(),
            m.detection_mode.label().to_string(),
            m.device_model.clone().unwrap_or_default(),
            format_timestamp(m.created_at)?,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::measurement::EventType;
    use crate::models::{DetectionMode, Finger};
    use time::macros::datetime;
    use uuid::Uuid;

    fn record(event_type: EventType) -> Measurement {
        Measurement {
            id: 1,
            session_id: Uuid::nil(),
            client_id: "acme".into(),
            event_type,
            finger_name: Some(Finger::Ring),
            size_eu: Some(54),
            size_us: Some(7.5),
            diameter_mm: Some(17.5),
            detection_mode: DetectionMode::Depth,
            device_model: Some("Pixel 8".into()),
            session_duration_seconds: Some(4.0),
            attempts_count: 2,
            created_at: datetime!(2026-03-01 12:00 UTC),
            _guard: (),
        }
    }

    #[test]
    fn header_and_rows_follow_column_order() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record(EventType::Success)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("clientId,eventType,fingerName,sizeEU,sizeUS,diameterMm,attemptsCount,detectionMode,deviceModel,createdAt")
        );
        assert_eq!(
            lines.next(),
            Some("acme,success,ring,54,7.5,17.5,2,LiDAR,Pixel 8,2026-03-01T12:00:00Z")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn missing_values_are_empty_cells() {
        let mut open = record(EventType::Open);
        open.finger_name = None;
        open.size_eu = None;
        open.size_us = None;
        open.diameter_mm = None;
        open.device_model = None;
        open.detection_mode = DetectionMode::Standard;

        let mut out = Vec::new();
        write_csv(&mut out, &[open]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("acme,open,,,,,2,Standard,,2026-03-01T12:00:00Z")
        );
    }
}
