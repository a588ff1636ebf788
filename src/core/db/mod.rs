mod export;
mod measurement;
mod model;
mod state;

use std::{fs::File, io::BufWriter, path::Path, sync::Arc};

use anyhow::Context;
use state::StoreState;

pub use export::{write_csv, CSV_COLUMNS};
pub use measurement::{ClientInfo, EventType, Measurement, MeasurementRepository, NewMeasurement};
use model::{format_timestamp, MeasurementRow};

const SELECT_COLUMNS: &str = "SELECT id, session_id, client_id, event_type, finger_name, size_eu, size_us, \
    diameter_mm, detection_mode, device_model, session_duration_seconds, attempts_count, created_at \
    FROM measurement";

#[derive(Debug, Clone)]
pub struct MeasurementDb {
    state: Arc<StoreState>,
}

impl MeasurementDb {
    pub async fn new<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(StoreState::new(db_file).await?),
        })
    }

    /// Checkpoint and close the store. Further queries fail.
    pub async fn close(&self) -> anyhow::Result<()> {
        self.state.close().await
    }

    pub(crate) async fn insert(&self, new: NewMeasurement) -> anyhow::Result<Measurement> {
        let mut conn = self.state.conn().await?;
        let session_id = new.session_id.to_string();
        let finger_name = new.finger_name.map(|f| f.name());
        let created_at = format_timestamp(new.created_at)?;
        let attempts_count = i64::from(new.attempts_count);

        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO measurement (
                session_id, client_id, event_type, finger_name, size_eu, size_us, diameter_mm,
                detection_mode, device_model, session_duration_seconds, attempts_count, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id"#,
        )
        .bind(&session_id)
        .bind(&new.client_id)
        .bind(new.event_type.as_str())
        .bind(finger_name)
        .bind(new.size_eu)
        .bind(new.size_us)
        .bind(new.diameter_mm)
        .bind(new.detection_mode.label())
        .bind(&new.device_model)
        .bind(new.session_duration_seconds)
        .bind(attempts_count)
        .bind(&created_at)
        .fetch_one(&mut **conn)
        .await
        .with_context(|| format!("Failed to store {} event for {}", new.event_type.as_str(), new.client_id))?;

        Ok(Measurement {
            id,
            session_id: new.session_id,
            client_id: new.client_id,
            event_type: new.event_type,
            finger_name: new.finger_name,
            size_eu: new.size_eu,
            size_us: new.size_us,
            diameter_mm: new.diameter_mm,
            detection_mode: new.detection_mode,
            device_model: new.device_model,
            session_duration_seconds: new.session_duration_seconds,
            attempts_count: new.attempts_count,
            created_at: new.created_at,
            _guard: (),
        })
    }
}

impl MeasurementRepository for MeasurementDb {
    async fn add_measurement(&self, measurement: NewMeasurement) -> anyhow::Result<Measurement> {
        self.insert(measurement).await
    }

    async fn get_measurements(&self) -> anyhow::Result<Vec<Measurement>> {
        let mut conn = self.state.conn().await?;
        sqlx::query_as::<_, MeasurementRow>(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))
            .fetch_all(&mut **conn)
            .await?
            .into_iter()
            .map(Measurement::try_from)
            .collect()
    }

    async fn get_client_measurements(&self, client_id: &str) -> anyhow::Result<Vec<Measurement>> {
        let mut conn = self.state.conn().await?;
        sqlx::query_as::<_, MeasurementRow>(&format!(
            "{} WHERE client_id = $1 ORDER BY id ASC",
            SELECT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&mut **conn)
        .await?
        .into_iter()
        .map(Measurement::try_from)
        .collect()
    }

    async fn export_csv(&self, path: &Path) -> anyhow::Result<usize> {
        let records = self.get_measurements().await?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {:?}", path))?;
        write_csv(BufWriter::new(file), &records)
            .with_context(|| format!("Failed to export {:?} to {:?}", self.state.db_file(), path))?;
        Ok(records.len())
    }
}
