use std::sync::Mutex;

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use crate::core::db::{MeasurementDb, NewMeasurement};

/// Fire-and-forget persistence. Implementations must never block the caller
/// or report failures back to it.
pub trait MeasurementSink {
    fn submit(&self, record: NewMeasurement);
}

/// Sink that drops every record
#[derive(Debug, Default)]
pub struct NullSink;

impl MeasurementSink for NullSink {
    fn submit(&self, record: NewMeasurement) {
        debug!("Discarding {} record for {}", record.event_type.as_str(), record.client_id);
    }
}

/// Writes records to a [`MeasurementDb`] on the tokio runtime.
pub struct DbSink {
    db: MeasurementDb,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl DbSink {
    /// Must be called from within a tokio runtime
    pub fn new(db: MeasurementDb) -> anyhow::Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("DbSink needs a tokio runtime: {}", e))?;
        Ok(Self {
            db,
            runtime,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Wait for every submitted write to finish
    pub async fn flush(&self) {
        let handles: Vec<_> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Measurement write task failed: {}", e);
            }
        }
    }
}

impl MeasurementSink for DbSink {
    fn submit(&self, record: NewMeasurement) {
        let db = self.db.clone();
        let handle = self.runtime.spawn(async move {
            match db.insert(record).await {
                Ok(stored) => debug!(
                    "Stored {} record #{} for {}",
                    stored.event_type.as_str(),
                    stored.id,
                    stored.client_id
                ),
                Err(e) => warn!("Failed to persist measurement: {:#}", e),
            }
        });
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}
