use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use crate::models::error::StoreError;
use crate::models::position::Pothole;
use crate::store::PotholeStore;

/// Positional uncertainty attached to every reported pothole, in meters.
pub const ERROR_RANGE_M: f64 = 3.0;

pub struct PotholePersister {
    store: Arc<dyn PotholeStore>,
}

impl PotholePersister {
    pub fn new(store: Arc<dyn PotholeStore>) -> Self {
        Self { store }
    }

    pub async fn run_actor(self, mut detections: mpsc::Receiver<Pothole>) {
        info!("Starting pothole persister");
        while let Some(pothole) = detections.recv().await {
            self.persist(pothole).await;
        }
        info!("Detection channel closed, pothole persister stopped");
    }

    /// Store failures are logged and the report is dropped.
    pub async fn persist(&self, pothole: Pothole) {
        match self.store.insert(pothole, ERROR_RANGE_M).await {
            Ok(()) => debug!(latitude = pothole.latitude, longitude = pothole.longitude, "recorded pothole"),
            Err(e @ StoreError::Duplicate { .. }) => warn!("{}", e),
            Err(e) => error!(latitude = pothole.latitude, longitude = pothole.longitude,
                             "could not create pothole record: {}", e),
        }
    }
}
