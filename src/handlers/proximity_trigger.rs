use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use crate::models::error::TriggerError;
use crate::models::updates::{Notification, Vehicle};
use crate::registry::{LocationRegistry, UPDATE_RANGE};
use crate::store::PotholeStore;

/// Re-pushes the surrounding potholes once a vehicle has moved far enough
/// from the point where it last received them.
pub struct ProximityTrigger {
    registry: Arc<LocationRegistry>,
    store: Arc<dyn PotholeStore>,
    notifications: mpsc::Sender<Notification>,
}

impl ProximityTrigger {
    pub fn new(registry: Arc<LocationRegistry>,
               store: Arc<dyn PotholeStore>,
               notifications: mpsc::Sender<Notification>) -> Self {
        Self { registry, store, notifications }
    }

    pub async fn run_actor(self, mut locations: mpsc::Receiver<Vehicle>) {
        info!("Starting proximity trigger");
        while let Some(vehicle) = locations.recv().await {
            if let Err(e) = self.process(&vehicle).await {
                error!(vehicle_id = %vehicle.id,
                       latitude = vehicle.location.latitude,
                       longitude = vehicle.location.longitude,
                       "could not process location update: {}", e);
            }
        }
        info!("Location channel closed, proximity trigger stopped");
    }

    /// Returns how many notifications were emitted.
    ///
    /// The baseline only moves after the store answered, so a failed query is
    /// re-evaluated against the old baseline on the next update.
    pub async fn process(&self, vehicle: &Vehicle) -> Result<usize, TriggerError> {
        if !self.registry.should_trigger(&vehicle.id, &vehicle.location)? {
            return Ok(0);
        }

        let potholes = self.store.find_near(vehicle.location, UPDATE_RANGE).await?;
        self.registry.update_location(&vehicle.id, vehicle.location)?;
        debug!(vehicle_id = %vehicle.id, count = potholes.len(), "pushing nearby potholes");

        let count = potholes.len();
        for point in potholes {
            self.notifications
                .send(Notification { vehicle_id: vehicle.id.clone(), point })
                .await
                .map_err(|_| TriggerError::NotifierClosed)?;
        }
        Ok(count)
    }
}
