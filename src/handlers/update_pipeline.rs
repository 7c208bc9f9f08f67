use tokio::sync::mpsc;
use tracing::{error, info};
use crate::models::position::Pothole;
use crate::models::updates::{Vehicle, VehicleUpdate};

/// Splits each vehicle update into its discovered potholes and its location
/// and hands them to the persister and the proximity trigger.
pub struct UpdatePipeline {
    detections: mpsc::Sender<Pothole>,
    locations: mpsc::Sender<Vehicle>,
}

impl UpdatePipeline {
    pub fn new(detections: mpsc::Sender<Pothole>, locations: mpsc::Sender<Vehicle>) -> Self {
        Self { detections, locations }
    }

    pub async fn run_actor(self, mut updates: mpsc::Receiver<VehicleUpdate>) {
        info!("Starting update pipeline");
        while let Some(update) = updates.recv().await {
            self.submit(update).await;
        }
        info!("Update channel closed, update pipeline stopped");
    }

    /// Returns once both stages have accepted their part of `update`, so a
    /// slow stage holds back the next update.
    pub async fn submit(&self, update: VehicleUpdate) {
        let VehicleUpdate { vehicle, discovered } = update;

        let (detection_tx, location_tx) = (&self.detections, &self.locations);

        let detections = async move {
            for pothole in discovered {
                if detection_tx.send(pothole).await.is_err() {
                    error!("detection channel closed, dropping discovered potholes");
                    break;
                }
            }
        };
        let location = async move {
            if let Err(e) = location_tx.send(vehicle).await {
                error!(vehicle_id = %e.0.id, "location channel closed, dropping location update");
            }
        };

        tokio::join!(detections, location);
    }
}
