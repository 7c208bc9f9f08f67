use std::sync::Arc;
use tokio::sync::mpsc;
use crate::config::Config;
use crate::handlers::pothole_notifier::{NotificationSink, PotholeNotifier, Registrations};
use crate::handlers::pothole_persister::PotholePersister;
use crate::handlers::proximity_trigger::ProximityTrigger;
use crate::handlers::update_pipeline::UpdatePipeline;
use crate::registry::LocationRegistry;
use crate::routes::AppState;
use crate::store::PotholeStore;

/// Spawns every pipeline stage, linked by single-slot channels, and returns
/// the handles the ingress needs.
pub fn spawn(config: &Config, store: Arc<dyn PotholeStore>, sink: Arc<dyn NotificationSink>) -> AppState {
    let registry = Arc::new(LocationRegistry::new());
    let registrations = Registrations::new();

    let (update_tx, update_rx) = mpsc::channel(1);
    let (detection_tx, detection_rx) = mpsc::channel(1);
    let (location_tx, location_rx) = mpsc::channel(1);
    let (notification_tx, notification_rx) = mpsc::channel(1);

    tokio::spawn(UpdatePipeline::new(detection_tx, location_tx).run_actor(update_rx));
    tokio::spawn(PotholePersister::new(store.clone()).run_actor(detection_rx));
    tokio::spawn(ProximityTrigger::new(registry.clone(), store, notification_tx).run_actor(location_rx));
    tokio::spawn(PotholeNotifier::new(sink, registrations.clone(), config.notify_timeout).run_actor(notification_rx));

    AppState {
        registry,
        registrations,
        updates: update_tx,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use async_trait::async_trait;
    use crate::handlers::pothole_notifier::Connection;
    use crate::models::error::ConnectionError;
    use crate::models::position::Point;
    use crate::models::updates::{Notification, Vehicle, VehicleUpdate};
    use crate::store::InMemoryPotholeStore;
    use super::*;

    struct ChannelSink(mpsc::Sender<(String, Notification)>);

    struct ChannelConnection {
        address: String,
        delivered: mpsc::Sender<(String, Notification)>,
    }

    #[async_trait]
    impl NotificationSink for ChannelSink {
        async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectionError> {
            Ok(Box::new(ChannelConnection { address: address.to_string(), delivered: self.0.clone() }))
        }
    }

    #[async_trait]
    impl Connection for ChannelConnection {
        async fn send(&mut self, notification: &Notification) -> Result<(), ConnectionError> {
            self.delivered.send((self.address.clone(), notification.clone())).await
                .map_err(|e| ConnectionError::Send(e.to_string()))
        }

        async fn close(&mut self) {}
    }

    fn config() -> Config {
        Config { host: "127.0.0.1".to_string(), port: "0".to_string(), notify_timeout: Duration::from_secs(5) }
    }

    fn update(id: &str, longitude: f64, discovered: Vec<Point>) -> VehicleUpdate {
        VehicleUpdate { vehicle: Vehicle { id: id.to_string(), location: Point::new(43.1, longitude) }, discovered }
    }

    #[tokio::test]
    async fn vehicle_receives_nearby_potholes_after_moving_far_enough() {
        let store = Arc::new(InMemoryPotholeStore::new());
        let known = Point::new(43.1000, -77.6060);
        store.insert(known, 3.0).await.unwrap();

        let (delivered_tx, mut delivered) = mpsc::channel(16);
        let state = spawn(&config(), store.clone(), Arc::new(ChannelSink(delivered_tx)));

        let id = state.registry.register(Point::new(43.1000, -77.6000)).unwrap();
        state.registrations.register_address(id.clone(), "ws://vehicle".to_string());

        let reported = Point::new(43.1000, -77.6010);
        state.updates.send(update(&id, -77.6020, vec![reported])).await.unwrap();
        state.updates.send(update(&id, -77.6050, vec![])).await.unwrap();

        let (address, notification) = tokio::time::timeout(Duration::from_secs(5), delivered.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(address, "ws://vehicle");
        assert_eq!(notification, Notification { vehicle_id: id.clone(), point: known });
        assert_eq!(state.registry.current_location(&id), Some(Point::new(43.1000, -77.6050)));
        assert_eq!(state.registrations.pending(&id), None);

        for _ in 0..100 {
            if store.len().await == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.len().await, 2);
    }
}
