//! Per-vehicle outbound notification channels.
//!
//! A vehicle is in exactly one of the states of [`SubscriberState`]. The
//! pending callback address lives in [`Registrations`], which is shared with
//! the registration path; live connections are owned by the notifier task and
//! never touched from anywhere else.
//!
//! ```text
//!  register_address        first notification          delivery failure
//! ──────────────────► Pending ──────────────► Connected ─────────────────► Unregistered
//!                       │  connect failure      │  delivered
//!                       └──► Pending            └──► Connected
//! ```
//!
//! A vehicle whose first delivery fails has already lost its pending address
//! and stays unregistered until it registers again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use crate::models::error::ConnectionError;
use crate::models::updates::Notification;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectionError>;
}

#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&mut self, notification: &Notification) -> Result<(), ConnectionError>;
    async fn close(&mut self);
}

pub enum SubscriberState {
    Unregistered,
    Pending { address: String },
    Connected { connection: Box<dyn Connection> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Nothing to deliver to: no address known, or connecting failed.
    Dropped,
    /// Sent over a connection that turned out to be broken; it was torn down.
    Failed,
}

/// Callback addresses of vehicles that have not been connected yet.
#[derive(Clone, Default)]
pub struct Registrations {
    addresses: Arc<DashMap<String, String>>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later calls overwrite the pending address.
    pub fn register_address(&self, vehicle_id: String, address: String) {
        info!(vehicle_id = %vehicle_id, address = %address, "registered callback address");
        self.addresses.insert(vehicle_id, address);
    }

    pub fn pending(&self, vehicle_id: &str) -> Option<String> {
        self.addresses.get(vehicle_id).map(|address| address.clone())
    }

    /// Drops the record, unless it was replaced by a newer address meanwhile.
    fn consume(&self, vehicle_id: &str, address: &str) {
        self.addresses.remove_if(vehicle_id, |_, pending| pending == address);
    }
}

pub struct PotholeNotifier {
    registrations: Registrations,
    connections: HashMap<String, Box<dyn Connection>>,
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
}

impl PotholeNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>, registrations: Registrations, timeout: Duration) -> Self {
        Self {
            registrations,
            connections: HashMap::new(),
            sink,
            timeout,
        }
    }

    /// Handles notifications strictly one at a time, for all vehicles.
    pub async fn run_actor(mut self, mut notifications: mpsc::Receiver<Notification>) {
        info!("Starting pothole notifier");
        while let Some(notification) = notifications.recv().await {
            self.notify(notification).await;
        }

        info!("Notification channel closed, closing {} connection(s)", self.connections.len());
        for (_, mut connection) in self.connections.drain() {
            timeout(self.timeout, connection.close()).await.ok();
        }
    }

    /// Takes the vehicle's connection out of the map if it has one; the caller
    /// puts it back after a successful delivery.
    fn take_state(&mut self, vehicle_id: &str) -> SubscriberState {
        if let Some(connection) = self.connections.remove(vehicle_id) {
            SubscriberState::Connected { connection }
        } else if let Some(address) = self.registrations.pending(vehicle_id) {
            SubscriberState::Pending { address }
        } else {
            SubscriberState::Unregistered
        }
    }

    pub async fn notify(&mut self, notification: Notification) -> Delivery {
        debug!(vehicle_id = %notification.vehicle_id,
               latitude = notification.point.latitude,
               longitude = notification.point.longitude,
               "sending pothole");

        match self.take_state(&notification.vehicle_id) {
            SubscriberState::Unregistered => {
                warn!(vehicle_id = %notification.vehicle_id, "no connection or address known, dropping notification");
                Delivery::Dropped
            }
            SubscriberState::Pending { address } => match self.connect(&address).await {
                Ok(connection) => {
                    self.registrations.consume(&notification.vehicle_id, &address);
                    info!(vehicle_id = %notification.vehicle_id, "connected to vehicle");
                    self.deliver(notification, connection).await
                }
                Err(e) => {
                    error!(vehicle_id = %notification.vehicle_id, "{}", e);
                    Delivery::Dropped
                }
            },
            SubscriberState::Connected { connection } => self.deliver(notification, connection).await,
        }
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectionError> {
        timeout(self.timeout, self.sink.connect(address))
            .await
            .unwrap_or(Err(ConnectionError::Timeout("connect")))
    }

    async fn deliver(&mut self, notification: Notification, mut connection: Box<dyn Connection>) -> Delivery {
        let sent = timeout(self.timeout, connection.send(&notification))
            .await
            .unwrap_or(Err(ConnectionError::Timeout("delivery")));

        match sent {
            Ok(()) => {
                self.connections.insert(notification.vehicle_id, connection);
                Delivery::Delivered
            }
            Err(e) => {
                warn!(vehicle_id = %notification.vehicle_id, "failed to send update: {}", e);
                timeout(self.timeout, connection.close()).await.ok();
                Delivery::Failed
            }
        }
    }

    pub fn is_connected(&self, vehicle_id: &str) -> bool {
        self.connections.contains_key(vehicle_id)
    }
}
