//! Last known position of every registered vehicle.
//!
//! Backed by `DashMap`: readers of different keys never block each other and a
//! write to a key excludes concurrent access to that key only. Every mutation
//! is visible to all readers once the call returns.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;
use crate::models::error::RegistryError;
use crate::models::position::Point;

/// Radius (m) of the area whose potholes are pushed to a vehicle.
pub const UPDATE_RANGE: f64 = 700.0;
/// Radius (m) the vehicle may still cover before the pushed area runs out.
pub const TRIGGER_RANGE: f64 = 500.0;

pub struct LocationRegistry {
    locations: DashMap<String, Point>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self { locations: DashMap::new() }
    }

    pub fn register(&self, point: Point) -> Result<String, RegistryError> {
        self.insert(Uuid::new_v4().to_string(), point)
    }

    fn insert(&self, vehicle_id: String, point: Point) -> Result<String, RegistryError> {
        match self.locations.entry(vehicle_id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateId(vehicle_id)),
            Entry::Vacant(entry) => {
                entry.insert(point);
                info!(vehicle_id = %vehicle_id, "registered vehicle");
                Ok(vehicle_id)
            }
        }
    }

    pub fn update_location(&self, vehicle_id: &str, point: Point) -> Result<(), RegistryError> {
        let mut entry = self.locations.get_mut(vehicle_id)
            .ok_or_else(|| RegistryError::UnknownVehicle(vehicle_id.to_string()))?;
        *entry = point;
        Ok(())
    }

    pub fn current_location(&self, vehicle_id: &str) -> Option<Point> {
        self.locations.get(vehicle_id).map(|entry| *entry)
    }

    /// True once `candidate` is at least `UPDATE_RANGE - TRIGGER_RANGE` meters
    /// away from the stored baseline of `vehicle_id`.
    pub fn should_trigger(&self, vehicle_id: &str, candidate: &Point) -> Result<bool, RegistryError> {
        let baseline = self.current_location(vehicle_id)
            .ok_or_else(|| RegistryError::UnknownVehicle(vehicle_id.to_string()))?;
        let distance = baseline.distance_m(candidate);
        debug!(vehicle_id, distance, "distance from last baseline");
        Ok(distance >= UPDATE_RANGE - TRIGGER_RANGE)
    }

    pub fn deregister(&self, vehicle_id: &str) {
        if self.locations.remove(vehicle_id).is_some() {
            info!(vehicle_id, "deregistered vehicle");
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
