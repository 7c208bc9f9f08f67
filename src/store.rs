//! Pothole persistence.
//!
//! The pipeline only depends on [`PotholeStore`]; [`InMemoryPotholeStore`] is
//! the implementation the binary runs with.

use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::models::error::StoreError;
use crate::models::position::{Point, Pothole};

#[async_trait]
pub trait PotholeStore: Send + Sync {
    /// Records `point`. Fails with [`StoreError::Duplicate`] when a known
    /// pothole already lies within `uncertainty_m` of it.
    async fn insert(&self, point: Point, uncertainty_m: f64) -> Result<(), StoreError>;

    /// All potholes within `radius_m` of `point`, nearest first.
    async fn find_near(&self, point: Point, radius_m: f64) -> Result<Vec<Pothole>, StoreError>;
}

pub struct InMemoryPotholeStore {
    potholes: RwLock<Vec<Pothole>>,
}

impl InMemoryPotholeStore {
    pub fn new() -> Self {
        Self { potholes: RwLock::new(Vec::new()) }
    }

    pub async fn len(&self) -> usize {
        self.potholes.read().await.len()
    }
}

impl Default for InMemoryPotholeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PotholeStore for InMemoryPotholeStore {
    async fn insert(&self, point: Point, uncertainty_m: f64) -> Result<(), StoreError> {
        let mut potholes = self.potholes.write().await;
        if potholes.iter().any(|known| known.distance_m(&point) <= uncertainty_m) {
            return Err(StoreError::Duplicate { latitude: point.latitude, longitude: point.longitude });
        }
        potholes.push(point);
        Ok(())
    }

    async fn find_near(&self, point: Point, radius_m: f64) -> Result<Vec<Pothole>, StoreError> {
        let potholes = self.potholes.read().await;
        let mut found: Vec<(f64, Pothole)> = potholes.iter()
            .map(|p| (point.distance_m(p), *p))
            .filter(|(d, _)| *d <= radius_m)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(found.into_iter().map(|(_, p)| p).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_rejects_points_within_uncertainty() {
        let store = InMemoryPotholeStore::new();
        let p = Point::new(43.1, -77.6);
        store.insert(p, 3.0).await.unwrap();
        // ~1.1 m north
        let near = Point::new(43.10001, -77.6);
        assert!(matches!(store.insert(near, 3.0).await, Err(StoreError::Duplicate { .. })));
        // ~11 m north
        store.insert(Point::new(43.1001, -77.6), 3.0).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn find_near_orders_by_distance_and_filters_radius() {
        let store = InMemoryPotholeStore::new();
        let center = Point::new(43.1, -77.6);
        let far = Point::new(43.1, -77.605);     // ~406 m
        let near = Point::new(43.1, -77.601);    // ~81 m
        let outside = Point::new(43.1, -77.61);  // ~812 m
        for p in [far, outside, near] {
            store.insert(p, 3.0).await.unwrap();
        }
        let found = store.find_near(center, 700.0).await.unwrap();
        assert_eq!(found, vec![near, far]);
    }

    #[tokio::test]
    async fn find_near_on_empty_store() {
        let store = InMemoryPotholeStore::new();
        assert!(store.find_near(Point::new(0.0, 0.0), 700.0).await.unwrap().is_empty());
    }
}
