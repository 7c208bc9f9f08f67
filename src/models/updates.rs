use serde::{Deserialize, Serialize};
use crate::models::position::{Point, Pothole};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub location: Point,
}

/// One inbound vehicle message: where the vehicle is and what it found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleUpdate {
    pub vehicle: Vehicle,
    pub discovered: Vec<Pothole>,
}

/// Push `point` to the vehicle `vehicle_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub vehicle_id: String,
    pub point: Pothole,
}

// Wire frames

pub mod inbound {
    use serde::Deserialize;
    use crate::models::position::Point;
    use super::{Vehicle, VehicleUpdate};

    #[derive(Deserialize, Debug)]
    pub struct RegisterVehicle {
        pub start_location: Point,
        pub listening_at: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct LocationUpdate {
        pub location: Point,
        #[serde(default)]
        pub potholes: Vec<Point>,
    }

    impl LocationUpdate {
        pub fn into_vehicle_update(self, vehicle_id: String) -> VehicleUpdate {
            VehicleUpdate {
                vehicle: Vehicle { id: vehicle_id, location: self.location },
                discovered: self.potholes,
            }
        }
    }
}

pub mod outbound {
    use serde::Serialize;
    use crate::models::position::Point;

    #[derive(Serialize, Debug)]
    pub struct VehicleRegistered {
        pub vehicle_id: String,
    }

    #[derive(Serialize, Debug)]
    pub struct UpcomingPothole {
        pub pothole: Point,
    }
}
