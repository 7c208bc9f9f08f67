use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("vehicle {0} is not registered")]
    UnknownVehicle(String),
    #[error("duplicate vehicle id {0} in location registry")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("possible duplicate pothole at ({latitude}, {longitude})")]
    Duplicate { latitude: f64, longitude: f64 },
    #[error("pothole store failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {address}: {message}")]
    Connect { address: String, message: String },
    #[error("failed to send notification: {0}")]
    Send(String),
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0} timed out")]
    Timeout(&'static str),
}

/// Why a single location update was abandoned by the proximity stage.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("notifier channel closed")]
    NotifierClosed,
}
