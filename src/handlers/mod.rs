pub mod pothole_notifier;
pub mod pothole_persister;
pub mod proximity_trigger;
pub mod update_pipeline;
pub mod websocket_sink;
