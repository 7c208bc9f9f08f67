use std::sync::Arc;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tokio::sync::mpsc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{debug, error, info, warn};
use crate::handlers::pothole_notifier::Registrations;
use crate::models::position::Point;
use crate::models::updates::inbound::{LocationUpdate, RegisterVehicle};
use crate::models::updates::outbound::VehicleRegistered;
use crate::models::updates::VehicleUpdate;
use crate::registry::LocationRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<LocationRegistry>,
    pub registrations: Registrations,
    pub updates: mpsc::Sender<VehicleUpdate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/vehicles", post(register_vehicle))
        .route("/vehicles/:vehicle_id", delete(deregister_vehicle))
        .route("/vehicles/:vehicle_id/location", get(vehicle_location))
        .route("/ws/:vehicle_id/updates", get(updates_ws_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state)
}

async fn register_vehicle(
    State(state): State<AppState>,
    Json(request): Json<RegisterVehicle>,
) -> Result<Json<VehicleRegistered>, (StatusCode, String)> {
    let vehicle_id = state.registry.register(request.start_location).map_err(|e| {
        error!("cannot save new vehicle: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "cannot save new vehicle".to_string())
    })?;
    state.registrations.register_address(vehicle_id.clone(), request.listening_at);
    Ok(Json(VehicleRegistered { vehicle_id }))
}

async fn deregister_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> StatusCode {
    state.registry.deregister(&vehicle_id);
    StatusCode::NO_CONTENT
}

async fn vehicle_location(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<Point>, StatusCode> {
    state.registry.current_location(&vehicle_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn updates_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| receive_updates(socket, vehicle_id, state.updates))
}

/// Reads the next frame only after the previous update entered the pipeline.
async fn receive_updates(mut socket: WebSocket, vehicle_id: String, updates: mpsc::Sender<VehicleUpdate>) {
    info!(vehicle_id = %vehicle_id, "vehicle started streaming updates");
    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<LocationUpdate>(&text) {
                Ok(frame) => {
                    if updates.send(frame.into_vehicle_update(vehicle_id.clone())).await.is_err() {
                        error!("update pipeline is gone, closing socket of {}", vehicle_id);
                        return;
                    }
                }
                Err(e) => warn!(vehicle_id = %vehicle_id, "malformed location update: {}", e),
            },
            Ok(Message::Close(_)) => break,
            Ok(other) => debug!("Ignoring frame from {}: {:?}", vehicle_id, other),
            Err(e) => {
                warn!(vehicle_id = %vehicle_id, "could not read update stream: {}", e);
                return;
            }
        }
    }
    info!(vehicle_id = %vehicle_id, "vehicle closed its update stream");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use super::*;

    fn state() -> (AppState, mpsc::Receiver<VehicleUpdate>) {
        let (updates, rx) = mpsc::channel(1);
        let state = AppState {
            registry: Arc::new(LocationRegistry::new()),
            registrations: Registrations::new(),
            updates,
        };
        (state, rx)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn register_records_location_and_address() {
        let (state, _rx) = state();
        let app = router(state.clone());

        let response = app
            .oneshot(Request::builder()
                .method("POST")
                .uri("/vehicles")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"start_location":{"latitude":43.1,"longitude":-77.6},"listening_at":"ws://10.0.0.7:9000"}"#))
                .unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let vehicle_id = body["vehicle_id"].as_str().unwrap();
        assert_eq!(state.registry.current_location(vehicle_id), Some(Point::new(43.1, -77.6)));
        assert_eq!(state.registrations.pending(vehicle_id), Some("ws://10.0.0.7:9000".to_string()));
    }

    #[tokio::test]
    async fn malformed_registration_is_rejected() {
        let (state, _rx) = state();
        let response = router(state.clone())
            .oneshot(Request::builder()
                .method("POST")
                .uri("/vehicles")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"listening_at":"ws://10.0.0.7:9000"}"#))
                .unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn location_lookup_and_deregistration() {
        let (state, _rx) = state();
        let id = state.registry.register(Point::new(43.1, -77.6)).unwrap();

        let response = router(state.clone())
            .oneshot(Request::builder().uri(format!("/vehicles/{}/location", id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"latitude": 43.1, "longitude": -77.6}));

        for _ in 0..2 {
            let response = router(state.clone())
                .oneshot(Request::builder().method("DELETE").uri(format!("/vehicles/{}", id)).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = router(state)
            .oneshot(Request::builder().uri(format!("/vehicles/{}/location", id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
