use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use crate::handlers::pothole_notifier::{Connection, NotificationSink};
use crate::models::error::ConnectionError;
use crate::models::updates::outbound::UpcomingPothole;
use crate::models::updates::Notification;

/// Dials the `ws://` address a vehicle registered with.
pub struct WebSocketSink;

#[async_trait]
impl NotificationSink for WebSocketSink {
    async fn connect(&self, address: &str) -> Result<Box<dyn Connection>, ConnectionError> {
        let (stream, _) = connect_async(address).await
            .map_err(|e| ConnectionError::Connect { address: address.to_string(), message: e.to_string() })?;
        debug!("Opened notification socket to {}", address);
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, notification: &Notification) -> Result<(), ConnectionError> {
        let payload = serde_json::to_string(&UpcomingPothole { pothole: notification.point })?;
        self.stream.send(Message::Text(payload)).await
            .map_err(|e| ConnectionError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        self.stream.close(None).await.ok();
    }
}
