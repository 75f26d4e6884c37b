use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
};

use crate::handlers::WebSockets;
use crate::models::RoomRegistry;

pub struct Handle {}

impl Handle {
    pub async fn websocket(
        ws: WebSocketUpgrade,
        State(registry): State<RoomRegistry>,
    ) -> impl IntoResponse {
        ws.on_upgrade(|socket| async move { WebSockets::new(socket, registry).await })
    }

    pub async fn health() -> &'static str {
        "ok"
    }
}
