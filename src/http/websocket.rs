//! Live event stream over WebSocket.
//!
//! # Data Flow
//! ```text
//! EventBus ──→ events() ──→ JSON text frames ──→ Client
//! ```
//!
//! The first frame is a `snapshot` of the wallet state; every later frame
//! is one `AppEvent`. The stream ends on client close or server shutdown.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::http::server::AppState;

pub async fn events(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, state))
}

async fn stream_events(socket: WebSocket, state: AppState) {
    // Subscribe before taking the snapshot so no change slips between them.
    let mut events = state.app.events().subscribe();
    let mut shutdown = state.shutdown.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let hello = json!({
        "type": "snapshot",
        "wallet": state.app.wallet().snapshot(),
    });
    if send_json(&mut sender, &hello).await.is_err() {
        return;
    }
    tracing::debug!("Event stream opened");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if send_json(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = shutdown.recv() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    tracing::debug!("Event stream closed");
}

async fn send_json<S, T>(sender: &mut S, value: &T) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
    T: Serialize,
{
    let text = serde_json::to_string(value).map_err(|_| ())?;
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}
