/*!
WebSocket server implementation.

One endpoint, `/ws`. A new connection first receives `sync:init` with the
current snapshot, then every kernel event as it happens. Events raised while
the snapshot is taken may already be reflected in it; every event carries
the full record it touches, so clients can apply such an event again
without harm. Requests are `{"id", "method", "args"}`; responses echo the
`id`.
*/

use axum::{
  extract::{
    ws::{Message, WebSocket, WebSocketUpgrade},
    State,
  },
  response::Response,
  routing::get,
  Router,
};
use nextos_kernel::{Event, Kernel};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

/// Default WebSocket server port.
pub const DEFAULT_WS_PORT: u16 = 3030;
const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// WebSocket state.
#[derive(Clone)]
pub struct WebSocketState {
  kernel: Kernel,
  json_sender: Arc<broadcast::Sender<String>>,
  port: u16,
}

impl std::fmt::Debug for WebSocketState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebSocketState")
      .field("port", &self.port)
      .finish_non_exhaustive()
  }
}

impl WebSocketState {
  /// Create with default port.
  pub fn new(kernel: Kernel) -> Self {
    Self::with_port(kernel, DEFAULT_WS_PORT)
  }

  /// Create with custom port.
  pub fn with_port(kernel: Kernel, port: u16) -> Self {
    let (json_tx, _) = broadcast::channel::<String>(DEFAULT_CHANNEL_CAPACITY);
    Self {
      kernel,
      json_sender: Arc::new(json_tx),
      port,
    }
  }

  pub const fn port(&self) -> u16 {
    self.port
  }
}

/// Serve `/ws` on localhost until `shutdown` resolves.
pub async fn start_server(
  ws_state: WebSocketState,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
  let port = ws_state.port;
  let sender = ws_state.json_sender.clone();
  let mut rx = ws_state.kernel.subscribe();
  tokio::spawn(async move {
    while let Ok(event) = rx.recv().await {
      if let Ok(json) = serde_json::to_string(&event) {
        drop(sender.send(json));
      }
    }
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  let app = Router::new()
    .route("/ws", get(websocket_handler))
    .layer(cors)
    .with_state(ws_state);

  let addr = format!("127.0.0.1:{port}");
  let listener = tokio::net::TcpListener::bind(&addr)
    .await
    .inspect_err(|e| log::error!("Failed to bind WebSocket server to {addr}: {e}"))?;

  log::info!("WebSocket server: ws://{addr}/ws");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await
    .inspect_err(|e| log::error!("WebSocket server failed: {e}"))
}

async fn websocket_handler(
  ws: WebSocketUpgrade,
  State(ws_state): State<WebSocketState>,
) -> Response {
  ws.on_upgrade(|socket| handle_websocket(socket, ws_state))
}

async fn handle_websocket(mut socket: WebSocket, ws_state: WebSocketState) {
  // Subscribe before the snapshot so nothing is missed. Events that follow
  // may repeat state the snapshot already holds.
  let mut rx = ws_state.json_sender.subscribe();

  let event = Event::SyncInit(ws_state.kernel.snapshot());
  if let Ok(msg) = serde_json::to_string(&event) {
    if socket.send(Message::Text(msg)).await.is_err() {
      return;
    }
  }

  loop {
    tokio::select! {
        msg = socket.recv() => {
            match msg {
                Some(Ok(Message::Text(text))) => {
                    let response = handle_request(&text, &ws_state).await;
                    while let Ok(event_json) = rx.try_recv() {
                        drop(socket.send(Message::Text(event_json)).await);
                    }
                    drop(socket.send(Message::Text(response)).await);
                }
                Some(Ok(Message::Close(_))) => {
                    log::debug!("[client] closed connection");
                    break;
                }
                Some(Err(e)) => {
                    log::warn!("WebSocket error: {e}");
                    break;
                }
                None => {
                    log::debug!("[client] disconnected");
                    break;
                }
                _ => {}
            }
        }

        broadcast = rx.recv() => {
            match broadcast {
                Ok(event_json) => {
                    if socket.send(Message::Text(event_json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("[ws] Client lagged, dropped {n} events - client needs resync");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
  }
}

async fn handle_request(request: &str, ws_state: &WebSocketState) -> String {
  let req: Value = match serde_json::from_str(request) {
    Ok(v) => v,
    Err(e) => return json!({ "error": format!("Invalid JSON: {}", e) }).to_string(),
  };

  let id = req.get("id").cloned().unwrap_or(Value::Null);
  let method = req.get("method").and_then(Value::as_str).unwrap_or("");
  let args = req.get("args").cloned().unwrap_or(Value::Null);

  let mut response = crate::rpc::dispatch_json(&ws_state.kernel, method, &args).await;
  if let Some(obj) = response.as_object_mut() {
    obj.insert("id".to_string(), id);
  }
  response.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn request_id_is_echoed() {
    let state = WebSocketState::new(Kernel::default());
    let response = handle_request(
      r#"{"id": 7, "method": "create_window", "args": {"app_id": "a", "title": "A"}}"#,
      &state,
    )
    .await;
    let value: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["id"], 7);
    assert_eq!(value["result"], 1);
  }

  #[tokio::test]
  async fn event_overlapping_snapshot_repeats_its_state() {
    let kernel = Kernel::default();
    let mut rx = kernel.subscribe();
    kernel.windows().create_window("a", "A", None);
    let id = kernel.windows().create_window("b", "B", None);
    let snapshot = kernel.snapshot();

    let mut replayed = snapshot.windows.clone();
    while let Ok(event) = rx.try_recv() {
      if let Event::WindowAdded { window } | Event::WindowChanged { window } = event {
        if let Some(slot) = replayed.iter_mut().find(|w| w.id == window.id) {
          *slot = window;
        }
      }
    }
    assert_eq!(replayed, snapshot.windows);
    assert_eq!(snapshot.focused_window, Some(id));
  }

  #[tokio::test]
  async fn invalid_json_is_reported() {
    let state = WebSocketState::with_port(Kernel::default(), 0);
    let response = handle_request("{not json", &state).await;
    assert!(response.contains("Invalid JSON"));
    assert_eq!(state.port(), 0);
  }
}
