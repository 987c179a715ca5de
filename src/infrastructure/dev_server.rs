use crate::core::models::DevServerOptions;
use crate::utils::{Logger, MusubiError, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

/// Script injected into served pages; reloads on a "reload" notification.
const RELOAD_CLIENT_JS: &str = r#"(function() {
  var socket = new WebSocket('ws://' + location.host + '/__musubi/reload');
  socket.onmessage = function(event) {
    if (event.data === 'reload') {
      location.reload();
    }
  };
  socket.onclose = function() {
    console.log('[musubi] live reload disconnected');
  };
})();"#;

#[derive(Clone)]
pub struct ServerState {
    static_dir: PathBuf,
    reload_tx: broadcast::Sender<String>,
    clients: Arc<DashMap<String, Instant>>,
}

/// Static file server for built output with gzip compression and live
/// reload over a WebSocket endpoint.
pub struct DevServer {
    options: DevServerOptions,
    state: ServerState,
}

impl DevServer {
    pub fn new(options: DevServerOptions, reload_tx: broadcast::Sender<String>) -> Self {
        let state = ServerState {
            static_dir: options.static_dir.clone(),
            reload_tx,
            clients: Arc::new(DashMap::new()),
        };
        Self { options, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.options)
    }

    /// Bind the configured port and serve until the process exits.
    pub async fn serve(&self) -> Result<()> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.options.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| MusubiError::build(format!("failed to bind {}: {}", addr, e)))?;

        Logger::serving(&addr.to_string(), &self.options.static_dir.display().to_string());

        axum::serve(listener, self.router())
            .await
            .map_err(MusubiError::Io)?;
        Ok(())
    }
}

pub fn build_router(state: ServerState, options: &DevServerOptions) -> Router {
    let router = Router::new()
        .route("/", get(serve_index))
        .route("/__musubi/reload", get(reload_socket))
        .fallback_service(ServeDir::new(&options.static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    if options.compress {
        router.layer(CompressionLayer::new())
    } else {
        router
    }
}

/// Serve index.html with the live reload client injected.
async fn serve_index(State(state): State<ServerState>) -> Response {
    let index_path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => Html(inject_reload_client(&html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

async fn reload_socket(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_reload_client(socket, state))
}

async fn handle_reload_client(mut socket: WebSocket, state: ServerState) {
    let client_id = Uuid::new_v4().to_string();
    state.clients.insert(client_id.clone(), Instant::now());
    Logger::debug(&format!("Live reload client {} connected", client_id));

    let mut reload_rx = state.reload_tx.subscribe();

    loop {
        tokio::select! {
            notification = reload_rx.recv() => {
                match notification {
                    Ok(message) => {
                        if socket.send(Message::Text(message.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Ignore pings and client chatter
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    state.clients.remove(&client_id);
    Logger::debug(&format!("Live reload client {} disconnected", client_id));
}

fn inject_reload_client(html: &str) -> String {
    let script = format!("<script>{}</script>", RELOAD_CLIENT_JS);
    if let Some(pos) = html.find("</head>") {
        let mut out = String::with_capacity(html.len() + script.len());
        out.push_str(&html[..pos]);
        out.push_str(&script);
        out.push_str(&html[pos..]);
        out
    } else {
        format!("{}{}", html, script)
    }
}
