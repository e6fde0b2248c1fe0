// src/server.rs

//! Development server: static files from the output root plus a live-reload
//! WebSocket fed by the [`ReloadHub`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::fs;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::reload::{ReloadEvent, ReloadHub};

/// WebSocket endpoint the injected client connects to.
pub const LIVERELOAD_PATH: &str = "/__livereload";

const LIVERELOAD_SCRIPT: &str = r##"<script>
(() => {
  const proto = location.protocol === "https:" ? "wss" : "ws";
  const connect = () => {
    const ws = new WebSocket(`${proto}://${location.host}/__livereload`);
    ws.onmessage = (event) => {
      if (event.data === "css") {
        document.querySelectorAll('link[rel="stylesheet"]').forEach((link) => {
          const url = new URL(link.href);
          url.searchParams.set("_lr", Date.now());
          link.href = url.toString();
        });
      } else {
        location.reload();
      }
    };
    ws.onclose = () => setTimeout(connect, 1000);
  };
  connect();
})();
</script>
"##;

#[derive(Clone)]
struct AppState {
    output_root: Arc<PathBuf>,
    hub: ReloadHub,
}

/// Router serving `output_root` with live reload.
pub fn router(output_root: impl Into<PathBuf>, hub: ReloadHub) -> Router {
    let state = AppState {
        output_root: Arc::new(output_root.into()),
        hub,
    };

    Router::new()
        .route(LIVERELOAD_PATH, get(livereload))
        .fallback(serve_static)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` (`host:port`). Split from [`serve_on`] so a taken port fails
/// the command before the first build starts.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))
}

/// Serve on an already bound listener.
pub async fn serve_on(
    listener: TcpListener,
    output_root: impl Into<PathBuf>,
    hub: ReloadHub,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("serving at http://{addr}");
    }
    axum::serve(listener, router(output_root, hub))
        .await
        .context("server error")?;
    Ok(())
}

async fn livereload(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| forward_reloads(socket, rx))
}

async fn forward_reloads(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadEvent>) {
    debug!("live-reload client connected");
    loop {
        tokio::select! {
            recv = rx.recv() => {
                match recv {
                    Ok(event) => {
                        if socket.send(Message::Text(event.as_message().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    // Missed events collapse into one full reload.
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        let msg = ReloadEvent::Full.as_message();
                        if socket.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
    debug!("live-reload client disconnected");
}

async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve_request_path(&state.output_root, uri.path()) else {
        return (StatusCode::BAD_REQUEST, "Bad request path").into_response();
    };

    let path = if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        path.join("index.html")
    } else {
        path
    };

    match fs::read(&path).await {
        Ok(content) => {
            let content_type = content_type_for_path(&path);
            let body = if content_type.starts_with("text/html") {
                Body::from(inject_livereload(&String::from_utf8_lossy(&content)))
            } else {
                Body::from(content)
            };
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Map a request path onto the output root. `None` if it tries to escape.
fn resolve_request_path(root: &Path, request: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in request.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\\') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            _ => return None,
        }
    }
    Some(path)
}

/// Insert the client script before the last `</body>`, or append it.
fn inject_livereload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + LIVERELOAD_SCRIPT.len());
            out.push_str(&html[..idx]);
            out.push_str(LIVERELOAD_SCRIPT);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{LIVERELOAD_SCRIPT}"),
    }
}

fn content_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}
