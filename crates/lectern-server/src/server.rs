//! Development and preview server implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::{ServeDir, ServeFile};

use lectern_static::{BuildConfig, StaticBuilder};

use crate::watcher::FileWatcher;
use crate::websocket::{
    reload_client_script, ReloadHub, ReloadMessage, RELOAD_PATH, RELOAD_SCRIPT_PATH,
};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site build settings
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 4321,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {0}: {1}")]
    BindError(String, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Server error: {0}")]
    ServeError(String),
}

/// Shared server state.
struct ServerState {
    hub: ReloadHub,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build the site, then serve it and rebuild on every change.
    pub async fn start(self) -> Result<(), ServerError> {
        let mut build = self.config.build.clone();
        build.live_reload = Some(RELOAD_SCRIPT_PATH.to_string());

        let builder = Arc::new(StaticBuilder::new(build));
        let hub = ReloadHub::new();

        rebuild(&builder, &hub).await;

        let config = builder.config();
        let watch_paths: Vec<PathBuf> = std::iter::once(&config.docs_dir)
            .chain(config.public_dir.as_ref())
            .chain(config.styles.iter())
            .map(|p| absolute(p))
            .collect();
        let ignored = vec![absolute(&config.output_dir)];

        let (watcher, mut rx) = FileWatcher::new(&watch_paths, &ignored)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let watch_builder = Arc::clone(&builder);
        let watch_hub = hub.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::info!("Changed: {}", event.path().display());

                // Coalesce everything that queued up during the last build
                while rx.try_recv().is_ok() {}

                rebuild(&watch_builder, &watch_hub).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = Router::new()
            .route(RELOAD_PATH, get(ws_handler))
            .route(RELOAD_SCRIPT_PATH, get(reload_script_handler))
            .with_state(Arc::new(ServerState { hub }))
            .merge(site_router(&config.output_dir, &config.base_url));

        serve(
            app,
            &self.config.host,
            self.config.port,
            &config.base_url,
            self.config.open,
        )
        .await
    }
}

/// Rebuild the site and tell connected browsers about the outcome.
///
/// Returns whether the build succeeded. Failures are logged, never fatal.
pub async fn rebuild(builder: &StaticBuilder, hub: &ReloadHub) -> bool {
    match builder.build().await {
        Ok(result) => {
            tracing::info!(
                "Built {} pages in {}ms",
                result.pages,
                result.duration_ms
            );
            tracing::debug!("Reloading {} connected browser(s)", hub.subscriber_count());
            hub.send(ReloadMessage::Reload);
            true
        }
        Err(e) => {
            tracing::error!("Build failed: {}", e);
            hub.send(ReloadMessage::BuildFailed {
                message: e.to_string(),
            });
            false
        }
    }
}

/// Router serving a built site under its base URL.
///
/// Unknown paths get the site's `404.html`.
pub fn site_router(output_dir: &Path, base_url: &str) -> Router {
    let files = ServeDir::new(output_dir)
        .not_found_service(ServeFile::new(output_dir.join("404.html")));

    let prefix = base_url.trim_end_matches('/');
    if prefix.is_empty() {
        return Router::new().fallback_service(files);
    }

    let target = base_url.to_string();
    Router::new()
        .route(
            "/",
            get(move || {
                let target = target.clone();
                async move { Redirect::temporary(&target) }
            }),
        )
        .nest_service(prefix, files)
}

/// Bind `host:port` and serve `app` until shutdown.
pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
    base_url: &str,
    open_browser: bool,
) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| ServerError::BindError(format!("{}:{}", host, port), e.to_string()))?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::BindError(format!("{}:{}", host, port), e.to_string()))?;

    let url = format!("http://{}{}", addr, base_url);
    tracing::info!("Serving at {}", url);

    if open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::ServeError(e.to_string()))
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one browser until it goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    if send_message(&mut socket, &ReloadMessage::Connected)
        .await
        .is_err()
    {
        return;
    }

    loop {
        match rx.recv().await {
            Ok(msg) => {
                if send_message(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Live reload client skipped {} messages", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Handler for the live reload client script.
async fn reload_script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        reload_client_script(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn build_config(root: &Path) -> BuildConfig {
        BuildConfig {
            docs_dir: root.join("docs"),
            output_dir: root.join("dist"),
            ..Default::default()
        }
    }

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());

        assert_eq!(server.config.port, 4321);
        assert_eq!(server.config.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn rebuild_broadcasts_reload() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(
            temp.path().join("docs/index.md"),
            "---\ntitle: Home\ndescription: Start here\n---\nHello\n",
        )
        .unwrap();
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        let ok = rebuild(&StaticBuilder::new(build_config(temp.path())), &hub).await;

        assert!(ok);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(rx.try_recv().unwrap(), ReloadMessage::Reload);
        assert!(temp.path().join("dist/index.html").exists());
    }

    #[tokio::test]
    async fn rebuild_reports_failures() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/index.md"), "no frontmatter").unwrap();
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        let ok = rebuild(&StaticBuilder::new(build_config(temp.path())), &hub).await;

        assert!(!ok);
        match rx.try_recv().unwrap() {
            ReloadMessage::BuildFailed { message } => assert!(message.contains("index.md")),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn builds_site_routers() {
        let temp = tempdir().unwrap();

        let _root = site_router(temp.path(), "/");
        let _nested = site_router(temp.path(), "/docs/");
    }
}
