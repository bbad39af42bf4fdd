//! Development server with live reload for lectern docs.
//!
//! Rebuilds the site whenever an input changes and tells connected browsers
//! to reload over a WebSocket. Also serves already built sites for preview.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{rebuild, serve, site_router, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{ReloadHub, ReloadMessage, RELOAD_PATH, RELOAD_SCRIPT_PATH};
