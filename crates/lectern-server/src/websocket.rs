//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint browsers connect to.
pub const RELOAD_PATH: &str = "/__lectern/reload";

/// Client script injected into every page in dev mode.
pub const RELOAD_SCRIPT_PATH: &str = "/__lectern/reload.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// The site was rebuilt, reload the page
    Reload,

    /// The last rebuild failed, show the error
    BuildFailed {
        /// Rendered build error
        message: String,
    },
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    /// Create a new reload hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Get the number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side live reload script.
///
/// The socket URL is derived from the page location so the script works
/// behind any host or port the server is bound to.
pub fn reload_client_script() -> String {
    format!(
        r#"(function() {{
  'use strict';

  const protocol = location.protocol === 'https:' ? 'wss:' : 'ws:';
  const url = protocol + '//' + location.host + '{}';
  const maxReconnectAttempts = 10;
  let reconnectAttempts = 0;

  function showError(message) {{
    let overlay = document.getElementById('lectern-build-error');
    if (!overlay) {{
      overlay = document.createElement('pre');
      overlay.id = 'lectern-build-error';
      overlay.style.cssText = 'position:fixed;inset:auto 1rem 1rem 1rem;z-index:1000;' +
        'max-height:50vh;overflow:auto;margin:0;padding:1rem;border-radius:0.5rem;' +
        'background:#1f1315;color:#fecaca;border:1px solid #dc2626;white-space:pre-wrap;';
      document.body.appendChild(overlay);
    }}
    overlay.textContent = 'Build failed\n\n' + message;
  }}

  function connect() {{
    const ws = new WebSocket(url);

    ws.onopen = function() {{
      reconnectAttempts = 0;
    }};

    ws.onmessage = function(event) {{
      const msg = JSON.parse(event.data);

      switch (msg.type) {{
        case 'reload':
          location.reload();
          break;
        case 'build_failed':
          showError(msg.message);
          break;
        case 'connected':
          console.log('[lectern] live reload connected');
          break;
      }}
    }};

    ws.onclose = function() {{
      if (reconnectAttempts < maxReconnectAttempts) {{
        reconnectAttempts++;
        setTimeout(connect, 1000 * reconnectAttempts);
      }}
    }};
  }}

  connect();
}})();
"#,
        RELOAD_PATH
    )
}
