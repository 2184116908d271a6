// ── Runtime connection configuration ──
//
// Describes how to reach a show server. Never touches disk: the CLI
// builds one from a config profile and hands it to the controller.

use std::time::Duration;

use showctl_api::ReconnectConfig;
use url::Url;

/// Configuration for one show-server connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Websocket endpoint, e.g. `ws://127.0.0.1:8000/ws`.
    pub url: Url,
    pub reconnect: ReconnectConfig,
    /// How long one-shot commands wait for the initial resync.
    pub sync_timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            reconnect: ReconnectConfig::default(),
            sync_timeout: Duration::from_secs(10),
        }
    }
}
