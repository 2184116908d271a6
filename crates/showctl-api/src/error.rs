use thiserror::Error;

/// Top-level error type for the `showctl-api` crate.
///
/// Covers the failure modes of the console socket: bad URLs, failed
/// handshakes, dropped connections and frames that could not be written.
/// `showctl-core` maps these into its own diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL parsed but does not use a websocket scheme.
    #[error("Unsupported URL scheme '{scheme}' (expected ws or wss)")]
    UnsupportedScheme { scheme: String },

    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// A text frame could not be written to the socket.
    #[error("Failed to send frame: {0}")]
    Send(String),

    /// The background transport task is gone.
    #[error("Transport task has shut down")]
    ChannelClosed,
}
