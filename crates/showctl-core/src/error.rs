// ── Core error types ──
//
// Diagnostics raised by the mirror and the protocol layer. None of these
// are fatal: the controller logs them and keeps the mirror in its last
// known-good state. The `From<showctl_api::Error>` impl translates
// transport failures into the same vocabulary.

use thiserror::Error;

use crate::dmx::DmxError;
use crate::model::KnobKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Address consistency ──────────────────────────────────────────
    #[error("No {collection} at address {address}")]
    UnknownAddress {
        collection: &'static str,
        address: String,
    },

    #[error("Input {index} out of range for {address} ({len} inputs)")]
    InputOutOfRange {
        address: String,
        index: usize,
        len: usize,
    },

    #[error("Cannot pop an input from {address}: it has none")]
    NoInputs { address: String },

    #[error("Cannot pop an output from {address}: it has none")]
    NoOutputs { address: String },

    #[error("Knob {address} is {expected}, ignoring {got} value")]
    DatatypeMismatch {
        address: String,
        expected: KnobKind,
        got: KnobKind,
    },

    #[error("Knob {address} ({datatype}) cannot take this edit")]
    EditMismatch { address: String, datatype: KnobKind },

    #[error("Invalid address: {input}")]
    InvalidAddress { input: String },

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("Could not decode server message: {message}")]
    Decode { message: String },

    #[error("Could not encode command: {0}")]
    Encode(#[from] serde_json::Error),

    // ── Transport ────────────────────────────────────────────────────
    #[error("Not connected to the show server")]
    Disconnected,

    #[error("Send failed: {reason}")]
    SendFailed { reason: String },

    #[error("Cannot connect to show server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Timed out after {timeout_secs}s waiting for {waiting_for}")]
    Timeout {
        timeout_secs: u64,
        waiting_for: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error(transparent)]
    Dmx(#[from] DmxError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Address-consistency errors describe a single dropped event.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::UnknownAddress { .. }
                | Self::InputOutOfRange { .. }
                | Self::NoInputs { .. }
                | Self::NoOutputs { .. }
                | Self::DatatypeMismatch { .. }
                | Self::EditMismatch { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<showctl_api::Error> for CoreError {
    fn from(err: showctl_api::Error) -> Self {
        match err {
            showctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            showctl_api::Error::UnsupportedScheme { scheme } => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected ws or wss)"),
            },
            showctl_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason,
            },
            showctl_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            showctl_api::Error::Send(reason) => CoreError::SendFailed { reason },
            showctl_api::Error::ChannelClosed => CoreError::Disconnected,
        }
    }
}
