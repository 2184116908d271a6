//! CLI error types with miette diagnostics.
//!
//! Maps core, config and form errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use showctl_config::ConfigError;
use showctl_core::{CoreError, FormError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to show server at {url}")]
    #[diagnostic(
        code(showctl::connection_failed),
        help(
            "Check that the show server is running and reachable.\n\
             URL: {url}\n\
             Override it with --server ws://HOST:PORT/ws"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Not connected to the show server")]
    #[diagnostic(
        code(showctl::disconnected),
        help("The connection dropped before the command could be sent. Try again.")
    )]
    Disconnected,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(showctl::not_found),
        help("Run: showctl {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Server rejected the command: {message}")]
    #[diagnostic(code(showctl::server_error))]
    Server { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(showctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(showctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: showctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No show server configured")]
    #[diagnostic(
        code(showctl::no_config),
        help(
            "Create a profile with: showctl config init\n\
             Or pass --server ws://HOST:PORT/ws\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(showctl::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {waiting_for}")]
    #[diagnostic(
        code(showctl::timeout),
        help("Increase the wait with --timeout or check the server's responsiveness.")
    )]
    Timeout { seconds: u64, waiting_for: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(showctl::internal))]
    Internal(CoreError),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Server { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Disconnected | CoreError::SendFailed { .. } => CliError::Disconnected,

            CoreError::Timeout {
                timeout_secs,
                waiting_for,
            } => CliError::Timeout {
                seconds: timeout_secs,
                waiting_for,
            },

            CoreError::UnknownAddress {
                collection,
                address,
            } => CliError::NotFound {
                resource_type: collection.into(),
                list_command: list_command(collection).into(),
                identifier: address,
            },

            CoreError::InvalidAddress { input } => CliError::Validation {
                field: "address".into(),
                reason: format!("'{input}' is not NAMESPACE:LOCAL"),
            },

            CoreError::Dmx(e) => CliError::Validation {
                field: "dmx".into(),
                reason: e.to_string(),
            },

            e @ (CoreError::InputOutOfRange { .. }
            | CoreError::NoInputs { .. }
            | CoreError::NoOutputs { .. }
            | CoreError::DatatypeMismatch { .. }
            | CoreError::EditMismatch { .. }) => CliError::Validation {
                field: "command".into(),
                reason: e.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            other => CliError::Internal(other),
        }
    }
}

fn list_command(collection: &str) -> &'static str {
    match collection {
        "clock" => "clocks list",
        "wiggle" => "wiggles list",
        "knob" => "knobs list",
        _ => "patch list",
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

impl From<FormError> for CliError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::InvalidField { field, raw, reason } => CliError::Validation {
                field: field.to_lowercase(),
                reason: format!("'{raw}': {reason}"),
            },
            FormError::NoKind => CliError::Validation {
                field: "kind".into(),
                reason: "choose a fixture type with --kind".into(),
            },
            FormError::UnknownKind(kind) => CliError::NotFound {
                resource_type: "fixture type".into(),
                identifier: kind,
                list_command: "patch kinds".into(),
            },
            FormError::Dmx(e) => CliError::Validation {
                field: "dmx".into(),
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use showctl_core::DmxError;

    #[test]
    fn unknown_address_points_at_the_list_command() {
        let err = CliError::from(CoreError::UnknownAddress {
            collection: "wiggle",
            address: "0:4".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        let CliError::NotFound { list_command, .. } = err else {
            panic!("expected NotFound");
        };
        assert_eq!(list_command, "wiggles list");
    }

    #[test]
    fn form_errors_are_usage_errors() {
        assert_eq!(
            CliError::from(FormError::Dmx(DmxError::PartialAddress)).exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::from(FormError::UnknownKind("Fog".into())).exit_code(),
            exit_code::NOT_FOUND
        );
    }

    #[test]
    fn transport_errors_map_to_connection_exit_code() {
        assert_eq!(
            CliError::from(CoreError::Disconnected).exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::from(CoreError::Timeout {
                timeout_secs: 3,
                waiting_for: "the initial show state".into(),
            })
            .exit_code(),
            exit_code::TIMEOUT
        );
    }
}
