//! CLI configuration: thin wrapper around `showctl_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --server, --timeout).

use std::time::Duration;

use showctl_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use showctl_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, profile, and flag
/// overrides.
///
/// `--server` works without any profile. An explicitly named profile that
/// does not exist is an error even when `--server` is given.
pub fn build_controller_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<ControllerConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut controller = match (cfg.profiles.get(&profile_name), global.server.as_deref()) {
        (Some(profile), server) => {
            let mut resolved =
                showctl_config::profile_to_controller_config(profile, &cfg.defaults)?;
            if let Some(server) = server {
                resolved.url = showctl_config::parse_server_url(server)?;
            }
            resolved
        }
        (None, _) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        (None, Some(server)) => {
            let mut resolved = ControllerConfig::new(showctl_config::parse_server_url(server)?);
            resolved.sync_timeout = Duration::from_secs(cfg.defaults.sync_timeout);
            resolved
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(secs) = global.timeout {
        controller.sync_timeout = Duration::from_secs(secs);
    }
    Ok(controller)
}

/// Comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
