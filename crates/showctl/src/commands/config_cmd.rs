//! Config subcommand handlers.

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

const VALID_KEYS: &str =
    "server, reconnect_initial_ms, reconnect_max_secs, max_retries, sync_timeout";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config as the TOML it is stored as.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "sync_timeout = {}", cfg.defaults.sync_timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        if let Some(ms) = p.reconnect_initial_ms {
            let _ = writeln!(out, "reconnect_initial_ms = {ms}");
        }
        if let Some(secs) = p.reconnect_max_secs {
            let _ = writeln!(out, "reconnect_max_secs = {secs}");
        }
        if let Some(retries) = p.max_retries {
            let _ = writeln!(out, "max_retries = {retries}");
        }
        if let Some(secs) = p.sync_timeout {
            let _ = writeln!(out, "sync_timeout = {secs}");
        }
    }

    out.trim_end().to_owned()
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str, unit: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be a whole number ({unit})"),
    })
}

/// Apply one `key = value` assignment to a profile.
fn set_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "server" => {
            showctl_config::parse_server_url(value)?;
            profile.server = value.to_owned();
        }
        "reconnect_initial_ms" => {
            profile.reconnect_initial_ms = Some(parse_number(key, value, "milliseconds")?);
        }
        "reconnect_max_secs" => {
            profile.reconnect_max_secs = Some(parse_number(key, value, "seconds")?);
        }
        "max_retries" => profile.max_retries = Some(parse_number(key, value, "attempts")?),
        "sync_timeout" => profile.sync_timeout = Some(parse_number(key, value, "seconds")?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

fn profile_lines(cfg: &Config) -> Vec<String> {
    let default = cfg.default_profile.as_deref().unwrap_or("default");
    cfg.profiles
        .keys()
        .map(|name| {
            let marker = if name == default { " *" } else { "" };
            format!("{name}{marker}")
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("showctl configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(util::prompt_err)?;

            let server: String = Input::new()
                .with_prompt("Show server URL")
                .default("ws://127.0.0.1:8000/ws".into())
                .validate_with(|raw: &String| {
                    showctl_config::parse_server_url(raw)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(util::prompt_err)?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), Profile::new(server));
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: showctl show info");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            match cfg.profiles.get_mut(&profile_name) {
                Some(profile) => set_key(profile, &key, &value)?,
                None if key == "server" => {
                    showctl_config::parse_server_url(&value)?;
                    cfg.profiles.insert(profile_name.clone(), Profile::new(value));
                }
                None => {
                    return Err(CliError::ProfileNotFound {
                        name: profile_name,
                        available: config::available_profiles(&cfg),
                    });
                }
            }

            config::save_config(&cfg)?;
            util::done(global, format!("✓ Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: showctl config init");
            } else {
                output::print_output(&profile_lines(&cfg).join("\n"), global.quiet);
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            util::done(global, format!("✓ Default profile set to '{name}'"));
            Ok(())
        }
    }
}
