//! Config subcommand handlers. None of these touch the processor.

use std::fmt::Write;

use tutera_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

fn mask_secrets(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.auth_token.is_some() {
            profile.auth_token = Some(MASK.into());
        }
    }
}

fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out, "\n[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "debounce_ms = {}", d.debounce_ms);
    let _ = writeln!(out, "poll_interval = {}", d.poll_interval);
    let _ = writeln!(out, "default_restore = {}", d.default_restore);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out, "\n[profiles.{name}]");
        let _ = writeln!(out, "processor = \"{}\"", p.processor);
        if let Some(ref token) = p.auth_token {
            let _ = writeln!(out, "auth_token = \"{token}\"");
        }
        if let Some(ref env) = p.auth_token_env {
            let _ = writeln!(out, "auth_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(verify) = p.verify_tls {
            let _ = writeln!(out, "verify_tls = {verify}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {interval}");
        }
    }

    out.trim_end().to_owned()
}

/// The token from `--token` / `TUTERA_AUTH_TOKEN`, or a hidden prompt.
fn token_input(global: &GlobalOpts) -> Result<String, CliError> {
    let token = match global.token {
        Some(ref token) => token.clone(),
        None => rpassword::prompt_password("Auth token: ")?,
    };
    let token = token.trim().to_owned();
    if token.is_empty() {
        return Err(CliError::validation("auth token", "cannot be empty"));
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            name,
            processor,
            keyring,
        } => {
            tutera_config::validate_processor(&processor)?;
            let token = token_input(global)?;

            let auth_token = if keyring {
                config::store_auth_token(&name, &token)?;
                eprintln!("✓ Auth token stored in system keyring");
                None
            } else {
                Some(token)
            };

            let mut cfg = config::load(global)?;
            let previous = cfg.profiles.remove(&name).unwrap_or_default();
            cfg.profiles.insert(
                name.clone(),
                Profile {
                    processor: processor.trim().to_owned(),
                    auth_token,
                    ..previous
                },
            );
            if cfg
                .default_profile
                .as_ref()
                .is_none_or(|d| !cfg.profiles.contains_key(d))
            {
                cfg.default_profile = Some(name.clone());
            }
            config::save(global, &cfg)?;

            eprintln!(
                "✓ Profile '{name}' written to {}",
                config::config_path(global).display()
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            mask_secrets(&mut cfg);
            let rendered =
                output::render_single(global.output, &cfg, format_config, |_| "config".into())?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &config::config_path(global).display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            let active = config::active_profile_name(global, &cfg);
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            let lines: Vec<String> = names
                .into_iter()
                .map(|n| {
                    let marker = if n == active { "*" } else { " " };
                    format!("{marker} {n}")
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::NotFound {
                    resource_type: "profile".into(),
                    identifier: name,
                    list_command: "config profiles".into(),
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save(global, &cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetToken { name } => {
            let cfg = config::load(global)?;
            let name = name.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let token = token_input(global)?;
            config::store_auth_token(&name, &token)?;
            eprintln!("✓ Auth token for '{name}' stored in system keyring");
            Ok(())
        }
    }
}
