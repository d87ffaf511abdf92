//! CLI configuration: thin wrapper around `tutera_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--processor`, `--token`, `--verify-tls`, `--timeout`).

use secrecy::SecretString;

use tutera_config::{Config, ConfigError, Profile};
use tutera_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use tutera_config::{brightness_memory_path, store_auth_token};

/// Load the config file named by `--config`, or the platform default.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    match global.config {
        Some(ref path) => Ok(tutera_config::load_config_from(path)?),
        None => Ok(tutera_config::load_config_or_default()),
    }
}

pub fn save(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let path = config_path(global);
    tutera_config::save_config_to(&path, cfg)?;
    Ok(())
}

pub fn config_path(global: &GlobalOpts) -> std::path::PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(tutera_config::config_path)
}

/// Resolve the active profile name from flags and config.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate the active profile plus flag overrides into a
/// `ControllerConfig` whose auto-connect credentials are the ones to use.
///
/// Flags win over the profile. With no profile at all, `--processor`
/// and `--token` alone are enough.
pub fn resolve_controller_config(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<ControllerConfig, CliError> {
    let (name, mut profile) = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => (name, profile.clone()),
        // An explicitly requested profile must exist.
        Err(ConfigError::UnknownProfile(name)) if global.profile.is_none() => {
            (name, Profile::default())
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(ref processor) = global.processor {
        processor.clone_into(&mut profile.processor);
    }
    if profile.processor.trim().is_empty() {
        return Err(CliError::NoConfig {
            path: config_path(global).display().to_string(),
        });
    }
    tutera_config::validate_processor(&profile.processor)?;

    if global.verify_tls {
        profile.verify_tls = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let token = match global.token {
        Some(ref token) if !token.trim().is_empty() => SecretString::from(token.clone()),
        _ => tutera_config::resolve_auth_token(&profile, &name)?,
    };

    let mut controller = tutera_config::controller_config(&profile, &cfg.defaults, token)?;
    // One command per process; nothing would observe a poll.
    controller.refresh_interval_secs = 0;
    Ok(controller)
}
