//! Shared configuration for tutera tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `tutera_core::ControllerConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tutera_core::{AutoConnect, ControllerConfig, Percent, TlsVerification};

/// Keyring service name for stored auth tokens.
const KEYRING_SERVICE: &str = "tutera";

/// Environment variables that make up the auto-connect credentials.
pub const PROCESSOR_ENV: &str = "TUTERA_PROCESSOR";
pub const AUTH_TOKEN_ENV: &str = "TUTERA_AUTH_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no auth token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named processor profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned();
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::UnknownProfile(name)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Slider quiescence window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Poll interval in seconds (0 = never).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Brightness for lights switched on with nothing remembered.
    #[serde(default = "default_restore")]
    pub default_restore: u8,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            debounce_ms: default_debounce_ms(),
            poll_interval: default_poll_interval(),
            default_restore: default_restore(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_debounce_ms() -> u64 {
    250
}
fn default_poll_interval() -> u64 {
    30
}
fn default_restore() -> u8 {
    75
}

/// A named processor profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Processor address (host, host:port, or URL).
    pub processor: String,

    /// Auth token (plaintext; prefer keyring or env var).
    pub auth_token: Option<String>,

    /// Environment variable name containing the auth token.
    pub auth_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Verify TLS against the system store instead of accepting the
    /// processor's self-signed certificate.
    pub verify_tls: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tutera", "tutera")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the brightness memory file lives.
pub fn brightness_memory_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share").join("brightness.json"),
        |dirs| dirs.data_dir().join("brightness.json"),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("tutera");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file. A missing file yields the defaults;
/// `TUTERA_`-prefixed variables override both (`TUTERA_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TUTERA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve a profile's auth token: its `auth_token_env` variable,
/// `TUTERA_AUTH_TOKEN`, the system keyring, then plaintext config.
pub fn resolve_auth_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_token_with(
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        |name| {
            keyring::Entry::new(KEYRING_SERVICE, &keyring_user(name))
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// Store a profile's auth token in the system keyring.
pub fn store_auth_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(token)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/auth-token")
}

fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let non_empty = |v: String| (!v.trim().is_empty()).then_some(v);

    // 1. Profile's own env var, then the shared one
    let from_env = profile
        .auth_token_env
        .as_deref()
        .and_then(&env)
        .and_then(non_empty)
        .or_else(|| env(AUTH_TOKEN_ENV).and_then(non_empty));
    if let Some(token) = from_env {
        return Ok(SecretString::from(token));
    }

    // 2. System keyring
    if let Some(token) = keyring(profile_name).and_then(non_empty) {
        return Ok(SecretString::from(token));
    }

    // 3. Plaintext in config
    if let Some(token) = profile.auth_token.clone().and_then(non_empty) {
        return Ok(SecretString::from(token));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Environment credentials, when both parts are present and non-empty.
pub fn auto_connect_from(processor: Option<String>, token: Option<String>) -> Option<AutoConnect> {
    let processor = processor.filter(|p| !p.trim().is_empty())?;
    let token = token.filter(|t| !t.trim().is_empty())?;
    Some(AutoConnect {
        processor,
        token: SecretString::from(token),
    })
}

/// Read `TUTERA_PROCESSOR` / `TUTERA_AUTH_TOKEN`.
pub fn auto_connect_from_env() -> Option<AutoConnect> {
    auto_connect_from(
        std::env::var(PROCESSOR_ENV).ok(),
        std::env::var(AUTH_TOKEN_ENV).ok(),
    )
}

// ── Translation to ControllerConfig ─────────────────────────────────

/// Check a processor address before anything tries to connect to it.
pub fn validate_processor(processor: &str) -> Result<(), ConfigError> {
    let trimmed = processor.trim();
    let invalid = |reason: String| ConfigError::Validation {
        field: "processor".into(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("processor address is empty".into()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };
    let url = url::Url::parse(&candidate).map_err(|e| invalid(format!("{trimmed}: {e}")))?;
    if url.host_str().is_none() {
        return Err(invalid(format!("{trimmed}: no host")));
    }
    Ok(())
}

/// Build a `ControllerConfig` from a profile; no CLI flag overrides.
///
/// The profile's processor and resolved token become the controller's
/// auto-connect credentials.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    validate_processor(&profile.processor)?;
    let token = resolve_auth_token(profile, profile_name)?;
    controller_config(profile, defaults, token)
}

/// Build a `ControllerConfig` from a profile and an already resolved
/// token. Front ends that take the token from a flag call this directly.
pub fn controller_config(
    profile: &Profile,
    defaults: &Defaults,
    token: SecretString,
) -> Result<ControllerConfig, ConfigError> {
    let tls = if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.verify_tls.unwrap_or(false) {
        TlsVerification::SystemDefaults
    } else {
        TlsVerification::DangerAcceptInvalid // processors ship self-signed certificates
    };

    let default_restore =
        Percent::new(defaults.default_restore).map_err(|e| ConfigError::Validation {
            field: "defaults.default_restore".into(),
            reason: e.to_string(),
        })?;

    Ok(ControllerConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        refresh_interval_secs: profile.poll_interval.unwrap_or(defaults.poll_interval),
        debounce: Duration::from_millis(defaults.debounce_ms),
        default_restore,
        auto_connect: Some(AutoConnect {
            processor: profile.processor.trim().to_owned(),
            token,
        }),
    })
}
