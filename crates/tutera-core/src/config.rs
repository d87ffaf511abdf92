// ── Runtime connection configuration ──
//
// These types describe *how* to talk to a processor. They carry credential
// data and tuning but never touch disk: the CLI (via `tutera-config`)
// builds a `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tutera_api::{TlsMode, TransportConfig};

use crate::memory::DEFAULT_RESTORE;
use crate::model::Percent;

/// Credentials supplied by the process environment rather than typed in by
/// a user. Sessions opened with them may re-login unattended.
#[derive(Debug, Clone)]
pub struct AutoConnect {
    pub processor: String,
    pub token: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Processors ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one controller connection.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often to poll for a full refresh (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Quiescence window for continuous intents (brightness, volume).
    pub debounce: Duration,
    /// Level a light returns to when switched on with nothing remembered.
    pub default_restore: Percent,
    /// Environment credentials for `auto_connect` and unattended re-login.
    pub auto_connect: Option<AutoConnect>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            refresh_interval_secs: 30,
            debounce: Duration::from_millis(250),
            default_restore: DEFAULT_RESTORE,
            auto_connect: None,
        }
    }
}

impl ControllerConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
