//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use tutera_config::ConfigError;
use tutera_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the processor: {reason}")]
    #[diagnostic(
        code(tutera::connection_failed),
        help(
            "Check that the processor is powered and reachable from this machine.\n\
             Try: tutera status -v"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tutera::auth_failed),
        help(
            "The processor rejected the auth token.\n\
             Generate a new one under Web API settings on the processor, then run:\n  \
             tutera config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No auth token configured for profile '{profile}'")]
    #[diagnostic(
        code(tutera::no_credentials),
        help(
            "Pass --token, set TUTERA_AUTH_TOKEN, or store one with:\n  \
             tutera config set-token --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No processor configured")]
    #[diagnostic(
        code(tutera::no_config),
        help(
            "Pass --processor, set TUTERA_PROCESSOR, or create a profile with:\n  \
             tutera config init\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(tutera::config))]
    Config { message: String },

    // ── Lookup ───────────────────────────────────────────────────────
    #[error("{resource_type} not found: {identifier}")]
    #[diagnostic(
        code(tutera::not_found),
        help("List what is available with: tutera {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(tutera::validation))]
    Validation { field: String, reason: String },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(tutera::partial_failure),
        help("The devices that answered keep their new state; retry the rest.")
    )]
    PartialFailure { message: String },

    #[error("Processor error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(tutera::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(tutera::output))]
    Output { message: String },

    #[error(transparent)]
    #[diagnostic(code(tutera::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => Self::AuthFailed { message },
            CoreError::Transport {
                message,
                status: None,
            } => Self::ConnectionFailed { reason: message },
            CoreError::Transport { message, status } => Self::ApiError { message, status },
            CoreError::Validation { message } => Self::Validation {
                field: "request".into(),
                reason: message,
            },
            CoreError::NotFound { kind, identifier } => Self::NotFound {
                resource_type: kind.into(),
                identifier,
                list_command: list_command_for(kind),
            },
            err @ CoreError::PartialFailure { .. } => Self::PartialFailure {
                message: err.to_string(),
            },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile(name) => Self::NotFound {
                resource_type: "profile".into(),
                identifier: name,
                list_command: "config profiles".into(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

fn list_command_for(kind: &str) -> String {
    match kind.to_ascii_lowercase().as_str() {
        "room" => "rooms list",
        "scene" => "scenes list",
        "quick action" => "quick-actions list",
        _ => "lights list",
    }
    .into()
}
