// ── Core error types ──
//
// User-facing errors from tutera-core. Consumers never see HTTP status
// codes or JSON parse failures directly: `From<tutera_api::Error>` folds
// the transport taxonomy into the kinds below.

use std::fmt;

use thiserror::Error;

use crate::model::DeviceId;

/// Unified error type for the core crate.
///
/// `Clone` so a single failure can resolve a command ticket and be
/// broadcast to failure subscribers at the same time.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Controller request failed: {message}")]
    Transport {
        message: String,
        /// HTTP status when the processor answered at all.
        status: Option<u16>,
    },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: &'static str,
        identifier: String,
    },

    // ── Group operations ─────────────────────────────────────────────
    #[error(
        "{failed} of {total} devices did not respond: {names}",
        failed = .failures.len(),
        total = .failures.len() + .succeeded.len(),
        names = DeviceFailure::names(.failures)
    )]
    PartialFailure {
        succeeded: Vec<DeviceId>,
        failures: Vec<DeviceFailure>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_connected() -> Self {
        Self::Auth {
            message: "no active session; log in first".into(),
        }
    }

    /// Errors worth one re-login and replay.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// One member of a group operation that failed.
#[derive(Debug, Clone)]
pub struct DeviceFailure {
    pub device: DeviceId,
    pub name: String,
    pub error: Box<CoreError>,
}

impl DeviceFailure {
    fn names(failures: &[Self]) -> String {
        failures
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.device, self.error)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tutera_api::Error> for CoreError {
    fn from(err: tutera_api::Error) -> Self {
        match err {
            tutera_api::Error::Authentication { message } => CoreError::Auth { message },
            tutera_api::Error::SessionExpired => CoreError::Auth {
                message: "session expired".into(),
            },
            tutera_api::Error::MissingSession(what) => CoreError::Auth {
                message: what.into(),
            },
            tutera_api::Error::Transport(ref e) => CoreError::Transport {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            tutera_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid processor address: {e}"),
            },
            tutera_api::Error::Timeout { timeout_secs } => CoreError::Transport {
                message: format!("timed out after {timeout_secs}s"),
                status: None,
            },
            tutera_api::Error::Tls(msg) => CoreError::Transport {
                message: format!("TLS error: {msg}"),
                status: None,
            },
            tutera_api::Error::Api { status, message } => CoreError::Transport {
                message,
                status: Some(status),
            },
            tutera_api::Error::Deserialization { message, body: _ } => CoreError::Transport {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceKind;

    #[test]
    fn session_expiry_maps_to_auth() {
        let err = CoreError::from(tutera_api::Error::SessionExpired);
        assert!(err.is_auth());
    }

    #[test]
    fn api_status_is_kept() {
        let err = CoreError::from(tutera_api::Error::Api {
            status: 503,
            message: "busy".into(),
        });
        assert!(matches!(
            err,
            CoreError::Transport {
                status: Some(503),
                ..
            }
        ));
    }

    #[test]
    fn partial_failure_names_only_failed_devices() {
        let err = CoreError::PartialFailure {
            succeeded: vec![
                DeviceId::new(DeviceKind::Light, 1),
                DeviceId::new(DeviceKind::Light, 2),
            ],
            failures: vec![DeviceFailure {
                device: DeviceId::new(DeviceKind::Light, 3),
                name: "Sconce".into(),
                error: Box::new(CoreError::Transport {
                    message: "timed out after 10s".into(),
                    status: None,
                }),
            }],
        };
        assert_eq!(err.to_string(), "1 of 3 devices did not respond: Sconce");
    }
}
