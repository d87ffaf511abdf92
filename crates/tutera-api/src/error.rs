use thiserror::Error;

/// Top-level error type for the `tutera-api` crate.
///
/// Every failure a processor call can produce is normalized into one of
/// these variants: authentication, transport, controller-reported failures
/// and malformed payloads. `tutera-core` maps them into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (bad token, processor refused, no key returned).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The processor rejected the session key (HTTP 401).
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// A call was attempted without a processor address or session key.
    #[error("No active session: {0}")]
    MissingSession(&'static str),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller ──────────────────────────────────────────────────
    /// Non-2xx status, or a `{"status": "failure"}` body.
    #[error("Controller error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session key is no longer
    /// accepted and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
