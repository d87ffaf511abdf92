use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Header carrying the long-lived authorization token on login.
pub const AUTH_TOKEN_HEADER: &str = "Crestron-RestAPI-AuthToken";

/// Header carrying the session key on every authenticated call.
pub const AUTH_KEY_HEADER: &str = "Crestron-RestAPI-AuthKey";

/// REST root on the processor.
const API_ROOT: &str = "/cws/api/";

/// Normalize a processor address into the REST root URL.
///
/// Accepts a bare host (`192.168.1.20`), a host with port, or a full URL.
/// Bare hosts default to `https`. The result always ends in `/cws/api/`
/// so endpoint paths can be joined onto it.
pub fn processor_url(raw: &str) -> Result<Url, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::MissingSession("processor address is empty"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme)?;
    let path = url.path().trim_end_matches('/').to_owned();
    if path.ends_with("/cws/api") {
        url.set_path(&format!("{path}/"));
    } else {
        url.set_path(&format!("{path}{API_ROOT}"));
    }
    Ok(url)
}

// ── SessionKey ──────────────────────────────────────────────────────

/// Opaque session key returned by the processor's login endpoint.
///
/// Never printed in full: `Debug` and `Display` only show a redacted prefix.
#[derive(Clone)]
pub struct SessionKey(SecretString);

impl SessionKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// First four characters followed by an ellipsis.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.expose_secret().chars().take(4).collect();
        format!("{prefix}…")
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.redacted())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for SessionKey {}

// ── SessionContext ──────────────────────────────────────────────────

/// Everything an authenticated call needs: where the processor lives and
/// which session key to present.
///
/// Passed explicitly to every [`ControllerClient`](crate::ControllerClient)
/// method, so one client can serve any number of concurrent sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    processor: Url,
    key: SessionKey,
}

impl SessionContext {
    /// Build a context, rejecting an empty session key up front.
    pub fn new(processor: Url, key: SessionKey) -> Result<Self, Error> {
        if key.is_empty() {
            return Err(Error::MissingSession("session key is empty"));
        }
        Ok(Self { processor, key })
    }

    /// The processor's REST root (`…/cws/api/`).
    pub fn processor(&self) -> &Url {
        &self.processor
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }
}
