// ── Session manager ──
//
// Owns the one active processor session. Reads are synchronous (an
// `ArcSwapOption` load); logins and re-logins are the only async paths.
// Requests themselves are never retried here: the controller facade
// decides when to call `reauthenticate` and replay.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use tutera_api::{ControllerClient, SessionContext, processor_url};

use crate::config::AutoConnect;
use crate::error::CoreError;

/// Where the credential behind a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum CredentialSource {
    /// Typed in by the user; never replayed without them.
    Provided,
    /// Process configuration; may re-login unattended.
    Environment,
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub connected: bool,
    pub processor: Option<String>,
    pub source: Option<CredentialSource>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct ActiveSession {
    context: SessionContext,
    source: CredentialSource,
}

pub struct SessionManager {
    client: ControllerClient,
    auto_connect: Option<AutoConnect>,
    active: ArcSwapOption<ActiveSession>,
    status: watch::Sender<SessionStatus>,
    /// Serializes re-logins so a burst of 401s logs in once.
    relogin: Mutex<()>,
}

impl SessionManager {
    pub fn new(client: ControllerClient, auto_connect: Option<AutoConnect>) -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            client,
            auto_connect,
            active: ArcSwapOption::empty(),
            status,
            relogin: Mutex::new(()),
        }
    }

    /// Log in with a user-provided credential.
    pub async fn login(
        &self,
        processor: &str,
        credential: &SecretString,
    ) -> Result<SessionContext, CoreError> {
        self.establish(processor, credential, CredentialSource::Provided)
            .await
    }

    /// Log in with the environment credentials given at construction.
    ///
    /// Never fails loudly: missing or rejected credentials yield `None`.
    pub async fn try_auto_connect(&self) -> Option<SessionContext> {
        let Some(auto) = &self.auto_connect else {
            debug!("no environment credentials; auto-connect skipped");
            return None;
        };
        match self
            .establish(&auto.processor, &auto.token, CredentialSource::Environment)
            .await
        {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                warn!(processor = %auto.processor, error = %e, "auto-connect unavailable");
                None
            }
        }
    }

    /// The active session, read without awaiting.
    pub fn context(&self) -> Result<SessionContext, CoreError> {
        self.active
            .load_full()
            .map(|s| s.context.clone())
            .ok_or_else(CoreError::not_connected)
    }

    pub fn source(&self) -> Option<CredentialSource> {
        self.active.load_full().map(|s| s.source)
    }

    pub fn is_connected(&self) -> bool {
        self.active.load().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Forget the session. Returns it so the caller can log out remotely.
    pub fn disconnect(&self) -> Option<SessionContext> {
        let previous = self.active.swap(None);
        self.status.send_modify(|s| {
            s.connected = false;
            s.source = None;
        });
        previous.map(|s| s.context.clone())
    }

    /// Recover from an expired session seen while using `stale`.
    ///
    /// Environment sessions log in again once; provided sessions are
    /// dropped and the user has to log in again.
    pub async fn reauthenticate(&self, stale: &SessionContext) -> Result<SessionContext, CoreError> {
        let _guard = self.relogin.lock().await;

        let Some(current) = self.active.load_full() else {
            return Err(CoreError::not_connected());
        };
        if current.context != *stale {
            debug!("session already renewed by another caller");
            return Ok(current.context.clone());
        }

        match current.source {
            CredentialSource::Provided => {
                let message = "session expired; log in again".to_owned();
                self.clear(&message);
                Err(CoreError::Auth { message })
            }
            CredentialSource::Environment => {
                let Some(auto) = &self.auto_connect else {
                    let message = "session expired and no environment credentials".to_owned();
                    self.clear(&message);
                    return Err(CoreError::Auth { message });
                };
                info!(processor = %auto.processor, "session expired; logging in again");
                self.establish(&auto.processor, &auto.token, CredentialSource::Environment)
                    .await
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn establish(
        &self,
        processor: &str,
        credential: &SecretString,
        source: CredentialSource,
    ) -> Result<SessionContext, CoreError> {
        let attempt = async {
            let url = processor_url(processor)?;
            self.client.login(&url, credential).await
        };

        match attempt.await {
            Ok(context) => {
                info!(processor, key = %context.key(), %source, "session established");
                self.active.store(Some(Arc::new(ActiveSession {
                    context: context.clone(),
                    source,
                })));
                self.status.send_replace(SessionStatus {
                    connected: true,
                    processor: Some(processor.trim().to_owned()),
                    source: Some(source),
                    last_error: None,
                });
                Ok(context)
            }
            Err(e) => {
                let message = e.to_string();
                debug!(processor, %source, error = %message, "login failed");
                self.clear(&message);
                Err(CoreError::Auth { message })
            }
        }
    }

    fn clear(&self, reason: &str) {
        self.active.store(None);
        self.status.send_modify(|s| {
            s.connected = false;
            s.source = None;
            s.last_error = Some(reason.to_owned());
        });
    }
}
