// Session login/logout
//
// `GET /login` trades the long-lived authorization token for a short-lived
// session key. The key is returned to the caller; the client never keeps it.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::auth::{AUTH_TOKEN_HEADER, SessionContext, SessionKey};
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::LoginResponse;

impl ControllerClient {
    /// Exchange an authorization token for a session key.
    ///
    /// `processor` is the REST root produced by
    /// [`processor_url`](crate::processor_url). Any failure (transport,
    /// non-2xx, malformed body, missing key) is reported as an
    /// [`Error::Authentication`] carrying the cause, except timeouts and
    /// connection errors which keep their transport variant.
    pub async fn login(&self, processor: &Url, token: &SecretString) -> Result<SessionContext, Error> {
        if token.expose_secret().trim().is_empty() {
            return Err(Error::Authentication {
                message: "authorization token is empty".into(),
            });
        }

        let url = Self::endpoint(processor, "login")?;
        debug!("logging in at {}", url);

        let resp = self
            .http()
            .get(url)
            .header(AUTH_TOKEN_HEADER, token.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", body.trim()),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("malformed login response: {e}"),
            })?;

        let key = parsed
            .authkey
            .filter(|k| !k.trim().is_empty())
            .map(SessionKey::new)
            .ok_or_else(|| Error::Authentication {
                message: "processor returned no session key".into(),
            })?;

        debug!(key = %key, version = ?parsed.version, "login successful");
        SessionContext::new(processor.clone(), key)
    }

    /// End the session on the processor.
    pub async fn logout(&self, ctx: &SessionContext) -> Result<(), Error> {
        debug!(key = %ctx.key(), "logging out");
        self.get(ctx, "logout").await?;
        Ok(())
    }
}
