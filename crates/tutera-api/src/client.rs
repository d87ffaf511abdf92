// Processor HTTP client
//
// Wraps `reqwest::Client` with REST-root URL construction, session-key
// headers, status normalization and listing-shape tolerance. Endpoint
// groups (rooms, lights, ...) are inherent methods in sibling files so
// this module stays focused on transport mechanics.

use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{AUTH_KEY_HEADER, SessionContext};
use crate::error::Error;
use crate::models::StatusResponse;
use crate::transport::TransportConfig;

/// Stateless client for the processor's REST API.
///
/// Holds no session: every call takes a [`SessionContext`]. Cheap to clone
/// (the inner `reqwest::Client` is reference counted).
#[derive(Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl ControllerClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout: transport.timeout,
        })
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: TransportConfig::default().timeout,
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative endpoint path (e.g. `"lights/SetState"`) onto the
    /// processor's REST root.
    pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, Error> {
        Ok(base.join(path)?)
    }

    fn session_header(ctx: &SessionContext) -> Result<HeaderValue, Error> {
        let mut value = HeaderValue::from_str(ctx.key().expose())
            .map_err(|_| Error::MissingSession("session key is not a valid header value"))?;
        value.set_sensitive(true);
        Ok(value)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get(&self, ctx: &SessionContext, path: &str) -> Result<Value, Error> {
        let url = Self::endpoint(ctx.processor(), path)?;
        debug!(key = %ctx.key(), "GET {url}");

        let resp = self
            .http
            .get(url)
            .header(AUTH_KEY_HEADER, Self::session_header(ctx)?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(resp).await
    }

    pub(crate) async fn post(
        &self,
        ctx: &SessionContext,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let url = Self::endpoint(ctx.processor(), path)?;
        debug!(key = %ctx.key(), "POST {url}");

        let resp = self
            .http
            .post(url)
            .header(AUTH_KEY_HEADER, Self::session_header(ctx)?)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(resp).await
    }

    /// POST without a body: most one-shot commands encode everything in the path.
    pub(crate) async fn post_empty(&self, ctx: &SessionContext, path: &str) -> Result<Value, Error> {
        let url = Self::endpoint(ctx.processor(), path)?;
        debug!(key = %ctx.key(), "POST {url}");

        let resp = self
            .http
            .post(url)
            .header(AUTH_KEY_HEADER, Self::session_header(ctx)?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(resp).await
    }

    /// GET a listing endpoint and normalize it into a `Vec<T>`.
    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
        field: &str,
    ) -> Result<Vec<T>, Error> {
        let body = self.get(ctx, path).await?;
        extract_list(body, field)
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Normalize status codes and controller failure bodies.
    ///
    /// - 401 → [`Error::SessionExpired`]
    /// - other non-2xx → [`Error::Api`] with a body preview
    /// - `{"status": "failure"}` with HTTP 200 → [`Error::Api`]
    /// - empty body → `Value::Null`
    pub(crate) async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(len = body.len(), "response body received");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        check_status(&value, status.as_u16())?;
        Ok(value)
    }
}

/// Reject bodies that report `"status": "failure"` despite a 2xx code.
fn check_status(value: &Value, http_status: u16) -> Result<(), Error> {
    if !value.is_object() {
        return Ok(());
    }
    let envelope: StatusResponse = serde_json::from_value(value.clone()).unwrap_or_default();
    match envelope.status.as_deref() {
        Some(s) if s.eq_ignore_ascii_case("failure") || s.eq_ignore_ascii_case("error") => {
            Err(Error::Api {
                status: http_status,
                message: envelope
                    .error_message
                    .or(envelope.error_source)
                    .unwrap_or_else(|| "controller reported failure".into()),
            })
        }
        _ => Ok(()),
    }
}

/// Accept either a bare JSON array or an object wrapping the array under
/// `field` and deserialize it into `Vec<T>`.
///
/// An object without the field is treated as an empty listing, which is
/// what processors without that subsystem return.
pub fn extract_list<T: DeserializeOwned>(body: Value, field: &str) -> Result<Vec<T>, Error> {
    let items = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => match map.remove(field) {
            Some(inner @ Value::Array(_)) => inner,
            Some(Value::Null) | None => Value::Array(Vec::new()),
            Some(other) => {
                return Err(Error::Deserialization {
                    message: format!("field `{field}` is not a list"),
                    body: other.to_string(),
                });
            }
        },
        Value::Null => Value::Array(Vec::new()),
        other => {
            return Err(Error::Deserialization {
                message: format!("expected a list or an object with `{field}`"),
                body: other.to_string(),
            });
        }
    };

    serde_json::from_value(items.clone()).map_err(|e| Error::Deserialization {
        message: format!("{field}: {e}"),
        body: items.to_string(),
    })
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::RoomPayload;

    #[test]
    fn bare_list_is_accepted() {
        let rooms: Vec<RoomPayload> =
            extract_list(json!([{ "id": 1, "name": "Kitchen" }]), "rooms").unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name, "Kitchen");
    }

    #[test]
    fn wrapped_list_is_accepted() {
        let rooms: Vec<RoomPayload> = extract_list(
            json!({ "version": "2.0", "rooms": [{ "id": 1, "name": "Den", "areaId": 7 }] }),
            "rooms",
        )
        .unwrap();
        assert_eq!(rooms[0].area_id, Some(7));
    }

    #[test]
    fn missing_field_is_an_empty_listing() {
        let rooms: Vec<RoomPayload> = extract_list(json!({ "version": "2.0" }), "rooms").unwrap();
        assert!(rooms.is_empty());
    }

    #[test]
    fn scalar_body_is_a_deserialization_error() {
        let result: Result<Vec<RoomPayload>, _> = extract_list(json!("nope"), "rooms");
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn failure_status_is_rejected() {
        let err = check_status(
            &json!({ "status": "failure", "errorMessage": "bad light id" }),
            200,
        )
        .unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "bad light id");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), 200);
    }
}
