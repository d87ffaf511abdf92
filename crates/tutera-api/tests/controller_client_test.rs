#![allow(clippy::unwrap_used)]
// Integration tests for `ControllerClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tutera_api::models::LightLevel;
use tutera_api::{ControllerClient, Error, SessionContext, SessionKey, processor_url};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ControllerClient, SessionContext) {
    let server = MockServer::start().await;
    let base = processor_url(&server.uri()).unwrap();
    let client = ControllerClient::with_client(reqwest::Client::new());
    let ctx = SessionContext::new(base, SessionKey::new("session-key-1")).unwrap();
    (server, client, ctx)
}

fn token(raw: &str) -> SecretString {
    SecretString::from(raw.to_owned())
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/login"))
        .and(header("Crestron-RestAPI-AuthToken", "good-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "authkey": "abc123", "version": "2.000", "status": "success" })),
        )
        .mount(&server)
        .await;

    let base = processor_url(&server.uri()).unwrap();
    let ctx = client.login(&base, &token("good-token")).await.unwrap();

    assert_eq!(ctx.key(), &SessionKey::new("abc123"));
    assert_eq!(ctx.processor(), &base);
}

#[tokio::test]
async fn test_login_rejected_token() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let base = processor_url(&server.uri()).unwrap();
    let result = client.login(&base, &token("wrong")).await;

    match result {
        Err(Error::Authentication { message }) => {
            assert!(message.contains("403"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_without_session_key() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .mount(&server)
        .await;

    let base = processor_url(&server.uri()).unwrap();
    let result = client.login(&base, &token("good-token")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_malformed_body() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>portal</html>"))
        .mount(&server)
        .await;

    let base = processor_url(&server.uri()).unwrap();
    let result = client.login(&base, &token("good-token")).await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Listing tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_rooms_wrapped() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/rooms"))
        .and(header("Crestron-RestAPI-AuthKey", "session-key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rooms": [
                { "id": 1001, "name": "Kitchen", "areaId": 3, "areaName": "Ground floor" },
                { "id": 1002, "name": "Office" }
            ],
            "version": "2.000"
        })))
        .mount(&server)
        .await;

    let rooms = client.list_rooms(&ctx).await.unwrap();

    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].area_name.as_deref(), Some("Ground floor"));
    assert_eq!(rooms[1].area_id, None);
}

#[tokio::test]
async fn test_list_rooms_bare_array() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/rooms"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 7, "name": "Garage" }])),
        )
        .mount(&server)
        .await;

    let rooms = client.list_rooms(&ctx).await.unwrap();

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, 7);
}

#[tokio::test]
async fn test_list_lights() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lights": [
                { "id": 1, "name": "Pendant", "roomId": 1001, "subType": "Dimmer", "level": 65535 },
                { "id": 2, "name": "Porch", "roomId": 1002, "subType": "Switch", "level": 0 }
            ]
        })))
        .mount(&server)
        .await;

    let lights = client.list_lights(&ctx).await.unwrap();

    assert_eq!(lights.len(), 2);
    assert_eq!(lights[0].level, 65535);
    assert_eq!(lights[1].sub_type.as_deref(), Some("Switch"));
}

#[tokio::test]
async fn test_list_door_locks_and_media_rooms() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/doorlocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doorLocks": [{ "id": 9, "name": "Front door", "roomId": 1, "status": "Locked" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cws/api/mediarooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mediaRooms": [{
                "id": 30, "name": "Living", "currentVolumeLevel": 32768,
                "currentMuteState": "Unmuted", "currentPowerState": "On",
                "currentSourceId": 4,
                "availableSources": [{ "id": 4, "sourceName": "Apple TV" }]
            }]
        })))
        .mount(&server)
        .await;

    let locks = client.list_door_locks(&ctx).await.unwrap();
    let media = client.list_media_rooms(&ctx).await.unwrap();

    assert!(locks[0].is_locked());
    assert!(media[0].is_powered());
    assert!(!media[0].is_muted());
    assert_eq!(media[0].available_sources[0].source_name, "Apple TV");
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_set_light_levels_body() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cws/api/lights/SetState"))
        .and(body_json(json!({ "lights": [{ "id": 1, "level": 32768, "time": 0 }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_light_levels(
            &ctx,
            &[LightLevel {
                id: 1,
                level: 32768,
                time: 0,
            }],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_recall_scene_and_lock() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cws/api/scenes/recall/12"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cws/api/doorlocks/lock/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    client.recall_scene(&ctx, 12).await.unwrap();
    client.lock_door(&ctx, 9).await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_expired() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_scenes(&ctx).await;

    match result {
        Err(err) => assert!(err.is_auth_expired(), "expected auth expiry, got {err:?}"),
        Ok(_) => panic!("expected SessionExpired"),
    }
}

#[tokio::test]
async fn test_server_error_is_normalized() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cws/api/quickactions/5"))
        .respond_with(ResponseTemplate::new(500).set_body_string("processor busy"))
        .mount(&server)
        .await;

    let result = client.run_quick_action(&ctx, 5).await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "processor busy");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_body_with_200() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cws/api/thermostats/mode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failure",
            "errorMessage": "thermostat offline"
        })))
        .mount(&server)
        .await;

    let result = client.set_thermostat_mode(&ctx, 3, "HEAT").await;

    assert!(
        matches!(result, Err(Error::Api { ref message, .. }) if message == "thermostat offline"),
        "got {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_listing() {
    let (server, client, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cws/api/thermostats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let result = client.list_thermostats(&ctx).await;

    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
