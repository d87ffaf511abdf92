// Processor REST payloads
//
// Wire shapes for the `/cws/api` endpoints. Listings arrive either bare or
// wrapped under a named field (see `client::extract_list`). Fields use
// `#[serde(default)]` liberally because firmware revisions disagree about
// which ones are present.

use serde::{Deserialize, Serialize};

// ── Login ────────────────────────────────────────────────────────────

/// Body of a successful `GET /login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default, alias = "authKey", alias = "AuthKey")]
    pub authkey: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Status envelope returned by command endpoints.
///
/// ```json
/// { "version": "2.000", "status": "success" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_source: Option<String>,
}

// ── Rooms ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub area_id: Option<u32>,
    #[serde(default)]
    pub area_name: Option<String>,
}

// ── Lights ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub room_id: Option<u32>,
    /// `"Dimmer"` or `"Switch"`.
    #[serde(default)]
    pub sub_type: Option<String>,
    /// 0..=65535.
    #[serde(default)]
    pub level: u16,
}

/// One entry of a `POST /lights/SetState` body.
#[derive(Debug, Clone, Serialize)]
pub struct LightLevel {
    pub id: u32,
    pub level: u16,
    /// Ramp time in seconds.
    pub time: u32,
}

// ── Thermostats ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub room_id: Option<u32>,
    /// Tenths of a degree.
    #[serde(default)]
    pub current_temperature: Option<i32>,
    #[serde(default)]
    pub current_set_point: Vec<SetPointPayload>,
    /// `"HEAT"`, `"COOL"`, `"AUTO"`, `"OFF"`.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub temperature_units: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPointPayload {
    #[serde(rename = "type")]
    pub kind: String,
    /// Tenths of a degree.
    pub temperature: i32,
}

// ── Door locks ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorLockPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub room_id: Option<u32>,
    /// `"locked"` / `"unlocked"` (case varies by firmware).
    #[serde(default)]
    pub status: Option<String>,
}

impl DoorLockPayload {
    pub fn is_locked(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("locked"))
    }
}

// ── Scenes & quick actions ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub room_id: Option<u32>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// `true` while the scene's target state matches the room.
    #[serde(default)]
    pub status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickActionPayload {
    pub id: u32,
    pub name: String,
}

// ── Media rooms ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRoomPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub room_id: Option<u32>,
    /// 0..=65535.
    #[serde(default)]
    pub current_volume_level: u16,
    /// `"Muted"` / `"Unmuted"`.
    #[serde(default)]
    pub current_mute_state: Option<String>,
    /// `"On"` / `"Off"`.
    #[serde(default)]
    pub current_power_state: Option<String>,
    #[serde(default)]
    pub current_source_id: Option<u32>,
    #[serde(default)]
    pub available_sources: Vec<MediaSourcePayload>,
}

impl MediaRoomPayload {
    pub fn is_powered(&self) -> bool {
        self.current_power_state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("on"))
    }

    pub fn is_muted(&self) -> bool {
        self.current_mute_state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("muted"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSourcePayload {
    pub id: u32,
    #[serde(alias = "name")]
    pub source_name: String,
}
