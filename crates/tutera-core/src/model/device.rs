// ── Devices ──
//
// A device is identity plus a capability-specific state. State only
// changes through `DeviceState::apply` (optimistic updates) or a fresh
// controller snapshot.

use serde::Serialize;
use strum::{Display, EnumString};

use super::ids::{DeviceId, DeviceKind, RoomId};
use super::level::{Percent, Temperature};
use crate::error::CoreError;

/// Canonical device type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub room_id: Option<RoomId>,
    pub state: DeviceState,
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        self.id.kind()
    }

    /// Lights count as on when lit; other kinds when powered or locked.
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }
}

// ── State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceState {
    Dimmer { brightness: Percent },
    Switch { on: bool },
    Thermostat(ClimateState),
    Lock { locked: bool },
    Media(MediaState),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateState {
    pub current: Option<Temperature>,
    pub setpoint: Option<Temperature>,
    pub mode: ClimateMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaState {
    pub powered: bool,
    pub volume: Percent,
    pub muted: bool,
    pub source: Option<u32>,
    pub sources: Vec<MediaSource>,
}

impl MediaState {
    pub fn source_name(&self) -> Option<&str> {
        let current = self.source?;
        self.sources
            .iter()
            .find(|s| s.id == current)
            .map(|s| s.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSource {
    pub id: u32,
    pub name: String,
}

/// Thermostat operating mode. Wire form is upper case (`HEAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ClimateMode {
    #[default]
    Off,
    Heat,
    Cool,
    Auto,
}

impl ClimateMode {
    /// Setpoint type the processor expects when adjusting in this mode.
    pub fn setpoint_kind(self) -> &'static str {
        match self {
            Self::Heat => "Heat",
            Self::Cool => "Cool",
            Self::Auto | Self::Off => "Auto",
        }
    }
}

impl DeviceState {
    pub fn is_on(&self) -> bool {
        match self {
            Self::Dimmer { brightness } => !brightness.is_zero(),
            Self::Switch { on } => *on,
            Self::Thermostat(c) => c.mode != ClimateMode::Off,
            Self::Lock { locked } => *locked,
            Self::Media(m) => m.powered,
        }
    }

    /// Brightness as a percentage for either light flavor.
    pub fn brightness(&self) -> Option<Percent> {
        match self {
            Self::Dimmer { brightness } => Some(*brightness),
            Self::Switch { on } => Some(if *on { Percent::FULL } else { Percent::ZERO }),
            _ => None,
        }
    }

    /// Produce the state that results from `patch`, or a validation error
    /// when the patch does not fit this capability.
    pub fn apply(&self, patch: &DevicePatch) -> Result<Self, CoreError> {
        let next = match (self, patch) {
            (Self::Dimmer { brightness }, DevicePatch::Power(on)) => Self::Dimmer {
                brightness: match (*on, brightness.is_zero()) {
                    (false, _) => Percent::ZERO,
                    (true, true) => Percent::FULL,
                    (true, false) => *brightness,
                },
            },
            (Self::Dimmer { .. }, DevicePatch::Brightness(p)) => Self::Dimmer { brightness: *p },
            (Self::Switch { .. }, DevicePatch::Power(on)) => Self::Switch { on: *on },
            (Self::Switch { .. }, DevicePatch::Brightness(p)) => Self::Switch { on: !p.is_zero() },
            (Self::Lock { .. }, DevicePatch::Locked(locked)) => Self::Lock { locked: *locked },
            (Self::Thermostat(c), DevicePatch::Setpoint(t)) => Self::Thermostat(ClimateState {
                setpoint: Some(*t),
                ..c.clone()
            }),
            (Self::Thermostat(c), DevicePatch::Mode(mode)) => Self::Thermostat(ClimateState {
                mode: *mode,
                ..c.clone()
            }),
            (Self::Media(m), DevicePatch::Power(on)) => Self::Media(MediaState {
                powered: *on,
                ..m.clone()
            }),
            (Self::Media(m), DevicePatch::Volume(v)) => Self::Media(MediaState {
                volume: *v,
                ..m.clone()
            }),
            (Self::Media(m), DevicePatch::Source(source)) => {
                if !m.sources.is_empty() && !m.sources.iter().any(|s| s.id == *source) {
                    return Err(CoreError::validation(format!(
                        "source {source} is not available in this media room"
                    )));
                }
                Self::Media(MediaState {
                    powered: true,
                    source: Some(*source),
                    ..m.clone()
                })
            }
            (state, patch) => {
                return Err(CoreError::validation(format!(
                    "{} cannot be applied to a {}",
                    patch.describe(),
                    state.capability()
                )));
            }
        };
        Ok(next)
    }

    fn capability(&self) -> &'static str {
        match self {
            Self::Dimmer { .. } => "dimmer",
            Self::Switch { .. } => "switch",
            Self::Thermostat(_) => "thermostat",
            Self::Lock { .. } => "lock",
            Self::Media(_) => "media room",
        }
    }
}

// ── Patches ─────────────────────────────────────────────────────────

/// A partial state change requested by an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum DevicePatch {
    Power(bool),
    Brightness(Percent),
    Locked(bool),
    Setpoint(Temperature),
    Mode(ClimateMode),
    Volume(Percent),
    Source(u32),
}

impl DevicePatch {
    /// Continuous patches are debounced instead of sent per value.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Brightness(_) | Self::Volume(_))
    }

    fn describe(&self) -> String {
        match self {
            Self::Power(on) => format!("power {}", if *on { "on" } else { "off" }),
            Self::Brightness(p) => format!("brightness {p}"),
            Self::Locked(true) => "lock".into(),
            Self::Locked(false) => "unlock".into(),
            Self::Setpoint(t) => format!("setpoint {t}"),
            Self::Mode(m) => format!("mode {m}"),
            Self::Volume(p) => format!("volume {p}"),
            Self::Source(s) => format!("source {s}"),
        }
    }
}
