// ── Identity types ──
//
// The processor numbers each subsystem independently (light 12 and
// thermostat 12 can coexist), so a device id carries its capability kind.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::CoreError;

// ── DeviceKind ──────────────────────────────────────────────────────

/// Which listing endpoint a device came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Thermostat,
    Lock,
    Media,
}

// ── DeviceId ────────────────────────────────────────────────────────

/// Stable device identifier, rendered as `kind:number` (e.g. `light:1001`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId {
    kind: DeviceKind,
    raw: u32,
}

impl DeviceId {
    pub const fn new(kind: DeviceKind, raw: u32) -> Self {
        Self { kind, raw }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// The processor's own numeric id.
    pub fn raw(&self) -> u32 {
        self.raw
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.raw)
    }
}

impl FromStr for DeviceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw) = s
            .split_once(':')
            .ok_or_else(|| CoreError::validation(format!("device id `{s}` is not kind:number")))?;
        let kind = kind
            .parse::<DeviceKind>()
            .map_err(|_| CoreError::validation(format!("unknown device kind `{kind}`")))?;
        let raw = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::validation(format!("device number `{raw}` is not numeric")))?;
        Ok(Self { kind, raw })
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Plain numeric ids ───────────────────────────────────────────────

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u32>().map(Self).map_err(|_| {
                    CoreError::validation(format!(
                        concat!(stringify!($name), " `{}` is not numeric"),
                        s
                    ))
                })
            }
        }
    };
}

numeric_id!(RoomId);
numeric_id!(SceneId);
numeric_id!(
    /// Controller-defined one-shot shortcut.
    QuickActionId
);

// ── Target ──────────────────────────────────────────────────────────

/// Anything a command can be addressed to. Each target gets its own
/// single-slot mailbox in the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Device(DeviceId),
    Scene(SceneId),
    QuickAction(QuickActionId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(id) => write!(f, "{id}"),
            Self::Scene(id) => write!(f, "scene:{id}"),
            Self::QuickAction(id) => write!(f, "quickaction:{id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn device_id_display_and_parse() {
        let id = DeviceId::new(DeviceKind::Light, 1001);
        assert_eq!(id.to_string(), "light:1001");
        assert_eq!("light:1001".parse::<DeviceId>().unwrap(), id);
        assert_eq!("LOCK:7".parse::<DeviceId>().unwrap().kind(), DeviceKind::Lock);
    }

    #[test]
    fn malformed_device_id_is_a_validation_error() {
        for bad in ["1001", "lamp:3", "light:x", ""] {
            assert!(
                matches!(bad.parse::<DeviceId>(), Err(CoreError::Validation { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn device_id_serializes_as_string() {
        let id = DeviceId::new(DeviceKind::Media, 4);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"media:4\"");
    }

    #[test]
    fn ids_of_different_kinds_are_distinct() {
        assert_ne!(
            DeviceId::new(DeviceKind::Light, 12),
            DeviceId::new(DeviceKind::Thermostat, 12)
        );
    }
}
