// ── Wire → domain conversion ──
//
// Pure functions from `tutera_api::models` payloads to canonical model
// types. Kept free of store access so refresh code can build a complete
// snapshot before touching shared state.

use tutera_api::models::{
    DoorLockPayload, LightPayload, MediaRoomPayload, QuickActionPayload, RoomPayload,
    ScenePayload, ThermostatPayload,
};

use crate::model::{
    ClimateMode, ClimateState, Device, DeviceId, DeviceKind, DeviceState, MediaSource, MediaState,
    Percent, QuickAction, QuickActionId, Room, RoomId, Scene, SceneId, Temperature,
};

impl From<RoomPayload> for Room {
    fn from(p: RoomPayload) -> Self {
        Self {
            id: RoomId(p.id),
            name: p.name,
            area_id: p.area_id,
            area_name: p.area_name,
        }
    }
}

impl From<LightPayload> for Device {
    fn from(p: LightPayload) -> Self {
        let is_switch = p
            .sub_type
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("switch"));
        let state = if is_switch {
            DeviceState::Switch { on: p.level > 0 }
        } else {
            DeviceState::Dimmer {
                brightness: Percent::from_level(p.level),
            }
        };
        Self {
            id: DeviceId::new(DeviceKind::Light, p.id),
            name: p.name,
            room_id: p.room_id.map(RoomId),
            state,
        }
    }
}

impl From<ThermostatPayload> for Device {
    fn from(p: ThermostatPayload) -> Self {
        let mode = p
            .mode
            .as_deref()
            .and_then(|m| m.parse::<ClimateMode>().ok())
            .unwrap_or_default();
        // Prefer the setpoint that matches the active mode.
        let setpoint = p
            .current_set_point
            .iter()
            .find(|sp| sp.kind.eq_ignore_ascii_case(mode.setpoint_kind()))
            .or_else(|| p.current_set_point.first())
            .map(|sp| Temperature::from_tenths(sp.temperature));

        Self {
            id: DeviceId::new(DeviceKind::Thermostat, p.id),
            name: p.name,
            room_id: p.room_id.map(RoomId),
            state: DeviceState::Thermostat(ClimateState {
                current: p.current_temperature.map(Temperature::from_tenths),
                setpoint,
                mode,
            }),
        }
    }
}

impl From<DoorLockPayload> for Device {
    fn from(p: DoorLockPayload) -> Self {
        let locked = p.is_locked();
        Self {
            id: DeviceId::new(DeviceKind::Lock, p.id),
            name: p.name,
            room_id: p.room_id.map(RoomId),
            state: DeviceState::Lock { locked },
        }
    }
}

impl From<MediaRoomPayload> for Device {
    fn from(p: MediaRoomPayload) -> Self {
        let (powered, muted) = (p.is_powered(), p.is_muted());
        Self {
            id: DeviceId::new(DeviceKind::Media, p.id),
            name: p.name,
            room_id: p.room_id.map(RoomId),
            state: DeviceState::Media(MediaState {
                powered,
                volume: Percent::from_level(p.current_volume_level),
                muted,
                source: p.current_source_id,
                sources: p
                    .available_sources
                    .into_iter()
                    .map(|s| MediaSource {
                        id: s.id,
                        name: s.source_name,
                    })
                    .collect(),
            }),
        }
    }
}

impl From<ScenePayload> for Scene {
    fn from(p: ScenePayload) -> Self {
        Self {
            id: SceneId(p.id),
            name: p.name,
            room_id: p.room_id.map(RoomId),
            kind: p.kind,
            active: p.status,
            favorite: false,
        }
    }
}

impl From<QuickActionPayload> for QuickAction {
    fn from(p: QuickActionPayload) -> Self {
        Self {
            id: QuickActionId(p.id),
            name: p.name,
        }
    }
}
