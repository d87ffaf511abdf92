// ── Rooms and room aggregates ──

use serde::Serialize;

use super::device::{ClimateMode, Device, DeviceState};
use super::ids::RoomId;
use super::level::{Percent, Temperature};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub area_id: Option<u32>,
    pub area_name: Option<String>,
}

/// Derived view of a room, rebuilt from its devices on every store change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub name: String,
    pub area_name: Option<String>,
    pub lights_on: usize,
    pub lights_total: usize,
    /// Mean brightness of the lit lights; `None` when the room is dark.
    pub average_brightness: Option<Percent>,
    pub climate: Option<ClimateSummary>,
    pub media: Option<MediaSummary>,
    pub locks_locked: usize,
    pub locks_total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateSummary {
    pub current: Option<Temperature>,
    pub setpoint: Option<Temperature>,
    pub mode: ClimateMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub powered: bool,
    pub volume: Percent,
    pub source: Option<String>,
}

impl RoomSummary {
    /// Fold the devices that belong to `room` into a summary.
    ///
    /// The first thermostat and media room found provide the climate and
    /// media summaries.
    pub fn build<'a>(room: &Room, devices: impl IntoIterator<Item = &'a Device>) -> Self {
        let mut summary = Self {
            room_id: room.id,
            name: room.name.clone(),
            area_name: room.area_name.clone(),
            lights_on: 0,
            lights_total: 0,
            average_brightness: None,
            climate: None,
            media: None,
            locks_locked: 0,
            locks_total: 0,
        };
        let mut lit_sum: i64 = 0;

        for device in devices {
            match &device.state {
                state @ (DeviceState::Dimmer { .. } | DeviceState::Switch { .. }) => {
                    summary.lights_total += 1;
                    if state.is_on() {
                        summary.lights_on += 1;
                        lit_sum += state
                            .brightness()
                            .map_or(0, |p| i64::from(p.value()));
                    }
                }
                DeviceState::Thermostat(c) => {
                    summary.climate.get_or_insert_with(|| ClimateSummary {
                        current: c.current,
                        setpoint: c.setpoint,
                        mode: c.mode,
                    });
                }
                DeviceState::Media(m) => {
                    summary.media.get_or_insert_with(|| MediaSummary {
                        powered: m.powered,
                        volume: m.volume,
                        source: m.source_name().map(str::to_owned),
                    });
                }
                DeviceState::Lock { locked } => {
                    summary.locks_total += 1;
                    if *locked {
                        summary.locks_locked += 1;
                    }
                }
            }
        }

        if summary.lights_on > 0 {
            let lit = i64::try_from(summary.lights_on).unwrap_or(i64::MAX);
            summary.average_brightness = Some(Percent::clamped((lit_sum + lit / 2) / lit));
        }
        summary
    }

    pub fn any_light_on(&self) -> bool {
        self.lights_on > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceId, DeviceKind};

    fn light(raw: u32, pct: u8) -> Device {
        Device {
            id: DeviceId::new(DeviceKind::Light, raw),
            name: format!("Light {raw}"),
            room_id: Some(RoomId(1)),
            state: DeviceState::Dimmer {
                brightness: Percent::new(pct).unwrap(),
            },
        }
    }

    fn kitchen() -> Room {
        Room {
            id: RoomId(1),
            name: "Kitchen".into(),
            area_id: None,
            area_name: None,
        }
    }

    #[test]
    fn average_covers_lit_lights_only() {
        let devices = [light(1, 40), light(2, 81), light(3, 0)];
        let summary = RoomSummary::build(&kitchen(), &devices);

        assert_eq!(summary.lights_total, 3);
        assert_eq!(summary.lights_on, 2);
        assert_eq!(summary.average_brightness, Some(Percent::new(61).unwrap()));
    }

    #[test]
    fn dark_room_has_no_average() {
        let devices = [light(1, 0)];
        let summary = RoomSummary::build(&kitchen(), &devices);
        assert!(!summary.any_light_on());
        assert_eq!(summary.average_brightness, None);
    }

    #[test]
    fn locks_are_counted() {
        let lock = Device {
            id: DeviceId::new(DeviceKind::Lock, 9),
            name: "Back door".into(),
            room_id: Some(RoomId(1)),
            state: DeviceState::Lock { locked: true },
        };
        let summary = RoomSummary::build(&kitchen(), [&lock]);
        assert_eq!((summary.locks_locked, summary.locks_total), (1, 1));
    }
}
