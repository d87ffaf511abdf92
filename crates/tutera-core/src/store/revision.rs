// ── Revision-tagged optimistic updates ──
//
// Every device carries a monotonic revision. An optimistic patch bumps
// it; a controller answer only wins if it was requested at the revision
// that is still current. Older answers update the rollback baseline and
// nothing else.

use serde::Serialize;
use tracing::{debug, warn};

use super::DataStore;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, DevicePatch, DeviceState};

/// Per-device monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Bookkeeping kept beside each device.
#[derive(Debug, Clone)]
pub(crate) struct RevisionState {
    pub(crate) current: Revision,
    /// Highest revision whose outcome is known (confirmed or rolled back).
    pub(crate) settled: Revision,
    /// Last state the controller confirmed.
    pub(crate) baseline: DeviceState,
}

impl RevisionState {
    pub(crate) fn new(baseline: DeviceState) -> Self {
        Self {
            current: Revision::default(),
            settled: Revision::default(),
            baseline,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.current == self.settled
    }
}

/// Result of feeding a controller answer back into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The answer is now the device's state.
    Applied,
    /// A newer optimistic update is pending; only the baseline moved.
    Superseded,
    /// The device vanished from the store in the meantime.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    RolledBack,
    Superseded,
    Unknown,
}

impl DataStore {
    /// Apply `patch` locally before the controller confirms it.
    ///
    /// Returns the revision the caller must quote when reconciling or
    /// rolling back.
    pub fn apply_optimistic(&self, id: &DeviceId, patch: &DevicePatch) -> Result<Revision, CoreError> {
        let revision = {
            let mut entry = self
                .revisions
                .get_mut(id)
                .ok_or_else(|| CoreError::validation(format!("unknown device {id}")))?;
            let device = self
                .devices
                .get(id)
                .ok_or_else(|| CoreError::validation(format!("unknown device {id}")))?;

            let state = device.state.apply(patch)?;
            entry.current = entry.current.next();
            self.devices.upsert(*id, with_state(&device, state));
            entry.current
        };

        debug!(device = %id, ?patch, revision = revision.0, "optimistic update");
        self.publish_summaries();
        Ok(revision)
    }

    /// Feed the controller's view of a device back in.
    pub fn reconcile(&self, id: &DeviceId, server: DeviceState, at: Revision) -> Reconciled {
        self.settle(id, at, |_| Ok(server))
    }

    /// Reconcile a command whose response carries no state: the confirmed
    /// state is the baseline with `patch` applied.
    pub fn confirm(&self, id: &DeviceId, patch: &DevicePatch, at: Revision) -> Reconciled {
        self.settle(id, at, |baseline| baseline.apply(patch))
    }

    /// Restore the last confirmed state after a failed command, unless a
    /// newer optimistic update owns the device by now.
    pub fn rollback(&self, id: &DeviceId, at: Revision) -> Rollback {
        let outcome = {
            let Some(mut entry) = self.revisions.get_mut(id) else {
                return Rollback::Unknown;
            };
            if entry.current != at {
                Rollback::Superseded
            } else {
                entry.settled = at;
                if let Some(device) = self.devices.get(id) {
                    self.devices.upsert(*id, with_state(&device, entry.baseline.clone()));
                }
                Rollback::RolledBack
            }
        };

        debug!(device = %id, revision = at.0, ?outcome, "rollback");
        if outcome == Rollback::RolledBack {
            self.publish_summaries();
        }
        outcome
    }

    /// Current revision of a device.
    pub fn revision(&self, id: &DeviceId) -> Option<Revision> {
        self.revisions.get(id).map(|e| e.current)
    }

    /// `true` when no optimistic update on the device awaits an answer.
    pub fn is_settled(&self, id: &DeviceId) -> bool {
        self.revisions.get(id).is_none_or(|e| e.is_settled())
    }

    fn settle(
        &self,
        id: &DeviceId,
        at: Revision,
        resolve: impl FnOnce(&DeviceState) -> Result<DeviceState, CoreError>,
    ) -> Reconciled {
        let outcome = {
            let Some(mut entry) = self.revisions.get_mut(id) else {
                return Reconciled::Unknown;
            };
            if at < entry.settled {
                // Answer to a request older than one already settled.
                return Reconciled::Superseded;
            }
            let confirmed = match resolve(&entry.baseline) {
                Ok(state) => state,
                Err(e) => {
                    warn!(device = %id, error = %e, "confirmed state could not be derived");
                    return Reconciled::Unknown;
                }
            };
            entry.baseline = confirmed.clone();

            if entry.current == at {
                entry.settled = at;
                if let Some(device) = self.devices.get(id) {
                    self.devices.upsert(*id, with_state(&device, confirmed));
                }
                Reconciled::Applied
            } else {
                Reconciled::Superseded
            }
        };

        debug!(device = %id, revision = at.0, ?outcome, "reconciled");
        if outcome == Reconciled::Applied {
            self.publish_summaries();
        }
        outcome
    }
}

fn with_state(device: &Device, state: DeviceState) -> Device {
    Device {
        state,
        ..device.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{DeviceKind, Percent, RoomId};
    use crate::store::RefreshSnapshot;

    fn pct(v: u8) -> Percent {
        Percent::new(v).unwrap()
    }

    fn dimmer_id() -> DeviceId {
        DeviceId::new(DeviceKind::Light, 1)
    }

    fn store_with_dimmer(level: u8) -> DataStore {
        let store = DataStore::new();
        store.apply_refresh(RefreshSnapshot {
            devices: vec![Device {
                id: dimmer_id(),
                name: "Pendant".into(),
                room_id: Some(RoomId(1)),
                state: DeviceState::Dimmer { brightness: pct(level) },
            }],
            ..RefreshSnapshot::default()
        });
        store
    }

    fn brightness(store: &DataStore) -> Percent {
        store.device(&dimmer_id()).unwrap().state.brightness().unwrap()
    }

    #[test]
    fn optimistic_then_reconcile_applies_server_value() {
        let store = store_with_dimmer(10);
        let rev = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(60)))
            .unwrap();
        assert_eq!(brightness(&store), pct(60));
        assert!(!store.is_settled(&dimmer_id()));

        let outcome = store.reconcile(
            &dimmer_id(),
            DeviceState::Dimmer { brightness: pct(58) },
            rev,
        );

        assert_eq!(outcome, Reconciled::Applied);
        assert_eq!(brightness(&store), pct(58));
        assert!(store.is_settled(&dimmer_id()));
    }

    #[test]
    fn stale_reconcile_keeps_newer_local_value() {
        let store = store_with_dimmer(10);
        let first = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(30)))
            .unwrap();
        store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(90)))
            .unwrap();

        let outcome = store.reconcile(
            &dimmer_id(),
            DeviceState::Dimmer { brightness: pct(30) },
            first,
        );

        assert_eq!(outcome, Reconciled::Superseded);
        assert_eq!(brightness(&store), pct(90));
    }

    #[test]
    fn rollback_restores_baseline() {
        let store = store_with_dimmer(10);
        let rev = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(80)))
            .unwrap();

        assert_eq!(store.rollback(&dimmer_id(), rev), Rollback::RolledBack);
        assert_eq!(brightness(&store), pct(10));
        assert!(store.is_settled(&dimmer_id()));
    }

    #[test]
    fn superseded_rollback_is_ignored() {
        let store = store_with_dimmer(10);
        let first = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(20)))
            .unwrap();
        store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(40)))
            .unwrap();

        assert_eq!(store.rollback(&dimmer_id(), first), Rollback::Superseded);
        assert_eq!(brightness(&store), pct(40));
    }

    #[test]
    fn rollback_after_stale_confirm_uses_confirmed_baseline() {
        let store = store_with_dimmer(10);
        let first = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(20)))
            .unwrap();
        let second = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Brightness(pct(40)))
            .unwrap();

        store.confirm(&dimmer_id(), &DevicePatch::Brightness(pct(20)), first);
        store.rollback(&dimmer_id(), second);

        assert_eq!(brightness(&store), pct(20));
    }

    #[test]
    fn mismatched_patch_is_rejected_without_bumping() {
        let store = store_with_dimmer(10);
        let before = store.revision(&dimmer_id()).unwrap();

        let err = store
            .apply_optimistic(&dimmer_id(), &DevicePatch::Locked(true))
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(store.revision(&dimmer_id()).unwrap(), before);
    }

    #[test]
    fn unknown_device_is_a_validation_error() {
        let store = DataStore::new();
        let result = store.apply_optimistic(
            &DeviceId::new(DeviceKind::Lock, 99),
            &DevicePatch::Locked(true),
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn parallel_updates_all_reach_room_summary() {
        for _ in 0..50 {
            let store = DataStore::new();
            store.apply_refresh(RefreshSnapshot {
                devices: (1..=8)
                    .map(|raw| Device {
                        id: DeviceId::new(DeviceKind::Light, raw),
                        name: format!("Light {raw}"),
                        room_id: Some(RoomId(1)),
                        state: DeviceState::Dimmer { brightness: Percent::ZERO },
                    })
                    .collect(),
                rooms: vec![crate::model::Room {
                    id: RoomId(1),
                    name: "Kitchen".into(),
                    area_id: None,
                    area_name: None,
                }],
                ..RefreshSnapshot::default()
            });

            std::thread::scope(|scope| {
                for raw in 1..=8 {
                    let store = &store;
                    scope.spawn(move || {
                        let id = DeviceId::new(DeviceKind::Light, raw);
                        store
                            .apply_optimistic(&id, &DevicePatch::Brightness(pct(100)))
                            .unwrap();
                    });
                }
            });

            assert!(store.devices_snapshot().iter().all(|d| d.is_on()));
            assert_eq!(store.room_summary(&RoomId(1)).unwrap().lights_on, 8);
        }
    }
}
