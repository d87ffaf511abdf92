// ── Full refresh application logic ──
//
// Applies a complete snapshot fetched from the processor. Devices with
// an optimistic update still awaiting its answer keep their local state so
// a poll never yanks a slider out from under the user.

use std::collections::HashSet;
use std::hash::Hash;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::DataStore;
use super::collection::EntityCollection;
use super::revision::RevisionState;
use crate::model::{Device, DeviceId, QuickAction, Room, Scene};

/// Upsert all incoming entities, then prune any existing keys not in the
/// incoming set. This avoids the brief empty state that `clear()` causes.
fn upsert_and_prune<K, T>(collection: &EntityCollection<K, T>, items: Vec<(K, T)>)
where
    K: Eq + Hash + Ord + Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    let incoming: HashSet<K> = items.iter().map(|(k, _)| k.clone()).collect();
    for (key, entity) in items {
        collection.upsert(key, entity);
    }
    for existing in collection.keys() {
        if !incoming.contains(&existing) {
            collection.remove(&existing);
        }
    }
}

/// Everything fetched during one refresh cycle.
#[derive(Debug, Default)]
pub struct RefreshSnapshot {
    pub rooms: Vec<Room>,
    pub devices: Vec<Device>,
    pub scenes: Vec<Scene>,
    pub quick_actions: Vec<QuickAction>,
}

impl DataStore {
    /// Replace the store's contents with a fresh controller snapshot.
    pub fn apply_refresh(&self, snap: RefreshSnapshot) {
        upsert_and_prune(
            &self.rooms,
            snap.rooms.into_iter().map(|r| (r.id, r)).collect(),
        );

        let incoming: HashSet<DeviceId> = snap.devices.iter().map(|d| d.id).collect();
        let mut held = 0usize;
        for device in snap.devices {
            if !self.refresh_device(device) {
                held += 1;
            }
        }
        for existing in self.devices.keys() {
            if !incoming.contains(&existing) {
                self.revisions.remove(&existing);
                self.devices.remove(&existing);
            }
        }

        upsert_and_prune(
            &self.scenes,
            snap.scenes
                .into_iter()
                .map(|mut s| {
                    s.favorite = self.favorites.contains(&s.id);
                    (s.id, s)
                })
                .collect(),
        );
        upsert_and_prune(
            &self.quick_actions,
            snap.quick_actions
                .into_iter()
                .map(|q| (q.id, q))
                .collect(),
        );

        self.last_refresh.send_replace(Some(Utc::now()));
        self.publish_summaries();
        debug!(
            devices = incoming.len(),
            held_optimistic = held,
            "refresh applied"
        );
    }

    /// Upsert one polled device. Returns `false` when its state was held
    /// back because an optimistic update is unsettled.
    fn refresh_device(&self, incoming: Device) -> bool {
        match self.revisions.entry(incoming.id) {
            Entry::Vacant(slot) => {
                slot.insert(RevisionState::new(incoming.state.clone()));
                self.devices.upsert(incoming.id, incoming);
                true
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.baseline = incoming.state.clone();
                if entry.is_settled() {
                    self.devices.upsert(incoming.id, incoming);
                    return true;
                }
                let local = self
                    .devices
                    .get(&incoming.id)
                    .map_or_else(|| incoming.state.clone(), |d| d.state.clone());
                self.devices.upsert(
                    incoming.id,
                    Device {
                        state: local,
                        ..incoming
                    },
                );
                false
            }
        }
    }
}
