// ── Device state store ──
//
// Reactive snapshot of everything the processor reported, plus the
// optimistic overlay the dispatcher maintains on top of it.

mod collection;
mod refresh;
mod revision;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tokio::sync::watch;

use crate::error::CoreError;
use crate::model::{
    Device, DeviceId, QuickAction, QuickActionId, Room, RoomId, RoomSummary, Scene, SceneId,
};
use crate::stream::EntityStream;

use collection::EntityCollection;
use revision::RevisionState;

pub use refresh::RefreshSnapshot;
pub use revision::{Reconciled, Revision, Rollback};

/// Central reactive store for rooms, devices, scenes and quick actions.
///
/// Mutations go through [`apply_refresh`](Self::apply_refresh),
/// [`apply_optimistic`](Self::apply_optimistic),
/// [`reconcile`](Self::reconcile) and [`rollback`](Self::rollback).
/// Per-device operations are serialized by the revision map's entry guard;
/// the device map is only ever locked after it.
pub struct DataStore {
    pub(crate) rooms: EntityCollection<RoomId, Room>,
    pub(crate) devices: EntityCollection<DeviceId, Device>,
    pub(crate) scenes: EntityCollection<SceneId, Scene>,
    pub(crate) quick_actions: EntityCollection<QuickActionId, QuickAction>,
    pub(crate) revisions: DashMap<DeviceId, RevisionState>,
    favorites: DashSet<SceneId>,
    summaries: watch::Sender<Arc<Vec<Arc<RoomSummary>>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (summaries, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);

        Self {
            rooms: EntityCollection::new(),
            devices: EntityCollection::new(),
            scenes: EntityCollection::new(),
            quick_actions: EntityCollection::new(),
            revisions: DashMap::new(),
            favorites: DashSet::new(),
            summaries,
            last_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn rooms_snapshot(&self) -> Arc<Vec<Arc<Room>>> {
        self.rooms.snapshot()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn scenes_snapshot(&self) -> Arc<Vec<Arc<Scene>>> {
        self.scenes.snapshot()
    }

    pub fn quick_actions_snapshot(&self) -> Arc<Vec<Arc<QuickAction>>> {
        self.quick_actions.snapshot()
    }

    pub fn room_summaries_snapshot(&self) -> Arc<Vec<Arc<RoomSummary>>> {
        self.summaries.borrow().clone()
    }

    // ── Single lookups ───────────────────────────────────────────────

    pub fn device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.get(id)
    }

    pub fn room(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(id)
    }

    pub fn scene(&self, id: &SceneId) -> Option<Arc<Scene>> {
        self.scenes.get(id)
    }

    pub fn quick_action(&self, id: &QuickActionId) -> Option<Arc<QuickAction>> {
        self.quick_actions.get(id)
    }

    pub fn room_summary(&self, id: &RoomId) -> Option<Arc<RoomSummary>> {
        self.summaries
            .borrow()
            .iter()
            .find(|s| s.room_id == *id)
            .cloned()
    }

    /// Devices assigned to `room`, in id order.
    pub fn devices_in_room(&self, room: &RoomId) -> Vec<Arc<Device>> {
        self.devices
            .snapshot()
            .iter()
            .filter(|d| d.room_id.as_ref() == Some(room))
            .cloned()
            .collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_rooms(&self) -> EntityStream<Room> {
        EntityStream::new(self.rooms.subscribe())
    }

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    pub fn subscribe_scenes(&self) -> EntityStream<Scene> {
        EntityStream::new(self.scenes.subscribe())
    }

    pub fn subscribe_quick_actions(&self) -> EntityStream<QuickAction> {
        EntityStream::new(self.quick_actions.subscribe())
    }

    pub fn subscribe_room_summaries(&self) -> EntityStream<RoomSummary> {
        EntityStream::new(self.summaries.subscribe())
    }

    // ── Scene favorites ──────────────────────────────────────────────

    /// Mark or unmark a scene as a favorite. Kept across refreshes for the
    /// lifetime of the store.
    pub fn set_scene_favorite(&self, id: &SceneId, favorite: bool) -> Result<(), CoreError> {
        let scene = self.scenes.get(id).ok_or_else(|| CoreError::NotFound {
            kind: "Scene",
            identifier: id.to_string(),
        })?;
        if favorite {
            self.favorites.insert(*id);
        } else {
            self.favorites.remove(id);
        }
        self.scenes.upsert(
            *id,
            Scene {
                favorite,
                ..(*scene).clone()
            },
        );
        Ok(())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// Seconds since the last successful refresh.
    pub fn data_age(&self) -> Option<i64> {
        self.last_refresh().map(|t| (Utc::now() - t).num_seconds())
    }

    /// Drop everything, e.g. after disconnecting.
    pub fn clear(&self) {
        self.revisions.clear();
        self.devices.clear();
        self.rooms.clear();
        self.scenes.clear();
        self.quick_actions.clear();
        self.last_refresh.send_replace(None);
        self.publish_summaries();
    }

    /// Rebuild every room's aggregate view from the current devices.
    /// Built under the `watch` lock so the last publisher wins with the
    /// newest device snapshot.
    pub(crate) fn publish_summaries(&self) {
        self.summaries.send_modify(|current| {
            let devices = self.devices.snapshot();
            let summaries: Vec<Arc<RoomSummary>> = self
                .rooms
                .snapshot()
                .iter()
                .map(|room| {
                    let members = devices.iter().filter(|d| d.room_id == Some(room.id));
                    Arc::new(RoomSummary::build(room, members.map(|d| &**d)))
                })
                .collect();
            *current = Arc::new(summaries);
        });
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
