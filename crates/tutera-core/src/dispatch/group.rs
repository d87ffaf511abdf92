// ── Room fan-out ──
//
// A room switch is one intent per member light, all in flight at once.
// Each member succeeds or rolls back on its own; the caller gets a list
// of the failures rather than an all-or-nothing answer.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use super::{CommandExecutor, Dispatcher};
use crate::error::{CoreError, DeviceFailure};
use crate::model::{Device, DeviceId, DeviceKind, RoomId};

/// Every member light of the room answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub room: RoomId,
    pub on: bool,
    pub succeeded: Vec<DeviceId>,
}

impl<E: CommandExecutor> Dispatcher<E> {
    /// Switch every light in `room`. Turning off remembers each dimmer's
    /// level; turning on restores each one from memory independently.
    pub async fn set_room_power(&self, room: &RoomId, on: bool) -> Result<GroupReport, CoreError> {
        if self.store().room(room).is_none() {
            return Err(CoreError::validation(format!("unknown room {room}")));
        }

        let lights: Vec<Arc<Device>> = self
            .store()
            .devices_in_room(room)
            .into_iter()
            .filter(|d| d.kind() == DeviceKind::Light)
            .collect();
        debug!(%room, on, lights = lights.len(), "room power");

        // Submit everything before awaiting anything.
        let submitted: Vec<_> = lights
            .into_iter()
            .map(|device| {
                let ticket = self.set_power(&device.id, on);
                (device, ticket)
            })
            .collect();

        let results = join_all(submitted.into_iter().map(|(device, ticket)| async move {
            let result = match ticket {
                Ok(ticket) => ticket.outcome().await,
                Err(e) => Err(e),
            };
            (device, result)
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();
        for (device, result) in results {
            match result {
                Ok(_) => succeeded.push(device.id),
                Err(error) => failures.push(DeviceFailure {
                    device: device.id,
                    name: device.name.clone(),
                    error: Box::new(error),
                }),
            }
        }

        if failures.is_empty() {
            return Ok(GroupReport {
                room: *room,
                on,
                succeeded,
            });
        }
        warn!(%room, failed = failures.len(), "room power partially failed");
        Err(CoreError::PartialFailure {
            succeeded,
            failures,
        })
    }
}
