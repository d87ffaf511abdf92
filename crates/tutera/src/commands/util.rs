//! Shared helpers for command handlers.

use std::sync::Arc;

use tutera_core::{
    CommandOutcome, CommandTicket, Controller, Device, DeviceKind, QuickAction, Room, Scene,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Match an identifier against an item's numeric id or its name
/// (case-insensitive). Ids win; a name shared by several items is an error.
fn find_one<T>(
    items: &[Arc<T>],
    identifier: &str,
    id_of: impl Fn(&T) -> String,
    name_of: impl Fn(&T) -> &str,
    resource_type: &str,
    list_command: &str,
) -> Result<Arc<T>, CliError> {
    let wanted = identifier.trim();
    if let Some(hit) = items.iter().find(|item| id_of(&***item) == wanted) {
        return Ok(Arc::clone(hit));
    }

    let mut by_name = items
        .iter()
        .filter(|item| name_of(&***item).eq_ignore_ascii_case(wanted));
    match (by_name.next(), by_name.next()) {
        (Some(hit), None) => Ok(Arc::clone(hit)),
        (Some(_), Some(_)) => Err(CliError::validation(
            resource_type,
            format!("'{wanted}' matches more than one {resource_type}; use its id"),
        )),
        (None, _) => Err(CliError::NotFound {
            resource_type: resource_type.into(),
            identifier: wanted.into(),
            list_command: list_command.into(),
        }),
    }
}

pub fn resolve_room(controller: &Controller, identifier: &str) -> Result<Arc<Room>, CliError> {
    let rooms = controller.rooms_snapshot();
    find_one(
        &rooms,
        identifier,
        |r| r.id.to_string(),
        |r| r.name.as_str(),
        "room",
        "rooms list",
    )
}

/// Resolve a device of `kind` by number, `kind:number`, or name.
pub fn resolve_device(
    controller: &Controller,
    kind: DeviceKind,
    identifier: &str,
    list_command: &str,
) -> Result<Arc<Device>, CliError> {
    let devices: Vec<Arc<Device>> = controller
        .devices_snapshot()
        .iter()
        .filter(|d| d.kind() == kind)
        .cloned()
        .collect();
    let wanted = identifier
        .trim()
        .strip_prefix(&format!("{kind}:"))
        .unwrap_or(identifier);
    find_one(
        &devices,
        wanted,
        |d| d.id.raw().to_string(),
        |d| d.name.as_str(),
        &kind.to_string(),
        list_command,
    )
}

pub fn resolve_scene(controller: &Controller, identifier: &str) -> Result<Arc<Scene>, CliError> {
    let scenes = controller.scenes_snapshot();
    find_one(
        &scenes,
        identifier,
        |s| s.id.to_string(),
        |s| s.name.as_str(),
        "scene",
        "scenes list",
    )
}

pub fn resolve_quick_action(
    controller: &Controller,
    identifier: &str,
) -> Result<Arc<QuickAction>, CliError> {
    let actions = controller.quick_actions_snapshot();
    find_one(
        &actions,
        identifier,
        |a| a.id.to_string(),
        |a| a.name.as_str(),
        "quick action",
        "quick-actions list",
    )
}

/// Name of the room a device sits in, or `-`.
pub fn room_name(controller: &Controller, device: &Device) -> String {
    device
        .room_id
        .and_then(|id| controller.store().room(&id))
        .map_or_else(|| "-".into(), |room| room.name.clone())
}

/// Wait for a command to settle and print `done` unless quiet.
pub async fn finish(ticket: CommandTicket, done: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let target = ticket.target();
    let outcome = ticket.outcome().await?;
    tracing::debug!(%target, ?outcome, "command settled");
    if outcome == CommandOutcome::Confirmed {
        output::print_output(done, global.quiet);
    }
    Ok(())
}
