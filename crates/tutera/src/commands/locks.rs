//! Door lock handlers.

use tabled::Tabled;

use tutera_core::{Controller, Device, DeviceKind, DeviceState};

use crate::cli::{GlobalOpts, LocksArgs, LocksCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct LockRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "State")]
    state: String,
}

pub async fn handle(
    controller: &Controller,
    args: LocksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (identifier, locked) = match args.command {
        LocksCommand::List => return list(controller, global),
        LocksCommand::Lock { lock } => (lock, true),
        LocksCommand::Unlock { lock } => (lock, false),
    };

    let lock = util::resolve_device(controller, DeviceKind::Lock, &identifier, "locks list")?;
    let ticket = controller.set_locked(&lock.id, locked)?;
    let verb = if locked { "Locked" } else { "Unlocked" };
    util::finish(ticket, &format!("{verb} {}", lock.name), global).await
}

fn list(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let locks: Vec<Device> = controller
        .devices_snapshot()
        .iter()
        .filter(|d| d.kind() == DeviceKind::Lock)
        .map(|d| (**d).clone())
        .collect();

    let color = output::should_color(global.color);
    let rendered = output::render_list(
        global.output,
        &locks,
        |d| {
            let locked = matches!(d.state, DeviceState::Lock { locked: true });
            LockRow {
                id: d.id.raw(),
                name: d.name.clone(),
                room: util::room_name(controller, d),
                state: output::paint_state(
                    if locked { "locked" } else { "unlocked" },
                    locked,
                    color,
                ),
            }
        },
        |d| d.id.raw().to_string(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
