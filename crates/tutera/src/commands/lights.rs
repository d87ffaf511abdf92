//! Light handlers.

use tabled::Tabled;

use tutera_core::{Controller, Device, DeviceKind, DeviceState, Percent};

use crate::cli::{GlobalOpts, LightsArgs, LightsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct LightRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "State")]
    state: String,
}

fn light_row(controller: &Controller, d: &Device, color: bool) -> LightRow {
    let (kind, state) = match d.state {
        DeviceState::Dimmer { brightness } if brightness.is_zero() => ("dimmer", "off".into()),
        DeviceState::Dimmer { brightness } => ("dimmer", brightness.to_string()),
        DeviceState::Switch { on } => ("switch", if on { "on" } else { "off" }.to_owned()),
        _ => ("-", "-".into()),
    };
    LightRow {
        id: d.id.raw(),
        name: d.name.clone(),
        room: util::room_name(controller, d),
        kind,
        state: output::paint_state(&state, d.is_on(), color),
    }
}

pub async fn handle(
    controller: &Controller,
    args: LightsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LightsCommand::List { room } => list(controller, room.as_deref(), global),
        LightsCommand::On { light } => {
            let light = resolve(controller, &light)?;
            let ticket = controller.set_power(&light.id, true)?;
            util::finish(ticket, &format!("{} switched on", light.name), global).await
        }
        LightsCommand::Off { light } => {
            let light = resolve(controller, &light)?;
            let ticket = controller.set_power(&light.id, false)?;
            util::finish(ticket, &format!("{} switched off", light.name), global).await
        }
        LightsCommand::Toggle { light } => {
            let light = resolve(controller, &light)?;
            let ticket = controller.toggle(&light.id)?;
            let state = if light.is_on() { "off" } else { "on" };
            util::finish(ticket, &format!("{} switched {state}", light.name), global).await
        }
        LightsCommand::Dim { light, level } => {
            let light = resolve(controller, &light)?;
            let level = Percent::new(level)?;
            let ticket = controller.set_brightness(&light.id, level)?;
            util::finish(ticket, &format!("{} set to {level}", light.name), global).await
        }
    }
}

fn resolve(controller: &Controller, identifier: &str) -> Result<std::sync::Arc<Device>, CliError> {
    util::resolve_device(controller, DeviceKind::Light, identifier, "lights list")
}

fn list(controller: &Controller, room: Option<&str>, global: &GlobalOpts) -> Result<(), CliError> {
    let room_id = room
        .map(|r| util::resolve_room(controller, r).map(|room| room.id))
        .transpose()?;

    let lights: Vec<Device> = controller
        .devices_snapshot()
        .iter()
        .filter(|d| d.kind() == DeviceKind::Light)
        .filter(|d| room_id.is_none() || d.room_id == room_id)
        .map(|d| (**d).clone())
        .collect();

    let color = output::should_color(global.color);
    let rendered = output::render_list(
        global.output,
        &lights,
        |d| light_row(controller, d, color),
        |d| d.id.raw().to_string(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
