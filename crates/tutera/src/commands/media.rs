//! Media room handlers.

use tabled::Tabled;

use tutera_core::{Controller, Device, DeviceKind, DeviceState, Percent};

use crate::cli::{GlobalOpts, MediaArgs, MediaCommand, PowerState};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct MediaRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub async fn handle(
    controller: &Controller,
    args: MediaArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MediaCommand::List => list(controller, global),
        MediaCommand::Power { room, state } => {
            let device = resolve(controller, &room)?;
            let on = state == PowerState::On;
            let ticket = controller.set_power(&device.id, on)?;
            let state = if on { "on" } else { "off" };
            util::finish(ticket, &format!("{} switched {state}", device.name), global).await
        }
        MediaCommand::Volume { room, level } => {
            let device = resolve(controller, &room)?;
            let volume = Percent::new(level)?;
            let ticket = controller.set_volume(&device.id, volume)?;
            util::finish(ticket, &format!("{} volume {volume}", device.name), global).await
        }
        MediaCommand::Source { room, source } => {
            let device = resolve(controller, &room)?;
            let (id, name) = resolve_source(&device, &source)?;
            let ticket = controller.select_source(&device.id, id)?;
            util::finish(ticket, &format!("{} now playing {name}", device.name), global).await
        }
    }
}

fn resolve(controller: &Controller, identifier: &str) -> Result<std::sync::Arc<Device>, CliError> {
    util::resolve_device(controller, DeviceKind::Media, identifier, "media list")
}

/// Match a source by id or name among those the media room offers.
fn resolve_source(device: &Device, identifier: &str) -> Result<(u32, String), CliError> {
    let DeviceState::Media(ref media) = device.state else {
        return Err(CliError::validation("media room", "device has no sources"));
    };
    let wanted = identifier.trim();
    media
        .sources
        .iter()
        .find(|s| s.id.to_string() == wanted || s.name.eq_ignore_ascii_case(wanted))
        .map(|s| (s.id, s.name.clone()))
        .ok_or_else(|| CliError::NotFound {
            resource_type: "source".into(),
            identifier: wanted.into(),
            list_command: "media list -o json".into(),
        })
}

fn list(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let rooms: Vec<Device> = controller
        .devices_snapshot()
        .iter()
        .filter(|d| d.kind() == DeviceKind::Media)
        .map(|d| (**d).clone())
        .collect();

    let color = output::should_color(global.color);
    let rendered = output::render_list(
        global.output,
        &rooms,
        |d| match d.state {
            DeviceState::Media(ref m) => MediaRow {
                id: d.id.raw(),
                name: d.name.clone(),
                power: output::paint_state(if m.powered { "on" } else { "off" }, m.powered, color),
                volume: if m.muted {
                    "muted".into()
                } else {
                    m.volume.to_string()
                },
                source: m.source_name().unwrap_or("-").to_owned(),
            },
            _ => MediaRow {
                id: d.id.raw(),
                name: d.name.clone(),
                power: "-".into(),
                volume: "-".into(),
                source: "-".into(),
            },
        },
        |d| d.id.raw().to_string(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
