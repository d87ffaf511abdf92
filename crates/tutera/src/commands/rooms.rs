//! Room handlers: summaries and whole-room lighting.

use tabled::Tabled;

use tutera_core::{Controller, RoomSummary};

use crate::cli::{GlobalOpts, RoomsArgs, RoomsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Lights")]
    lights: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Climate")]
    climate: String,
    #[tabled(rename = "Locks")]
    locks: String,
    #[tabled(rename = "Media")]
    media: String,
}

fn room_row(s: &RoomSummary, color: bool) -> RoomRow {
    let lights = if s.lights_total == 0 {
        "-".into()
    } else {
        output::paint_state(
            &format!("{}/{} on", s.lights_on, s.lights_total),
            s.lights_on > 0,
            color,
        )
    };
    let climate = s.climate.as_ref().map_or_else(
        || "-".into(),
        |c| {
            let current = c.current.map_or_else(|| "-".into(), |t| t.to_string());
            let setpoint = c.setpoint.map_or_else(|| "-".into(), |t| t.to_string());
            format!("{current} → {setpoint} {}", c.mode)
        },
    );
    let locks = if s.locks_total == 0 {
        "-".into()
    } else {
        format!("{}/{} locked", s.locks_locked, s.locks_total)
    };
    let media = s.media.as_ref().map_or_else(
        || "-".into(),
        |m| {
            if m.powered {
                let source = m.source.as_deref().unwrap_or("on");
                output::paint_state(&format!("{source} @ {}", m.volume), true, color)
            } else {
                output::paint_state("off", false, color)
            }
        },
    );

    RoomRow {
        id: s.room_id.to_string(),
        name: s.name.clone(),
        area: s.area_name.clone().unwrap_or_else(|| "-".into()),
        lights,
        level: s
            .average_brightness
            .map_or_else(|| "-".into(), |p| p.to_string()),
        climate,
        locks,
        media,
    }
}

pub async fn handle(
    controller: &Controller,
    args: RoomsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RoomsCommand::List => {
            let summaries: Vec<RoomSummary> = controller
                .room_summaries_snapshot()
                .iter()
                .map(|s| (**s).clone())
                .collect();
            let color = output::should_color(global.color);
            let rendered = output::render_list(
                global.output,
                &summaries,
                |s| room_row(s, color),
                |s| s.room_id.to_string(),
            )?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        RoomsCommand::On { room } => set_power(controller, &room, true, global).await,
        RoomsCommand::Off { room } => set_power(controller, &room, false, global).await,
    }
}

async fn set_power(
    controller: &Controller,
    identifier: &str,
    on: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let room = util::resolve_room(controller, identifier)?;
    let report = controller.set_room_power(&room.id, on).await?;

    let state = if on { "on" } else { "off" };
    let message = match report.succeeded.len() {
        0 => format!("{} has no lights", room.name),
        n => format!("{}: {n} light(s) switched {state}", room.name),
    };
    output::print_output(&message, global.quiet);
    Ok(())
}
