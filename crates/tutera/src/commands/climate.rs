//! Thermostat handlers.

use tabled::Tabled;

use tutera_core::{ClimateMode, Controller, Device, DeviceKind, DeviceState, Temperature};

use crate::cli::{ClimateArgs, ClimateCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ThermostatRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Setpoint")]
    setpoint: String,
    #[tabled(rename = "Mode")]
    mode: String,
}

fn or_dash(t: Option<Temperature>) -> String {
    t.map_or_else(|| "-".into(), |t| t.to_string())
}

pub async fn handle(
    controller: &Controller,
    args: ClimateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ClimateCommand::List => list(controller, global),
        ClimateCommand::Setpoint {
            thermostat,
            degrees,
        } => {
            let device = resolve(controller, &thermostat)?;
            let setpoint = Temperature::parse_degrees(&degrees)?;
            let ticket = controller.set_setpoint(&device.id, setpoint)?;
            util::finish(ticket, &format!("{} set to {setpoint}", device.name), global).await
        }
        ClimateCommand::Mode { thermostat, mode } => {
            let device = resolve(controller, &thermostat)?;
            let mode: ClimateMode = mode.parse().map_err(|_| {
                CliError::validation("mode", format!("'{mode}' is not one of off, heat, cool, auto"))
            })?;
            let ticket = controller.set_mode(&device.id, mode)?;
            util::finish(ticket, &format!("{} switched to {mode}", device.name), global).await
        }
    }
}

fn resolve(controller: &Controller, identifier: &str) -> Result<std::sync::Arc<Device>, CliError> {
    util::resolve_device(controller, DeviceKind::Thermostat, identifier, "climate list")
}

fn list(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let thermostats: Vec<Device> = controller
        .devices_snapshot()
        .iter()
        .filter(|d| d.kind() == DeviceKind::Thermostat)
        .map(|d| (**d).clone())
        .collect();

    let color = output::should_color(global.color);
    let rendered = output::render_list(
        global.output,
        &thermostats,
        |d| {
            let (current, setpoint, mode) = match d.state {
                DeviceState::Thermostat(ref c) => (c.current, c.setpoint, c.mode),
                _ => (None, None, ClimateMode::Off),
            };
            ThermostatRow {
                id: d.id.raw(),
                name: d.name.clone(),
                room: util::room_name(controller, d),
                current: or_dash(current),
                setpoint: or_dash(setpoint),
                mode: output::paint_state(&mode.to_string(), mode != ClimateMode::Off, color),
            }
        },
        |d| d.id.raw().to_string(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
