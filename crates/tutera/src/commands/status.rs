//! `tutera status`: what the processor reported on this connection.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use tutera_core::{Controller, DeviceKind};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusView {
    processor: Option<String>,
    connected: bool,
    rooms: usize,
    lights: usize,
    thermostats: usize,
    locks: usize,
    media_rooms: usize,
    scenes: usize,
    quick_actions: usize,
    refreshed_at: Option<DateTime<Utc>>,
}

fn detail(view: &StatusView, color: bool) -> String {
    let mut out = String::new();
    let connection = if view.connected {
        "connected"
    } else {
        "disconnected"
    };
    let _ = writeln!(
        out,
        "Processor:     {} ({})",
        view.processor.as_deref().unwrap_or("-"),
        output::paint_state(connection, view.connected, color)
    );
    let _ = writeln!(out, "Rooms:         {}", view.rooms);
    let _ = writeln!(out, "Lights:        {}", view.lights);
    let _ = writeln!(out, "Thermostats:   {}", view.thermostats);
    let _ = writeln!(out, "Locks:         {}", view.locks);
    let _ = writeln!(out, "Media rooms:   {}", view.media_rooms);
    let _ = writeln!(out, "Scenes:        {}", view.scenes);
    let _ = writeln!(out, "Quick actions: {}", view.quick_actions);
    let refreshed = view.refreshed_at.map_or_else(
        || "never".into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    let _ = write!(out, "Refreshed:     {refreshed}");
    out
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let session = controller.session_status();
    let devices = controller.devices_snapshot();
    let count = |kind: DeviceKind| devices.iter().filter(|d| d.kind() == kind).count();

    let view = StatusView {
        processor: session.processor,
        connected: session.connected,
        rooms: controller.rooms_snapshot().len(),
        lights: count(DeviceKind::Light),
        thermostats: count(DeviceKind::Thermostat),
        locks: count(DeviceKind::Lock),
        media_rooms: count(DeviceKind::Media),
        scenes: controller.scenes_snapshot().len(),
        quick_actions: controller.quick_actions_snapshot().len(),
        refreshed_at: controller.store().last_refresh(),
    };

    let color = output::should_color(global.color);
    let rendered = output::render_single(
        global.output,
        &view,
        |v| detail(v, color),
        |v| v.processor.clone().unwrap_or_default(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
