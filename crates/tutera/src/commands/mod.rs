//! Command handlers, one module per resource.

pub mod climate;
pub mod config_cmd;
pub mod lights;
pub mod locks;
pub mod media;
pub mod rooms;
pub mod scenes;
pub mod status;
mod util;

use tutera_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a connected command to its handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, global),
        Command::Rooms(args) => rooms::handle(controller, args, global).await,
        Command::Lights(args) => lights::handle(controller, args, global).await,
        Command::Scenes(args) => scenes::handle(controller, args, global).await,
        Command::QuickActions(args) => scenes::handle_quick_actions(controller, args, global).await,
        Command::Locks(args) => locks::handle(controller, args, global).await,
        Command::Climate(args) => climate::handle(controller, args, global).await,
        Command::Media(args) => media::handle(controller, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::validation(
            "command",
            "does not need a processor connection",
        )),
    }
}
