//! Scene and quick-action handlers.

use tabled::Tabled;

use tutera_core::{Controller, QuickAction, Scene};

use crate::cli::{GlobalOpts, QuickActionsArgs, QuickActionsCommand, ScenesArgs, ScenesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SceneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Active")]
    active: String,
}

#[derive(Tabled)]
struct QuickActionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

pub async fn handle(
    controller: &Controller,
    args: ScenesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ScenesCommand::List => {
            let scenes: Vec<Scene> = controller
                .scenes_snapshot()
                .iter()
                .map(|s| (**s).clone())
                .collect();
            let color = output::should_color(global.color);
            let rendered = output::render_list(
                global.output,
                &scenes,
                |s| SceneRow {
                    id: s.id.to_string(),
                    name: s.name.clone(),
                    room: s
                        .room_id
                        .and_then(|id| controller.store().room(&id))
                        .map_or_else(|| "-".into(), |r| r.name.clone()),
                    kind: s.kind.clone().unwrap_or_else(|| "-".into()),
                    active: output::paint_state(
                        if s.active { "yes" } else { "no" },
                        s.active,
                        color,
                    ),
                },
                |s| s.id.to_string(),
            )?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        ScenesCommand::Recall { scene } => {
            let scene = util::resolve_scene(controller, &scene)?;
            let ticket = controller.recall_scene(&scene.id)?;
            util::finish(ticket, &format!("Recalled {}", scene.name), global).await
        }
    }
}

pub async fn handle_quick_actions(
    controller: &Controller,
    args: QuickActionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        QuickActionsCommand::List => {
            let actions: Vec<QuickAction> = controller
                .quick_actions_snapshot()
                .iter()
                .map(|a| (**a).clone())
                .collect();
            let rendered = output::render_list(
                global.output,
                &actions,
                |a| QuickActionRow {
                    id: a.id.to_string(),
                    name: a.name.clone(),
                },
                |a| a.id.to_string(),
            )?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        QuickActionsCommand::Run { action } => {
            let action = util::resolve_quick_action(controller, &action)?;
            let ticket = controller.run_quick_action(&action.id)?;
            util::finish(ticket, &format!("Ran {}", action.name), global).await
        }
    }
}
