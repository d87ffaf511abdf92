mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tutera_core::{BrightnessMemory, Controller, FileBrightnessMemory};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    match command {
        // Local-only commands
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "tutera", &mut std::io::stdout());
            Ok(())
        }

        // Everything else logs in, runs once, and logs out
        cmd => {
            let cfg = config::load(&global)?;
            let controller_config = config::resolve_controller_config(&global, &cfg)?;
            let memory: Arc<dyn BrightnessMemory> =
                Arc::new(FileBrightnessMemory::open(config::brightness_memory_path()));

            tracing::debug!(command = ?cmd, "dispatching command");
            let global = &global;
            Controller::oneshot(controller_config, memory, |controller| async move {
                Ok(commands::dispatch(cmd, &controller, global).await)
            })
            .await?
        }
    }
}
