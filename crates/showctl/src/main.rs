mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use showctl_core::Controller;

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
        // Config commands don't need a server connection
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "showctl", &mut std::io::stdout());
            Ok(())
        }

        // Watch keeps its own connection across reconnects
        Command::Watch(args) => {
            let controller_config =
                config::build_controller_config(&global, &config::load_config_or_default())?;
            commands::watch::handle(Controller::new(controller_config), &args, &global).await
        }

        // Everything else runs against a fully synced mirror
        cmd => {
            let controller_config =
                config::build_controller_config(&global, &config::load_config_or_default())?;
            tracing::debug!(command = ?cmd, url = %controller_config.url, "dispatching command");

            let global = &global;
            Controller::oneshot(controller_config, |controller| async move {
                commands::dispatch(cmd, &controller, global).await
            })
            .await
        }
    }
}
