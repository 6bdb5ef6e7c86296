mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, load_config, sync};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let (Commands::Sync { config: path, .. } | Commands::Check { config: path }) = &commands.command;
    let config = load_config(path)?;
    logging::init(
        commands.log_level.as_deref().unwrap_or(&config.log_level),
        commands.verbose,
    );

    match &commands.command {
        Commands::Sync { config: path, only, phase } => {
            print::header("starting sync");
            sync::sync(path, config, only.as_deref(), *phase).await
        }
        Commands::Check { config: path } => {
            print::header("checking configuration");
            check::check(path, &config)
        }
    }
}
