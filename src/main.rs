//! This is the main entry point for the `mash` binary.

use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, prelude::*};

use mash::{
    bitbake_from_args,
    console_utils::{TracingFormatter, get_default_env_filter},
    opt::{App, ShellCompletion, SubCommands},
};

#[tokio::main]
async fn main() -> miette::Result<()> {
    let app = App::parse();

    tracing_subscriber::registry()
        .with(get_default_env_filter(app.verbose.log_level_filter()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(TracingFormatter),
        )
        .init();

    match app.subcommand {
        Some(SubCommands::Completion(ShellCompletion { shell })) => {
            let mut cmd = App::command();
            clap_complete::generate(shell, &mut cmd, "mash", &mut std::io::stdout());
            Ok(())
        }
        Some(SubCommands::Bitbake(opts)) => {
            bitbake_from_args(opts, app.config_file.as_deref()).await
        }
        None => bitbake_from_args(app.bitbake, app.config_file.as_deref()).await,
    }
}
