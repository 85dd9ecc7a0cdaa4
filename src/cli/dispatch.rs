use anyhow::Result;

use super::config::cmd_config;
use super::env::CliArgs;
use super::replay::cmd_replay;
use super::state::cmd_state;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Replay(args) => cmd_replay(args, ctx, cli.output.clone()).await,
        Commands::State(args) => cmd_state(args, ctx, cli.output.clone()).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
