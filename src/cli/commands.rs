use clap::Subcommand;

use super::config::ConfigArgs;
use super::replay::ReplayArgs;
use super::state::StateArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Replay a recorded page trace through the observer
    Replay(ReplayArgs),

    /// Inspect or clear the persisted game state
    State(StateArgs),

    /// Show or validate configuration
    Config(ConfigArgs),
}
