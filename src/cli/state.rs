use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use roundwatch::{phase, GameState, Rules, StateStore};

use crate::cli::context::CliContext;
use crate::cli::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct StateArgs {
    /// State directory (defaults to the configured one)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub action: StateAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum StateAction {
    /// Print the persisted state as stored
    Show,

    /// Delete the persisted state
    Clear,
}

pub async fn cmd_state(args: StateArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let slots = ctx.file_slots(args.state_dir.as_deref());
    let location = slots.path_for(&ctx.config().storage_key);
    let store = StateStore::new(Arc::new(slots), ctx.config().storage_key.clone());

    match args.action {
        StateAction::Show => {
            let state = store
                .peek()
                .with_context(|| format!("Failed to read {}", location.display()))?;
            if print_structured(&state, &output)? {
                return Ok(());
            }
            match state {
                Some(state) => print_state(&state, &ctx.config().rules()),
                None => println!("No persisted state at {}", location.display()),
            }
        }
        StateAction::Clear => {
            store
                .clear()
                .with_context(|| format!("Failed to remove {}", location.display()))?;
            println!("Cleared {}", location.display());
        }
    }
    Ok(())
}

/// Human-readable summary of a game state.
pub fn print_state(state: &GameState, rules: &Rules) {
    let id = if state.current_game_id.is_empty() {
        "-"
    } else {
        state.current_game_id.as_str()
    };
    let kind = if state.is_challenge_link {
        "challenge"
    } else {
        "game"
    };
    println!("Game:     {id} ({kind})");
    if !state.map.id.is_empty() {
        println!("Map:      {} [{}]", state.map.name, state.map.id);
    }
    println!(
        "Round:    {} / {} ({:?})",
        state.current_round,
        rules.total_rounds,
        phase(state, rules)
    );
    println!(
        "Score:    {} {}",
        state.total_score.amount, state.total_score.unit
    );
    println!(
        "Distance: {} {} / {} {}",
        state.total_distance.meters.amount,
        state.total_distance.meters.unit,
        state.total_distance.miles.amount,
        state.total_distance.miles.unit
    );
    for (index, round) in state.rounds.iter().enumerate() {
        match round {
            Some(round) => println!(
                "  #{:<2} {:>6} {}  {} {}",
                index + 1,
                round.score.amount,
                round.score.unit,
                round.distance.meters.amount,
                round.distance.meters.unit
            ),
            None => println!("  #{:<2} not recorded", index + 1),
        }
    }
}
