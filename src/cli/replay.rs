use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use roundwatch::{
    EngineBuilder, LifecycleEvent, MemorySlots, ObservedPage, Replayer, StateSlot, Trace,
};
use tracing::info;

use crate::cli::context::CliContext;
use crate::cli::output::{print_structured, OutputFormat};
use crate::cli::state::print_state;

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Trace file (YAML or JSON)
    pub trace: PathBuf,

    /// State directory (defaults to the configured one)
    #[arg(long, value_name = "DIR", conflicts_with = "in_memory")]
    pub state_dir: Option<PathBuf>,

    /// Keep state in memory only; nothing is read or written on disk
    #[arg(long)]
    pub in_memory: bool,
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    config.validate().context("Invalid configuration")?;

    let trace = Trace::load(&args.trace)?;
    let base = args.trace.parent().unwrap_or(Path::new("."));
    let steps = trace.resolve(base)?;

    let slot: Arc<dyn StateSlot> = if args.in_memory {
        Arc::new(MemorySlots::new())
    } else {
        Arc::new(ctx.file_slots(args.state_dir.as_deref()))
    };
    let selectors = config.selectors.compile()?;
    let page = Arc::new(ObservedPage::new(selectors));
    let mut engine = EngineBuilder::from_config(config)
        .slot(slot)
        .build(page)
        .context("Failed to build reconciliation engine")?;

    info!(trace = %args.trace.display(), steps = steps.len(), "replaying trace");
    let human = matches!(output, OutputFormat::Human);
    let report = Replayer::new(&mut engine)
        .run(trace.name.clone(), &steps, |event| {
            if human {
                print_event(event);
            }
        })
        .await;

    if print_structured(&report, &output)? {
        return Ok(());
    }
    println!();
    println!(
        "{} steps, {} passes, {} payloads captured, {} events",
        report.steps,
        report.passes,
        report.captured_payloads,
        report.events.len()
    );
    print_state(&report.state, engine.rules());
    Ok(())
}

fn print_event(event: &LifecycleEvent) {
    let state = &event.state;
    println!(
        "{:<12} game={} round={} recorded={}",
        event.kind.as_str(),
        state.current_game_id,
        state.current_round,
        state.recorded_rounds()
    );
}
