#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs an action program through a Mirkwood level.

mod session;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mirkwood_core::{LevelBlueprint, WELCOME_BANNER};
use mirkwood_rendering::{outline::outline_walls, Buffer};
use mirkwood_rendering_terminal::{palette, Palette, TerminalBackend};
use mirkwood_system_dispatcher::{parse_program, SequenceFailure, SequencePolicy};
use mirkwood_world::State;

use session::Session;

#[derive(Debug, Parser)]
#[command(name = "mirkwood", about = "Walk an agent through a Mirkwood maze")]
struct Args {
    /// Level blueprint in JSON; the built-in sample level when omitted.
    #[arg(long, value_name = "FILE")]
    blueprint: Option<PathBuf>,
    /// Actions to run, as a string over `n`, `s`, `e`, `w` and `m`.
    #[arg(long, default_value = "")]
    program: String,
    /// Render cells per logical cell, horizontally.
    #[arg(long, default_value_t = 12)]
    x_res: u32,
    /// Render cells per logical cell, vertically.
    #[arg(long, default_value_t = 5)]
    y_res: u32,
    /// Palette TOML overriding the forest theme.
    #[arg(long, value_name = "FILE")]
    palette: Option<PathBuf>,
    /// State to keep when the program fails.
    #[arg(long, value_enum, default_value_t = Policy::Rollback)]
    policy: Policy,
    /// Print the wall outline of the level before running.
    #[arg(long)]
    outline: bool,
    /// Disable ANSI colours.
    #[arg(long)]
    no_color: bool,
    /// Draw the agent as the ground beneath it.
    #[arg(long)]
    hide_agent: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    Rollback,
    Diagnostic,
}

impl From<Policy> for SequencePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Rollback => Self::Rollback,
            Policy::Diagnostic => Self::Diagnostic,
        }
    }
}

/// Entry point for the Mirkwood command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.palette {
        let _ = palette::install(Palette::from_path(path)?)?;
    }

    let blueprint = load_blueprint(args.blueprint.as_ref())?;
    let start = State::materialize(&blueprint)
        .with_context(|| format!("level {} is not a valid maze", blueprint.key))?;
    let actions = parse_program(&args.program).context("failed to parse action program")?;
    let buffer = Buffer::new(args.x_res, args.y_res)?;

    println!("{WELCOME_BANNER}");
    if args.outline {
        print!("{}", outline_frame(&start));
    }

    let backend = TerminalBackend::stdout()
        .with_color(!args.no_color)
        .with_agent_visibility(!args.hide_agent);
    let mut session = Session::new(start, buffer, backend, args.policy.into());
    session.present()?;

    let summary = session.run(&actions)?;
    println!("{summary}");

    match summary.failure {
        Some(error) => Err(SequenceFailure {
            error,
            state: summary.state,
            consumed: summary.consumed,
        }
        .into()),
        None => Ok(()),
    }
}

fn load_blueprint(path: Option<&PathBuf>) -> Result<LevelBlueprint> {
    let Some(path) = path else {
        return Ok(LevelBlueprint::sample());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read blueprint at {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse blueprint at {}", path.display()))
}

fn outline_frame(state: &State) -> String {
    let mut frame = String::new();
    for row in outline_walls(state.invariants().walls()) {
        frame.extend(row.iter().map(|glyph| glyph.unwrap_or(' ')));
        frame.push('\n');
    }
    frame
}
