use std::path::PathBuf;

use anyhow::{bail, Result};
use boxroll_input::roll_key;
use boxroll_puzzle::{Level, Outcome, Phase, Puzzle};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Headless step size for replays, roughly a 120 Hz frame.
const REPLAY_DT: f32 = 1.0 / 120.0;

#[derive(Parser)]
#[command(name = "boxroll-cli", about = "CLI tool for boxroll operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Replay a move sequence headless and print each landing
    Replay {
        /// Moves as a string of w/a/s/d keys, e.g. "wwwddww"
        moves: String,
        /// Level file (YAML); the built-in map when omitted
        #[arg(long)]
        level: Option<PathBuf>,
    },
    /// Check a level file and print its summary
    Validate {
        /// Level file (YAML)
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("boxroll-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", boxroll_render::crate_info());
            let level = Level::default();
            println!(
                "built-in level: {} cells, cell size {}",
                level.cells.len(),
                level.cell_size
            );
        }
        Commands::Replay { moves, level } => {
            let level = load_level(level.as_deref())?;
            replay(level, &moves)?;
        }
        Commands::Validate { path } => {
            let level = Level::from_path(&path)?;
            println!(
                "{}: ok ({} cells, start {:?}, win {:?})",
                path.display(),
                level.cells.len(),
                level.start,
                level.win
            );
        }
    }

    Ok(())
}

fn load_level(path: Option<&std::path::Path>) -> Result<Level> {
    Ok(match path {
        Some(path) => Level::from_path(path)?,
        None => Level::default(),
    })
}

fn replay(level: Level, moves: &str) -> Result<()> {
    tracing::debug!(moves, cells = level.cells.len(), "starting replay");
    let mut puzzle = Puzzle::new(level);

    for (i, key) in moves.chars().enumerate() {
        let Some(direction) = roll_key(key) else {
            bail!("move {}: unknown key {key:?} (expected w/a/s/d)", i + 1);
        };

        if !puzzle.request_roll(direction) {
            println!("move {}: {direction:?} ignored", i + 1);
            continue;
        }

        // Step the roll through to its landing.
        let outcome = loop {
            if let Some(outcome) = puzzle.advance(REPLAY_DT) {
                break outcome;
            }
        };

        let cell = puzzle.cell();
        println!(
            "move {}: {direction:?} -> ({:.1}, {:.1}, {:.1}) {outcome:?}",
            i + 1,
            cell.x as f32 / 100.0,
            cell.y as f32 / 100.0,
            cell.z as f32 / 100.0,
        );

        if outcome == Outcome::OffMap {
            println!("fell off the map; resetting");
            puzzle.reset();
        }
    }

    match puzzle.phase() {
        Phase::Won => println!("solved"),
        _ => println!("not solved"),
    }

    Ok(())
}
