#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for offline path search and simulated navigation.

mod config;
mod map_transfer;
mod render;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use rompilot_core::{Regime, TileCoord};
use rompilot_emulator::Scenario;
use rompilot_system_navigation::{NavStatus, NavigationSession};
use rompilot_system_pathfinding::PathSearch;

use crate::{
    config::PilotConfig,
    map_transfer::{parse_byte, parse_tile, MapCapture},
    render::{glyph, render},
};

#[derive(Debug, Parser)]
#[command(name = "rompilot", version, about = "Collision-aware navigation for retro game automation")]
struct Cli {
    /// TOML file with `[navigation]` and `[tiles.*]` tables.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Searches a captured collision region for a path.
    Search {
        /// Capture string, or `@PATH` to read it from a file.
        capture: String,
        /// Start tile as `x,y`.
        #[arg(long, value_parser = tile_arg)]
        from: TileCoord,
        /// Goal tile as `x,y`.
        #[arg(long, value_parser = tile_arg)]
        to: TileCoord,
        /// Draws the map with the path overlaid.
        #[arg(long)]
        render: bool,
    },
    /// Runs a navigation session against a simulated console.
    Simulate {
        /// Scenario TOML file.
        scenario: PathBuf,
        /// Prints the final navigation state as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Encodes a scenario's room as a capture string.
    Capture {
        /// Scenario TOML file.
        scenario: PathBuf,
    },
    /// Classifies a raw collision code.
    Classify {
        /// `overworld` or `dungeon`.
        regime: Regime,
        /// Raw code in hex (`0x40`) or decimal.
        #[arg(value_parser = code_arg)]
        code: u8,
    },
}

/// Entry point for the rompilot command-line interface.
fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = PilotConfig::load(cli.config.as_deref())?;
    debug!("loaded configuration: {config:?}");

    match cli.command {
        Command::Search {
            capture,
            from,
            to,
            render,
        } => search(&config, &capture, from, to, render),
        Command::Simulate { scenario, json } => simulate(&config, &scenario, json),
        Command::Capture { scenario } => capture(&scenario),
        Command::Classify { regime, code } => {
            let kind = config.tiles.classify(code, regime).kind();
            println!("{regime} {code:#04x} {kind:?} '{}'", glyph(kind));
            Ok(())
        }
    }
}

fn search(
    config: &PilotConfig,
    capture: &str,
    from: TileCoord,
    to: TileCoord,
    draw: bool,
) -> Result<()> {
    let text = match capture.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read capture {path}"))?
        }
        None => capture.to_owned(),
    };
    let map = MapCapture::decode(&text)
        .context("invalid capture string")?
        .to_map(&config.tiles)
        .context("capture does not describe a collision map")?;

    let mut search = PathSearch::new();
    let result = search.search(&map, from, to);
    info!("search expanded {} nodes", search.expanded_nodes());

    let path = match result {
        Ok(path) => path,
        Err(failure) => bail!("no path from {from} to {to}: {failure}"),
    };

    let buttons: Vec<&str> = path
        .directions()
        .map(|direction| direction.button().name())
        .collect();
    println!("{} waypoints", path.len());
    println!("{}", buttons.join(" "));
    if draw {
        print!("{}", render(&map, path.waypoints()));
    }
    Ok(())
}

fn simulate(config: &PilotConfig, path: &Path, json: bool) -> Result<()> {
    let scenario = load_scenario(path)?;
    let console = scenario
        .console()
        .with_context(|| format!("invalid scenario {}", path.display()))?
        .with_encoding(config.tiles.clone());
    let mut session =
        NavigationSession::new(console, config.tiles.clone(), config.navigation.clone())
            .context("invalid navigation config")?;

    let state = session.navigate(Some(scenario.start()), scenario.goal());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state).context("failed to serialise state")?
        );
    } else {
        println!("{}", state.diagnostic());
        println!("{}", session.connection().input_log().join(" "));
    }

    if state.status() != NavStatus::Arrived {
        bail!("navigation did not arrive: {}", state.diagnostic());
    }
    Ok(())
}

fn capture(path: &Path) -> Result<()> {
    let scenario = load_scenario(path)?;
    let console = scenario
        .console()
        .with_context(|| format!("invalid scenario {}", path.display()))?;
    let Some(room) = console.current_room() else {
        bail!("scenario {} has no room", path.display());
    };

    let mut codes = Vec::with_capacity(room.width() as usize * room.height() as usize);
    for y in 0..room.height() {
        for x in 0..room.width() {
            codes.push(room.code(TileCoord::new(x, y)));
        }
    }
    let capture = MapCapture {
        mode: scenario.game_mode(),
        origin: TileCoord::default(),
        width: room.width(),
        height: room.height(),
        codes,
    };

    println!("{}", capture.encode()?);
    Ok(())
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    Scenario::from_toml_str(&text).with_context(|| format!("invalid scenario {}", path.display()))
}

fn tile_arg(value: &str) -> Result<TileCoord, String> {
    parse_tile(value).ok_or_else(|| format!("expected x,y but got '{value}'"))
}

fn code_arg(value: &str) -> Result<u8, String> {
    parse_byte(value).ok_or_else(|| format!("expected a byte but got '{value}'"))
}
