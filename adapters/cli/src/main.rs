#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line runner that plays a seeded skirmish for a number of cycles.

mod scenario;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use arrakis_core::{Command, Event, HouseId};
use arrakis_system_simulation::Simulation;
use arrakis_world::{query, GameContext, Rules};
use clap::Parser;

use crate::scenario::MapSize;

/// Runs the Arrakis simulation core headless and reports the outcome.
#[derive(Parser, Debug)]
#[command(name = "arrakis")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed of the deterministic random generator
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of game cycles to run
    #[arg(short, long, default_value_t = 2_000)]
    cycles: u32,

    /// Map dimensions in tiles, written WIDTHxHEIGHT
    #[arg(long, default_value = "32x20")]
    map_size: MapSize,

    /// TOML file overriding the default rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Write the final game state to this file
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Tally of the events seen during a run.
#[derive(Debug, Default)]
struct RunSummary {
    created: usize,
    destroyed: usize,
    captured: usize,
    docked: usize,
    repaired: usize,
    blooms: usize,
}

impl RunSummary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ObjectCreated { .. } => self.created += 1,
                Event::ObjectDestroyed { .. } => self.destroyed += 1,
                Event::StructureCaptured { .. } => self.captured += 1,
                Event::HarvesterDocked { .. } => self.docked += 1,
                Event::UnitRepaired { .. } => self.repaired += 1,
                Event::BloomTriggered { .. } => self.blooms += 1,
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let rules = match &args.rules {
        Some(path) => Rules::load(path)
            .with_context(|| format!("failed to load rules from {}", path.display()))?,
        None => Rules::default(),
    };
    let scenario = scenario::build(args.map_size, rules, args.seed)
        .context("failed to build the skirmish")?;
    let mut context = scenario.context;
    let mut simulation = Simulation::new();
    let mut summary = RunSummary::default();
    let mut events = Vec::new();

    for order in scenario.orders {
        simulation.apply(&mut context, order, &mut events);
    }
    for _ in 0..args.cycles {
        simulation.apply(&mut context, Command::Tick, &mut events);
        summary.record(&events);
        events.clear();
    }

    print_report(&context, &summary);
    if let Some(path) = &args.save {
        save(&context, path)?;
    }
    Ok(())
}

fn print_report(context: &GameContext, summary: &RunSummary) {
    println!("cycle {}", context.cycle);
    for house in HouseId::ALL {
        let Some(state) = context.house(house) else {
            continue;
        };
        println!(
            "{house:?}: {} credits, {} units, {} structures",
            query::credits(context, house).round(),
            state.num_units(),
            state.num_structures()
        );
    }
    println!("spice on map: {}", query::spice_on_map(context).round());
    println!(
        "events: {} created, {} destroyed, {} captured, {} harvester dockings, {} repairs, \
         {} blooms",
        summary.created,
        summary.destroyed,
        summary.captured,
        summary.docked,
        summary.repaired,
        summary.blooms
    );
}

fn save(context: &GameContext, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create save file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    context
        .save(&mut writer)
        .and_then(|()| writer.flush().map_err(Into::into))
        .with_context(|| format!("failed to write save file {}", path.display()))?;
    log::info!("saved cycle {} to {}", context.cycle, path.display());
    Ok(())
}
