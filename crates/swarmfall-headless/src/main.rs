//! Headless driver: runs a seeded session with scripted input and reports
//! what happened.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use swarmfall_core::input::{Action, InputSnapshot};
use swarmfall_core::render::{DrawCommand, DrawContext};
use swarmfall_core::{EventKind, GameConfig, GameEvent, GameState, Simulation};

/// Runs the Swarmfall simulation without a window
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulation seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 3600)]
    frames: u64,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON config overriding the built-in tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames between heading changes of the scripted walk (0 stands still)
    #[arg(long, default_value_t = 120)]
    turn_every: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

/// Counts draw calls per frame.
#[derive(Default)]
struct DrawCounter {
    total: u64,
    peak: usize,
}

impl DrawCounter {
    fn frame(&mut self, drawn: usize) {
        self.peak = self.peak.max(drawn);
    }
}

impl DrawContext for DrawCounter {
    fn draw(&mut self, _command: &DrawCommand) {
        self.total += 1;
    }
}

#[derive(Default)]
struct Tally {
    kills: Cell<u64>,
    pickups: Cell<u64>,
    level: Cell<u32>,
}

fn subscribe_tally(sim: &mut Simulation) -> Rc<Tally> {
    let tally = Rc::new(Tally {
        level: Cell::new(1),
        ..Tally::default()
    });
    let events = sim.events_mut();

    let t = Rc::clone(&tally);
    events.subscribe(EventKind::EnemyKilled, move |_, _| t.kills.set(t.kills.get() + 1));

    let t = Rc::clone(&tally);
    events.subscribe(EventKind::ItemPickedUp, move |_, _| {
        t.pickups.set(t.pickups.get() + 1);
    });

    let t = Rc::clone(&tally);
    events.subscribe(EventKind::PlayerLeveledUp, move |event, _| {
        if let GameEvent::PlayerLeveledUp { level, .. } = event {
            t.level.set(*level);
        }
    });

    events.subscribe(EventKind::WaveChanged, |event, _| {
        if let GameEvent::WaveChanged { wave } = event {
            tracing::info!(wave, "wave reached");
        }
    });
    tally
}

/// Heading of the scripted walk for `frame`: cycles right, down, left, up.
fn heading(frame: u64, turn_every: u64) -> Option<Action> {
    if turn_every == 0 {
        return None;
    }
    Some(match (frame / turn_every) % 4 {
        0 => Action::MoveRight,
        1 => Action::MoveDown,
        2 => Action::MoveLeft,
        _ => Action::MoveUp,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    let mut sim = Simulation::new(config, args.seed).context("building simulation")?;
    let tally = subscribe_tally(&mut sim);
    let mut draw = DrawCounter::default();
    let mut input = InputSnapshot::new();
    let mut held: Option<Action> = None;

    for frame in 0..args.frames {
        let next = heading(frame, args.turn_every);
        if next != held {
            if let Some(action) = held {
                input.release(action);
            }
            if let Some(action) = next {
                input.press(action);
            }
            held = next;
        }
        if let Some(player) = sim.player().and_then(|id| sim.world().position(id)) {
            input.aim_at(player + Vec2::new(100.0, 0.0));
        }

        sim.update(args.dt, &input);
        let drawn = sim.render(&mut draw);
        draw.frame(drawn);
        input.end_frame();

        if sim.state() == GameState::GameOver {
            break;
        }
    }

    tracing::info!(
        frames = sim.time().frame(),
        elapsed = sim.time().elapsed(),
        wave = sim.wave(),
        state = ?sim.state(),
        kills = tally.kills.get(),
        pickups = tally.pickups.get(),
        level = tally.level.get(),
        draws = draw.total,
        peak_draws = draw.peak,
        "session finished"
    );
    Ok(())
}
