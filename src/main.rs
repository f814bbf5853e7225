//! Red Square headless runner
//!
//! Plays one game with a seeded random-walk bot instead of a mouse, then
//! records the result and prints the leaderboard. Useful for checking a
//! settings file without a window.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use red_square::sim::{Session, to_readable};
use red_square::{
    App, ConfigStore, Difficulty, FileScoreStore, GameError, Input, Screen, ScreenKind,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Play one game of red square with an autopilot",
    long_about = None
)]
struct Args {
    /// Settings overrides (JSON); missing file means defaults
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Leaderboard file
    #[arg(long, default_value = "highscores.json")]
    scores: PathBuf,
    /// Autopilot seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Name recorded on the leaderboard
    #[arg(long, default_value = "autopilot")]
    name: String,
    /// Stop the run after this many seconds even if still alive
    #[arg(long, default_value_t = 120)]
    max_seconds: u64,
    /// easy, medium or hard
    #[arg(long)]
    difficulty: Option<String>,
}

/// Largest autopilot step per tick (pixels)
const MAX_STEP: f32 = 6.0;

/// Next drag target: away from the closest enemy, toward the middle, plus noise
fn autopilot_step(session: &Session, rng: &mut Pcg32) -> Vec2 {
    let pos = session.player.rect.pos;
    let to_center = (session.arena.center() - pos) * 0.02;
    let away = session
        .enemies
        .iter()
        .map(|e| pos - e.rect.pos)
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .map(|d| d.normalize_or_zero() * 3.0)
        .unwrap_or(Vec2::ZERO);
    let noise = Vec2::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0));
    pos + (to_center + away + noise).clamp_length_max(MAX_STEP)
}

fn run(args: Args) -> Result<(), GameError> {
    let config = ConfigStore::load(&args.settings);
    let store = FileScoreStore::open(&args.scores)?;
    let mut app = App::new(config, store);
    let mut rng = Pcg32::seed_from_u64(args.seed);

    if let Some(level) = args.difficulty.as_deref() {
        match Difficulty::from_str(level) {
            Some(difficulty) => {
                app.handle(Input::ShowOptions)?;
                app.handle(Input::SetDifficulty(difficulty))?;
                app.handle(Input::Menu)?;
            }
            None => log::warn!(
                "Unknown difficulty '{}', keeping {}",
                level,
                app.config().difficulty().as_str()
            ),
        }
    }

    app.handle(Input::NewGame)?;
    let tick_ms = app
        .config()
        .get_or(&["Game", "TickMs"], red_square::consts::ENEMY_TICK_MS)
        .max(1);
    if let Some(start) = app.session().map(|s| s.player.rect.pos) {
        app.handle(Input::PointerDown(start))?;
    }

    let limit_ms = args.max_seconds * 1000;
    while app.kind() == ScreenKind::Game && app.now() < limit_ms {
        app.advance(tick_ms)?;
        let target = match app.session() {
            Some(session) => autopilot_step(session, &mut rng),
            None => break,
        };
        app.handle(Input::Drag(target))?;
    }

    match app.screen() {
        Screen::GameEnd(end) => {
            println!("Game over ({:?}) after {}", end.cause, to_readable(end.score));
        }
        Screen::Game(session) => {
            println!("Still alive after {}, stopping", to_readable(session.score()));
        }
        _ => {}
    }

    if app.kind() == ScreenKind::GameEnd {
        app.handle(Input::SubmitName(args.name.clone()))?;
    }
    if let Screen::Highscore(board) = app.screen() {
        println!("{:>3}  {:<20} {:>6}", "#", "Name", "Time");
        for (i, entry) in board.entries.iter().enumerate() {
            println!("{:>3}  {:<20} {:>6}", i + 1, entry.name, to_readable(entry.value));
        }
    }

    app.handle(Input::Quit)?;
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Red Square (headless) starting...");

    if let Err(e) = run(Args::parse()) {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
