//! Screen state machine
//!
//! Exactly one [`Screen`] is active. Leaving a screen releases everything it
//! owned before the next one is built; for the Game screen that means every
//! timer its session armed is cancelled.
//!
//! ```text
//! Menu --NewGame--> Game --collision--> GameEnd --SubmitName--> Highscore
//!  ^ |                                     |                        |
//!  | +--ShowOptions--> Options --Menu--+   +---------Menu-----------+--> Menu
//!  | +--ShowHighscores--> Highscore    |
//!  +-----------------------------------+          any --Quit--> (stopped)
//! ```

use std::collections::VecDeque;

use glam::Vec2;

use crate::error::{GameError, SessionError};
use crate::highscores::{ScoreEntry, ScoreOrder, ScoreStore};
use crate::platform::Scheduler;
use crate::settings::{ConfigStore, Difficulty, PlayerOverrides, Settings};
use crate::sim::{GameOverCause, Outcome, Session, TimerEvent, enemy_tick, on_drag, on_press};

/// Tag of the active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Menu,
    Game,
    GameEnd,
    Highscore,
    Options,
}

/// The Game Over screen: final score and name entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEndScreen {
    pub score: u64,
    pub cause: GameOverCause,
}

/// The leaderboard, as listed when the screen was entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighscoreScreen {
    pub entries: Vec<ScoreEntry>,
}

/// Active screen and the state it owns
#[derive(Debug)]
pub enum Screen {
    Menu,
    Game(Box<Session>),
    GameEnd(GameEndScreen),
    Highscore(HighscoreScreen),
    Options,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Menu => ScreenKind::Menu,
            Screen::Game(_) => ScreenKind::Game,
            Screen::GameEnd(_) => ScreenKind::GameEnd,
            Screen::Highscore(_) => ScreenKind::Highscore,
            Screen::Options => ScreenKind::Options,
        }
    }
}

/// Everything the view can send
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    // Buttons
    NewGame,
    ShowHighscores,
    ShowOptions,
    Menu,
    Quit,
    // Game
    PointerDown(Vec2),
    Drag(Vec2),
    // Game Over
    SubmitName(String),
    // Highscore (index into the listed entries)
    DeleteScore(usize),
    // Options
    SetDifficulty(Difficulty),
}

/// Notifications for the view, drained with [`App::drain_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(ScreenKind),
    /// Something visible moved or changed
    Redraw,
    ScoreChanged(u64),
    GameOver { score: u64, cause: GameOverCause },
}

/// Top-level controller
pub struct App<S: ScoreStore> {
    config: ConfigStore,
    store: S,
    scheduler: Scheduler<TimerEvent>,
    screen: Screen,
    /// Incremented for every session
    generation: u64,
    events: VecDeque<AppEvent>,
    running: bool,
    player_overrides: PlayerOverrides,
    score_order: ScoreOrder,
}

impl<S: ScoreStore> App<S> {
    pub fn new(config: ConfigStore, store: S) -> Self {
        let mut events = VecDeque::new();
        events.push_back(AppEvent::ScreenChanged(ScreenKind::Menu));
        Self {
            config,
            store,
            scheduler: Scheduler::new(),
            screen: Screen::Menu,
            generation: 0,
            events,
            running: true,
            player_overrides: PlayerOverrides::default(),
            score_order: ScoreOrder::Best,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    /// Current session, only while on the Game screen
    pub fn session(&self) -> Option<&Session> {
        match &self.screen {
            Screen::Game(session) => Some(&**session),
            _ => None,
        }
    }

    pub fn scheduler(&self) -> &Scheduler<TimerEvent> {
        &self.scheduler
    }

    /// Virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Player tweaks applied on top of the configuration for the next sessions
    pub fn set_player_overrides(&mut self, overrides: PlayerOverrides) {
        self.player_overrides = overrides;
    }

    pub fn set_score_order(&mut self, order: ScoreOrder) {
        self.score_order = order;
    }

    pub fn drain_events(&mut self) -> Vec<AppEvent> {
        self.events.drain(..).collect()
    }

    /// Feed one input event
    pub fn handle(&mut self, input: Input) -> Result<(), GameError> {
        if !self.running {
            log::debug!("Stopped, ignoring {:?}", input);
            return Ok(());
        }

        match (self.screen.kind(), input) {
            (_, Input::Quit) => {
                self.quit();
                Ok(())
            }

            (ScreenKind::Menu, Input::NewGame) => self.new_game(),
            (ScreenKind::Menu, Input::ShowHighscores) => self.show_highscores(),
            (ScreenKind::Menu, Input::ShowOptions) => {
                self.transition(Screen::Options);
                Ok(())
            }

            (ScreenKind::Game, Input::PointerDown(point)) => {
                self.with_session(|session, scheduler| on_press(session, point, scheduler))
            }
            (ScreenKind::Game, Input::Drag(point)) => {
                self.with_session(|session, scheduler| on_drag(session, point, scheduler))
            }

            (ScreenKind::GameEnd, Input::SubmitName(name)) => self.submit_name(&name),

            (ScreenKind::Highscore, Input::DeleteScore(index)) => self.delete_score(index),

            (ScreenKind::Options, Input::SetDifficulty(difficulty)) => {
                log::info!("Difficulty set to {}", difficulty.as_str());
                self.config.set_difficulty(difficulty);
                self.events.push_back(AppEvent::Redraw);
                Ok(())
            }

            (ScreenKind::GameEnd | ScreenKind::Highscore | ScreenKind::Options, Input::Menu) => {
                self.transition(Screen::Menu);
                Ok(())
            }

            (kind, input) => {
                log::debug!("Ignoring {:?} on {:?}", input, kind);
                Ok(())
            }
        }
    }

    /// Let `ms` milliseconds of virtual time pass, running every due timer
    pub fn advance(&mut self, ms: u64) -> Result<(), GameError> {
        let until = self.scheduler.now() + ms;
        while let Some((_, event)) = self.scheduler.pop_due(until) {
            self.dispatch_timer(event)?;
        }
        self.scheduler.advance_to(until);
        Ok(())
    }

    fn dispatch_timer(&mut self, event: TimerEvent) -> Result<(), GameError> {
        let current = self.session().map(|s| s.generation);
        if current != Some(event.generation()) {
            log::debug!("Dropping stale timer {:?}", event);
            return Ok(());
        }

        match event {
            TimerEvent::EnemyTick { enemy, .. } => {
                self.with_session(|session, scheduler| enemy_tick(session, enemy, scheduler))
            }
            TimerEvent::ScoreTick { .. } => {
                if let Screen::Game(session) = &mut self.screen {
                    session.player.score.increment();
                    let value = session.score();
                    self.events.push_back(AppEvent::ScoreChanged(value));
                }
                Ok(())
            }
        }
    }

    /// Run a session update and react to its outcome
    fn with_session<F>(&mut self, f: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut Session, &mut Scheduler<TimerEvent>) -> Result<Outcome, SessionError>,
    {
        let Screen::Game(session) = &mut self.screen else {
            return Ok(());
        };

        match f(session, &mut self.scheduler) {
            Ok(Outcome::Ignored) => Ok(()),
            Ok(Outcome::Moved) => {
                self.events.push_back(AppEvent::Redraw);
                Ok(())
            }
            Ok(Outcome::GameOver(cause)) => {
                let score = session.score();
                self.events.push_back(AppEvent::GameOver { score, cause });
                self.transition(Screen::GameEnd(GameEndScreen { score, cause }));
                Ok(())
            }
            Err(e) => {
                log::error!("Aborting session {}: {}", session.generation, e);
                self.transition(Screen::Menu);
                Err(e.into())
            }
        }
    }

    /// Swap screens, releasing the outgoing one first
    fn transition(&mut self, next: Screen) {
        let previous = std::mem::replace(&mut self.screen, Screen::Menu);
        if let Screen::Game(mut session) = previous {
            session.teardown(&mut self.scheduler);
        }
        log::info!("Screen -> {:?}", next.kind());
        self.events.push_back(AppEvent::ScreenChanged(next.kind()));
        self.events.push_back(AppEvent::Redraw);
        self.screen = next;
    }

    fn new_game(&mut self) -> Result<(), GameError> {
        // Validate before anything is built
        let settings =
            Settings::from_store(&self.config)?.with_player_overrides(&self.player_overrides)?;
        self.generation += 1;
        let session = Session::new(self.generation, &settings);
        log::info!(
            "New game {} ({} enemies, difficulty {})",
            self.generation,
            session.enemies.len(),
            settings.difficulty.as_str()
        );
        self.transition(Screen::Game(Box::new(session)));
        Ok(())
    }

    fn submit_name(&mut self, name: &str) -> Result<(), GameError> {
        let Screen::GameEnd(end) = &self.screen else {
            return Ok(());
        };
        let name = name.trim();
        if name.is_empty() {
            log::debug!("Empty name, not saving");
            return Ok(());
        }
        let id = self.store.save_score(name, end.score)?;
        log::info!("Saved score {} for {} ({:?})", end.score, name, id);
        self.show_highscores()
    }

    fn show_highscores(&mut self) -> Result<(), GameError> {
        let entries = self.store.list_scores(self.score_order)?;
        self.transition(Screen::Highscore(HighscoreScreen { entries }));
        Ok(())
    }

    fn delete_score(&mut self, index: usize) -> Result<(), GameError> {
        let Screen::Highscore(board) = &mut self.screen else {
            return Ok(());
        };
        let Some(entry) = board.entries.get(index) else {
            log::debug!("No score at index {}", index);
            return Ok(());
        };
        self.store.delete_score(entry.id)?;
        board.entries = self.store.list_scores(self.score_order)?;
        self.events.push_back(AppEvent::Redraw);
        Ok(())
    }

    fn quit(&mut self) {
        if let Screen::Game(mut session) = std::mem::replace(&mut self.screen, Screen::Menu) {
            session.teardown(&mut self.scheduler);
        }
        self.scheduler.clear();
        self.running = false;
        log::info!("Quit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::highscores::{Leaderboard, ScoreId};
    use crate::sim::EnemyId;
    use serde_json::json;

    fn app_with(overrides: serde_json::Value) -> App<Leaderboard> {
        App::new(ConfigStore::from_overrides(&overrides), Leaderboard::new())
    }

    /// One slow enemy far from the player
    fn quiet_app() -> App<Leaderboard> {
        app_with(json!({
            "Enemies": [ {
                "Position": { "X": 40, "Y": 40 },
                "Size": { "Width": 20, "Height": 20 },
                "Speed": { "X": 0, "Y": 0 }
            } ]
        }))
    }

    fn center(app: &App<Leaderboard>) -> Vec2 {
        app.session().unwrap().player.rect.pos
    }

    fn count_screen(events: &[AppEvent], kind: ScreenKind) -> usize {
        events
            .iter()
            .filter(|e| **e == AppEvent::ScreenChanged(kind))
            .count()
    }

    #[test]
    fn test_starts_on_menu() {
        let mut app = quiet_app();
        assert_eq!(app.kind(), ScreenKind::Menu);
        assert!(app.session().is_none());
        assert_eq!(app.drain_events(), vec![AppEvent::ScreenChanged(ScreenKind::Menu)]);
    }

    #[test]
    fn test_full_round_trip_releases_everything() {
        let mut app = quiet_app();
        app.handle(Input::NewGame).unwrap();
        assert_eq!(app.kind(), ScreenKind::Game);

        let c = center(&app);
        app.handle(Input::PointerDown(c)).unwrap();
        assert_eq!(app.scheduler().pending(), 2);
        app.advance(2500).unwrap();
        assert_eq!(app.session().unwrap().score(), 2);

        // Drag past the right border
        app.handle(Input::Drag(Vec2::new(420.0, c.y))).unwrap();
        assert!(matches!(
            app.screen(),
            Screen::GameEnd(GameEndScreen {
                score: 2,
                cause: GameOverCause::Wall
            })
        ));
        assert_eq!(app.scheduler().pending(), 0);

        app.handle(Input::SubmitName("ada".into())).unwrap();
        assert_eq!(app.kind(), ScreenKind::Highscore);
        match app.screen() {
            Screen::Highscore(board) => {
                assert_eq!(board.entries.len(), 1);
                assert_eq!(board.entries[0].name, "ada");
                assert_eq!(board.entries[0].value, 2);
            }
            other => panic!("unexpected screen {:?}", other),
        }

        app.handle(Input::Menu).unwrap();
        assert_eq!(app.kind(), ScreenKind::Menu);
        assert!(app.session().is_none());
        assert_eq!(app.scheduler().pending(), 0);

        // Nothing left to fire
        app.advance(60_000).unwrap();
        assert_eq!(app.kind(), ScreenKind::Menu);
    }

    #[test]
    fn test_score_frozen_after_wall_hit() {
        let mut app = quiet_app();
        app.handle(Input::NewGame).unwrap();
        let c = center(&app);
        app.handle(Input::Drag(c + Vec2::new(5.0, 0.0))).unwrap();
        app.advance(3200).unwrap();
        app.handle(Input::Drag(Vec2::new(c.x, 30.0))).unwrap();
        app.advance(5000).unwrap();

        let events = app.drain_events();
        assert!(events.contains(&AppEvent::GameOver {
            score: 3,
            cause: GameOverCause::Wall
        }));
        assert!(matches!(app.screen(), Screen::GameEnd(end) if end.score == 3));
    }

    #[test]
    fn test_overlapping_enemy_ends_game_exactly_once() {
        let mut app = app_with(json!({
            "Enemies": [
                {
                    "Position": { "X": 225, "Y": 225 },
                    "Size": { "Width": 30, "Height": 30 },
                    "Speed": { "X": 1, "Y": 0 }
                },
                {
                    "Position": { "X": 230, "Y": 230 },
                    "Size": { "Width": 30, "Height": 30 },
                    "Speed": { "X": -1, "Y": 0 }
                }
            ]
        }));
        app.handle(Input::NewGame).unwrap();
        let c = center(&app);
        app.handle(Input::PointerDown(c)).unwrap();
        app.drain_events();

        app.advance(1000).unwrap();
        let events = app.drain_events();
        let game_overs: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, AppEvent::GameOver { .. }))
            .collect();
        assert_eq!(
            game_overs,
            vec![&AppEvent::GameOver {
                score: 0,
                cause: GameOverCause::Enemy(EnemyId(0))
            }]
        );
        assert_eq!(count_screen(&events, ScreenKind::GameEnd), 1);
        assert_eq!(app.scheduler().pending(), 0);

        // Late drag on the Game Over screen does nothing
        app.handle(Input::Drag(c)).unwrap();
        assert_eq!(app.kind(), ScreenKind::GameEnd);
    }

    #[test]
    fn test_enemies_still_until_player_grabbed() {
        let mut app = app_with(json!({
            "Enemies": [ {
                "Position": { "X": 100, "Y": 100 },
                "Size": { "Width": 20, "Height": 20 },
                "Speed": { "X": 2, "Y": 0 }
            } ]
        }));
        app.handle(Input::NewGame).unwrap();
        app.advance(1000).unwrap();
        let session = app.session().unwrap();
        assert_eq!(session.enemies[0].rect.pos, Vec2::new(100.0, 100.0));
        assert_eq!(session.score(), 0);

        // Press outside the player: still waiting
        app.handle(Input::PointerDown(Vec2::new(10.0, 10.0))).unwrap();
        assert_eq!(app.scheduler().pending(), 0);

        let c = center(&app);
        app.handle(Input::PointerDown(c)).unwrap();
        app.advance(100).unwrap();
        assert_eq!(app.session().unwrap().enemies[0].rect.pos, Vec2::new(110.0, 100.0));
    }

    #[test]
    fn test_empty_name_is_not_saved() {
        let mut app = quiet_app();
        app.handle(Input::NewGame).unwrap();
        app.handle(Input::Drag(Vec2::new(5.0, 5.0))).unwrap();
        assert_eq!(app.kind(), ScreenKind::GameEnd);

        app.handle(Input::SubmitName("   ".into())).unwrap();
        assert_eq!(app.kind(), ScreenKind::GameEnd);
        assert!(app.store().is_empty());

        app.handle(Input::Menu).unwrap();
        assert_eq!(app.kind(), ScreenKind::Menu);
        assert!(app.store().is_empty());
    }

    #[test]
    fn test_invalid_config_stays_on_menu() {
        let mut app = app_with(json!({ "Game": { "Size": { "Width": -10 } } }));
        let err = app.handle(Input::NewGame).unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
        assert_eq!(app.kind(), ScreenKind::Menu);
        assert_eq!(app.scheduler().pending(), 0);
    }

    #[test]
    fn test_unbounded_arena_never_starts() {
        let mut app = app_with(json!({
            "Game": { "Size": { "Width": 1e39, "Height": 1e39 } }
        }));
        let err = app.handle(Input::NewGame).unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
        assert!(app.session().is_none());

        let mut app = app_with(json!({ "Game": { "TickMs": "fast" } }));
        assert!(matches!(app.handle(Input::NewGame), Err(GameError::Config(_))));
        assert_eq!(app.kind(), ScreenKind::Menu);
    }

    #[test]
    fn test_player_overrides_apply_to_new_sessions() {
        let mut app = quiet_app();
        app.set_player_overrides(PlayerOverrides {
            color: Some("green".into()),
            ..Default::default()
        });
        app.handle(Input::NewGame).unwrap();
        assert_eq!(app.session().unwrap().player.color, "green");
    }

    #[test]
    fn test_menu_options_and_highscores() {
        let mut app = quiet_app();
        app.handle(Input::ShowOptions).unwrap();
        assert_eq!(app.kind(), ScreenKind::Options);
        app.handle(Input::SetDifficulty(Difficulty::Hard)).unwrap();
        assert_eq!(app.config().difficulty(), Difficulty::Hard);
        // Not a Game input here
        app.handle(Input::Drag(Vec2::ZERO)).unwrap();
        assert_eq!(app.kind(), ScreenKind::Options);
        app.handle(Input::Menu).unwrap();

        app.handle(Input::ShowHighscores).unwrap();
        assert!(matches!(app.screen(), Screen::Highscore(board) if board.entries.is_empty()));
        app.handle(Input::Menu).unwrap();
        assert_eq!(app.kind(), ScreenKind::Menu);
    }

    #[test]
    fn test_delete_listed_score() {
        let mut board = Leaderboard::new();
        board.add_score("low", 5, 1);
        board.add_score("high", 50, 2);
        let mut app = App::new(ConfigStore::new(), board);

        app.handle(Input::ShowHighscores).unwrap();
        // Best first: "high" is index 0
        app.handle(Input::DeleteScore(0)).unwrap();
        match app.screen() {
            Screen::Highscore(board) => {
                assert_eq!(board.entries.len(), 1);
                assert_eq!(board.entries[0].name, "low");
            }
            other => panic!("unexpected screen {:?}", other),
        }
        // Out of range is ignored
        app.handle(Input::DeleteScore(7)).unwrap();
        assert_eq!(app.store().entries.len(), 1);
    }

    #[test]
    fn test_quit_mid_game_cancels_timers() {
        let mut app = quiet_app();
        app.handle(Input::NewGame).unwrap();
        let c = center(&app);
        app.handle(Input::PointerDown(c)).unwrap();
        assert!(app.scheduler().pending() > 0);

        app.handle(Input::Quit).unwrap();
        assert!(!app.is_running());
        assert_eq!(app.scheduler().pending(), 0);

        assert!(app.session().is_none());

        // Stopped for good
        app.handle(Input::NewGame).unwrap();
        assert_eq!(app.kind(), ScreenKind::Menu);
        assert!(app.session().is_none());
    }

    #[test]
    fn test_stale_timer_is_dropped() {
        let mut app = quiet_app();
        app.handle(Input::NewGame).unwrap();
        let c = center(&app);
        app.handle(Input::PointerDown(c)).unwrap();

        // A score tick from a session that no longer exists
        app.scheduler.schedule_after(10, TimerEvent::ScoreTick { generation: 0 });
        app.advance(10).unwrap();
        assert_eq!(app.session().unwrap().score(), 0);
    }

    #[test]
    fn test_broken_invariant_aborts_session() {
        let mut app = quiet_app();
        app.handle(Input::NewGame).unwrap();
        let c = center(&app);
        app.handle(Input::PointerDown(c)).unwrap();

        let generation = app.session().unwrap().generation;
        app.scheduler.schedule_after(
            1,
            TimerEvent::EnemyTick {
                generation,
                enemy: EnemyId(99),
            },
        );
        let err = app.advance(1).unwrap_err();
        assert!(matches!(err, GameError::Session(SessionError::UnknownEnemy(99))));
        assert_eq!(app.kind(), ScreenKind::Menu);
        assert_eq!(app.scheduler().pending(), 0);
    }

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn save_score(&mut self, _: &str, _: u64) -> Result<ScoreId, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }

        fn list_scores(&self, _: ScoreOrder) -> Result<Vec<ScoreEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn delete_score(&mut self, id: ScoreId) -> Result<(), StoreError> {
            Err(StoreError::UnknownScore(id.0))
        }
    }

    #[test]
    fn test_store_failure_is_reported() {
        let mut app = App::new(ConfigStore::new(), BrokenStore);
        app.handle(Input::NewGame).unwrap();
        app.handle(Input::Drag(Vec2::new(5.0, 5.0))).unwrap();
        let err = app.handle(Input::SubmitName("bob".into())).unwrap_err();
        assert!(matches!(err, GameError::Store(_)));
        assert_eq!(app.kind(), ScreenKind::GameEnd);
    }
}
