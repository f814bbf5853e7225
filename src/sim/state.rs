//! Session state and core simulation types
//!
//! A [`Session`] owns the player and every enemy. Enemies never hold a
//! reference to the player; they are addressed by [`EnemyId`] (an index into
//! the session's enemy list) and the session resolves collisions between them.

use glam::Vec2;

use super::collision::{WallContact, wall_contact};
use super::rect::Rect;
use super::score::Score;
use crate::error::SessionError;
use crate::platform::{CancelHandle, Scheduler};
use crate::settings::{EnemySettings, PlayerSettings, Settings};
use crate::{reflect_horizontal, reflect_vertical};

/// The rectangular play surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width, self.height) / 2.0
    }
}

/// Index of an enemy inside its session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnemyId(pub usize);

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCause {
    /// Player dragged past the border
    Wall,
    /// Player and an enemy overlapped
    Enemy(EnemyId),
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Entities placed, nothing moving until the player is grabbed
    Ready,
    /// Score and enemy timers armed
    Running,
    /// Terminal; all timers cancelled
    Over(GameOverCause),
}

/// Payload of every timer a session schedules.
///
/// The generation identifies the session that armed the timer, so a payload
/// outliving its session is recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    EnemyTick { generation: u64, enemy: EnemyId },
    ScoreTick { generation: u64 },
}

impl TimerEvent {
    pub fn generation(&self) -> u64 {
        match *self {
            TimerEvent::EnemyTick { generation, .. } | TimerEvent::ScoreTick { generation } => {
                generation
            }
        }
    }
}

/// A bouncing enemy rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EnemyId,
    pub rect: Rect,
    /// Displacement per tick
    pub speed: Vec2,
    pub color: String,
}

impl Enemy {
    pub fn new(id: EnemyId, settings: &EnemySettings) -> Self {
        Self {
            id,
            rect: Rect::new(settings.position, settings.width, settings.height),
            speed: settings.speed,
            color: settings.color.clone(),
        }
    }

    /// Advance one tick: translate, then flip each axis that touches a wall.
    ///
    /// The flip is unconditional on contact, even if the velocity already
    /// points back inward; the next tick's translation corrects the overshoot.
    pub fn step(&mut self, arena: &Arena) -> WallContact {
        self.rect.translate(self.speed);
        let contact = wall_contact(&self.rect, arena);
        if contact.y {
            self.speed = reflect_vertical(self.speed);
        }
        if contact.x {
            self.speed = reflect_horizontal(self.speed);
        }
        contact
    }
}

/// The player's red square
#[derive(Debug)]
pub struct Player {
    pub rect: Rect,
    /// Playable inset from every arena edge
    pub border: f32,
    pub color: String,
    pub score: Score,
    /// Latched on the first interaction of the session
    pub has_moved: bool,
}

impl Player {
    pub fn new(settings: &PlayerSettings, arena: &Arena) -> Self {
        Self {
            rect: Rect::new(arena.center(), settings.width, settings.height),
            border: settings.border,
            color: settings.color.clone(),
            score: Score::new(),
            has_moved: false,
        }
    }
}

/// Something the view can draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite<'a> {
    pub rect: Rect,
    pub color: &'a str,
}

/// One play-through: from entering the Game screen to Game Over
#[derive(Debug)]
pub struct Session {
    pub generation: u64,
    pub arena: Arena,
    pub player: Player,
    /// Sorted by id; `enemies[i].id == EnemyId(i)`
    pub enemies: Vec<Enemy>,
    pub phase: SessionPhase,
    tick_ms: u64,
    enemy_timers: Vec<CancelHandle>,
}

impl Session {
    /// Place the player and every configured enemy. Nothing moves yet.
    pub fn new(generation: u64, settings: &Settings) -> Self {
        let arena = Arena::new(settings.arena_width, settings.arena_height);
        let enemies = settings
            .enemies
            .iter()
            .enumerate()
            .map(|(i, e)| Enemy::new(EnemyId(i), e))
            .collect();

        Self {
            generation,
            arena,
            player: Player::new(&settings.player, &arena),
            enemies,
            phase: SessionPhase::Ready,
            tick_ms: settings.tick_ms,
            enemy_timers: Vec::new(),
        }
    }

    pub fn enemy(&self, id: EnemyId) -> Result<&Enemy, SessionError> {
        self.enemies.get(id.0).ok_or(SessionError::UnknownEnemy(id.0))
    }

    pub fn enemy_mut(&mut self, id: EnemyId) -> Result<&mut Enemy, SessionError> {
        self.enemies.get_mut(id.0).ok_or(SessionError::UnknownEnemy(id.0))
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, SessionPhase::Over(_))
    }

    pub fn score(&self) -> u64 {
        self.player.score.value
    }

    /// Start the score and every enemy's tick. Only the first call does anything.
    pub fn begin(&mut self, scheduler: &mut Scheduler<TimerEvent>) -> Result<bool, SessionError> {
        if self.phase != SessionPhase::Ready {
            return Ok(false);
        }
        self.phase = SessionPhase::Running;
        self.player.has_moved = true;

        let generation = self.generation;
        self.player
            .score
            .start(scheduler, TimerEvent::ScoreTick { generation })?;
        for enemy in &self.enemies {
            let handle = scheduler.schedule_repeating(
                self.tick_ms,
                TimerEvent::EnemyTick {
                    generation,
                    enemy: enemy.id,
                },
            );
            self.enemy_timers.push(handle);
        }
        log::info!(
            "Session {} started with {} enemies",
            generation,
            self.enemies.len()
        );
        Ok(true)
    }

    /// End the session. Returns false if it had already ended.
    ///
    /// Timers are cancelled here, so the score is frozen at its last value and
    /// no further tick reaches this session.
    pub fn end_game(
        &mut self,
        cause: GameOverCause,
        scheduler: &mut Scheduler<TimerEvent>,
    ) -> bool {
        if self.is_over() {
            log::debug!("Session {} already over, ignoring {:?}", self.generation, cause);
            return false;
        }
        self.phase = SessionPhase::Over(cause);
        self.teardown(scheduler);
        log::info!(
            "Session {} over ({:?}), score {}",
            self.generation,
            cause,
            self.player.score.readable()
        );
        true
    }

    /// Cancel every timer this session armed
    pub fn teardown(&mut self, scheduler: &mut Scheduler<TimerEvent>) {
        self.player.score.stop(scheduler);
        for handle in self.enemy_timers.drain(..) {
            scheduler.cancel(handle);
        }
    }

    /// Number of timers this session still holds
    pub fn armed_timers(&self) -> usize {
        self.enemy_timers.len() + usize::from(self.player.score.is_running())
    }

    /// Everything to draw, enemies first so the player is on top
    pub fn sprites(&self) -> Vec<Sprite<'_>> {
        self.enemies
            .iter()
            .map(|e| Sprite {
                rect: e.rect,
                color: &e.color,
            })
            .chain(std::iter::once(Sprite {
                rect: self.player.rect,
                color: &self.player.color,
            }))
            .collect()
    }
}
