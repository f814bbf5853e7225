//! Per-event simulation updates
//!
//! Two things move the world: an enemy's periodic tick and a drag of the
//! player. Both funnel any collision with the player into
//! [`Session::end_game`], which is the only place a session ends.

use glam::Vec2;

use super::collision::{overlaps, within_border};
use super::state::{EnemyId, GameOverCause, Session, SessionPhase, TimerEvent};
use crate::error::SessionError;
use crate::platform::Scheduler;

/// Result of feeding one event into a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Session not accepting this event (not started yet or already over)
    Ignored,
    /// State changed, session continues
    Moved,
    /// This event ended the session
    GameOver(GameOverCause),
}

/// Advance one enemy by one tick
pub fn enemy_tick(
    session: &mut Session,
    id: EnemyId,
    scheduler: &mut Scheduler<TimerEvent>,
) -> Result<Outcome, SessionError> {
    if session.phase != SessionPhase::Running {
        return Ok(Outcome::Ignored);
    }

    let arena = session.arena;
    let enemy = session.enemy_mut(id)?;
    let contact = enemy.step(&arena);
    if contact.any() {
        log::trace!("Enemy {} bounced {:?} -> {:?}", id.0, contact, enemy.speed);
    }
    let rect = enemy.rect;

    if overlaps(&rect, &session.player.rect) {
        return Ok(end_game(session, GameOverCause::Enemy(id), scheduler));
    }
    Ok(Outcome::Moved)
}

/// Pointer pressed at `point`. Grabbing the player starts the session.
pub fn on_press(
    session: &mut Session,
    point: Vec2,
    scheduler: &mut Scheduler<TimerEvent>,
) -> Result<Outcome, SessionError> {
    if session.phase != SessionPhase::Ready || !session.player.rect.contains_point(point) {
        return Ok(Outcome::Ignored);
    }
    session.begin(scheduler)?;
    Ok(Outcome::Moved)
}

/// Player dragged so that its center is at `point`
pub fn on_drag(
    session: &mut Session,
    point: Vec2,
    scheduler: &mut Scheduler<TimerEvent>,
) -> Result<Outcome, SessionError> {
    if session.is_over() {
        return Ok(Outcome::Ignored);
    }
    if !session.player.has_moved {
        session.begin(scheduler)?;
    }

    let candidate = session.player.rect.centered_at(point);
    if !within_border(&candidate, &session.arena, session.player.border) {
        return Ok(end_game(session, GameOverCause::Wall, scheduler));
    }
    session.player.rect.update_pos(point);

    let hit = session
        .enemies
        .iter()
        .find(|e| overlaps(&e.rect, &session.player.rect))
        .map(|e| e.id);
    if let Some(id) = hit {
        return Ok(end_game(session, GameOverCause::Enemy(id), scheduler));
    }
    Ok(Outcome::Moved)
}

fn end_game(
    session: &mut Session,
    cause: GameOverCause,
    scheduler: &mut Scheduler<TimerEvent>,
) -> Outcome {
    if session.end_game(cause, scheduler) {
        Outcome::GameOver(cause)
    } else {
        Outcome::Ignored
    }
}
