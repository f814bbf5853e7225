//! Collision detection for axis-aligned rectangles
//!
//! All tests are pure: callers decide what a hit means. Player vs wall or
//! enemy ends the game, enemy vs wall reflects the enemy's velocity.

use super::rect::Rect;
use super::state::Arena;

/// Which arena walls a rectangle is touching or past, per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    /// Left or right wall
    pub x: bool,
    /// Top or bottom wall
    pub y: bool,
}

impl WallContact {
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

/// Strict AABB overlap. Rectangles sharing only an edge do not overlap.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// Enemy wall test: an axis is in contact when `0 < low < high < extent` fails
pub fn wall_contact(rect: &Rect, arena: &Arena) -> WallContact {
    let tl = rect.top_left();
    let br = rect.bottom_right();
    WallContact {
        x: tl.x <= 0.0 || br.x >= arena.width,
        y: tl.y <= 0.0 || br.y >= arena.height,
    }
}

/// Player wall test: every corner must stay inside `[border, extent - border]`
pub fn within_border(rect: &Rect, arena: &Arena, border: f32) -> bool {
    let tl = rect.top_left();
    let br = rect.bottom_right();
    tl.x >= border
        && tl.y >= border
        && br.x <= arena.width - border
        && br.y <= arena.height - border
}
