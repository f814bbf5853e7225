//! Axis-aligned rectangle geometry for the player and enemies
//!
//! A rectangle is stored as its center plus extents. Corners are always
//! derived, never stored, so moving the center keeps them consistent.

use glam::Vec2;

/// An axis-aligned rectangle in arena space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Center position
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(pos: Vec2, width: f32, height: f32) -> Self {
        Self { pos, width, height }
    }

    /// Build from two opposite corners, in any order
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new((min + max) / 2.0, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width, self.height) / 2.0
    }

    /// Upper-left corner: `pos - (width, height) / 2`
    #[inline]
    pub fn top_left(&self) -> Vec2 {
        self.pos - self.half_extents()
    }

    /// Lower-right corner: `pos + (width, height) / 2`
    #[inline]
    pub fn bottom_right(&self) -> Vec2 {
        self.pos + self.half_extents()
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.top_left().x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.bottom_right().x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.top_left().y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.bottom_right().y
    }

    /// Move the center to `pos`
    pub fn update_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    /// Same extents, centered elsewhere
    pub fn centered_at(&self, pos: Vec2) -> Self {
        Self { pos, ..*self }
    }

    /// Translate the center by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
    }

    /// Check if a point lies inside (edges included)
    pub fn contains_point(&self, point: Vec2) -> bool {
        let tl = self.top_left();
        let br = self.bottom_right();
        point.x >= tl.x && point.x <= br.x && point.y >= tl.y && point.y <= br.y
    }
}
