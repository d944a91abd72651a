/// Entities: Player and Enemy, plus the per-tick input snapshot.
/// Positions are continuous, in world length units (one tile = `TILE_SIZE`).

use super::tile::{to_tile, TILE_SIZE};

pub const PLAYER_SIZE: f32 = 2.0;
/// Side of the enemy's collision box.
pub const ENEMY_SIZE: f32 = 4.0;
/// Side of the enemy's drawn body.
pub const ENEMY_DRAW_SIZE: f32 = 2.0;

/// Forward/backward thrust per tick while a move key is held.
pub const PLAYER_THRUST: f32 = 0.5;
/// Radians turned per tick while a turn key is held.
pub const PLAYER_TURN_RATE: f32 = 0.05;

/// Frame input: which logical actions are held this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub torch: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    /// Facing, radians. 0 = +x (east), π/2 = +y (south).
    pub angle: f32,
}

impl Player {
    pub fn new(x: f32, y: f32, angle: f32) -> Self {
        Player { x, y, vel_x: 0.0, vel_y: 0.0, angle }
    }

    pub fn tile(&self) -> (i32, i32) {
        (to_tile(self.x), to_tile(self.y))
    }

    /// Player position in tile units (ray origin).
    pub fn tile_pos(&self) -> (f32, f32) {
        (self.x / TILE_SIZE, self.y / TILE_SIZE)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + PLAYER_SIZE / 2.0, self.y + PLAYER_SIZE / 2.0)
    }

    pub fn distance_to(&self, enemy: &Enemy) -> f32 {
        ((self.x - enemy.x).powi(2) + (self.y - enemy.y).powi(2)).sqrt()
    }

    pub fn overlaps(&self, enemy: &Enemy) -> bool {
        aabb_overlap(
            (self.x, self.y, self.x + PLAYER_SIZE, self.y + PLAYER_SIZE),
            (enemy.x, enemy.y, enemy.x + ENEMY_SIZE, enemy.y + ENEMY_SIZE),
        )
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
}

impl Enemy {
    pub fn new(x: f32, y: f32) -> Self {
        Enemy { x, y }
    }

    pub fn tile(&self) -> (i32, i32) {
        (to_tile(self.x), to_tile(self.y))
    }
}

/// Strict overlap of two `(x0, y0, x1, y1)` boxes. Touching edges do not count.
pub fn aabb_overlap(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> bool {
    a.0 < b.2 && a.2 > b.0 && a.1 < b.3 && a.3 > b.1
}

/// Linear interpolation from `a` toward `b` by `t`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}
