/// LevelSession: everything that lives for exactly one level.
///
/// Owns the generated level (grid, edge set, seen record), both entities,
/// the torch timer and the enemy's current route. Advanced one tick at a
/// time by `step::step`; rendering reads it directly.
///
/// ## States
///   - `Active`    : input is honoured, the enemy walks its route.
///   - `Completing`: every edge tile has been seen. Player and enemy are
///                    frozen while the level-end animation plays; the world
///                    moves on to the next level after a delay.

use std::collections::VecDeque;
use std::f32::consts::PI;

use crate::domain::entity::{Enemy, Player};
use crate::domain::raycast::{Ray, DEFAULT_PLANE};
use crate::domain::tile::TILE_SIZE;
use super::clock::Clock;
use super::level::Level;

/// Seconds the torch burns once lit.
pub const TORCH_SECONDS: f32 = 2.0;
/// Seconds a lit tile stays on the map record.
pub const TILE_MAX_AGE_SECONDS: f32 = 20.0;
/// Seconds after which a lit tile's age falls below "fresh".
pub const TILE_FADE_SECONDS: f32 = 19.0;
/// Delay between exploring the last edge and entering the next level.
pub const NEXT_LEVEL_DELAY_SECONDS: f32 = 4.0;
/// Delay before the level-end swirl starts moving.
pub const LEVEL_END_ANIM_SECONDS: f32 = 2.0;

pub const PLAYER_SPAWN_ANGLE: f32 = PI * 1.5;

pub const HEART_MIN_SIZE: f32 = 4.0;
pub const HEART_MAX_SIZE: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Completing,
}

/// Tick counts derived from the clock, fixed for the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionTiming {
    pub clock: Clock,
    pub torch_ticks: u32,
    pub max_tile_age: u32,
    pub fade_age: u32,
    pub next_level_delay: u32,
    pub level_end_anim_delay: u32,
}

impl SessionTiming {
    pub fn new(clock: Clock, torch_seconds: f32, max_age_seconds: f32, fade_seconds: f32) -> Self {
        SessionTiming {
            clock,
            torch_ticks: clock.seconds_to_ticks(torch_seconds).max(1),
            max_tile_age: clock.seconds_to_ticks(max_age_seconds).max(1),
            fade_age: clock.seconds_to_ticks(fade_seconds),
            next_level_delay: clock.seconds_to_ticks(NEXT_LEVEL_DELAY_SECONDS),
            level_end_anim_delay: clock.seconds_to_ticks(LEVEL_END_ANIM_SECONDS),
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        SessionTiming::new(Clock::default(), TORCH_SECONDS, TILE_MAX_AGE_SECONDS, TILE_FADE_SECONDS)
    }
}

pub struct LevelSession {
    pub level: Level,
    pub timing: SessionTiming,
    pub state: SessionState,
    /// Set once the win check has fired; never cleared.
    pub done: bool,

    // ── Entities ──
    pub player: Player,
    pub enemy: Enemy,
    /// Tile indices still to walk, front first.
    pub path: VecDeque<usize>,
    pub enemy_visible: bool,

    // ── Torch ──
    pub torch_timer: u32,
    pub plane: f32,
    /// Rays cast this tick. Empty while the torch is out.
    pub rays: Vec<Ray>,

    // ── Cosmetic ──
    pub heart_size: f32,
    pub heart_bpm: u32,

    /// Ticks since the session started.
    pub ticks: u32,
    /// Tick at which the level-end swirl starts moving.
    pub level_end_anim_ticks: u32,
}

impl LevelSession {
    pub fn new(level: Level, timing: SessionTiming) -> Self {
        let enemy = Enemy::new(level.enemy_spawn.0, level.enemy_spawn.1);
        let (col, row) = level.spawn;
        let player = Player::new(col as f32 * TILE_SIZE, row as f32 * TILE_SIZE, PLAYER_SPAWN_ANGLE);
        LevelSession {
            level,
            timing,
            state: SessionState::Active,
            done: false,
            player,
            enemy,
            path: VecDeque::new(),
            enemy_visible: false,
            torch_timer: 0,
            plane: DEFAULT_PLANE,
            rays: Vec::new(),
            heart_size: HEART_MIN_SIZE,
            heart_bpm: 60,
            ticks: 0,
            level_end_anim_ticks: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn torch_lit(&self) -> bool {
        self.torch_timer > 0
    }

    /// Edge tiles seen at least once.
    pub fn explored(&self) -> usize {
        self.level
            .edge_tiles
            .iter()
            .filter(|&&i| self.level.seen.is_seen(i))
            .count()
    }

    pub fn edge_count(&self) -> usize {
        self.level.edge_tiles.len()
    }

    /// Rounded percentage of edge tiles seen. An empty edge set counts as
    /// fully explored.
    pub fn percent_explored(&self) -> u32 {
        let total = self.edge_count();
        if total == 0 {
            return 100;
        }
        ((self.explored() as f32 / total as f32) * 100.0).round() as u32
    }

    /// Ticks the swirl has been running; zero before it starts.
    pub fn level_end_anim(&self) -> u32 {
        if self.done {
            self.ticks.saturating_sub(self.level_end_anim_ticks)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Grid;

    fn session() -> LevelSession {
        let level = Level::from_grid(1, Grid::bordered(32, 22), (16, 16), (2, 2), 100);
        LevelSession::new(level, SessionTiming::default())
    }

    #[test]
    fn default_timing_matches_clock() {
        let t = SessionTiming::default();
        assert_eq!(t.torch_ticks, 119);
        assert_eq!(t.max_tile_age, 1199);
        assert_eq!(t.fade_age, 1139);
        assert_eq!(t.next_level_delay, 239);
        assert_eq!(t.level_end_anim_delay, 119);
    }

    #[test]
    fn new_session_starts_at_spawn_with_torch_out() {
        let s = session();
        assert_eq!(s.player.tile(), (16, 16));
        assert_eq!(s.enemy.tile(), (2, 2));
        assert!(s.is_active());
        assert!(!s.torch_lit());
        assert_eq!(s.percent_explored(), 0);
    }

    #[test]
    fn percent_counts_only_edge_tiles() {
        let mut s = session();
        let edges: Vec<usize> = s.level.edge_tiles.iter().copied().take(s.edge_count() / 2).collect();
        for i in edges {
            s.level.seen.mark(i);
        }
        // A corner is never an edge tile.
        s.level.seen.mark(0);
        assert_eq!(s.explored(), s.edge_count() / 2);
        assert_eq!(s.percent_explored(), 50);
    }
}
