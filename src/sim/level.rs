/// Level generator.
///
/// ## Pipeline (per level):
///   1. **Random fill**: interior cells become walls with probability
///      `min(level, 3) / 8`. A clearing around the player's spawn is forced
///      open and the border is forced solid.
///   2. **Smoothing**: `max(5 - level, 2)` cellular-automaton passes:
///      floor → wall with 6–8 wall neighbours, wall stays wall with 3–8.
///      Passes update the grid in place, row by row, so a cell sees the
///      already-updated state of the cells above and to its left.
///   3. **Flood fill**: 4-directional from the spawn. Collects the
///      reachable floor, the edge walls bordering it, and enemy spawn
///      candidates (Manhattan distance > 20 from the spawn).
///   4. **Enemy spawn**: uniform pick among candidates. When no candidate
///      exists the whole level is regenerated; after too many attempts the
///      enemy starts on the reachable tile farthest from the player.

use std::collections::BTreeSet;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::domain::grid::{Grid, NEIGHBOURS_4};
use crate::domain::seen::SeenTiles;
use crate::domain::tile::{Tile, TILE_SIZE};

/// Cells with `|dx| < 4 && |dy| < 4` around the spawn start open.
pub const SPAWN_CLEARING: usize = 4;
/// Enemy spawn candidates must be farther than this (Manhattan, tiles).
pub const ENEMY_SPAWN_MIN_DISTANCE: usize = 20;

const MAX_GENERATION_ATTEMPTS: u32 = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelGenError {
    #[error("map {width}x{height} is too small, need at least 3x3")]
    TooSmall { width: usize, height: usize },
    #[error("spawn ({col}, {row}) is outside the interior of a {width}x{height} map")]
    SpawnOutside { col: usize, row: usize, width: usize, height: usize },
}

/// Everything the generator needs to know about the level to build.
#[derive(Clone, Copy, Debug)]
pub struct LevelParams {
    /// 1-based level number; higher levels are denser and rougher.
    pub level: u32,
    pub width: usize,
    pub height: usize,
    /// Player spawn tile.
    pub spawn: (usize, usize),
    /// Freshness given to a tile when the torch lights it.
    pub max_tile_age: u32,
}

impl LevelParams {
    pub fn fill_chance(&self) -> f64 {
        f64::from(self.level.min(3)) / 8.0
    }

    pub fn smoothing_passes(&self) -> u32 {
        5u32.saturating_sub(self.level).max(2)
    }

    fn validate(&self) -> Result<(), LevelGenError> {
        if self.width < 3 || self.height < 3 {
            return Err(LevelGenError::TooSmall { width: self.width, height: self.height });
        }
        let (col, row) = self.spawn;
        if col == 0 || row == 0 || col + 1 >= self.width || row + 1 >= self.height {
            return Err(LevelGenError::SpawnOutside {
                col, row, width: self.width, height: self.height,
            });
        }
        Ok(())
    }
}

/// Flood-fill results for one grid and spawn.
#[derive(Clone, Debug, Default)]
pub struct Reachability {
    /// `reachable[i]` ↔ floor tile `i` can be walked to from the spawn.
    pub reachable: Vec<bool>,
    /// Wall tiles 4-adjacent to reachable floor.
    pub edge_tiles: BTreeSet<usize>,
    /// Reachable floor tiles far enough from the spawn for the enemy.
    pub enemy_spawns: Vec<(usize, usize)>,
}

/// A generated level, ready for a session.
#[derive(Clone, Debug)]
pub struct Level {
    pub number: u32,
    pub grid: Grid,
    pub edge_tiles: BTreeSet<usize>,
    pub reachable: Vec<bool>,
    pub spawn: (usize, usize),
    /// Enemy start, world units (top-left corner of its tile).
    pub enemy_spawn: (f32, f32),
    pub seen: SeenTiles,
}

impl Level {
    /// Wrap an existing grid as a level: flood fill from `spawn`, enemy at
    /// `enemy_tile`.
    pub fn from_grid(
        number: u32,
        grid: Grid,
        spawn: (usize, usize),
        enemy_tile: (usize, usize),
        max_tile_age: u32,
    ) -> Self {
        let reach = flood_fill(&grid, spawn);
        let seen = SeenTiles::new(grid.len(), max_tile_age);
        Level {
            number,
            edge_tiles: reach.edge_tiles,
            reachable: reach.reachable,
            spawn,
            enemy_spawn: tile_corner(enemy_tile),
            seen,
            grid,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Generate a level. Only fails on impossible parameters; an unlucky map
/// is regenerated rather than reported.
pub fn generate<R: Rng>(params: &LevelParams, rng: &mut R) -> Result<Level, LevelGenError> {
    params.validate()?;

    let mut last = None;
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let mut grid = random_fill(params, rng);
        for _ in 0..params.smoothing_passes() {
            smooth(&mut grid);
        }
        let reach = flood_fill(&grid, params.spawn);

        if let Some(&enemy_tile) = reach.enemy_spawns.choose(rng) {
            debug!(
                "level {} generated on attempt {}: {} edge tiles, {} spawn candidates, enemy at {:?}",
                params.level, attempt, reach.edge_tiles.len(), reach.enemy_spawns.len(), enemy_tile,
            );
            return Ok(assemble(params, grid, reach, enemy_tile));
        }
        debug!("level {} attempt {} has no enemy spawn candidates", params.level, attempt);
        last = Some((grid, reach));
    }

    // Every attempt failed: keep the last map, or an open cave if the
    // spawn itself got sealed in.
    let (grid, reach) = match last {
        Some((grid, reach)) if reach.reachable.iter().any(|&r| r) => (grid, reach),
        _ => {
            let grid = Grid::bordered(params.width, params.height);
            let reach = flood_fill(&grid, params.spawn);
            (grid, reach)
        }
    };
    let enemy_tile = farthest_reachable(&grid, &reach.reachable, params.spawn)
        .unwrap_or(params.spawn);
    warn!(
        "level {}: no enemy spawn after {} attempts, falling back to farthest tile {:?}",
        params.level, MAX_GENERATION_ATTEMPTS, enemy_tile,
    );
    Ok(assemble(params, grid, reach, enemy_tile))
}

/// Step 1: random walls, open clearing around the spawn, solid border.
pub fn random_fill<R: Rng>(params: &LevelParams, rng: &mut R) -> Grid {
    let chance = params.fill_chance();
    let mut grid = Grid::filled(params.width, params.height, Tile::Floor);
    let (sx, sy) = params.spawn;

    for row in 0..params.height {
        for col in 0..params.width {
            let tile = if grid.is_border(col, row) {
                Tile::Wall
            } else if col.abs_diff(sx) < SPAWN_CLEARING && row.abs_diff(sy) < SPAWN_CLEARING {
                Tile::Floor
            } else if rng.gen_bool(chance) {
                Tile::Wall
            } else {
                Tile::Floor
            };
            grid.set(col, row, tile);
        }
    }
    grid
}

/// Step 2: one in-place cellular-automaton pass.
pub fn smooth(grid: &mut Grid) {
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let next = if grid.is_border(col, row) {
                Tile::Wall
            } else {
                let walls = grid.wall_neighbours(col, row);
                match grid.cell_at(col as i32, row as i32) {
                    Tile::Floor if walls >= 6 => Tile::Wall,
                    Tile::Wall if walls >= 3 => Tile::Wall,
                    _ => Tile::Floor,
                }
            };
            grid.set(col, row, next);
        }
    }
}

/// Step 3: 4-directional flood fill from the spawn.
pub fn flood_fill(grid: &Grid, spawn: (usize, usize)) -> Reachability {
    let mut reach = Reachability {
        reachable: vec![false; grid.len()],
        ..Reachability::default()
    };
    let Some(start) = grid.checked_index(spawn.0 as i32, spawn.1 as i32) else {
        return reach;
    };

    let mut visited = vec![false; grid.len()];
    let mut frontier = vec![start];

    while let Some(index) = frontier.pop() {
        if visited[index] {
            continue;
        }
        visited[index] = true;

        if grid.tile(index).is_wall() {
            reach.edge_tiles.insert(index);
            continue;
        }

        let (col, row) = grid.coords(index);
        reach.reachable[index] = true;
        if col.abs_diff(spawn.0) + row.abs_diff(spawn.1) > ENEMY_SPAWN_MIN_DISTANCE {
            reach.enemy_spawns.push((col, row));
        }

        for &(dx, dy) in &NEIGHBOURS_4 {
            if let Some(next) = grid.checked_index(col as i32 + dx, row as i32 + dy) {
                if !visited[next] {
                    frontier.push(next);
                }
            }
        }
    }

    reach
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

fn assemble(params: &LevelParams, grid: Grid, reach: Reachability, enemy_tile: (usize, usize)) -> Level {
    Level {
        number: params.level,
        seen: SeenTiles::new(grid.len(), params.max_tile_age),
        edge_tiles: reach.edge_tiles,
        reachable: reach.reachable,
        spawn: params.spawn,
        enemy_spawn: tile_corner(enemy_tile),
        grid,
    }
}

fn farthest_reachable(grid: &Grid, reachable: &[bool], spawn: (usize, usize)) -> Option<(usize, usize)> {
    reachable
        .iter()
        .enumerate()
        .filter(|(_, &r)| r)
        .map(|(i, _)| grid.coords(i))
        .max_by_key(|&(c, r)| c.abs_diff(spawn.0) + r.abs_diff(spawn.1))
}

fn tile_corner((col, row): (usize, usize)) -> (f32, f32) {
    (col as f32 * TILE_SIZE, row as f32 * TILE_SIZE)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
