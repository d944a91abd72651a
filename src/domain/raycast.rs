/// Torchlight ray casting (DDA grid traversal).
///
/// Rays start at the player's position in tile units and step from one
/// tile boundary to the next using incremental side distances. A ray stops
/// at the first wall tile or at the enemy's tile. Only hits inside the torch
/// radius count: they light the wall (or reveal the enemy). Farther hits,
/// and rays that run out of steps, produce a ray with no tile attached that
/// is drawn at full torch length and marks nothing.

use std::f32::consts::FRAC_PI_2;

use super::grid::Grid;
use super::seen::SeenTiles;
use super::tile::TILE_SIZE;

/// Torch reach, in world length units.
pub const TORCH_RADIUS: f32 = 32.0;
/// Safety bound on grid steps per ray.
pub const RAY_MAX_STEPS: u32 = 100;
/// Default width of the torch fan, radians.
pub const DEFAULT_PLANE: f32 = FRAC_PI_2;

const BASE_ANGLE_STEP: f32 = 0.5;
const MIN_ANGLE_STEP: f32 = 0.002;
const MAX_RAYS_PER_FAN: usize = 1024;

/// One cast ray, kept for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Offset from the player's facing, radians.
    pub angle: f32,
    /// Last open tile before an in-range hit. `None` = draw full length.
    pub hit: Option<(i32, i32)>,
}

/// What a single ray ran into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RayHit {
    Wall { tile: (i32, i32), last_open: (i32, i32), dist: f32 },
    Enemy { last_open: (i32, i32), dist: f32 },
    /// Step budget exhausted without hitting anything.
    Nothing,
}

/// Walk a single ray through the grid. `origin` is in tile units.
pub fn cast_ray(grid: &Grid, origin: (f32, f32), angle: f32, enemy_tile: (i32, i32)) -> RayHit {
    let (pos_x, pos_y) = origin;
    let dir_x = angle.cos();
    let dir_y = angle.sin();

    let mut map_x = pos_x.floor() as i32;
    let mut map_y = pos_y.floor() as i32;

    let delta_x = if dir_x == 0.0 { f32::INFINITY } else { (1.0 / dir_x).abs() };
    let delta_y = if dir_y == 0.0 { f32::INFINITY } else { (1.0 / dir_y).abs() };

    let (step_x, mut side_x) = if dir_x < 0.0 {
        (-1, (pos_x - map_x as f32) * delta_x)
    } else {
        (1, (map_x as f32 + 1.0 - pos_x) * delta_x)
    };
    let (step_y, mut side_y) = if dir_y < 0.0 {
        (-1, (pos_y - map_y as f32) * delta_y)
    } else {
        (1, (map_y as f32 + 1.0 - pos_y) * delta_y)
    };

    let mut last_open = (map_x, map_y);

    for _ in 0..RAY_MAX_STEPS {
        let dist = if side_x < side_y {
            side_x += delta_x;
            map_x += step_x;
            side_x - delta_x
        } else {
            side_y += delta_y;
            map_y += step_y;
            side_y - delta_y
        };

        let tile = (map_x, map_y);
        if grid.is_wall_tile(map_x, map_y) {
            return RayHit::Wall { tile, last_open, dist };
        }
        if tile == enemy_tile {
            return RayHit::Enemy { last_open, dist };
        }
        last_open = tile;
    }

    RayHit::Nothing
}

/// Angle between neighbouring rays. A freshly lit torch casts a dense fan;
/// it thins out as the torch burns down.
pub fn angle_step(torch_remaining: u32, torch_max: u32) -> f32 {
    if torch_max == 0 {
        return BASE_ANGLE_STEP;
    }
    let burnt = 1.0 - (torch_remaining.min(torch_max) as f32 / torch_max as f32);
    (burnt * BASE_ANGLE_STEP).max(MIN_ANGLE_STEP)
}

/// Inputs for one torch fan.
#[derive(Clone, Copy, Debug)]
pub struct Fan {
    /// Ray origin in tile units.
    pub origin: (f32, f32),
    /// Player facing, radians.
    pub facing: f32,
    /// Fan width, radians.
    pub plane: f32,
    pub torch_remaining: u32,
    pub torch_max: u32,
    pub enemy_tile: (i32, i32),
}

#[derive(Clone, Debug, Default)]
pub struct FanResult {
    pub rays: Vec<Ray>,
    pub enemy_visible: bool,
}

/// Cast the whole torch fan, lighting every wall hit within range.
pub fn cast_fan(grid: &Grid, fan: &Fan, seen: &mut SeenTiles) -> FanResult {
    let radius = TORCH_RADIUS / TILE_SIZE;
    let step = angle_step(fan.torch_remaining, fan.torch_max);
    let half = fan.plane / 2.0;

    let mut result = FanResult::default();
    let mut angle = -half;
    loop {
        let hit = cast_ray(grid, fan.origin, fan.facing + angle, fan.enemy_tile);
        let ray = match hit {
            RayHit::Wall { tile, last_open, dist } if dist < radius => {
                if let Some(i) = grid.checked_index(tile.0, tile.1) {
                    seen.mark(i);
                }
                Ray { angle, hit: Some(last_open) }
            }
            RayHit::Enemy { last_open, dist } if dist < radius => {
                result.enemy_visible = true;
                Ray { angle, hit: Some(last_open) }
            }
            _ => Ray { angle, hit: None },
        };
        result.rays.push(ray);

        if angle >= half || result.rays.len() >= MAX_RAYS_PER_FAN {
            break;
        }
        angle += step;
    }
    result
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ENEMY: (i32, i32) = (-100, -100);

    fn corridor(len: usize, inner_wall: Option<usize>) -> Grid {
        let mut rows = vec!["#".repeat(len), String::new(), "#".repeat(len)];
        let mut mid: Vec<char> = std::iter::once('#')
            .chain(std::iter::repeat(' ').take(len - 2))
            .chain(std::iter::once('#'))
            .collect();
        if let Some(c) = inner_wall {
            mid[c] = '#';
        }
        rows[1] = mid.into_iter().collect();
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        Grid::from_rows(&refs)
    }

    fn fan_east(torch_remaining: u32) -> Fan {
        Fan {
            origin: (1.5, 1.5),
            facing: 0.0,
            plane: 0.0,
            torch_remaining,
            torch_max: 100,
            enemy_tile: NO_ENEMY,
        }
    }

    #[test]
    fn ray_hits_nearest_wall() {
        let grid = corridor(12, Some(6));
        match cast_ray(&grid, (1.5, 1.5), 0.0, NO_ENEMY) {
            RayHit::Wall { tile, last_open, dist } => {
                assert_eq!(tile, (6, 1));
                assert_eq!(last_open, (5, 1));
                assert!((dist - 4.5).abs() < 1e-4);
            }
            other => panic!("expected wall hit, got {:?}", other),
        }
    }

    #[test]
    fn ray_stops_at_enemy_before_wall() {
        let grid = corridor(12, Some(6));
        match cast_ray(&grid, (1.5, 1.5), 0.0, (4, 1)) {
            RayHit::Enemy { last_open, dist } => {
                assert_eq!(last_open, (3, 1));
                assert!((dist - 2.5).abs() < 1e-4);
            }
            other => panic!("expected enemy hit, got {:?}", other),
        }
    }

    #[test]
    fn ray_gives_up_after_step_budget() {
        let grid = corridor(RAY_MAX_STEPS as usize + 50, None);
        assert_eq!(cast_ray(&grid, (1.5, 1.5), 0.0, NO_ENEMY), RayHit::Nothing);
    }

    #[test]
    fn in_range_hit_marks_tile_seen() {
        let grid = corridor(12, Some(6));
        let mut seen = SeenTiles::new(grid.len(), 50);
        let out = cast_fan(&grid, &fan_east(50), &mut seen);
        assert_eq!(out.rays.len(), 1);
        assert_eq!(out.rays[0].hit, Some((5, 1)));
        assert_eq!(seen.age(grid.index(6, 1)), 50);
        assert_eq!(seen.seen_count(), 1);
    }

    #[test]
    fn out_of_range_hit_marks_nothing() {
        // Wall 17.5 tiles away; torch reaches 8.
        let grid = corridor(20, None);
        let mut seen = SeenTiles::new(grid.len(), 50);
        let out = cast_fan(&grid, &fan_east(50), &mut seen);
        assert_eq!(out.rays[0].hit, None);
        assert_eq!(seen.seen_count(), 0);
    }

    #[test]
    fn fan_hits_beyond_radius_never_marked() {
        let grid = Grid::bordered(40, 40);
        let mut seen = SeenTiles::new(grid.len(), 50);
        let origin = (20.3, 20.7);
        let fan = Fan {
            origin,
            facing: 1.0,
            plane: std::f32::consts::PI * 2.0,
            torch_remaining: 1,
            torch_max: 100,
            enemy_tile: NO_ENEMY,
        };
        cast_fan(&grid, &fan, &mut seen);
        // Every border wall is at least ~19 tiles away.
        assert_eq!(seen.seen_count(), 0);

        let fan = Fan { origin: (3.2, 3.6), ..fan };
        cast_fan(&grid, &fan, &mut seen);
        let radius = TORCH_RADIUS / TILE_SIZE;
        for i in 0..grid.len() {
            if !seen.is_seen(i) {
                continue;
            }
            let (c, r) = grid.coords(i);
            // Nearest point of the tile must lie inside the torch radius.
            let nx = (origin_clamp(3.2, c)) - 3.2;
            let ny = (origin_clamp(3.6, r)) - 3.6;
            assert!((nx * nx + ny * ny).sqrt() < radius, "tile {:?} lit from too far", (c, r));
        }
        assert!(seen.seen_count() > 0);
    }

    fn origin_clamp(p: f32, cell: usize) -> f32 {
        p.clamp(cell as f32, cell as f32 + 1.0)
    }

    #[test]
    fn enemy_in_range_is_flagged() {
        let grid = corridor(12, None);
        let mut seen = SeenTiles::new(grid.len(), 50);
        let fan = Fan { enemy_tile: (5, 1), ..fan_east(50) };
        let out = cast_fan(&grid, &fan, &mut seen);
        assert!(out.enemy_visible);
        assert_eq!(seen.seen_count(), 0);
    }

    #[test]
    fn enemy_out_of_range_is_not_flagged() {
        let grid = corridor(20, None);
        let mut seen = SeenTiles::new(grid.len(), 50);
        let fan = Fan { enemy_tile: (15, 1), ..fan_east(50) };
        assert!(!cast_fan(&grid, &fan, &mut seen).enemy_visible);
    }

    #[test]
    fn fan_thins_as_torch_burns_down() {
        assert!(angle_step(99, 100) < angle_step(50, 100));
        assert!(angle_step(50, 100) < angle_step(1, 100));
        assert!((angle_step(0, 100) - 0.5).abs() < 1e-6);
        assert!(angle_step(100, 100) > 0.0, "step never collapses to zero");

        let grid = Grid::bordered(30, 30);
        let mut seen = SeenTiles::new(grid.len(), 50);
        let mut fan = Fan {
            origin: (15.5, 15.5),
            facing: 0.0,
            plane: DEFAULT_PLANE,
            torch_remaining: 99,
            torch_max: 100,
            enemy_tile: NO_ENEMY,
        };
        let dense = cast_fan(&grid, &fan, &mut seen).rays.len();
        fan.torch_remaining = 1;
        let sparse = cast_fan(&grid, &fan, &mut seen).rays.len();
        assert!(dense > sparse);
        assert!(sparse >= 2);
    }

    #[test]
    fn fan_is_bounded_even_with_full_torch() {
        let grid = Grid::bordered(30, 30);
        let mut seen = SeenTiles::new(grid.len(), 50);
        let fan = Fan {
            origin: (15.5, 15.5),
            facing: 0.0,
            plane: DEFAULT_PLANE,
            torch_remaining: 100,
            torch_max: 100,
            enemy_tile: NO_ENEMY,
        };
        let rays = cast_fan(&grid, &fan, &mut seen).rays.len();
        assert!(rays <= MAX_RAYS_PER_FAN);
    }
}
