/// Scene drawing: turns world state into `Canvas` calls, one function per
/// screen. Everything is in world units on the 128 × 96 logical screen;
/// the map is drawn two tiles down so the HUD fits above it.

use std::f32::consts::PI;

use crate::domain::entity::{ENEMY_DRAW_SIZE, PLAYER_SIZE};
use crate::domain::grid::Grid;
use crate::domain::raycast::TORCH_RADIUS;
use crate::domain::tile::{Tile, TILE_SIZE};
use crate::sim::session::{LevelSession, HEART_MAX_SIZE};
use crate::sim::world::{Screen, World, SCREEN_H, SCREEN_W};
use super::canvas::{Align, Baseline, Canvas};

/// Height of the HUD strip, world units.
pub const HUD_HEIGHT: f32 = 9.0;
const MAP_OFFSET_Y: f32 = TILE_SIZE * 2.0;

/// Where the title cave's eyes open, one at a time.
const EYE_POSITIONS: [(f32, f32); 9] = [
    (34.0, 11.0), (40.0, 13.0), (46.0, 13.0), (52.0, 11.0),
    (31.0, 17.0), (37.0, 19.0), (43.0, 20.0), (49.0, 19.0), (55.0, 17.0),
];
const EYE_BLINK_TICKS: u32 = 45;

pub fn draw(world: &World, c: &mut impl Canvas) {
    c.reset_transform();
    c.clear();
    match &world.screen {
        Screen::Title => draw_title(world.screen_ticks, c),
        Screen::EnteringLevel => draw_entering_level(c),
        Screen::Playing(session) => draw_session(session, world.level, c),
        Screen::GameOver => draw_game_over(world, c),
    }
}

// ══════════════════════════════════════════════════════════════
// Menus
// ══════════════════════════════════════════════════════════════

fn draw_title(ticks: u32, c: &mut impl Canvas) {
    c.text("walls", SCREEN_W / 2.0, SCREEN_H / 2.0 - 16.0, Align::Center, Baseline::Middle);
    c.text("press j to start", SCREEN_W / 2.0, SCREEN_H / 2.0 + 16.0, Align::Center, Baseline::Middle);

    // Every tenth blink, all the eyes open at once.
    let blink = (ticks / EYE_BLINK_TICKS) as usize % (EYE_POSITIONS.len() + 1);
    match EYE_POSITIONS.get(blink) {
        Some(&(x, y)) => draw_eye(x, y, c),
        None => EYE_POSITIONS.iter().for_each(|&(x, y)| draw_eye(x, y, c)),
    }
}

fn draw_eye(x: f32, y: f32, c: &mut impl Canvas) {
    c.rect(x, y, 1.0, 1.0);
    c.rect(x + 3.0, y, 1.0, 1.0);
}

fn draw_entering_level(c: &mut impl Canvas) {
    let (cx, cy) = (SCREEN_W / 2.0, SCREEN_H / 2.0);
    c.text("press j to", cx, cy - 8.0, Align::Center, Baseline::Middle);
    c.text("shine your torch", cx, cy, Align::Center, Baseline::Middle);
    c.text("uncover the map!", cx, cy + 16.0, Align::Center, Baseline::Middle);
}

fn draw_game_over(world: &World, c: &mut impl Canvas) {
    let clock = world.timing.clock;
    if world.screen_ticks > clock.seconds_to_ticks(0.5) {
        draw_monster(SCREEN_W / 2.0, SCREEN_H / 2.0 - 8.0, world.screen_ticks, c);
    }
    if world.game_over_text_visible() {
        c.text("game over", SCREEN_W / 2.0, SCREEN_H - 16.0, Align::Center, Baseline::Bottom);
    }
}

/// The thing that caught you: a jagged maw that slowly opens.
fn draw_monster(cx: f32, cy: f32, ticks: u32, c: &mut impl Canvas) {
    let open = (ticks as f32 / 20.0).min(6.0);
    c.rect(cx - 6.0, cy - 8.0, 2.0, 2.0);
    c.rect(cx + 4.0, cy - 8.0, 2.0, 2.0);
    for i in 0..6 {
        let x = cx - 12.0 + i as f32 * 4.0;
        c.line(x, cy - 2.0, x + 2.0, cy + 1.0, false);
        c.line(x + 2.0, cy + 1.0, x + 4.0, cy - 2.0, false);
        c.line(x, cy + 2.0 + open, x + 2.0, cy - 1.0 + open, false);
        c.line(x + 2.0, cy - 1.0 + open, x + 4.0, cy + 2.0 + open, false);
    }
}

// ══════════════════════════════════════════════════════════════
// Level
// ══════════════════════════════════════════════════════════════

fn draw_session(s: &LevelSession, level: u32, c: &mut impl Canvas) {
    c.save();
    c.translate(0.0, MAP_OFFSET_Y);

    let (pcx, pcy) = s.player.center();
    let mut flame = None;
    if !s.done {
        c.rect(s.player.x, s.player.y, PLAYER_SIZE, PLAYER_SIZE);
        flame = Some(draw_torch(pcx, pcy, s.player.angle, c));
    }
    if s.enemy_visible {
        c.rect(s.enemy.x, s.enemy.y, ENEMY_DRAW_SIZE, ENEMY_DRAW_SIZE);
    }

    for ray in &s.rays {
        let (x1, y1) = match ray.hit {
            Some((col, row)) => (col as f32 * TILE_SIZE, row as f32 * TILE_SIZE),
            None => {
                let a = s.player.angle + ray.angle;
                (pcx + a.cos() * TORCH_RADIUS, pcy + a.sin() * TORCH_RADIUS)
            }
        };
        c.line(pcx, pcy, x1, y1, true);
    }

    if s.done {
        draw_swirl(&s.level.grid, s.level_end_anim(), c);
    } else {
        draw_seen_walls(s, c);
    }
    c.restore();

    if let (Some((fx, fy)), true) = (flame, s.torch_lit()) {
        c.rect(fx, fy, 1.0, 1.0);
    }
    draw_hud(s, level, c);
}

/// The torch crossbar in front of the player. Returns the flame's screen
/// position.
fn draw_torch(cx: f32, cy: f32, angle: f32, c: &mut impl Canvas) -> (f32, f32) {
    c.save();
    c.translate(cx, cy);
    c.rotate(angle);
    let (s0, c0) = (PI * 0.4).sin_cos();
    let (s1, c1) = (PI * 0.6).sin_cos();
    c.line(1.0 + c0 * 2.0, s0 * 2.0, 1.0 + c1 * 2.0, s1 * 2.0, false);
    let flame = c.transform_point(3.0, 0.0);
    c.restore();
    flame
}

fn draw_seen_walls(s: &LevelSession, c: &mut impl Canvas) {
    let grid = &s.level.grid;
    let seen = &s.level.seen;
    for index in 0..grid.len() {
        if !grid.tile(index).is_wall() || !seen.is_seen(index) {
            continue;
        }
        let (col, row) = grid.coords(index);
        let (tx, ty) = (col as f32 * TILE_SIZE, row as f32 * TILE_SIZE);
        if seen.is_fresh(index, s.timing.fade_age) {
            draw_wall_edges(grid, col, row, tx, ty, c);
        } else {
            draw_wall_dots(grid, col, row, tx, ty, c);
        }
    }
}

/// Which sides of a wall tile face open floor: top, right, bottom, left.
fn open_sides(grid: &Grid, col: usize, row: usize) -> [bool; 4] {
    let (col, row) = (col as i32, row as i32);
    let floor = |dc: i32, dr: i32| grid.cell_at(col + dc, row + dr) == Tile::Floor;
    [floor(0, -1), floor(1, 0), floor(0, 1), floor(-1, 0)]
}

fn draw_wall_edges(grid: &Grid, col: usize, row: usize, tx: f32, ty: f32, c: &mut impl Canvas) {
    let t = TILE_SIZE;
    let [up, right, down, left] = open_sides(grid, col, row);
    if up { c.line(tx, ty, tx + t, ty, false); }
    if right { c.line(tx + t, ty, tx + t, ty + t, false); }
    if down { c.line(tx, ty + t, tx + t, ty + t, false); }
    if left { c.line(tx, ty, tx, ty + t, false); }
}

fn draw_wall_dots(grid: &Grid, col: usize, row: usize, tx: f32, ty: f32, c: &mut impl Canvas) {
    let (t, h) = (TILE_SIZE, TILE_SIZE / 2.0);
    let [up, right, down, left] = open_sides(grid, col, row);
    if up { c.rect(tx + h, ty, 1.0, 1.0); }
    if right { c.rect(tx + t, ty + h, 1.0, 1.0); }
    if down { c.rect(tx + h, ty + t, 1.0, 1.0); }
    if left { c.rect(tx, ty + h, 1.0, 1.0); }
}

/// Level-end effect: the whole cave, seen or not, waving sideways harder
/// as the animation runs.
fn draw_swirl(grid: &Grid, anim: u32, c: &mut impl Canvas) {
    for index in 0..grid.len() {
        if !grid.tile(index).is_wall() {
            continue;
        }
        let (col, row) = grid.coords(index);
        let mut tx = col as f32 * TILE_SIZE;
        let ty = row as f32 * TILE_SIZE;
        if anim > 0 {
            tx += 2.0 * (row as f32 / 3.0).cos() * (anim as f32 / 2.0) * (1.0 + ty / SCREEN_W);
        }
        draw_wall_edges(grid, col, row, tx, ty, c);
    }
}

fn draw_hud(s: &LevelSession, level: u32, c: &mut impl Canvas) {
    c.reset_transform();
    c.clear_rect(0.0, 0.0, SCREEN_W, HUD_HEIGHT);
    c.line(0.0, HUD_HEIGHT, SCREEN_W, HUD_HEIGHT, false);
    c.text(&format!("{}%", s.percent_explored()), 2.0, 2.0, Align::Left, Baseline::Top);
    c.text(&format!("level {}", level), SCREEN_W - 2.0, 2.0, Align::Right, Baseline::Top);

    let hs = s.heart_size;
    c.rect(SCREEN_W / 2.0 - hs / 2.0, HEART_MAX_SIZE / 2.0 - hs / 2.0, hs, hs);
}
