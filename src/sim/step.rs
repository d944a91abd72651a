/// The step function: advances a level session by one tick.
///
/// Processing order:
///   1. Input (Active only): thrust, turn, light the torch
///   2. Torch countdown
///   3. Wall collision, per axis
///   4. Apply velocity, then damp it
///   5. Enemy proximity
///   6. Repath (A* from the enemy's tile to the player's)
///   7. Enemy walks its route (Active only)
///   8. Player caught check
///   9. Heart rate
///  10. Seen decay
///  11. Torch rays
///  12. Win check
///
/// The session's tick counter advances after all of the above, so anything
/// scheduled "N ticks from now" during this step counts from the current
/// tick.

use crate::domain::ai;
use crate::domain::entity::{lerp, FrameInput, PLAYER_SIZE, PLAYER_THRUST, PLAYER_TURN_RATE};
use crate::domain::raycast::{self, Fan};
use crate::domain::tile::TILE_SIZE;
use super::event::GameEvent;
use super::session::{LevelSession, SessionState, HEART_MAX_SIZE, HEART_MIN_SIZE};

/// Closer than this, the enemy is sensed and always homes in.
pub const ENEMY_PROXIMITY: f32 = 12.0;
/// Fraction of the remaining distance the enemy covers per tick.
pub const ENEMY_LERP: f32 = 0.06;
/// Fraction of the velocity lost per tick.
pub const VELOCITY_DAMPING: f32 = 0.15;
/// Fraction of the way the heart shrinks back per tick.
const HEART_LERP: f32 = 0.15;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(session: &mut LevelSession, input: FrameInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    let mut repath = false;
    if session.is_active() {
        repath |= resolve_input(session, input, &mut events);
    }
    if session.torch_timer > 0 {
        session.torch_timer -= 1;
    }
    resolve_player_movement(session);
    let enemy_dist = session.player.distance_to(&session.enemy);
    repath |= resolve_proximity(session, enemy_dist, &mut events);
    if repath {
        resolve_repath(session, &mut events);
    }
    if session.is_active() {
        resolve_enemy_movement(session);
    }
    if session.player.overlaps(&session.enemy) {
        events.push(GameEvent::PlayerCaught);
    }
    resolve_heart(session, enemy_dist, &mut events);
    session.level.seen.decay();
    resolve_torch(session);
    resolve_win(session, &mut events);

    session.ticks += 1;
    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Returns true when the torch was lit this tick.
fn resolve_input(session: &mut LevelSession, input: FrameInput, events: &mut Vec<GameEvent>) -> bool {
    let p = &mut session.player;
    if input.forward {
        p.vel_x = p.angle.cos() * PLAYER_THRUST;
        p.vel_y = p.angle.sin() * PLAYER_THRUST;
    }
    if input.backward {
        p.vel_x = -p.angle.cos() * PLAYER_THRUST;
        p.vel_y = -p.angle.sin() * PLAYER_THRUST;
    }
    if input.turn_left {
        p.angle -= PLAYER_TURN_RATE;
    }
    if input.turn_right {
        p.angle += PLAYER_TURN_RATE;
    }

    if input.torch && session.torch_timer == 0 {
        session.torch_timer = session.timing.torch_ticks;
        events.push(GameEvent::TorchLit);
        return true;
    }
    false
}

/// Axis-independent sliding collision. Each axis probes its leading edges
/// at the current position on the other axis and is zeroed when blocked.
fn resolve_player_movement(session: &mut LevelSession) {
    let grid = &session.level.grid;
    let p = &mut session.player;

    if grid.is_wall(p.x + p.vel_x - 2.0, p.y) || grid.is_wall(p.x + p.vel_x + PLAYER_SIZE + 1.0, p.y) {
        p.vel_x = 0.0;
    }
    if grid.is_wall(p.x, p.y + p.vel_y - 2.0) || grid.is_wall(p.x, p.y + p.vel_y + PLAYER_SIZE + 1.0) {
        p.vel_y = 0.0;
    }

    p.x += p.vel_x;
    p.y += p.vel_y;

    p.vel_x = lerp(p.vel_x, 0.0, VELOCITY_DAMPING);
    p.vel_y = lerp(p.vel_y, 0.0, VELOCITY_DAMPING);
}

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

/// Visibility is recomputed every tick: sensed here, or lit by a ray later.
/// Returns true when the enemy is close enough to home in.
fn resolve_proximity(session: &mut LevelSession, enemy_dist: f32, events: &mut Vec<GameEvent>) -> bool {
    session.enemy_visible = false;
    if enemy_dist < ENEMY_PROXIMITY {
        session.enemy_visible = true;
        events.push(GameEvent::EnemySensed);
        return true;
    }
    false
}

fn resolve_repath(session: &mut LevelSession, events: &mut Vec<GameEvent>) {
    let path = ai::find_path(&session.level.grid, session.enemy.tile(), session.player.tile());
    events.push(GameEvent::EnemyRepathed { steps: path.len() });
    session.path = path.into();
}

/// Drift toward the centre of the next waypoint. The waypoint is consumed
/// once the enemy's tile (taken before this tick's move) matches it.
fn resolve_enemy_movement(session: &mut LevelSession) {
    let Some(&next) = session.path.front() else { return };
    let (col, row) = session.level.grid.coords(next);
    let (col, row) = (col as i32, row as i32);
    let enemy_tile = session.enemy.tile();

    let e = &mut session.enemy;
    e.x = lerp(e.x, col as f32 * TILE_SIZE + TILE_SIZE / 2.0, ENEMY_LERP);
    e.y = lerp(e.y, row as f32 * TILE_SIZE + TILE_SIZE / 2.0, ENEMY_LERP);

    if enemy_tile == (col, row) {
        session.path.pop_front();
    }
}

/// Faster beats as the enemy closes in. Purely cosmetic.
fn resolve_heart(session: &mut LevelSession, enemy_dist: f32, events: &mut Vec<GameEvent>) {
    let bpm = heart_rate(enemy_dist);
    session.heart_bpm = bpm;
    if session.ticks % session.timing.clock.ticks_per_beat(bpm) == 0 {
        session.heart_size = HEART_MAX_SIZE;
        events.push(GameEvent::HeartBeat { bpm });
    }
    session.heart_size = lerp(session.heart_size, HEART_MIN_SIZE, HEART_LERP);
}

pub fn heart_rate(enemy_dist: f32) -> u32 {
    if enemy_dist < 24.0 {
        160
    } else if enemy_dist < 40.0 {
        100
    } else {
        60
    }
}

// ══════════════════════════════════════════════════════════════
// Torch / win
// ══════════════════════════════════════════════════════════════

fn resolve_torch(session: &mut LevelSession) {
    session.rays.clear();
    if session.torch_timer == 0 {
        return;
    }
    let fan = Fan {
        origin: session.player.tile_pos(),
        facing: session.player.angle,
        plane: session.plane,
        torch_remaining: session.torch_timer,
        torch_max: session.timing.torch_ticks,
        enemy_tile: session.enemy.tile(),
    };
    let result = raycast::cast_fan(&session.level.grid, &fan, &mut session.level.seen);
    session.enemy_visible |= result.enemy_visible;
    session.rays = result.rays;
}

fn resolve_win(session: &mut LevelSession, events: &mut Vec<GameEvent>) {
    if session.done || session.explored() != session.edge_count() {
        return;
    }
    session.done = true;
    session.state = SessionState::Completing;
    session.level_end_anim_ticks = session.ticks + session.timing.level_end_anim_delay;
    events.push(GameEvent::LevelExplored);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Enemy;
    use crate::domain::grid::Grid;
    use crate::sim::level::Level;
    use crate::sim::session::SessionTiming;

    /// Session on `grid` with the player on `spawn` and the enemy parked
    /// off the map, where it can neither be seen nor route anywhere.
    fn session_on(grid: Grid, spawn: (usize, usize)) -> LevelSession {
        let level = Level::from_grid(1, grid, spawn, (1, 1), 1199);
        let mut s = LevelSession::new(level, SessionTiming::default());
        s.enemy = Enemy::new(-100.0, -100.0);
        s
    }

    fn open_session() -> LevelSession {
        session_on(Grid::bordered(32, 22), (16, 16))
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    #[test]
    fn forward_thrust_moves_along_facing_and_damps() {
        let mut s = open_session();
        s.player.angle = 0.0;
        let x0 = s.player.x;
        step(&mut s, FrameInput { forward: true, ..idle() });
        assert!((s.player.x - (x0 + 0.5)).abs() < 1e-5);
        assert!((s.player.vel_x - 0.425).abs() < 1e-5);
        step(&mut s, idle());
        assert!(s.player.x > x0 + 0.9);
        assert!(s.player.vel_x < 0.425);
    }

    #[test]
    fn turning_changes_angle_only() {
        let mut s = open_session();
        let a0 = s.player.angle;
        step(&mut s, FrameInput { turn_right: true, ..idle() });
        assert!((s.player.angle - (a0 + 0.05)).abs() < 1e-6);
        step(&mut s, FrameInput { turn_left: true, ..idle() });
        assert!((s.player.angle - a0).abs() < 1e-5);
        assert_eq!(s.player.vel_x, 0.0);
    }

    #[test]
    fn wall_blocks_one_axis_and_lets_the_other_slide() {
        let mut s = session_on(Grid::bordered(10, 10), (2, 2));
        // Left wall at x < 4: probe at x - 2 is inside it.
        s.player.x = 5.5;
        s.player.y = 16.0;
        s.player.vel_x = -0.5;
        s.player.vel_y = 0.5;
        step(&mut s, idle());
        assert_eq!(s.player.x, 5.5);
        assert_eq!(s.player.vel_x, 0.0);
        assert!((s.player.y - 16.5).abs() < 1e-5);
    }

    #[test]
    fn torch_lights_once_and_burns_down() {
        let mut s = open_session();
        let events = step(&mut s, FrameInput { torch: true, ..idle() });
        assert!(events.contains(&GameEvent::TorchLit));
        assert_eq!(s.torch_timer, s.timing.torch_ticks - 1);
        assert!(!s.rays.is_empty());

        // Holding the key while lit does not relight.
        let events = step(&mut s, FrameInput { torch: true, ..idle() });
        assert!(!events.contains(&GameEvent::TorchLit));
        assert_eq!(s.torch_timer, s.timing.torch_ticks - 2);

        for _ in 0..s.timing.torch_ticks {
            step(&mut s, idle());
        }
        assert!(!s.torch_lit());
        assert!(s.rays.is_empty());
    }

    #[test]
    fn lighting_the_torch_repaths_the_enemy() {
        let mut s = open_session();
        s.enemy = Enemy::new(8.0, 8.0);
        let events = step(&mut s, FrameInput { torch: true, ..idle() });
        let steps = events.iter().find_map(|e| match e {
            GameEvent::EnemyRepathed { steps } => Some(*steps),
            _ => None,
        });
        assert_eq!(steps, Some(14));
        assert_eq!(s.path.back(), Some(&s.level.grid.index(16, 16)));
    }

    #[test]
    fn adjacent_enemy_is_sensed_and_routed_next_update() {
        let mut s = open_session();
        s.enemy = Enemy::new(68.0, 64.0);
        assert!(!s.enemy_visible);
        assert!(s.path.is_empty());

        let events = step(&mut s, idle());
        assert!(s.enemy_visible);
        assert!(!s.path.is_empty());
        assert!(events.contains(&GameEvent::EnemySensed));
        assert!(!events.contains(&GameEvent::PlayerCaught));
    }

    #[test]
    fn enemy_consumes_waypoint_once_on_it() {
        let mut s = open_session();
        s.enemy = Enemy::new(40.0, 64.0);
        let target = s.level.grid.index(11, 16);
        s.path = vec![target, s.level.grid.index(12, 16)].into();
        // Enemy at tile (10, 16), heading for (11, 16).
        step(&mut s, idle());
        assert_eq!(s.path.len(), 2);
        assert!(s.enemy.x > 40.0);
        for _ in 0..200 {
            step(&mut s, idle());
            if s.path.len() < 2 {
                break;
            }
        }
        assert_eq!(s.path.front(), Some(&s.level.grid.index(12, 16)));
    }

    #[test]
    fn touching_the_enemy_is_fatal() {
        let mut s = open_session();
        s.enemy = Enemy::new(s.player.x - 1.0, s.player.y - 1.0);
        let events = step(&mut s, idle());
        assert!(events.contains(&GameEvent::PlayerCaught));
    }

    #[test]
    fn heart_rate_tiers() {
        assert_eq!(heart_rate(10.0), 160);
        assert_eq!(heart_rate(30.0), 100);
        assert_eq!(heart_rate(40.0), 60);
    }

    #[test]
    fn heart_beats_on_schedule() {
        let mut s = open_session();
        let events = step(&mut s, idle());
        assert!(events.contains(&GameEvent::HeartBeat { bpm: 60 }));
        assert!(s.heart_size > HEART_MIN_SIZE);
        let mut beats = 0;
        for _ in 0..59 {
            if step(&mut s, idle()).iter().any(|e| matches!(e, GameEvent::HeartBeat { .. })) {
                beats += 1;
            }
        }
        // Next beat is on tick 59.
        assert_eq!(beats, 1);
        assert_eq!(s.ticks, 60);
    }

    #[test]
    fn seen_tiles_decay_but_stay_seen() {
        let mut s = open_session();
        let edge = *s.level.edge_tiles.iter().next().unwrap();
        s.level.seen.mark(edge);
        for _ in 0..5000 {
            step(&mut s, idle());
        }
        assert_eq!(s.level.seen.age(edge), 1);
        assert_eq!(s.explored(), 1);
    }

    #[test]
    fn win_triggers_on_the_exact_tick_and_only_once() {
        let mut s = session_on(Grid::bordered(8, 8), (4, 4));
        let edges: Vec<usize> = s.level.edge_tiles.iter().copied().collect();
        let (last, rest) = edges.split_last().unwrap();
        for &i in rest {
            s.level.seen.mark(i);
        }

        let events = step(&mut s, idle());
        assert!(!events.contains(&GameEvent::LevelExplored));
        assert_eq!(s.state, SessionState::Active);

        s.level.seen.mark(*last);
        let tick = s.ticks;
        let events = step(&mut s, idle());
        assert!(events.contains(&GameEvent::LevelExplored));
        assert_eq!(s.state, SessionState::Completing);
        assert!(s.done);
        assert_eq!(s.level_end_anim_ticks, tick + s.timing.level_end_anim_delay);

        for _ in 0..100 {
            let events = step(&mut s, idle());
            assert!(!events.contains(&GameEvent::LevelExplored));
        }
    }

    #[test]
    fn completing_freezes_input() {
        let mut s = open_session();
        s.state = SessionState::Completing;
        s.done = true;
        let a0 = s.player.angle;
        let events = step(&mut s, FrameInput { forward: true, turn_left: true, torch: true, ..idle() });
        assert!(!events.contains(&GameEvent::TorchLit));
        assert_eq!(s.player.angle, a0);
        assert_eq!(s.player.vel_x, 0.0);
    }

    #[test]
    fn spinning_with_torch_held_explores_open_room() {
        let mut s = session_on(Grid::bordered(10, 10), (5, 5));
        assert_eq!(s.edge_count(), 32);
        let input = FrameInput { torch: true, turn_right: true, ..idle() };

        let mut completed_at = None;
        for t in 0..60 * 60 {
            let events = step(&mut s, input);
            if events.contains(&GameEvent::LevelExplored) {
                completed_at = Some(t);
                break;
            }
        }
        assert!(completed_at.is_some(), "explored {} of {}", s.explored(), s.edge_count());
        assert_eq!(s.explored(), 32);
        assert_eq!(s.state, SessionState::Completing);
    }
}
