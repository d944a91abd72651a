/// World: the screen state machine around level sessions.
///
/// ## Screens
///
/// | from          | trigger              | to                      | on enter      |
/// |---------------|----------------------|-------------------------|---------------|
/// | Title         | torch key            | EnteringLevel           | `level += 1`  |
/// | EnteringLevel | 3 s elapsed          | Playing                 | generate      |
/// | Playing       | `PlayerCaught`       | GameOver                | `level = 0`   |
/// | Playing       | `LevelExplored`      | EnteringLevel, after 4 s| `level += 1`  |
/// | GameOver      | 7 s elapsed          | Title                   |               |
///
/// Every screen counts its own ticks from 0. A deferred transition fires on
/// the first tick at or after the scheduled count; entering any screen
/// cancels whatever was pending.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::entity::FrameInput;
use crate::domain::tile::TILE_SIZE;
use super::event::GameEvent;
use super::level::{self, LevelGenError, LevelParams};
use super::session::{LevelSession, SessionTiming};
use super::step;

/// Logical screen size, world units.
pub const SCREEN_W: f32 = 128.0;
pub const SCREEN_H: f32 = 96.0;
/// Map rows are two short of the screen; the HUD sits above the map.
pub const MAP_W: usize = (SCREEN_W / TILE_SIZE) as usize;
pub const MAP_H: usize = (SCREEN_H / TILE_SIZE) as usize - 2;
/// Player spawn tile: `(SCREEN_W / 2, SCREEN_H / 2 + 16)` in world units.
pub const SPAWN_TILE: (usize, usize) = (
    (SCREEN_W / 2.0 / TILE_SIZE) as usize,
    ((SCREEN_H / 2.0 + 16.0) / TILE_SIZE) as usize,
);

pub const ENTERING_LEVEL_SECONDS: f32 = 3.0;
pub const GAME_OVER_SECONDS: f32 = 7.0;
pub const GAME_OVER_TEXT_SECONDS: f32 = 2.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScreenKind {
    Title,
    EnteringLevel,
    Playing,
    GameOver,
}

pub enum Screen {
    Title,
    EnteringLevel,
    Playing(Box<LevelSession>),
    GameOver,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Title => ScreenKind::Title,
            Screen::EnteringLevel => ScreenKind::EnteringLevel,
            Screen::Playing(_) => ScreenKind::Playing,
            Screen::GameOver => ScreenKind::GameOver,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    to: ScreenKind,
    at: u32,
}

pub struct World {
    pub screen: Screen,
    /// Current level number; 0 on the title screen.
    pub level: u32,
    /// Ticks since the current screen was entered.
    pub screen_ticks: u32,
    pub timing: SessionTiming,
    pub map_size: (usize, usize),
    pub spawn: (usize, usize),
    pending: Option<Pending>,
    rng: ChaCha8Rng,
}

// ── Construction ──

impl World {
    /// A world on the title screen. Without a seed, one is drawn at random
    /// and logged so the run can be replayed.
    pub fn new(timing: SessionTiming, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        info!("level seed {}", seed);
        World {
            screen: Screen::Title,
            level: 0,
            screen_ticks: 0,
            timing,
            map_size: (MAP_W, MAP_H),
            spawn: SPAWN_TILE,
            pending: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn session(&self) -> Option<&LevelSession> {
        match &self.screen {
            Screen::Playing(s) => Some(s),
            _ => None,
        }
    }

    pub fn game_over_text_visible(&self) -> bool {
        self.screen.kind() == ScreenKind::GameOver
            && self.screen_ticks > self.timing.clock.seconds_to_ticks(GAME_OVER_TEXT_SECONDS)
    }
}

// ── Update ──

impl World {
    /// One fixed tick: update the current screen, advance its tick counter,
    /// then fire a due deferred transition.
    pub fn update(&mut self, input: FrameInput) -> Result<Vec<GameEvent>, LevelGenError> {
        let clock = self.timing.clock;
        let mut events = Vec::new();
        let mut next = None;

        match &mut self.screen {
            Screen::Title => {
                if input.torch {
                    next = Some(ScreenKind::EnteringLevel);
                }
            }
            Screen::EnteringLevel => {
                if self.screen_ticks >= clock.seconds_to_ticks(ENTERING_LEVEL_SECONDS) {
                    next = Some(ScreenKind::Playing);
                }
            }
            Screen::Playing(session) => {
                events = step::step(session, input);
                for event in &events {
                    match event {
                        GameEvent::PlayerCaught => next = Some(ScreenKind::GameOver),
                        GameEvent::LevelExplored => {
                            self.pending = Some(Pending {
                                to: ScreenKind::EnteringLevel,
                                at: self.screen_ticks + session.timing.next_level_delay,
                            });
                        }
                        _ => {}
                    }
                }
            }
            Screen::GameOver => {
                if self.screen_ticks > clock.seconds_to_ticks(GAME_OVER_SECONDS) {
                    next = Some(ScreenKind::Title);
                }
            }
        }

        if let Some(to) = next {
            self.enter(to)?;
            return Ok(events);
        }

        self.screen_ticks += 1;
        if let Some(p) = self.pending {
            if self.screen_ticks >= p.at {
                self.enter(p.to)?;
            }
        }
        Ok(events)
    }

    /// Switch screens now, running the target's on-enter effects.
    pub fn enter(&mut self, to: ScreenKind) -> Result<(), LevelGenError> {
        let screen = match to {
            ScreenKind::Title => Screen::Title,
            ScreenKind::EnteringLevel => {
                self.level += 1;
                Screen::EnteringLevel
            }
            ScreenKind::Playing => Screen::Playing(Box::new(self.new_session()?)),
            ScreenKind::GameOver => {
                self.level = 0;
                Screen::GameOver
            }
        };
        info!("screen {:?} -> {:?} (level {})", self.screen.kind(), to, self.level);
        self.screen = screen;
        self.screen_ticks = 0;
        self.pending = None;
        Ok(())
    }

    fn new_session(&mut self) -> Result<LevelSession, LevelGenError> {
        let params = LevelParams {
            level: self.level,
            width: self.map_size.0,
            height: self.map_size.1,
            spawn: self.spawn,
            max_tile_age: self.timing.max_tile_age,
        };
        let level = level::generate(&params, &mut self.rng)?;
        debug!("level {}: {} edge tiles to explore", level.number, level.edge_tiles.len());
        Ok(LevelSession::new(level, self.timing))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
