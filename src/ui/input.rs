/// Keyboard input and the logical action layer.
///
/// The simulation only ever asks "is this action held?" through
/// `InputSource`. The keyboard tracker below answers it from crossterm
/// events; the gamepad tracker answers it from gilrs.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Logical actions, independent of the physical device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Torch,
    Quit,
}

/// Anything that can report held actions.
pub trait InputSource {
    fn is_held(&self, action: Action) -> bool;

    /// Snapshot of the gameplay actions for one tick.
    fn frame_input(&self) -> FrameInput {
        FrameInput {
            forward: self.is_held(Action::Up),
            backward: self.is_held(Action::Down),
            turn_left: self.is_held(Action::Left),
            turn_right: self.is_held(Action::Right),
            torch: self.is_held(Action::Torch),
        }
    }
}

/// Several devices at once: an action is held if any device holds it.
pub struct Devices<'a>(pub &'a [&'a dyn InputSource]);

impl InputSource for Devices<'_> {
    fn is_held(&self, action: Action) -> bool {
        self.0.iter().any(|d| d.is_held(action))
    }
}

// ── Key Constants ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_TORCH: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn keys_for(action: Action) -> &'static [KeyCode] {
    match action {
        Action::Up => KEYS_UP,
        Action::Down => KEYS_DOWN,
        Action::Left => KEYS_LEFT,
        Action::Right => KEYS_RIGHT,
        Action::Torch => KEYS_TORCH,
        Action::Quit => KEYS_QUIT,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Raw key events collected during the last drain.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation ticks.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    /// Was Ctrl+C pressed during the last drain?
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Was a quit key pressed during the last drain? Unlike `is_held`,
    /// this catches taps shorter than one frame.
    pub fn quit_pressed(&self) -> bool {
        self.raw_events
            .iter()
            .any(|k| k.kind != KeyEventKind::Release && KEYS_QUIT.contains(&k.code))
    }

    // ── Internal ──

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, rely on timeout-based expiry instead.
            KeyEventKind::Release => {}
            _ => {
                self.last_active.insert(key.code, now);
            }
        }
    }

    /// Expire keys that have timed out (fallback for terminals without Release).
    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn key_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }
}

impl InputSource for InputState {
    fn is_held(&self, action: Action) -> bool {
        keys_for(action).iter().any(|&c| self.key_held(c))
    }
}
