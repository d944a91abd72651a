/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Thrust / Turn
///   A / X                 →  Torch
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
use log::debug;

use crate::config::GamepadConfig;
use super::input::{Action, InputSource};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    torch: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            torch: vec![Btn::A, Btn::X],
            quit:  vec![Btn::Select],
        }
    }
}

/// Directional state from either the D-pad or the left stick.
#[derive(Clone, Copy, Debug, Default)]
struct Dirs {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [bool; BTN_COUNT],
    dpad: Dirs,
    stick: Dirs,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    debug!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [false; BTN_COUNT],
            dpad: Dirs::default(),
            stick: Dirs::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are skipped; a list
    /// with no usable names keeps the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names
                .iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        debug!("ignoring unknown gamepad button {s:?}");
                    }
                    btn
                })
                .collect()
        }
        let map = &mut self.action_map;
        let torch = parse_list(&cfg.torch);
        if !torch.is_empty() { map.torch = torch; }
        let quit = parse_list(&cfg.quit);
        if !quit.is_empty() { map.quit = quit; }
    }

    pub fn update(&mut self) {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    debug!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    debug!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        self.stick = Dirs {
            left: self.stick_x < -STICK_DEADZONE,
            right: self.stick_x > STICK_DEADZONE,
            up: self.stick_y > STICK_DEADZONE,
            down: self.stick_y < -STICK_DEADZONE,
        };
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp    => { self.dpad.up = held; return; }
            Button::DPadDown  => { self.dpad.down = held; return; }
            Button::DPadLeft  => { self.dpad.left = held; return; }
            Button::DPadRight => { self.dpad.right = held; return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)] = held;
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)])
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [false; BTN_COUNT];
        self.dpad = Dirs::default();
        self.stick = Dirs::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

impl InputSource for GamepadState {
    fn is_held(&self, action: Action) -> bool {
        match action {
            Action::Up => self.dpad.up || self.stick.up,
            Action::Down => self.dpad.down || self.stick.down,
            Action::Left => self.dpad.left || self.stick.left,
            Action::Right => self.dpad.right || self.stick.right,
            Action::Torch => self.any_held(&self.action_map.torch),
            Action::Quit => self.any_held(&self.action_map.quit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        let mut gp = GamepadState::new();
        gp.release_all();
        gp
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("select"), Some(Btn::Select));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("RB"), Some(Btn::R1));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_remaps_torch() {
        let mut gp = pad();
        gp.load_button_config(&GamepadConfig {
            torch: vec!["R1".into(), "bogus".into()],
            quit: vec![],
        });
        gp.buttons[btn_index(Btn::A)] = true;
        assert!(!gp.is_held(Action::Torch));
        gp.buttons[btn_index(Btn::R1)] = true;
        assert!(gp.is_held(Action::Torch));
        // Empty list keeps the default.
        gp.buttons[btn_index(Btn::Select)] = true;
        assert!(gp.is_held(Action::Quit));
    }

    #[test]
    fn dpad_and_stick_both_steer() {
        let mut gp = pad();
        gp.dpad.left = true;
        gp.stick.up = true;
        let input = gp.frame_input();
        assert!(input.turn_left && input.forward);
        assert!(!input.turn_right && !input.backward);
    }
}
