/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use log::{debug, info, warn};

use config::GameConfig;
use sim::clock::FixedStep;
use sim::event::GameEvent;
use sim::world::{World, SCREEN_H, SCREEN_W};
use ui::canvas::PixelCanvas;
use ui::gamepad::GamepadState;
use ui::input::{Action, Devices, InputSource, InputState};
use ui::renderer::Renderer;
use ui::scene;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    env_logger::init();

    let config = GameConfig::load();
    debug!("{:?}", config);

    let mut world = World::new(config.session_timing(), config.generation.seed);
    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;
    let enhanced = enable_key_release();

    let result = game_loop(&mut world, &mut renderer, &config, enhanced);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    // Restore the terminal before any error reaches the user.
    renderer.cleanup().context("terminal cleanup failed")?;
    result?;

    println!("The walls close in. Thanks for playing.");
    Ok(())
}

/// Ask the terminal for key release events. Returns whether it agreed.
fn enable_key_release() -> bool {
    match terminal::supports_keyboard_enhancement() {
        Ok(true) => execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .map_err(|e| warn!("keyboard enhancement failed: {e}"))
        .is_ok(),
        _ => false,
    }
}

fn game_loop(world: &mut World, renderer: &mut Renderer, config: &GameConfig, enhanced: bool) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }

    let mut canvas = PixelCanvas::new(SCREEN_W as usize, SCREEN_H as usize);
    let mut fixed = FixedStep::new(config.clock(), config.timing.max_frame_ms);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.quit_pressed() || gp.is_held(Action::Quit) {
            break;
        }

        let now = Instant::now();
        let ticks = fixed.advance(now - last_frame);
        last_frame = now;

        for _ in 0..ticks {
            let devices: [&dyn InputSource; 2] = [&kb, &gp];
            let input = Devices(&devices).frame_input();
            let events = world.update(input).context("level generation failed")?;
            log_events(world, &events);
        }

        scene::draw(world, &mut canvas);
        renderer.render(&canvas, world.screen.kind())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn log_events(world: &World, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PlayerCaught => info!("caught"),
            GameEvent::LevelExplored => {
                let seen = world.session().map_or(0, |s| s.level.seen.seen_count());
                info!("level {} explored, {} tiles seen", world.level, seen);
            }
            other => debug!("{:?}", other),
        }
    }
}
