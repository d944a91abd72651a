/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in timings if the file is missing or
/// incomplete.

use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sim::clock::{Clock, DEFAULT_MAX_FRAME_MS, DEFAULT_UPDATE_RATE_MS};
use crate::sim::session::{SessionTiming, TILE_FADE_SECONDS, TILE_MAX_AGE_SECONDS, TORCH_SECONDS};

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub generation: GenerationConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub update_rate_ms: f32,
    pub max_frame_ms: f32,
    pub torch_seconds: f32,
    pub tile_max_age_seconds: f32,
    pub tile_fade_seconds: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Fixed level seed; `None` draws a fresh one per run.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub torch: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    generation: TomlGeneration,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_update_rate")]
    update_rate_ms: f32,
    #[serde(default = "default_max_frame")]
    max_frame_ms: f32,
    #[serde(default = "default_torch")]
    torch_seconds: f32,
    #[serde(default = "default_tile_max_age")]
    tile_max_age_seconds: f32,
    #[serde(default = "default_tile_fade")]
    tile_fade_seconds: f32,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneration {
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_torch_buttons")]
    torch: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_update_rate() -> f32 { DEFAULT_UPDATE_RATE_MS }
fn default_max_frame() -> f32 { DEFAULT_MAX_FRAME_MS }
fn default_torch() -> f32 { TORCH_SECONDS }
fn default_tile_max_age() -> f32 { TILE_MAX_AGE_SECONDS }
fn default_tile_fade() -> f32 { TILE_FADE_SECONDS }

fn default_torch_buttons() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            update_rate_ms: default_update_rate(),
            max_frame_ms: default_max_frame(),
            torch_seconds: default_torch(),
            tile_max_age_seconds: default_tile_max_age(),
            tile_fade_seconds: default_tile_fade(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            torch: default_torch_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(cfg: TomlConfig) -> Self {
        GameConfig {
            timing: TimingConfig {
                update_rate_ms: cfg.timing.update_rate_ms,
                max_frame_ms: cfg.timing.max_frame_ms,
                torch_seconds: cfg.timing.torch_seconds,
                tile_max_age_seconds: cfg.timing.tile_max_age_seconds,
                tile_fade_seconds: cfg.timing.tile_fade_seconds,
            },
            generation: GenerationConfig { seed: cfg.generation.seed },
            gamepad: GamepadConfig {
                torch: cfg.gamepad.torch,
                quit: cfg.gamepad.quit,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs()).into()
    }

    /// Parse a config document. Errors are reported and replaced by defaults.
    pub fn from_toml_str(text: &str) -> Self {
        parse_toml(text, Path::new("config.toml")).into()
    }

    pub fn clock(&self) -> Clock {
        Clock::new(self.timing.update_rate_ms)
    }

    pub fn session_timing(&self) -> SessionTiming {
        SessionTiming::new(
            self.clock(),
            self.timing.torch_seconds,
            self.timing.tile_max_age_seconds,
            self.timing.tile_fade_seconds,
        )
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    debug!("loading {}", path.display());
                    return parse_toml(&text, &path);
                }
                Err(e) => warn!("could not read {}: {e}", path.display()),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{} parse error, using default settings: {e}", path.display());
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("");
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.timing.update_rate_ms, 16.667);
        assert_eq!(cfg.generation.seed, None);
        assert_eq!(cfg.gamepad.torch, vec!["A", "X"]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[timing]\ntorch_seconds = 4.0\n\n[generation]\nseed = 1234\n",
        );
        assert_eq!(cfg.timing.torch_seconds, 4.0);
        assert_eq!(cfg.timing.tile_fade_seconds, 19.0);
        assert_eq!(cfg.generation.seed, Some(1234));
        assert_eq!(cfg.gamepad.quit, vec!["Select"]);
    }

    #[test]
    fn malformed_document_falls_back() {
        let cfg = GameConfig::from_toml_str("[timing\nupdate_rate_ms = ");
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn timing_converts_to_ticks() {
        let cfg = GameConfig::from_toml_str("[timing]\nupdate_rate_ms = 10.0\ntorch_seconds = 1.0\n");
        let t = cfg.session_timing();
        assert_eq!(t.torch_ticks, 100);
        assert_eq!(t.max_tile_age, 2000);
        assert_eq!(t.fade_age, 1900);
    }
}
