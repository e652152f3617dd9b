//! Application-level configuration loading: team colors, catalog location,
//! state slot backend and synchronization timings.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::game::TeamColor;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PATTERN_QUIZ_CONFIG_PATH";
/// Directory holding the file slot when none is configured.
const DEFAULT_SLOT_DIR: &str = "data";
/// Period of the polling fallback of every window.
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Period of the viewer round timer.
const DEFAULT_TIMER_TICK_MS: u64 = 1_000;
/// Fallback color returned when the colors set is exhausted.
const DEFAULT_COLOR: TeamColor = TeamColor {
    h: 0.0,
    s: 0.0,
    v: 1.0,
};

/// Where the shared state slot lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotBackend {
    /// JSON file in the given directory.
    File(PathBuf),
    /// Process memory; lost on restart.
    Memory,
    /// CouchDB document, connection read from the environment.
    Couch,
}

/// Size hint handed to clients opening a viewer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ViewerSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for ViewerSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    colors: Vec<TeamColor>,
    catalog_dir: Option<PathBuf>,
    slot: SlotBackend,
    poll_interval: Duration,
    timer_tick: Duration,
    viewer: ViewerSize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        colors = app_config.colors.len(),
                        slot = ?app_config.slot,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; omitted fields take their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Use an in-memory slot, keeping every other setting.
    pub fn with_memory_slot(mut self) -> Self {
        self.slot = SlotBackend::Memory;
        self
    }

    /// Return the first color for colors set that is not already listed in `used`.
    ///
    /// When every colors set entry is already taken we fall back to a plain white
    /// so callers always receive a value.
    pub fn first_unused_color(&self, used: &[TeamColor]) -> TeamColor {
        self.colors
            .iter()
            .find(|candidate| used.iter().all(|existing| existing != *candidate))
            .cloned()
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Directory holding catalog JSON files, `None` for the built-in catalog.
    pub fn catalog_dir(&self) -> Option<&Path> {
        self.catalog_dir.as_deref()
    }

    /// Backend of the shared state slot.
    pub fn slot(&self) -> &SlotBackend {
        &self.slot
    }

    /// Polling fallback period of every window.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Refresh period of the round timer.
    pub fn timer_tick(&self) -> Duration {
        self.timer_tick
    }

    /// Size hint for viewer windows.
    pub fn viewer(&self) -> ViewerSize {
        self.viewer
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    colors: Option<Vec<RawColor>>,
    catalog_dir: Option<PathBuf>,
    slot: RawSlot,
    poll_interval_ms: Option<u64>,
    timer_tick_ms: Option<u64>,
    viewer: ViewerSize,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let colors = value
            .colors
            .map(|colors| colors.into_iter().map(Into::into).collect::<Vec<_>>())
            .unwrap_or_else(default_colors);

        Self {
            colors,
            catalog_dir: value.catalog_dir,
            slot: value.slot.into(),
            poll_interval: Duration::from_millis(
                value
                    .poll_interval_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            timer_tick: Duration::from_millis(
                value
                    .timer_tick_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_TIMER_TICK_MS),
            ),
            viewer: value.viewer,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
/// JSON representation of the `slot` section.
enum RawSlot {
    File {
        #[serde(default)]
        dir: Option<PathBuf>,
    },
    Memory,
    Couch,
}

impl Default for RawSlot {
    fn default() -> Self {
        RawSlot::File { dir: None }
    }
}

impl From<RawSlot> for SlotBackend {
    fn from(value: RawSlot) -> Self {
        match value {
            RawSlot::File { dir } => {
                SlotBackend::File(dir.unwrap_or_else(|| PathBuf::from(DEFAULT_SLOT_DIR)))
            }
            RawSlot::Memory => SlotBackend::Memory,
            RawSlot::Couch => SlotBackend::Couch,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single HSV entry inside the configuration file.
struct RawColor {
    hue: f32,
    saturation: f32,
    value: f32,
}

impl From<RawColor> for TeamColor {
    fn from(value: RawColor) -> Self {
        Self {
            h: value.hue,
            s: value.saturation,
            v: value.value,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in colors set shipped with the binary.
fn default_colors() -> Vec<TeamColor> {
    vec![
        TeamColor {
            h: -64.69388,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: 119.331474,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: -113.57562,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: 34.365788,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: -169.41148,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: -19.08323,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: 58.87927,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: -134.34782,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: 153.15997,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: -37.933628,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: -90.79761,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: 44.579124,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: -2.2399259,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: -178.32115,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: -148.47302,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: 12.806246,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: 82.401955,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: 24.292171,
            s: 0.6,
            v: 1.0,
        },
        TeamColor {
            h: 170.61838,
            s: 1.0,
            v: 1.0,
        },
        TeamColor {
            h: -159.7051,
            s: 0.6,
            v: 1.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();

        assert_eq!(config.slot(), &SlotBackend::File(PathBuf::from("data")));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.timer_tick(), Duration::from_secs(1));
        assert_eq!(config.viewer(), ViewerSize::default());
        assert!(config.catalog_dir().is_none());
        assert_eq!(config.colors.len(), default_colors().len());
    }

    #[test]
    fn parses_every_section() {
        let config = AppConfig::from_json(
            r#"{
                "colors": [{ "hue": 10.0, "saturation": 1.0, "value": 0.5 }],
                "catalog_dir": "catalog",
                "slot": { "backend": "memory" },
                "poll_interval_ms": 250,
                "timer_tick_ms": 0,
                "viewer": { "width": 1920, "height": 1080 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.slot(), &SlotBackend::Memory);
        assert_eq!(config.catalog_dir(), Some(Path::new("catalog")));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.timer_tick(), Duration::from_secs(1));
        assert_eq!(config.viewer().width, 1920);
        assert_eq!(config.colors, vec![TeamColor { h: 10.0, s: 1.0, v: 0.5 }]);
    }

    #[test]
    fn first_unused_color_skips_taken_entries() {
        let config = AppConfig::default();
        let first = config.first_unused_color(&[]);
        let second = config.first_unused_color(&[first]);

        assert_ne!(first, second);
        assert_eq!(second, default_colors()[1]);

        let everything = default_colors();
        assert_eq!(config.first_unused_color(&everything), DEFAULT_COLOR);
    }

    #[test]
    fn file_slot_directory_can_be_overridden() {
        let config =
            AppConfig::from_json(r#"{ "slot": { "backend": "file", "dir": "/tmp/quiz" } }"#)
                .unwrap();
        assert_eq!(config.slot(), &SlotBackend::File(PathBuf::from("/tmp/quiz")));
        assert_eq!(config.with_memory_slot().slot(), &SlotBackend::Memory);
    }
}
