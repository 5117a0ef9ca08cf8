//! Configuration loading and parsing (`tailpane.toml`).
//!
//! Recognized sections:
//!
//! ```toml
//! [pane]
//! follow = true            # stick to bottom from startup
//!
//! [keys]                   # single chars or named keys (up, down, esc, ...)
//! scroll_up = "k"
//! scroll_down = "j"
//! follow = "S"
//! quit = "q"
//!
//! [sinks]
//! files = ["copy.log"]     # duplicate fed text into these files
//! ```
//!
//! Unknown fields are ignored so the format can grow without breaking older
//! binaries. A missing file yields defaults; a malformed file logs a warning
//! and yields defaults rather than aborting startup.

use std::{fs, path::PathBuf};

use anyhow::Result;
use core_events::{KeyCode, KeyMap, PaneAction};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct PaneSection {
    #[serde(default = "PaneSection::default_follow")]
    pub follow: bool,
}

impl Default for PaneSection {
    fn default() -> Self {
        Self {
            follow: Self::default_follow(),
        }
    }
}

impl PaneSection {
    const fn default_follow() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct KeysSection {
    pub scroll_up: Option<String>,
    pub scroll_down: Option<String>,
    pub follow: Option<String>,
    pub quit: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SinksSection {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub pane: PaneSection,
    #[serde(default)]
    pub keys: KeysSection,
    #[serde(default)]
    pub sinks: SinksSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file contents, kept for diagnostics.
    pub raw: Option<String>,
    pub file: ConfigFile,
}

/// Best-effort config path: a local `tailpane.toml` wins, then the platform
/// config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("tailpane.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tailpane").join("tailpane.toml");
    }
    PathBuf::from("tailpane.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
            }),
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        },
        Err(_) => Ok(Config::default()),
    }
}

impl Config {
    pub fn follow_on_start(&self) -> bool {
        self.file.pane.follow
    }

    pub fn sink_files(&self) -> &[PathBuf] {
        &self.file.sinks.files
    }

    /// Build the effective key map: defaults overlaid with the `[keys]`
    /// overrides. Unrecognized key names keep the default binding for that
    /// action and log a warning.
    pub fn key_map(&self) -> KeyMap {
        let mut map = KeyMap::default();
        let overrides = [
            (PaneAction::ScrollUp, self.file.keys.scroll_up.as_deref()),
            (PaneAction::ScrollDown, self.file.keys.scroll_down.as_deref()),
            (PaneAction::ToggleFollow, self.file.keys.follow.as_deref()),
            (PaneAction::Quit, self.file.keys.quit.as_deref()),
        ];
        for (action, name) in overrides {
            let Some(name) = name else { continue };
            match KeyCode::parse(name) {
                Some(code) => map.rebind(action, &[code]),
                None => {
                    warn!(target: "config", key = name, ?action, "unknown_key_name_keeping_default");
                }
            }
        }
        map
    }
}
