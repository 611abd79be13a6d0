//! Navigator configuration.
//!
//! Every field has a default tuned for an 800×480 landscape display, so an
//! empty (or missing) file yields a usable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::sys::geometry::Size;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub screen: ScreenSettings,
    pub layout: LayoutSettings,
    pub animation: AnimationSettings,
    pub snapshots: SnapshotSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSettings {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenSettings {
    fn default() -> Self { Self { width: 800.0, height: 480.0 } }
}

impl ScreenSettings {
    pub fn size(&self) -> Size { Size::new(self.width, self.height) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

/// Geometry of the thumbnail and notification grids.
///
/// Cell sizes include the title bar; the clip container gets whatever is
/// left below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Cell used when a single thumbnail is shown.
    pub single: CellSize,
    /// Cell used for two thumbnails.
    pub pair: CellSize,
    /// Cell used for three or four thumbnails.
    pub quad: CellSize,
    /// Cell used for five or more thumbnails.
    pub many: CellSize,
    pub title_height: f64,
    /// Column gap for up to four thumbnails.
    pub small_column_gap: f64,
    /// Row gap for up to four thumbnails, and the upper bound of the row
    /// gap beyond that.
    pub small_row_gap: f64,
    /// Minimum left/right margin for five or more thumbnails.
    pub side_margin: f64,
    /// Smallest top margin left when the grid is vertically centred.
    pub top_margin: f64,
    pub note_width: f64,
    pub note_height: f64,
    /// Distance of the left notification column from the screen edge.
    pub note_margin: f64,
    /// Space between the bottom of the thumbnail grid and the first
    /// notification row.
    pub note_gap: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            single: CellSize::new(472.0, 300.0),
            pair: CellSize::new(384.0, 248.0),
            quad: CellSize::new(296.0, 196.0),
            many: CellSize::new(232.0, 128.0),
            title_height: 32.0,
            small_column_gap: 16.0,
            small_row_gap: 8.0,
            side_margin: 16.0,
            top_margin: 8.0,
            note_width: 392.0,
            note_height: 64.0,
            note_margin: 8.0,
            note_gap: 8.0,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// When disabled every effect jumps to its end state.
    pub enabled: bool,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub fly_duration: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub zoom_duration: Duration,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fly_duration: Duration::from_millis(250),
            zoom_duration: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Directory holding `<class_id>.png` last-frame images.
    pub dir: Option<PathBuf>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tasknav").join("config.toml"))
    }

    /// Loads the config at the default location, or the defaults if there is
    /// no such file.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let screen = &self.screen;
        if !(screen.width > 0.0 && screen.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "screen size must be positive, got {}x{}",
                screen.width, screen.height
            )));
        }

        let layout = &self.layout;
        let classes = [
            ("single", layout.single, 1.0, 0.0),
            ("pair", layout.pair, 2.0, layout.small_column_gap),
            ("quad", layout.quad, 2.0, layout.small_column_gap),
            ("many", layout.many, 3.0, 0.0),
        ];
        for (name, cell, columns, gap) in classes {
            if !(cell.width > 0.0 && cell.height > layout.title_height) {
                return Err(ConfigError::Invalid(format!(
                    "{name} cell {}x{} leaves no room below the {} px title",
                    cell.width, cell.height, layout.title_height
                )));
            }
            let row_width = columns * cell.width + (columns - 1.0) * gap;
            if row_width > screen.width {
                return Err(ConfigError::Invalid(format!(
                    "{name} row is {row_width} px wide, the screen only {}",
                    screen.width
                )));
            }
        }
        if 3.0 * layout.many.width + 2.0 * layout.side_margin > screen.width {
            return Err(ConfigError::Invalid(
                "three 'many' cells do not fit between the side margins".into(),
            ));
        }

        if !(layout.note_width > 0.0 && layout.note_height > 0.0) {
            return Err(ConfigError::Invalid("notification cards must not be empty".into()));
        }
        if layout.note_margin + 2.0 * layout.note_width > screen.width {
            return Err(ConfigError::Invalid(
                "two notification columns do not fit on screen".into(),
            ));
        }

        Ok(())
    }
}
