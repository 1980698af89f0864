use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::GridSize;

const APP_DIR_NAME: &str = "toroidal-snake";
const CONFIG_FILE_NAME: &str = "config.json";

/// Default window width in pixels the grid is derived from.
pub const DEFAULT_WINDOW_WIDTH: u32 = 800;

/// Default window height in pixels the grid is derived from.
pub const DEFAULT_WINDOW_HEIGHT: u32 = 600;

/// Default cell edge length in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 20;

pub const DEFAULT_GRID_WIDTH: u16 = (DEFAULT_WINDOW_WIDTH / DEFAULT_CELL_SIZE) as u16;
pub const DEFAULT_GRID_HEIGHT: u16 = (DEFAULT_WINDOW_HEIGHT / DEFAULT_CELL_SIZE) as u16;

/// Default simulation rate in ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 10;

/// Construction parameters for a simulation and its driver.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridSize,
    /// Ticks per second; only the driver loop reads this.
    pub tick_rate: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridSize {
                width: DEFAULT_GRID_WIDTH,
                height: DEFAULT_GRID_HEIGHT,
            },
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

impl SimulationConfig {
    /// Derives the grid from a window size and a cell size, both in pixels.
    pub fn from_window(
        window_width: u32,
        window_height: u32,
        cell_size: u32,
    ) -> Result<Self, ConfigError> {
        if cell_size == 0 {
            return Err(ConfigError::Invalid("cell size must be positive".to_owned()));
        }

        let axis = |pixels: u32, name: &str| {
            u16::try_from(pixels / cell_size).map_err(|_| {
                ConfigError::Invalid(format!("{name} of {pixels}px yields too many cells"))
            })
        };

        let config = Self {
            grid: GridSize {
                width: axis(window_width, "window width")?,
                height: axis(window_height, "window height")?,
            },
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the grid is at least 1x1 and the tick rate is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid(
                "tick rate must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Time between two ticks at the configured rate.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    /// Loads settings from the platform config directory.
    ///
    /// Returns defaults when the file does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&config_path())
    }

    /// Loads settings from `path`, falling back to defaults when it is missing.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Returns the platform-correct settings file path.
#[must_use]
pub fn config_path() -> PathBuf {
    let mut base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push(APP_DIR_NAME);
    base.push(CONFIG_FILE_NAME);
    base
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use crate::error::ConfigError;
    use crate::grid::GridSize;

    use super::{DEFAULT_TICK_RATE, SimulationConfig};

    #[test]
    fn defaults_match_an_800_by_600_window_of_20px_cells() {
        let config = SimulationConfig::default();

        assert_eq!(config.grid, GridSize::new(40, 30));
        assert_eq!(config.tick_rate, DEFAULT_TICK_RATE);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(
            SimulationConfig::from_window(800, 600, 20).expect("valid window"),
            config
        );
    }

    #[test]
    fn tiny_window_is_rejected() {
        assert!(matches!(
            SimulationConfig::from_window(10, 600, 20),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SimulationConfig::from_window(800, 600, 0),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_tick_rate_is_invalid() {
        let config = SimulationConfig {
            tick_rate: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let path = unique_test_path("missing");
        let loaded = SimulationConfig::load_from_path(&path).expect("missing file is not an error");
        assert_eq!(loaded, SimulationConfig::default());
    }

    #[test]
    fn partial_config_file_keeps_defaults_for_other_fields() {
        let path = unique_test_path("partial");
        write_test_file(&path, r#"{ "tick_rate": 25 }"#);

        let loaded = SimulationConfig::load_from_path(&path).expect("partial file should load");

        assert_eq!(loaded.tick_rate, 25);
        assert_eq!(loaded.grid, SimulationConfig::default().grid);
        cleanup_test_path(&path);
    }

    #[test]
    fn malformed_config_file_returns_error() {
        let path = unique_test_path("malformed");
        write_test_file(&path, "not-json");

        assert!(matches!(
            SimulationConfig::load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        cleanup_test_path(&path);
    }

    #[test]
    fn zero_sized_grid_in_file_is_rejected() {
        let path = unique_test_path("zero-grid");
        write_test_file(&path, r#"{ "grid": { "width": 0, "height": 5 } }"#);

        assert!(matches!(
            SimulationConfig::load_from_path(&path),
            Err(ConfigError::Invalid(_))
        ));
        cleanup_test_path(&path);
    }

    fn write_test_file(path: &PathBuf, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("test parent directory should be creatable");
        }
        fs::write(path, contents).expect("test file write should succeed");
    }

    fn unique_test_path(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();

        std::env::temp_dir()
            .join("toroidal-snake-config-tests")
            .join(format!("{label}-{nanos}.json"))
    }

    fn cleanup_test_path(path: &PathBuf) {
        let _ = fs::remove_file(path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir(parent);
        }
    }
}
