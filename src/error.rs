use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::grid::Position;

/// Failures raised by the simulation core.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum SimulationError {
    /// Every cell of the board is occupied, so the apple has nowhere to go.
    #[error("no free cell left for the apple on a {width}x{height} grid")]
    NoFreeCell { width: u16, height: u16 },

    #[error("a snake needs at least one segment")]
    EmptyBody,

    #[error("grid dimensions must be at least 1x1, got {width}x{height}")]
    InvalidGrid { width: u16, height: u16 },

    /// A supplied position is off the board or collides with the snake.
    #[error("position ({}, {}) is not a valid placement", .0.x, .0.y)]
    InvalidPlacement(Position),
}

/// Failures while loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
