//! Errors raised at the edges of the core (file and JSON loading).
//!
//! The simulation itself never fails: malformed content is a no-op on contact.

use thiserror::Error;

/// Error loading or validating a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("level I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid level size {width}x{height}")]
    InvalidSize { width: f32, height: f32 },
    #[error("object {index} at ({x}, {y}) lies outside the level bounds")]
    OutOfBounds { index: usize, x: f32, y: f32 },
}

/// Error loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error loading or saving a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("replay I/O error: {0}")]
    Io(#[from] std::io::Error),
}
