//! Driver errors

use std::io;
use std::path::PathBuf;

use cellguard_core::config::{ConfigError, ImageError};
use thiserror::Error;

/// Errors raised by the driver around the monitor
#[derive(Debug, Error)]
pub enum SimError {
    /// File could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// TOML config did not parse
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    /// Binary config image was rejected
    #[error("invalid config image: {0}")]
    Image(ImageError),
    /// Config was rejected by the monitor
    #[error("invalid monitor config: {0}")]
    Config(ConfigError),
    /// Packed cell word cannot hold the requested layout
    #[error("{cells} cells of {width} bits do not fit in a 64-bit word")]
    PackLayout { cells: usize, width: u8 },
    /// Stimulus supplied the wrong number of cells
    #[error("expected {expected} cell readings, got {actual}")]
    CellCount { expected: usize, actual: usize },
}

impl SimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ImageError> for SimError {
    fn from(e: ImageError) -> Self {
        SimError::Image(e)
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Config(e)
    }
}
