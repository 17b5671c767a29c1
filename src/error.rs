use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the library. Episode termination is not an error and
/// is reported through [`crate::game::StepOutcome`] instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no free cell found after {attempts} placement attempts")]
    PlacementExhausted { attempts: usize },

    #[error("every cell of the {cells}-cell board is occupied")]
    BoardFull { cells: usize },

    #[error("failed to access q-table at {path:?}")]
    QTableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed q-table")]
    QTableFormat(#[from] serde_json::Error),

    #[error("failed to read config from {path:?}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path:?}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
