use cljkit::engine::error::EngineError;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Energy engine error: {0}")]
    Core(#[from] EngineError),

    #[error("Invalid system configuration: {0}")]
    Config(String),

    #[error("Malformed system file '{path}': {source}", path = path.display())]
    SystemFile {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Atom or bond table '{path}': {source}", path = path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Cannot open log file '{path}': {source}", path = path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Wraps failures while reading or writing the table at `path`.
    pub fn table(path: &Path) -> impl Fn(anyhow::Error) -> Self + '_ {
        move |source| Self::Table {
            path: path.to_path_buf(),
            source,
        }
    }
}
