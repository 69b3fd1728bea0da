use thiserror::Error;

use super::config::ConfigError;
use crate::core::forcefield::grid::GridError;
use crate::core::forcefield::params::ParamError;
use crate::core::models::atom::AtomBuildError;
use crate::core::models::connectivity::ConnectivityError;
use crate::core::models::ids::{AtomToken, GroupId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Malformed input: {source}")]
    MalformedInput {
        #[from]
        source: AtomBuildError,
    },

    #[error("Box index is stale; rebuild it before querying")]
    StaleIndex,

    #[error("Token {0:?} does not refer to an atom in the index")]
    InvalidToken(AtomToken),

    #[error("{0} is already present in the index")]
    DuplicateGroup(GroupId),

    #[error("{0} is not present in the index")]
    UnknownGroup(GroupId),

    #[error(
        "Delta for {group} was evaluated at generation {delta_generation}, but the index is at generation {current_generation}"
    )]
    StaleDelta {
        group: GroupId,
        delta_generation: u64,
        current_generation: u64,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Grid construction failed: {source}")]
    Grid {
        #[from]
        source: GridError,
    },

    #[error("Invalid connectivity: {source}")]
    Connectivity {
        #[from]
        source: ConnectivityError,
    },

    #[error("Workflow phase '{phase}' failed: {reason}")]
    Workflow { phase: &'static str, reason: String },
}

impl From<ParamError> for EngineError {
    fn from(source: ParamError) -> Self {
        Self::Config {
            source: source.into(),
        }
    }
}
