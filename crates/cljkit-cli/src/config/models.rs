use cljkit::core::forcefield::grid::GridSpec;
use cljkit::core::forcefield::params::CljConfig;
use cljkit::core::models::connectivity::PairScale;
use cljkit::core::models::ids::GroupId;
use std::path::PathBuf;

use super::file::FileSamplingConfig;

/// Groups whose atoms are frozen into a grid potential.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSetup {
    pub fixed_groups: Vec<GroupId>,
    pub spec: GridSpec,
}

/// Fully resolved system configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub atoms_path: PathBuf,
    pub bonds_path: Option<PathBuf>,
    pub clj: CljConfig,
    pub scale_14: PairScale,
    pub grid: Option<GridSetup>,
    /// Sampling values from the file, resolved later against the `sample` arguments.
    pub sampling: FileSamplingConfig,
}
