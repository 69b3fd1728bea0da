use crate::error::{CliError, Result};
use cljkit::core::forcefield::params::CombiningRule;
use cljkit::core::forcefield::switching::SwitchingFunction;
use cljkit::core::models::space::Space;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The system file as written by the user. Every field is optional so that command-line
/// values and defaults can fill the gaps.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub atoms: Option<PathBuf>,
    pub bonds: Option<PathBuf>,
    pub function: Option<FileFunctionConfig>,
    pub exclusions: Option<FileExclusionsConfig>,
    pub grid: Option<FileGridConfig>,
    pub sampling: Option<FileSamplingConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFunctionConfig {
    pub coulomb_cutoff: Option<f64>,
    pub lj_cutoff: Option<f64>,
    pub space: Option<Space>,
    pub switching: Option<SwitchingFunction>,
    pub shift_electrostatics: Option<bool>,
    pub combining_rule: Option<CombiningRule>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileExclusionsConfig {
    pub scale_14_coulomb: Option<f64>,
    pub scale_14_lj: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileGridConfig {
    pub fixed_groups: Option<Vec<u32>>,
    pub region_min: Option<[f64; 3]>,
    pub region_max: Option<[f64; 3]>,
    pub spacing: Option<f64>,
    pub buffer: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSamplingConfig {
    pub steps: Option<u64>,
    pub temperature: Option<f64>,
    pub max_translation: Option<f64>,
    pub max_rotation: Option<f64>,
    pub seed: Option<u64>,
    pub check_interval: Option<u64>,
    pub drift_tolerance: Option<f64>,
    pub groups: Option<Vec<u32>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading system file from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|source| CliError::SystemFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, anyhow::Error> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_system_file_is_parsed() {
        let toml = r#"
            atoms = "atoms.csv"
            bonds = "bonds.csv"

            [function]
            coulomb-cutoff = 12.0
            lj-cutoff = 10.0
            shift-electrostatics = true
            combining-rule = "lorentz-berthelot"

            [function.space]
            kind = "periodic"
            dimensions = [30.0, 30.0, 30.0]

            [function.switching]
            kind = "charmm"
            coulomb-feather = 1.0
            lj-feather = 0.5

            [exclusions]
            scale-14-coulomb = 0.8333
            scale-14-lj = 0.5

            [grid]
            fixed-groups = [0]
            region-min = [0.0, 0.0, 0.0]
            region-max = [10.0, 10.0, 10.0]
            buffer = 12.0

            [sampling]
            steps = 500
            temperature = 298.15
            groups = [1, 2]
        "#;
        let config = FileConfig::from_toml(toml).unwrap();

        assert_eq!(config.atoms, Some(PathBuf::from("atoms.csv")));
        let function = config.function.unwrap();
        assert_eq!(function.coulomb_cutoff, Some(12.0));
        assert_eq!(function.space, Some(Space::periodic(30.0, 30.0, 30.0)));
        assert_eq!(
            function.switching,
            Some(SwitchingFunction::Charmm {
                coulomb_feather: 1.0,
                lj_feather: 0.5
            })
        );
        assert_eq!(function.combining_rule, Some(CombiningRule::LorentzBerthelot));
        assert_eq!(config.exclusions.unwrap().scale_14_lj, Some(0.5));
        assert_eq!(config.grid.unwrap().fixed_groups, Some(vec![0]));
        assert_eq!(config.sampling.unwrap().groups, Some(vec![1, 2]));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
            atoms = "atoms.csv"
            [function]
            cutof = 10.0
        "#;
        assert!(FileConfig::from_toml(toml).is_err());
    }

    #[test]
    fn from_file_reports_the_path_on_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system.toml");
        fs::write(&path, "atoms = [").unwrap();

        match FileConfig::from_file(&path) {
            Err(CliError::SystemFile { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a parsing error, got {other:?}"),
        }
    }
}
