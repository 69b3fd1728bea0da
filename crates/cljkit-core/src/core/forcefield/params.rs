use super::switching::SwitchingFunction;
use crate::core::models::space::{Space, SpaceError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("The {name} cutoff must be positive and finite, got {value}")]
    InvalidCutoff { name: &'static str, value: f64 },
    #[error("The {name} feather width must lie in [0, {cutoff}], got {value}")]
    InvalidFeather {
        name: &'static str,
        value: f64,
        cutoff: f64,
    },
    #[error("Invalid space: {0}")]
    Space(#[from] SpaceError),
}

/// How the per-atom LJ parameters of a pair are mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombiningRule {
    /// `sigma = sqrt(sigma_i * sigma_j)`, `epsilon = sqrt(epsilon_i * epsilon_j)`.
    #[default]
    Geometric,
    /// `sigma = (sigma_i + sigma_j) / 2`, `epsilon = sqrt(epsilon_i * epsilon_j)`.
    LorentzBerthelot,
}

impl FromStr for CombiningRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geometric" => Ok(Self::Geometric),
            "lorentz-berthelot" | "arithmetic" => Ok(Self::LorentzBerthelot),
            other => Err(format!("unknown combining rule '{other}'")),
        }
    }
}

/// Immutable cutoff-function parameters, shared read-only by every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CljConfig {
    /// Coulomb cutoff in Angstroms.
    pub coulomb_cutoff: f64,
    /// Lennard-Jones cutoff in Angstroms.
    pub lj_cutoff: f64,
    #[serde(default)]
    pub space: Space,
    #[serde(default)]
    pub switching: SwitchingFunction,
    /// Replaces Coulomb switching with force-shifted electrostatics.
    #[serde(default)]
    pub shift_electrostatics: bool,
    #[serde(default)]
    pub combining_rule: CombiningRule,
}

impl CljConfig {
    pub fn new(coulomb_cutoff: f64, lj_cutoff: f64, space: Space) -> Self {
        Self {
            coulomb_cutoff,
            lj_cutoff,
            space,
            switching: SwitchingFunction::default(),
            shift_electrostatics: false,
            combining_rule: CombiningRule::Geometric,
        }
    }

    #[inline]
    pub fn max_cutoff(&self) -> f64 {
        self.coulomb_cutoff.max(self.lj_cutoff)
    }

    /// Checks cutoffs, feather widths and the periodic box against each other.
    pub fn validate(&self) -> Result<(), ParamError> {
        for (name, value) in [("Coulomb", self.coulomb_cutoff), ("LJ", self.lj_cutoff)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamError::InvalidCutoff { name, value });
            }
        }
        if let Some((coulomb_feather, lj_feather)) = self.switching.feathers() {
            for (name, value, cutoff) in [
                ("Coulomb", coulomb_feather, self.coulomb_cutoff),
                ("LJ", lj_feather, self.lj_cutoff),
            ] {
                if !value.is_finite() || value < 0.0 || value > cutoff {
                    return Err(ParamError::InvalidFeather {
                        name,
                        value,
                        cutoff,
                    });
                }
            }
        }
        self.space.validate(self.max_cutoff())?;
        Ok(())
    }
}
