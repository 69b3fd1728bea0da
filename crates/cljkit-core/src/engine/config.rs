use crate::core::forcefield::params::{CljConfig, CombiningRule, ParamError};
use crate::core::forcefield::switching::SwitchingFunction;
use crate::core::models::ids::GroupId;
use crate::core::models::space::Space;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error(transparent)]
    Params(#[from] ParamError),
}

#[derive(Debug, Default, Clone)]
pub struct CljConfigBuilder {
    coulomb_cutoff: Option<f64>,
    lj_cutoff: Option<f64>,
    space: Option<Space>,
    switching: Option<SwitchingFunction>,
    shift_electrostatics: Option<bool>,
    combining_rule: Option<CombiningRule>,
}

impl CljConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Coulomb and LJ cutoffs to the same value.
    pub fn cutoff(self, cutoff: f64) -> Self {
        self.coulomb_cutoff(cutoff).lj_cutoff(cutoff)
    }
    pub fn coulomb_cutoff(mut self, cutoff: f64) -> Self {
        self.coulomb_cutoff = Some(cutoff);
        self
    }
    pub fn lj_cutoff(mut self, cutoff: f64) -> Self {
        self.lj_cutoff = Some(cutoff);
        self
    }
    pub fn space(mut self, space: Space) -> Self {
        self.space = Some(space);
        self
    }
    pub fn switching(mut self, switching: SwitchingFunction) -> Self {
        self.switching = Some(switching);
        self
    }
    pub fn shift_electrostatics(mut self, enabled: bool) -> Self {
        self.shift_electrostatics = Some(enabled);
        self
    }
    pub fn combining_rule(mut self, rule: CombiningRule) -> Self {
        self.combining_rule = Some(rule);
        self
    }

    pub fn build(self) -> Result<CljConfig, ConfigError> {
        let config = CljConfig {
            coulomb_cutoff: self
                .coulomb_cutoff
                .ok_or(ConfigError::MissingParameter("coulomb_cutoff"))?,
            lj_cutoff: self
                .lj_cutoff
                .ok_or(ConfigError::MissingParameter("lj_cutoff"))?,
            space: self.space.unwrap_or_default(),
            switching: self.switching.unwrap_or_default(),
            shift_electrostatics: self.shift_electrostatics.unwrap_or(false),
            combining_rule: self.combining_rule.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Metropolis Monte Carlo parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub steps: u64,
    /// Temperature in Kelvin.
    pub temperature: f64,
    /// Largest displacement per axis of a translation move, in Angstroms.
    pub max_translation: f64,
    /// Largest rotation angle of a rotation move, in degrees.
    pub max_rotation: f64,
    pub seed: u64,
    /// Steps between full recomputes of the running energy. Zero disables the check.
    pub check_interval: u64,
    /// Drift (kcal/mol) above which a warning is logged.
    pub drift_tolerance: f64,
    /// Groups eligible for moves. `None` moves every group in the index.
    pub groups: Option<Vec<GroupId>>,
}

#[derive(Debug, Default, Clone)]
pub struct SamplingConfigBuilder {
    steps: Option<u64>,
    temperature: Option<f64>,
    max_translation: Option<f64>,
    max_rotation: Option<f64>,
    seed: Option<u64>,
    check_interval: Option<u64>,
    drift_tolerance: Option<f64>,
    groups: Option<Vec<GroupId>>,
}

impl SamplingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn max_translation(mut self, angstroms: f64) -> Self {
        self.max_translation = Some(angstroms);
        self
    }
    pub fn max_rotation(mut self, degrees: f64) -> Self {
        self.max_rotation = Some(degrees);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn check_interval(mut self, steps: u64) -> Self {
        self.check_interval = Some(steps);
        self
    }
    pub fn drift_tolerance(mut self, kcal_per_mol: f64) -> Self {
        self.drift_tolerance = Some(kcal_per_mol);
        self
    }
    pub fn groups(mut self, groups: Vec<GroupId>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn build(self) -> Result<SamplingConfig, ConfigError> {
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("must be positive, got {temperature}"),
            });
        }
        let max_translation = self.max_translation.unwrap_or(0.5);
        let max_rotation = self.max_rotation.unwrap_or(10.0);
        for (name, value) in [
            ("max_translation", max_translation),
            ("max_rotation", max_rotation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }
        Ok(SamplingConfig {
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            temperature,
            max_translation,
            max_rotation,
            seed: self.seed.unwrap_or(0),
            check_interval: self.check_interval.unwrap_or(1000),
            drift_tolerance: self.drift_tolerance.unwrap_or(1e-6),
            groups: self.groups,
        })
    }
}
