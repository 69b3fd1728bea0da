use super::grid::{GridError, GridFunction, GridSpec};
use super::params::{CljConfig, ParamError};
use super::potentials::{self, MIN_PAIR_DISTANCE};
use super::switching::SwitchWindow;
use super::term::CljEnergy;
use crate::core::models::atom::AtomRecord;
use crate::core::models::connectivity::{ExclusionTable, PairScale};
use crate::core::models::ids::GroupId;
use crate::core::models::space::Space;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::sync::Arc;

/// Coulomb + LJ pair evaluation under one [`CljConfig`].
///
/// The kernel knows nothing about groups; the [`CljFunction`] variants decide which pairs
/// it sees and with what [`PairScale`].
#[derive(Debug, Clone, PartialEq)]
pub struct PairKernel {
    config: CljConfig,
    coulomb_cutoff2: f64,
    lj_cutoff2: f64,
    max_cutoff2: f64,
    coulomb_window: SwitchWindow,
    lj_window: SwitchWindow,
}

impl PairKernel {
    pub fn new(config: CljConfig) -> Result<Self, ParamError> {
        config.validate()?;
        Ok(Self {
            coulomb_cutoff2: config.coulomb_cutoff * config.coulomb_cutoff,
            lj_cutoff2: config.lj_cutoff * config.lj_cutoff,
            max_cutoff2: config.max_cutoff() * config.max_cutoff(),
            coulomb_window: config.switching.coulomb_window(config.coulomb_cutoff),
            lj_window: config.switching.lj_window(config.lj_cutoff),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &CljConfig {
        &self.config
    }

    #[inline]
    pub fn space(&self) -> &Space {
        &self.config.space
    }

    /// Energy of one pair. Dummies and pairs at or beyond both cutoffs give zero.
    #[inline]
    pub fn pair_energy(&self, a: &AtomRecord, b: &AtomRecord, scale: PairScale) -> CljEnergy {
        if a.is_dummy() || b.is_dummy() {
            return CljEnergy::ZERO;
        }
        let r2 = self.config.space.distance_squared(a.position(), b.position());
        if r2 >= self.max_cutoff2 {
            return CljEnergy::ZERO;
        }
        self.evaluate(r2, a, b, scale).0
    }

    /// `-dE/dr` of one pair; positive values push the atoms apart.
    #[inline]
    pub fn pair_force(&self, a: &AtomRecord, b: &AtomRecord, scale: PairScale) -> f64 {
        if a.is_dummy() || b.is_dummy() {
            return 0.0;
        }
        let r2 = self.config.space.distance_squared(a.position(), b.position());
        if r2 >= self.max_cutoff2 {
            return 0.0;
        }
        self.evaluate(r2, a, b, scale).1
    }

    /// Force on `b` exerted by `a`, along the minimum-image separation.
    pub fn pair_force_vector(&self, a: &AtomRecord, b: &AtomRecord, scale: PairScale) -> Vector3<f64> {
        let magnitude = self.pair_force(a, b, scale);
        if magnitude == 0.0 {
            return Vector3::zeros();
        }
        let separation = self.config.space.minimum_image(b.position() - a.position());
        let r = separation.norm().max(MIN_PAIR_DISTANCE);
        separation * (magnitude / r)
    }

    /// Coulomb potential per unit charge at `point` due to `source`, with the same cutoff
    /// and switching as the pair energy.
    pub fn coulomb_potential(&self, point: &Point3<f64>, source: &AtomRecord) -> f64 {
        if source.charge() == 0.0 {
            return 0.0;
        }
        let r2 = self.config.space.distance_squared(point, source.position());
        if r2 >= self.coulomb_cutoff2 {
            return 0.0;
        }
        let r = r2.sqrt().max(MIN_PAIR_DISTANCE);
        self.coulomb_term(r, r2, source.charge()).0
    }

    fn evaluate(&self, r2: f64, a: &AtomRecord, b: &AtomRecord, scale: PairScale) -> (CljEnergy, f64) {
        let r = r2.sqrt().max(MIN_PAIR_DISTANCE);
        let mut energy = CljEnergy::ZERO;
        let mut force = 0.0;

        if r2 < self.coulomb_cutoff2 && scale.coulomb != 0.0 {
            let q1q2 = a.charge() * b.charge();
            if q1q2 != 0.0 {
                let (e, f) = self.coulomb_term(r, r2, q1q2);
                energy.coulomb = e * scale.coulomb;
                force += f * scale.coulomb;
            }
        }

        if r2 < self.lj_cutoff2 && scale.lj != 0.0 {
            if let (Some(pa), Some(pb)) = (a.lj().as_sigma_epsilon(), b.lj().as_sigma_epsilon()) {
                let (sigma, epsilon) = potentials::combine(self.config.combining_rule, pa, pb);
                let e0 = potentials::lennard_jones_12_6(r, sigma, epsilon);
                let f0 = potentials::lennard_jones_12_6_force(r, sigma, epsilon);
                let (s, ds) = self.lj_window.scale(r, r2);
                energy.lj = e0 * s * scale.lj;
                force += (f0 * s - e0 * ds) * scale.lj;
            }
        }

        (energy, force)
    }

    #[inline]
    fn coulomb_term(&self, r: f64, r2: f64, q1q2: f64) -> (f64, f64) {
        if self.config.shift_electrostatics {
            let rc = self.config.coulomb_cutoff;
            (
                potentials::coulomb_force_shifted(r, q1q2, rc),
                potentials::coulomb_force_shifted_force(r, q1q2, rc),
            )
        } else {
            let e0 = potentials::coulomb(r, q1q2);
            let f0 = potentials::coulomb_force(r, q1q2);
            let (s, ds) = self.coulomb_window.scale(r, r2);
            (e0 * s, f0 * s - e0 * ds)
        }
    }
}

/// Which flavor of cutoff function to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Shift,
    IntraShift,
    Grid,
}

impl FunctionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shift => "shift",
            Self::IntraShift => "intra-shift",
            Self::Grid => "grid",
        }
    }
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A cutoff Coulomb/LJ energy function.
///
/// Every variant evaluates the same physical kernel; they differ in which pairs count.
/// Pairs are always visited in ascending index order, so repeated evaluations of the same
/// input are bit-identical.
#[derive(Debug, Clone)]
pub enum CljFunction {
    /// Pairs between atoms of different groups.
    Shift { kernel: PairKernel },
    /// Pairs between atoms of the same group, scaled by that group's exclusion table.
    IntraShift {
        kernel: PairKernel,
        exclusions: HashMap<GroupId, Arc<ExclusionTable>>,
    },
    /// Each atom in the field of a fixed set of atoms.
    Grid(GridFunction),
}

impl CljFunction {
    pub fn shift(config: CljConfig) -> Result<Self, ParamError> {
        Ok(Self::Shift {
            kernel: PairKernel::new(config)?,
        })
    }

    /// Groups without an entry in `exclusions` interact at full strength.
    pub fn intra_shift(
        config: CljConfig,
        exclusions: HashMap<GroupId, Arc<ExclusionTable>>,
    ) -> Result<Self, ParamError> {
        Ok(Self::IntraShift {
            kernel: PairKernel::new(config)?,
            exclusions,
        })
    }

    pub fn grid(config: CljConfig, fixed: &[AtomRecord], spec: GridSpec) -> Result<Self, GridError> {
        Ok(Self::Grid(GridFunction::build(config, fixed, spec)?))
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            Self::Shift { .. } => FunctionKind::Shift,
            Self::IntraShift { .. } => FunctionKind::IntraShift,
            Self::Grid(_) => FunctionKind::Grid,
        }
    }

    pub fn kernel(&self) -> &PairKernel {
        match self {
            Self::Shift { kernel } | Self::IntraShift { kernel, .. } => kernel,
            Self::Grid(grid) => grid.kernel(),
        }
    }

    #[inline]
    pub fn config(&self) -> &CljConfig {
        self.kernel().config()
    }

    /// Scale for a pair this function counts, or `None` when it ignores the pair.
    #[inline]
    fn pair_scale(&self, a: &AtomRecord, b: &AtomRecord) -> Option<PairScale> {
        match self {
            Self::Shift { .. } => (a.group() != b.group()).then_some(PairScale::FULL),
            Self::IntraShift { exclusions, .. } => {
                if a.group() != b.group() {
                    return None;
                }
                let scale = exclusions
                    .get(&a.group())
                    .map_or(PairScale::FULL, |table| table.scale(a.index(), b.index()));
                (!scale.is_excluded()).then_some(scale)
            }
            Self::Grid(_) => None,
        }
    }

    /// Energy of one pair as counted by this function.
    pub fn pair_energy(&self, a: &AtomRecord, b: &AtomRecord) -> CljEnergy {
        match self.pair_scale(a, b) {
            Some(scale) => self.kernel().pair_energy(a, b, scale),
            None => CljEnergy::ZERO,
        }
    }

    /// `-dE/dr` of one pair as counted by this function.
    pub fn pair_force(&self, a: &AtomRecord, b: &AtomRecord) -> f64 {
        match self.pair_scale(a, b) {
            Some(scale) => self.kernel().pair_force(a, b, scale),
            None => 0.0,
        }
    }

    /// Energy of a set of atoms with itself.
    ///
    /// For the grid variant this is the energy of each atom in the fixed field.
    pub fn calculate(&self, atoms: &[AtomRecord]) -> CljEnergy {
        if let Self::Grid(grid) = self {
            return grid.calculate(atoms);
        }
        atoms
            .iter()
            .tuple_combinations()
            .map(|(a, b)| self.pair_energy(a, b))
            .sum()
    }

    /// Energy between two disjoint sets of atoms. The grid variant has no mobile-mobile
    /// term and always returns zero.
    pub fn calculate_pair(&self, left: &[AtomRecord], right: &[AtomRecord]) -> CljEnergy {
        if matches!(self, Self::Grid(_)) {
            return CljEnergy::ZERO;
        }
        left.iter()
            .cartesian_product(right)
            .map(|(a, b)| self.pair_energy(a, b))
            .sum()
    }

    /// Per-atom force vectors (kcal/(mol·Å)) for `atoms` interacting with themselves.
    pub fn forces(&self, atoms: &[AtomRecord]) -> Vec<Vector3<f64>> {
        if let Self::Grid(grid) = self {
            return grid.forces(atoms);
        }
        let mut forces = vec![Vector3::zeros(); atoms.len()];
        for i in 0..atoms.len() {
            for j in i + 1..atoms.len() {
                let Some(scale) = self.pair_scale(&atoms[i], &atoms[j]) else {
                    continue;
                };
                let on_j = self.kernel().pair_force_vector(&atoms[i], &atoms[j], scale);
                forces[j] += on_j;
                forces[i] -= on_j;
            }
        }
        forces
    }
}
