use super::function::PairKernel;
use super::params::{CljConfig, ParamError};
use super::term::CljEnergy;
use crate::core::models::atom::AtomRecord;
use crate::core::models::connectivity::PairScale;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const MAX_GRID_POINTS: usize = 64 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),
    #[error("Grid region must be finite with max > min on every axis")]
    EmptyRegion,
    #[error("Grid buffer ({buffer} Å) must be at least the LJ cutoff ({lj_cutoff} Å)")]
    BufferTooSmall { buffer: f64, lj_cutoff: f64 },
    #[error("Grid would need {points} points, more than the limit of {limit}")]
    TooManyPoints { points: usize, limit: usize },
    #[error(transparent)]
    Params(#[from] ParamError),
}

fn default_spacing() -> f64 {
    0.5
}

/// Placement and resolution of a potential grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GridSpec {
    pub region_min: Point3<f64>,
    pub region_max: Point3<f64>,
    /// Distance between grid points in Angstroms.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Fixed atoms closer than this to the region are evaluated explicitly.
    pub buffer: f64,
}

impl GridSpec {
    fn validate(&self, config: &CljConfig) -> Result<(), GridError> {
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(GridError::InvalidSpacing(self.spacing));
        }
        let finite = self
            .region_min
            .coords
            .iter()
            .chain(self.region_max.coords.iter())
            .all(|c| c.is_finite());
        let ordered = (0..3).all(|i| self.region_max[i] > self.region_min[i]);
        if !finite || !ordered {
            return Err(GridError::EmptyRegion);
        }
        if !self.buffer.is_finite() || self.buffer < config.lj_cutoff {
            return Err(GridError::BufferTooSmall {
                buffer: self.buffer,
                lj_cutoff: config.lj_cutoff,
            });
        }
        Ok(())
    }
}

/// Energy of atoms in the field of a fixed atom set.
///
/// Fixed atoms within `buffer` of the region are kept for explicit evaluation. The
/// Coulomb potential of every other fixed atom is tabulated on a regular grid and
/// interpolated trilinearly. Because `buffer >= lj_cutoff`, far atoms never have an LJ
/// term for a point inside the region. Atoms outside the region are evaluated explicitly
/// against all fixed atoms.
#[derive(Debug, Clone)]
pub struct GridFunction {
    kernel: PairKernel,
    spec: GridSpec,
    center: Point3<f64>,
    half_extent: Vector3<f64>,
    dims: [usize; 3],
    potential: Vec<f64>,
    near: Vec<AtomRecord>,
    fixed: Vec<AtomRecord>,
}

impl GridFunction {
    pub fn build(config: CljConfig, fixed: &[AtomRecord], spec: GridSpec) -> Result<Self, GridError> {
        let kernel = PairKernel::new(config)?;
        spec.validate(&config)?;

        let extent = spec.region_max - spec.region_min;
        // Counted in f64 so that huge regions saturate instead of overflowing.
        let per_axis = [0, 1, 2].map(|axis| (extent[axis] / spec.spacing).ceil() + 1.0);
        let total = per_axis.iter().product::<f64>();
        if !total.is_finite() || total > MAX_GRID_POINTS as f64 {
            return Err(GridError::TooManyPoints {
                points: total as usize,
                limit: MAX_GRID_POINTS,
            });
        }
        let dims = per_axis.map(|count| count as usize);
        let points = dims.iter().product::<usize>();

        let mut grid = Self {
            kernel,
            spec,
            center: spec.region_min + extent * 0.5,
            half_extent: extent * 0.5,
            dims,
            potential: Vec::new(),
            near: Vec::new(),
            fixed: fixed.iter().filter(|a| !a.is_dummy()).copied().collect(),
        };

        let (near, far): (Vec<AtomRecord>, Vec<AtomRecord>) = grid
            .fixed
            .iter()
            .partition(|atom| grid.distance_to_region(atom.position()) <= spec.buffer);
        let far: Vec<AtomRecord> = far.into_iter().filter(|a| a.charge() != 0.0).collect();

        info!(
            points,
            near = near.len(),
            far = far.len(),
            "Tabulating grid potential."
        );
        grid.potential = grid.tabulate(&far);
        grid.near = near;
        debug!(dims = ?grid.dims, "Grid potential ready.");
        Ok(grid)
    }

    #[inline]
    pub fn kernel(&self) -> &PairKernel {
        &self.kernel
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    /// Number of fixed atoms evaluated explicitly for atoms inside the region.
    pub fn near_count(&self) -> usize {
        self.near.len()
    }

    pub fn fixed_count(&self) -> usize {
        self.fixed.len()
    }

    pub fn calculate(&self, atoms: &[AtomRecord]) -> CljEnergy {
        atoms.iter().map(|atom| self.atom_energy(atom)).sum()
    }

    /// Forces from the fixed atoms, always evaluated explicitly.
    pub fn forces(&self, atoms: &[AtomRecord]) -> Vec<Vector3<f64>> {
        atoms
            .iter()
            .map(|atom| {
                self.fixed.iter().fold(Vector3::zeros(), |acc, source| {
                    acc + self.kernel.pair_force_vector(source, atom, PairScale::FULL)
                })
            })
            .collect()
    }

    fn atom_energy(&self, atom: &AtomRecord) -> CljEnergy {
        if atom.is_dummy() {
            return CljEnergy::ZERO;
        }
        match self.local_position(atom.position()) {
            Some(local) => {
                let mut energy = self.explicit_energy(atom, &self.near);
                if atom.charge() != 0.0 {
                    energy.coulomb += atom.charge() * self.interpolate(&local);
                }
                energy
            }
            None => self.explicit_energy(atom, &self.fixed),
        }
    }

    fn explicit_energy(&self, atom: &AtomRecord, sources: &[AtomRecord]) -> CljEnergy {
        sources
            .iter()
            .map(|source| self.kernel.pair_energy(atom, source, PairScale::FULL))
            .sum()
    }

    /// Image of `point` closest to the region center, if it lies inside the region.
    fn local_position(&self, point: &Point3<f64>) -> Option<Point3<f64>> {
        let offset = self.kernel.space().minimum_image(point - self.center);
        let inside = (0..3).all(|axis| offset[axis].abs() <= self.half_extent[axis]);
        inside.then(|| self.center + offset)
    }

    fn distance_to_region(&self, point: &Point3<f64>) -> f64 {
        let offset = self.kernel.space().minimum_image(point - self.center);
        let outside = Vector3::from_fn(|axis, _| (offset[axis].abs() - self.half_extent[axis]).max(0.0));
        outside.norm()
    }

    #[inline]
    fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    fn grid_point(&self, index: usize) -> Point3<f64> {
        let k = index % self.dims[2];
        let j = (index / self.dims[2]) % self.dims[1];
        let i = index / (self.dims[1] * self.dims[2]);
        self.spec.region_min + Vector3::new(i as f64, j as f64, k as f64) * self.spec.spacing
    }

    fn tabulate(&self, far: &[AtomRecord]) -> Vec<f64> {
        let n = self.dims.iter().product::<usize>();
        let potential_at = |index: usize| {
            let point = self.grid_point(index);
            far.iter()
                .map(|source| self.kernel.coulomb_potential(&point, source))
                .sum::<f64>()
        };

        #[cfg(not(feature = "parallel"))]
        let values = (0..n).map(potential_at).collect();

        #[cfg(feature = "parallel")]
        let values = (0..n).into_par_iter().map(potential_at).collect();

        values
    }

    fn interpolate(&self, local: &Point3<f64>) -> f64 {
        let scaled = (local - self.spec.region_min) / self.spec.spacing;
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for axis in 0..3 {
            let upper = (self.dims[axis] - 2) as f64;
            let cell = scaled[axis].floor().clamp(0.0, upper);
            base[axis] = cell as usize;
            frac[axis] = (scaled[axis] - cell).clamp(0.0, 1.0);
        }

        let mut value = 0.0;
        for corner in 0..8 {
            let (di, dj, dk) = ((corner >> 2) & 1, (corner >> 1) & 1, corner & 1);
            let weight = weight_of(frac[0], di) * weight_of(frac[1], dj) * weight_of(frac[2], dk);
            if weight != 0.0 {
                value += weight * self.potential[self.flat_index(base[0] + di, base[1] + dj, base[2] + dk)];
            }
        }
        value
    }
}

#[inline]
fn weight_of(fraction: f64, upper: usize) -> f64 {
    if upper == 1 { fraction } else { 1.0 - fraction }
}
