use super::ids::GroupId;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while converting raw per-atom data into records.
///
/// Every variant describes malformed input: the caller handed over arrays that cannot
/// describe a physical set of atoms. None of them are retried internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtomBuildError {
    #[error("Array length mismatch: '{field}' has {found} entries but {expected} were expected")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Atom {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
    #[error("Atom {index} has a non-finite partial charge")]
    NonFiniteCharge { index: usize },
    #[error("Atom {index} has an invalid Lennard-Jones parameter: {reason}")]
    InvalidLjParameter { index: usize, reason: &'static str },
}

/// Lennard-Jones parameters of a single atom.
///
/// Parameters may be given either as `sigma`/`epsilon` or in the `A/r^12 - B/r^6` form.
/// Records always store the normalized `SigmaEpsilon` form, or `None` when the atom does
/// not take part in LJ interactions at all.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "form")]
pub enum LjParameter {
    /// No LJ interaction. The atom is skipped by the LJ kernel rather than zeroed.
    #[default]
    None,
    /// Collision diameter `sigma` in Angstroms and well depth `epsilon` in kcal/mol.
    SigmaEpsilon { sigma: f64, epsilon: f64 },
    /// Repulsive `A` (kcal·Å¹²/mol) and dispersive `B` (kcal·Å⁶/mol) coefficients.
    #[serde(rename = "ab")]
    AB { a: f64, b: f64 },
}

impl LjParameter {
    pub fn sigma_epsilon(sigma: f64, epsilon: f64) -> Self {
        Self::SigmaEpsilon { sigma, epsilon }
    }

    /// Returns `true` if the parameter produces a non-zero LJ interaction.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::SigmaEpsilon { .. } | Self::AB { .. })
    }

    /// Converts the parameter to the canonical `SigmaEpsilon` form.
    ///
    /// A zero sigma or epsilon (or zero `A` and `B`) collapses to [`LjParameter::None`],
    /// which keeps the kernel away from the `0/0` singularity of a zero-sized atom.
    pub fn normalized(self) -> Result<Self, &'static str> {
        match self {
            Self::None => Ok(Self::None),
            Self::SigmaEpsilon { sigma, epsilon } => {
                if !sigma.is_finite() || !epsilon.is_finite() {
                    return Err("sigma and epsilon must be finite");
                }
                if sigma < 0.0 || epsilon < 0.0 {
                    return Err("sigma and epsilon must not be negative");
                }
                if sigma == 0.0 || epsilon == 0.0 {
                    Ok(Self::None)
                } else {
                    Ok(Self::SigmaEpsilon { sigma, epsilon })
                }
            }
            Self::AB { a, b } => {
                if !a.is_finite() || !b.is_finite() {
                    return Err("A and B must be finite");
                }
                if a < 0.0 || b < 0.0 {
                    return Err("A and B must not be negative");
                }
                if a == 0.0 && b == 0.0 {
                    return Ok(Self::None);
                }
                if a == 0.0 || b == 0.0 {
                    return Err("A and B must both be non-zero to define sigma and epsilon");
                }
                let sigma = (a / b).powf(1.0 / 6.0);
                let epsilon = b * b / (4.0 * a);
                Ok(Self::SigmaEpsilon { sigma, epsilon })
            }
        }
    }

    /// Returns `(sigma, epsilon)` for a normalized parameter.
    #[inline]
    pub fn as_sigma_epsilon(&self) -> Option<(f64, f64)> {
        match *self {
            Self::SigmaEpsilon { sigma, epsilon } => Some((sigma, epsilon)),
            _ => None,
        }
    }
}

/// One atom flattened for the nonbonded kernel.
///
/// Records are immutable: a move or mutation produces a new record, which keeps old and
/// new states of a group directly comparable. A record with zero charge and no LJ
/// parameter is a *dummy*; dummies never contribute energy and never form a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomRecord {
    position: Point3<f64>,
    charge: f64,
    lj: LjParameter,
    group: GroupId,
    index: u32,
    dummy: bool,
}

impl AtomRecord {
    /// Validates and normalizes a single atom.
    ///
    /// # Arguments
    ///
    /// * `group` - The owning group.
    /// * `index` - Position of the atom within its group's collection.
    /// * `position` - Cartesian coordinates in Angstroms.
    /// * `charge` - Partial charge in elementary charge units.
    /// * `lj` - LJ parameter in either accepted form.
    ///
    /// # Errors
    ///
    /// Returns [`AtomBuildError`] if any value is non-finite or the LJ parameter is invalid.
    pub fn new(
        group: GroupId,
        index: usize,
        position: Point3<f64>,
        charge: f64,
        lj: LjParameter,
    ) -> Result<Self, AtomBuildError> {
        if !position.coords.iter().all(|c| c.is_finite()) {
            return Err(AtomBuildError::NonFiniteCoordinate { index });
        }
        if !charge.is_finite() {
            return Err(AtomBuildError::NonFiniteCharge { index });
        }
        let lj = lj
            .normalized()
            .map_err(|reason| AtomBuildError::InvalidLjParameter { index, reason })?;

        Ok(Self {
            position,
            charge,
            lj,
            group,
            index: index as u32,
            dummy: charge == 0.0 && !lj.is_active(),
        })
    }

    /// Creates a dummy atom: it occupies a position but interacts with nothing.
    pub fn dummy(group: GroupId, index: usize, position: Point3<f64>) -> Self {
        Self {
            position,
            charge: 0.0,
            lj: LjParameter::None,
            group,
            index: index as u32,
            dummy: true,
        }
    }

    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    #[inline]
    pub fn charge(&self) -> f64 {
        self.charge
    }

    #[inline]
    pub fn lj(&self) -> LjParameter {
        self.lj
    }

    #[inline]
    pub fn group(&self) -> GroupId {
        self.group
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    /// Returns a copy of this record placed at `position`.
    pub(crate) fn moved_to(&self, position: Point3<f64>) -> Self {
        Self { position, ..*self }
    }
}
