use super::atom::{AtomBuildError, AtomRecord, LjParameter};
use super::ids::GroupId;
use nalgebra::{Point3, Rotation3, Vector3};
use std::ops::Deref;
use std::sync::Arc;

/// Borrowed per-atom arrays describing one molecule, as handed over by an I/O layer.
#[derive(Debug, Clone, Copy)]
pub struct MoleculeArrays<'a> {
    pub coordinates: &'a [Point3<f64>],
    pub charges: &'a [f64],
    pub lj: &'a [LjParameter],
}

/// Ordered, immutable sequence of atom records belonging to one group.
///
/// Index `i` always refers to the same physical atom. Cloning is cheap (the records are
/// shared) and moves always produce a new collection rather than editing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomCollection {
    group: GroupId,
    atoms: Arc<[AtomRecord]>,
}

impl AtomCollection {
    /// Converts per-atom arrays into a collection for `group`.
    ///
    /// # Errors
    ///
    /// Returns [`AtomBuildError::LengthMismatch`] if the charge or LJ arrays do not match
    /// the number of coordinates, or any per-atom validation error.
    pub fn build(group: GroupId, arrays: MoleculeArrays<'_>) -> Result<Self, AtomBuildError> {
        let n = arrays.coordinates.len();
        if arrays.charges.len() != n {
            return Err(AtomBuildError::LengthMismatch {
                field: "charges",
                expected: n,
                found: arrays.charges.len(),
            });
        }
        if arrays.lj.len() != n {
            return Err(AtomBuildError::LengthMismatch {
                field: "lj",
                expected: n,
                found: arrays.lj.len(),
            });
        }

        let atoms = arrays
            .coordinates
            .iter()
            .zip(arrays.charges)
            .zip(arrays.lj)
            .enumerate()
            .map(|(index, ((&position, &charge), &lj))| {
                AtomRecord::new(group, index, position, charge, lj)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            group,
            atoms: atoms.into(),
        })
    }

    pub fn empty(group: GroupId) -> Self {
        Self {
            group,
            atoms: Arc::from(Vec::new()),
        }
    }

    pub(crate) fn from_records(group: GroupId, atoms: Vec<AtomRecord>) -> Self {
        Self {
            group,
            atoms: atoms.into(),
        }
    }

    #[inline]
    pub fn group(&self) -> GroupId {
        self.group
    }

    #[inline]
    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    /// Geometric center of all atoms, dummies included.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.atoms.is_empty() {
            return None;
        }
        let sum = self
            .atoms
            .iter()
            .fold(Vector3::zeros(), |acc, atom| acc + atom.position().coords);
        Some(Point3::from(sum / self.atoms.len() as f64))
    }

    /// Returns a new collection with every atom displaced by `displacement`.
    pub fn translated(&self, displacement: &Vector3<f64>) -> Self {
        let atoms = self
            .atoms
            .iter()
            .map(|atom| atom.moved_to(atom.position() + displacement))
            .collect();
        Self::from_records(self.group, atoms)
    }

    /// Returns a new collection rigidly rotated about its centroid.
    pub fn rotated_about_centroid(&self, rotation: &Rotation3<f64>) -> Self {
        let Some(center) = self.centroid() else {
            return self.clone();
        };
        let atoms = self
            .atoms
            .iter()
            .map(|atom| atom.moved_to(center + rotation * (atom.position() - center)))
            .collect();
        Self::from_records(self.group, atoms)
    }

    /// Returns a new collection with the same atoms placed at `positions`.
    ///
    /// # Errors
    ///
    /// Fails if the number of positions differs from the number of atoms or any position is
    /// not finite.
    pub fn with_positions(&self, positions: &[Point3<f64>]) -> Result<Self, AtomBuildError> {
        if positions.len() != self.atoms.len() {
            return Err(AtomBuildError::LengthMismatch {
                field: "positions",
                expected: self.atoms.len(),
                found: positions.len(),
            });
        }
        let atoms = self
            .atoms
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(index, (atom, &position))| {
                if position.coords.iter().all(|c| c.is_finite()) {
                    Ok(atom.moved_to(position))
                } else {
                    Err(AtomBuildError::NonFiniteCoordinate { index })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_records(self.group, atoms))
    }

    /// Opens a staging builder seeded with this collection's atoms.
    ///
    /// Staged atoms keep their indices, so exclusion tables keyed by index still apply
    /// after atoms were removed from the group. New atoms take indices past the largest one.
    pub fn edit(&self) -> AtomCollectionBuilder {
        AtomCollectionBuilder {
            group: self.group,
            staged: self
                .atoms
                .iter()
                .map(|atom| StagedAtom {
                    index: atom.index(),
                    position: *atom.position(),
                    charge: atom.charge(),
                    lj: atom.lj(),
                })
                .collect(),
            next_index: self.atoms.iter().map(|atom| atom.index() + 1).max().unwrap_or(0),
        }
    }
}

impl Deref for AtomCollection {
    type Target = [AtomRecord];

    fn deref(&self) -> &Self::Target {
        &self.atoms
    }
}

#[derive(Debug, Clone, Copy)]
struct StagedAtom {
    index: usize,
    position: Point3<f64>,
    charge: f64,
    lj: LjParameter,
}

/// Mutable staging area that produces an immutable [`AtomCollection`] on `build`.
///
/// This is the only place where atom data is edited in place; once built, a collection
/// is never modified again.
#[derive(Debug, Clone)]
pub struct AtomCollectionBuilder {
    group: GroupId,
    staged: Vec<StagedAtom>,
    next_index: usize,
}

impl AtomCollectionBuilder {
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            staged: Vec::new(),
            next_index: 0,
        }
    }

    pub fn push_atom(&mut self, position: Point3<f64>, charge: f64, lj: LjParameter) -> &mut Self {
        self.staged.push(StagedAtom {
            index: self.next_index,
            position,
            charge,
            lj,
        });
        self.next_index += 1;
        self
    }

    pub fn push_dummy(&mut self, position: Point3<f64>) -> &mut Self {
        self.push_atom(position, 0.0, LjParameter::None)
    }

    /// Moves the staged atom at `slot` (its position in staging order). Out-of-range slots
    /// are ignored and reported as `false`.
    pub fn set_position(&mut self, slot: usize, position: Point3<f64>) -> bool {
        match self.staged.get_mut(slot) {
            Some(atom) => {
                atom.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_charge(&mut self, slot: usize, charge: f64) -> bool {
        match self.staged.get_mut(slot) {
            Some(atom) => {
                atom.charge = charge;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn build(self) -> Result<AtomCollection, AtomBuildError> {
        let atoms = self
            .staged
            .into_iter()
            .map(|a| AtomRecord::new(self.group, a.index, a.position, a.charge, a.lj))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AtomCollection::from_records(self.group, atoms))
    }
}
