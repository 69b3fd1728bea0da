use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("Bond references atom {index}, but the group only has {n_atoms} atoms")]
    AtomOutOfRange { index: usize, n_atoms: usize },
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// Multiplicative scale applied to the Coulomb and LJ terms of one intramolecular pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScale {
    pub coulomb: f64,
    pub lj: f64,
}

impl PairScale {
    pub const FULL: Self = Self {
        coulomb: 1.0,
        lj: 1.0,
    };
    pub const EXCLUDED: Self = Self {
        coulomb: 0.0,
        lj: 0.0,
    };

    pub fn new(coulomb: f64, lj: f64) -> Self {
        Self { coulomb, lj }
    }

    #[inline]
    pub fn is_excluded(&self) -> bool {
        self.coulomb == 0.0 && self.lj == 0.0
    }
}

impl Default for PairScale {
    fn default() -> Self {
        Self::FULL
    }
}

/// Bond graph of a single group, indexed by atom position within the group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connectivity {
    adjacency: Vec<Vec<usize>>,
}

impl Connectivity {
    pub fn new(n_atoms: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); n_atoms],
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.adjacency.len()
    }

    pub fn add_bond(&mut self, i: usize, j: usize) -> Result<(), ConnectivityError> {
        let n_atoms = self.adjacency.len();
        for index in [i, j] {
            if index >= n_atoms {
                return Err(ConnectivityError::AtomOutOfRange { index, n_atoms });
            }
        }
        if i == j {
            return Err(ConnectivityError::SelfBond(i));
        }
        if !self.adjacency[i].contains(&j) {
            self.adjacency[i].push(j);
            self.adjacency[j].push(i);
        }
        Ok(())
    }

    pub fn bonded_neighbors(&self, i: usize) -> &[usize] {
        self.adjacency.get(i).map_or([].as_slice(), |v| v.as_slice())
    }

    /// Number of bonds on the shortest path between `i` and `j`, if it is at most `max_bonds`.
    pub fn bond_separation(&self, i: usize, j: usize, max_bonds: usize) -> Option<usize> {
        self.walk_from(i, max_bonds)
            .into_iter()
            .find_map(|(atom, depth)| (atom == j).then_some(depth))
    }

    /// Builds the exclusion table: 1-2 and 1-3 pairs are fully excluded and 1-4 pairs are
    /// scaled by `scale_14`. Every other intramolecular pair keeps its full interaction.
    pub fn exclusions(&self, scale_14: PairScale) -> ExclusionTable {
        let mut scales = HashMap::new();
        for i in 0..self.adjacency.len() {
            for (j, depth) in self.walk_from(i, 3) {
                if j <= i {
                    continue;
                }
                let scale = match depth {
                    1 | 2 => PairScale::EXCLUDED,
                    3 => scale_14,
                    _ => continue,
                };
                scales.insert((i as u32, j as u32), scale);
            }
        }
        ExclusionTable { scales }
    }

    /// Breadth-first walk returning `(atom, bond_depth)` for every atom reachable from
    /// `start` in `1..=max_depth` bonds, each at its shortest depth.
    fn walk_from(&self, start: usize, max_depth: usize) -> Vec<(usize, usize)> {
        let mut depth_of = vec![usize::MAX; self.adjacency.len()];
        let mut found = Vec::new();
        let mut queue = VecDeque::new();

        if start >= self.adjacency.len() {
            return found;
        }
        depth_of[start] = 0;
        queue.push_back(start);

        while let Some(atom) = queue.pop_front() {
            let depth = depth_of[atom];
            if depth == max_depth {
                continue;
            }
            for &next in &self.adjacency[atom] {
                if depth_of[next] == usize::MAX {
                    depth_of[next] = depth + 1;
                    found.push((next, depth + 1));
                    queue.push_back(next);
                }
            }
        }
        found
    }
}

/// Per-pair scale factors for the intramolecular pairs of one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionTable {
    scales: HashMap<(u32, u32), PairScale>,
}

impl ExclusionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, i: usize, j: usize, scale: PairScale) {
        self.scales.insert(ordered(i, j), scale);
    }

    #[inline]
    pub fn scale(&self, i: usize, j: usize) -> PairScale {
        self.scales
            .get(&ordered(i, j))
            .copied()
            .unwrap_or(PairScale::FULL)
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

#[inline]
fn ordered(i: usize, j: usize) -> (u32, u32) {
    if i < j {
        (i as u32, j as u32)
    } else {
        (j as u32, i as u32)
    }
}
