use super::config::ConfigError;
use super::delta::CljDelta;
use super::error::EngineError;
use crate::core::forcefield::params::CljConfig;
use crate::core::models::atom::AtomRecord;
use crate::core::models::collection::AtomCollection;
use crate::core::models::ids::{AtomToken, GroupId};
use crate::core::models::space::Space;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Integer coordinates of one cell of the decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellIndex {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellIndex {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// A unit of work for the calculator: one occupied cell with itself, or two occupied
/// neighboring cells with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoxPair {
    Within(CellIndex),
    Between(CellIndex, CellIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Populated,
    /// The geometry changed; queries fail until [`CljBoxes::rebuild`] is called.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    record: AtomRecord,
    cell: CellIndex,
    position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    space: Space,
    cell_edge: f64,
    /// Cells per axis under periodic boundaries.
    periodic_cells: Option<[i64; 3]>,
}

impl Geometry {
    fn new(space: Space, cell_edge: f64) -> Result<Self, EngineError> {
        if !cell_edge.is_finite() || cell_edge <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "cell_edge",
                reason: format!("must be positive and finite, got {cell_edge}"),
            }
            .into());
        }
        let periodic_cells = match space.dimensions() {
            None => None,
            Some(dimensions) => {
                space
                    .validate(0.0)
                    .map_err(|source| ConfigError::Params(source.into()))?;
                Some([0, 1, 2].map(|axis| ((dimensions[axis] / cell_edge).floor() as i64).max(1)))
            }
        };
        Ok(Self {
            space,
            cell_edge,
            periodic_cells,
        })
    }

    fn cell_of(&self, point: &Point3<f64>) -> CellIndex {
        match (self.periodic_cells, self.space.dimensions()) {
            (Some(cells), Some(dimensions)) => {
                let wrapped = self.space.wrap(point);
                let [x, y, z] = [0, 1, 2].map(|axis| {
                    let width = dimensions[axis] / cells[axis] as f64;
                    ((wrapped[axis] / width).floor() as i64).clamp(0, cells[axis] - 1)
                });
                CellIndex::new(x, y, z)
            }
            _ => CellIndex::new(
                (point.x / self.cell_edge).floor() as i64,
                (point.y / self.cell_edge).floor() as i64,
                (point.z / self.cell_edge).floor() as i64,
            ),
        }
    }

    /// The 3x3x3 block around `cell`, wrapped and deduplicated under periodic boundaries.
    fn stencil(&self, cell: CellIndex) -> Vec<CellIndex> {
        let mut cells = Vec::with_capacity(27);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let (x, y, z) = (cell.x + dx, cell.y + dy, cell.z + dz);
                    cells.push(match self.periodic_cells {
                        Some([nx, ny, nz]) => {
                            CellIndex::new(x.rem_euclid(nx), y.rem_euclid(ny), z.rem_euclid(nz))
                        }
                        None => CellIndex::new(x, y, z),
                    });
                }
            }
        }
        if self.periodic_cells.is_some() {
            cells.sort_unstable();
            cells.dedup();
        }
        cells
    }
}

/// Spatial index of atom records bucketed into cells at least one cutoff wide.
///
/// Every atom within the cutoff of an atom in cell `c` lies in `c` or one of its 26
/// neighbors. Tokens handed out by [`CljBoxes::add`] stay valid until the atom is
/// removed, its group is reissued with a different atom count, or the index is rebuilt.
#[derive(Debug, Clone)]
pub struct CljBoxes {
    geometry: Geometry,
    slots: SlotMap<AtomToken, Slot>,
    buckets: BTreeMap<CellIndex, Vec<AtomToken>>,
    groups: BTreeMap<GroupId, Vec<AtomToken>>,
    stale: bool,
    generation: u64,
}

impl CljBoxes {
    pub fn new(space: Space, cell_edge: f64) -> Result<Self, EngineError> {
        Ok(Self {
            geometry: Geometry::new(space, cell_edge)?,
            slots: SlotMap::with_key(),
            buckets: BTreeMap::new(),
            groups: BTreeMap::new(),
            stale: false,
            generation: 0,
        })
    }

    /// An empty index whose cells are as wide as the larger of the two cutoffs.
    pub fn for_config(config: &CljConfig) -> Result<Self, EngineError> {
        Self::new(config.space, config.max_cutoff())
    }

    pub fn state(&self) -> IndexState {
        if self.stale {
            IndexState::Stale
        } else if self.slots.is_empty() && self.groups.is_empty() {
            IndexState::Empty
        } else {
            IndexState::Populated
        }
    }

    /// Incremented by every mutation. A [`CljDelta`] remembers the generation it was
    /// evaluated against.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn space(&self) -> &Space {
        &self.geometry.space
    }

    pub fn cell_edge(&self) -> f64 {
        self.geometry.cell_edge
    }

    /// Fails with [`EngineError::StaleIndex`] unless the cells were laid out for `config`:
    /// the same space, and an edge no narrower than the larger cutoff.
    pub fn ensure_compatible(&self, config: &CljConfig) -> Result<(), EngineError> {
        self.ensure_fresh()?;
        let cutoff = config.max_cutoff();
        if config.space != self.geometry.space || cutoff > self.geometry.cell_edge {
            debug!(
                cell_edge = self.geometry.cell_edge,
                cutoff, "Box index geometry does not fit the cutoff function."
            );
            return Err(EngineError::StaleIndex);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.keys().copied()
    }

    pub fn contains_group(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    /// Inserts every atom of `collection` and returns one token per atom, in order.
    pub fn add(&mut self, collection: &AtomCollection) -> Result<Vec<AtomToken>, EngineError> {
        self.ensure_fresh()?;
        let group = collection.group();
        if self.groups.contains_key(&group) {
            return Err(EngineError::DuplicateGroup(group));
        }
        let tokens: Vec<AtomToken> = collection
            .iter()
            .map(|record| self.insert_record(*record))
            .collect();
        trace!(%group, atoms = tokens.len(), "Added group to box index.");
        self.groups.insert(group, tokens.clone());
        self.generation += 1;
        Ok(tokens)
    }

    /// Removes a single atom. The remaining atoms of its group keep their indices; a group
    /// left without atoms is dropped.
    pub fn remove(&mut self, token: AtomToken) -> Result<AtomRecord, EngineError> {
        self.ensure_fresh()?;
        let slot = self
            .slots
            .remove(token)
            .ok_or(EngineError::InvalidToken(token))?;
        self.detach(token, slot.cell, slot.position);
        let group = slot.record.group();
        let emptied = match self.groups.get_mut(&group) {
            Some(members) => {
                members.retain(|&member| member != token);
                members.is_empty()
            }
            None => false,
        };
        if emptied {
            self.groups.remove(&group);
        }
        self.generation += 1;
        Ok(slot.record)
    }

    pub fn get(&self, token: AtomToken) -> Result<&AtomRecord, EngineError> {
        self.ensure_fresh()?;
        self.slots
            .get(token)
            .map(|slot| &slot.record)
            .ok_or(EngineError::InvalidToken(token))
    }

    pub fn tokens(&self, group: GroupId) -> Result<&[AtomToken], EngineError> {
        self.ensure_fresh()?;
        self.groups
            .get(&group)
            .map(|tokens| tokens.as_slice())
            .ok_or(EngineError::UnknownGroup(group))
    }

    pub fn cell_of(&self, point: &Point3<f64>) -> Result<CellIndex, EngineError> {
        self.ensure_fresh()?;
        Ok(self.geometry.cell_of(point))
    }

    pub fn neighbor_cells(&self, cell: CellIndex) -> Result<Vec<CellIndex>, EngineError> {
        self.ensure_fresh()?;
        Ok(self.geometry.stencil(cell))
    }

    /// Records of one cell in bucket order. Unoccupied cells are empty.
    pub fn atoms_in(&self, cell: CellIndex) -> Result<Vec<AtomRecord>, EngineError> {
        self.ensure_fresh()?;
        Ok(self
            .buckets
            .get(&cell)
            .map_or_else(Vec::new, |bucket| self.records_of(bucket)))
    }

    /// Records of every occupied cell.
    pub fn cell_records(&self) -> Result<BTreeMap<CellIndex, Vec<AtomRecord>>, EngineError> {
        self.ensure_fresh()?;
        Ok(self
            .buckets
            .iter()
            .map(|(&cell, bucket)| (cell, self.records_of(bucket)))
            .collect())
    }

    /// The current state of one group, in its original atom order.
    pub fn group_collection(&self, group: GroupId) -> Result<AtomCollection, EngineError> {
        let tokens = self.tokens(group)?;
        Ok(AtomCollection::from_records(group, self.records_of(tokens)))
    }

    pub fn remove_group(&mut self, group: GroupId) -> Result<AtomCollection, EngineError> {
        self.ensure_fresh()?;
        let tokens = self
            .groups
            .remove(&group)
            .ok_or(EngineError::UnknownGroup(group))?;
        let records = tokens
            .iter()
            .map(|&token| self.release(token).record)
            .collect();
        self.generation += 1;
        Ok(AtomCollection::from_records(group, records))
    }

    /// Every record, grouped by ascending group id and in atom order within a group.
    pub fn all_records(&self) -> Result<Vec<AtomRecord>, EngineError> {
        self.ensure_fresh()?;
        Ok(self
            .groups
            .values()
            .flat_map(|tokens| tokens.iter().map(|&token| self.slot(token).record))
            .collect())
    }

    /// Each occupied cell once with itself, then each unordered pair of occupied
    /// neighboring cells once, in ascending cell order.
    pub fn box_pairs(&self) -> Result<Vec<BoxPair>, EngineError> {
        self.ensure_fresh()?;
        let mut pairs = Vec::new();
        for &cell in self.buckets.keys() {
            pairs.push(BoxPair::Within(cell));
            for neighbor in self.geometry.stencil(cell) {
                if neighbor > cell && self.buckets.contains_key(&neighbor) {
                    pairs.push(BoxPair::Between(cell, neighbor));
                }
            }
        }
        Ok(pairs)
    }

    /// Switches to a new geometry. The index is stale until [`CljBoxes::rebuild`].
    pub fn invalidate(&mut self, space: Space, cell_edge: f64) -> Result<(), EngineError> {
        self.geometry = Geometry::new(space, cell_edge)?;
        self.stale = true;
        self.generation += 1;
        debug!(cell_edge, "Box index invalidated.");
        Ok(())
    }

    /// Re-inserts every record under the current geometry.
    ///
    /// All previously issued tokens become invalid; the new tokens are returned per group.
    pub fn rebuild(&mut self) -> Result<BTreeMap<GroupId, Vec<AtomToken>>, EngineError> {
        let groups = std::mem::take(&mut self.groups);
        let records: Vec<(GroupId, Vec<AtomRecord>)> = groups
            .into_iter()
            .map(|(group, tokens)| (group, self.records_of(&tokens)))
            .collect();

        self.slots.clear();
        self.buckets.clear();
        self.stale = false;

        for (group, records) in records {
            let tokens = records
                .into_iter()
                .map(|record| self.insert_record(record))
                .collect();
            self.groups.insert(group, tokens);
        }
        self.generation += 1;
        debug!(
            atoms = self.slots.len(),
            cells = self.buckets.len(),
            "Box index rebuilt."
        );
        Ok(self.groups.clone())
    }

    /// Installs the new state of a group from an accepted delta.
    ///
    /// When the atom count is unchanged every token is kept and atoms migrate between
    /// buckets as needed; otherwise the group's tokens are reissued.
    pub fn commit(&mut self, delta: CljDelta) -> Result<Vec<AtomToken>, EngineError> {
        self.ensure_fresh()?;
        let group = delta.group();
        if delta.generation() != self.generation {
            return Err(EngineError::StaleDelta {
                group,
                delta_generation: delta.generation(),
                current_generation: self.generation,
            });
        }
        let tokens = self
            .groups
            .get(&group)
            .cloned()
            .ok_or(EngineError::UnknownGroup(group))?;
        let new = delta.into_new();

        let tokens = if tokens.len() == new.len() {
            for (&token, record) in tokens.iter().zip(new.iter()) {
                self.relocate(token, *record);
            }
            tokens
        } else {
            for &token in &tokens {
                self.release(token);
            }
            let reissued: Vec<AtomToken> = new.iter().map(|record| self.insert_record(*record)).collect();
            self.groups.insert(group, reissued.clone());
            trace!(%group, atoms = reissued.len(), "Reissued tokens after atom count change.");
            reissued
        };
        self.generation += 1;
        Ok(tokens)
    }

    fn ensure_fresh(&self) -> Result<(), EngineError> {
        if self.stale {
            Err(EngineError::StaleIndex)
        } else {
            Ok(())
        }
    }

    fn records_of(&self, tokens: &[AtomToken]) -> Vec<AtomRecord> {
        tokens.iter().map(|&token| self.slot(token).record).collect()
    }

    fn slot(&self, token: AtomToken) -> &Slot {
        self.slots
            .get(token)
            .unwrap_or_else(|| panic!("box index corrupted: no slot for live token {token:?}"))
    }

    fn insert_record(&mut self, record: AtomRecord) -> AtomToken {
        let cell = self.geometry.cell_of(record.position());
        let token = self.slots.insert(Slot {
            record,
            cell,
            position: 0,
        });
        let position = self.attach(token, cell);
        self.slots[token].position = position;
        token
    }

    /// Removes a slot and its bucket entry, returning the slot.
    fn release(&mut self, token: AtomToken) -> Slot {
        let slot = self
            .slots
            .remove(token)
            .unwrap_or_else(|| panic!("box index corrupted: no slot for live token {token:?}"));
        self.detach(token, slot.cell, slot.position);
        slot
    }

    fn relocate(&mut self, token: AtomToken, record: AtomRecord) {
        let new_cell = self.geometry.cell_of(record.position());
        let (old_cell, old_position) = {
            let slot = self.slot(token);
            (slot.cell, slot.position)
        };
        if new_cell != old_cell {
            self.detach(token, old_cell, old_position);
            let position = self.attach(token, new_cell);
            let slot = &mut self.slots[token];
            slot.cell = new_cell;
            slot.position = position;
        }
        self.slots[token].record = record;
    }

    fn attach(&mut self, token: AtomToken, cell: CellIndex) -> usize {
        let bucket = self.buckets.entry(cell).or_default();
        bucket.push(token);
        bucket.len() - 1
    }

    /// Swap-removes `token` from its bucket and repairs the moved token's position.
    fn detach(&mut self, token: AtomToken, cell: CellIndex, position: usize) {
        let Some(bucket) = self.buckets.get_mut(&cell) else {
            panic!("box index corrupted: token {token:?} points at missing cell {cell:?}");
        };
        assert!(
            bucket.get(position) == Some(&token),
            "box index corrupted: token {token:?} is not at position {position} of cell {cell:?}"
        );
        bucket.swap_remove(position);
        if let Some(&moved) = bucket.get(position) {
            match self.slots.get_mut(moved) {
                Some(slot) => slot.position = position,
                None => panic!("box index corrupted: bucket holds dead token {moved:?}"),
            }
        }
        if bucket.is_empty() {
            self.buckets.remove(&cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::LjParameter;
    use crate::core::models::collection::AtomCollectionBuilder;
    use std::collections::HashSet;

    fn collection(group: u32, positions: &[[f64; 3]]) -> AtomCollection {
        let mut builder = AtomCollectionBuilder::new(GroupId(group));
        for &p in positions {
            builder.push_atom(Point3::from(p), 0.1, LjParameter::sigma_epsilon(3.0, 0.1));
        }
        builder.build().unwrap()
    }

    fn vacuum_boxes() -> CljBoxes {
        CljBoxes::new(Space::Vacuum, 10.0).unwrap()
    }

    #[test]
    fn new_index_is_empty() {
        let boxes = vacuum_boxes();
        assert_eq!(boxes.state(), IndexState::Empty);
        assert!(boxes.is_empty());
        assert_eq!(boxes.box_pairs().unwrap(), Vec::new());
    }

    #[test]
    fn rejects_non_positive_cell_edge() {
        assert!(matches!(
            CljBoxes::new(Space::Vacuum, 0.0),
            Err(EngineError::Config { .. })
        ));
    }

    #[test]
    fn add_returns_tokens_that_retrieve_the_records() {
        let mut boxes = vacuum_boxes();
        let water = collection(1, &[[0.0, 0.0, 0.0], [15.0, 0.0, 0.0]]);
        let tokens = boxes.add(&water).unwrap();

        assert_eq!(boxes.state(), IndexState::Populated);
        assert_eq!(tokens.len(), 2);
        assert_eq!(boxes.get(tokens[1]).unwrap(), &water[1]);
        assert_eq!(boxes.group_collection(GroupId(1)).unwrap(), water);
    }

    #[test]
    fn adding_the_same_group_twice_fails() {
        let mut boxes = vacuum_boxes();
        let water = collection(1, &[[0.0, 0.0, 0.0]]);
        boxes.add(&water).unwrap();
        assert!(matches!(
            boxes.add(&water),
            Err(EngineError::DuplicateGroup(GroupId(1)))
        ));
    }

    #[test]
    fn removed_token_is_invalid_and_bucket_is_repaired() {
        let mut boxes = vacuum_boxes();
        let tokens = boxes
            .add(&collection(1, &[[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]))
            .unwrap();
        let removed = boxes.remove(tokens[0]).unwrap();
        assert_eq!(removed.index(), 0);

        assert!(matches!(
            boxes.get(tokens[0]),
            Err(EngineError::InvalidToken(_))
        ));
        assert_eq!(boxes.get(tokens[1]).unwrap().index(), 1);
        assert_eq!(boxes.get(tokens[2]).unwrap().index(), 2);

        let cell = boxes.cell_of(&Point3::new(1.0, 1.0, 1.0)).unwrap();
        let mut in_cell: Vec<usize> = boxes.atoms_in(cell).unwrap().iter().map(|a| a.index()).collect();
        in_cell.sort();
        assert_eq!(in_cell, vec![1, 2]);

        boxes.remove(tokens[2]).unwrap();
        boxes.remove(tokens[1]).unwrap();
        assert!(boxes.atoms_in(cell).unwrap().is_empty());
        assert!(boxes.box_pairs().unwrap().is_empty());
    }

    #[test]
    fn removing_every_atom_empties_the_index() {
        let mut boxes = vacuum_boxes();
        let tokens = boxes
            .add(&collection(3, &[[1.0, 0.0, 0.0], [12.0, 0.0, 0.0]]))
            .unwrap();
        boxes.remove(tokens[0]).unwrap();
        assert_eq!(boxes.state(), IndexState::Populated);
        assert!(boxes.contains_group(GroupId(3)));

        boxes.remove(tokens[1]).unwrap();
        assert_eq!(boxes.state(), IndexState::Empty);
        assert!(!boxes.contains_group(GroupId(3)));
        assert!(matches!(
            boxes.group_collection(GroupId(3)),
            Err(EngineError::UnknownGroup(GroupId(3)))
        ));
        boxes.add(&collection(3, &[[0.0, 0.0, 0.0]])).unwrap();
    }

    #[test]
    fn index_checks_its_geometry_against_a_config() {
        let boxes = vacuum_boxes();
        assert!(boxes.ensure_compatible(&CljConfig::new(10.0, 8.0, Space::Vacuum)).is_ok());
        assert!(matches!(
            boxes.ensure_compatible(&CljConfig::new(10.5, 8.0, Space::Vacuum)),
            Err(EngineError::StaleIndex)
        ));
        assert!(matches!(
            boxes.ensure_compatible(&CljConfig::new(8.0, 8.0, Space::periodic(30.0, 30.0, 30.0))),
            Err(EngineError::StaleIndex)
        ));
    }

    #[test]
    fn vacuum_cells_use_floor_division() {
        let boxes = vacuum_boxes();
        assert_eq!(
            boxes.cell_of(&Point3::new(-0.5, 9.99, 10.0)).unwrap(),
            CellIndex::new(-1, 0, 1)
        );
        assert_eq!(boxes.neighbor_cells(CellIndex::new(0, 0, 0)).unwrap().len(), 27);
    }

    #[test]
    fn periodic_cells_wrap_and_deduplicate() {
        let boxes = CljBoxes::new(Space::periodic(20.0, 30.0, 12.0), 8.0).unwrap();
        assert_eq!(
            boxes.cell_of(&Point3::new(-1.0, 31.0, 5.0)).unwrap(),
            CellIndex::new(1, 0, 0)
        );
        // 2 x 3 x 1 cells: every cell neighbors every other one.
        let neighbors = boxes.neighbor_cells(CellIndex::new(0, 0, 0)).unwrap();
        assert_eq!(neighbors.len(), 6);
        assert_eq!(neighbors.iter().collect::<HashSet<_>>().len(), 6);
    }

    #[test]
    fn box_pairs_are_unique_and_cover_neighbors() {
        let mut boxes = vacuum_boxes();
        boxes
            .add(&collection(
                1,
                &[[0.0, 0.0, 0.0], [11.0, 0.0, 0.0], [25.0, 0.0, 0.0], [0.0, -3.0, 12.0]],
            ))
            .unwrap();
        let pairs = boxes.box_pairs().unwrap();
        let unique: HashSet<_> = pairs.iter().collect();
        assert_eq!(unique.len(), pairs.len());

        let within = pairs.iter().filter(|p| matches!(p, BoxPair::Within(_))).count();
        assert_eq!(within, 4);
        assert!(pairs.contains(&BoxPair::Between(
            CellIndex::new(0, 0, 0),
            CellIndex::new(1, 0, 0)
        )));
        assert!(!pairs.contains(&BoxPair::Between(
            CellIndex::new(0, 0, 0),
            CellIndex::new(2, 0, 0)
        )));
    }

    #[test]
    fn stale_index_rejects_queries_until_rebuilt() {
        let mut boxes = vacuum_boxes();
        let old_tokens = boxes.add(&collection(1, &[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]])).unwrap();
        boxes.invalidate(Space::Vacuum, 3.0).unwrap();

        assert_eq!(boxes.state(), IndexState::Stale);
        assert!(matches!(boxes.get(old_tokens[0]), Err(EngineError::StaleIndex)));
        assert!(matches!(boxes.box_pairs(), Err(EngineError::StaleIndex)));
        assert!(matches!(
            boxes.add(&collection(2, &[[0.0, 0.0, 0.0]])),
            Err(EngineError::StaleIndex)
        ));

        let new_tokens = boxes.rebuild().unwrap();
        assert_eq!(boxes.state(), IndexState::Populated);
        assert!(matches!(
            boxes.get(old_tokens[0]),
            Err(EngineError::InvalidToken(_))
        ));
        let token = new_tokens[&GroupId(1)][1];
        assert_eq!(boxes.get(token).unwrap().position(), &Point3::new(4.0, 0.0, 0.0));
        assert_eq!(
            boxes.cell_of(&Point3::new(4.0, 0.0, 0.0)).unwrap(),
            CellIndex::new(1, 0, 0)
        );
    }

    #[test]
    fn remove_group_returns_its_collection() {
        let mut boxes = vacuum_boxes();
        let water = collection(4, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let tokens = boxes.add(&water).unwrap();
        let removed = boxes.remove_group(GroupId(4)).unwrap();

        assert_eq!(removed, water);
        assert!(boxes.is_empty());
        assert!(matches!(boxes.get(tokens[0]), Err(EngineError::InvalidToken(_))));
        assert!(matches!(
            boxes.remove_group(GroupId(4)),
            Err(EngineError::UnknownGroup(GroupId(4)))
        ));
    }

    #[test]
    fn every_mutation_bumps_the_generation() {
        let mut boxes = vacuum_boxes();
        let start = boxes.generation();
        let tokens = boxes.add(&collection(1, &[[0.0, 0.0, 0.0]])).unwrap();
        assert_eq!(boxes.generation(), start + 1);
        boxes.remove(tokens[0]).unwrap();
        assert_eq!(boxes.generation(), start + 2);
        let _ = boxes.all_records().unwrap();
        assert_eq!(boxes.generation(), start + 2);
    }

    #[test]
    fn all_records_are_ordered_by_group_then_index() {
        let mut boxes = vacuum_boxes();
        boxes.add(&collection(2, &[[30.0, 0.0, 0.0], [0.0, 0.0, 0.0]])).unwrap();
        boxes.add(&collection(1, &[[5.0, 5.0, 5.0]])).unwrap();
        let order: Vec<(u32, usize)> = boxes
            .all_records()
            .unwrap()
            .iter()
            .map(|a| (a.group().0, a.index()))
            .collect();
        assert_eq!(order, vec![(1, 0), (2, 0), (2, 1)]);
    }
}
