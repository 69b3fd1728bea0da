use super::boxes::{CellIndex, CljBoxes};
use super::error::EngineError;
use crate::core::forcefield::function::CljFunction;
use crate::core::forcefield::term::CljEnergy;
use crate::core::models::atom::AtomRecord;
use crate::core::models::collection::AtomCollection;
use crate::core::models::ids::GroupId;
use std::collections::BTreeSet;
use tracing::{instrument, trace};

/// The energy change of replacing one group's atoms, evaluated without touching the index.
///
/// A delta is consumed exactly once: passed to [`CljBoxes::commit`] to accept the move, or
/// dropped to reject it.
#[derive(Debug, Clone)]
pub struct CljDelta {
    group: GroupId,
    old: AtomCollection,
    new: AtomCollection,
    old_energy: CljEnergy,
    new_energy: CljEnergy,
    generation: u64,
}

impl CljDelta {
    /// Evaluates the change for a single function.
    pub fn evaluate(
        function: &CljFunction,
        boxes: &CljBoxes,
        new: AtomCollection,
    ) -> Result<Self, EngineError> {
        Self::evaluate_many(std::slice::from_ref(function), boxes, new)
    }

    /// Evaluates the change summed over several functions.
    ///
    /// Only atoms in the cells touched by the old or new positions, and the neighbors of
    /// those cells, are visited.
    #[instrument(skip_all, name = "clj_delta", fields(group = %new.group()))]
    pub fn evaluate_many(
        functions: &[CljFunction],
        boxes: &CljBoxes,
        new: AtomCollection,
    ) -> Result<Self, EngineError> {
        for function in functions {
            boxes.ensure_compatible(function.config())?;
        }
        let group = new.group();
        let old = boxes.group_collection(group)?;
        let environment = gather_environment(boxes, group, &old, &new)?;

        let mut old_energy = CljEnergy::ZERO;
        let mut new_energy = CljEnergy::ZERO;
        for function in functions {
            old_energy += function.calculate(&old) + function.calculate_pair(&old, &environment);
            new_energy += function.calculate(&new) + function.calculate_pair(&new, &environment);
        }

        trace!(
            environment = environment.len(),
            change = (new_energy - old_energy).total(),
            "Delta evaluated."
        );
        Ok(Self {
            group,
            old,
            new,
            old_energy,
            new_energy,
            generation: boxes.generation(),
        })
    }

    #[inline]
    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn old_collection(&self) -> &AtomCollection {
        &self.old
    }

    pub fn new_collection(&self) -> &AtomCollection {
        &self.new
    }

    pub fn old_energy(&self) -> CljEnergy {
        self.old_energy
    }

    pub fn new_energy(&self) -> CljEnergy {
        self.new_energy
    }

    /// `new_energy - old_energy`, per component.
    pub fn change(&self) -> CljEnergy {
        self.new_energy - self.old_energy
    }

    pub fn energy_change(&self) -> f64 {
        self.change().total()
    }

    /// Generation of the index this delta was evaluated against.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn into_new(self) -> AtomCollection {
        self.new
    }
}

/// Every atom outside `group` that lies in a cell neighboring an old or new position.
fn gather_environment(
    boxes: &CljBoxes,
    group: GroupId,
    old: &AtomCollection,
    new: &AtomCollection,
) -> Result<Vec<AtomRecord>, EngineError> {
    let mut touched = BTreeSet::new();
    for atom in old.iter().chain(new.iter()) {
        touched.insert(boxes.cell_of(atom.position())?);
    }
    let mut cells: BTreeSet<CellIndex> = BTreeSet::new();
    for cell in touched {
        cells.extend(boxes.neighbor_cells(cell)?);
    }

    let mut environment = Vec::new();
    for cell in cells {
        environment.extend(
            boxes
                .atoms_in(cell)?
                .into_iter()
                .filter(|atom| atom.group() != group),
        );
    }
    Ok(environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::CljConfig;
    use crate::core::forcefield::potentials::COULOMB_CONSTANT;
    use crate::core::models::atom::LjParameter;
    use crate::core::models::collection::AtomCollectionBuilder;
    use crate::core::models::connectivity::{Connectivity, PairScale};
    use crate::core::models::space::Space;
    use crate::engine::calculator;
    use nalgebra::{Point3, Rotation3, Vector3};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    fn molecule(group: u32, origin: [f64; 3]) -> AtomCollection {
        let mut builder = AtomCollectionBuilder::new(GroupId(group));
        let offsets = [[0.0, 0.0, 0.0], [0.96, 0.0, 0.0], [-0.24, 0.93, 0.0]];
        let charges = [-0.834, 0.417, 0.417];
        for (offset, charge) in offsets.iter().zip(charges) {
            let lj = if charge < 0.0 {
                LjParameter::sigma_epsilon(3.15365, 0.1550)
            } else {
                LjParameter::None
            };
            builder.push_atom(
                Point3::new(origin[0] + offset[0], origin[1] + offset[1], origin[2] + offset[2]),
                charge,
                lj,
            );
        }
        builder.build().unwrap()
    }

    fn system(space: Space) -> (Vec<CljFunction>, CljBoxes) {
        let config = CljConfig::new(8.0, 8.0, space);
        let functions = vec![
            CljFunction::shift(config).unwrap(),
            CljFunction::intra_shift(config, HashMap::new()).unwrap(),
        ];
        let mut boxes = CljBoxes::for_config(&config).unwrap();
        let origins = [
            [1.0, 1.0, 1.0],
            [4.0, 1.5, 1.0],
            [9.0, 2.0, 3.0],
            [2.0, 6.0, 9.5],
            [15.0, 15.0, 15.0],
            [17.5, 14.0, 13.0],
        ];
        for (i, origin) in origins.iter().enumerate() {
            boxes.add(&molecule(i as u32, *origin)).unwrap();
        }
        (functions, boxes)
    }

    fn total(functions: &[CljFunction], boxes: &CljBoxes) -> f64 {
        calculator::calculate_all(functions, boxes).unwrap().total.total()
    }

    #[test]
    fn delta_equals_difference_of_full_evaluations() {
        let (functions, mut boxes) = system(Space::Vacuum);
        let before = total(&functions, &boxes);

        let moved = boxes
            .group_collection(GroupId(1))
            .unwrap()
            .translated(&Vector3::new(3.5, -0.5, 7.0));
        let delta = CljDelta::evaluate_many(&functions, &boxes, moved).unwrap();
        let change = delta.energy_change();
        boxes.commit(delta).unwrap();

        let after = total(&functions, &boxes);
        assert!(approx_eq(after - before, change, 1e-9));
    }

    #[test]
    fn delta_equals_difference_under_periodic_boundaries() {
        let (functions, mut boxes) = system(Space::periodic(24.0, 24.0, 24.0));
        let before = total(&functions, &boxes);

        let current = boxes.group_collection(GroupId(4)).unwrap();
        let moved = current
            .rotated_about_centroid(&Rotation3::from_axis_angle(&Vector3::y_axis(), 0.8))
            .translated(&Vector3::new(8.0, 9.5, 9.0));
        let delta = CljDelta::evaluate_many(&functions, &boxes, moved).unwrap();
        let change = delta.energy_change();
        boxes.commit(delta).unwrap();

        let after = total(&functions, &boxes);
        assert!(approx_eq(after - before, change, 1e-9));
    }

    #[test]
    fn evaluation_leaves_the_index_untouched() {
        let (functions, boxes) = system(Space::Vacuum);
        let generation = boxes.generation();
        let before = total(&functions, &boxes);
        let original = boxes.group_collection(GroupId(0)).unwrap();

        let moved = original.translated(&Vector3::new(20.0, 0.0, 0.0));
        let delta = CljDelta::evaluate_many(&functions, &boxes, moved).unwrap();
        drop(delta);

        assert_eq!(boxes.generation(), generation);
        assert_eq!(boxes.group_collection(GroupId(0)).unwrap(), original);
        assert_eq!(total(&functions, &boxes).to_bits(), before.to_bits());
    }

    #[test]
    fn commit_keeps_tokens_and_migrates_buckets() {
        let (functions, mut boxes) = system(Space::Vacuum);
        let tokens = boxes.tokens(GroupId(2)).unwrap().to_vec();
        let moved = boxes
            .group_collection(GroupId(2))
            .unwrap()
            .translated(&Vector3::new(-30.0, 0.0, 0.0));
        let target_cell = boxes.cell_of(moved[0].position()).unwrap();

        let delta = CljDelta::evaluate_many(&functions, &boxes, moved.clone()).unwrap();
        let committed = boxes.commit(delta).unwrap();

        assert_eq!(committed, tokens);
        assert_eq!(boxes.get(tokens[0]).unwrap().position(), moved[0].position());
        assert!(
            boxes
                .atoms_in(target_cell)
                .unwrap()
                .iter()
                .any(|a| a.group() == GroupId(2))
        );
    }

    #[test]
    fn commit_with_changed_atom_count_reissues_tokens() {
        let (functions, mut boxes) = system(Space::Vacuum);
        let old_tokens = boxes.tokens(GroupId(3)).unwrap().to_vec();
        let mut editor = boxes.group_collection(GroupId(3)).unwrap().edit();
        editor.push_atom(Point3::new(2.5, 6.0, 10.5), 0.1, LjParameter::None);
        let grown = editor.build().unwrap();

        let before = total(&functions, &boxes);
        let delta = CljDelta::evaluate_many(&functions, &boxes, grown).unwrap();
        let change = delta.energy_change();
        let new_tokens = boxes.commit(delta).unwrap();

        assert_eq!(new_tokens.len(), 4);
        assert!(matches!(
            boxes.get(old_tokens[0]),
            Err(EngineError::InvalidToken(_))
        ));
        assert!(approx_eq(total(&functions, &boxes) - before, change, 1e-9));
    }

    #[test]
    fn delta_against_an_outdated_generation_is_rejected() {
        let (functions, mut boxes) = system(Space::Vacuum);
        let first = boxes
            .group_collection(GroupId(0))
            .unwrap()
            .translated(&Vector3::new(0.5, 0.0, 0.0));
        let second = boxes
            .group_collection(GroupId(5))
            .unwrap()
            .translated(&Vector3::new(0.0, 0.5, 0.0));
        let first = CljDelta::evaluate_many(&functions, &boxes, first).unwrap();
        let second = CljDelta::evaluate_many(&functions, &boxes, second).unwrap();

        boxes.commit(first).unwrap();
        let before = boxes.group_collection(GroupId(5)).unwrap();
        assert!(matches!(
            boxes.commit(second),
            Err(EngineError::StaleDelta { .. })
        ));
        assert_eq!(boxes.group_collection(GroupId(5)).unwrap(), before);
    }

    #[test]
    fn delta_for_unknown_group_fails() {
        let (functions, boxes) = system(Space::Vacuum);
        let stranger = molecule(99, [0.0, 0.0, 0.0]);
        assert!(matches!(
            CljDelta::evaluate_many(&functions, &boxes, stranger),
            Err(EngineError::UnknownGroup(GroupId(99)))
        ));
    }

    #[test]
    fn delta_on_cells_narrower_than_the_cutoff_is_rejected() {
        let config = CljConfig::new(10.0, 10.0, Space::Vacuum);
        let functions = [CljFunction::shift(config).unwrap()];
        let mut boxes = CljBoxes::new(Space::Vacuum, 3.0).unwrap();
        for (group, x, charge) in [(0, 0.5, 1.0), (1, 7.5, -1.0)] {
            let mut builder = AtomCollectionBuilder::new(GroupId(group));
            builder.push_atom(Point3::new(x, 0.0, 0.0), charge, LjParameter::None);
            boxes.add(&builder.build().unwrap()).unwrap();
        }
        let moved = boxes
            .group_collection(GroupId(0))
            .unwrap()
            .translated(&Vector3::new(-1.0, 0.0, 0.0));

        assert!(matches!(
            CljDelta::evaluate_many(&functions, &boxes, moved.clone()),
            Err(EngineError::StaleIndex)
        ));

        boxes.invalidate(Space::Vacuum, config.max_cutoff()).unwrap();
        boxes.rebuild().unwrap();
        let delta = CljDelta::evaluate_many(&functions, &boxes, moved).unwrap();
        assert!(delta.energy_change() > 0.0);
    }

    #[test]
    fn editing_after_single_atom_removal_keeps_exclusions_aligned() {
        let mut connectivity = Connectivity::new(4);
        for (i, j) in [(0, 1), (1, 2), (2, 3)] {
            connectivity.add_bond(i, j).unwrap();
        }
        let table = Arc::new(connectivity.exclusions(PairScale::new(0.5, 0.5)));
        let config = CljConfig::new(8.0, 8.0, Space::Vacuum);
        let functions =
            [CljFunction::intra_shift(config, HashMap::from([(GroupId(0), table)])).unwrap()];

        let mut builder = AtomCollectionBuilder::new(GroupId(0));
        for i in 0..4 {
            builder.push_atom(Point3::new(1.5 * i as f64, 0.0, 0.0), 0.3, LjParameter::None);
        }
        let mut boxes = CljBoxes::for_config(&config).unwrap();
        let tokens = boxes.add(&builder.build().unwrap()).unwrap();
        boxes.remove(tokens[1]).unwrap();

        // Only the scaled 1-4 pair between atoms 0 and 3 survives.
        let before = total(&functions, &boxes);
        assert!(approx_eq(before, 0.5 * COULOMB_CONSTANT * 0.09 / 4.5, 1e-9));

        let mut editor = boxes.group_collection(GroupId(0)).unwrap().edit();
        editor.set_position(2, Point3::new(5.0, 0.0, 0.0));
        let moved = editor.build().unwrap();
        assert_eq!(moved.iter().map(|a| a.index()).collect::<Vec<_>>(), vec![0, 2, 3]);

        let delta = CljDelta::evaluate_many(&functions, &boxes, moved).unwrap();
        let expected = 0.5 * COULOMB_CONSTANT * 0.09 * (1.0 / 5.0 - 1.0 / 4.5);
        assert!(approx_eq(delta.energy_change(), expected, 1e-9));
        boxes.commit(delta).unwrap();
        assert!(approx_eq(total(&functions, &boxes) - before, expected, 1e-9));
    }

    #[test]
    fn unchanged_positions_give_zero_change() {
        let (functions, boxes) = system(Space::Vacuum);
        let same = boxes.group_collection(GroupId(1)).unwrap();
        let delta = CljDelta::evaluate_many(&functions, &boxes, same).unwrap();
        assert_eq!(delta.energy_change(), 0.0);
        assert_eq!(delta.old_collection(), delta.new_collection());
    }
}
