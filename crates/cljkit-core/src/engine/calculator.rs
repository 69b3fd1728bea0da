use super::boxes::{BoxPair, CellIndex, CljBoxes};
use super::error::EngineError;
use crate::core::forcefield::function::{CljFunction, FunctionKind};
use crate::core::forcefield::term::CljEnergy;
use crate::core::models::atom::AtomRecord;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Total energy together with the contribution of each function, in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnergyBreakdown {
    pub per_function: Vec<(FunctionKind, CljEnergy)>,
    pub total: CljEnergy,
}

/// Energy of everything in `boxes` under `function`.
///
/// Box pairs are evaluated independently (in parallel with the `parallel` feature) and
/// their results summed in enumeration order, so the total does not depend on thread
/// scheduling.
#[instrument(skip_all, name = "clj_calculate", fields(function = %function.kind()))]
pub fn calculate(function: &CljFunction, boxes: &CljBoxes) -> Result<CljEnergy, EngineError> {
    let per_pair = calculate_pairs(function, boxes)?;
    Ok(per_pair.into_iter().map(|(_, energy)| energy).sum())
}

/// Energy of each box pair, in the order [`CljBoxes::box_pairs`] enumerates them.
pub fn calculate_pairs(
    function: &CljFunction,
    boxes: &CljBoxes,
) -> Result<Vec<(BoxPair, CljEnergy)>, EngineError> {
    boxes.ensure_compatible(function.config())?;
    let pairs = boxes.box_pairs()?;
    let cells = boxes.cell_records()?;
    debug!(pairs = pairs.len(), cells = cells.len(), "Evaluating box pairs.");

    #[cfg(not(feature = "parallel"))]
    let iterator = pairs.iter();

    #[cfg(feature = "parallel")]
    let iterator = pairs.par_iter();

    Ok(iterator
        .map(|&pair| (pair, evaluate_box_pair(function, &cells, pair)))
        .collect())
}

/// All-atom reference evaluation that ignores the decomposition.
pub fn calculate_naive(function: &CljFunction, boxes: &CljBoxes) -> Result<CljEnergy, EngineError> {
    let atoms = boxes.all_records()?;
    Ok(function.calculate(&atoms))
}

/// Evaluates every function and sums their energies.
pub fn calculate_all(
    functions: &[CljFunction],
    boxes: &CljBoxes,
) -> Result<EnergyBreakdown, EngineError> {
    let mut breakdown = EnergyBreakdown::default();
    for function in functions {
        let energy = calculate(function, boxes)?;
        breakdown.per_function.push((function.kind(), energy));
        breakdown.total += energy;
    }
    Ok(breakdown)
}

fn evaluate_box_pair(
    function: &CljFunction,
    cells: &BTreeMap<CellIndex, Vec<AtomRecord>>,
    pair: BoxPair,
) -> CljEnergy {
    let atoms_of = |cell: CellIndex| cells.get(&cell).map_or([].as_slice(), |v| v.as_slice());
    match pair {
        BoxPair::Within(cell) => function.calculate(atoms_of(cell)),
        BoxPair::Between(a, b) => function.calculate_pair(atoms_of(a), atoms_of(b)),
    }
}
