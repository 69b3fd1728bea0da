use crate::core::forcefield::function::CljFunction;
use crate::core::models::collection::AtomCollection;
use crate::engine::boxes::CljBoxes;
use crate::engine::calculator::{self, EnergyBreakdown};
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub energy: EnergyBreakdown,
    pub atom_count: usize,
    pub group_count: usize,
}

/// Builds an index holding `collections` with cells wide enough for every function.
///
/// All functions must share the same space.
pub fn build_boxes(
    collections: &[AtomCollection],
    functions: &[CljFunction],
) -> Result<CljBoxes, EngineError> {
    let first = functions.first().ok_or(ConfigError::MissingParameter("functions"))?;
    let space = first.config().space;
    if functions.iter().any(|f| f.config().space != space) {
        return Err(ConfigError::InvalidParameter {
            name: "space",
            reason: "all functions must use the same space".to_string(),
        }
        .into());
    }
    let cell_edge = functions
        .iter()
        .map(|f| f.config().max_cutoff())
        .fold(0.0, f64::max);

    let mut boxes = CljBoxes::new(space, cell_edge)?;
    for collection in collections {
        boxes.add(collection)?;
    }
    Ok(boxes)
}

#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(
    collections: &[AtomCollection],
    functions: &[CljFunction],
    reporter: &ProgressReporter,
) -> Result<EvaluationResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Building Box Index",
    });
    let boxes = build_boxes(collections, functions)?;
    info!(
        atoms = boxes.len(),
        groups = collections.len(),
        cell_edge = boxes.cell_edge(),
        "Box index ready."
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Evaluating Energy",
    });
    let energy = calculator::calculate_all(functions, &boxes)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        total = energy.total.total(),
        coulomb = energy.total.coulomb,
        lj = energy.total.lj,
        "Evaluation complete."
    );
    Ok(EvaluationResult {
        energy,
        atom_count: boxes.len(),
        group_count: collections.len(),
    })
}
