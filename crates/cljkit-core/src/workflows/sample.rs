use crate::core::forcefield::function::CljFunction;
use crate::core::models::collection::AtomCollection;
use crate::core::models::ids::GroupId;
use crate::engine::config::SamplingConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::shared::SharedBoxes;
use nalgebra::{Rotation3, Unit, Vector3};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;
use tracing::{debug, info, instrument, warn};

/// Boltzmann constant in kcal/(mol·K).
pub const BOLTZMANN_KCAL: f64 = 0.0019872041;

#[derive(Debug, Clone)]
pub struct SamplingResult {
    pub initial_energy: f64,
    pub final_energy: f64,
    pub steps: u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Largest difference seen between the running total and a full recalculation.
    pub max_drift: f64,
    pub collections: Vec<AtomCollection>,
}

impl SamplingResult {
    pub fn acceptance_ratio(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.accepted as f64 / self.steps as f64
        }
    }
}

/// Runs a rigid-body Metropolis Monte Carlo simulation over the groups in `boxes`.
///
/// Each step picks one group, proposes a random translation or rotation about its
/// centroid, prices it with a [`CljDelta`](crate::engine::delta::CljDelta) and commits
/// it on acceptance. Every `check_interval` steps the running total is compared against
/// a full recalculation and resynchronised.
#[instrument(skip_all, name = "sample_workflow")]
pub fn run(
    boxes: &SharedBoxes,
    functions: &[CljFunction],
    config: &SamplingConfig,
    reporter: &ProgressReporter,
) -> Result<SamplingResult, EngineError> {
    let candidates = movable_groups(boxes, config)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let kt = BOLTZMANN_KCAL * config.temperature;

    reporter.report(Progress::PhaseStart {
        name: "Initial Energy",
    });
    let initial_energy = boxes.calculate_all(functions)?.total.total();
    reporter.report(Progress::PhaseFinish);
    info!(
        initial_energy,
        groups = candidates.len(),
        steps = config.steps,
        temperature = config.temperature,
        "Starting Monte Carlo sampling."
    );

    let mut current_energy = initial_energy;
    let mut accepted = 0u64;
    let mut rejected = 0u64;
    let mut max_drift = 0.0f64;

    reporter.report(Progress::PhaseStart {
        name: "Monte Carlo Sampling",
    });
    reporter.report(Progress::TaskStart {
        total_steps: config.steps,
    });

    for step in 1..=config.steps {
        let group = candidates[rng.gen_range(0..candidates.len())];
        let current = boxes.group_collection(group)?;
        let proposed = propose_move(&current, config, &mut rng);

        let delta = boxes.delta(functions, proposed)?;
        let delta_e = delta.energy_change();

        if delta_e <= 0.0 || rng.r#gen::<f64>() < (-delta_e / kt).exp() {
            match boxes.commit(delta) {
                Ok(_) => {
                    current_energy += delta_e;
                    accepted += 1;
                }
                Err(EngineError::StaleDelta { .. }) => {
                    debug!(step, %group, "Move lost to a concurrent commit.");
                    rejected += 1;
                }
                Err(e) => return Err(e),
            }
        } else {
            rejected += 1;
        }

        if config.check_interval > 0 && step % config.check_interval == 0 {
            let recomputed = boxes.calculate_all(functions)?.total.total();
            let drift = (recomputed - current_energy).abs();
            max_drift = max_drift.max(drift);
            if drift > config.drift_tolerance {
                warn!(
                    step,
                    drift,
                    tolerance = config.drift_tolerance,
                    "Running energy drifted from full recalculation."
                );
            }
            current_energy = recomputed;
            reporter.report(Progress::SamplingStatus {
                step,
                energy: current_energy,
                acceptance: accepted as f64 / step as f64,
            });
        }

        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let collections = boxes
        .groups()
        .into_iter()
        .map(|group| boxes.group_collection(group))
        .collect::<Result<Vec<_>, _>>()?;

    let result = SamplingResult {
        initial_energy,
        final_energy: current_energy,
        steps: config.steps,
        accepted,
        rejected,
        max_drift,
        collections,
    };
    info!(
        final_energy = result.final_energy,
        acceptance = result.acceptance_ratio(),
        max_drift = result.max_drift,
        "Monte Carlo sampling finished."
    );
    Ok(result)
}

fn movable_groups(
    boxes: &SharedBoxes,
    config: &SamplingConfig,
) -> Result<Vec<GroupId>, EngineError> {
    let present = boxes.groups();
    let groups = match &config.groups {
        Some(requested) => {
            if let Some(missing) = requested.iter().find(|g| !present.contains(g)) {
                return Err(EngineError::UnknownGroup(*missing));
            }
            requested.clone()
        }
        None => present,
    };
    if groups.is_empty() {
        return Err(EngineError::Workflow {
            phase: "sampling",
            reason: "no groups available to move".to_string(),
        });
    }
    Ok(groups)
}

fn propose_move(
    current: &AtomCollection,
    config: &SamplingConfig,
    rng: &mut impl Rng,
) -> AtomCollection {
    if rng.gen_bool(0.5) {
        let max = config.max_translation;
        let displacement = Vector3::new(
            rng.gen_range(-max..=max),
            rng.gen_range(-max..=max),
            rng.gen_range(-max..=max),
        );
        current.translated(&displacement)
    } else {
        let z: f64 = rng.gen_range(-1.0..=1.0);
        let phi = rng.gen_range(0.0..TAU);
        let r = (1.0 - z * z).sqrt();
        let axis = Unit::new_normalize(Vector3::new(r * phi.cos(), r * phi.sin(), z));
        let max_angle = config.max_rotation.to_radians();
        let angle = rng.gen_range(-max_angle..=max_angle);
        current.rotated_about_centroid(&Rotation3::from_axis_angle(&axis, angle))
    }
}
