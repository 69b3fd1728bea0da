use crate::cli::EnergyArgs;
use crate::config;
use crate::error::Result;
use crate::system;
use crate::utils::progress::CliProgressHandler;
use cljkit::engine::progress::ProgressReporter;
use cljkit::workflows::{self, evaluate::EvaluationResult};
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    let result = evaluate(&args)?;

    println!(
        "System: {} atoms in {} groups",
        result.atom_count, result.group_count
    );
    for (kind, energy) in &result.energy.per_function {
        println!(
            "  {:<12} coulomb = {:>14.6}  lj = {:>14.6}  total = {:>14.6} kcal/mol",
            kind.name(),
            energy.coulomb,
            energy.lj,
            energy.total()
        );
    }
    let total = result.energy.total;
    println!(
        "✓ Total energy: {:.6} kcal/mol (coulomb {:.6}, lj {:.6})",
        total.total(),
        total.coulomb,
        total.lj
    );
    Ok(())
}

pub fn evaluate(args: &EnergyArgs) -> Result<EvaluationResult> {
    info!("Building configuration from {:?}", &args.system.config);
    let app_config = config::build_config(&args.system)?;
    let loaded = system::load(&app_config)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the evaluation workflow...");
    let result = workflows::evaluate::run(&loaded.mobile, &loaded.functions, &reporter)?;
    Ok(result)
}
