use crate::cli::SampleArgs;
use crate::config;
use crate::error::Result;
use crate::system;
use crate::utils::progress::CliProgressHandler;
use cljkit::engine::progress::ProgressReporter;
use cljkit::engine::shared::SharedBoxes;
use cljkit::workflows::{self, sample::SamplingResult};
use tracing::{info, warn};

pub fn run(args: SampleArgs) -> Result<()> {
    let result = sample(&args)?;

    println!(
        "Sampling complete: {} steps, {} accepted ({:.1}%)",
        result.steps,
        result.accepted,
        result.acceptance_ratio() * 100.0
    );
    println!(
        "  Energy: {:.6} -> {:.6} kcal/mol (max drift {:.3e})",
        result.initial_energy, result.final_energy, result.max_drift
    );
    println!("✓ Final coordinates written to: {}", args.output.display());
    Ok(())
}

pub fn sample(args: &SampleArgs) -> Result<SamplingResult> {
    info!("Building configuration from {:?}", &args.system.config);
    let app_config = config::build_config(&args.system)?;
    let sampling = config::build_sampling_config(&app_config.sampling, args)?;
    let loaded = system::load(&app_config)?;
    info!(
        atoms = loaded.atom_count(),
        steps = sampling.steps,
        temperature = sampling.temperature,
        "System loaded."
    );

    let boxes = SharedBoxes::new(workflows::evaluate::build_boxes(
        &loaded.mobile,
        &loaded.functions,
    )?);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the sampling workflow...");
    let result = workflows::sample::run(&boxes, &loaded.functions, &sampling, &reporter)?;
    if result.max_drift > sampling.drift_tolerance {
        warn!(
            max_drift = result.max_drift,
            "Running energy drifted beyond tolerance during sampling."
        );
    }

    info!("Writing final coordinates to {:?}", &args.output);
    system::write_atoms(&args.output, &result.collections)?;
    Ok(result)
}
