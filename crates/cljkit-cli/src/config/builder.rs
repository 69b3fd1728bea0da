use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileGridConfig, FileSamplingConfig};
use super::models::{AppConfig, GridSetup};
use crate::cli::{SampleArgs, SystemArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use cljkit::core::forcefield::grid::GridSpec;
use cljkit::core::models::connectivity::PairScale;
use cljkit::core::models::ids::GroupId;
use cljkit::engine::config::{CljConfigBuilder, SamplingConfig, SamplingConfigBuilder};
use nalgebra::Point3;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub fn build_config(args: &SystemArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_file(&args.config)?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    let base_dir = args
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let atoms_path = file_config
        .atoms
        .take()
        .map(|p| resolve_relative(&base_dir, p))
        .ok_or_else(|| CliError::Config("the system file must name an `atoms` table".to_string()))?;
    let bonds_path = file_config.bonds.take().map(|p| resolve_relative(&base_dir, p));

    let function = file_config.function.take().unwrap_or_default();
    let mut builder = CljConfigBuilder::new()
        .coulomb_cutoff(
            args.cutoff
                .or(function.coulomb_cutoff)
                .unwrap_or(defaults.coulomb_cutoff),
        )
        .lj_cutoff(args.cutoff.or(function.lj_cutoff).unwrap_or(defaults.lj_cutoff));
    if let Some(space) = function.space {
        builder = builder.space(space);
    }
    if let Some(switching) = function.switching {
        builder = builder.switching(switching);
    }
    if let Some(shift) = function.shift_electrostatics {
        builder = builder.shift_electrostatics(shift);
    }
    if let Some(rule) = function.combining_rule {
        builder = builder.combining_rule(rule);
    }
    let clj = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let exclusions = file_config.exclusions.take().unwrap_or_default();
    let scale_14 = PairScale::new(
        exclusions
            .scale_14_coulomb
            .unwrap_or(defaults.scale_14_coulomb),
        exclusions.scale_14_lj.unwrap_or(defaults.scale_14_lj),
    );

    let grid = file_config
        .grid
        .take()
        .map(|g| merge_grid(g, clj.lj_cutoff, &defaults))
        .transpose()?;

    Ok(AppConfig {
        atoms_path,
        bonds_path,
        clj,
        scale_14,
        grid,
        sampling: file_config.sampling.take().unwrap_or_default(),
    })
}

/// Resolves the Monte Carlo parameters: command line first, then the file, then defaults.
pub fn build_sampling_config(
    file_val: &FileSamplingConfig,
    args: &SampleArgs,
) -> Result<SamplingConfig> {
    let defaults = DefaultsConfig::default();
    let steps = args
        .steps
        .or(file_val.steps)
        .ok_or_else(|| CliError::Config("`sampling` requires `steps`".to_string()))?;

    let mut builder = SamplingConfigBuilder::new()
        .steps(steps)
        .temperature(
            args.temperature
                .or(file_val.temperature)
                .unwrap_or(defaults.temperature),
        );
    if let Some(seed) = args.seed.or(file_val.seed) {
        builder = builder.seed(seed);
    }
    if let Some(max) = file_val.max_translation {
        builder = builder.max_translation(max);
    }
    if let Some(max) = file_val.max_rotation {
        builder = builder.max_rotation(max);
    }
    if let Some(interval) = file_val.check_interval {
        builder = builder.check_interval(interval);
    }
    if let Some(tolerance) = file_val.drift_tolerance {
        builder = builder.drift_tolerance(tolerance);
    }
    if let Some(groups) = &file_val.groups {
        builder = builder.groups(groups.iter().copied().map(GroupId).collect());
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn resolve_relative(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn merge_grid(
    file_val: FileGridConfig,
    lj_cutoff: f64,
    defaults: &DefaultsConfig,
) -> Result<GridSetup> {
    let fixed_groups = file_val
        .fixed_groups
        .filter(|groups| !groups.is_empty())
        .ok_or_else(|| CliError::Config("`grid` requires non-empty `fixed-groups`".to_string()))?;
    let region_min = file_val
        .region_min
        .ok_or_else(|| CliError::Config("`grid` requires `region-min`".to_string()))?;
    let region_max = file_val
        .region_max
        .ok_or_else(|| CliError::Config("`grid` requires `region-max`".to_string()))?;

    Ok(GridSetup {
        fixed_groups: fixed_groups.into_iter().map(GroupId).collect(),
        spec: GridSpec {
            region_min: Point3::from(region_min),
            region_max: Point3::from(region_max),
            spacing: file_val.spacing.unwrap_or(defaults.grid_spacing),
            buffer: file_val.buffer.unwrap_or(lj_cutoff),
        },
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::parse_assignment(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "function.coulomb-cutoff" => {
                config
                    .function
                    .get_or_insert_with(Default::default)
                    .coulomb_cutoff = Some(parse_value(key, value, "float")?);
            }
            "function.lj-cutoff" => {
                config.function.get_or_insert_with(Default::default).lj_cutoff =
                    Some(parse_value(key, value, "float")?);
            }
            "function.shift-electrostatics" => {
                config
                    .function
                    .get_or_insert_with(Default::default)
                    .shift_electrostatics = Some(parse_value(key, value, "boolean")?);
            }
            "function.combining-rule" => {
                config
                    .function
                    .get_or_insert_with(Default::default)
                    .combining_rule = Some(value.parse().map_err(CliError::Config)?);
            }
            "exclusions.scale-14-coulomb" => {
                config
                    .exclusions
                    .get_or_insert_with(Default::default)
                    .scale_14_coulomb = Some(parse_value(key, value, "float")?);
            }
            "exclusions.scale-14-lj" => {
                config
                    .exclusions
                    .get_or_insert_with(Default::default)
                    .scale_14_lj = Some(parse_value(key, value, "float")?);
            }
            "grid.spacing" => {
                config.grid.get_or_insert_with(Default::default).spacing =
                    Some(parse_value(key, value, "float")?);
            }
            "grid.buffer" => {
                config.grid.get_or_insert_with(Default::default).buffer =
                    Some(parse_value(key, value, "float")?);
            }
            "sampling.steps" => {
                config.sampling.get_or_insert_with(Default::default).steps =
                    Some(parse_value(key, value, "integer")?);
            }
            "sampling.temperature" => {
                config.sampling.get_or_insert_with(Default::default).temperature =
                    Some(parse_value(key, value, "float")?);
            }
            "sampling.max-translation" => {
                config
                    .sampling
                    .get_or_insert_with(Default::default)
                    .max_translation = Some(parse_value(key, value, "float")?);
            }
            "sampling.max-rotation" => {
                config.sampling.get_or_insert_with(Default::default).max_rotation =
                    Some(parse_value(key, value, "float")?);
            }
            "sampling.seed" => {
                config.sampling.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value, "integer")?);
            }
            "sampling.check-interval" => {
                config
                    .sampling
                    .get_or_insert_with(Default::default)
                    .check_interval = Some(parse_value(key, value, "integer")?);
            }
            "sampling.drift-tolerance" => {
                config
                    .sampling
                    .get_or_insert_with(Default::default)
                    .drift_tolerance = Some(parse_value(key, value, "float")?);
            }
            "sampling.groups" => {
                let groups = parser::parse_group_list(value)
                    .map_err(|e| CliError::Config(e.to_string()))?;
                config.sampling.get_or_insert_with(Default::default).groups =
                    Some(groups.into_iter().map(|g| g.0).collect());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
