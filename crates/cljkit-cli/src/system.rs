use crate::config::{AppConfig, GridSetup};
use crate::error::{CliError, Result};
use anyhow::Context;
use cljkit::core::forcefield::function::CljFunction;
use cljkit::core::models::atom::LjParameter;
use cljkit::core::models::collection::{AtomCollection, AtomCollectionBuilder};
use cljkit::core::models::connectivity::{Connectivity, ExclusionTable, PairScale};
use cljkit::core::models::ids::GroupId;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// One line of an atom table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRow {
    pub group: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub charge: f64,
    pub sigma: f64,
    pub epsilon: f64,
}

/// One line of a bond table. Atom indices count from zero within the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BondRow {
    pub group: u32,
    pub atom1: usize,
    pub atom2: usize,
}

/// Everything a command needs to evaluate a system.
#[derive(Debug)]
pub struct LoadedSystem {
    /// Groups that are placed in the box index.
    pub mobile: Vec<AtomCollection>,
    pub functions: Vec<CljFunction>,
}

impl LoadedSystem {
    pub fn atom_count(&self) -> usize {
        self.mobile.iter().map(|c| c.len()).sum()
    }
}

pub fn load(config: &AppConfig) -> Result<LoadedSystem> {
    let collections = read_atoms(&config.atoms_path)?;
    info!(
        groups = collections.len(),
        path = %config.atoms_path.display(),
        "Loaded atom table."
    );

    let exclusions = match &config.bonds_path {
        Some(path) => read_exclusions(path, &collections, config.scale_14)?,
        None => HashMap::new(),
    };

    let (mobile, fixed) = split_fixed(collections, config.grid.as_ref())?;

    let mut functions = vec![
        CljFunction::shift(config.clj).map_err(|e| CliError::Config(e.to_string()))?,
        CljFunction::intra_shift(config.clj, exclusions)
            .map_err(|e| CliError::Config(e.to_string()))?,
    ];
    if let Some(grid) = &config.grid {
        let fixed_atoms: Vec<_> = fixed.iter().flat_map(|c| c.atoms().to_vec()).collect();
        info!(
            fixed_atoms = fixed_atoms.len(),
            "Building grid potential for fixed groups."
        );
        functions.push(
            CljFunction::grid(config.clj, &fixed_atoms, grid.spec)
                .map_err(|e| CliError::Config(e.to_string()))?,
        );
    }

    Ok(LoadedSystem { mobile, functions })
}

pub fn read_atoms(path: &Path) -> Result<Vec<AtomCollection>> {
    let parse_error = CliError::table(path);

    let mut reader = csv::Reader::from_path(path).map_err(|e| parse_error(e.into()))?;
    let mut builders: BTreeMap<u32, AtomCollectionBuilder> = BTreeMap::new();
    for (line, result) in reader.deserialize::<AtomRow>().enumerate() {
        let row = result.map_err(|e| parse_error(e.into()))?;
        builders
            .entry(row.group)
            .or_insert_with(|| AtomCollectionBuilder::new(GroupId(row.group)))
            .push_atom(
                Point3::new(row.x, row.y, row.z),
                row.charge,
                LjParameter::sigma_epsilon(row.sigma, row.epsilon),
            );
        debug!(line, group = row.group, "Read atom row.");
    }

    builders
        .into_values()
        .map(|builder| {
            builder
                .build()
                .map_err(|e| parse_error(anyhow::Error::new(e)))
        })
        .collect()
}

pub fn read_exclusions(
    path: &Path,
    collections: &[AtomCollection],
    scale_14: PairScale,
) -> Result<HashMap<GroupId, Arc<ExclusionTable>>> {
    let parse_error = CliError::table(path);

    let mut graphs: HashMap<GroupId, Connectivity> = HashMap::new();
    let mut reader = csv::Reader::from_path(path).map_err(|e| parse_error(e.into()))?;
    for result in reader.deserialize::<BondRow>() {
        let row = result.map_err(|e| parse_error(e.into()))?;
        let group = GroupId(row.group);
        let n_atoms = collections
            .iter()
            .find(|c| c.group() == group)
            .map(|c| c.len())
            .ok_or_else(|| parse_error(anyhow::anyhow!("bond references unknown {}", group)))?;
        graphs
            .entry(group)
            .or_insert_with(|| Connectivity::new(n_atoms))
            .add_bond(row.atom1, row.atom2)
            .with_context(|| format!("invalid bond in {}", group))
            .map_err(&parse_error)?;
    }

    Ok(graphs
        .into_iter()
        .map(|(group, graph)| (group, Arc::new(graph.exclusions(scale_14))))
        .collect())
}

pub fn write_atoms(path: &Path, collections: &[AtomCollection]) -> Result<()> {
    let write_error = CliError::table(path);

    let mut writer = csv::Writer::from_path(path).map_err(|e| write_error(e.into()))?;
    for collection in collections {
        for atom in collection.atoms() {
            let (sigma, epsilon) = atom.lj().as_sigma_epsilon().unwrap_or((0.0, 0.0));
            let position = atom.position();
            writer
                .serialize(AtomRow {
                    group: collection.group().0,
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    charge: atom.charge(),
                    sigma,
                    epsilon,
                })
                .map_err(|e| write_error(e.into()))?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn split_fixed(
    collections: Vec<AtomCollection>,
    grid: Option<&GridSetup>,
) -> Result<(Vec<AtomCollection>, Vec<AtomCollection>)> {
    let Some(grid) = grid else {
        return Ok((collections, Vec::new()));
    };
    if let Some(missing) = grid
        .fixed_groups
        .iter()
        .find(|g| !collections.iter().any(|c| c.group() == **g))
    {
        return Err(CliError::Config(format!(
            "grid fixed group {} is not present in the atom table",
            missing
        )));
    }
    Ok(collections
        .into_iter()
        .partition(|c| !grid.fixed_groups.contains(&c.group())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cljkit::core::forcefield::grid::GridSpec;
    use cljkit::core::forcefield::params::CljConfig;
    use cljkit::core::models::space::Space;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const ATOMS: &str = "\
group,x,y,z,charge,sigma,epsilon
1,0.0,0.0,0.0,-0.834,3.15061,0.1521
1,0.9572,0.0,0.0,0.417,0.0,0.0
1,-0.24,0.927,0.0,0.417,0.0,0.0
0,5.0,5.0,5.0,1.0,3.0,0.1
2,8.0,0.0,0.0,0.0,3.5,0.2
";

    fn app_config(atoms_path: PathBuf, bonds_path: Option<PathBuf>) -> AppConfig {
        AppConfig {
            atoms_path,
            bonds_path,
            clj: CljConfig::new(10.0, 10.0, Space::Vacuum),
            scale_14: PairScale::new(0.5, 0.5),
            grid: None,
            sampling: Default::default(),
        }
    }

    #[test]
    fn atoms_are_grouped_in_ascending_group_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atoms.csv");
        fs::write(&path, ATOMS).unwrap();

        let collections = read_atoms(&path).unwrap();
        assert_eq!(collections.len(), 3);
        assert_eq!(collections[0].group(), GroupId(0));
        assert_eq!(collections[1].group(), GroupId(1));
        assert_eq!(collections[1].len(), 3);
        assert_eq!(collections[1][1].charge(), 0.417);
        assert!(!collections[1][1].lj().is_active());
    }

    #[test]
    fn non_finite_coordinates_are_reported_with_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atoms.csv");
        fs::write(&path, "group,x,y,z,charge,sigma,epsilon\n0,NaN,0,0,0,0,0\n").unwrap();

        match read_atoms(&path) {
            Err(CliError::Table { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a parsing error, got {other:?}"),
        }
    }

    #[test]
    fn bonds_become_exclusion_tables() {
        let dir = tempdir().unwrap();
        let atoms = dir.path().join("atoms.csv");
        let bonds = dir.path().join("bonds.csv");
        fs::write(&atoms, ATOMS).unwrap();
        fs::write(&bonds, "group,atom1,atom2\n1,0,1\n1,0,2\n").unwrap();

        let collections = read_atoms(&atoms).unwrap();
        let tables = read_exclusions(&bonds, &collections, PairScale::new(0.5, 0.5)).unwrap();
        let table = &tables[&GroupId(1)];
        assert_eq!(table.scale(0, 1), PairScale::EXCLUDED);
        assert_eq!(table.scale(1, 2), PairScale::EXCLUDED);
    }

    #[test]
    fn bond_to_unknown_group_is_rejected() {
        let dir = tempdir().unwrap();
        let atoms = dir.path().join("atoms.csv");
        let bonds = dir.path().join("bonds.csv");
        fs::write(&atoms, ATOMS).unwrap();
        fs::write(&bonds, "group,atom1,atom2\n9,0,1\n").unwrap();

        let collections = read_atoms(&atoms).unwrap();
        assert!(matches!(
            read_exclusions(&bonds, &collections, PairScale::FULL),
            Err(CliError::Table { .. })
        ));
    }

    #[test]
    fn load_without_grid_builds_shift_and_intra_functions() {
        let dir = tempdir().unwrap();
        let atoms = dir.path().join("atoms.csv");
        fs::write(&atoms, ATOMS).unwrap();

        let system = load(&app_config(atoms, None)).unwrap();
        assert_eq!(system.mobile.len(), 3);
        assert_eq!(system.atom_count(), 5);
        assert_eq!(system.functions.len(), 2);
    }

    #[test]
    fn grid_groups_are_removed_from_the_mobile_set() {
        let dir = tempdir().unwrap();
        let atoms = dir.path().join("atoms.csv");
        fs::write(&atoms, ATOMS).unwrap();

        let mut config = app_config(atoms, None);
        config.grid = Some(GridSetup {
            fixed_groups: vec![GroupId(0)],
            spec: GridSpec {
                region_min: Point3::new(-5.0, -5.0, -5.0),
                region_max: Point3::new(10.0, 10.0, 10.0),
                spacing: 1.0,
                buffer: 10.0,
            },
        });
        let system = load(&config).unwrap();
        assert_eq!(system.mobile.len(), 2);
        assert!(system.mobile.iter().all(|c| c.group() != GroupId(0)));
        assert_eq!(system.functions.len(), 3);
    }

    #[test]
    fn written_tables_can_be_read_back() {
        let dir = tempdir().unwrap();
        let atoms = dir.path().join("atoms.csv");
        let out = dir.path().join("out.csv");
        fs::write(&atoms, ATOMS).unwrap();

        let collections = read_atoms(&atoms).unwrap();
        write_atoms(&out, &collections).unwrap();
        let reread = read_atoms(&out).unwrap();
        for (a, b) in collections.iter().zip(&reread) {
            assert_eq!(a.atoms(), b.atoms());
        }
    }
}
