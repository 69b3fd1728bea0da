use super::boxes::CljBoxes;
use super::calculator::{self, EnergyBreakdown};
use super::delta::CljDelta;
use super::error::EngineError;
use crate::core::forcefield::function::CljFunction;
use crate::core::forcefield::term::CljEnergy;
use crate::core::models::collection::AtomCollection;
use crate::core::models::ids::{AtomToken, GroupId};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A box index shared between threads.
///
/// Calculations and delta evaluations hold the read lock, so any number of them can run
/// against the same quiescent snapshot. Mutations hold the write lock. A delta evaluated
/// before another commit landed is refused with [`EngineError::StaleDelta`].
#[derive(Debug, Clone)]
pub struct SharedBoxes {
    inner: Arc<RwLock<CljBoxes>>,
}

impl SharedBoxes {
    pub fn new(boxes: CljBoxes) -> Self {
        Self {
            inner: Arc::new(RwLock::new(boxes)),
        }
    }

    /// Read access for queries not covered by the helpers below.
    pub fn read(&self) -> RwLockReadGuard<'_, CljBoxes> {
        self.inner.read()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation()
    }

    pub fn groups(&self) -> Vec<GroupId> {
        self.inner.read().groups().collect()
    }

    pub fn group_collection(&self, group: GroupId) -> Result<AtomCollection, EngineError> {
        self.inner.read().group_collection(group)
    }

    pub fn calculate(&self, function: &CljFunction) -> Result<CljEnergy, EngineError> {
        calculator::calculate(function, &self.inner.read())
    }

    pub fn calculate_all(&self, functions: &[CljFunction]) -> Result<EnergyBreakdown, EngineError> {
        calculator::calculate_all(functions, &self.inner.read())
    }

    pub fn delta(
        &self,
        functions: &[CljFunction],
        new: AtomCollection,
    ) -> Result<CljDelta, EngineError> {
        CljDelta::evaluate_many(functions, &self.inner.read(), new)
    }

    pub fn commit(&self, delta: CljDelta) -> Result<Vec<AtomToken>, EngineError> {
        self.inner.write().commit(delta)
    }

    pub fn add(&self, collection: &AtomCollection) -> Result<Vec<AtomToken>, EngineError> {
        self.inner.write().add(collection)
    }

    pub fn remove_group(&self, group: GroupId) -> Result<AtomCollection, EngineError> {
        self.inner.write().remove_group(group)
    }

    pub fn rebuild(&self) -> Result<BTreeMap<GroupId, Vec<AtomToken>>, EngineError> {
        self.inner.write().rebuild()
    }

    /// A private copy of the current index.
    pub fn snapshot(&self) -> CljBoxes {
        self.inner.read().clone()
    }
}
