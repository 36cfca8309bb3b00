use std::collections::BTreeMap;

use abridge_core::unit::UnitId;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::UnitStore;

/// In-memory unit store with the same write-once semantics as the
/// filesystem backend. Test double for engine and pipeline tests.
#[derive(Default)]
pub struct MemoryUnitStore {
    units: RwLock<BTreeMap<UnitId, String>>,
}

impl MemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of complete units. Test convenience.
    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.read().is_empty()
    }
}

impl UnitStore for MemoryUnitStore {
    fn exists(&self, id: &UnitId) -> Result<bool, StoreError> {
        Ok(self.units.read().get(id).is_some_and(|t| !t.is_empty()))
    }

    fn read(&self, id: &UnitId) -> Result<String, StoreError> {
        let units = self.units.read();
        let text = units
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("unit {id}")))?;
        if text.is_empty() {
            return Err(StoreError::Corrupt(format!("unit {id} is empty")));
        }
        Ok(text.clone())
    }

    fn write_once(&self, id: &UnitId, text: &str) -> Result<(), StoreError> {
        let mut units = self.units.write();
        match units.get(id) {
            Some(existing) if !existing.is_empty() => {
                Err(StoreError::Conflict(format!("unit {id} already exists")))
            }
            // Empty entry is corrupt, replace it.
            _ => {
                units.insert(id.clone(), text.to_string());
                Ok(())
            }
        }
    }

    fn list(&self) -> Result<Vec<UnitId>, StoreError> {
        Ok(self
            .units
            .read()
            .iter()
            .filter(|(_, t)| !t.is_empty())
            .map(|(id, _)| id.clone())
            .collect())
    }
}
