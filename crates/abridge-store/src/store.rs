use abridge_core::unit::UnitId;

use crate::error::StoreError;

/// Write-once key/value store for one stage's unit namespace.
///
/// The resume algorithm re-derives "what's done" from this interface on
/// every run, so the same logic works whether the backing is a directory
/// of files or an in-memory map. Invariants:
///
/// - A unit, once written, is never mutated or deleted by the pipeline.
/// - `write_once` on an existing id fails with `Conflict` instead of
///   overwriting; racing duplicate launches are rejected, not merged.
/// - `exists` means "complete": empty persisted content counts as corrupt,
///   not complete.
pub trait UnitStore: Send + Sync {
    /// Does a complete (non-empty) unit exist under this id?
    fn exists(&self, id: &UnitId) -> Result<bool, StoreError>;

    /// Read a unit's text. `NotFound` if absent, `Corrupt` if empty.
    fn read(&self, id: &UnitId) -> Result<String, StoreError>;

    /// Persist a unit exactly once. `Conflict` if the id already holds
    /// complete content.
    fn write_once(&self, id: &UnitId, text: &str) -> Result<(), StoreError>;

    /// All complete unit ids, sorted ascending.
    fn list(&self) -> Result<Vec<UnitId>, StoreError>;
}
