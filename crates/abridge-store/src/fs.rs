use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use abridge_core::unit::UnitId;
use tracing::warn;

use crate::error::StoreError;
use crate::store::UnitStore;

/// Filesystem-backed unit store: one directory per (stage, corpus), one
/// file per unit, named `<id><suffix>`.
///
/// Writes go to a temp file in the same directory and are published with
/// `hard_link`, which fails if the final name already exists. That gives
/// both atomicity (a crash mid-write leaves only a temp file, never a
/// partial final file) and exclusive-create (the write-once invariant is
/// enforced by the filesystem, not merely assumed).
pub struct FsUnitStore {
    dir: PathBuf,
    suffix: String,
}

impl FsUnitStore {
    /// Open a store over `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            suffix: suffix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn unit_path(&self, id: &UnitId) -> PathBuf {
        self.dir.join(format!("{}{}", id.as_str(), self.suffix))
    }

    fn is_complete(path: &Path) -> bool {
        fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
    }
}

impl UnitStore for FsUnitStore {
    fn exists(&self, id: &UnitId) -> Result<bool, StoreError> {
        Ok(Self::is_complete(&self.unit_path(id)))
    }

    fn read(&self, id: &UnitId) -> Result<String, StoreError> {
        let path = self.unit_path(id);
        let text = fs::read_to_string(&path)
            .map_err(|_| StoreError::NotFound(format!("unit {id} at {}", path.display())))?;
        if text.is_empty() {
            return Err(StoreError::Corrupt(format!(
                "unit {id} is empty at {}",
                path.display()
            )));
        }
        Ok(text)
    }

    fn write_once(&self, id: &UnitId, text: &str) -> Result<(), StoreError> {
        let final_path = self.unit_path(id);

        // An empty final file is a corrupt leftover from an interrupted
        // legacy write, not a completed unit. Clear it so the unit can be
        // regenerated.
        if final_path.exists() && !Self::is_complete(&final_path) {
            warn!(unit = %id, path = %final_path.display(), "removing empty (corrupt) unit file");
            fs::remove_file(&final_path)?;
        }

        let tmp_path = self
            .dir
            .join(format!(".{}.tmp-{}", id.as_str(), uuid::Uuid::now_v7()));
        {
            let mut f = fs::File::create(&tmp_path)?;
            f.write_all(text.as_bytes())?;
            f.sync_all()?;
        }

        // hard_link fails with AlreadyExists if another writer won the race.
        let linked = fs::hard_link(&tmp_path, &final_path);
        let cleanup = fs::remove_file(&tmp_path);
        match linked {
            Ok(()) => {
                cleanup?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(StoreError::Conflict(
                format!("unit {id} already exists at {}", final_path.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<UnitId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(&self.suffix) else {
                continue;
            };
            if stem.is_empty() || !Self::is_complete(&entry.path()) {
                continue;
            }
            ids.push(UnitId::from_raw(stem));
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FsUnitStore {
        let dir = std::env::temp_dir().join(format!("abridge-store-test-{}", uuid::Uuid::now_v7()));
        FsUnitStore::open(dir, ".condensed.txt").unwrap()
    }

    #[test]
    fn write_then_read_roundtrip() {
        let store = temp_store();
        let id = UnitId::from_raw("chapter_001");
        store.write_once(&id, "condensed text").unwrap();
        assert!(store.exists(&id).unwrap());
        assert_eq!(store.read(&id).unwrap(), "condensed text");
    }

    #[test]
    fn missing_unit_not_found() {
        let store = temp_store();
        let id = UnitId::from_raw("chapter_404");
        assert!(!store.exists(&id).unwrap());
        assert!(matches!(store.read(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn second_write_conflicts() {
        let store = temp_store();
        let id = UnitId::from_raw("chapter_001");
        store.write_once(&id, "first").unwrap();
        let err = store.write_once(&id, "second").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        // Original content untouched.
        assert_eq!(store.read(&id).unwrap(), "first");
    }

    #[test]
    fn empty_file_counts_as_missing() {
        let store = temp_store();
        let id = UnitId::from_raw("chapter_002");
        let path = store.dir().join("chapter_002.condensed.txt");
        fs::write(&path, "").unwrap();

        assert!(!store.exists(&id).unwrap());
        // Regeneration over the corrupt leftover is allowed.
        store.write_once(&id, "regenerated").unwrap();
        assert_eq!(store.read(&id).unwrap(), "regenerated");
    }

    #[test]
    fn list_is_sorted_and_filtered() {
        let store = temp_store();
        store
            .write_once(&UnitId::from_raw("chapter_010"), "x")
            .unwrap();
        store
            .write_once(&UnitId::from_raw("chapter_002"), "y")
            .unwrap();
        // Unrelated file must be ignored.
        fs::write(store.dir().join("notes.md"), "ignore me").unwrap();

        let ids = store.list().unwrap();
        assert_eq!(
            ids,
            vec![
                UnitId::from_raw("chapter_002"),
                UnitId::from_raw("chapter_010"),
            ]
        );
    }

    #[test]
    fn no_temp_files_left_behind() {
        let store = temp_store();
        store
            .write_once(&UnitId::from_raw("chapter_001"), "text")
            .unwrap();
        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
