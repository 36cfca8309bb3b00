use std::fs;
use std::path::{Path, PathBuf};

use abridge_core::unit::UnitId;

use crate::error::EngineError;

/// Suffix shared by all condensed unit files.
pub const CONDENSED_SUFFIX: &str = ".condensed.txt";

/// Filenames of the novel stage's terminal artifacts.
pub const NOVEL_COMBINED_FILE: &str = "novel.condensed.txt";
pub const NOVEL_MANIFEST_FILE: &str = "novel.manifest.json";

/// Directory conventions under the data root. Stage orchestrators and
/// skip validation both resolve paths through this, so the layout lives
/// in exactly one place.
#[derive(Clone, Debug)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self, novel: &str) -> PathBuf {
        self.root.join("raw").join(novel)
    }

    pub fn chapters_dir(&self, novel: &str) -> PathBuf {
        self.root.join("chapters_condensed").join(novel)
    }

    pub fn arcs_dir(&self, novel: &str) -> PathBuf {
        self.root.join("arcs_condensed").join(novel)
    }

    pub fn novel_dir(&self, novel: &str) -> PathBuf {
        self.root.join("novel_condensed").join(novel)
    }

    pub fn analysis_dir(&self, feature: &str, novel: &str) -> PathBuf {
        self.root.join(feature).join(novel)
    }

    pub fn telemetry_db(&self) -> PathBuf {
        self.root.join("telemetry").join("abridge.db")
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new("data")
    }
}

/// Load the raw chapter corpus for a novel: every `.txt` file in the raw
/// directory, sorted by filename, identified by its stem. Order is
/// narrative chronology and is preserved everywhere downstream.
pub fn load_raw_chapters(raw_dir: &Path) -> Result<Vec<(UnitId, String)>, EngineError> {
    if !raw_dir.is_dir() {
        return Err(EngineError::CorpusNotFound(raw_dir.to_path_buf()));
    }

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(raw_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".txt") && !name.starts_with('.') && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();

    if names.is_empty() {
        return Err(EngineError::NoUnits(raw_dir.to_path_buf()));
    }

    let mut chapters = Vec::with_capacity(names.len());
    for name in names {
        let stem = name.trim_end_matches(".txt");
        let text = fs::read_to_string(raw_dir.join(&name))?;
        chapters.push((UnitId::from_raw(stem), text));
    }
    Ok(chapters)
}

/// Count `suffix`-named files in a directory; missing directory counts
/// as zero. Used by skip validation.
pub fn count_files(dir: &Path, suffix: &str) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.ends_with(suffix) && !name.starts_with('.')
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("abridge-layout-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn layout_paths_nest_under_root() {
        let layout = DataLayout::new("data");
        assert_eq!(layout.raw_dir("novel"), PathBuf::from("data/raw/novel"));
        assert_eq!(
            layout.arcs_dir("novel"),
            PathBuf::from("data/arcs_condensed/novel")
        );
    }

    #[test]
    fn raw_chapters_load_sorted_by_filename() {
        let dir = temp_dir();
        fs::write(dir.join("chapter_002.txt"), "two").unwrap();
        fs::write(dir.join("chapter_001.txt"), "one").unwrap();
        fs::write(dir.join("notes.md"), "ignored").unwrap();

        let chapters = load_raw_chapters(&dir).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].0.as_str(), "chapter_001");
        assert_eq!(chapters[0].1, "one");
        assert_eq!(chapters[1].0.as_str(), "chapter_002");
    }

    #[test]
    fn missing_corpus_directory_errors() {
        let dir = temp_dir().join("absent");
        assert!(matches!(
            load_raw_chapters(&dir),
            Err(EngineError::CorpusNotFound(_))
        ));
    }

    #[test]
    fn empty_corpus_errors() {
        let dir = temp_dir();
        assert!(matches!(
            load_raw_chapters(&dir),
            Err(EngineError::NoUnits(_))
        ));
    }

    #[test]
    fn count_files_ignores_missing_dir() {
        assert_eq!(count_files(Path::new("/nonexistent-abridge"), ".txt"), 0);
    }
}
