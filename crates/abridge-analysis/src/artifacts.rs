//! Analysis artifact persistence.
//!
//! Every feature writes one JSON file per run under
//! `data/<feature>/<novel>/<run_id>.<feature>.json`. Loaders prefer the
//! exact run's artifact when present and otherwise fall back to the
//! latest artifact for the novel.

use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use abridge_engine::layout::DataLayout;

use crate::error::AnalysisError;

fn artifact_name(run_id: &str, feature: &str) -> String {
    format!("{run_id}.{feature}.json")
}

/// Write one analysis artifact as pretty-printed JSON, creating the
/// feature directory if needed. Returns the written path.
pub fn write_artifact<T: Serialize>(
    layout: &DataLayout,
    feature: &str,
    novel: &str,
    run_id: &str,
    value: &T,
) -> Result<PathBuf, AnalysisError> {
    let dir = layout.analysis_dir(feature, novel);
    fs::create_dir_all(&dir)?;
    let path = dir.join(artifact_name(run_id, feature));
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(&path, json)?;
    info!(feature, novel, path = %path.display(), "artifact written");
    Ok(path)
}

/// Load one analysis artifact, preferring the exact run's file and
/// falling back to the lexically-latest one for the novel. Returns the
/// value together with the run id it came from.
pub fn load_artifact<T: DeserializeOwned>(
    layout: &DataLayout,
    feature: &str,
    novel: &str,
    run_id: &str,
) -> Result<(T, String), AnalysisError> {
    let dir = layout.analysis_dir(feature, novel);
    let exact = dir.join(artifact_name(run_id, feature));
    let (path, source_run) = if exact.is_file() {
        (exact, run_id.to_owned())
    } else {
        latest_artifact(&dir, feature).ok_or_else(|| AnalysisError::MissingArtifact {
            feature: feature.to_owned(),
            novel: novel.to_owned(),
        })?
    };
    let text = fs::read_to_string(path)?;
    Ok((serde_json::from_str(&text)?, source_run))
}

/// Run ids are UUIDv7, so lexical order is creation order and the last
/// filename is the newest artifact.
fn latest_artifact(dir: &std::path::Path, feature: &str) -> Option<(PathBuf, String)> {
    let suffix = format!(".{feature}.json");
    let entries = fs::read_dir(dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(&suffix) && !n.starts_with('.'))
        .collect();
    names.sort();
    let name = names.pop()?;
    let run = name.trim_end_matches(&suffix).to_owned();
    Some((dir.join(name), run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{build_event_keyword_map, EventKeywordMap};

    fn temp_layout() -> DataLayout {
        let dir = std::env::temp_dir().join(format!("abridge-artifacts-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        DataLayout::new(dir)
    }

    fn sample_map(run_id: &str) -> EventKeywordMap {
        let chapters = vec![("chapter_001".to_owned(), "a fierce battle".to_owned())];
        build_event_keyword_map(&chapters, "novel", run_id)
    }

    #[test]
    fn write_then_load_exact_run() {
        let layout = temp_layout();
        let map = sample_map("run-a");
        let path = write_artifact(&layout, "event_keywords", "novel", "run-a", &map).unwrap();
        assert!(path.ends_with("run-a.event_keywords.json"));

        let (loaded, source): (EventKeywordMap, String) =
            load_artifact(&layout, "event_keywords", "novel", "run-a").unwrap();
        assert_eq!(source, "run-a");
        assert_eq!(loaded.total_mentions, map.total_mentions);
    }

    #[test]
    fn load_falls_back_to_latest() {
        let layout = temp_layout();
        write_artifact(&layout, "event_keywords", "novel", "run-a", &sample_map("run-a")).unwrap();
        write_artifact(&layout, "event_keywords", "novel", "run-b", &sample_map("run-b")).unwrap();

        let (loaded, source): (EventKeywordMap, String) =
            load_artifact(&layout, "event_keywords", "novel", "run-z").unwrap();
        assert_eq!(source, "run-b");
        assert_eq!(loaded.run_id, "run-b");
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let layout = temp_layout();
        let result: Result<(EventKeywordMap, String), _> =
            load_artifact(&layout, "event_keywords", "absent", "run-a");
        assert!(matches!(
            result,
            Err(AnalysisError::MissingArtifact { .. })
        ));
    }
}
