use std::fs;
use std::path::{Path, PathBuf};

use abridge_engine::layout::{DataLayout, CONDENSED_SUFFIX};
use tracing::info;

use crate::error::AnalysisError;

/// Which chapter corpus an analysis run reads from.
///
/// Condensed chapters are preferred when they exist because the surface
/// statistics then describe the text the reader would actually receive.
/// Raw chapters are a valid fallback so analysis can run before any
/// condensation has happened.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceKind {
    Raw,
    Condensed,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Raw => "raw",
            SourceKind::Condensed => "condensed",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            SourceKind::Raw => ".txt",
            SourceKind::Condensed => CONDENSED_SUFFIX,
        }
    }
}

/// Caller preference for the chapter source. `Auto` takes condensed
/// chapters when present and falls back to raw.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SourcePreference {
    #[default]
    Auto,
    Raw,
    Condensed,
}

/// A resolved chapter source directory.
#[derive(Clone, Debug)]
pub struct ChapterSource {
    pub kind: SourceKind,
    pub dir: PathBuf,
}

impl ChapterSource {
    /// Load all chapter texts in deterministic filename order.
    ///
    /// Returns `(chapter_id, text)` pairs where the id is the filename with
    /// the source suffix stripped ("chapter_001.condensed.txt" becomes
    /// "chapter_001").
    pub fn load_chapters(&self) -> Result<Vec<(String, String)>, AnalysisError> {
        let files = chapter_files(&self.dir, self.kind)?;
        if files.is_empty() {
            return Err(AnalysisError::NoChapters(self.dir.clone()));
        }

        let mut chapters = Vec::with_capacity(files.len());
        for file in files {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let id = name
                .strip_suffix(self.kind.suffix())
                .unwrap_or(name)
                .to_owned();
            let text = fs::read_to_string(&file)?;
            chapters.push((id, text));
        }
        Ok(chapters)
    }
}

/// Resolve the chapter source for a novel.
///
/// An explicit preference is a hard requirement: if the preferred corpus is
/// missing the run fails rather than silently analyzing the other one.
pub fn select_source(
    layout: &DataLayout,
    novel: &str,
    preference: SourcePreference,
) -> Result<ChapterSource, AnalysisError> {
    let raw_dir = layout.raw_dir(novel);
    let condensed_dir = layout.chapters_dir(novel);

    let raw_available = has_chapters(&raw_dir, SourceKind::Raw);
    let condensed_available = has_chapters(&condensed_dir, SourceKind::Condensed);

    let source = match preference {
        SourcePreference::Raw => {
            if !raw_available {
                return Err(AnalysisError::SourceUnavailable(raw_dir));
            }
            ChapterSource {
                kind: SourceKind::Raw,
                dir: raw_dir,
            }
        }
        SourcePreference::Condensed => {
            if !condensed_available {
                return Err(AnalysisError::SourceUnavailable(condensed_dir));
            }
            ChapterSource {
                kind: SourceKind::Condensed,
                dir: condensed_dir,
            }
        }
        SourcePreference::Auto => {
            if condensed_available {
                ChapterSource {
                    kind: SourceKind::Condensed,
                    dir: condensed_dir,
                }
            } else if raw_available {
                ChapterSource {
                    kind: SourceKind::Raw,
                    dir: raw_dir,
                }
            } else {
                return Err(AnalysisError::NoSource {
                    raw: raw_dir,
                    condensed: condensed_dir,
                });
            }
        }
    };

    info!(
        source = source.kind.as_str(),
        dir = %source.dir.display(),
        "chapter source selected"
    );
    Ok(source)
}

fn has_chapters(dir: &Path, kind: SourceKind) -> bool {
    match chapter_files(dir, kind) {
        Ok(files) => !files.is_empty(),
        Err(_) => false,
    }
}

fn chapter_files(dir: &Path, kind: SourceKind) -> Result<Vec<PathBuf>, AnalysisError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let matches = match kind {
            SourceKind::Condensed => name.ends_with(CONDENSED_SUFFIX),
            SourceKind::Raw => name.ends_with(".txt") && !name.ends_with(CONDENSED_SUFFIX),
        };
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
