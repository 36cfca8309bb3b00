//! Analysis pipeline orchestration.
//!
//! Runs the lexical features in dependency order over one chapter load.
//! Features are non-blocking relative to each other: a failed feature is
//! logged and skipped, and downstream features fall back to the latest
//! artifact on disk for the inputs they need.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};

use abridge_engine::layout::DataLayout;

use crate::artifacts::{load_artifact, write_artifact};
use crate::error::AnalysisError;
use crate::keywords::{build_event_keyword_map, EventKeywordMap};
use crate::names::{build_character_index, CharacterIndex};
use crate::relationships::{build_relationship_matrix, RelationshipMatrix};
use crate::resolver::{build_genre_resolved, build_tag_resolved, ResolvedMap};
use crate::salience::{build_salience_index, SalienceIndex};
use crate::source::{select_source, SourcePreference};

pub const CHARACTER_INDEX_FEATURE: &str = "character_index";
pub const SALIENCE_FEATURE: &str = "character_salience";
pub const RELATIONSHIPS_FEATURE: &str = "relationship_matrix";
pub const KEYWORDS_FEATURE: &str = "event_keywords";
pub const GENRES_FEATURE: &str = "genre_resolved";
pub const TAGS_FEATURE: &str = "tag_resolved";

/// Which features to run and which source to read.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnalysisFlags {
    pub source: SourcePreference,
    pub skip_character_index: bool,
    pub skip_salience: bool,
    pub skip_relationships: bool,
    pub skip_event_keywords: bool,
    pub skip_genres: bool,
    pub skip_tags: bool,
}

/// What one pipeline run produced: artifact paths per feature.
#[derive(Clone, Debug, Default)]
pub struct AnalysisReport {
    pub written: BTreeMap<String, PathBuf>,
    pub failed: Vec<String>,
}

impl AnalysisReport {
    fn record(&mut self, feature: &str, result: Result<PathBuf, AnalysisError>) {
        match result {
            Ok(path) => {
                self.written.insert(feature.to_owned(), path);
            }
            Err(err) => {
                warn!(feature, error = %err, "analysis feature failed");
                self.failed.push(feature.to_owned());
            }
        }
    }
}

/// Use a freshly-computed value when the feature ran this invocation,
/// otherwise fall back to the newest artifact on disk.
fn computed_or_loaded<T: serde::de::DeserializeOwned + Clone>(
    computed: &Option<T>,
    layout: &DataLayout,
    feature: &str,
    novel: &str,
    run_id: &str,
) -> Option<T> {
    if let Some(value) = computed {
        return Some(value.clone());
    }
    match load_artifact::<T>(layout, feature, novel, run_id) {
        Ok((value, source_run)) => {
            info!(feature, source_run, "loaded prior artifact");
            Some(value)
        }
        Err(_) => None,
    }
}

/// Run the analysis features for one novel under one run id.
pub fn run_analysis(
    layout: &DataLayout,
    novel: &str,
    run_id: &str,
    flags: AnalysisFlags,
) -> Result<AnalysisReport, AnalysisError> {
    let source = select_source(layout, novel, flags.source)?;
    let chapters = source.load_chapters()?;
    info!(
        novel,
        run_id,
        source = source.kind.as_str(),
        chapters = chapters.len(),
        "analysis pipeline starting"
    );

    let mut report = AnalysisReport::default();

    let mut index: Option<CharacterIndex> = None;
    if !flags.skip_character_index {
        let built = build_character_index(&chapters, novel, run_id);
        report.record(
            CHARACTER_INDEX_FEATURE,
            write_artifact(layout, CHARACTER_INDEX_FEATURE, novel, run_id, &built),
        );
        index = Some(built);
    }

    let mut salience: Option<SalienceIndex> = None;
    if !flags.skip_salience {
        match computed_or_loaded::<CharacterIndex>(
            &index,
            layout,
            CHARACTER_INDEX_FEATURE,
            novel,
            run_id,
        ) {
            Some(source_index) => {
                let built = build_salience_index(&source_index, run_id);
                report.record(
                    SALIENCE_FEATURE,
                    write_artifact(layout, SALIENCE_FEATURE, novel, run_id, &built),
                );
                salience = Some(built);
            }
            None => {
                warn!("no character index available, skipping salience");
                report.failed.push(SALIENCE_FEATURE.to_owned());
            }
        }
    }

    let mut relationships: Option<RelationshipMatrix> = None;
    if !flags.skip_relationships {
        let source_index = computed_or_loaded::<CharacterIndex>(
            &index,
            layout,
            CHARACTER_INDEX_FEATURE,
            novel,
            run_id,
        );
        let source_salience = computed_or_loaded::<SalienceIndex>(
            &salience,
            layout,
            SALIENCE_FEATURE,
            novel,
            run_id,
        );
        match (source_index, source_salience) {
            (Some(source_index), Some(source_salience)) => {
                let built = build_relationship_matrix(&source_index, &source_salience, run_id);
                report.record(
                    RELATIONSHIPS_FEATURE,
                    write_artifact(layout, RELATIONSHIPS_FEATURE, novel, run_id, &built),
                );
                relationships = Some(built);
            }
            _ => {
                warn!("missing index or salience, skipping relationship matrix");
                report.failed.push(RELATIONSHIPS_FEATURE.to_owned());
            }
        }
    }

    let mut keywords: Option<EventKeywordMap> = None;
    if !flags.skip_event_keywords {
        let built = build_event_keyword_map(&chapters, novel, run_id);
        report.record(
            KEYWORDS_FEATURE,
            write_artifact(layout, KEYWORDS_FEATURE, novel, run_id, &built),
        );
        keywords = Some(built);
    }

    let mut genres: Option<ResolvedMap> = None;
    if !flags.skip_genres {
        let keyword_input =
            computed_or_loaded::<EventKeywordMap>(&keywords, layout, KEYWORDS_FEATURE, novel, run_id);
        let built = build_genre_resolved(
            novel,
            run_id,
            keyword_input.as_ref(),
            salience.as_ref(),
            relationships.as_ref(),
        );
        report.record(
            GENRES_FEATURE,
            write_artifact(layout, GENRES_FEATURE, novel, run_id, &built),
        );
        genres = Some(built);
    }

    if !flags.skip_tags {
        let keyword_input =
            computed_or_loaded::<EventKeywordMap>(&keywords, layout, KEYWORDS_FEATURE, novel, run_id);
        let genre_input =
            computed_or_loaded::<ResolvedMap>(&genres, layout, GENRES_FEATURE, novel, run_id);
        let built = build_tag_resolved(
            novel,
            run_id,
            keyword_input.as_ref(),
            salience.as_ref(),
            relationships.as_ref(),
            genre_input.as_ref(),
        );
        report.record(
            TAGS_FEATURE,
            write_artifact(layout, TAGS_FEATURE, novel, run_id, &built),
        );
    }

    info!(
        novel,
        run_id,
        written = report.written.len(),
        failed = report.failed.len(),
        "analysis pipeline finished"
    );
    Ok(report)
}
