//! Character salience scoring.
//!
//! Salience measures TEXTUAL DOMINANCE, not narrative importance: a
//! weighted combination of mention frequency, chapter coverage, sustained
//! presence, and co-occurrence with event keywords, normalized relative
//! to the most dominant name in the run.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::names::CharacterIndex;
use crate::round4;

pub const MENTION_WEIGHT: f64 = 0.4;
pub const COVERAGE_WEIGHT: f64 = 0.2;
pub const PERSISTENCE_WEIGHT: f64 = 0.2;
pub const EVENT_PARTICIPATION_WEIGHT: f64 = 0.2;

/// Characters linked to this many unique event keywords get the maximum
/// participation score.
pub const EVENT_PARTICIPATION_SATURATION: usize = 10;

static CHAPTER_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static pattern"));

/// Salience data for one character name.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SalienceEntry {
    pub name: String,
    // Raw metrics carried for auditability.
    pub mentions: usize,
    pub chapters_present: usize,
    pub first_seen_index: usize,
    pub last_seen_index: usize,
    // Dimension scores, each in [0, 1].
    pub mention_score: f64,
    pub coverage_score: f64,
    pub persistence_score: f64,
    pub event_participation_score: f64,
    /// Weighted combination, normalized to the run maximum.
    pub salience_score: f64,
    /// 1 = most salient in this run.
    pub rank: usize,
}

/// Weight configuration, recorded in the artifact for reproducibility.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SalienceWeights {
    pub mention: f64,
    pub coverage: f64,
    pub persistence: f64,
    pub event_participation: f64,
}

impl Default for SalienceWeights {
    fn default() -> Self {
        Self {
            mention: MENTION_WEIGHT,
            coverage: COVERAGE_WEIGHT,
            persistence: PERSISTENCE_WEIGHT,
            event_participation: EVENT_PARTICIPATION_WEIGHT,
        }
    }
}

/// Complete salience index for one run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SalienceIndex {
    pub novel_name: String,
    pub run_id: String,
    /// Run id of the character index this was derived from.
    pub source_index_run_id: String,
    pub total_chapters: usize,
    pub total_characters: usize,
    pub total_mentions: usize,
    pub weights: SalienceWeights,
    pub event_participation_saturation: usize,
    /// Sorted by rank.
    pub characters: Vec<SalienceEntry>,
    pub warnings: Vec<String>,
}

fn default_warnings() -> Vec<String> {
    vec![
        "Salience measures TEXTUAL DOMINANCE, not narrative importance".to_owned(),
        "High salience does NOT mean 'main character' or 'protagonist'".to_owned(),
        "Scores are relative within this novel/run only".to_owned(),
        "This is a measurement layer, not a literary judgment".to_owned(),
    ]
}

/// 0-based chapter index from an id like "chapter_007". Ids without a
/// number sort to the front.
pub(crate) fn parse_chapter_index(chapter_id: &str) -> usize {
    CHAPTER_INDEX
        .find(chapter_id)
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .map(|n| n.saturating_sub(1))
        .unwrap_or(0)
}

fn mention_score(mentions: usize, max_mentions: usize) -> f64 {
    if max_mentions == 0 {
        return 0.0;
    }
    mentions as f64 / max_mentions as f64
}

fn coverage_score(chapters_present: usize, total_chapters: usize) -> f64 {
    if total_chapters == 0 {
        return 0.0;
    }
    chapters_present as f64 / total_chapters as f64
}

/// Sustained presence: the fraction of the novel the name spans, damped
/// by how densely it fills that span. A name in chapters 1 and 100 of
/// 100 spans everything but fills almost none of it.
fn persistence_score(
    first_index: usize,
    last_index: usize,
    chapters_present: usize,
    total_chapters: usize,
) -> f64 {
    if total_chapters == 0 || chapters_present == 0 || last_index < first_index {
        return 0.0;
    }
    let span = last_index - first_index + 1;
    let span_ratio = span as f64 / total_chapters as f64;
    let density = chapters_present as f64 / span as f64;
    span_ratio * density
}

/// `min(unique_linked_keywords / saturation, 1)`. This is lexical
/// co-occurrence, not confirmed participation in anything.
fn event_participation_score(unique_keywords: usize) -> f64 {
    (unique_keywords as f64 / EVENT_PARTICIPATION_SATURATION as f64).min(1.0)
}

/// Build the salience index from a character surface index.
pub fn build_salience_index(index: &CharacterIndex, run_id: &str) -> SalienceIndex {
    let mut salience = SalienceIndex {
        novel_name: index.novel_name.clone(),
        run_id: run_id.to_owned(),
        source_index_run_id: index.run_id.clone(),
        total_chapters: 0,
        total_characters: 0,
        total_mentions: 0,
        weights: SalienceWeights::default(),
        event_participation_saturation: EVENT_PARTICIPATION_SATURATION,
        characters: Vec::new(),
        warnings: default_warnings(),
    };
    if index.characters.is_empty() {
        return salience;
    }

    let all_chapters: BTreeSet<&str> = index
        .characters
        .iter()
        .flat_map(|c| c.chapters_present.iter().map(String::as_str))
        .collect();
    let mut total_chapters = all_chapters.len();
    if total_chapters == 0 {
        // Fall back to the highest parsed chapter index.
        let max_index = index
            .characters
            .iter()
            .map(|c| parse_chapter_index(&c.first_seen))
            .max()
            .unwrap_or(0);
        total_chapters = (max_index + 1).max(1);
    }

    let max_mentions = index.characters.iter().map(|c| c.mentions).max().unwrap_or(0);

    let mut entries: Vec<SalienceEntry> = index
        .characters
        .iter()
        .map(|character| {
            let indices: Vec<usize> = character
                .chapters_present
                .iter()
                .map(|id| parse_chapter_index(id))
                .collect();
            let first_seen_index = indices
                .iter()
                .copied()
                .min()
                .unwrap_or_else(|| parse_chapter_index(&character.first_seen));
            let last_seen_index = indices.iter().copied().max().unwrap_or(first_seen_index);

            let mention = mention_score(character.mentions, max_mentions);
            let coverage = coverage_score(character.chapters_present.len(), total_chapters);
            let persistence = persistence_score(
                first_seen_index,
                last_seen_index,
                character.chapters_present.len(),
                total_chapters,
            );
            let linked = index
                .event_links
                .get(&character.name)
                .map(|links| links.len())
                .unwrap_or(0);
            let participation = event_participation_score(linked);

            let raw = mention * MENTION_WEIGHT
                + coverage * COVERAGE_WEIGHT
                + persistence * PERSISTENCE_WEIGHT
                + participation * EVENT_PARTICIPATION_WEIGHT;

            SalienceEntry {
                name: character.name.clone(),
                mentions: character.mentions,
                chapters_present: character.chapters_present.len(),
                first_seen_index,
                last_seen_index,
                mention_score: round4(mention),
                coverage_score: round4(coverage),
                persistence_score: round4(persistence),
                event_participation_score: round4(participation),
                salience_score: raw,
                rank: 0,
            }
        })
        .collect();

    // Normalize to the run maximum so the dominant name scores 1.0.
    let max_salience = entries
        .iter()
        .map(|e| e.salience_score)
        .fold(0.0_f64, f64::max);
    if max_salience > 0.0 {
        for entry in &mut entries {
            entry.salience_score = round4(entry.salience_score / max_salience);
        }
    }

    entries.sort_by(|a, b| {
        b.salience_score
            .partial_cmp(&a.salience_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    salience.total_chapters = total_chapters;
    salience.total_characters = entries.len();
    salience.total_mentions = index.characters.iter().map(|c| c.mentions).sum();
    salience.characters = entries;
    salience
}
