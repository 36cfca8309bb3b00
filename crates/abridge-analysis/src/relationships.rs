//! Relationship signal matrix.
//!
//! Pairwise co-presence statistics between the salient names of a run.
//! Co-presence is shared chapter membership, nothing more: it indicates
//! proximity in the text, not a relationship between characters.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::names::CharacterIndex;
use crate::round4;
use crate::salience::{parse_chapter_index, SalienceIndex};

/// Names below this salience score are left out of the matrix.
pub const SALIENCE_THRESHOLD: f64 = 0.1;

/// Pairs sharing fewer chapters than this are dropped.
pub const MINIMUM_CO_PRESENCE: usize = 1;

const RATIO_WEIGHT: f64 = 0.4;
const SPAN_WEIGHT: f64 = 0.3;
const DENSITY_WEIGHT: f64 = 0.3;

/// Co-presence signals for one character pair. `character_a` and
/// `character_b` are in canonical (lexicographic) order.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PairSignal {
    pub character_a: String,
    pub character_b: String,
    /// Number of chapters both names appear in.
    pub co_presence_count: usize,
    pub character_a_coverage: usize,
    pub character_b_coverage: usize,
    /// Chapters where at least one of the pair appears.
    pub union_coverage: usize,
    pub first_co_presence_index: usize,
    pub last_co_presence_index: usize,
    /// Co-presence over the smaller individual coverage.
    pub co_presence_ratio: f64,
    pub jaccard_similarity: f64,
    /// Co-presence span over the whole novel.
    pub span_ratio: f64,
    /// Composite of ratio, span and in-span density, clamped to [0, 1].
    pub persistence_score: f64,
}

impl PairSignal {
    pub fn pair_key(&self) -> String {
        format!("{}|{}", self.character_a, self.character_b)
    }
}

/// Complete relationship signal matrix for one run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RelationshipMatrix {
    pub novel_name: String,
    pub run_id: String,
    pub source_index_run_id: String,
    pub source_salience_run_id: String,
    pub salience_threshold: f64,
    pub total_chapters: usize,
    pub total_characters_considered: usize,
    pub total_characters_excluded: usize,
    pub total_pairs: usize,
    /// Names excluded for low salience, alphabetical.
    pub excluded_characters: Vec<String>,
    /// Keyed "A|B" in canonical order.
    pub pairs: BTreeMap<String, PairSignal>,
    pub warnings: Vec<String>,
}

fn default_warnings() -> Vec<String> {
    vec![
        "Co-presence indicates textual proximity, not relationships".to_owned(),
        "Persistence is a positional composite, not relationship strength".to_owned(),
    ]
}

fn compute_pair_signal(
    name_a: &str,
    name_b: &str,
    chapters_a: &BTreeSet<&str>,
    chapters_b: &BTreeSet<&str>,
    total_chapters: usize,
) -> Option<PairSignal> {
    // Canonical order; swap the chapter sets along with the names.
    let (char_a, char_b, chapters_a, chapters_b) = if name_a <= name_b {
        (name_a, name_b, chapters_a, chapters_b)
    } else {
        (name_b, name_a, chapters_b, chapters_a)
    };

    let co_chapters: Vec<&str> = chapters_a.intersection(chapters_b).copied().collect();
    let co_count = co_chapters.len();
    if co_count < MINIMUM_CO_PRESENCE {
        return None;
    }

    let cov_a = chapters_a.len();
    let cov_b = chapters_b.len();
    let min_coverage = cov_a.min(cov_b);

    let co_ratio = if min_coverage == 0 {
        0.0
    } else {
        co_count as f64 / min_coverage as f64
    };
    let union = cov_a + cov_b - co_count;
    let jaccard = if union == 0 {
        0.0
    } else {
        co_count as f64 / union as f64
    };

    let indices: Vec<usize> = co_chapters.iter().map(|id| parse_chapter_index(id)).collect();
    let first_index = indices.iter().copied().min().unwrap_or(0);
    let last_index = indices.iter().copied().max().unwrap_or(first_index);
    let span = last_index - first_index + 1;
    let span_ratio = if total_chapters == 0 {
        0.0
    } else {
        span as f64 / total_chapters as f64
    };
    let density = co_count as f64 / span as f64;

    let persistence = (RATIO_WEIGHT * co_ratio + SPAN_WEIGHT * span_ratio + DENSITY_WEIGHT * density)
        .clamp(0.0, 1.0);

    Some(PairSignal {
        character_a: char_a.to_owned(),
        character_b: char_b.to_owned(),
        co_presence_count: co_count,
        character_a_coverage: cov_a,
        character_b_coverage: cov_b,
        union_coverage: union,
        first_co_presence_index: first_index,
        last_co_presence_index: last_index,
        co_presence_ratio: round4(co_ratio),
        jaccard_similarity: round4(jaccard),
        span_ratio: round4(span_ratio),
        persistence_score: round4(persistence),
    })
}

/// Build the relationship matrix from the surface index and salience
/// scores of the same corpus.
pub fn build_relationship_matrix(
    index: &CharacterIndex,
    salience: &SalienceIndex,
    run_id: &str,
) -> RelationshipMatrix {
    let chapters_by_name: BTreeMap<&str, BTreeSet<&str>> = index
        .characters
        .iter()
        .map(|c| {
            (
                c.name.as_str(),
                c.chapters_present.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let score_of = |name: &str| {
        salience
            .characters
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.salience_score)
            .unwrap_or(0.0)
    };

    let all_chapters: BTreeSet<&str> = chapters_by_name.values().flatten().copied().collect();
    let total_chapters = all_chapters.len().max(1);

    let mut included: Vec<&str> = Vec::new();
    let mut excluded: Vec<String> = Vec::new();
    for name in chapters_by_name.keys() {
        if score_of(name) >= SALIENCE_THRESHOLD {
            included.push(*name);
        } else {
            excluded.push((*name).to_owned());
        }
    }
    included.sort_by(|a, b| {
        score_of(b)
            .partial_cmp(&score_of(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.cmp(b))
    });
    excluded.sort();

    let mut pairs = BTreeMap::new();
    for (i, &name_a) in included.iter().enumerate() {
        for &name_b in &included[i + 1..] {
            let signal = compute_pair_signal(
                name_a,
                name_b,
                &chapters_by_name[name_a],
                &chapters_by_name[name_b],
                total_chapters,
            );
            if let Some(signal) = signal {
                pairs.insert(signal.pair_key(), signal);
            }
        }
    }

    RelationshipMatrix {
        novel_name: index.novel_name.clone(),
        run_id: run_id.to_owned(),
        source_index_run_id: index.run_id.clone(),
        source_salience_run_id: salience.run_id.clone(),
        salience_threshold: SALIENCE_THRESHOLD,
        total_chapters,
        total_characters_considered: included.len(),
        total_characters_excluded: excluded.len(),
        total_pairs: pairs.len(),
        excluded_characters: excluded,
        pairs,
        warnings: default_warnings(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::CharacterEntry;
    use crate::salience::build_salience_index;

    fn index_with(characters: Vec<CharacterEntry>) -> CharacterIndex {
        CharacterIndex {
            novel_name: "n".into(),
            run_id: "index-run".into(),
            extraction_method: "test".into(),
            total_unique_names: characters.len(),
            total_mentions: characters.iter().map(|c| c.mentions).sum(),
            characters,
            co_occurrences: BTreeMap::new(),
            event_links: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    fn entry(name: &str, mentions: usize, chapters: &[&str]) -> CharacterEntry {
        CharacterEntry {
            name: name.into(),
            mentions,
            first_seen: chapters.first().map(|s| (*s).to_owned()).unwrap_or_default(),
            chapters_present: chapters.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn matrix_for(characters: Vec<CharacterEntry>) -> RelationshipMatrix {
        let index = index_with(characters);
        let salience = build_salience_index(&index, "salience-run");
        build_relationship_matrix(&index, &salience, "matrix-run")
    }

    #[test]
    fn pair_signal_arithmetic() {
        let a: BTreeSet<&str> = ["chapter_001", "chapter_002", "chapter_003"].into();
        let b: BTreeSet<&str> = ["chapter_002", "chapter_003", "chapter_004"].into();
        let signal = compute_pair_signal("Li Qiye", "Mu Shuihan", &a, &b, 4).unwrap();

        assert_eq!(signal.co_presence_count, 2);
        assert_eq!(signal.union_coverage, 4);
        assert_eq!(signal.co_presence_ratio, 0.6667);
        assert_eq!(signal.jaccard_similarity, 0.5);
        // Shared chapters 2 and 3: indices 1..=2, span 2 of 4.
        assert_eq!(signal.first_co_presence_index, 1);
        assert_eq!(signal.last_co_presence_index, 2);
        assert_eq!(signal.span_ratio, 0.5);
        // 0.4 * 2/3 + 0.3 * 0.5 + 0.3 * 1.0
        assert_eq!(signal.persistence_score, 0.7167);
    }

    #[test]
    fn pair_order_is_canonical() {
        let a: BTreeSet<&str> = ["chapter_001"].into();
        let b: BTreeSet<&str> = ["chapter_001"].into();
        let signal = compute_pair_signal("Zhao Gao", "An Ying", &a, &b, 1).unwrap();
        assert_eq!(signal.character_a, "An Ying");
        assert_eq!(signal.character_b, "Zhao Gao");
        assert_eq!(signal.pair_key(), "An Ying|Zhao Gao");
    }

    #[test]
    fn disjoint_names_produce_no_pair() {
        let a: BTreeSet<&str> = ["chapter_001"].into();
        let b: BTreeSet<&str> = ["chapter_002"].into();
        assert!(compute_pair_signal("A", "B", &a, &b, 2).is_none());
    }

    #[test]
    fn low_salience_names_are_excluded() {
        let all: Vec<String> = (1..=10).map(|i| format!("chapter_{i:03}")).collect();
        let all_refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let matrix = matrix_for(vec![
            entry("Li Qiye", 500, &all_refs),
            entry("Mu Shuihan", 300, &all_refs[..5]),
            entry("Nameless Extra", 1, &all_refs[1..2]),
        ]);
        assert!(matrix.pairs.contains_key("Li Qiye|Mu Shuihan"));
        assert!(matrix
            .excluded_characters
            .contains(&"Nameless Extra".to_owned()));
        assert_eq!(matrix.total_characters_considered, 2);
    }

    #[test]
    fn matrix_records_its_sources() {
        let matrix = matrix_for(vec![
            entry("Li Qiye", 10, &["chapter_001"]),
            entry("Mu Shuihan", 8, &["chapter_001"]),
        ]);
        assert_eq!(matrix.source_index_run_id, "index-run");
        assert_eq!(matrix.source_salience_run_id, "salience-run");
        assert_eq!(matrix.run_id, "matrix-run");
    }
}
