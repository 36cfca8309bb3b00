//! Genre and tag resolution.
//!
//! Deterministic rule evaluation over the upstream surface artifacts.
//! Confidence scores are evidence accumulators, not probabilities: low
//! confidence means "insufficient evidence", never "definitely not".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dict::{
    display_name, Condition, Rule, GENRE_RULES, GENRE_RULE_VERSION, GENRE_TAXONOMY,
    GENRE_TAXONOMY_VERSION, TaxonomyEntry, TAG_RULES, TAG_RULE_VERSION, TAG_TAXONOMY,
    TAG_TAXONOMY_VERSION,
};
use crate::keywords::EventKeywordMap;
use crate::relationships::RelationshipMatrix;
use crate::round4;
use crate::salience::SalienceIndex;

/// Entries below this confidence are dropped from the artifact.
pub const CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Persistence floor used when reporting pair evidence.
const EVIDENCE_PAIR_PERSISTENCE: f64 = 0.5;

/// The evidence items that actually contributed to one resolution.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RuleEvidence {
    pub event_keywords: Vec<String>,
    pub event_categories: Vec<String>,
    pub keyword_spreads: BTreeMap<String, usize>,
    pub keyword_densities: BTreeMap<String, f64>,
    pub genres_present: Vec<String>,
    pub salient_characters: usize,
    pub persistent_pairs: usize,
    pub penalties_applied: Vec<String>,
}

/// Scoring breakdown kept alongside the confidence for auditability.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScoreBreakdown {
    pub base_score: f64,
    pub boosts_applied: f64,
    pub penalties_applied: f64,
}

/// One resolved genre or tag above the confidence threshold.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResolvedEntry {
    pub display_name: String,
    pub confidence: f64,
    pub evidence: RuleEvidence,
    pub scoring: ScoreBreakdown,
}

/// Resolution artifact for one feature (genres or tags).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResolvedMap {
    pub novel_name: String,
    pub run_id: String,
    pub taxonomy_version: String,
    pub rule_version: String,
    pub confidence_threshold: f64,
    pub total_evaluated: usize,
    pub above_threshold: usize,
    /// Keyed by taxonomy id; only entries above the threshold.
    pub entries: BTreeMap<String, ResolvedEntry>,
    /// Which upstream artifacts were available during resolution.
    pub input_artifacts: BTreeMap<String, bool>,
    pub warnings: Vec<String>,
}

impl ResolvedMap {
    pub fn confidence_of(&self, id: &str) -> Option<f64> {
        self.entries.get(id).map(|e| e.confidence)
    }
}

fn default_warnings() -> Vec<String> {
    vec![
        "Confidence scores are NOT probabilities".to_owned(),
        "Multiple entries can have high confidence".to_owned(),
        "Low confidence means 'insufficient evidence', not absence".to_owned(),
        "These are statistical surface signals, not narrative interpretation".to_owned(),
    ]
}

/// Evaluates rules against whichever upstream artifacts are available.
/// A missing artifact simply fails every condition that reads it.
pub struct RuleEngine<'a> {
    keywords: Option<&'a EventKeywordMap>,
    salience: Option<&'a SalienceIndex>,
    relationships: Option<&'a RelationshipMatrix>,
    genres: Option<&'a ResolvedMap>,
}

impl<'a> RuleEngine<'a> {
    pub fn new(
        keywords: Option<&'a EventKeywordMap>,
        salience: Option<&'a SalienceIndex>,
        relationships: Option<&'a RelationshipMatrix>,
        genres: Option<&'a ResolvedMap>,
    ) -> Self {
        Self {
            keywords,
            salience,
            relationships,
            genres,
        }
    }

    fn keyword_present(&self, id: &str) -> bool {
        self.keywords
            .map(|k| k.keywords.contains_key(id))
            .unwrap_or(false)
    }

    fn category_present(&self, category: &str) -> bool {
        self.keywords
            .map(|k| k.categories_found.contains_key(category))
            .unwrap_or(false)
    }

    fn keyword_spread(&self, id: &str) -> usize {
        self.keywords
            .and_then(|k| k.keywords.get(id))
            .map(|s| s.narrative_spread)
            .unwrap_or(0)
    }

    fn keyword_density(&self, id: &str) -> f64 {
        self.keywords
            .and_then(|k| k.keywords.get(id))
            .map(|s| s.density)
            .unwrap_or(0.0)
    }

    fn category_count(&self, category: &str) -> usize {
        self.keywords
            .and_then(|k| k.categories_found.get(category))
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn salient_character_count(&self, min_salience: f64) -> usize {
        self.salience
            .map(|s| {
                s.characters
                    .iter()
                    .filter(|c| c.salience_score >= min_salience)
                    .count()
            })
            .unwrap_or(0)
    }

    fn persistent_pair_count(&self, min_persistence: f64) -> usize {
        self.relationships
            .map(|r| {
                r.pairs
                    .values()
                    .filter(|p| p.persistence_score >= min_persistence)
                    .count()
            })
            .unwrap_or(0)
    }

    fn check(&self, condition: &Condition) -> bool {
        match condition {
            Condition::KeywordPresent(ids) => ids.iter().any(|id| self.keyword_present(id)),
            Condition::CategoryPresent(categories) => {
                categories.iter().any(|c| self.category_present(c))
            }
            Condition::KeywordSpread {
                keyword,
                min_spread,
            } => self.keyword_spread(keyword) >= *min_spread,
            Condition::KeywordDensity {
                keyword,
                min_density,
            } => self.keyword_density(keyword) >= *min_density,
            Condition::CategoryCount {
                category,
                min_keywords,
            } => self.category_count(category) >= *min_keywords,
            Condition::SalientCharacterCount {
                min_count,
                min_salience,
            } => self.salient_character_count(*min_salience) >= *min_count,
            Condition::SalientPairPersistence { min_persistence } => {
                self.persistent_pair_count(*min_persistence) >= 1
            }
            Condition::HighPersistencePairCount {
                min_count,
                min_persistence,
            } => self.persistent_pair_count(*min_persistence) >= *min_count,
            Condition::GenrePresent(genre) => self
                .genres
                .map(|g| g.entries.contains_key(*genre))
                .unwrap_or(false),
            Condition::GenreConfidence {
                genre,
                min_confidence,
            } => self
                .genres
                .and_then(|g| g.confidence_of(genre))
                .map(|c| c >= *min_confidence)
                .unwrap_or(false),
        }
    }

    fn record_evidence(&self, condition: &Condition, evidence: &mut RuleEvidence) {
        match condition {
            Condition::KeywordPresent(ids) => {
                for id in ids.iter().filter(|id| self.keyword_present(id)) {
                    evidence.event_keywords.push((*id).to_owned());
                }
            }
            Condition::CategoryPresent(categories) => {
                for category in categories.iter().filter(|c| self.category_present(c)) {
                    evidence.event_categories.push((*category).to_owned());
                }
            }
            Condition::KeywordSpread { keyword, .. } => {
                evidence
                    .keyword_spreads
                    .insert((*keyword).to_owned(), self.keyword_spread(keyword));
            }
            Condition::KeywordDensity { keyword, .. } => {
                evidence
                    .keyword_densities
                    .insert((*keyword).to_owned(), self.keyword_density(keyword));
            }
            Condition::CategoryCount { category, .. } => {
                evidence.event_categories.push((*category).to_owned());
            }
            Condition::SalientCharacterCount { min_salience, .. } => {
                evidence.salient_characters = self.salient_character_count(*min_salience);
            }
            Condition::SalientPairPersistence { .. }
            | Condition::HighPersistencePairCount { .. } => {
                evidence.persistent_pairs = self.persistent_pair_count(EVIDENCE_PAIR_PERSISTENCE);
            }
            Condition::GenrePresent(genre) => {
                evidence.genres_present.push((*genre).to_owned());
            }
            Condition::GenreConfidence { genre, .. } => {
                evidence.genres_present.push((*genre).to_owned());
            }
        }
    }

    /// Evaluate one rule. Required conditions gate hard: any miss means
    /// confidence 0 with no boosts or penalties considered.
    pub fn evaluate(&self, id: &str, rule: &Rule, taxonomy: &[TaxonomyEntry]) -> RuleOutcome {
        let mut evidence = RuleEvidence::default();

        if !rule.required.iter().all(|c| self.check(c)) {
            return RuleOutcome {
                id: id.to_owned(),
                display_name: display_name(taxonomy, id),
                confidence: 0.0,
                required_met: false,
                base_score: rule.base_score,
                boosts_applied: 0.0,
                penalties_applied: 0.0,
                evidence,
            };
        }
        for condition in rule.required {
            self.record_evidence(condition, &mut evidence);
        }

        let mut boosts = 0.0;
        for (condition, score) in rule.boosts {
            if self.check(condition) {
                boosts += score;
                self.record_evidence(condition, &mut evidence);
            }
        }

        let mut penalties = 0.0;
        for (condition, score) in rule.penalties {
            if self.check(condition) {
                penalties += score;
                evidence.penalties_applied.push(format!("{condition:?}"));
            }
        }

        let confidence = (rule.base_score + boosts - penalties).clamp(0.0, 1.0);
        RuleOutcome {
            id: id.to_owned(),
            display_name: display_name(taxonomy, id),
            confidence: round4(confidence),
            required_met: true,
            base_score: rule.base_score,
            boosts_applied: round4(boosts),
            penalties_applied: round4(penalties),
            evidence,
        }
    }
}

/// Evaluation result for one rule, before threshold filtering.
#[derive(Clone, Debug)]
pub struct RuleOutcome {
    pub id: String,
    pub display_name: String,
    pub confidence: f64,
    pub required_met: bool,
    pub base_score: f64,
    pub boosts_applied: f64,
    pub penalties_applied: f64,
    pub evidence: RuleEvidence,
}

fn resolve(
    engine: &RuleEngine<'_>,
    rules: &[(&str, Rule)],
    taxonomy: &[TaxonomyEntry],
    mut map: ResolvedMap,
) -> ResolvedMap {
    map.total_evaluated = rules.len();
    for (id, rule) in rules {
        let outcome = engine.evaluate(id, rule, taxonomy);
        debug!(
            id = outcome.id,
            confidence = outcome.confidence,
            required_met = outcome.required_met,
            "rule evaluated"
        );
        if outcome.confidence >= map.confidence_threshold {
            map.entries.insert(
                outcome.id.clone(),
                ResolvedEntry {
                    display_name: outcome.display_name,
                    confidence: outcome.confidence,
                    evidence: outcome.evidence,
                    scoring: ScoreBreakdown {
                        base_score: outcome.base_score,
                        boosts_applied: outcome.boosts_applied,
                        penalties_applied: outcome.penalties_applied,
                    },
                },
            );
        }
    }
    map.above_threshold = map.entries.len();
    map
}

fn input_flags(
    keywords: Option<&EventKeywordMap>,
    salience: Option<&SalienceIndex>,
    relationships: Option<&RelationshipMatrix>,
    genres: Option<Option<&ResolvedMap>>,
) -> BTreeMap<String, bool> {
    let mut flags = BTreeMap::new();
    flags.insert("event_keywords".to_owned(), keywords.is_some());
    flags.insert("character_salience".to_owned(), salience.is_some());
    flags.insert("relationship_matrix".to_owned(), relationships.is_some());
    if let Some(genres) = genres {
        flags.insert("genre_resolved".to_owned(), genres.is_some());
    }
    flags
}

/// Resolve genres from the keyword, salience and relationship artifacts.
pub fn build_genre_resolved(
    novel: &str,
    run_id: &str,
    keywords: Option<&EventKeywordMap>,
    salience: Option<&SalienceIndex>,
    relationships: Option<&RelationshipMatrix>,
) -> ResolvedMap {
    let engine = RuleEngine::new(keywords, salience, relationships, None);
    let map = ResolvedMap {
        novel_name: novel.to_owned(),
        run_id: run_id.to_owned(),
        taxonomy_version: GENRE_TAXONOMY_VERSION.to_owned(),
        rule_version: GENRE_RULE_VERSION.to_owned(),
        confidence_threshold: CONFIDENCE_THRESHOLD,
        total_evaluated: 0,
        above_threshold: 0,
        entries: BTreeMap::new(),
        input_artifacts: input_flags(keywords, salience, relationships, None),
        warnings: default_warnings(),
    };
    resolve(&engine, GENRE_RULES, GENRE_TAXONOMY, map)
}

/// Resolve tags. Tag rules may reference resolved genres, so the genre
/// artifact is an optional fourth input.
pub fn build_tag_resolved(
    novel: &str,
    run_id: &str,
    keywords: Option<&EventKeywordMap>,
    salience: Option<&SalienceIndex>,
    relationships: Option<&RelationshipMatrix>,
    genres: Option<&ResolvedMap>,
) -> ResolvedMap {
    let engine = RuleEngine::new(keywords, salience, relationships, genres);
    let mut map = ResolvedMap {
        novel_name: novel.to_owned(),
        run_id: run_id.to_owned(),
        taxonomy_version: TAG_TAXONOMY_VERSION.to_owned(),
        rule_version: TAG_RULE_VERSION.to_owned(),
        confidence_threshold: CONFIDENCE_THRESHOLD,
        total_evaluated: 0,
        above_threshold: 0,
        entries: BTreeMap::new(),
        input_artifacts: input_flags(keywords, salience, relationships, Some(genres)),
        warnings: default_warnings(),
    };
    if keywords.is_none() {
        map.warnings
            .push("No event keyword data available, tag resolution is limited".to_owned());
    }
    if genres.is_none() {
        map.warnings
            .push("No genre data available, some tag rules are limited".to_owned());
    }
    resolve(&engine, TAG_RULES, TAG_TAXONOMY, map)
}
