//! Event keyword surface map.
//!
//! Records where and how often dictionary keywords appear in the chapter
//! corpus. Keyword presence is lexical evidence, not narrative assertion:
//! the word "death" appearing does not mean someone died.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dict::{KEYWORD_DICTIONARY, KEYWORD_DICTIONARY_VERSION};
use crate::round4;

/// A keyword group compiled for matching. Case-insensitive and
/// word-boundary aware, so "war" does not match "warden".
pub(crate) struct CompiledKeyword {
    pub id: &'static str,
    pub category: &'static str,
    pub patterns: Vec<(Regex, &'static str)>,
}

pub(crate) static COMPILED_DICTIONARY: Lazy<Vec<CompiledKeyword>> = Lazy::new(|| {
    KEYWORD_DICTIONARY
        .iter()
        .map(|spec| CompiledKeyword {
            id: spec.id,
            category: spec.category,
            patterns: spec
                .terms
                .iter()
                .map(|term| {
                    let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
                    (Regex::new(&pattern).expect("static keyword pattern"), *term)
                })
                .collect(),
        })
        .collect()
});

/// Surface signal for one keyword group across the whole corpus.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KeywordSignal {
    pub keyword_id: String,
    pub category: String,
    /// Which dictionary terms were actually seen, sorted.
    pub matched_terms: Vec<String>,
    pub mentions: usize,
    pub first_seen_unit: usize,
    pub last_seen_unit: usize,
    /// `last_seen - first_seen + 1` chapters.
    pub narrative_spread: usize,
    /// `mentions / total_chapters`.
    pub density: f64,
    pub chapters_present: Vec<usize>,
    pub mentions_per_chapter: BTreeMap<usize, usize>,
}

/// Complete keyword surface map for one run. Only keywords with at least
/// one mention are carried.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventKeywordMap {
    pub novel_name: String,
    pub run_id: String,
    pub dictionary_version: String,
    pub total_chapters: usize,
    pub total_keywords_searched: usize,
    pub total_keywords_found: usize,
    pub total_mentions: usize,
    pub keywords: BTreeMap<String, KeywordSignal>,
    /// Category id to the sorted keyword ids found under it.
    pub categories_found: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<String>,
}

fn default_warnings() -> Vec<String> {
    vec![
        "Keyword presence does NOT confirm event occurrence".to_owned(),
        "High frequency does NOT indicate narrative importance".to_owned(),
        "This is lexical surface data, not story understanding".to_owned(),
        "Use for pattern detection, not plot summarization".to_owned(),
    ]
}

/// Count matches for every keyword group in one text.
///
/// Returns `keyword_id -> (count, matched terms)` for groups with at
/// least one match.
pub(crate) fn match_keywords(text: &str) -> BTreeMap<&'static str, (usize, Vec<&'static str>)> {
    let mut results = BTreeMap::new();
    for keyword in COMPILED_DICTIONARY.iter() {
        let mut count = 0;
        let mut terms = Vec::new();
        for (pattern, term) in &keyword.patterns {
            let matches = pattern.find_iter(text).count();
            if matches > 0 {
                count += matches;
                terms.push(*term);
            }
        }
        if count > 0 {
            results.insert(keyword.id, (count, terms));
        }
    }
    results
}

/// Build the keyword surface map over ordered `(chapter_id, text)` pairs.
pub fn build_event_keyword_map(
    chapters: &[(String, String)],
    novel: &str,
    run_id: &str,
) -> EventKeywordMap {
    let total_chapters = chapters.len();
    let mut signals: BTreeMap<String, KeywordSignal> = BTreeMap::new();

    for (index, (_, text)) in chapters.iter().enumerate() {
        for (keyword_id, (count, terms)) in match_keywords(text) {
            let category = COMPILED_DICTIONARY
                .iter()
                .find(|k| k.id == keyword_id)
                .map(|k| k.category)
                .unwrap_or("uncategorized");
            let signal = signals
                .entry(keyword_id.to_owned())
                .or_insert_with(|| KeywordSignal {
                    keyword_id: keyword_id.to_owned(),
                    category: category.to_owned(),
                    matched_terms: Vec::new(),
                    mentions: 0,
                    first_seen_unit: index,
                    last_seen_unit: index,
                    narrative_spread: 0,
                    density: 0.0,
                    chapters_present: Vec::new(),
                    mentions_per_chapter: BTreeMap::new(),
                });

            signal.mentions += count;
            signal.mentions_per_chapter.insert(index, count);
            signal.chapters_present.push(index);
            signal.last_seen_unit = index;
            for term in terms {
                if !signal.matched_terms.iter().any(|t| t == term) {
                    signal.matched_terms.push(term.to_owned());
                }
            }
        }
    }

    let mut categories_found: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut total_mentions = 0;
    for signal in signals.values_mut() {
        signal.narrative_spread = signal.last_seen_unit - signal.first_seen_unit + 1;
        signal.density = round4(signal.mentions as f64 / total_chapters.max(1) as f64);
        signal.matched_terms.sort();
        total_mentions += signal.mentions;
        categories_found
            .entry(signal.category.clone())
            .or_default()
            .push(signal.keyword_id.clone());
    }
    for ids in categories_found.values_mut() {
        ids.sort();
    }

    EventKeywordMap {
        novel_name: novel.to_owned(),
        run_id: run_id.to_owned(),
        dictionary_version: KEYWORD_DICTIONARY_VERSION.to_owned(),
        total_chapters,
        total_keywords_searched: KEYWORD_DICTIONARY.len(),
        total_keywords_found: signals.len(),
        total_mentions,
        keywords: signals,
        categories_found,
        warnings: default_warnings(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(texts: &[&str]) -> Vec<(String, String)> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| (format!("chapter_{:03}", i + 1), (*t).to_owned()))
            .collect()
    }

    #[test]
    fn matching_is_case_insensitive_and_boundary_aware() {
        let matches = match_keywords("The BATTLE raged. A warden watched the war.");
        let (count, terms) = &matches["action_violence"];
        // "warden" must not count as "war".
        assert_eq!(*count, 2);
        assert_eq!(terms, &["battle", "war"]);
    }

    #[test]
    fn multi_word_phrases_match() {
        let matches = match_keywords("He reached Foundation Establishment at last.");
        assert!(matches.contains_key("foundation_establishment"));
    }

    #[test]
    fn spread_and_density_cover_the_corpus() {
        let map = build_event_keyword_map(
            &chapters(&["a battle", "quiet teahouse", "quiet garden", "the war ends"]),
            "novel",
            "run",
        );
        let signal = &map.keywords["action_violence"];
        assert_eq!(signal.mentions, 2);
        assert_eq!(signal.first_seen_unit, 0);
        assert_eq!(signal.last_seen_unit, 3);
        assert_eq!(signal.narrative_spread, 4);
        assert_eq!(signal.density, 0.5);
        assert_eq!(signal.chapters_present, vec![0, 3]);
    }

    #[test]
    fn only_found_keywords_are_carried() {
        let map = build_event_keyword_map(&chapters(&["nothing notable here"]), "novel", "run");
        assert!(map.keywords.is_empty());
        assert_eq!(map.total_keywords_found, 0);
        assert_eq!(map.total_keywords_searched, KEYWORD_DICTIONARY.len());
    }

    #[test]
    fn categories_group_found_keyword_ids() {
        let map = build_event_keyword_map(
            &chapters(&["a battle near the imperial palace"]),
            "novel",
            "run",
        );
        assert_eq!(map.categories_found["action_signal"], vec!["action_violence"]);
        assert_eq!(
            map.categories_found["setting_ancient_china"],
            vec!["ancient_china_setting"]
        );
    }
}
