//! Character surface index.
//!
//! Conservative name extraction over capitalized word sequences. Each
//! distinct string is a separate entry: "Li Qiye" and "Young Master Li"
//! are different entries even when they refer to the same narrative
//! character. The index carries raw statistics only, no identity
//! resolution and no narrative meaning.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dict::{DISCOURSE_WORDS, EXCLUDED_WORDS};
use crate::keywords::match_keywords;

/// Single-word names below this mention count are treated as noise.
/// Multi-word names are always kept.
pub const MIN_SINGLE_WORD_MENTIONS: usize = 2;

/// Single-word names shorter than this are rejected outright.
pub const MIN_SINGLE_WORD_LEN: usize = 4;

/// Two names within this many sentences of each other co-occur.
pub const CO_OCCURRENCE_WINDOW: usize = 3;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\b").expect("static pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("static pattern"));

/// Surface data for one detected name string.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CharacterEntry {
    pub name: String,
    pub mentions: usize,
    /// Chapter id where the name first appeared.
    pub first_seen: String,
    pub chapters_present: Vec<String>,
}

/// Complete character surface index for one run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CharacterIndex {
    pub novel_name: String,
    pub run_id: String,
    /// Documents how names were extracted, for artifact consumers.
    pub extraction_method: String,
    pub total_unique_names: usize,
    pub total_mentions: usize,
    /// Sorted by mention count descending, then name.
    pub characters: Vec<CharacterEntry>,
    /// Sentence-window co-occurrence counts, symmetric.
    /// `co_occurrences["A"]["B"] == co_occurrences["B"]["A"]`.
    pub co_occurrences: BTreeMap<String, BTreeMap<String, usize>>,
    /// Name to event keyword id to same-sentence match count. Feeds the
    /// salience event-participation dimension.
    pub event_links: BTreeMap<String, BTreeMap<String, usize>>,
    pub warnings: Vec<String>,
}

fn default_warnings() -> Vec<String> {
    vec![
        "Names are raw strings, not resolved identities".to_owned(),
        "Statistics are surface-level counts, not narrative importance".to_owned(),
        "Co-occurrences indicate proximity, not relationships".to_owned(),
    ]
}

fn normalize_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_owned()
}

fn extract_candidates(text: &str) -> Vec<&str> {
    NAME_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Keep or reject one candidate name.
///
/// Discourse markers never appear inside a valid name phrase, so any
/// token hit rejects the candidate. Excluded words are unreliable only
/// when standalone: they reject single-word candidates and multi-word
/// candidates made entirely of them, but "Blood Emperor" survives.
fn keep_name(name: &str, count: usize) -> bool {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.iter().any(|t| DISCOURSE_WORDS.contains(t)) {
        return false;
    }
    match tokens.as_slice() {
        [single] => {
            !EXCLUDED_WORDS.contains(single)
                && count >= MIN_SINGLE_WORD_MENTIONS
                && single.len() >= MIN_SINGLE_WORD_LEN
        }
        many => !many.iter().all(|t| EXCLUDED_WORDS.contains(t)),
    }
}

/// Build the character surface index over ordered `(chapter_id, text)`
/// pairs.
pub fn build_character_index(
    chapters: &[(String, String)],
    novel: &str,
    run_id: &str,
) -> CharacterIndex {
    // Per-chapter extraction.
    let mut global_counts: HashMap<String, usize> = HashMap::new();
    let mut name_to_chapters: HashMap<String, Vec<String>> = HashMap::new();
    let mut name_to_first_seen: HashMap<String, String> = HashMap::new();
    let mut chapter_sentences: Vec<Vec<String>> = Vec::with_capacity(chapters.len());

    for (chapter_id, text) in chapters {
        let normalized = normalize_text(text);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for candidate in extract_candidates(&normalized) {
            *counts.entry(candidate).or_default() += 1;
        }
        for (name, count) in counts {
            *global_counts.entry(name.to_owned()).or_default() += count;
            name_to_chapters
                .entry(name.to_owned())
                .or_default()
                .push(chapter_id.clone());
            name_to_first_seen
                .entry(name.to_owned())
                .or_insert_with(|| chapter_id.clone());
        }
        chapter_sentences.push(split_sentences(&normalized).into_iter().map(String::from).collect());
    }

    let filtered: BTreeMap<String, usize> = global_counts
        .into_iter()
        .filter(|(name, count)| keep_name(name, *count))
        .collect();
    let kept_names: HashSet<&str> = filtered.keys().map(String::as_str).collect();

    let mut characters: Vec<CharacterEntry> = filtered
        .iter()
        .map(|(name, count)| CharacterEntry {
            name: name.clone(),
            mentions: *count,
            first_seen: name_to_first_seen[name].clone(),
            chapters_present: name_to_chapters[name].clone(),
        })
        .collect();
    characters.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));

    let co_occurrences = co_occurrences(&chapter_sentences, &kept_names);
    let event_links = event_links(&chapter_sentences, &kept_names);

    let total_mentions = filtered.values().sum();
    CharacterIndex {
        novel_name: novel.to_owned(),
        run_id: run_id.to_owned(),
        extraction_method: format!(
            "Conservative heuristic: capitalized word sequences, single-word names \
             require >= {MIN_SINGLE_WORD_MENTIONS} mentions, excluded common words \
             ({} patterns)",
            EXCLUDED_WORDS.len() + DISCOURSE_WORDS.len()
        ),
        total_unique_names: characters.len(),
        total_mentions,
        characters,
        co_occurrences,
        event_links,
        warnings: default_warnings(),
    }
}

/// Substring hit with word boundaries on both sides, so "Ann" does not
/// count inside "Anna". Names are ASCII-capitalized sequences, so byte
/// offsets from `find` stay on char boundaries.
fn sentence_has_name(sentence: &str, name: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = sentence[from..].find(name) {
        let begin = from + pos;
        let end = begin + name.len();
        let clear_before = sentence[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let clear_after = sentence[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if clear_before && clear_after {
            return true;
        }
        from = begin + 1;
    }
    false
}

/// Sentence-window co-occurrence counts. Purely positional.
fn co_occurrences(
    chapter_sentences: &[Vec<String>],
    names: &HashSet<&str>,
) -> BTreeMap<String, BTreeMap<String, usize>> {
    let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let mut bump = |a: &str, b: &str, map: &mut BTreeMap<String, BTreeMap<String, usize>>| {
        *map.entry(a.to_owned())
            .or_default()
            .entry(b.to_owned())
            .or_default() += 1;
    };

    for sentences in chapter_sentences {
        let per_sentence: Vec<Vec<&str>> = sentences
            .iter()
            .map(|s| {
                names
                    .iter()
                    .copied()
                    .filter(|name| sentence_has_name(s, name))
                    .collect()
            })
            .collect();

        for (i, names_i) in per_sentence.iter().enumerate() {
            let window_end = (i + CO_OCCURRENCE_WINDOW + 1).min(per_sentence.len());
            for names_j in &per_sentence[i..window_end] {
                for a in names_i {
                    for b in names_j {
                        if a != b {
                            bump(a, b, &mut counts);
                            bump(b, a, &mut counts);
                        }
                    }
                }
            }
        }
    }

    // Same-sentence pairs were visited in both orders, halve them back.
    for row in counts.values_mut() {
        for count in row.values_mut() {
            *count = (*count).div_ceil(2);
        }
    }
    counts
}

/// Same-sentence links between kept names and event keywords.
fn event_links(
    chapter_sentences: &[Vec<String>],
    names: &HashSet<&str>,
) -> BTreeMap<String, BTreeMap<String, usize>> {
    let mut links: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for sentences in chapter_sentences {
        for sentence in sentences {
            let present: Vec<&str> = names
                .iter()
                .copied()
                .filter(|name| sentence_has_name(sentence, name))
                .collect();
            if present.is_empty() {
                continue;
            }
            let matches = match_keywords(sentence);
            if matches.is_empty() {
                continue;
            }
            for name in present {
                let row = links.entry(name.to_owned()).or_default();
                for (keyword_id, (count, _)) in &matches {
                    *row.entry((*keyword_id).to_owned()).or_default() += count;
                }
            }
        }
    }
    links
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
    fn multi_word_names_are_always_kept() {
        let index = build_character_index(
            &chapters(&["Li Qiye walked alone through the mist."]),
            "n",
            "r",
        );
        assert!(index.characters.iter().any(|c| c.name == "Li Qiye"));
    }

    #[test]
    fn single_word_names_need_frequency_and_length() {
        let index = build_character_index(
            &chapters(&["Wentian frowned. Wentian smiled a moment later. Bo left. Rain fell."]),
            "n",
            "r",
        );
        let names: Vec<&str> = index.characters.iter().map(|c| c.name.as_str()).collect();
        // Two mentions and four letters: kept.
        assert!(names.contains(&"Wentian"));
        // Too short, and only one mention each.
        assert!(!names.contains(&"Bo"));
        assert!(!names.contains(&"Rain"));
    }

    #[test]
    fn excluded_words_block_standalone_but_not_phrases() {
        let index = build_character_index(
            &chapters(&[
                "Emperor spoke. Emperor rose. Blood Emperor watched. Blood Emperor laughed.",
            ]),
            "n",
            "r",
        );
        let names: Vec<&str> = index.characters.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Blood Emperor"));
        assert!(!names.contains(&"Emperor"));
    }

    #[test]
    fn discourse_markers_never_form_names() {
        let index = build_character_index(
            &chapters(&["However Li struck. However Li struck again and again."]),
            "n",
            "r",
        );
        assert!(index
            .characters
            .iter()
            .all(|c| !c.name.contains("However")));
    }

    #[test]
    fn chapter_presence_and_first_seen_are_tracked() {
        let index = build_character_index(
            &chapters(&[
                "A quiet day in the village.",
                "Li Qiye arrived at dusk.",
                "Li Qiye departed at dawn.",
            ]),
            "n",
            "r",
        );
        let entry = index
            .characters
            .iter()
            .find(|c| c.name == "Li Qiye")
            .unwrap();
        assert_eq!(entry.first_seen, "chapter_002");
        assert_eq!(entry.chapters_present, vec!["chapter_002", "chapter_003"]);
        assert_eq!(entry.mentions, 2);
    }

    #[test]
    fn co_occurrence_is_symmetric_and_window_bounded() {
        // Two names in the same sentence, plus a pair far outside the window.
        let text = "Li Qiye faced Mu Shuihan. \
                    Nothing happened. Nothing happened. Nothing happened. Nothing happened. \
                    Gu Tieshou meditated alone.";
        let index = build_character_index(&chapters(&[text]), "n", "r");
        let a_to_b = index.co_occurrences["Li Qiye"]["Mu Shuihan"];
        let b_to_a = index.co_occurrences["Mu Shuihan"]["Li Qiye"];
        assert_eq!(a_to_b, b_to_a);
        assert!(a_to_b >= 1);
        assert!(!index
            .co_occurrences
            .get("Li Qiye")
            .map(|row| row.contains_key("Gu Tieshou"))
            .unwrap_or(false));
    }

    #[test]
    fn name_presence_respects_word_boundaries() {
        assert!(sentence_has_name("Ann spoke with Anna", "Ann"));
        assert!(sentence_has_name("Ann spoke with Anna", "Anna"));
        assert!(!sentence_has_name("Anna left early", "Ann"));
        assert!(sentence_has_name("Li Qiye, unmoved, waited", "Li Qiye"));
    }

    #[test]
    fn prefix_names_do_not_inherit_longer_names_sentences() {
        // "Rand" must not be counted present in "Randall won the battle".
        let index = build_character_index(
            &chapters(&["Rand waited. Rand slept. Randall won the battle. Randall rested."]),
            "n",
            "r",
        );
        let names: Vec<&str> = index.characters.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Rand"));
        assert!(names.contains(&"Randall"));
        assert!(!index.event_links.contains_key("Rand"));
        assert_eq!(index.event_links["Randall"]["action_violence"], 1);
    }

    #[test]
    fn event_links_connect_names_to_keywords() {
        let index = build_character_index(
            &chapters(&["Li Qiye won the battle. Li Qiye rested afterward."]),
            "n",
            "r",
        );
        let links = &index.event_links["Li Qiye"];
        assert_eq!(links["action_violence"], 1);
    }

    #[test]
    fn entries_sort_by_mentions_then_name() {
        let index = build_character_index(
            &chapters(&["Mu Shuihan spoke. Li Qiye spoke. Li Qiye answered."]),
            "n",
            "r",
        );
        let names: Vec<&str> = index.characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Li Qiye", "Mu Shuihan"]);
    }
}
