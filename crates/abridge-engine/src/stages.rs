use std::fs;

use tracing::info;

use abridge_core::group::compute_groups;
use abridge_core::unit::{merge_texts, Unit, UnitId};
use abridge_store::{FsUnitStore, UnitStore};

use crate::error::EngineError;
use crate::layout::{
    count_files, load_raw_chapters, DataLayout, CONDENSED_SUFFIX, NOVEL_COMBINED_FILE,
    NOVEL_MANIFEST_FILE,
};
use crate::reduce::Reducer;
use crate::resume::{condense_missing, StageReport};
use crate::split::{plan_chunks, GenerationStrategy, Manifest, ManifestBudgets};

/// Default chapter count per arc group.
pub const DEFAULT_CHAPTERS_PER_ARC: usize = 10;

/// Stage 1: condense each raw chapter independently, 1:1, resumable.
pub async fn condense_chapters(
    reducer: &Reducer,
    layout: &DataLayout,
    novel: &str,
) -> Result<StageReport, EngineError> {
    let chapters = load_raw_chapters(&layout.raw_dir(novel))?;
    info!(novel, chapters = chapters.len(), "chapter condensation");
    let store = FsUnitStore::open(layout.chapters_dir(novel), CONDENSED_SUFFIX)?;
    condense_missing(reducer, "chapter", &chapters, &store).await
}

/// Stage 2: group condensed chapters positionally and condense each
/// group into one arc, resumable per group.
pub async fn condense_arcs(
    reducer: &Reducer,
    layout: &DataLayout,
    novel: &str,
    chapters_per_arc: usize,
) -> Result<StageReport, EngineError> {
    let chapters_dir = layout.chapters_dir(novel);
    if !chapters_dir.is_dir() {
        return Err(EngineError::CorpusNotFound(chapters_dir));
    }
    let chapter_store = FsUnitStore::open(&chapters_dir, CONDENSED_SUFFIX)?;
    let chapter_ids = chapter_store.list()?;
    if chapter_ids.is_empty() {
        return Err(EngineError::NoUnits(chapters_dir));
    }

    // A group may only be condensed once all its member chapters exist;
    // the raw corpus defines how many that is.
    let raw_count = count_files(&layout.raw_dir(novel), ".txt");
    if raw_count > 0 && chapter_ids.len() != raw_count {
        return Err(EngineError::IncompleteUpstream {
            stage: "arc".into(),
            expected: raw_count,
            found: chapter_ids.len(),
        });
    }

    let mut texts = Vec::with_capacity(chapter_ids.len());
    for id in &chapter_ids {
        texts.push(chapter_store.read(id)?);
    }

    let groups = compute_groups(chapter_ids.len(), chapters_per_arc);
    info!(
        novel,
        chapters = chapter_ids.len(),
        arcs = groups.len(),
        "arc condensation"
    );

    let inputs: Vec<(UnitId, String)> = groups
        .iter()
        .enumerate()
        .map(|(i, range)| {
            let members: Vec<&str> = texts[range.clone()].iter().map(|s| s.as_str()).collect();
            (UnitId::for_group("arc", i + 1), merge_texts(&members))
        })
        .collect();

    let arc_store = FsUnitStore::open(layout.arcs_dir(novel), CONDENSED_SUFFIX)?;
    condense_missing(reducer, "arc", &inputs, &arc_store).await
}

/// Stage 3: reduce all condensed arcs into the final novel text, with
/// output-budget splitting at the convergence point. Writes the combined
/// file, any part files, and the manifest; returns the manifest.
pub async fn condense_novel(
    reducer: &Reducer,
    layout: &DataLayout,
    novel: &str,
) -> Result<Manifest, EngineError> {
    let arcs_dir = layout.arcs_dir(novel);
    if !arcs_dir.is_dir() {
        return Err(EngineError::CorpusNotFound(arcs_dir));
    }
    let arc_store = FsUnitStore::open(&arcs_dir, CONDENSED_SUFFIX)?;
    let arc_ids = arc_store.list()?;
    if arc_ids.is_empty() {
        return Err(EngineError::NoUnits(arcs_dir));
    }

    let mut units = Vec::with_capacity(arc_ids.len());
    for id in arc_ids {
        let text = arc_store.read(&id)?;
        units.push(Unit::new(id, text));
    }
    info!(novel, arcs = units.len(), "novel condensation");

    let converged = reducer.reduce_layers("arc", units).await?;
    let out_dir = layout.novel_dir(novel);
    fs::create_dir_all(&out_dir)?;
    let budget = reducer.budget();

    if converged.condensed {
        // The last grouping layer already produced the full condensation.
        let text = &converged.units[0].text;
        fs::write(out_dir.join(NOVEL_COMBINED_FILE), text)?;
        let manifest = Manifest {
            kind: "novel_condensation".into(),
            parts: vec![NOVEL_COMBINED_FILE.into()],
            generation_strategy: GenerationStrategy::Single,
            budgets: ManifestBudgets::from_budget(budget),
        };
        write_manifest(&out_dir, &manifest)?;
        return Ok(manifest);
    }

    let texts: Vec<&str> = converged.units.iter().map(|u| u.text.as_str()).collect();
    let merged = merge_texts(&texts);
    let estimate = reducer.estimator().estimate(&merged);
    let predicted = budget.predicted_output_tokens(estimate);

    let manifest = match (budget.max_output_tokens, budget.chunk_input_ceiling()) {
        (Some(max_output), Some(ceiling)) if predicted > max_output => {
            // One oversized call risks silent truncation, which cannot be
            // detected afterwards. Split the input before compressing.
            let chunks = plan_chunks(&converged.units, reducer.estimator(), ceiling);
            info!(
                novel,
                predicted,
                max_output,
                parts = chunks.len(),
                "predicted output exceeds the budget, splitting into parts"
            );

            let mut parts = Vec::with_capacity(chunks.len());
            let mut part_texts = Vec::with_capacity(chunks.len());
            for (i, range) in chunks.iter().enumerate() {
                let members: Vec<&str> = converged.units[range.clone()]
                    .iter()
                    .map(|u| u.text.as_str())
                    .collect();
                let part_name = format!("novel.part_{:02}", i + 1);
                let id = UnitId::from_raw(part_name.as_str());
                let text = reducer
                    .condense_unit("novel", &id, &merge_texts(&members))
                    .await?;
                fs::write(out_dir.join(&part_name), &text)?;
                parts.push(part_name);
                part_texts.push(text);
            }

            let combined = part_texts.join("\n\n");
            fs::write(out_dir.join(NOVEL_COMBINED_FILE), &combined)?;

            Manifest {
                kind: "novel_condensation".into(),
                parts,
                generation_strategy: GenerationStrategy::OutputSplit,
                budgets: ManifestBudgets::from_budget(budget),
            }
        }
        _ => {
            let id = UnitId::from_raw("novel");
            let text = reducer.condense_unit("novel", &id, &merged).await?;
            fs::write(out_dir.join(NOVEL_COMBINED_FILE), &text)?;
            Manifest {
                kind: "novel_condensation".into(),
                parts: vec![NOVEL_COMBINED_FILE.into()],
                generation_strategy: GenerationStrategy::Single,
                budgets: ManifestBudgets::from_budget(budget),
            }
        }
    };

    write_manifest(&out_dir, &manifest)?;
    Ok(manifest)
}

fn write_manifest(out_dir: &std::path::Path, manifest: &Manifest) -> Result<(), EngineError> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    fs::write(out_dir.join(NOVEL_MANIFEST_FILE), json)?;
    Ok(())
}
