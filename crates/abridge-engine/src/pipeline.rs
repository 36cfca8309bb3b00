use tracing::{error, info};

use abridge_core::group::group_count;
use abridge_telemetry::Recorder;

use crate::error::EngineError;
use crate::layout::{count_files, DataLayout, CONDENSED_SUFFIX, NOVEL_COMBINED_FILE, NOVEL_MANIFEST_FILE};
use crate::reduce::Reducer;
use crate::split::Manifest;
use crate::stages::{condense_arcs, condense_chapters, condense_novel};

/// Explicit per-stage skip requests. These are trust signals from the
/// user, not automatic optimizations: the pipeline never skips a stage on
/// its own, and a skipped stage's outputs are validated first.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipFlags {
    pub skip_chapters: bool,
    pub skip_arcs: bool,
    pub skip_novel: bool,
}

fn validate_chapter_outputs(layout: &DataLayout, novel: &str) -> Result<usize, String> {
    let raw_dir = layout.raw_dir(novel);
    let out_dir = layout.chapters_dir(novel);
    if !raw_dir.is_dir() {
        return Err(format!("raw directory not found: {}", raw_dir.display()));
    }
    if !out_dir.is_dir() {
        return Err(format!(
            "condensed chapters directory not found: {}",
            out_dir.display()
        ));
    }
    let raw = count_files(&raw_dir, ".txt");
    let condensed = count_files(&out_dir, CONDENSED_SUFFIX);
    if raw == 0 {
        return Err(format!("no raw chapter files in: {}", raw_dir.display()));
    }
    if condensed != raw {
        return Err(format!(
            "{raw} raw chapters but {condensed} condensed, outputs may be incomplete"
        ));
    }
    Ok(condensed)
}

fn validate_arc_outputs(
    layout: &DataLayout,
    novel: &str,
    chapters_per_arc: usize,
) -> Result<usize, String> {
    let out_dir = layout.arcs_dir(novel);
    if !out_dir.is_dir() {
        return Err(format!(
            "condensed arcs directory not found: {}",
            out_dir.display()
        ));
    }
    let arcs = count_files(&out_dir, CONDENSED_SUFFIX);
    if arcs == 0 {
        return Err(format!("no condensed arc files in: {}", out_dir.display()));
    }
    let chapters = count_files(&layout.chapters_dir(novel), CONDENSED_SUFFIX);
    let expected = group_count(chapters, chapters_per_arc);
    if chapters > 0 && arcs != expected {
        return Err(format!(
            "{chapters} chapters imply {expected} arcs but found {arcs}"
        ));
    }
    Ok(arcs)
}

fn validate_novel_outputs(layout: &DataLayout, novel: &str) -> Result<(), String> {
    let out_dir = layout.novel_dir(novel);
    let combined = out_dir.join(NOVEL_COMBINED_FILE);
    match std::fs::metadata(&combined) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => return Err(format!("novel condensation is empty: {}", combined.display())),
        Err(_) => {
            return Err(format!(
                "novel condensation not found: {}",
                combined.display()
            ))
        }
    }
    let manifest_path = out_dir.join(NOVEL_MANIFEST_FILE);
    let manifest = std::fs::read_to_string(&manifest_path)
        .map_err(|_| format!("manifest not found: {}", manifest_path.display()))?;
    serde_json::from_str::<Manifest>(&manifest)
        .map_err(|e| format!("manifest unreadable: {e}"))?;
    Ok(())
}

fn skip_error(stage: &str, reason: String) -> EngineError {
    EngineError::SkipValidation {
        stage: stage.into(),
        reason,
    }
}

/// Run the full condensation pipeline for one novel. Guardrail and usage
/// summaries are logged whether the stages succeed or fail, so partial
/// runs stay inspectable.
pub async fn run_pipeline(
    reducer: &Reducer,
    layout: &DataLayout,
    novel: &str,
    chapters_per_arc: usize,
    skip: SkipFlags,
    recorder: &Recorder,
) -> Result<(), EngineError> {
    info!(novel, run = %recorder.run_id(), "pipeline start");
    let result = run_stages(reducer, layout, novel, chapters_per_arc, skip).await;
    if let Err(e) = &result {
        error!(novel, error = %e, "pipeline failed");
    }
    recorder.log_summaries();
    result
}

async fn run_stages(
    reducer: &Reducer,
    layout: &DataLayout,
    novel: &str,
    chapters_per_arc: usize,
    skip: SkipFlags,
) -> Result<(), EngineError> {
    info!(novel, "stage 1/3: chapter condensation");
    if skip.skip_chapters {
        let count =
            validate_chapter_outputs(layout, novel).map_err(|r| skip_error("chapter", r))?;
        info!(novel, reused = count, "skipping chapter condensation");
    } else {
        let report = condense_chapters(reducer, layout, novel).await?;
        info!(
            novel,
            generated = report.generated,
            reused = report.reused,
            "chapter condensation complete"
        );
    }

    info!(novel, "stage 2/3: arc condensation");
    if skip.skip_arcs {
        let count = validate_arc_outputs(layout, novel, chapters_per_arc)
            .map_err(|r| skip_error("arc", r))?;
        info!(novel, reused = count, "skipping arc condensation");
    } else {
        let report = condense_arcs(reducer, layout, novel, chapters_per_arc).await?;
        info!(
            novel,
            generated = report.generated,
            reused = report.reused,
            "arc condensation complete"
        );
    }

    info!(novel, "stage 3/3: novel condensation");
    if skip.skip_novel {
        validate_novel_outputs(layout, novel).map_err(|r| skip_error("novel", r))?;
        info!(novel, "skipping novel condensation, reusing existing output");
    } else {
        let manifest = condense_novel(reducer, layout, novel).await?;
        info!(
            novel,
            parts = manifest.parts.len(),
            strategy = ?manifest.generation_strategy,
            "novel condensation complete"
        );
    }

    info!(novel, "pipeline complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use abridge_core::estimator::CharsPerTokenEstimator;
    use abridge_llm::mock::EchoCompressor;

    fn temp_layout() -> DataLayout {
        let root = std::env::temp_dir().join(format!("abridge-pipeline-{}", uuid::Uuid::now_v7()));
        DataLayout::new(root)
    }

    fn seed_chapters(layout: &DataLayout, novel: &str, count: usize) {
        let dir = layout.raw_dir(novel);
        fs::create_dir_all(&dir).unwrap();
        for i in 1..=count {
            fs::write(dir.join(format!("chapter_{i:03}.txt")), format!("chapter {i} text"))
                .unwrap();
        }
    }

    fn echo_reducer(echo: Arc<EchoCompressor>) -> Reducer {
        Reducer::new(echo, Arc::new(CharsPerTokenEstimator::new(1)))
    }

    #[tokio::test]
    async fn full_pipeline_produces_all_artifacts() {
        let layout = temp_layout();
        seed_chapters(&layout, "novel", 5);
        let echo = Arc::new(EchoCompressor::new());
        let recorder = Arc::new(Recorder::open(&layout.telemetry_db()));
        let reducer = echo_reducer(echo).with_observer(recorder.clone());

        run_pipeline(&reducer, &layout, "novel", 2, SkipFlags::default(), &recorder)
            .await
            .unwrap();

        assert!(layout
            .chapters_dir("novel")
            .join("chapter_005.condensed.txt")
            .is_file());
        assert!(layout.arcs_dir("novel").join("arc_03.condensed.txt").is_file());
        assert!(layout.novel_dir("novel").join(NOVEL_COMBINED_FILE).is_file());
        assert!(layout.novel_dir("novel").join(NOVEL_MANIFEST_FILE).is_file());

        // Every compressor call was measured.
        let ratios = recorder.ratio_summary().unwrap();
        assert_eq!(ratios.total, 5 + 3 + 1);
    }

    #[tokio::test]
    async fn skip_with_valid_outputs_reuses_them() {
        let layout = temp_layout();
        seed_chapters(&layout, "novel", 4);
        let echo = Arc::new(EchoCompressor::new());
        let reducer = echo_reducer(echo.clone());
        let recorder = Recorder::open(&layout.telemetry_db());

        run_pipeline(&reducer, &layout, "novel", 2, SkipFlags::default(), &recorder)
            .await
            .unwrap();
        let calls = echo.call_count();

        let skip_all = SkipFlags {
            skip_chapters: true,
            skip_arcs: true,
            skip_novel: true,
        };
        run_pipeline(&reducer, &layout, "novel", 2, skip_all, &recorder)
            .await
            .unwrap();
        assert_eq!(echo.call_count(), calls);
    }

    #[tokio::test]
    async fn skip_with_missing_outputs_is_fatal() {
        let layout = temp_layout();
        seed_chapters(&layout, "novel", 4);
        let echo = Arc::new(EchoCompressor::new());
        let reducer = echo_reducer(echo);
        let recorder = Recorder::open(&layout.telemetry_db());

        let skip = SkipFlags {
            skip_chapters: true,
            ..SkipFlags::default()
        };
        let err = run_pipeline(&reducer, &layout, "novel", 2, skip, &recorder)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::SkipValidation { ref stage, .. } if stage == "chapter"
        ));
    }

    #[tokio::test]
    async fn skip_arcs_with_wrong_count_is_fatal() {
        let layout = temp_layout();
        seed_chapters(&layout, "novel", 4);
        let echo = Arc::new(EchoCompressor::new());
        let reducer = echo_reducer(echo);
        let recorder = Recorder::open(&layout.telemetry_db());

        run_pipeline(&reducer, &layout, "novel", 2, SkipFlags::default(), &recorder)
            .await
            .unwrap();
        // 4 chapters at 2 per arc imply 2 arcs; add a stray third.
        fs::write(
            layout.arcs_dir("novel").join("arc_03.condensed.txt"),
            "stray",
        )
        .unwrap();

        let skip = SkipFlags {
            skip_chapters: true,
            skip_arcs: true,
            ..SkipFlags::default()
        };
        let err = run_pipeline(&reducer, &layout, "novel", 2, skip, &recorder)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::SkipValidation { ref stage, .. } if stage == "arc"
        ));
    }
}
