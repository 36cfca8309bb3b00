//! Command-line entry point for the condensation and analysis pipelines.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use abridge_analysis::pipeline::AnalysisFlags;
use abridge_analysis::source::SourcePreference;
use abridge_core::budget::Budget;
use abridge_core::estimator::CharsPerTokenEstimator;
use abridge_engine::layout::DataLayout;
use abridge_engine::pipeline::SkipFlags;
use abridge_engine::reduce::Reducer;
use abridge_engine::stages::{
    condense_arcs, condense_chapters, condense_novel, DEFAULT_CHAPTERS_PER_ARC,
};
use abridge_llm::config::{create_compressor, LlmConfig};
use abridge_telemetry::{init_telemetry, Recorder, RunId};

#[derive(Parser)]
#[command(name = "abridge", about = "Hierarchical novel condensation", version)]
struct Cli {
    /// Data root directory (raw/, *_condensed/, telemetry/ live under it).
    #[arg(long, default_value = "data", global = true)]
    data_root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CondenseArgs {
    /// Novel name (directory under data/raw/).
    novel: String,

    /// Input token ceiling per LLM call.
    #[arg(long)]
    max_input_tokens: Option<usize>,

    /// Units per positional group during reduction.
    #[arg(long)]
    units_per_group: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three condensation stages: chapters, arcs, novel.
    Pipeline {
        #[command(flatten)]
        condense: CondenseArgs,

        #[arg(long, default_value_t = DEFAULT_CHAPTERS_PER_ARC)]
        chapters_per_arc: usize,

        /// Reuse existing condensed chapters instead of regenerating.
        #[arg(long)]
        skip_chapters: bool,

        /// Reuse existing condensed arcs instead of regenerating.
        #[arg(long)]
        skip_arcs: bool,

        /// Reuse the existing novel condensation instead of regenerating.
        #[arg(long)]
        skip_novel: bool,
    },

    /// Condense raw chapters only.
    Chapters {
        #[command(flatten)]
        condense: CondenseArgs,
    },

    /// Condense chapter condensations into arcs only.
    Arcs {
        #[command(flatten)]
        condense: CondenseArgs,

        #[arg(long, default_value_t = DEFAULT_CHAPTERS_PER_ARC)]
        chapters_per_arc: usize,
    },

    /// Condense arc condensations into the novel artifact only.
    Novel {
        #[command(flatten)]
        condense: CondenseArgs,
    },

    /// Run the lexical analysis features (no LLM involved).
    Analyze {
        /// Novel name (directory under data/raw/).
        novel: String,

        /// Analyze raw chapters even when condensed ones exist.
        #[arg(long, conflicts_with = "prefer_condensed")]
        prefer_raw: bool,

        /// Require condensed chapters; fail if they are missing.
        #[arg(long)]
        prefer_condensed: bool,

        #[arg(long)]
        skip_character_index: bool,

        #[arg(long)]
        skip_salience: bool,

        #[arg(long)]
        skip_relationships: bool,

        #[arg(long)]
        skip_event_keywords: bool,

        #[arg(long)]
        skip_genres: bool,

        #[arg(long)]
        skip_tags: bool,
    },
}

fn build_reducer(args: &CondenseArgs, recorder: &Arc<Recorder>) -> anyhow::Result<Reducer> {
    let config = LlmConfig::from_env().context("LLM configuration")?;
    let compressor = create_compressor(&config).context("LLM provider")?;

    let mut budget = Budget::default();
    if let Some(max_input) = args.max_input_tokens {
        budget.max_input_tokens = max_input;
    }

    let mut reducer = Reducer::new(compressor, Arc::new(CharsPerTokenEstimator::default()))
        .with_budget(budget)
        .with_observer(recorder.clone());
    if let Some(units) = args.units_per_group {
        reducer = reducer.with_units_per_group(units);
    }
    Ok(reducer)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let cli = Cli::parse();
    let layout = DataLayout::new(&cli.data_root);

    match cli.command {
        Command::Pipeline {
            condense,
            chapters_per_arc,
            skip_chapters,
            skip_arcs,
            skip_novel,
        } => {
            let recorder = Arc::new(Recorder::open(&layout.telemetry_db()));
            let reducer = build_reducer(&condense, &recorder)?;
            let skip = SkipFlags {
                skip_chapters,
                skip_arcs,
                skip_novel,
            };
            abridge_engine::pipeline::run_pipeline(
                &reducer,
                &layout,
                &condense.novel,
                chapters_per_arc,
                skip,
                &recorder,
            )
            .await?;
        }
        Command::Chapters { condense } => {
            let recorder = Arc::new(Recorder::open(&layout.telemetry_db()));
            let reducer = build_reducer(&condense, &recorder)?;
            let report = condense_chapters(&reducer, &layout, &condense.novel).await?;
            recorder.log_summaries();
            info!(
                generated = report.generated,
                reused = report.reused,
                "chapter condensation complete"
            );
        }
        Command::Arcs {
            condense,
            chapters_per_arc,
        } => {
            let recorder = Arc::new(Recorder::open(&layout.telemetry_db()));
            let reducer = build_reducer(&condense, &recorder)?;
            let report =
                condense_arcs(&reducer, &layout, &condense.novel, chapters_per_arc).await?;
            recorder.log_summaries();
            info!(
                generated = report.generated,
                reused = report.reused,
                "arc condensation complete"
            );
        }
        Command::Novel { condense } => {
            let recorder = Arc::new(Recorder::open(&layout.telemetry_db()));
            let reducer = build_reducer(&condense, &recorder)?;
            let manifest = condense_novel(&reducer, &layout, &condense.novel).await?;
            recorder.log_summaries();
            info!(parts = manifest.parts.len(), "novel condensation complete");
        }
        Command::Analyze {
            novel,
            prefer_raw,
            prefer_condensed,
            skip_character_index,
            skip_salience,
            skip_relationships,
            skip_event_keywords,
            skip_genres,
            skip_tags,
        } => {
            let source = if prefer_raw {
                SourcePreference::Raw
            } else if prefer_condensed {
                SourcePreference::Condensed
            } else {
                SourcePreference::Auto
            };
            let flags = AnalysisFlags {
                source,
                skip_character_index,
                skip_salience,
                skip_relationships,
                skip_event_keywords,
                skip_genres,
                skip_tags,
            };
            let run_id = RunId::new();
            let report =
                abridge_analysis::run_analysis(&layout, &novel, run_id.as_str(), flags)?;
            for (feature, path) in &report.written {
                info!(feature, path = %path.display(), "artifact");
            }
            if !report.failed.is_empty() {
                anyhow::bail!("analysis features failed: {}", report.failed.join(", "));
            }
        }
    }
    Ok(())
}
