use tracing::info;

use abridge_core::unit::UnitId;
use abridge_store::UnitStore;

use crate::error::EngineError;
use crate::reduce::Reducer;

/// Outcome of one resumable stage pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageReport {
    pub expected: usize,
    pub reused: usize,
    pub generated: usize,
}

/// Condense every input whose output is not already persisted.
///
/// The expected set is recomputed from the upstream inputs on every run,
/// so resume detection self-heals after interrupted runs. Outputs persist
/// one at a time via `write_once`, so a crash after unit k leaves units
/// 1..k durably complete and byte-identical on the next pass.
pub async fn condense_missing(
    reducer: &Reducer,
    stage: &str,
    inputs: &[(UnitId, String)],
    store: &dyn UnitStore,
) -> Result<StageReport, EngineError> {
    let mut missing: Vec<&(UnitId, String)> = Vec::new();
    for pair in inputs {
        if !store.exists(&pair.0)? {
            missing.push(pair);
        }
    }

    let expected = inputs.len();
    let reused = expected - missing.len();
    info!(stage, expected, reused, missing = missing.len(), "resume scan");

    if missing.is_empty() {
        info!(stage, "all outputs present, nothing to condense");
        return Ok(StageReport {
            expected,
            reused,
            generated: 0,
        });
    }

    for (id, text) in missing.iter() {
        info!(stage, unit = id.as_str(), "condensing");
        let condensed = reducer.condense_unit(stage, id, text).await?;
        store.write_once(id, &condensed)?;
    }

    Ok(StageReport {
        expected,
        reused,
        generated: inputs.len() - reused,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use abridge_core::estimator::CharsPerTokenEstimator;
    use abridge_store::MemoryUnitStore;
    use abridge_llm::mock::EchoCompressor;

    fn reducer(echo: Arc<EchoCompressor>) -> Reducer {
        Reducer::new(echo, Arc::new(CharsPerTokenEstimator::new(1)))
    }

    fn inputs(n: usize) -> Vec<(UnitId, String)> {
        (1..=n)
            .map(|i| (UnitId::for_group("chapter", i), format!("text {i}")))
            .collect()
    }

    #[tokio::test]
    async fn first_run_condenses_everything() {
        let echo = Arc::new(EchoCompressor::new());
        let store = MemoryUnitStore::new();
        let report = condense_missing(&reducer(echo.clone()), "chapter", &inputs(3), &store)
            .await
            .unwrap();
        assert_eq!(
            report,
            StageReport {
                expected: 3,
                reused: 0,
                generated: 3
            }
        );
        assert_eq!(echo.call_count(), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let echo = Arc::new(EchoCompressor::new());
        let store = MemoryUnitStore::new();
        let r = reducer(echo.clone());
        let ins = inputs(3);
        condense_missing(&r, "chapter", &ins, &store).await.unwrap();

        let first_pass: Vec<String> = ins
            .iter()
            .map(|(id, _)| store.read(id).unwrap())
            .collect();

        let report = condense_missing(&r, "chapter", &ins, &store).await.unwrap();
        assert_eq!(
            report,
            StageReport {
                expected: 3,
                reused: 3,
                generated: 0
            }
        );
        // No second-pass compressor calls and no changed bytes.
        assert_eq!(echo.call_count(), 3);
        for (i, (id, _)) in ins.iter().enumerate() {
            assert_eq!(store.read(id).unwrap(), first_pass[i]);
        }
    }

    #[tokio::test]
    async fn resume_only_processes_missing_units() {
        let echo = Arc::new(EchoCompressor::new());
        let store = MemoryUnitStore::new();
        let ins = inputs(5);
        // Simulate a crash after the second unit persisted.
        store.write_once(&ins[0].0, "done 1").unwrap();
        store.write_once(&ins[1].0, "done 2").unwrap();

        let report = condense_missing(&reducer(echo.clone()), "chapter", &ins, &store)
            .await
            .unwrap();
        assert_eq!(
            report,
            StageReport {
                expected: 5,
                reused: 2,
                generated: 3
            }
        );
        assert_eq!(echo.call_count(), 3);
        // Pre-crash outputs untouched.
        assert_eq!(store.read(&ins[0].0).unwrap(), "done 1");
        assert_eq!(store.read(&ins[1].0).unwrap(), "done 2");
    }

    #[tokio::test]
    async fn failure_mid_stage_keeps_completed_units() {
        use abridge_core::errors::CompressError;
        use abridge_llm::mock::{MockCompressor, MockResponse};

        let mock = Arc::new(MockCompressor::new(vec![
            MockResponse::text("one"),
            MockResponse::Error(CompressError::EmptyResponse),
        ]));
        let store = MemoryUnitStore::new();
        let r = Reducer::new(mock, Arc::new(CharsPerTokenEstimator::new(1)));
        let ins = inputs(3);

        let err = condense_missing(&r, "chapter", &ins, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Compress(_)));
        // The unit condensed before the failure survives for resume.
        assert_eq!(store.read(&ins[0].0).unwrap(), "one");
        assert!(!store.exists(&ins[1].0).unwrap());
    }
}
