// Lookup pipeline: acquisition, normalization, scoring, and history

pub mod processing;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::NormalizedProduct;
use crate::metrics::LookupMetrics;
use crate::pipeline::processing::normalize::normalize;
use crate::pipeline::processing::scoring::{score, ScoreResult};
use crate::storage::{HistoryEntry, HistoryStore};
use crate::types::{InputKind, LookupRequest, ProductSource, RawProductRecord};

/// A raw record together with its canonical form and score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub raw: RawProductRecord,
    pub product: NormalizedProduct,
    pub result: ScoreResult,
}

/// Result of a complete lookup
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome {
    pub input_kind: InputKind,
    pub query: String,
    /// Acquisition failure, if any. The evaluation list then holds a single
    /// evaluation of an absent record.
    pub error: Option<String>,
    pub evaluations: Vec<Evaluation>,
}

pub struct Pipeline {
    sources: Vec<Box<dyn ProductSource>>,
    history: Option<Arc<dyn HistoryStore>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            history: None,
        }
    }

    pub fn with_source(mut self, source: Box<dyn ProductSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Normalize and score one raw record. Pure; never fails.
    pub fn evaluate(raw: RawProductRecord) -> Evaluation {
        let product = normalize(&raw);
        let result = score(&product);
        Evaluation {
            raw,
            product,
            result,
        }
    }

    fn source_for(&self, kind: InputKind) -> Option<&dyn ProductSource> {
        self.sources
            .iter()
            .find(|s| s.handles(kind))
            .map(|s| s.as_ref())
    }

    /// Acquire raw data for the request and evaluate everything that came back.
    ///
    /// Acquisition failures do not fail the lookup: they are logged, kept on
    /// the outcome, and evaluated as an absent record.
    #[instrument(skip(self, request), fields(input = %request.kind(), query = %request.query()))]
    pub async fn lookup(&self, request: &LookupRequest) -> LookupOutcome {
        let kind = request.kind();
        info!("{}: {}", kind.action_label(), request.query());
        LookupMetrics::record_lookup(kind.as_str());

        let (records, error) = match self.source_for(kind) {
            Some(source) => match source.fetch(request).await {
                Ok(records) => {
                    debug!("{} returned {} records", source.source_name(), records.len());
                    (records, None)
                }
                Err(e) => {
                    warn!("{} lookup failed: {}", source.source_name(), e);
                    LookupMetrics::record_failure(source.source_name());
                    (Vec::new(), Some(e.to_string()))
                }
            },
            None => {
                warn!("No source configured for {} requests", kind);
                (Vec::new(), Some(format!("No source configured for {} requests", kind)))
            }
        };

        let records = if records.is_empty() {
            vec![RawProductRecord::Absent]
        } else {
            records
        };

        let mut evaluations = Vec::with_capacity(records.len());
        for raw in records {
            let evaluation = Self::evaluate(raw);
            LookupMetrics::record_score(evaluation.result.score, evaluation.result.band);
            info!(
                product = %evaluation.product.name,
                score = evaluation.result.score,
                band = %evaluation.result.band,
                "Scored lookup result"
            );
            self.record_history(kind, request.query(), &evaluation).await;
            evaluations.push(evaluation);
        }

        LookupOutcome {
            input_kind: kind,
            query: request.query().to_string(),
            error,
            evaluations,
        }
    }

    async fn record_history(&self, kind: InputKind, query: &str, evaluation: &Evaluation) {
        let Some(history) = &self.history else {
            return;
        };

        let entry = HistoryEntry::new(
            kind,
            query,
            evaluation.raw.clone(),
            evaluation.product.clone(),
            evaluation.result.clone(),
        );
        // A history failure must not hide the result from the user
        if let Err(e) = history.append(&entry).await {
            warn!("Failed to save history entry: {}", e);
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, Result};
    use crate::pipeline::processing::scoring::Band;
    use crate::storage::InMemoryHistory;

    struct FixedSource(Vec<RawProductRecord>);

    #[async_trait::async_trait]
    impl ProductSource for FixedSource {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        fn handles(&self, kind: InputKind) -> bool {
            kind == InputKind::LabelText
        }

        async fn fetch(&self, _request: &LookupRequest) -> Result<Vec<RawProductRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl ProductSource for FailingSource {
        fn source_name(&self) -> &'static str {
            "failing"
        }

        fn handles(&self, _kind: InputKind) -> bool {
            true
        }

        async fn fetch(&self, _request: &LookupRequest) -> Result<Vec<RawProductRecord>> {
            Err(LookupError::Ocr("tesseract not installed".to_string()))
        }
    }

    #[test]
    fn test_evaluate_absent() {
        let evaluation = Pipeline::evaluate(RawProductRecord::Absent);
        assert_eq!(evaluation.product, NormalizedProduct::unknown());
        assert_eq!(evaluation.result.score, 100);
        assert_eq!(evaluation.result.band, Band::Green);
        assert!(evaluation.result.drivers.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_records_history() {
        let history = Arc::new(InMemoryHistory::new());
        let pipeline = Pipeline::new()
            .with_source(Box::new(FixedSource(vec![RawProductRecord::FreeText(
                "450 kcal 20g fat".to_string(),
            )])))
            .with_history(history.clone());

        let outcome = pipeline
            .lookup(&LookupRequest::LabelText("label.txt".to_string()))
            .await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.evaluations.len(), 1);
        assert_eq!(outcome.evaluations[0].result.score, 75);

        let saved = history.recent(10).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].query, "label.txt");
        assert_eq!(saved[0].input_kind, InputKind::LabelText);
        assert_eq!(saved[0].score, 75);
    }

    #[tokio::test]
    async fn test_failed_acquisition_evaluates_absent() {
        let pipeline = Pipeline::new().with_source(Box::new(FailingSource));

        let outcome = pipeline
            .lookup(&LookupRequest::ImagePath("label.png".to_string()))
            .await;

        assert!(outcome.error.as_deref().unwrap().contains("tesseract not installed"));
        assert_eq!(outcome.evaluations.len(), 1);
        assert_eq!(outcome.evaluations[0].raw, RawProductRecord::Absent);
        assert_eq!(outcome.evaluations[0].result.score, 100);
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let pipeline = Pipeline::new();
        let outcome = pipeline.lookup(&LookupRequest::Barcode("123".to_string())).await;
        assert!(outcome.error.is_some());
        assert_eq!(outcome.evaluations[0].product.name, "Unknown");
    }

    #[tokio::test]
    async fn test_empty_fetch_yields_single_absent() {
        let pipeline = Pipeline::new().with_source(Box::new(FixedSource(Vec::new())));
        let outcome = pipeline
            .lookup(&LookupRequest::LabelText("-".to_string()))
            .await;
        assert!(outcome.error.is_none());
        assert_eq!(outcome.evaluations.len(), 1);
        assert_eq!(outcome.evaluations[0].raw, RawProductRecord::Absent);
    }
}
