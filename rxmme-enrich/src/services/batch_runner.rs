//! Resumable batch enrichment
//!
//! Walks the identifier list in order against the persisted result store.
//! Identifiers already stored are skipped without touching the network, so
//! an interrupted run picks up where it stopped. The first hard error ends
//! the loop; progress up to that point is still persisted and exported.

use crate::db::RecordCache;
use crate::error::EnrichResult;
use crate::models::{BatchOutcome, BatchReport};
use crate::services::enricher::Enricher;
use crate::services::table_writer::export_csv;
use crate::types::TerminologySource;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct BatchRunner<S, C> {
    enricher: Enricher<S>,
    cache: C,
    cancel_token: CancellationToken,
}

impl<S, C> BatchRunner<S, C>
where
    S: TerminologySource,
    C: RecordCache,
{
    pub fn new(enricher: Enricher<S>, cache: C) -> Self {
        Self {
            enricher,
            cache,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Stop between identifiers once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn enricher(&self) -> &Enricher<S> {
        &self.enricher
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Run the batch and write the output table to `output_path`
    ///
    /// Returns `Err` only when loading, persisting or exporting fails. An
    /// enrichment failure is reported as [`BatchOutcome::Aborted`].
    pub async fn run(&mut self, ndcs: &[String], output_path: &Path) -> EnrichResult<BatchReport> {
        let run_id = Uuid::new_v4();
        let mut store = self.cache.load().await?;

        info!(
            run_id = %run_id,
            identifiers = ndcs.len(),
            cached = store.len(),
            "Starting batch run"
        );

        let mut outcome = BatchOutcome::Completed;
        let mut processed = 0;
        let mut skipped = 0;

        for (position, ndc) in ndcs.iter().enumerate() {
            if self.cancel_token.is_cancelled() {
                warn!(position, "Batch run cancelled");
                outcome = BatchOutcome::Cancelled;
                break;
            }

            if store.contains(ndc) {
                debug!(position, ndc = %ndc, "Already processed, skipping");
                skipped += 1;
                continue;
            }

            info!("{} - {}", position, ndc);

            match self.enricher.enrich(ndc).await {
                Ok(record) => {
                    store.insert(record);
                    processed += 1;
                }
                Err(e) => {
                    error!(
                        position,
                        ndc = %ndc,
                        transient = e.is_transient(),
                        error = %e,
                        "Enrichment failed, stopping batch"
                    );
                    outcome = BatchOutcome::Aborted {
                        ndc: ndc.clone(),
                        error: e.to_string(),
                    };
                    break;
                }
            }
        }

        // Same finalization for every outcome: persist first, then export
        self.cache.save(&store).await?;
        export_csv(&store, output_path)?;

        let report = BatchReport {
            run_id,
            outcome,
            processed,
            skipped,
            total_records: store.len(),
        };

        info!(
            run_id = %report.run_id,
            outcome = report.outcome.as_str(),
            processed = report.processed,
            skipped = report.skipped,
            total_records = report.total_records,
            "Batch run finished"
        );

        Ok(report)
    }
}
