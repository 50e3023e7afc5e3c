//! Per-identifier enrichment
//!
//! Sequences the terminology lookups and the MME calculation for one NDC:
//!
//! 1. Resolve NDC → RxCUI (unresolved: identifier-only record, no more calls)
//! 2. RxTerms description (name, generic name, route, form, strength)
//! 3. VA pharmacologic class, then its therapeutic class via the cache
//! 4. Ingredient composition → MME (always attempted)
//! 5. DEA schedule
//!
//! Missing data at any step leaves the corresponding fields empty. Errors
//! propagate unchanged; there are no retries at this level.

use crate::error::EnrichResult;
use crate::models::{DeaSchedule, EnrichedRecord};
use crate::services::classification_cache::ClassificationCache;
use crate::services::mme_calculator::calculate_mme;
use crate::types::TerminologySource;
use tracing::debug;

/// Builds one [`EnrichedRecord`] per NDC
pub struct Enricher<S> {
    source: S,
    class_cache: ClassificationCache,
}

impl<S: TerminologySource> Enricher<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(source, ClassificationCache::new())
    }

    pub fn with_cache(source: S, class_cache: ClassificationCache) -> Self {
        Self {
            source,
            class_cache,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn class_cache(&self) -> &ClassificationCache {
        &self.class_cache
    }

    /// Enrich one NDC
    pub async fn enrich(&mut self, ndc: &str) -> EnrichResult<EnrichedRecord> {
        let mut record = EnrichedRecord::unresolved(ndc);

        let Some(rxcui) = self.source.resolve_ndc(ndc).await? else {
            debug!(ndc = %ndc, "NDC did not resolve to a current concept");
            return Ok(record);
        };

        match self.source.describe(&rxcui).await? {
            Some(description) => {
                record.medication_name = description.full_name;
                record.generic_name = description.full_generic_name;
                record.route = description.route;
                record.form = description.dose_form;
                record.strength = description.strength;
            }
            None => debug!(ndc = %ndc, rxcui = %rxcui, "No RxTerms description"),
        }

        match self.source.classify(&rxcui).await? {
            Some(class) => {
                record.thera_class = self
                    .class_cache
                    .therapeutic_class(&self.source, &class.class_id)
                    .await?;
                record.pharm_class = Some(class.class_name);
            }
            None => debug!(ndc = %ndc, rxcui = %rxcui, "No VA class"),
        }

        let features = self.source.definitional_features(&rxcui).await?;
        let mme = calculate_mme(&features)?;
        record.calculated_mme = Some(mme.calculated_mme);
        record.strength_per_unit = mme.strength_per_unit;
        record.conversion_factor = mme.conversion_factor;

        record.dea_class = self
            .source
            .schedule(&rxcui)
            .await?
            .as_deref()
            .and_then(DeaSchedule::from_property);

        Ok(record)
    }
}
