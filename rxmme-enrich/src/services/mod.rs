//! Enrichment services
//!
//! Terminology client, class graph cache, MME engine, the per-identifier
//! enricher, and the resumable batch runner that drives them.

pub mod batch_runner;
pub mod classification_cache;
pub mod enricher;
pub mod mme_calculator;
pub mod ndc_list;
pub mod rxnav_client;
pub mod table_writer;

#[cfg(test)]
pub(crate) mod testing;

pub use batch_runner::BatchRunner;
pub use classification_cache::ClassificationCache;
pub use enricher::Enricher;
pub use mme_calculator::{calculate_mme, MmeCalculation, MmeError, CONVERSION_FACTORS};
pub use ndc_list::{parse_ndc_list, read_ndc_list};
pub use rxnav_client::{RxNavClient, RxNavError};
pub use table_writer::{export_csv, write_table};
