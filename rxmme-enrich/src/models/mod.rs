//! Data models for rxmme-enrich

pub mod batch_report;
pub mod enriched_record;
pub mod result_store;

pub use batch_report::{BatchOutcome, BatchReport};
pub use enriched_record::{DeaSchedule, EnrichedRecord, COLUMNS};
pub use result_store::ResultStore;
