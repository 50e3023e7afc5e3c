//! Error types for rxmme-enrich
//!
//! Soft absence never reaches these types: it is an `Option` inside the
//! enrichment pipeline. Everything here is a hard failure that stops the
//! current identifier.

use crate::services::mme_calculator::MmeError;
use crate::services::rxnav_client::RxNavError;
use thiserror::Error;

/// Enrichment pipeline error
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Terminology service failure (after transient retries)
    #[error("Terminology service error: {0}")]
    RxNav(#[from] RxNavError),

    /// Ingredient data that cannot be converted
    #[error("MME calculation error: {0}")]
    Mme(#[from] MmeError),

    /// Output table error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// rxmme-common error (database, configuration)
    #[error("Common error: {0}")]
    Common(#[from] rxmme_common::Error),
}

impl EnrichError {
    /// Whether the failure may clear up on a later run without data changes
    pub fn is_transient(&self) -> bool {
        match self {
            EnrichError::RxNav(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for EnrichError {
    fn from(err: sqlx::Error) -> Self {
        EnrichError::Common(rxmme_common::Error::Database(err))
    }
}

/// Result type for the enrichment pipeline
pub type EnrichResult<T> = Result<T, EnrichError>;
