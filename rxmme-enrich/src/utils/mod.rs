//! Utility modules for rxmme-enrich

pub mod retry;

pub use retry::retry_transient;
