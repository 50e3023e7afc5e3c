//! rxmme-enrich library interface
//!
//! Exposes the enrichment pipeline for the binary and integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{EnrichError, EnrichResult};
