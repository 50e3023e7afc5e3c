//! Test Helper Utilities
//!
//! Shared utilities for rxmme-enrich integration tests

pub mod fake_rxnav;

pub use fake_rxnav::{FakeRxNav, RxNavFixture};

use rxmme_common::config::RxNavSettings;

/// Client settings pointing at a fake server, without rate limiting
pub fn test_settings(base_url: &str) -> RxNavSettings {
    RxNavSettings {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        rate_limit_ms: 0,
        max_retry_wait_ms: 2_000,
    }
}

/// Write a newline-separated NDC list to `path`
pub fn write_ndc_file(path: &std::path::Path, ndcs: &[&str]) {
    std::fs::write(path, ndcs.join("\n")).unwrap();
}
