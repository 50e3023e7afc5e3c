//! Input identifier list

use crate::error::EnrichResult;
use std::path::Path;

/// Identifiers from newline-separated text, trimmed, blank lines skipped
///
/// Order and duplicates are preserved; the batch runner's skip check handles
/// repeats.
pub fn parse_ndc_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read the identifier list file at `path`
pub fn read_ndc_list(path: &Path) -> EnrichResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let ndcs = parse_ndc_list(&text);
    tracing::info!(count = ndcs.len(), path = %path.display(), "Loaded NDC list");
    Ok(ndcs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_skips_blank_lines() {
        let ndcs = parse_ndc_list("  00406052301\r\n\n\t\n00093302255  \n00406052301\n");
        assert_eq!(ndcs, vec!["00406052301", "00093302255", "00406052301"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_ndc_list(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, crate::error::EnrichError::Io(_)));
    }
}
