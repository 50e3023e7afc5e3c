//! Output table projection
//!
//! Writes the result store as CSV: a fixed header naming every column, then
//! one row per record in store order. Absent values are empty cells.

use crate::error::EnrichResult;
use crate::models::{ResultStore, COLUMNS};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write `store` as CSV to `output`
pub fn write_table<W: Write>(store: &ResultStore, output: W) -> EnrichResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    // Header written explicitly so an empty store still yields every column
    writer.write_record(COLUMNS)?;
    for record in store.iter() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write `store` to the CSV file at `path`, replacing any previous table
pub fn export_csv(store: &ResultStore, path: &Path) -> EnrichResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    write_table(store, file)?;

    tracing::info!(rows = store.len(), path = %path.display(), "Output table written");
    Ok(())
}
