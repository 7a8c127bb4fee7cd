//! CSV output for the reconstructed table.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use ledgerlift_core::OutputTable;

/// Write headers plus rows. The writer is flexible because fallback
/// tables carry whatever column counts the source document had.
pub fn write_csv(table: &OutputTable, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!(rows = table.rows.len(), path = %path.display(), "wrote csv");
    Ok(())
}
