//! Write the reconstructed table as a formatted workbook.
//!
//! Money columns become real numbers with a `#,##0.00` format so the
//! sheet sums and sorts; everything the number parse rejects stays text.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

use ledgerlift_core::OutputTable;

/// Money columns become numbers; every other column writes as text.
fn is_money_column(header: &str) -> bool {
    let h = header.to_lowercase();
    ["debit", "credit", "balance", "amount"]
        .iter()
        .any(|k| h.contains(k))
}

/// Description-style columns get room to breathe; the rest stay compact.
fn column_width(header: &str) -> f64 {
    let h = header.to_lowercase();
    if ["description", "particulars", "narration", "details"]
        .iter()
        .any(|k| h.contains(k))
    {
        45.0
    } else {
        14.0
    }
}

/// Parse a money cell, grouping commas ignored. Empty cells stay empty.
fn money_value(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

pub fn write_xlsx(table: &OutputTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook
        .add_worksheet()
        .set_name("Transactions")
        .context("naming worksheet")?;

    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format("#,##0.00");

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, header, &header_format)?;
        sheet.set_column_width(col, column_width(header))?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let col = c as u16;
            // Fallback tables can be ragged; spill columns write as text.
            let money = table.headers.get(c).is_some_and(|h| is_money_column(h));
            if money {
                if let Some(n) = money_value(cell) {
                    sheet.write_number_with_format(r, col, n, &money_format)?;
                    continue;
                }
            }
            if !cell.is_empty() {
                sheet.write_string(r, col, cell)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    info!(rows = table.rows.len(), path = %path.display(), "wrote xlsx");
    Ok(())
}
