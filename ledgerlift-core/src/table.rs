//! Row, table, and outcome types shared across the extraction pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column headers of the reconstructed statement table, in output order.
pub const OUTPUT_HEADERS: [&str; 6] = [
    "Date",
    "Description",
    "Cheq/Inst#",
    "Debit",
    "Credit",
    "Balance",
];

/// An amount accumulated on an in-progress transaction.
///
/// `tail_fraction` records where the token started within its physical line
/// (0.0 = line start, approaching 1.0 = line end). Single-amount
/// classification needs it long after the line itself is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftAmount {
    pub value: String,
    pub tail_fraction: f32,
}

/// Mutable in-progress transaction. The assembler owns exactly one at a
/// time; debit/credit/balance are assigned only at finalization, once the
/// full multi-line description is known.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub date: String,
    pub parsed_date: Option<NaiveDate>,
    pub description: String,
    pub instrument_ref: Option<String>,
    pub amounts: Vec<DraftAmount>,
}

impl TransactionDraft {
    /// Append a description fragment with a single-space join.
    pub fn push_description(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(fragment);
    }

    pub fn has_amounts(&self) -> bool {
        !self.amounts.is_empty()
    }
}

/// One finalized statement row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: String,
    pub parsed_date: Option<NaiveDate>,
    pub description: String,
    pub instrument_ref: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub balance: Option<String>,
}

impl TransactionRecord {
    /// Render as output-table cells, in `OUTPUT_HEADERS` order.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.description.clone(),
            self.instrument_ref.clone().unwrap_or_default(),
            self.debit.clone().unwrap_or_default(),
            self.credit.clone().unwrap_or_default(),
            self.balance.clone().unwrap_or_default(),
        ]
    }
}

/// Header row plus data rows, ready for a writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Sort records for output: undated rows first, then by date ascending.
///
/// The sort is stable, so rows sharing a date keep the order they were
/// encountered in the document.
pub fn sort_records(records: &mut [TransactionRecord]) {
    records.sort_by_key(|r| r.parsed_date);
}

/// Build the statement output table from already-sorted records.
pub fn records_to_table(records: &[TransactionRecord]) -> OutputTable {
    OutputTable {
        headers: OUTPUT_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: records.iter().map(TransactionRecord::to_cells).collect(),
    }
}

/// Everything one parse produces: the table plus non-fatal diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub table: OutputTable,
    pub is_bank_statement: bool,
    pub warnings: Vec<String>,
    pub lines_scanned: usize,
    pub records_emitted: usize,
    pub rows_without_amounts: usize,
}
