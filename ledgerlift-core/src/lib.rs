//! ledgerlift-core: heuristics that rebuild transaction tables from
//! layout-corrupted statement text

pub mod amounts;
pub mod assembler;
pub mod classify;
pub mod columns;
pub mod dates;
pub mod fallback;
pub mod lines;
pub mod polarity;
pub mod table;

pub use amounts::AmountToken;
pub use assembler::{TransactionAssembler, parse_statement};
pub use classify::{STATEMENT_SCORE_THRESHOLD, is_bank_statement, statement_score};
pub use columns::{ColumnParse, disambiguate};
pub use dates::{DateMatch, find_date};
pub use polarity::{AmountAssignment, Polarity, PolarityPolicy};
pub use table::{
    OUTPUT_HEADERS, OutputTable, ParseOutcome, TransactionDraft, TransactionRecord,
};

use tracing::info;

/// Parse any extracted document text.
///
/// Statements go through the full line-classification pipeline; anything
/// else falls back to generic whitespace-table parsing so the caller still
/// gets rows out of a non-statement document.
pub fn parse_document(text: &str, policy: &PolarityPolicy) -> ParseOutcome {
    if is_bank_statement(text) {
        let outcome = parse_statement(text, policy);
        info!(
            rows = outcome.records_emitted,
            lines = outcome.lines_scanned,
            "parsed statement"
        );
        return outcome;
    }

    let table = fallback::parse_tabular(text);
    info!(rows = table.rows.len(), "not a statement; generic table fallback");
    ParseOutcome {
        records_emitted: table.rows.len(),
        lines_scanned: text.lines().count(),
        table,
        is_bank_statement: false,
        warnings: Vec::new(),
        rows_without_amounts: 0,
    }
}
