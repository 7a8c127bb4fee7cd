//! Statement-vs-tabular routing.
//!
//! Cheap vocabulary presence over the whole text decides whether the
//! heavyweight statement machinery runs at all; everything else goes to
//! the generic tabular fallback.

/// Vocabulary whose presence marks bank-statement text.
pub const STATEMENT_VOCABULARY: &[&str] = &[
    "balance",
    "debit",
    "credit",
    "account number",
    "withdrawal",
    "deposit",
    "statement",
    "transaction",
    "opening balance",
    "closing balance",
    "account title",
    "iban",
    "branch",
    "currency",
    "available balance",
    "value date",
    "cheque",
    "remittance",
];

/// Distinct vocabulary terms needed before text is treated as a statement.
pub const STATEMENT_SCORE_THRESHOLD: usize = 3;

/// Count distinct vocabulary terms present in `text`.
pub fn statement_score(text: &str) -> usize {
    let lower = text.to_lowercase();
    STATEMENT_VOCABULARY
        .iter()
        .filter(|term| lower.contains(*term))
        .count()
}

pub fn is_bank_statement(text: &str) -> bool {
    statement_score(text) >= STATEMENT_SCORE_THRESHOLD
}
