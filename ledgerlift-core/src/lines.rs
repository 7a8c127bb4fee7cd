//! Line-level predicates: column headers, end markers, metadata, and the
//! "could this line start a transaction?" test.
//!
//! These are keyword scans over the lower-cased line, kept as plain data
//! so the vocabulary is inspectable in one place.

use regex::Regex;
use std::sync::OnceLock;

use crate::amounts;
use crate::dates;

/// Words that mark the date column in a table header.
const HEADER_DATE_TERMS: &[&str] = &["date"];

/// Words that mark the description column.
const HEADER_DESC_TERMS: &[&str] = &[
    "description",
    "particulars",
    "narration",
    "details",
    "remarks",
    "transaction",
];

/// Words that mark a money column.
const HEADER_AMOUNT_TERMS: &[&str] = &[
    "debit",
    "credit",
    "amount",
    "withdrawal",
    "deposit",
    "balance",
];

/// Phrases that definitively end a transaction section. Page numbers and
/// "continued" markers are deliberately absent: tables survive those.
const END_MARKERS: &[&str] = &[
    "closing balance",
    "end of statement",
    "statement summary",
    "statement period",
    "total debit",
    "total credit",
    "total withdrawals",
    "total deposits",
    "grand total",
    "system generated",
];

/// Document-furniture phrases. A date on such a line belongs to the
/// document, not to a transaction.
const METADATA_TERMS: &[&str] = &[
    "statement date",
    "statement of account",
    "account number",
    "account no",
    "account title",
    "iban",
    "branch code",
    "customer id",
    "period from",
    "print date",
    "report date",
];

/// Earliest position of any term at or after `from`.
fn find_after(haystack: &str, terms: &[&str], from: usize) -> Option<usize> {
    let tail = haystack.get(from..)?;
    terms
        .iter()
        .filter_map(|t| tail.find(t).map(|i| from + i))
        .min()
}

/// Column-header detection: a date word, then a description word, then an
/// amount word, in that order.
pub fn is_transaction_header_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    let Some(date_at) = find_after(&lower, HEADER_DATE_TERMS, 0) else {
        return false;
    };
    let Some(desc_at) = find_after(&lower, HEADER_DESC_TERMS, date_at + 1) else {
        return false;
    };
    find_after(&lower, HEADER_AMOUNT_TERMS, desc_at + 1).is_some()
}

pub fn is_definitive_end_marker(line: &str) -> bool {
    let lower = line.to_lowercase();
    END_MARKERS.iter().any(|m| lower.contains(m))
}

pub fn is_metadata_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    METADATA_TERMS.iter().any(|m| lower.contains(m))
}

fn furniture_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:page\s+\d+(?:\s+of\s+\d+)?|-\s*\d+\s*-|\d{1,2}|continued(?:\s+on\s+next\s+page)?\.*|\.{3,})\s*$",
        )
        .expect("page furniture regex")
    })
}

/// Page numbers, "continued" markers, dot leaders. Never a continuation,
/// never an end marker.
pub fn is_page_furniture(line: &str) -> bool {
    furniture_re().is_match(line)
}

/// Could this line open a transaction section on its own?
///
/// Needs a real date plus amount-shaped evidence, and must not read as a
/// header or an end marker. Metadata phrases alone do not disqualify:
/// descriptions legitimately mention IBANs and account numbers.
pub fn is_transaction_line(line: &str) -> bool {
    if is_transaction_header_line(line) || is_definitive_end_marker(line) {
        return false;
    }
    let Some(dm) = dates::find_date(line) else {
        return false;
    };
    has_amount_evidence(line, dm.span())
}

/// A strict-grammar amount anywhere, or any ≥3-digit run outside the date.
fn has_amount_evidence(line: &str, date_span: (usize, usize)) -> bool {
    if !amounts::primary_tokens(line).is_empty() {
        return true;
    }
    let (ds, de) = date_span;
    amounts::digit_runs(line).any(|(s, e)| e <= ds || s >= de)
}
