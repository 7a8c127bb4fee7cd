//! Monetary token extraction.
//!
//! Statement text mixes real amounts with dates, years, account numbers,
//! and digit runs shed by broken layouts. The tokenizer runs two grammars:
//! a strict money grammar (optional grouping commas, exactly two decimals)
//! and a bare-run recovery grammar for text that lost its decimal points.
//! A fixed order of exclusion filters then removes everything that merely
//! looks like money.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// A monetary token with its location in the source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountToken {
    /// Numeric text, currency markers stripped, grouping commas kept.
    pub value: String,
    /// Byte offset where the numeric text begins.
    pub position: usize,
    /// Byte offset including a leading currency marker, when one is glued on.
    pub marker_start: usize,
}

impl AmountToken {
    pub fn end(&self) -> usize {
        self.position + self.value.len()
    }

    /// Full claimed span, currency marker included.
    pub fn span(&self) -> (usize, usize) {
        (self.marker_start, self.end())
    }
}

fn primary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\b(?:rs|pkr|usd|eur|gbp)\.?\s*|[$€£]\s*)?(\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2})\b")
            .expect("money regex")
    })
}

fn bare_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d{3,}").expect("digit run regex"))
}

/// Strict-grammar tokens in `text`, glue-filtered, no positional rules.
/// Offsets are relative to `text`.
pub(crate) fn primary_tokens(text: &str) -> Vec<AmountToken> {
    let mut out = Vec::new();
    for caps in primary_re().captures_iter(text) {
        let (Some(whole), Some(num)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if glued(text, whole.start(), num.end()) {
            continue;
        }
        let value = num.as_str().to_string();
        if below_decimal_floor(&value) {
            continue;
        }
        out.push(AmountToken {
            value,
            position: num.start(),
            marker_start: whole.start(),
        });
    }
    out
}

/// All ≥3-digit runs in `text` as byte spans, grammar only, no filters.
pub(crate) fn digit_runs(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    bare_run_re().find_iter(text).map(|m| (m.start(), m.end()))
}

/// Treat a whole trimmed cell as one recovered amount, if it qualifies.
pub(crate) fn whole_cell_bare_token(text: &str) -> Option<String> {
    let t = text.trim();
    let m = bare_run_re().find(t)?;
    if m.start() != 0 || m.end() != t.len() {
        return None;
    }
    let value = m.as_str();
    if is_year_like(value) || is_account_number_like(value) || below_bare_floor(value) {
        return None;
    }
    Some(value.to_string())
}

/// Does `text`, in its entirety, read as a single amount?
pub(crate) fn is_pure_amount(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    if let [tok] = primary_tokens(t).as_slice() {
        if tok.marker_start == 0 && tok.end() == t.len() {
            return true;
        }
    }
    if let Some(m) = bare_run_re().find(t) {
        if m.start() == 0 && m.end() == t.len() {
            return true;
        }
    }
    false
}

/// Extract the amount tokens of one line, ordered by position.
///
/// `date_span` is the byte span of the line's date, when it has one. The
/// bare-run recovery grammar only applies to the tail of the line: after
/// the date's end, or the final 40% when there is no date. Early digit
/// runs are refs and codes far more often than amounts.
pub fn extract_amounts(line: &str, date_span: Option<(usize, usize)>) -> Vec<AmountToken> {
    let mut tokens = primary_tokens(line);

    let tail_from = match date_span {
        Some((_, end)) => end,
        None => line.len() * 3 / 5,
    };

    let claimed: Vec<(usize, usize)> = tokens.iter().map(AmountToken::span).collect();
    for (start, end) in digit_runs(line) {
        if start < tail_from {
            continue;
        }
        if claimed.iter().any(|&(s, e)| start < e && end > s) {
            continue;
        }
        if glued(line, start, end) {
            continue;
        }
        let value = &line[start..end];
        if is_year_like(value) || is_account_number_like(value) || below_bare_floor(value) {
            continue;
        }
        tokens.push(AmountToken {
            value: value.to_string(),
            position: start,
            marker_start: start,
        });
    }

    // Date digits are never amounts.
    if let Some((ds, de)) = date_span {
        tokens.retain(|t| t.end() <= ds || t.marker_start >= de);
    }

    tokens.sort_by_key(|t| t.position);

    // On a crowded line only the rightmost three can be money columns.
    if tokens.len() > 3 {
        let dropped = tokens.len() - 3;
        debug!("ignoring {dropped} early amount candidates");
        tokens.drain(..dropped);
    }
    tokens
}

/// True when the span is glued to neighboring digit material and is
/// therefore a fragment of something larger, not a standalone amount.
fn glued(text: &str, start: usize, end: usize) -> bool {
    let b = text.as_bytes();
    if start > 0 {
        let prev = b[start - 1];
        if prev.is_ascii_digit() {
            return true;
        }
        if (prev == b'.' || prev == b',') && start >= 2 && b[start - 2].is_ascii_digit() {
            return true;
        }
    }
    if end < b.len() {
        let next = b[end];
        if next.is_ascii_digit() {
            return true;
        }
        if (next == b'.' || next == b',') && end + 1 < b.len() && b[end + 1].is_ascii_digit() {
            return true;
        }
    }
    false
}

/// Four digits in the plausible-year range are a year, not an amount.
fn is_year_like(value: &str) -> bool {
    value.len() == 4
        && value.bytes().all(|b| b.is_ascii_digit())
        && (1900..=2100).contains(&value.parse::<i32>().unwrap_or(0))
}

/// 12–15 digit runs with ≥3 leading zeros or a ≥10 repeated-digit run are
/// account numbers.
fn is_account_number_like(value: &str) -> bool {
    let digits: Vec<u8> = value.bytes().filter(u8::is_ascii_digit).collect();
    if !(12..=15).contains(&digits.len()) {
        return false;
    }
    if digits.iter().take_while(|&&b| b == b'0').count() >= 3 {
        return true;
    }
    let mut run = 1usize;
    let mut longest = 1usize;
    for pair in digits.windows(2) {
        if pair[0] == pair[1] {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }
    longest >= 10
}

fn below_decimal_floor(value: &str) -> bool {
    value.replace(',', "").parse::<f64>().map(|v| v < 0.01).unwrap_or(true)
}

/// Recovered bare runs under 10 are noise, not money.
fn below_bare_floor(value: &str) -> bool {
    value.replace(',', "").parse::<f64>().map(|v| v < 10.0).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(line: &str, date_span: Option<(usize, usize)>) -> Vec<String> {
        extract_amounts(line, date_span)
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    /// Regression test: date digits and the year survive neither grammar.
    #[test]
    fn test_date_and_year_digits_are_not_amounts() {
        let line = "Fee 03-07-2024 SMS Charge 215.00 50000.00";
        assert_eq!(values(line, Some((4, 14))), ["215.00", "50000.00"]);
    }

    #[test]
    fn test_primary_grammar_keeps_grouping_commas() {
        let toks = extract_amounts("1,473,120.94", None);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].value, "1,473,120.94");
        assert_eq!(toks[0].span(), (0, 12));
    }

    #[test]
    fn test_currency_marker_is_stripped_but_claimed() {
        let toks = extract_amounts("charge Rs. 1,500.00 applied", None);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].value, "1,500.00");
        assert_eq!(toks[0].position, 11);
        assert_eq!(toks[0].span(), (7, 19));
    }

    #[test]
    fn test_glued_spans_are_fragments() {
        // A digit directly before or after the span disqualifies it.
        assert!(values("1,23456.00", None).is_empty());
        assert!(values("raw 500.00,600.00", None).is_empty());
    }

    #[test]
    fn test_bare_runs_only_count_in_the_tail() {
        // No date: the run sits in the first 60% of the line, so it stays text.
        assert!(values("445566 something something else", None).is_empty());
        // Same run in the tail is recovered.
        assert_eq!(values("something something else 445566", None), ["445566"]);
    }

    #[test]
    fn test_account_number_shapes_are_excluded() {
        assert!(values("the reference code is 000123456789", None).is_empty());
        assert!(values("the reference code is 111111111156", None).is_empty());
        // A 12-digit run without the marks is left alone.
        assert_eq!(
            values("the reference code is 123456789012", None),
            ["123456789012"]
        );
    }

    #[test]
    fn test_zero_amount_is_below_floor() {
        assert!(values("0.00", None).is_empty());
    }

    #[test]
    fn test_keeps_only_last_three_on_crowded_lines() {
        let line = "10.00 20.00 30.00 40.00 50.00";
        assert_eq!(values(line, None), ["30.00", "40.00", "50.00"]);
    }

    #[test]
    fn test_whole_cell_bare_token() {
        assert_eq!(whole_cell_bare_token(" 445566 "), Some("445566".to_string()));
        assert_eq!(whole_cell_bare_token("114,608"), Some("114,608".to_string()));
        assert_eq!(whole_cell_bare_token("2024"), None);
        assert_eq!(whole_cell_bare_token("445566 extra"), None);
    }

    #[test]
    fn test_is_pure_amount() {
        assert!(is_pure_amount("1,500.00"));
        assert!(is_pure_amount("Rs 1,500.00"));
        assert!(is_pure_amount("445566"));
        assert!(!is_pure_amount("Ref 445566"));
        assert!(!is_pure_amount(""));
    }
}
