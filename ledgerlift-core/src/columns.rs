//! Column disambiguation: which bytes of a line are the description, the
//! instrument reference, and the money columns.
//!
//! Layout corruption means cell boundaries cannot be trusted, so every
//! path tracks byte spans and the description is rebuilt as the complement
//! of everything claimed, never by re-splitting text.

use regex::Regex;
use std::sync::OnceLock;

use crate::amounts::{self, AmountToken};
use crate::dates::DateMatch;

/// Result of splitting one physical line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnParse {
    pub description: String,
    pub instrument_ref: Option<String>,
    pub amounts: Vec<AmountToken>,
}

/// A trimmed cell and its byte range in the source line.
#[derive(Debug, Clone, Copy)]
struct Cell {
    start: usize,
    end: usize,
}

fn tab_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\t+").expect("tab split regex"))
}

fn wide_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {3,}").expect("wide gap regex"))
}

fn narrow_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("narrow gap regex"))
}

/// Ordered instrument-reference patterns. Earlier patterns are more
/// specific; the first hit wins.
fn instrument_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            // Tagged codes: "Cheque No. 123", "CHQ#000123", "Ref 445566".
            r"(?i)\b(?:cheque|cheq|chq|instrument|instr?|ref)\.?\s*(?:no\.?|#)?\s*:?\s*[a-z]*\d[a-z0-9/-]*",
            // IBAN-shaped references.
            r"(?i)\b[a-z]{2}\d{2}[a-z0-9]{10,}\b",
            // Scheme tags with a trailing code: "ATM/1234", "RAAST P2P 998877".
            r"(?i)\b(?:ibft|raast|swift|atm|pos|neft|rtgs|ach)\b[\s#:/-]*[a-z]*\d[a-z0-9/-]*",
            // Bare scheme phrases.
            r"(?i)\b(?:funds? transfer|point[- ]of[- ]sale|inter[- ]?bank transfer)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("instrument regex"))
        .collect()
    })
}

/// Split one delimited line into trimmed cells with byte offsets.
fn split_cells(line: &str, delimiter: &Regex) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut cursor = 0;
    for m in delimiter.find_iter(line) {
        push_cell(line, cursor, m.start(), &mut cells);
        cursor = m.end();
    }
    push_cell(line, cursor, line.len(), &mut cells);
    cells
}

fn push_cell(line: &str, start: usize, end: usize, out: &mut Vec<Cell>) {
    let raw = &line[start..end];
    let t_start = start + (raw.len() - raw.trim_start().len());
    let t_end = end - (raw.len() - raw.trim_end().len());
    if t_start < t_end {
        out.push(Cell {
            start: t_start,
            end: t_end,
        });
    }
}

/// Scan the ordered instrument patterns; the first hit outside the date
/// span wins. A hit must contain a letter, must not itself be an amount,
/// and must not bite into money text that continues past the match.
fn find_instrument(line: &str, date_span: Option<(usize, usize)>) -> Option<(usize, usize, String)> {
    let money = amounts::primary_tokens(line);
    for re in instrument_res() {
        for m in re.find_iter(line) {
            if let Some((ds, de)) = date_span {
                if m.start() < de && m.end() > ds {
                    continue;
                }
            }
            if money
                .iter()
                .any(|t| m.start() < t.end() && m.end() > t.marker_start)
            {
                continue;
            }
            let bytes = line.as_bytes();
            let glued_digit = match bytes.get(m.end()).copied() {
                Some(b) if b.is_ascii_digit() => true,
                Some(b',') => bytes.get(m.end() + 1).is_some_and(u8::is_ascii_digit),
                _ => false,
            };
            if glued_digit {
                continue;
            }
            let text = m.as_str().trim().trim_end_matches([',', '.', ':']);
            if !text.chars().any(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            if amounts::is_pure_amount(text) {
                continue;
            }
            return Some((m.start(), m.end(), text.to_string()));
        }
    }
    None
}

/// Tokens for a cell that is money through and through: one or more
/// strict-grammar amounts (glued columns produce several), or a single
/// recovered bare run. `None` when the cell carries other text.
fn cell_amount_tokens(line: &str, cell: Cell) -> Option<Vec<AmountToken>> {
    let text = &line[cell.start..cell.end];

    if let Some(value) = amounts::whole_cell_bare_token(text) {
        return Some(vec![AmountToken {
            position: cell.start,
            marker_start: cell.start,
            value,
        }]);
    }

    let tokens = amounts::primary_tokens(text);
    if tokens.is_empty() {
        return None;
    }
    // Everything outside the tokens must be filler, or the cell is text.
    let mut covered = vec![false; text.len()];
    for t in &tokens {
        for flag in covered
            .iter_mut()
            .take(t.end())
            .skip(t.marker_start)
        {
            *flag = true;
        }
    }
    for (i, b) in text.bytes().enumerate() {
        if covered[i] || b.is_ascii_whitespace() || b"-.,:/".contains(&b) {
            continue;
        }
        return None;
    }
    Some(shift(tokens, cell.start))
}

fn shift(tokens: Vec<AmountToken>, offset: usize) -> Vec<AmountToken> {
    tokens
        .into_iter()
        .map(|t| AmountToken {
            position: t.position + offset,
            marker_start: t.marker_start + offset,
            value: t.value,
        })
        .collect()
}

fn overlaps(cell: Cell, span: Option<(usize, usize)>) -> bool {
    match span {
        Some((s, e)) => cell.start < e && cell.end > s,
        None => false,
    }
}

/// Walk the cells of a delimited line, claiming amount tokens. Returns the
/// tokens plus, for the tab path, a fallback instrument cell: the second
/// text cell, when it has a letter and yielded no embedded amounts.
fn cells_pass(
    line: &str,
    cells: &[Cell],
    date_span: Option<(usize, usize)>,
    instrument_span: Option<(usize, usize)>,
) -> (Vec<AmountToken>, Option<Cell>) {
    let mut tokens = Vec::new();
    let mut seen_description = false;
    let mut fallback_instrument = None;

    for &cell in cells {
        if overlaps(cell, instrument_span) {
            continue;
        }
        if overlaps(cell, date_span) {
            // The central date filter strips anything that is really part
            // of the date; amounts glued onto the date cell survive.
            let text = &line[cell.start..cell.end];
            tokens.extend(shift(amounts::primary_tokens(text), cell.start));
            continue;
        }
        if let Some(mut cell_tokens) = cell_amount_tokens(line, cell) {
            tokens.append(&mut cell_tokens);
            continue;
        }

        // A text cell. The first is the description seed and is never
        // mined; later ones may hide amounts the layout glued on.
        if !seen_description {
            seen_description = true;
            continue;
        }
        let text = &line[cell.start..cell.end];
        let embedded = shift(amounts::primary_tokens(text), cell.start);
        if embedded.is_empty()
            && fallback_instrument.is_none()
            && text.chars().any(|c| c.is_ascii_alphabetic())
        {
            fallback_instrument = Some(cell);
        }
        tokens.extend(embedded);
    }
    (tokens, fallback_instrument)
}

/// Split `line` into description, instrument reference, and amounts.
pub fn disambiguate(line: &str, date: Option<&DateMatch>) -> ColumnParse {
    let date_span = date.map(DateMatch::span);

    let mut instrument = find_instrument(line, date_span);
    let mut tokens;

    if line.contains('\t') {
        let cells = split_cells(line, tab_re());
        let instrument_span = instrument.as_ref().map(|&(s, e, _)| (s, e));
        let (cell_tokens, fallback) = cells_pass(line, &cells, date_span, instrument_span);
        tokens = cell_tokens;
        if instrument.is_none() {
            // Tab layouts are authoritative: trust cell order for the ref.
            if let Some(cell) = fallback {
                let text = line[cell.start..cell.end].trim();
                instrument = Some((cell.start, cell.end, text.to_string()));
            }
        }
    } else {
        let mut cells = split_cells(line, wide_gap_re());
        if cells.len() < 2 {
            cells = split_cells(line, narrow_gap_re());
        }
        if cells.len() >= 2 {
            let instrument_span = instrument.as_ref().map(|&(s, e, _)| (s, e));
            (tokens, _) = cells_pass(line, &cells, date_span, instrument_span);
        } else {
            tokens = amounts::extract_amounts(line, date_span);
        }
    }

    if let Some((is_, ie, _)) = instrument {
        tokens.retain(|t| t.end() <= is_ || t.marker_start >= ie);
    }
    if let Some((ds, de)) = date_span {
        tokens.retain(|t| t.end() <= ds || t.marker_start >= de);
    }
    tokens.sort_by_key(|t| t.position);
    if tokens.len() > 3 {
        tokens.drain(..tokens.len() - 3);
    }

    let mut claimed: Vec<(usize, usize)> = tokens.iter().map(AmountToken::span).collect();
    if let Some(span) = date_span {
        claimed.push(span);
    }
    if let Some((s, e, _)) = &instrument {
        claimed.push((*s, *e));
    }

    ColumnParse {
        description: complement_description(line, &claimed),
        instrument_ref: instrument.map(|(_, _, text)| text),
        amounts: tokens,
    }
}

/// Rebuild the description from every byte nobody claimed.
fn complement_description(line: &str, claimed: &[(usize, usize)]) -> String {
    let mut keep = vec![true; line.len()];
    for &(s, e) in claimed {
        for flag in keep.iter_mut().take(e.min(line.len())).skip(s) {
            *flag = false;
        }
    }
    let mut out = String::with_capacity(line.len());
    for (i, ch) in line.char_indices() {
        if keep[i] {
            out.push(ch);
        } else {
            // Preserve word separation where spans were cut out.
            out.push(' ');
        }
    }
    cleanup_description(&out)
}

fn bare_digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{6,}$").expect("bare digits regex"))
}

fn grouped_fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}(?:,\d{3})+(?:\.\d+)?$").expect("grouped fragment regex"))
}

fn dot_fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\.\d{1,2}$").expect("dot fragment regex"))
}

/// Drop leftover column artifacts the span passes did not claim.
pub(crate) fn cleanup_description(text: &str) -> String {
    text.split_whitespace()
        .filter(|tok| !is_residual_fragment(tok))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_residual_fragment(token: &str) -> bool {
    if token.chars().all(|c| matches!(c, '|' | ':' | '-' | ',' | '.')) {
        return true;
    }
    bare_digits_re().is_match(token)
        || grouped_fragment_re().is_match(token)
        || dot_fragment_re().is_match(token)
}
