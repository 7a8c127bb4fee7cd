//! Generic tabular fallback for text the classifier rejects.
//!
//! No transaction semantics here: the first non-empty line becomes the
//! header and every later non-empty line becomes a row, split on tabs or
//! runs of spaces. Good enough that a CSV-ish export still round-trips.

use regex::Regex;
use std::sync::OnceLock;

use crate::table::OutputTable;

fn gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("gap split regex"))
}

/// Split arbitrary tabular text into a header row and data rows.
pub fn parse_tabular(text: &str) -> OutputTable {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_generic(line);
        if headers.is_empty() {
            headers = cells;
        } else {
            rows.push(cells);
        }
    }
    OutputTable { headers, rows }
}

fn split_generic(line: &str) -> Vec<String> {
    let cells: Vec<String> = if line.contains('\t') {
        line.split('\t')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        gap_re()
            .split(line)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    };
    if cells.is_empty() {
        vec![line.trim().to_string()]
    } else {
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line_is_the_header() {
        let table = parse_tabular("Name\tQty\tPrice\nWidget\t3\t9.99\n\nGadget\t1\t4.50");
        assert_eq!(table.headers, ["Name", "Qty", "Price"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], ["Widget", "3", "9.99"]);
        assert_eq!(table.rows[1], ["Gadget", "1", "4.50"]);
    }

    #[test]
    fn test_space_runs_split_when_there_are_no_tabs() {
        let table = parse_tabular("Name   Qty   Price\nWidget  3  9.99");
        assert_eq!(table.headers, ["Name", "Qty", "Price"]);
        assert_eq!(table.rows[0], ["Widget", "3", "9.99"]);
    }

    #[test]
    fn test_undelimited_lines_become_single_cells() {
        let table = parse_tabular("Report Title\nsingle line of prose");
        assert_eq!(table.headers, ["Report Title"]);
        assert_eq!(table.rows[0], ["single line of prose"]);
    }
}
