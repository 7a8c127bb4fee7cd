//! The transaction assembler: a line-at-a-time state machine that groups
//! physical lines into logical transactions.
//!
//! States:
//! - `BeforeSection`: still looking for a transaction table
//! - `InSectionIdle`: inside a table, no transaction open
//! - `InSectionBuilding`: inside a table, one draft accumulating lines
//!
//! The assembler owns the only draft in the pipeline; every classifier it
//! calls stays stateless. Sections can close and reopen (multi-page
//! tables), and a closed section never loses rows already finalized.

use tracing::{debug, warn};

use crate::columns;
use crate::dates::{self, DateMatch};
use crate::lines;
use crate::polarity::{self, PolarityPolicy};
use crate::table::{
    DraftAmount, ParseOutcome, TransactionDraft, TransactionRecord, records_to_table, sort_records,
};

/// Consecutive unrecognized lines that close a section. Blank lines
/// neither count toward this nor reset it.
const NOISE_LINE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    BeforeSection,
    InSectionIdle,
    InSectionBuilding,
}

pub struct TransactionAssembler<'a> {
    policy: &'a PolarityPolicy,
    state: SectionState,
    /// Populated exactly when state is `InSectionBuilding`.
    draft: Option<TransactionDraft>,
    noise_run: usize,
    records: Vec<TransactionRecord>,
    warnings: Vec<String>,
    lines_scanned: usize,
    rows_without_amounts: usize,
}

impl<'a> TransactionAssembler<'a> {
    pub fn new(policy: &'a PolarityPolicy) -> Self {
        Self {
            policy,
            state: SectionState::BeforeSection,
            draft: None,
            noise_run: 0,
            records: Vec::new(),
            warnings: Vec::new(),
            lines_scanned: 0,
            rows_without_amounts: 0,
        }
    }

    /// Feed one physical line.
    pub fn feed(&mut self, line: &str) {
        self.lines_scanned += 1;

        if line.trim().is_empty() {
            // A blank ends the current transaction but not the section.
            self.finalize_draft();
            return;
        }

        if lines::is_transaction_header_line(line) {
            debug!("column header enters section: {}", line.trim());
            self.finalize_draft();
            self.state = SectionState::InSectionIdle;
            self.noise_run = 0;
            return;
        }

        if lines::is_definitive_end_marker(line) {
            if self.state != SectionState::BeforeSection {
                debug!("end marker closes section: {}", line.trim());
                self.finalize_draft();
                self.state = SectionState::BeforeSection;
            }
            self.noise_run = 0;
            return;
        }

        if let Some(record) = opening_balance_record(line) {
            self.finalize_draft();
            self.records.push(record);
            self.noise_run = 0;
            return;
        }

        let date = dates::find_date(line);
        if let Some(dm) = &date {
            // Outside a section a date alone is not enough; inside, any
            // dated non-metadata line starts the next transaction. A
            // metadata phrase is overruled when the line is fully
            // transaction-shaped.
            let opens = match self.state {
                SectionState::BeforeSection => lines::is_transaction_line(line),
                _ => !lines::is_metadata_line(line) || lines::is_transaction_line(line),
            };
            if opens {
                self.finalize_draft();
                self.open_draft(line, dm);
                self.state = SectionState::InSectionBuilding;
                self.noise_run = 0;
                return;
            }
        }

        if self.state == SectionState::InSectionBuilding
            && !lines::is_metadata_line(line)
            && !lines::is_page_furniture(line)
            && line.chars().any(|c| c.is_alphanumeric())
        {
            self.extend_draft(line);
            self.noise_run = 0;
            return;
        }

        self.noise_run += 1;
        if self.state != SectionState::BeforeSection && self.noise_run >= NOISE_LINE_LIMIT {
            debug!("{} unrecognized lines; closing section", self.noise_run);
            self.finalize_draft();
            self.state = SectionState::BeforeSection;
            self.noise_run = 0;
        }
    }

    /// Close out and produce the ordered outcome.
    pub fn finish(mut self) -> ParseOutcome {
        self.finalize_draft();
        let records_emitted = self.records.len();
        sort_records(&mut self.records);
        ParseOutcome {
            table: records_to_table(&self.records),
            is_bank_statement: true,
            warnings: self.warnings,
            lines_scanned: self.lines_scanned,
            records_emitted,
            rows_without_amounts: self.rows_without_amounts,
        }
    }

    fn open_draft(&mut self, line: &str, dm: &DateMatch) {
        let parsed = columns::disambiguate(line, Some(dm));
        let mut draft = TransactionDraft {
            date: dm.normalized(),
            parsed_date: Some(dm.date),
            ..Default::default()
        };
        draft.push_description(&parsed.description);
        push_amounts(&mut draft, &parsed, line.len());
        draft.instrument_ref = parsed.instrument_ref;
        self.draft = Some(draft);
    }

    fn extend_draft(&mut self, line: &str) {
        let parsed = columns::disambiguate(line, None);
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        draft.push_description(&parsed.description);
        push_amounts(draft, &parsed, line.len());
        if draft.instrument_ref.is_none() {
            draft.instrument_ref = parsed.instrument_ref;
        }
    }

    fn finalize_draft(&mut self) {
        let Some(draft) = self.draft.take() else {
            return;
        };
        if self.state == SectionState::InSectionBuilding {
            self.state = SectionState::InSectionIdle;
        }
        if !draft.has_amounts() {
            warn!("transaction dated {} carries no amounts", draft.date);
            self.warnings
                .push(format!("row dated {} has no amounts", draft.date));
            self.rows_without_amounts += 1;
        }
        // Polarity keywords may live in the claimed instrument text
        // ("Funds Transfer"), so the classifier sees both.
        let polarity_text = match &draft.instrument_ref {
            Some(r) => format!("{} {}", draft.description, r),
            None => draft.description.clone(),
        };
        let assignment = polarity::classify_amounts(self.policy, &polarity_text, &draft.amounts);
        self.records.push(TransactionRecord {
            date: draft.date,
            parsed_date: draft.parsed_date,
            description: draft.description,
            instrument_ref: draft.instrument_ref,
            debit: assignment.debit,
            credit: assignment.credit,
            balance: assignment.balance,
        });
    }
}

fn push_amounts(draft: &mut TransactionDraft, parsed: &columns::ColumnParse, line_len: usize) {
    for token in &parsed.amounts {
        let tail_fraction = if line_len == 0 {
            0.0
        } else {
            token.position as f32 / line_len as f32
        };
        draft.amounts.push(DraftAmount {
            value: token.value.clone(),
            tail_fraction,
        });
    }
}

/// Opening-balance rows bypass classification entirely: the sole amount is
/// the balance and the description is fixed. They may appear before any
/// section and without a date.
fn opening_balance_record(line: &str) -> Option<TransactionRecord> {
    if !line.to_lowercase().contains("opening balance") {
        return None;
    }
    let date = dates::find_date(line);
    let parsed = columns::disambiguate(line, date.as_ref());
    let last = parsed.amounts.last()?;
    Some(TransactionRecord {
        date: date.as_ref().map(DateMatch::normalized).unwrap_or_default(),
        parsed_date: date.as_ref().map(|d| d.date),
        description: "Opening Balance".to_string(),
        instrument_ref: None,
        debit: None,
        credit: None,
        balance: Some(last.value.clone()),
    })
}

/// Run the full statement path over `text`.
pub fn parse_statement(text: &str, policy: &PolarityPolicy) -> ParseOutcome {
    let mut assembler = TransactionAssembler::new(policy);
    for line in text.lines() {
        assembler.feed(line);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::OUTPUT_HEADERS;

    fn parse(text: &str) -> ParseOutcome {
        parse_statement(text, &PolarityPolicy::default())
    }

    fn row<'a>(outcome: &'a ParseOutcome, description: &str) -> &'a Vec<String> {
        outcome
            .table
            .rows
            .iter()
            .find(|r| r[1].contains(description))
            .unwrap()
    }

    /// Regression test: a transaction spread over four physical lines is
    /// reassembled with the right credit and balance.
    #[test]
    fn test_multi_line_transaction_assembly() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 Inward Remittance
IBFT Incoming Transfer Ref 445566
114,608.00
1,473,120.94
";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 1);
        let r = &outcome.table.rows[0];
        assert_eq!(r[0], "03-07-2024");
        assert_eq!(r[1], "Inward Remittance IBFT Incoming Transfer");
        assert_eq!(r[2], "Ref 445566");
        assert_eq!(r[3], "");
        assert_eq!(r[4], "114,608.00");
        assert_eq!(r[5], "1,473,120.94");
    }

    /// Regression test: an instrument reference and amounts sharing one
    /// physical line all survive, on an opening line and on a continuation
    /// line alike.
    #[test]
    fn test_instrument_and_amounts_share_a_line() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 Cheque Paid CHQ#000641 9,000.00 772,389.42
04-07-2024 Outward Clearing
Ref 112233 1,500.00 763,389.42
";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 2);
        let first = row(&outcome, "Cheque Paid");
        assert_eq!(first[2], "CHQ#000641");
        assert_eq!(first[3], "9,000.00");
        assert_eq!(first[5], "772,389.42");
        let second = row(&outcome, "Outward Clearing");
        assert_eq!(second[2], "Ref 112233");
        assert_eq!(second[3], "1,500.00");
        assert_eq!(second[5], "763,389.42");
    }

    /// Regression test: a doubled trailing amount fills the classified
    /// column only, never that column and the balance.
    #[test]
    fn test_doubled_amount_never_fills_two_columns() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 ATM Cash Withdrawal 500.00 500.00
";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 1);
        let r = &outcome.table.rows[0];
        assert_eq!(r[3], "500.00");
        assert_eq!(r[4], "");
        assert_eq!(r[5], "");
    }

    /// Regression test: a dated amount row whose description mentions an
    /// IBAN is a transaction, not document metadata.
    #[test]
    fn test_rows_mentioning_iban_still_parse() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 SMS Charge 215.00 50,215.00
04-07-2024 Transfer to IBAN PK36SCBL0000001123456702 5,000.00 45,000.00
";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 2);
        let r = row(&outcome, "Transfer to IBAN");
        assert_eq!(r[2], "PK36SCBL0000001123456702");
        assert_eq!(r[3], "5,000.00");
        assert_eq!(r[5], "45,000.00");
    }

    #[test]
    fn test_opening_balance_row_sorts_first_without_a_date() {
        let text = "\
Account Statement
Opening Balance 789,196.42
Date Particulars Debit Credit Balance
05-07-2024 ATM Cash Withdrawal 50,000.00 739,196.42
";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 2);
        let first = &outcome.table.rows[0];
        assert_eq!(first[0], "");
        assert_eq!(first[1], "Opening Balance");
        assert_eq!(first[5], "789,196.42");
        let second = &outcome.table.rows[1];
        assert_eq!(second[3], "50,000.00");
        assert_eq!(second[5], "739,196.42");
    }

    #[test]
    fn test_blank_line_finalizes_but_keeps_section_open() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 POS Purchase 1,200.00 98,800.00

04-07-2024 Salary Credit 250,000.00 348,800.00
";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 2);
        // Second line after the blank still parsed as a transaction.
        assert_eq!(row(&outcome, "Salary")[4], "250,000.00");
    }

    #[test]
    fn test_rows_are_date_ordered_with_stable_ties() {
        let text = "\
Date Description Debit Credit Balance
05-07-2024 Second Fee 10.00 90.00
03-07-2024 First Fee 5.00 100.00
05-07-2024 Third Fee 20.00 70.00
";
        let outcome = parse(text);
        let descriptions: Vec<&str> = outcome
            .table
            .rows
            .iter()
            .map(|r| r[1].as_str())
            .collect();
        assert_eq!(descriptions, ["First Fee", "Second Fee", "Third Fee"]);
    }

    #[test]
    fn test_end_marker_closes_and_header_reopens() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 SMS Charge 215.00 50000.00
Closing Balance 50,000.00
04-07-2024 carried forward, see overleaf
Date Description Debit Credit Balance
05-07-2024 Cheque Paid 9,000.00 40,900.00
";
        let outcome = parse(text);
        // After the end marker a date alone is not enough to reopen; the
        // amount-free dated line is dropped, the second header reopens.
        assert_eq!(outcome.records_emitted, 2);
        let descriptions: Vec<&str> = outcome
            .table
            .rows
            .iter()
            .map(|r| r[1].as_str())
            .collect();
        assert!(descriptions.iter().any(|d| d.contains("SMS Charge")));
        assert!(descriptions.iter().any(|d| d.contains("Cheque Paid")));
        assert!(!descriptions.iter().any(|d| d.contains("overleaf")));
    }

    #[test]
    fn test_stray_transaction_line_reenters_section() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 SMS Charge 215.00 50000.00
Closing Balance 50,000.00
04-07-2024 ATM Withdrawal 5,000.00 45,000.00
";
        let outcome = parse(text);
        // A full transaction-shaped line reopens a section by itself.
        assert_eq!(outcome.records_emitted, 2);
        assert_eq!(row(&outcome, "ATM Withdrawal")[3], "5,000.00");
    }

    #[test]
    fn test_noise_run_closes_the_section() {
        let mut text = String::from(
            "Date Description Debit Credit Balance\n\
             03-07-2024 SMS Charge 215.00 50000.00\n\n",
        );
        for _ in 0..NOISE_LINE_LIMIT {
            text.push_str("terms and conditions apply\n");
        }
        // Dated but amount-free: outside a section this cannot open one.
        text.push_str("05-07-2024 Inward Remittance\n");
        let outcome = parse(&text);
        assert_eq!(outcome.records_emitted, 1);
    }

    #[test]
    fn test_page_furniture_does_not_pollute_descriptions() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 Utility Bill Payment
Page 2 of 3
1,450.00
98,550.00
";
        let outcome = parse(text);
        let r = &outcome.table.rows[0];
        assert_eq!(r[1], "Utility Bill Payment");
        assert_eq!(r[3], "1,450.00");
        assert_eq!(r[5], "98,550.00");
    }

    #[test]
    fn test_dated_rows_without_amounts_still_emit_with_warning() {
        let text = "\
Date Description Debit Credit Balance
03-07-2024 Inward Remittance

";
        let outcome = parse(text);
        assert_eq!(outcome.records_emitted, 1);
        assert_eq!(outcome.rows_without_amounts, 1);
        assert_eq!(outcome.warnings.len(), 1);
        let r = &outcome.table.rows[0];
        assert_eq!(r[3], "");
        assert_eq!(r[4], "");
        assert_eq!(r[5], "");
    }

    #[test]
    fn test_headers_row_shape() {
        let outcome = parse("Date Description Debit Credit Balance\n");
        assert_eq!(outcome.table.headers, OUTPUT_HEADERS);
        assert!(outcome.table.rows.is_empty());
    }
}
