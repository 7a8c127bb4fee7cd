use ledgerlift_core::{OUTPUT_HEADERS, ParseOutcome, PolarityPolicy, parse_document};

/// A two-page statement the way pdf text extraction actually hands it
/// over: metadata block, opening balance, a table split across a page
/// break, one transaction spread over four physical lines, and summary
/// furniture at the end.
const STATEMENT: &str = "\
ABC BANK LIMITED
Statement of Account
Account Title: ACME TRADING CO
Account Number: 001234567890123
IBAN: PK36SCBL0000001123456702
Statement Period: 01-07-2024 to 31-07-2024

Opening Balance 789,196.42

Date Description Cheq/Inst# Debit Credit Balance
01-07-2024 ATM Cash Withdrawal ATM/9921 50,000.00 739,196.42
02-07-2024 Inward Remittance
IBFT Incoming Transfer Ref 445566
114,608.00
853,804.42
03-07-2024 SMS Charge 215.00 853,589.42
Page 1 of 2

Date Description Cheq/Inst# Debit Credit Balance
04-07-2024 Cheque Paid CHQ#000641 89,500.00 764,089.42
05-07-2024 Inter Bank Funds Transfer 25,000.00 739,089.42
Closing Balance 739,089.42
This is a system generated statement and requires no signature
";

fn parse() -> ParseOutcome {
    parse_document(STATEMENT, &PolarityPolicy::default())
}

fn cell<'a>(outcome: &'a ParseOutcome, row: usize, col: usize) -> &'a str {
    &outcome.table.rows[row][col]
}

#[test]
fn test_statement_is_recognized_and_counted() {
    let outcome = parse();
    assert!(outcome.is_bank_statement);
    assert_eq!(outcome.table.headers, OUTPUT_HEADERS);
    assert_eq!(outcome.records_emitted, 6);
    assert_eq!(outcome.rows_without_amounts, 0);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
}

/// Regression: the dateless opening balance row leads the output with
/// only its balance column set.
#[test]
fn test_opening_balance_row() {
    let outcome = parse();
    assert_eq!(cell(&outcome, 0, 0), "");
    assert_eq!(cell(&outcome, 0, 1), "Opening Balance");
    assert_eq!(cell(&outcome, 0, 3), "");
    assert_eq!(cell(&outcome, 0, 4), "");
    assert_eq!(cell(&outcome, 0, 5), "789,196.42");
}

#[test]
fn test_rows_come_out_date_ordered() {
    let outcome = parse();
    let dates: Vec<&str> = outcome.table.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        dates,
        [
            "",
            "01-07-2024",
            "02-07-2024",
            "03-07-2024",
            "04-07-2024",
            "05-07-2024",
        ]
    );
}

#[test]
fn test_single_line_transactions() {
    let outcome = parse();

    // ATM withdrawal: instrument claimed, debit polarity from keywords.
    assert_eq!(cell(&outcome, 1, 1), "ATM Cash Withdrawal");
    assert_eq!(cell(&outcome, 1, 2), "ATM/9921");
    assert_eq!(cell(&outcome, 1, 3), "50,000.00");
    assert_eq!(cell(&outcome, 1, 4), "");
    assert_eq!(cell(&outcome, 1, 5), "739,196.42");

    // SMS charge: bare "215.00" next to the running balance.
    assert_eq!(cell(&outcome, 3, 1), "SMS Charge");
    assert_eq!(cell(&outcome, 3, 3), "215.00");
    assert_eq!(cell(&outcome, 3, 5), "853,589.42");
}

/// Regression: a transaction whose description, reference, and both
/// amounts arrive on four separate lines is reassembled into one row.
#[test]
fn test_multi_line_transaction_reassembly() {
    let outcome = parse();
    assert_eq!(cell(&outcome, 2, 0), "02-07-2024");
    assert_eq!(cell(&outcome, 2, 1), "Inward Remittance IBFT Incoming Transfer");
    assert_eq!(cell(&outcome, 2, 2), "Ref 445566");
    assert_eq!(cell(&outcome, 2, 3), "");
    assert_eq!(cell(&outcome, 2, 4), "114,608.00");
    assert_eq!(cell(&outcome, 2, 5), "853,804.42");
}

/// Regression: the page break (furniture line, blank, repeated header)
/// does not lose rows or leak header text into descriptions.
#[test]
fn test_section_survives_page_break() {
    let outcome = parse();
    assert_eq!(cell(&outcome, 4, 1), "Cheque Paid");
    assert_eq!(cell(&outcome, 4, 2), "CHQ#000641");
    assert_eq!(cell(&outcome, 4, 3), "89,500.00");
    for row in &outcome.table.rows {
        assert!(!row[1].contains("Page"), "furniture leaked: {:?}", row);
        assert!(!row[1].contains("Description"), "header leaked: {:?}", row);
    }
}

/// Regression: "Inter Bank Funds Transfer" is forced to debit even though
/// the generic keyword "transfer" alone would leave it ambiguous.
#[test]
fn test_inter_bank_transfer_polarity_override() {
    let outcome = parse();
    assert_eq!(cell(&outcome, 5, 3), "25,000.00");
    assert_eq!(cell(&outcome, 5, 4), "");
    assert_eq!(cell(&outcome, 5, 5), "739,089.42");
}

#[test]
fn test_parse_is_deterministic() {
    let a = parse();
    let b = parse();
    assert_eq!(a.table, b.table);
    assert_eq!(a.records_emitted, b.records_emitted);
}

/// Non-statement text still yields a usable generic table.
#[test]
fn test_non_statement_fallback_table() {
    let text = "\
Item  Count
bolts  40
nuts  40
";
    let outcome = parse_document(text, &PolarityPolicy::default());
    assert!(!outcome.is_bank_statement);
    assert_eq!(outcome.table.headers, ["Item", "Count"]);
    assert_eq!(outcome.table.rows.len(), 2);
    assert_eq!(outcome.table.rows[0], ["bolts", "40"]);
}
