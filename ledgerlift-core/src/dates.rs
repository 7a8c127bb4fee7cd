//! Date recognition for statement lines.
//!
//! Bank exports disagree on date shape, so detection runs a fixed, ordered
//! list of grammars and takes the first that yields a real calendar date.
//! A grammar hit that chrono rejects (e.g. 31-13-2024) never becomes a
//! fabricated date; the next grammar gets a chance and the line may simply
//! end up undated.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// A date found in a line: where it sits and what it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub start: usize,
    pub end: usize,
    pub date: NaiveDate,
}

impl DateMatch {
    /// Byte span of the matched text in the source line.
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Day-first textual form used in the output table.
    pub fn normalized(&self) -> String {
        self.date.format("%d-%m-%Y").to_string()
    }
}

/// Grammar list, in priority order. The first grammar that produces a
/// valid date wins.
const GRAMMARS: &[fn(&str) -> Option<DateMatch>] = &[
    slash_date,
    iso_date,
    dash_date,
    month_name_first,
    day_before_month_name,
    packed_date,
];

/// Find the first date in `line`, trying each grammar in order.
pub fn find_date(line: &str) -> Option<DateMatch> {
    GRAMMARS.iter().find_map(|grammar| grammar(line))
}

fn slash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").expect("slash date regex"))
}

/// `31/07/2024` or `3/7/24`: day first, with a month-first retry.
fn slash_date(line: &str) -> Option<DateMatch> {
    slash_re().captures_iter(line).find_map(|caps| {
        let m = caps.get(0)?;
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        let date = day_first_or_swapped(year, a, b)?;
        Some(DateMatch {
            start: m.start(),
            end: m.end(),
            date,
        })
    })
}

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso date regex"))
}

/// `2024-07-03`: unambiguous, no retry.
fn iso_date(line: &str) -> Option<DateMatch> {
    iso_re().captures_iter(line).find_map(|caps| {
        let m = caps.get(0)?;
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(DateMatch {
            start: m.start(),
            end: m.end(),
            date,
        })
    })
}

fn dash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{2,4})\b").expect("dash date regex"))
}

/// `03-07-2024`: day first, with a month-first retry.
fn dash_date(line: &str) -> Option<DateMatch> {
    dash_re().captures_iter(line).find_map(|caps| {
        let m = caps.get(0)?;
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        let date = day_first_or_swapped(year, a, b)?;
        Some(DateMatch {
            start: m.start(),
            end: m.end(),
            date,
        })
    })
}

fn month_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),?\s+(\d{4})\b",
        )
        .expect("month-name date regex")
    })
}

/// `Jul 3, 2024` or `July 3 2024`.
fn month_name_first(line: &str) -> Option<DateMatch> {
    month_first_re().captures_iter(line).find_map(|caps| {
        let m = caps.get(0)?;
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(DateMatch {
            start: m.start(),
            end: m.end(),
            date,
        })
    })
}

fn day_first_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b",
        )
        .expect("day-month-name date regex")
    })
}

/// `3 Jul 2024` or `03 July, 2024`.
fn day_before_month_name(line: &str) -> Option<DateMatch> {
    day_first_name_re().captures_iter(line).find_map(|caps| {
        let m = caps.get(0)?;
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(DateMatch {
            start: m.start(),
            end: m.end(),
            date,
        })
    })
}

fn packed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})(\d{2})(\d{2})\b").expect("packed date regex"))
}

/// `20240703`. Only plausible statement years qualify, so ordinary 8-digit
/// numbers do not turn into dates.
fn packed_date(line: &str) -> Option<DateMatch> {
    packed_re().captures_iter(line).find_map(|caps| {
        let m = caps.get(0)?;
        let year: i32 = caps[1].parse().ok()?;
        if !(1900..=2100).contains(&year) {
            return None;
        }
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(DateMatch {
            start: m.start(),
            end: m.end(),
            date,
        })
    })
}

/// Two-digit years: 70..99 are 19xx, 00..69 are 20xx.
fn expand_year(year: i32) -> i32 {
    if year < 100 {
        if year >= 70 { 1900 + year } else { 2000 + year }
    } else {
        year
    }
}

/// Day-first read, falling back to month-first when the day slot cannot
/// hold a day (e.g. 07/31/2024).
fn day_first_or_swapped(year: i32, a: u32, b: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, b, a).or_else(|| NaiveDate::from_ymd_opt(year, a, b))
}

fn month_number(name: &str) -> Option<u32> {
    let n = match name.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}
