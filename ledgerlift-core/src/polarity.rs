//! Debit/credit assignment.
//!
//! Whether the disputed amount is a debit or a credit is a vocabulary
//! question, not arithmetic. The keyword tables live in one serializable
//! policy value with workable defaults, so a deployment can retune them
//! from a config file without touching code.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::DraftAmount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Debit,
    Credit,
}

/// Multi-phrase override: when every phrase in `all_of` appears in the
/// description, the disputed amount gets `polarity`, keyword counts be
/// damned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseOverride {
    pub all_of: Vec<String>,
    pub polarity: Polarity,
}

/// Tunable classification vocabulary. All terms are matched against the
/// lower-cased description, so configure them in lower case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarityPolicy {
    pub debit_terms: Vec<String>,
    pub credit_terms: Vec<String>,
    /// When both or neither side has a keyword, any of these tips the
    /// disputed amount to debit; otherwise it falls to credit.
    pub debit_tiebreak_terms: Vec<String>,
    /// A lone amount starting at or past this fraction of its line is a
    /// balance; earlier, a credit.
    ///
    /// Declared before `overrides` so the TOML form serializes (values
    /// must precede arrays of tables).
    pub balance_tail_fraction: f32,
    pub overrides: Vec<PhraseOverride>,
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

impl Default for PolarityPolicy {
    fn default() -> Self {
        Self {
            debit_terms: owned(&[
                "withdrawal",
                "debit",
                "charge",
                "fee",
                "purchase",
                "atm",
                "pos",
                "cash",
                "bill",
                "sms",
                "service",
                "excise",
                "duty",
                "merchant",
                "outward",
                "paid",
                "sent",
                "transfer to",
                "point of sale",
                "point-of-sale",
            ]),
            credit_terms: owned(&[
                "deposit",
                "credit",
                "salary",
                "inward",
                "incoming",
                "remittance",
                "swift",
                "raast",
                "refund",
                "reversal",
                "received",
                "profit",
                "interest",
                "transfer from",
            ]),
            debit_tiebreak_terms: owned(&["transfer", "charge", "payment", "fee"]),
            balance_tail_fraction: 0.7,
            overrides: vec![
                PhraseOverride {
                    all_of: owned(&["inter bank funds transfer"]),
                    polarity: Polarity::Debit,
                },
                PhraseOverride {
                    all_of: owned(&["swift", "inward"]),
                    polarity: Polarity::Credit,
                },
            ],
        }
    }
}

/// Final money-column assignment for one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmountAssignment {
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub balance: Option<String>,
}

/// Assign the accumulated amounts of one transaction.
///
/// The last amount is the running balance, the second-to-last is the
/// disputed value the keyword policy decides. Anything earlier is left
/// unassigned; the columns pass already kept only plausible candidates.
pub fn classify_amounts(
    policy: &PolarityPolicy,
    description: &str,
    amounts: &[DraftAmount],
) -> AmountAssignment {
    match amounts {
        [] => AmountAssignment::default(),
        [only] => {
            if only.tail_fraction >= policy.balance_tail_fraction {
                AmountAssignment {
                    balance: Some(only.value.clone()),
                    ..Default::default()
                }
            } else {
                AmountAssignment {
                    credit: Some(only.value.clone()),
                    ..Default::default()
                }
            }
        }
        [earlier @ .., disputed, balance] => {
            if !earlier.is_empty() {
                debug!("{} early amounts left unassigned", earlier.len());
            }
            let mut out = AmountAssignment::default();
            // Equal trailing amounts are one cell read twice; the balance
            // column stays empty rather than echoing the movement.
            if !same_amount(&disputed.value, &balance.value) {
                out.balance = Some(balance.value.clone());
            }
            match disputed_polarity(policy, description) {
                Polarity::Debit => out.debit = Some(disputed.value.clone()),
                Polarity::Credit => out.credit = Some(disputed.value.clone()),
            }
            out
        }
    }
}

/// Comma-insensitive value equality: "1,500.00" and "1500.00" are the
/// same printed amount.
fn same_amount(a: &str, b: &str) -> bool {
    a.replace(',', "") == b.replace(',', "")
}

fn disputed_polarity(policy: &PolarityPolicy, description: &str) -> Polarity {
    let lower = description.to_lowercase();

    for rule in &policy.overrides {
        if !rule.all_of.is_empty() && rule.all_of.iter().all(|p| lower.contains(p.as_str())) {
            return rule.polarity;
        }
    }

    let debit_hit = policy.debit_terms.iter().any(|t| lower.contains(t.as_str()));
    let credit_hit = policy.credit_terms.iter().any(|t| lower.contains(t.as_str()));
    match (debit_hit, credit_hit) {
        (true, false) => Polarity::Debit,
        (false, true) => Polarity::Credit,
        _ => {
            if policy
                .debit_tiebreak_terms
                .iter()
                .any(|t| lower.contains(t.as_str()))
            {
                Polarity::Debit
            } else {
                Polarity::Credit
            }
        }
    }
}
