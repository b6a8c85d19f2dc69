//! Advisory triage of unmatched references.
//!
//! Rules are ordered; the first that applies wins. The taxonomy helps a
//! human auditor prioritise, it does not decide anything.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::{KeyShape, NormalizedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    SpecialVoucher,
    SequenceGap,
    NumericNotFound,
    InvalidFormat,
    Unknown,
}

impl UnmatchedReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::SpecialVoucher => "special voucher, not in payment system",
            Self::SequenceGap => "sequence gap or timing issue",
            Self::NumericNotFound => "numeric reference not found in target system",
            Self::InvalidFormat => "invalid format",
            Self::Unknown => "unknown/data-entry error",
        }
    }
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnmatchedClassifier {
    /// Manually raised vouchers that never reach the payment system.
    #[serde(default = "default_special_prefixes")]
    pub special_prefixes: Vec<String>,
    /// Series known to skip numbers or post late.
    #[serde(default = "default_sequence_gap_prefixes")]
    pub sequence_gap_prefixes: Vec<String>,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_special_prefixes() -> Vec<String> {
    vec!["MAN".into(), "SPV".into()]
}

fn default_sequence_gap_prefixes() -> Vec<String> {
    vec!["INVI".into(), "PV".into()]
}

fn default_min_length() -> usize {
    4
}

impl Default for UnmatchedClassifier {
    fn default() -> Self {
        Self {
            special_prefixes: default_special_prefixes(),
            sequence_gap_prefixes: default_sequence_gap_prefixes(),
            min_length: default_min_length(),
        }
    }
}

impl UnmatchedClassifier {
    pub fn classify(&self, key: &NormalizedKey) -> UnmatchedReason {
        let s = key.as_str();
        if has_prefix(s, &self.special_prefixes) {
            UnmatchedReason::SpecialVoucher
        } else if has_prefix(s, &self.sequence_gap_prefixes) {
            UnmatchedReason::SequenceGap
        } else if key.shape() == KeyShape::Numeric {
            UnmatchedReason::NumericNotFound
        } else if s.chars().count() < self.min_length {
            UnmatchedReason::InvalidFormat
        } else {
            UnmatchedReason::Unknown
        }
    }
}

// Keys are uppercase, so prefixes compare uppercased.
fn has_prefix(key: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| key.starts_with(&p.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(s: &str) -> UnmatchedReason {
        UnmatchedClassifier::default().classify(&NormalizedKey::parse(s).unwrap())
    }

    #[test]
    fn first_rule_wins() {
        assert_eq!(classify("man0042"), UnmatchedReason::SpecialVoucher);
        assert_eq!(classify("INVI005662"), UnmatchedReason::SequenceGap);
        assert_eq!(classify("0001015775"), UnmatchedReason::NumericNotFound);
        // numeric beats length
        assert_eq!(classify("7"), UnmatchedReason::NumericNotFound);
        assert_eq!(classify("X1"), UnmatchedReason::InvalidFormat);
        assert_eq!(classify("GRN/22/118"), UnmatchedReason::Unknown);
    }

    #[test]
    fn configured_prefixes_are_case_insensitive() {
        let c = UnmatchedClassifier {
            special_prefixes: vec!["jv".into()],
            sequence_gap_prefixes: vec![],
            min_length: 0,
        };
        assert_eq!(
            c.classify(&NormalizedKey::parse("JV0001").unwrap()),
            UnmatchedReason::SpecialVoucher
        );
        assert_eq!(
            c.classify(&NormalizedKey::parse("INVI1").unwrap()),
            UnmatchedReason::Unknown
        );
    }

    #[test]
    fn descriptions_are_human_readable() {
        assert_eq!(
            UnmatchedReason::SpecialVoucher.to_string(),
            "special voucher, not in payment system"
        );
    }
}
