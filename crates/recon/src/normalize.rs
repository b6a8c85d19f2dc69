//! Reference normalization: raw identifier tokens to canonical comparable keys.
//!
//! `normalize` is pure and idempotent: feeding a key back through it yields
//! the same key. The "no key" sentinel is `None`; it never matches anything,
//! including another `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw identifiers
// ---------------------------------------------------------------------------

/// An identifier exactly as it appeared in a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawIdentifier {
    Text(String),
    Integer(i64),
    Missing,
}

impl fmt::Display for RawIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Missing => Ok(()),
        }
    }
}

impl From<&str> for RawIdentifier {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawIdentifier {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for RawIdentifier {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl<T: Into<RawIdentifier>> From<Option<T>> for RawIdentifier {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Missing)
    }
}

// ---------------------------------------------------------------------------
// Normalized keys
// ---------------------------------------------------------------------------

/// Canonical form of a reference. Only constructed by normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

/// The "no key" sentinel.
pub const NO_KEY: Option<NormalizedKey> = None;

/// Structural family of a key, derived from its canonical text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyShape {
    /// Decimal digits, no leading zeros (or exactly `"0"`).
    Numeric,
    /// ASCII letters followed by ASCII digits, e.g. `INVI005662`.
    PrefixedNumeric { prefix: String },
    Other,
}

impl NormalizedKey {
    /// Normalize a text token with the default policy.
    pub fn parse(s: &str) -> Option<Self> {
        normalize(&RawIdentifier::Text(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn shape(&self) -> KeyShape {
        let s = self.0.as_str();
        if is_all_digits(s) {
            return KeyShape::Numeric;
        }
        match split_prefixed(s) {
            Some((prefix, _)) => KeyShape::PrefixedNumeric {
                prefix: prefix.to_string(),
            },
            None => KeyShape::Other,
        }
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True only when both sides carry a key and the keys are equal.
pub fn same_reference(a: Option<&NormalizedKey>, b: Option<&NormalizedKey>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// How an all-zero reference (`"0000"`) is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// `"0000"` normalizes to the literal key `"0"`.
    #[default]
    Literal,
    /// All-zero references fold into the "no key" sentinel.
    Missing,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Normalizer {
    #[serde(default)]
    pub zero_policy: ZeroPolicy,
}

impl Normalizer {
    pub fn new(zero_policy: ZeroPolicy) -> Self {
        Self { zero_policy }
    }

    pub fn normalize(&self, raw: &RawIdentifier) -> Option<NormalizedKey> {
        let text = match raw {
            RawIdentifier::Missing => return None,
            RawIdentifier::Integer(n) => n.to_string(),
            RawIdentifier::Text(s) => s.clone(),
        };
        self.normalize_str(&text)
    }

    fn normalize_str(&self, text: &str) -> Option<NormalizedKey> {
        let trimmed = text.trim();
        if !trimmed.chars().any(char::is_alphanumeric) {
            return None;
        }

        if is_all_digits(trimmed) {
            let stripped = trimmed.trim_start_matches('0');
            if stripped.is_empty() {
                return match self.zero_policy {
                    ZeroPolicy::Literal => Some(NormalizedKey("0".to_string())),
                    ZeroPolicy::Missing => None,
                };
            }
            return Some(NormalizedKey(stripped.to_string()));
        }

        // Prefixed references keep their suffix zeros; within a prefix
        // family `INVI005662` and `INVI5662` are different documents.
        if let Some((prefix, suffix)) = split_prefixed(trimmed) {
            return Some(NormalizedKey(format!(
                "{}{}",
                prefix.to_ascii_uppercase(),
                suffix
            )));
        }

        Some(NormalizedKey(trimmed.to_uppercase()))
    }
}

/// Normalize with the default (literal-zero) policy.
pub fn normalize(raw: &RawIdentifier) -> Option<NormalizedKey> {
    Normalizer::default().normalize(raw)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split `ABC00123` into (`ABC`, `00123`). Both parts must be non-empty.
fn split_prefixed(s: &str) -> Option<(&str, &str)> {
    let split = s.find(|c: char| !c.is_ascii_alphabetic())?;
    let (prefix, suffix) = s.split_at(split);
    if prefix.is_empty() || !is_all_digits(suffix) {
        return None;
    }
    Some((prefix, suffix))
}
