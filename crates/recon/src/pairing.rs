//! Payment-pair resolution within the supplier-transaction stream.
//!
//! A primary transaction (invoice) and a derived transaction (settlement)
//! pair when counterparty and date agree and amounts agree within
//! `tolerance`. Pairing is many-to-many: every qualifying combination is a
//! pair.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::{NormalizedKey, Normalizer, RawIdentifier};
use crate::record::{DateField, RecordOrigin, SourceRecord, SupplierTransaction};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PairingConfig {
    #[serde(default = "default_primary_types")]
    pub primary_types: Vec<String>,
    #[serde(default = "default_derived_types")]
    pub derived_types: Vec<String>,
    /// Absolute amount tolerance, inclusive.
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    /// Name of the link whose matches derived transactions inherit.
    #[serde(default)]
    pub link: Option<String>,
}

fn default_primary_types() -> Vec<String> {
    vec!["invoice".into()]
}

fn default_derived_types() -> Vec<String> {
    vec!["settlement".into()]
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            primary_types: default_primary_types(),
            derived_types: default_derived_types(),
            tolerance: default_tolerance(),
            link: None,
        }
    }
}

impl PairingConfig {
    pub fn role_of(&self, transaction_type: Option<&str>) -> TransactionRole {
        let Some(tag) = transaction_type.map(str::trim) else {
            return TransactionRole::Other;
        };
        if self.primary_types.iter().any(|t| t.trim().eq_ignore_ascii_case(tag)) {
            TransactionRole::Primary
        } else if self.derived_types.iter().any(|t| t.trim().eq_ignore_ascii_case(tag)) {
            TransactionRole::Derived
        } else {
            TransactionRole::Other
        }
    }
}

/// Primary sorts before derived within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionRole {
    Primary,
    Derived,
    Other,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PaymentPair {
    pub counterparty: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    /// Derived amount minus primary amount.
    pub amount_delta: Decimal,
    pub primary_reference: RawIdentifier,
    pub derived_reference: RawIdentifier,
    pub primary_key: Option<NormalizedKey>,
    pub derived_key: Option<NormalizedKey>,
    pub primary_origin: RecordOrigin,
    pub derived_origin: RecordOrigin,
    #[serde(skip)]
    pub primary_position: usize,
    #[serde(skip)]
    pub derived_position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpairedReason {
    UnparseableDate,
    MissingDate,
    MissingAmount,
    MissingCounterparty,
    NoCounterpart,
}

impl UnpairedReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnparseableDate => "unpaired, unparseable-date",
            Self::MissingDate => "unpaired, missing date",
            Self::MissingAmount => "unpaired, missing amount",
            Self::MissingCounterparty => "unpaired, missing counterparty",
            Self::NoCounterpart => "unpaired, no same-day counterpart",
        }
    }

    /// True when the record could not take part in pairing at all.
    pub fn is_excluded(&self) -> bool {
        !matches!(self, Self::NoCounterpart)
    }
}

impl fmt::Display for UnpairedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnpairedRecord {
    pub reference: RawIdentifier,
    pub transaction_type: String,
    pub role: TransactionRole,
    pub reason: UnpairedReason,
    pub origin: RecordOrigin,
    #[serde(skip)]
    pub position: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PairingOutput {
    pub pairs: Vec<PaymentPair>,
    pub unpaired: Vec<UnpairedRecord>,
    /// Primaries paired with more than one derived record.
    pub ambiguous_primaries: usize,
    /// Derived records paired with more than one primary.
    pub ambiguous_derived: usize,
    /// Derived record position → indices into `pairs`, in pair order.
    #[serde(skip)]
    derived_pairs: BTreeMap<usize, Vec<usize>>,
    /// Record position → index into `unpaired`.
    #[serde(skip)]
    unpaired_at: BTreeMap<usize, usize>,
}

impl PairingOutput {
    /// Pairs in which the record at `position` is the derived side, in pair order.
    pub fn pairs_for_derived(&self, position: usize) -> impl Iterator<Item = &PaymentPair> {
        self.derived_pairs
            .get(&position)
            .into_iter()
            .flatten()
            .map(move |&i| &self.pairs[i])
    }

    pub fn unpaired_reason(&self, position: usize) -> Option<UnpairedReason> {
        self.unpaired_at.get(&position).map(|&i| self.unpaired[i].reason)
    }

    fn build_lookups(&mut self) {
        self.derived_pairs.clear();
        for (i, pair) in self.pairs.iter().enumerate() {
            self.derived_pairs.entry(pair.derived_position).or_default().push(i);
        }
        self.unpaired_at = self
            .unpaired
            .iter()
            .enumerate()
            .map(|(i, u)| (u.position, i))
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

struct Candidate<'a> {
    position: usize,
    txn: &'a SupplierTransaction,
    role: TransactionRole,
    date: NaiveDate,
    amount: Decimal,
    key: Option<NormalizedKey>,
}

/// Find payment pairs among the supplier transactions in `records`.
pub fn resolve_pairs(
    records: &[SourceRecord],
    config: &PairingConfig,
    normalizer: &Normalizer,
) -> PairingOutput {
    let mut output = PairingOutput::default();
    let mut partitions: BTreeMap<String, Vec<Candidate<'_>>> = BTreeMap::new();

    for (position, record) in records.iter().enumerate() {
        let Some(txn) = record.as_supplier_transaction() else {
            continue;
        };
        let role = config.role_of(txn.transaction_type.as_deref());
        if role == TransactionRole::Other {
            continue;
        }

        let excluded = match (&txn.date, txn.amount, counterparty_key(txn)) {
            (DateField::Unparseable(_), _, _) => Err(UnpairedReason::UnparseableDate),
            (DateField::Missing, _, _) => Err(UnpairedReason::MissingDate),
            (_, None, _) => Err(UnpairedReason::MissingAmount),
            (_, _, None) => Err(UnpairedReason::MissingCounterparty),
            (DateField::Parsed(date), Some(amount), Some(cp)) => Ok((*date, amount, cp)),
        };

        match excluded {
            Ok((date, amount, cp)) => partitions.entry(cp).or_default().push(Candidate {
                position,
                txn,
                role,
                date,
                amount,
                key: normalizer.normalize(&txn.reference),
            }),
            Err(reason) => {
                log::warn!(
                    "{} row {}: transaction '{}' excluded from pairing ({})",
                    txn.origin.source_file,
                    txn.origin.row,
                    txn.reference,
                    reason,
                );
                output.unpaired.push(unpaired(position, txn, role, reason));
            }
        }
    }

    for (counterparty, mut candidates) in partitions {
        pair_partition(&counterparty, &mut candidates, config, &mut output);
    }

    output.unpaired.sort_by(|a, b| a.origin.cmp(&b.origin));
    output.build_lookups();
    output
}

fn pair_partition(
    counterparty: &str,
    candidates: &mut [Candidate<'_>],
    config: &PairingConfig,
    output: &mut PairingOutput,
) {
    candidates.sort_by(|a, b| {
        (a.date, a.role, &a.key, &a.txn.origin).cmp(&(b.date, b.role, &b.key, &b.txn.origin))
    });

    let mut pair_counts = vec![0usize; candidates.len()];
    let first_pair = output.pairs.len();

    for i in 0..candidates.len() {
        let primary = &candidates[i];
        if primary.role != TransactionRole::Primary {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            let derived = &candidates[j];
            if derived.date != primary.date {
                break;
            }
            if derived.role != TransactionRole::Derived {
                continue;
            }
            let delta = derived.amount - primary.amount;
            if delta.abs() > config.tolerance {
                continue;
            }
            pair_counts[i] += 1;
            pair_counts[j] += 1;
            output.pairs.push(PaymentPair {
                counterparty: primary
                    .txn
                    .counterparty
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
                date: primary.date,
                amount: primary.amount,
                amount_delta: delta,
                primary_reference: primary.txn.reference.clone(),
                derived_reference: derived.txn.reference.clone(),
                primary_key: primary.key.clone(),
                derived_key: derived.key.clone(),
                primary_origin: primary.txn.origin.clone(),
                derived_origin: derived.txn.origin.clone(),
                primary_position: primary.position,
                derived_position: derived.position,
            });
        }
    }

    for (candidate, &count) in candidates.iter().zip(&pair_counts) {
        match (candidate.role, count) {
            (_, 0) => output.unpaired.push(unpaired(
                candidate.position,
                candidate.txn,
                candidate.role,
                UnpairedReason::NoCounterpart,
            )),
            (TransactionRole::Primary, n) if n > 1 => output.ambiguous_primaries += 1,
            (TransactionRole::Derived, n) if n > 1 => output.ambiguous_derived += 1,
            _ => {}
        }
    }

    log::debug!(
        "counterparty '{}': {} candidates, {} pairs",
        counterparty,
        candidates.len(),
        output.pairs.len() - first_pair,
    );
}

/// Trimmed, case-folded, whitespace-collapsed counterparty; `None` if blank.
fn counterparty_key(txn: &SupplierTransaction) -> Option<String> {
    let name = txn.counterparty.as_deref()?;
    let key = name.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

fn unpaired(
    position: usize,
    txn: &SupplierTransaction,
    role: TransactionRole,
    reason: UnpairedReason,
) -> UnpairedRecord {
    UnpairedRecord {
        reference: txn.reference.clone(),
        transaction_type: txn.transaction_type.clone().unwrap_or_default(),
        role,
        reason,
        origin: txn.origin.clone(),
        position,
    }
}
