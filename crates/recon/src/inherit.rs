//! Inheritance linking: derived transactions (settlements) never carry the
//! invoice reference, so their provenance comes from the primary they pair
//! with.

use std::fmt;

use serde::Serialize;

use crate::linkage::LinkageResult;
use crate::normalize::{NormalizedKey, Normalizer, RawIdentifier};
use crate::pairing::{PairingConfig, PairingOutput, TransactionRole, UnpairedReason};
use crate::record::{RecordOrigin, SourceRecord};

#[derive(Debug, Clone, Serialize)]
pub struct InheritedLink {
    pub derived_reference: RawIdentifier,
    pub primary_reference: RawIdentifier,
    pub target_key: NormalizedKey,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMiss {
    /// Excluded from pairing by a data problem.
    Unpaired(UnpairedReason),
    /// No primary on the same day for the same amount.
    NoPair,
    /// Paired, but none of the paired primaries matched the target.
    PrimaryUnmatched,
}

impl fmt::Display for DerivedMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unpaired(reason) => write!(f, "{reason}"),
            Self::NoPair => f.write_str("no paired primary transaction"),
            Self::PrimaryUnmatched => f.write_str("paired primary has no match"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkOutcome {
    Direct { target_key: NormalizedKey },
    Inherited(InheritedLink),
    Unmatched { reason: DerivedMiss },
}

impl LinkOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Inherited(_) => "inherited",
            Self::Unmatched { .. } => "unmatched",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivedLink {
    pub derived_reference: RawIdentifier,
    pub derived_key: Option<NormalizedKey>,
    pub origin: RecordOrigin,
    pub outcome: LinkOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InheritanceReport {
    pub link: String,
    pub direct: usize,
    pub inherited: usize,
    pub unmatched: usize,
    pub entries: Vec<DerivedLink>,
}

impl InheritanceReport {
    pub fn inherited_links(&self) -> impl Iterator<Item = &InheritedLink> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            LinkOutcome::Inherited(link) => Some(link),
            _ => None,
        })
    }
}

/// Resolve the outcome of every derived supplier transaction in `records`.
///
/// `primary_link` must be the linkage of primary transactions to the target
/// document. When a derived record pairs with several matched primaries the
/// first pair in pair order wins.
pub fn inherit_links(
    primary_link: &LinkageResult,
    pairing: &PairingOutput,
    records: &[SourceRecord],
    config: &PairingConfig,
    normalizer: &Normalizer,
) -> InheritanceReport {
    let mut report = InheritanceReport {
        link: primary_link.spec.name.clone(),
        ..Default::default()
    };

    for (position, record) in records.iter().enumerate() {
        let Some(txn) = record.as_supplier_transaction() else {
            continue;
        };
        if config.role_of(txn.transaction_type.as_deref()) != TransactionRole::Derived {
            continue;
        }

        let derived_key = normalizer.normalize(&txn.reference);
        let outcome = resolve_one(position, derived_key.as_ref(), primary_link, pairing, &txn.reference);

        match outcome {
            LinkOutcome::Direct { .. } => report.direct += 1,
            LinkOutcome::Inherited(_) => report.inherited += 1,
            LinkOutcome::Unmatched { .. } => report.unmatched += 1,
        }

        report.entries.push(DerivedLink {
            derived_reference: txn.reference.clone(),
            derived_key,
            origin: txn.origin.clone(),
            outcome,
        });
    }

    report.entries.sort_by(|a, b| a.origin.cmp(&b.origin));

    log::debug!(
        "inheritance via '{}': {} direct, {} inherited, {} unmatched",
        report.link,
        report.direct,
        report.inherited,
        report.unmatched,
    );

    report
}

fn resolve_one(
    position: usize,
    derived_key: Option<&NormalizedKey>,
    primary_link: &LinkageResult,
    pairing: &PairingOutput,
    derived_reference: &RawIdentifier,
) -> LinkOutcome {
    if let Some(key) = derived_key {
        if primary_link.target_contains(key) {
            return LinkOutcome::Direct {
                target_key: key.clone(),
            };
        }
    }

    let mut paired = false;
    for pair in pairing.pairs_for_derived(position) {
        paired = true;
        if let Some(primary_key) = pair.primary_key.as_ref() {
            if primary_link.is_matched(primary_key) {
                return LinkOutcome::Inherited(InheritedLink {
                    derived_reference: derived_reference.clone(),
                    primary_reference: pair.primary_reference.clone(),
                    target_key: primary_key.clone(),
                    note: format!("payment for invoice {}", pair.primary_reference),
                });
            }
        }
    }

    let reason = if paired {
        DerivedMiss::PrimaryUnmatched
    } else {
        match pairing.unpaired_reason(position) {
            Some(reason) if reason.is_excluded() => DerivedMiss::Unpaired(reason),
            _ => DerivedMiss::NoPair,
        }
    };
    LinkOutcome::Unmatched { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::classify::UnmatchedClassifier;
    use crate::linkage::{link, LinkSpec};
    use crate::pairing::resolve_pairs;
    use crate::record::{DateField, DocumentKind, GrnRecord, RefField, SupplierTransaction};

    fn txn(row: usize, kind: &str, reference: &str, date: &str, amount: &str) -> SourceRecord {
        SourceRecord::SupplierTransaction(SupplierTransaction {
            origin: RecordOrigin::new("statement.csv", row),
            reference: reference.into(),
            transaction_type: Some(kind.into()),
            counterparty: Some("Acme".into()),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(DateField::Parsed)
                .unwrap_or_else(|_| DateField::Unparseable(date.into())),
            amount: Decimal::from_str(amount).ok(),
        })
    }

    fn grn(row: usize, invoice: &str) -> SourceRecord {
        SourceRecord::Grn(GrnRecord {
            origin: RecordOrigin::new("grn.csv", row),
            grn_number: RawIdentifier::Missing,
            invoice_number: invoice.into(),
            voucher_number: RawIdentifier::Missing,
            supplier: Some("Acme".into()),
            date: DateField::Missing,
            amount: None,
        })
    }

    /// Link primaries of `statement` to `grns`, pair, then inherit.
    fn run(statement: &[SourceRecord], grns: &[SourceRecord]) -> InheritanceReport {
        let config = PairingConfig::default();
        let normalizer = Normalizer::default();
        let primaries: Vec<SourceRecord> = statement
            .iter()
            .filter(|r| {
                r.as_supplier_transaction()
                    .map(|t| config.role_of(t.transaction_type.as_deref()) == TransactionRole::Primary)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        let spec = LinkSpec {
            name: "statement_to_grn".into(),
            source: DocumentKind::SupplierTransaction,
            source_field: RefField::Reference,
            target: DocumentKind::Grn,
            target_field: RefField::InvoiceNumber,
        };
        let linkage = link(&spec, &primaries, grns, &normalizer, &UnmatchedClassifier::default());
        let pairing = resolve_pairs(statement, &config, &normalizer);
        inherit_links(&linkage, &pairing, statement, &config, &normalizer)
    }

    #[test]
    fn settlement_inherits_invoice_match() {
        let statement = vec![
            txn(1, "invoice", "27949", "2022-07-21", "84588.37"),
            txn(2, "settlement", "999999", "2022-07-21", "84588.37"),
        ];
        let report = run(&statement, &[grn(1, "0000027949")]);
        assert_eq!(report.inherited, 1);
        assert_eq!(report.unmatched, 0);
        let entry = &report.entries[0];
        match &entry.outcome {
            LinkOutcome::Inherited(link) => {
                assert_eq!(link.derived_reference, "999999".into());
                assert_eq!(link.primary_reference, "27949".into());
                assert_eq!(link.target_key.as_str(), "27949");
                assert_eq!(link.note, "payment for invoice 27949");
            }
            other => panic!("expected inherited, got {other:?}"),
        }
        assert_eq!(report.inherited_links().count(), 1);
    }

    #[test]
    fn unmatched_primary_leaves_settlement_unmatched() {
        let statement = vec![
            txn(1, "invoice", "27949", "2022-07-21", "10"),
            txn(2, "settlement", "999999", "2022-07-21", "10"),
        ];
        let report = run(&statement, &[grn(1, "11111")]);
        assert_eq!(report.unmatched, 1);
        assert!(matches!(
            report.entries[0].outcome,
            LinkOutcome::Unmatched { reason: DerivedMiss::PrimaryUnmatched }
        ));
    }

    #[test]
    fn settlement_with_own_match_is_direct() {
        let statement = vec![txn(1, "settlement", "555", "2022-07-21", "10")];
        let report = run(&statement, &[grn(1, "555")]);
        assert_eq!(report.direct, 1);
        assert_eq!(report.entries[0].outcome.status(), "direct");
    }

    #[test]
    fn unpaired_settlement_reports_why() {
        let statement = vec![
            txn(1, "invoice", "1", "2022-07-21", "10"),
            txn(2, "settlement", "2", "2022-07-22", "10"),
            txn(3, "settlement", "3", "someday", "10"),
        ];
        let report = run(&statement, &[grn(1, "1")]);
        assert_eq!(report.unmatched, 2);
        assert!(matches!(
            report.entries[0].outcome,
            LinkOutcome::Unmatched { reason: DerivedMiss::NoPair }
        ));
        assert!(matches!(
            report.entries[1].outcome,
            LinkOutcome::Unmatched {
                reason: DerivedMiss::Unpaired(UnpairedReason::UnparseableDate)
            }
        ));
    }

    #[test]
    fn first_matched_primary_wins() {
        let statement = vec![
            txn(1, "invoice", "300", "2022-07-21", "10"),
            txn(2, "invoice", "200", "2022-07-21", "10"),
            txn(3, "invoice", "100", "2022-07-21", "10"),
            txn(4, "settlement", "9", "2022-07-21", "10"),
        ];
        // "100" has no GRN; among matched primaries "200" sorts first.
        let report = run(&statement, &[grn(1, "200"), grn(2, "300")]);
        assert_eq!(report.inherited, 1);
        match &report.entries[0].outcome {
            LinkOutcome::Inherited(link) => assert_eq!(link.target_key.as_str(), "200"),
            other => panic!("expected inherited, got {other:?}"),
        }
    }

    #[test]
    fn primaries_are_not_reported() {
        let statement = vec![txn(1, "invoice", "1", "2022-07-21", "10")];
        let report = run(&statement, &[grn(1, "1")]);
        assert!(report.entries.is_empty());
    }
}
