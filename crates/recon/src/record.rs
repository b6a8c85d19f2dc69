//! Typed source records, one variant per document kind.
//!
//! Rows are converted into these at the loader boundary; the engine never
//! looks at untyped columns.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::RawIdentifier;

// ---------------------------------------------------------------------------
// Document kinds + reference fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Grn,
    Issue,
    Voucher,
    SupplierTransaction,
    Movement,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        Self::Grn,
        Self::Issue,
        Self::Voucher,
        Self::SupplierTransaction,
        Self::Movement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grn => "grn",
            Self::Issue => "issue",
            Self::Voucher => "voucher",
            Self::SupplierTransaction => "supplier_transaction",
            Self::Movement => "movement",
        }
    }

    /// Reference fields present on records of this kind.
    pub fn ref_fields(&self) -> &'static [RefField] {
        match self {
            Self::Grn => &[RefField::GrnNumber, RefField::InvoiceNumber, RefField::VoucherNumber],
            Self::Issue => &[RefField::IssueNumber, RefField::RequisitionNumber],
            Self::Voucher => &[RefField::VoucherNumber],
            Self::SupplierTransaction => &[RefField::Reference],
            Self::Movement => &[
                RefField::DocumentNumber,
                RefField::RequisitionNumber,
                RefField::VoucherNumber,
            ],
        }
    }

    pub fn carries(&self, field: RefField) -> bool {
        self.ref_fields().contains(&field)
    }

    /// Logical column names a source of this kind may map.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Grn => &["grn_number", "invoice_number", "voucher_number", "supplier", "date", "amount"],
            Self::Issue => &["issue_number", "requisition_number", "department", "date", "amount"],
            Self::Voucher => &["voucher_number", "payee", "date", "amount"],
            Self::SupplierTransaction => {
                &["reference", "transaction_type", "counterparty", "date", "amount"]
            }
            Self::Movement => &[
                "document_number",
                "requisition_number",
                "voucher_number",
                "counterparty",
                "item",
                "date",
                "amount",
            ],
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown document kind '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefField {
    GrnNumber,
    InvoiceNumber,
    VoucherNumber,
    IssueNumber,
    RequisitionNumber,
    Reference,
    DocumentNumber,
}

impl RefField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrnNumber => "grn_number",
            Self::InvoiceNumber => "invoice_number",
            Self::VoucherNumber => "voucher_number",
            Self::IssueNumber => "issue_number",
            Self::RequisitionNumber => "requisition_number",
            Self::Reference => "reference",
            Self::DocumentNumber => "document_number",
        }
    }
}

impl fmt::Display for RefField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shared field types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    Parsed(NaiveDate),
    Unparseable(String),
    Missing,
}

impl From<NaiveDate> for DateField {
    fn from(d: NaiveDate) -> Self {
        Self::Parsed(d)
    }
}

/// Where a record came from: file name and 1-based data row.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RecordOrigin {
    pub source_file: String,
    pub row: usize,
}

impl RecordOrigin {
    pub fn new(source_file: impl Into<String>, row: usize) -> Self {
        Self {
            source_file: source_file.into(),
            row,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GrnRecord {
    pub origin: RecordOrigin,
    pub grn_number: RawIdentifier,
    pub invoice_number: RawIdentifier,
    pub voucher_number: RawIdentifier,
    pub supplier: Option<String>,
    pub date: DateField,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub origin: RecordOrigin,
    pub issue_number: RawIdentifier,
    pub requisition_number: RawIdentifier,
    pub department: Option<String>,
    pub date: DateField,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct VoucherRecord {
    pub origin: RecordOrigin,
    pub voucher_number: RawIdentifier,
    pub payee: Option<String>,
    pub date: DateField,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct SupplierTransaction {
    pub origin: RecordOrigin,
    pub reference: RawIdentifier,
    pub transaction_type: Option<String>,
    pub counterparty: Option<String>,
    pub date: DateField,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct MovementRecord {
    pub origin: RecordOrigin,
    pub document_number: RawIdentifier,
    pub requisition_number: RawIdentifier,
    pub voucher_number: RawIdentifier,
    pub counterparty: Option<String>,
    pub item: Option<String>,
    pub date: DateField,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub enum SourceRecord {
    Grn(GrnRecord),
    Issue(IssueRecord),
    Voucher(VoucherRecord),
    SupplierTransaction(SupplierTransaction),
    Movement(MovementRecord),
}

impl SourceRecord {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Grn(_) => DocumentKind::Grn,
            Self::Issue(_) => DocumentKind::Issue,
            Self::Voucher(_) => DocumentKind::Voucher,
            Self::SupplierTransaction(_) => DocumentKind::SupplierTransaction,
            Self::Movement(_) => DocumentKind::Movement,
        }
    }

    pub fn origin(&self) -> &RecordOrigin {
        match self {
            Self::Grn(r) => &r.origin,
            Self::Issue(r) => &r.origin,
            Self::Voucher(r) => &r.origin,
            Self::SupplierTransaction(r) => &r.origin,
            Self::Movement(r) => &r.origin,
        }
    }

    /// The selected reference field, or `None` if this kind does not carry it.
    pub fn field(&self, field: RefField) -> Option<&RawIdentifier> {
        match (self, field) {
            (Self::Grn(r), RefField::GrnNumber) => Some(&r.grn_number),
            (Self::Grn(r), RefField::InvoiceNumber) => Some(&r.invoice_number),
            (Self::Grn(r), RefField::VoucherNumber) => Some(&r.voucher_number),
            (Self::Issue(r), RefField::IssueNumber) => Some(&r.issue_number),
            (Self::Issue(r), RefField::RequisitionNumber) => Some(&r.requisition_number),
            (Self::Voucher(r), RefField::VoucherNumber) => Some(&r.voucher_number),
            (Self::SupplierTransaction(r), RefField::Reference) => Some(&r.reference),
            (Self::Movement(r), RefField::DocumentNumber) => Some(&r.document_number),
            (Self::Movement(r), RefField::RequisitionNumber) => Some(&r.requisition_number),
            (Self::Movement(r), RefField::VoucherNumber) => Some(&r.voucher_number),
            _ => None,
        }
    }

    pub fn as_supplier_transaction(&self) -> Option<&SupplierTransaction> {
        match self {
            Self::SupplierTransaction(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ref_field_is_reachable_on_its_kinds() {
        let grn = SourceRecord::Grn(GrnRecord {
            origin: RecordOrigin::new("grn.csv", 1),
            grn_number: "G1".into(),
            invoice_number: "0001015775".into(),
            voucher_number: RawIdentifier::Missing,
            supplier: Some("Acme".into()),
            date: DateField::Missing,
            amount: None,
        });
        for field in DocumentKind::Grn.ref_fields() {
            assert!(grn.field(*field).is_some(), "{field}");
        }
        assert!(grn.field(RefField::Reference).is_none());
        assert_eq!(grn.origin(), &RecordOrigin::new("grn.csv", 1));
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.as_str().parse::<DocumentKind>().unwrap(), kind);
        }
        assert!("ledger".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn carries_matches_ref_fields() {
        assert!(DocumentKind::Movement.carries(RefField::RequisitionNumber));
        assert!(!DocumentKind::Voucher.carries(RefField::InvoiceNumber));
    }
}
