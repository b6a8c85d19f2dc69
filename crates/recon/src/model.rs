use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::inherit::InheritanceReport;
use crate::linkage::{LinkStatus, LinkageResult};
use crate::normalize::ZeroPolicy;
use crate::pairing::PairingOutput;
use crate::record::{DocumentKind, RefField, SourceRecord};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded records, one immutable collection per document kind.
#[derive(Debug, Default, Clone)]
pub struct ReconInput {
    pub records: BTreeMap<DocumentKind, Arc<Vec<SourceRecord>>>,
}

impl ReconInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: DocumentKind, records: impl Into<Arc<Vec<SourceRecord>>>) {
        self.records.insert(kind, records.into());
    }

    /// Records of `kind`; empty when the kind was never loaded.
    pub fn get(&self, kind: DocumentKind) -> &[SourceRecord] {
        self.records.get(&kind).map(|r| r.as_slice()).unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// One row of the linkage summary table.
#[derive(Debug, Clone, Serialize)]
pub struct LinkSummary {
    pub name: String,
    pub source: DocumentKind,
    pub source_field: RefField,
    pub target: DocumentKind,
    pub target_field: RefField,
    pub status: LinkStatus,
    pub source_records: usize,
    pub source_keys: usize,
    pub target_keys: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub missing_references: usize,
    pub match_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub links: Vec<LinkSummary>,
    pub total_unmatched_keys: usize,
    pub links_without_data: usize,
    pub payment_pairs: usize,
    pub unpaired_transactions: usize,
    pub ambiguous_primaries: usize,
    pub ambiguous_derived: usize,
    pub derived_direct: usize,
    pub derived_inherited: usize,
    pub derived_unmatched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub zero_policy: ZeroPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub links: Vec<LinkageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing: Option<PairingOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inheritance: Option<InheritanceReport>,
}

impl ReconResult {
    pub fn link(&self, name: &str) -> Option<&LinkageResult> {
        self.links.iter().find(|l| l.spec.name == name)
    }
}
