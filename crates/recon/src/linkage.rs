//! Linkage engine: set matching of normalized references between two
//! document kinds.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::classify::{UnmatchedClassifier, UnmatchedReason};
use crate::error::ReconError;
use crate::normalize::{NormalizedKey, Normalizer};
use crate::record::{DocumentKind, RecordOrigin, RefField, SourceRecord};

// ---------------------------------------------------------------------------
// Spec
// ---------------------------------------------------------------------------

/// Which document-kind pair to link, and through which fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkSpec {
    pub name: String,
    pub source: DocumentKind,
    pub source_field: RefField,
    pub target: DocumentKind,
    pub target_field: RefField,
}

impl LinkSpec {
    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.source.carries(self.source_field) {
            return Err(ReconError::FieldNotCarried {
                kind: self.source,
                field: self.source_field,
            });
        }
        if !self.target.carries(self.target_field) {
            return Err(ReconError::FieldNotCarried {
                kind: self.target,
                field: self.target_field,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Key → positions of the records carrying it, for both sides of a link.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    pub source: BTreeMap<NormalizedKey, Vec<usize>>,
    pub target: BTreeMap<NormalizedKey, Vec<usize>>,
}

impl ReferenceIndex {
    pub fn source_positions(&self, key: &NormalizedKey) -> &[usize] {
        self.source.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn target_positions(&self, key: &NormalizedKey) -> &[usize] {
        self.target.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Linked,
    /// One side had no records at all; counts are well-formed but meaningless.
    NoData,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedRecord {
    pub key: NormalizedKey,
    pub raw_reference: String,
    pub reason: UnmatchedReason,
    pub origin: RecordOrigin,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkageResult {
    pub spec: LinkSpec,
    pub status: LinkStatus,
    pub source_records: usize,
    pub target_records: usize,
    pub source_keys: usize,
    pub target_keys: usize,
    pub matched: BTreeSet<NormalizedKey>,
    pub unmatched: BTreeSet<NormalizedKey>,
    /// Source records with no usable reference. Never counted as unmatched.
    pub missing_references: usize,
    pub match_rate: f64,
    pub unmatched_detail: Vec<UnmatchedRecord>,
    #[serde(skip)]
    pub index: ReferenceIndex,
}

impl LinkageResult {
    pub fn is_matched(&self, key: &NormalizedKey) -> bool {
        self.matched.contains(key)
    }

    /// Whether `key` appears anywhere on the target side.
    pub fn target_contains(&self, key: &NormalizedKey) -> bool {
        !self.index.target_positions(key).is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Link `source` records to `target` records per `spec`.
///
/// Records of other kinds in either slice are ignored; index positions refer
/// to the slices as passed in.
pub fn link(
    spec: &LinkSpec,
    source: &[SourceRecord],
    target: &[SourceRecord],
    normalizer: &Normalizer,
    classifier: &UnmatchedClassifier,
) -> LinkageResult {
    let (source_index, source_records, missing_references) =
        build_index(source, spec.source, spec.source_field, normalizer);
    let (target_index, target_records, _) =
        build_index(target, spec.target, spec.target_field, normalizer);

    let mut matched = BTreeSet::new();
    let mut unmatched = BTreeSet::new();
    for key in source_index.keys() {
        if target_index.contains_key(key) {
            matched.insert(key.clone());
        } else {
            unmatched.insert(key.clone());
        }
    }

    let match_rate = if source_index.is_empty() {
        0.0
    } else {
        matched.len() as f64 / source_index.len() as f64
    };

    let mut unmatched_detail = Vec::new();
    for key in &unmatched {
        let reason = classifier.classify(key);
        for &pos in &source_index[key] {
            let record = &source[pos];
            unmatched_detail.push(UnmatchedRecord {
                key: key.clone(),
                raw_reference: record
                    .field(spec.source_field)
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
                reason,
                origin: record.origin().clone(),
            });
        }
    }
    unmatched_detail.sort_by(|a, b| (&a.key, &a.origin).cmp(&(&b.key, &b.origin)));

    let status = if source_records == 0 || target_records == 0 {
        log::warn!(
            "link '{}': insufficient data ({} {} records, {} {} records)",
            spec.name,
            source_records,
            spec.source,
            target_records,
            spec.target,
        );
        LinkStatus::NoData
    } else {
        LinkStatus::Linked
    };

    log::debug!(
        "link '{}': {} source keys, {} target keys, {} matched, {} unmatched, {} missing",
        spec.name,
        source_index.len(),
        target_index.len(),
        matched.len(),
        unmatched.len(),
        missing_references,
    );

    LinkageResult {
        spec: spec.clone(),
        status,
        source_records,
        target_records,
        source_keys: source_index.len(),
        target_keys: target_index.len(),
        matched,
        unmatched,
        missing_references,
        match_rate,
        unmatched_detail,
        index: ReferenceIndex {
            source: source_index,
            target: target_index,
        },
    }
}

/// Returns (key index, records of `kind`, records of `kind` without a key).
fn build_index(
    records: &[SourceRecord],
    kind: DocumentKind,
    field: RefField,
    normalizer: &Normalizer,
) -> (BTreeMap<NormalizedKey, Vec<usize>>, usize, usize) {
    let mut index: BTreeMap<NormalizedKey, Vec<usize>> = BTreeMap::new();
    let mut count = 0;
    let mut missing = 0;

    for (pos, record) in records.iter().enumerate() {
        if record.kind() != kind {
            continue;
        }
        count += 1;
        match record.field(field).and_then(|raw| normalizer.normalize(raw)) {
            Some(key) => index.entry(key).or_default().push(pos),
            None => missing += 1,
        }
    }

    (index, count, missing)
}
