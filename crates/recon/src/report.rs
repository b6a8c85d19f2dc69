//! Tabular report writers. One CSV per table plus a JSON summary.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReconError;
use crate::inherit::LinkOutcome;
use crate::model::{ReconMeta, ReconResult, ReconSummary};

pub const LINKAGE_SUMMARY_FILE: &str = "linkage_summary.csv";
pub const PAYMENT_PAIRS_FILE: &str = "payment_pairs.csv";
pub const UNPAIRED_FILE: &str = "unpaired_transactions.csv";
pub const DERIVED_LINKS_FILE: &str = "derived_links.csv";
pub const SUMMARY_JSON_FILE: &str = "summary.json";

const LINK_SUMMARY_HEADER: &[&str] = &[
    "name",
    "source",
    "source_field",
    "target",
    "target_field",
    "status",
    "source_records",
    "source_keys",
    "target_keys",
    "matched",
    "unmatched",
    "missing_references",
    "match_rate",
];
const UNMATCHED_HEADER: &[&str] = &["link", "key", "raw_reference", "reason", "source_file", "row"];
const PAIR_HEADER: &[&str] = &[
    "counterparty",
    "date",
    "amount",
    "amount_delta",
    "primary_reference",
    "derived_reference",
    "primary_row",
    "derived_row",
];
const UNPAIRED_HEADER: &[&str] = &["reference", "transaction_type", "reason", "source_file", "row"];
const DERIVED_HEADER: &[&str] = &[
    "derived_reference",
    "status",
    "target_key",
    "primary_reference",
    "note",
    "source_file",
    "row",
];

#[derive(Serialize)]
struct UnmatchedRow<'a> {
    link: &'a str,
    key: &'a str,
    raw_reference: &'a str,
    reason: &'static str,
    source_file: &'a str,
    row: usize,
}

#[derive(Serialize)]
struct PairRow<'a> {
    counterparty: &'a str,
    date: String,
    amount: String,
    amount_delta: String,
    primary_reference: String,
    derived_reference: String,
    primary_row: usize,
    derived_row: usize,
}

#[derive(Serialize)]
struct UnpairedRow<'a> {
    reference: String,
    transaction_type: &'a str,
    reason: &'static str,
    source_file: &'a str,
    row: usize,
}

#[derive(Serialize)]
struct DerivedRow<'a> {
    derived_reference: String,
    status: &'static str,
    target_key: String,
    primary_reference: String,
    note: String,
    source_file: &'a str,
    row: usize,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    meta: &'a ReconMeta,
    summary: &'a ReconSummary,
}

/// File name for the unmatched detail of `link`.
pub fn unmatched_file_name(link: &str) -> String {
    let safe: String = link
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("unmatched_{safe}.csv")
}

/// Write every report table for `result` into `dir`, creating it if needed.
/// Returns the paths written, in write order.
pub fn write_reports(result: &ReconResult, dir: &Path) -> Result<Vec<PathBuf>, ReconError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", dir.display())))?;
    let mut written = Vec::new();

    let path = dir.join(LINKAGE_SUMMARY_FILE);
    write_csv(&path, LINK_SUMMARY_HEADER, &result.summary.links)?;
    written.push(path);

    for link in &result.links {
        let rows: Vec<UnmatchedRow<'_>> = link
            .unmatched_detail
            .iter()
            .map(|u| UnmatchedRow {
                link: &link.spec.name,
                key: u.key.as_str(),
                raw_reference: &u.raw_reference,
                reason: u.reason.description(),
                source_file: &u.origin.source_file,
                row: u.origin.row,
            })
            .collect();
        let path = dir.join(unmatched_file_name(&link.spec.name));
        write_csv(&path, UNMATCHED_HEADER, &rows)?;
        written.push(path);
    }

    if let Some(ref pairing) = result.pairing {
        let pairs: Vec<PairRow<'_>> = pairing
            .pairs
            .iter()
            .map(|p| PairRow {
                counterparty: &p.counterparty,
                date: p.date.to_string(),
                amount: p.amount.to_string(),
                amount_delta: p.amount_delta.to_string(),
                primary_reference: p.primary_reference.to_string(),
                derived_reference: p.derived_reference.to_string(),
                primary_row: p.primary_origin.row,
                derived_row: p.derived_origin.row,
            })
            .collect();
        let path = dir.join(PAYMENT_PAIRS_FILE);
        write_csv(&path, PAIR_HEADER, &pairs)?;
        written.push(path);

        let unpaired: Vec<UnpairedRow<'_>> = pairing
            .unpaired
            .iter()
            .map(|u| UnpairedRow {
                reference: u.reference.to_string(),
                transaction_type: &u.transaction_type,
                reason: u.reason.description(),
                source_file: &u.origin.source_file,
                row: u.origin.row,
            })
            .collect();
        let path = dir.join(UNPAIRED_FILE);
        write_csv(&path, UNPAIRED_HEADER, &unpaired)?;
        written.push(path);
    }

    if let Some(ref inheritance) = result.inheritance {
        let rows: Vec<DerivedRow<'_>> = inheritance
            .entries
            .iter()
            .map(|e| {
                let (target_key, primary_reference, note) = match &e.outcome {
                    LinkOutcome::Direct { target_key } => {
                        (target_key.to_string(), String::new(), String::new())
                    }
                    LinkOutcome::Inherited(l) => (
                        l.target_key.to_string(),
                        l.primary_reference.to_string(),
                        l.note.clone(),
                    ),
                    LinkOutcome::Unmatched { reason } => {
                        (String::new(), String::new(), reason.to_string())
                    }
                };
                DerivedRow {
                    derived_reference: e.derived_reference.to_string(),
                    status: e.outcome.status(),
                    target_key,
                    primary_reference,
                    note,
                    source_file: &e.origin.source_file,
                    row: e.origin.row,
                }
            })
            .collect();
        let path = dir.join(DERIVED_LINKS_FILE);
        write_csv(&path, DERIVED_HEADER, &rows)?;
        written.push(path);
    }

    let path = dir.join(SUMMARY_JSON_FILE);
    let doc = SummaryDocument {
        meta: &result.meta,
        summary: &result.summary,
    };
    let json = serde_json::to_string_pretty(&doc)
        .map_err(|e| ReconError::Io(format!("JSON serialization error: {e}")))?;
    std::fs::write(&path, json)
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;
    written.push(path);

    log::info!("wrote {} report files to {}", written.len(), dir.display());
    Ok(written)
}

/// The header row is written explicitly so empty tables still carry one.
fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
