use crate::inherit::InheritanceReport;
use crate::linkage::{LinkStatus, LinkageResult};
use crate::model::{LinkSummary, ReconSummary};
use crate::pairing::PairingOutput;

/// Compute summary statistics from linkage, pairing and inheritance results.
pub fn compute_summary(
    links: &[LinkageResult],
    pairing: Option<&PairingOutput>,
    inheritance: Option<&InheritanceReport>,
) -> ReconSummary {
    let mut summary = ReconSummary {
        links: links.iter().map(link_summary).collect(),
        ..Default::default()
    };

    for link in links {
        summary.total_unmatched_keys += link.unmatched.len();
        if link.status == LinkStatus::NoData {
            summary.links_without_data += 1;
        }
    }

    if let Some(p) = pairing {
        summary.payment_pairs = p.pairs.len();
        summary.unpaired_transactions = p.unpaired.len();
        summary.ambiguous_primaries = p.ambiguous_primaries;
        summary.ambiguous_derived = p.ambiguous_derived;
    }

    if let Some(i) = inheritance {
        summary.derived_direct = i.direct;
        summary.derived_inherited = i.inherited;
        summary.derived_unmatched = i.unmatched;
    }

    summary
}

pub fn link_summary(link: &LinkageResult) -> LinkSummary {
    LinkSummary {
        name: link.spec.name.clone(),
        source: link.spec.source,
        source_field: link.spec.source_field,
        target: link.spec.target,
        target_field: link.spec.target_field,
        status: link.status,
        source_records: link.source_records,
        source_keys: link.source_keys,
        target_keys: link.target_keys,
        matched: link.matched.len(),
        unmatched: link.unmatched.len(),
        missing_references: link.missing_references,
        match_rate: link.match_rate,
    }
}
