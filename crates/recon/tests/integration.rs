use std::collections::BTreeSet;
use std::path::PathBuf;

use stocklink_recon::classify::UnmatchedReason;
use stocklink_recon::config::ReconConfig;
use stocklink_recon::engine::{load_sources, run};
use stocklink_recon::inherit::{DerivedMiss, LinkOutcome};
use stocklink_recon::linkage::LinkStatus;
use stocklink_recon::pairing::UnpairedReason;
use stocklink_recon::report::{self, write_reports};
use stocklink_recon::{DocumentKind, NormalizedKey, ReconResult, SourceCache};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_and_run(config_file: &str) -> ReconResult {
    let dir = fixtures_dir();
    let toml = std::fs::read_to_string(dir.join(config_file)).unwrap();
    let config = ReconConfig::from_toml(&toml).unwrap();
    let mut cache = SourceCache::new();
    let input = load_sources(&config, &dir, &mut cache).unwrap();
    run(&config, &input).unwrap()
}

fn key(s: &str) -> NormalizedKey {
    NormalizedKey::parse(s).unwrap()
}

// -------------------------------------------------------------------------
// Linkage
// -------------------------------------------------------------------------

#[test]
fn zero_padded_invoice_links_to_statement() {
    let result = load_and_run("stock-audit.toml");
    let link = result.link("grn_invoice_to_statement").unwrap();

    assert_eq!(link.status, LinkStatus::Linked);
    assert_eq!(link.source_records, 4);
    assert_eq!(link.source_keys, 2);
    assert_eq!(link.missing_references, 2);
    assert_eq!(link.match_rate, 1.0);
    assert!(link.matched.contains(&key("1015775")));
    assert!(link.unmatched.is_empty());
}

#[test]
fn voucher_link_classifies_unmatched() {
    let result = load_and_run("stock-audit.toml");
    let link = result.link("grn_voucher_to_register").unwrap();

    assert_eq!(link.source_keys, 4);
    assert_eq!(link.matched.len(), 2);
    assert!(link.matched.contains(&key("PV0013")));
    assert_eq!(link.match_rate, 0.5);

    let reasons: Vec<(&str, UnmatchedReason)> = link
        .unmatched_detail
        .iter()
        .map(|u| (u.key.as_str(), u.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("MAN0099", UnmatchedReason::SpecialVoucher),
            ("PV0014", UnmatchedReason::SequenceGap),
        ]
    );
    assert_eq!(link.unmatched_detail[0].origin.source_file, "grn.csv");
    assert_eq!(link.unmatched_detail[0].origin.row, 4);
}

#[test]
fn missing_references_never_become_keys() {
    let result = load_and_run("stock-audit.toml");
    for link in &result.links {
        for k in link.matched.iter().chain(&link.unmatched) {
            assert!(!k.as_str().trim().is_empty(), "link '{}' has a blank key", link.spec.name);
        }
        assert_eq!(link.matched.len() + link.unmatched.len(), link.source_keys);
    }
}

#[test]
fn pairing_link_indexes_primaries_only() {
    let result = load_and_run("stock-audit.toml");
    let link = result.link("statement_to_grn").unwrap();

    assert_eq!(link.source_records, 3);
    assert_eq!(link.source_keys, 3);
    assert_eq!(link.matched.len(), 2);
    assert_eq!(link.unmatched, BTreeSet::from([key("55555")]));
    assert_eq!(link.unmatched_detail[0].reason, UnmatchedReason::NumericNotFound);
    assert!(!link.unmatched.contains(&key("999999")));
}

// -------------------------------------------------------------------------
// Pairing + Inheritance
// -------------------------------------------------------------------------

#[test]
fn settlement_pairs_with_same_day_invoice() {
    let result = load_and_run("stock-audit.toml");
    let pairing = result.pairing.as_ref().unwrap();

    assert_eq!(pairing.pairs.len(), 1);
    let pair = &pairing.pairs[0];
    assert_eq!(pair.primary_reference.to_string(), "27949");
    assert_eq!(pair.derived_reference.to_string(), "999999");
    assert_eq!(pair.amount.to_string(), "84588.37");
    assert!(pair.amount_delta.is_zero());

    assert_eq!(pairing.unpaired.len(), 4);
    let bad_date = pairing
        .unpaired
        .iter()
        .find(|u| u.reference.to_string() == "888888")
        .unwrap();
    assert_eq!(bad_date.reason, UnpairedReason::UnparseableDate);
    assert_eq!(bad_date.reason.description(), "unpaired, unparseable-date");
}

#[test]
fn settlement_inherits_invoice_link() {
    let result = load_and_run("stock-audit.toml");
    let inheritance = result.inheritance.as_ref().unwrap();

    assert_eq!(inheritance.link, "statement_to_grn");
    assert_eq!(inheritance.entries.len(), 3);
    assert_eq!(inheritance.inherited, 1);
    assert_eq!(inheritance.unmatched, 2);

    let inherited: Vec<_> = inheritance.inherited_links().collect();
    assert_eq!(inherited[0].derived_reference.to_string(), "999999");
    assert_eq!(inherited[0].primary_reference.to_string(), "27949");
    assert_eq!(inherited[0].target_key, key("27949"));
    assert_eq!(inherited[0].note, "payment for invoice 27949");

    let outcome_for = |reference: &str| {
        inheritance
            .entries
            .iter()
            .find(|e| e.derived_reference.to_string() == reference)
            .map(|e| e.outcome.clone())
            .unwrap()
    };
    assert!(matches!(
        outcome_for("888888"),
        LinkOutcome::Unmatched { reason: DerivedMiss::Unpaired(UnpairedReason::UnparseableDate) }
    ));
    assert!(matches!(
        outcome_for("777777"),
        LinkOutcome::Unmatched { reason: DerivedMiss::NoPair }
    ));
}

#[test]
fn summary_totals() {
    let result = load_and_run("stock-audit.toml");
    let s = &result.summary;

    assert_eq!(s.links.len(), 3);
    assert_eq!(s.total_unmatched_keys, 3);
    assert_eq!(s.links_without_data, 0);
    assert_eq!(s.payment_pairs, 1);
    assert_eq!(s.unpaired_transactions, 4);
    assert_eq!(s.derived_inherited, 1);
    assert_eq!(s.derived_unmatched, 2);
    assert_eq!(result.meta.config_name, "FY2022 stock audit");
}

// -------------------------------------------------------------------------
// Degraded input
// -------------------------------------------------------------------------

#[test]
fn empty_target_collection_reports_no_data() {
    let result = load_and_run("stores.toml");
    let link = result.link("movement_to_issue").unwrap();

    assert_eq!(link.status, LinkStatus::NoData);
    assert_eq!(link.target_records, 0);
    assert_eq!(link.source_keys, 2);
    assert_eq!(link.unmatched.len(), 2);
    assert_eq!(link.match_rate, 0.0);
    assert!(result.pairing.is_none());
    assert!(result.inheritance.is_none());
}

#[test]
fn missing_configured_column_is_fatal() {
    let dir = fixtures_dir();
    let toml = std::fs::read_to_string(dir.join("stores.toml"))
        .unwrap()
        .replace("item = \"Item\"", "item = \"Material\"");
    let config = ReconConfig::from_toml(&toml).unwrap();
    let err = load_sources(&config, &dir, &mut SourceCache::new()).unwrap_err();
    assert!(err.to_string().contains("missing column 'Material'"));
}

#[test]
fn cache_reuses_unchanged_sources() {
    let dir = fixtures_dir();
    let toml = std::fs::read_to_string(dir.join("stock-audit.toml")).unwrap();
    let config = ReconConfig::from_toml(&toml).unwrap();
    let mut cache = SourceCache::new();

    let first = load_sources(&config, &dir, &mut cache).unwrap();
    let second = load_sources(&config, &dir, &mut cache).unwrap();

    assert_eq!(cache.stats(), (3, 3));
    assert_eq!(
        first.get(DocumentKind::Grn).len(),
        second.get(DocumentKind::Grn).len()
    );
}

// -------------------------------------------------------------------------
// Reports
// -------------------------------------------------------------------------

#[test]
fn reports_written_for_every_table() {
    let result = load_and_run("stock-audit.toml");
    let out = tempfile::tempdir().unwrap();
    let written = write_reports(&result, out.path()).unwrap();

    // summary + 3 unmatched + pairs + unpaired + derived + json
    assert_eq!(written.len(), 8);
    for name in [
        report::LINKAGE_SUMMARY_FILE,
        report::PAYMENT_PAIRS_FILE,
        report::UNPAIRED_FILE,
        report::DERIVED_LINKS_FILE,
        report::SUMMARY_JSON_FILE,
        "unmatched_grn_voucher_to_register.csv",
    ] {
        assert!(out.path().join(name).exists(), "{name} missing");
    }

    let derived = std::fs::read_to_string(out.path().join(report::DERIVED_LINKS_FILE)).unwrap();
    assert!(derived.contains("999999,inherited,27949,27949,payment for invoice 27949"));

    let unpaired = std::fs::read_to_string(out.path().join(report::UNPAIRED_FILE)).unwrap();
    assert!(unpaired.contains("\"unpaired, unparseable-date\""));
}
