use std::path::Path;

use crate::cache::SourceCache;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::inherit::inherit_links;
use crate::linkage::{link, LinkageResult};
use crate::loader::load_records;
use crate::model::{ReconInput, ReconMeta, ReconResult};
use crate::pairing::{resolve_pairs, PairingConfig, TransactionRole};
use crate::record::{DocumentKind, SourceRecord};
use crate::summary::compute_summary;

/// Run every configured link, then pairing and inheritance. Returns the
/// linkage results together with their summary.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let normalizer = config.normalize;
    let pairing_link = config.pairing_link().map(|l| l.name.as_str());

    let mut links = Vec::with_capacity(config.links.len());
    for spec in &config.links {
        spec.validate()?;
        let target = input.get(spec.target);
        let result = match (&config.pairing, pairing_link) {
            // Derived transactions are resolved through inheritance, so the
            // pairing link only indexes primaries.
            (Some(pairing), Some(name)) if name == spec.name => {
                let primaries = primary_transactions(input.get(spec.source), pairing);
                link(spec, &primaries, target, &normalizer, &config.classify)
            }
            _ => link(spec, input.get(spec.source), target, &normalizer, &config.classify),
        };
        log::info!(
            "link '{}': {}/{} keys matched ({:.1}%)",
            spec.name,
            result.matched.len(),
            result.source_keys,
            result.match_rate * 100.0
        );
        links.push(result);
    }

    let statement = input.get(DocumentKind::SupplierTransaction);
    let pairing = config
        .pairing
        .as_ref()
        .map(|p| resolve_pairs(statement, p, &normalizer));

    let inheritance = match (&config.pairing, &pairing, pairing_link) {
        (Some(pairing_config), Some(output), Some(name)) => {
            let primary_link = find_link(&links, name)?;
            Some(inherit_links(primary_link, output, statement, pairing_config, &normalizer))
        }
        _ => None,
    };

    if let Some(ref p) = pairing {
        log::info!("pairing: {} pairs, {} unpaired", p.pairs.len(), p.unpaired.len());
    }
    if let Some(ref i) = inheritance {
        log::info!(
            "inheritance via '{}': {} direct, {} inherited, {} unmatched",
            i.link,
            i.direct,
            i.inherited,
            i.unmatched
        );
    }

    let summary = compute_summary(&links, pairing.as_ref(), inheritance.as_ref());

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            zero_policy: normalizer.zero_policy,
        },
        summary,
        links,
        pairing,
        inheritance,
    })
}

/// Load every configured source relative to `base_dir`, reusing `cache`
/// entries whose file content and column mapping are unchanged.
pub fn load_sources(
    config: &ReconConfig,
    base_dir: &Path,
    cache: &mut SourceCache,
) -> Result<ReconInput, ReconError> {
    let mut input = ReconInput::new();
    for (kind, source) in config.source_kinds()? {
        let path = base_dir.join(&source.file);
        let bytes = std::fs::read(&path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        let records = cache.get_or_load(kind, source, &bytes, || {
            load_records(kind, kind.as_str(), &path, source)
        })?;
        log::info!("loaded {} {kind} records from {}", records.len(), path.display());
        input.insert(kind, records);
    }
    Ok(input)
}

fn primary_transactions(records: &[SourceRecord], pairing: &PairingConfig) -> Vec<SourceRecord> {
    records
        .iter()
        .filter(|r| match r.as_supplier_transaction() {
            Some(txn) => pairing.role_of(txn.transaction_type.as_deref()) == TransactionRole::Primary,
            None => false,
        })
        .cloned()
        .collect()
}

fn find_link<'a>(links: &'a [LinkageResult], name: &str) -> Result<&'a LinkageResult, ReconError> {
    links
        .iter()
        .find(|l| l.spec.name == name)
        .ok_or_else(|| ReconError::ConfigValidation(format!("pairing: unknown link '{name}'")))
}
