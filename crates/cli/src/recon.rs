//! `stocklink run|validate|normalize`: config-driven reference linkage.

use std::path::{Path, PathBuf};

use serde::Serialize;
use stocklink_recon::linkage::LinkStatus;
use stocklink_recon::normalize::ZeroPolicy;
use stocklink_recon::{Normalizer, RawIdentifier, ReconConfig, ReconError, ReconResult, SourceCache};

use crate::exit_codes::{
    EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME, EXIT_RECON_UNMATCHED, EXIT_USAGE,
};
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Map library errors onto exit codes. Config problems are 60, the rest 61.
fn from_recon(e: ReconError) -> CliError {
    match e {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::UnknownSource(_)
        | ReconError::FieldNotCarried { .. } => CliError {
            code: EXIT_RECON_INVALID_CONFIG,
            message: e.to_string(),
            hint: Some("check the config with `stocklink validate <config>`".into()),
        },
        ReconError::MissingColumn { ref column, .. } => CliError {
            code: EXIT_RECON_RUNTIME,
            hint: Some(format!(
                "the file header has no column '{column}'; fix the [sources.*.columns] mapping"
            )),
            message: e.to_string(),
        },
        other => recon_err(EXIT_RECON_RUNTIME, other.to_string()),
    }
}

fn read_config(config_path: &Path) -> Result<(ReconConfig, PathBuf), CliError> {
    if !config_path.is_file() {
        return Err(recon_err(
            EXIT_USAGE,
            format!("config file not found: {}", config_path.display()),
        ));
    }
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("cannot read config: {e}")))?;
    let config = ReconConfig::from_toml(&config_str).map_err(from_recon)?;

    // Source and output paths resolve relative to the config file's directory
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_dir: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;

    let mut cache = SourceCache::new();
    let input = stocklink_recon::load_sources(&config, &base_dir, &mut cache).map_err(from_recon)?;
    let (hits, misses) = cache.stats();
    tracing::debug!(hits, misses, "source cache");

    let result = stocklink_recon::run(&config, &input).map_err(from_recon)?;

    let report_dir = output_dir.or_else(|| config.output.dir.as_ref().map(|d| base_dir.join(d)));
    if let Some(ref dir) = report_dir {
        let written = stocklink_recon::report::write_reports(&result, dir).map_err(from_recon)?;
        tracing::info!(files = written.len(), dir = %dir.display(), "reports written");
        eprintln!("wrote {} report file(s) to {}", written.len(), dir.display());
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_summary(&result);

    if strict && (result.summary.total_unmatched_keys > 0 || result.summary.derived_unmatched > 0) {
        return Err(recon_err(
            EXIT_RECON_UNMATCHED,
            format!(
                "unmatched references found ({} keys, {} derived transactions)",
                result.summary.total_unmatched_keys, result.summary.derived_unmatched
            ),
        ));
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!("run '{}': {} link(s)", result.meta.config_name, s.links.len());
    for link in &s.links {
        match link.status {
            LinkStatus::Linked => eprintln!(
                "  {}: {}/{} keys matched ({:.1}%), {} unmatched, {} missing reference(s)",
                link.name,
                link.matched,
                link.source_keys,
                link.match_rate * 100.0,
                link.unmatched,
                link.missing_references,
            ),
            LinkStatus::NoData => eprintln!(
                "  {}: insufficient data ({} {} records)",
                link.name, link.source_records, link.source,
            ),
        }
    }

    if result.pairing.is_some() {
        eprintln!(
            "pairing: {} pair(s), {} unpaired, {} ambiguous primaries, {} ambiguous derived",
            s.payment_pairs, s.unpaired_transactions, s.ambiguous_primaries, s.ambiguous_derived,
        );
    }
    if result.inheritance.is_some() {
        eprintln!(
            "derived: {} direct, {} inherited, {} unmatched",
            s.derived_direct, s.derived_inherited, s.derived_unmatched,
        );
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, _) = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' with {} source(s), {} link(s){}",
        config.name,
        config.sources.len(),
        config.links.len(),
        if config.pairing.is_some() { ", pairing" } else { "" },
    );
    Ok(())
}

#[derive(Serialize)]
struct NormalizedValue<'a> {
    raw: &'a str,
    key: Option<String>,
}

pub fn cmd_normalize(values: Vec<String>, zero_as_missing: bool, json: bool) -> Result<(), CliError> {
    let policy = if zero_as_missing { ZeroPolicy::Missing } else { ZeroPolicy::Literal };
    let normalizer = Normalizer::new(policy);

    let rows: Vec<NormalizedValue<'_>> = values
        .iter()
        .map(|v| NormalizedValue {
            raw: v,
            key: normalizer
                .normalize(&RawIdentifier::from(v.as_str()))
                .map(|k| k.as_str().to_string()),
        })
        .collect();

    if json {
        let json_str = serde_json::to_string(&rows)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for row in &rows {
            println!("{}\t{}", row.raw, row.key.as_deref().unwrap_or("<none>"));
        }
    }
    Ok(())
}
