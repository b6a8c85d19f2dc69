use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::classify::UnmatchedClassifier;
use crate::error::ReconError;
use crate::linkage::LinkSpec;
use crate::normalize::Normalizer;
use crate::pairing::PairingConfig;
use crate::record::{DocumentKind, RefField};
use crate::report::unmatched_file_name;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub normalize: Normalizer,
    /// Keyed by document kind (`grn`, `issue`, `voucher`,
    /// `supplier_transaction`, `movement`).
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub pairing: Option<PairingConfig>,
    #[serde(default)]
    pub classify: UnmatchedClassifier,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    /// Worksheet name for Excel sources; defaults to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Field delimiter for text sources; sniffed when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Logical column name → header text in the file.
    pub columns: BTreeMap<String, String>,
}

impl SourceConfig {
    pub fn has_column(&self, logical: &str) -> bool {
        self.columns.contains_key(logical)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Report directory, relative to the config file.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Columns the pairing stage reads from supplier transactions.
const PAIRING_COLUMNS: &[&str] = &["reference", "transaction_type", "counterparty", "date", "amount"];

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sources keyed by parsed document kind.
    pub fn source_kinds(&self) -> Result<BTreeMap<DocumentKind, &SourceConfig>, ReconError> {
        self.sources
            .iter()
            .map(|(name, source)| {
                name.parse::<DocumentKind>()
                    .map(|kind| (kind, source))
                    .map_err(ReconError::UnknownSource)
            })
            .collect()
    }

    /// The link whose matches derived transactions inherit.
    pub fn pairing_link(&self) -> Option<&LinkSpec> {
        let name = self.pairing.as_ref()?.link.as_ref()?;
        self.links.iter().find(|l| &l.name == name)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.sources.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one source is required".into(),
            ));
        }

        let sources = self.source_kinds()?;

        for (kind, source) in &sources {
            for logical in source.columns.keys() {
                if !kind.columns().contains(&logical.as_str()) {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{kind}': unknown column '{logical}' (expected one of: {})",
                        kind.columns().join(", ")
                    )));
                }
            }
        }

        if self.links.is_empty() && self.pairing.is_none() {
            return Err(ReconError::ConfigValidation(
                "at least one link or a pairing section is required".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut report_files: HashMap<String, &str> = HashMap::new();
        for link in &self.links {
            if !names.insert(link.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate link name '{}'",
                    link.name
                )));
            }
            let file = unmatched_file_name(&link.name);
            if let Some(other) = report_files.insert(file.clone(), &link.name) {
                return Err(ReconError::ConfigValidation(format!(
                    "links '{other}' and '{}' would both write {file}",
                    link.name
                )));
            }
            link.validate()?;
            self.require_column(&sources, &link.name, link.source, link.source_field)?;
            self.require_column(&sources, &link.name, link.target, link.target_field)?;
        }

        if let Some(ref pairing) = self.pairing {
            self.validate_pairing(pairing, &sources)?;
        }

        Ok(())
    }

    fn require_column(
        &self,
        sources: &BTreeMap<DocumentKind, &SourceConfig>,
        link_name: &str,
        kind: DocumentKind,
        field: RefField,
    ) -> Result<(), ReconError> {
        let source = sources.get(&kind).ok_or_else(|| {
            ReconError::UnknownSource(format!("link '{link_name}': source '{kind}' not configured"))
        })?;
        if !source.has_column(field.as_str()) {
            return Err(ReconError::ConfigValidation(format!(
                "link '{link_name}': source '{kind}' does not map column '{field}'"
            )));
        }
        Ok(())
    }

    fn validate_pairing(
        &self,
        pairing: &PairingConfig,
        sources: &BTreeMap<DocumentKind, &SourceConfig>,
    ) -> Result<(), ReconError> {
        let statement = sources.get(&DocumentKind::SupplierTransaction).ok_or_else(|| {
            ReconError::UnknownSource("pairing requires a supplier_transaction source".into())
        })?;
        for column in PAIRING_COLUMNS {
            if !statement.has_column(column) {
                return Err(ReconError::ConfigValidation(format!(
                    "pairing: supplier_transaction source does not map column '{column}'"
                )));
            }
        }

        if pairing.tolerance < Decimal::ZERO {
            return Err(ReconError::ConfigValidation(format!(
                "pairing: tolerance must be non-negative, got {}",
                pairing.tolerance
            )));
        }
        if pairing.primary_types.is_empty() || pairing.derived_types.is_empty() {
            return Err(ReconError::ConfigValidation(
                "pairing: primary_types and derived_types must be non-empty".into(),
            ));
        }
        let overlap = pairing
            .primary_types
            .iter()
            .find(|p| pairing.derived_types.iter().any(|d| d.eq_ignore_ascii_case(p)));
        if let Some(tag) = overlap {
            return Err(ReconError::ConfigValidation(format!(
                "pairing: type '{tag}' is both primary and derived"
            )));
        }

        if let Some(ref link_name) = pairing.link {
            let link = self.links.iter().find(|l| &l.name == link_name).ok_or_else(|| {
                ReconError::ConfigValidation(format!("pairing: unknown link '{link_name}'"))
            })?;
            if link.source != DocumentKind::SupplierTransaction {
                return Err(ReconError::ConfigValidation(format!(
                    "pairing: link '{link_name}' must have source 'supplier_transaction', found '{}'",
                    link.source
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
