//! Caller-owned cache of loaded source collections.
//!
//! Entries are keyed by document kind, the SHA-256 of the file content and a
//! digest of the source's column mapping, sheet and delimiter, so a changed
//! file or a remapped source is a miss. Nothing is global; drop the cache to
//! forget it.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::config::SourceConfig;
use crate::error::ReconError;
use crate::record::{DocumentKind, SourceRecord};

pub type ContentHash = [u8; 32];

type CacheKey = (DocumentKind, ContentHash, ContentHash);

pub fn content_hash(bytes: &[u8]) -> ContentHash {
    Sha256::digest(bytes).into()
}

/// Digest of everything in `source` that shapes the loaded records. The file
/// path is not part of it.
pub fn mapping_hash(source: &SourceConfig) -> ContentHash {
    let mut hasher = Sha256::new();
    for (logical, header) in &source.columns {
        hasher.update(logical.as_bytes());
        hasher.update([0]);
        hasher.update(header.as_bytes());
        hasher.update([0]);
    }
    hasher.update([0xff]);
    if let Some(ref sheet) = source.sheet {
        hasher.update(sheet.as_bytes());
    }
    hasher.update([0xff]);
    if let Some(delimiter) = source.delimiter {
        hasher.update(delimiter.to_string().as_bytes());
    }
    hasher.finalize().into()
}

#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<CacheKey, Arc<Vec<SourceRecord>>>,
    hits: usize,
    misses: usize,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached records for `kind` loaded from `content` through
    /// `source`, or build them with `load`.
    pub fn get_or_load<F>(
        &mut self,
        kind: DocumentKind,
        source: &SourceConfig,
        content: &[u8],
        load: F,
    ) -> Result<Arc<Vec<SourceRecord>>, ReconError>
    where
        F: FnOnce() -> Result<Vec<SourceRecord>, ReconError>,
    {
        let key = (kind, content_hash(content), mapping_hash(source));
        if let Some(records) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(records));
        }
        self.misses += 1;
        let records = Arc::new(load()?);
        self.entries.insert(key, Arc::clone(&records));
        Ok(records)
    }

    /// Drop every entry for `kind`. Returns how many were removed.
    pub fn invalidate(&mut self, kind: DocumentKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _, _), _| *k != kind);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
