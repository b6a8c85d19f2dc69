//! `stocklink-recon`: cross-document reference linkage for procurement and
//! stock records.
//!
//! Records from goods-received notes, issues, payment vouchers, supplier
//! statements and stock movements are normalized to canonical reference keys
//! and linked across documents. Settlements on a supplier statement inherit
//! the links of the invoices they pay.

pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod inherit;
pub mod linkage;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pairing;
pub mod record;
pub mod report;
pub mod summary;

pub use cache::SourceCache;
pub use config::ReconConfig;
pub use engine::{load_sources, run};
pub use error::ReconError;
pub use model::{ReconInput, ReconResult};
pub use normalize::{normalize, same_reference, NormalizedKey, Normalizer, RawIdentifier, NO_KEY};
pub use record::{DocumentKind, RefField, SourceRecord};
