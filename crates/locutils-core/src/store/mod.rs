//! Storage abstraction for locutils.
//!
//! The [`SeedStore`] trait is the seam between the seeding pipeline and the
//! document store holding terminologies and ontology API records. The native
//! crate provides an SQLite implementation; [`memory::InMemoryStore`] backs
//! tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{OntologyApi, Terminology};

/// What a terminology write did to the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Created,
    Replaced,
    /// Stored content hash already matched.
    Unchanged,
}

impl WriteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Replaced => "replaced",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Abstract document store for seeded reference data.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_terminology`](SeedStore::get_terminology) | Fetch a persisted terminology |
/// | [`save_terminology`](SeedStore::save_terminology) | Create or replace a terminology |
/// | [`terminology_ids`](SeedStore::terminology_ids) | List persisted terminology ids |
/// | [`get_ontology_api`](SeedStore::get_ontology_api) | Fetch an ontology API record |
/// | [`upsert_ontology_api`](SeedStore::upsert_ontology_api) | Replace an ontology API record |
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn get_terminology(&self, id: &str) -> Result<Option<Terminology>>;

    /// Create or replace the terminology document keyed by `terminology.id`.
    ///
    /// `editor` is recorded as provenance for the write.
    async fn save_terminology(&self, terminology: &Terminology, editor: &str)
        -> Result<WriteStatus>;

    /// Sorted.
    async fn terminology_ids(&self) -> Result<Vec<String>>;

    async fn get_ontology_api(&self, api_id: &str) -> Result<Option<OntologyApi>>;

    /// Upsert keyed on `api_id`. The stored `ontologies` mapping is replaced,
    /// never merged.
    async fn upsert_ontology_api(&self, api: &OntologyApi) -> Result<()>;
}
