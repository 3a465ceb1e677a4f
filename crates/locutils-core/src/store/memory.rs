//! In-memory [`SeedStore`] implementation for tests.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{OntologyApi, Terminology};

use super::{SeedStore, WriteStatus};

struct StoredTerminology {
    terminology: Terminology,
    editor: String,
    content_hash: String,
}

/// In-memory store for testing.
pub struct InMemoryStore {
    terminologies: RwLock<HashMap<String, StoredTerminology>>,
    ontology_apis: RwLock<HashMap<String, OntologyApi>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            terminologies: RwLock::new(HashMap::new()),
            ontology_apis: RwLock::new(HashMap::new()),
        }
    }

    /// Editor recorded by the last write of `id`.
    pub fn editor(&self, id: &str) -> Option<String> {
        self.terminologies
            .read()
            .ok()?
            .get(id)
            .map(|s| s.editor.clone())
    }

    pub fn ontology_api_count(&self) -> usize {
        self.ontology_apis.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl SeedStore for InMemoryStore {
    async fn get_terminology(&self, id: &str) -> Result<Option<Terminology>> {
        Ok(read(&self.terminologies)?
            .get(id)
            .map(|s| s.terminology.clone()))
    }

    async fn save_terminology(
        &self,
        terminology: &Terminology,
        editor: &str,
    ) -> Result<WriteStatus> {
        let content_hash = terminology.content_hash();
        let mut stored = write(&self.terminologies)?;
        let status = match stored.get(&terminology.id) {
            None => WriteStatus::Created,
            Some(prev) if prev.content_hash == content_hash => WriteStatus::Unchanged,
            Some(_) => WriteStatus::Replaced,
        };
        stored.insert(
            terminology.id.clone(),
            StoredTerminology {
                terminology: terminology.clone(),
                editor: editor.to_string(),
                content_hash,
            },
        );
        Ok(status)
    }

    async fn terminology_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = read(&self.terminologies)?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_ontology_api(&self, api_id: &str) -> Result<Option<OntologyApi>> {
        Ok(read(&self.ontology_apis)?.get(api_id).cloned())
    }

    async fn upsert_ontology_api(&self, api: &OntologyApi) -> Result<()> {
        write(&self.ontology_apis)?.insert(api.api_id.clone(), api.clone());
        Ok(())
    }
}
