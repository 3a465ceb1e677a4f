//! Core data models used throughout locutils.
//!
//! These types represent the raw rows read from a source, the terminology
//! documents built from them, and the ontology API records that are upserted
//! alongside.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single source row: field names paired with values, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Value of the first field named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One code entry of a terminology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub code: String,
    pub display: String,
    pub description: String,
    pub system: String,
}

/// A named collection of codes tied to one canonical coding system.
///
/// Persisted as a single document keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminology {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Canonical system URL.
    pub url: String,
    pub resource_type: String,
    pub codes: Vec<Code>,
}

impl Terminology {
    pub fn code_values(&self) -> BTreeSet<&str> {
        self.codes.iter().map(|c| c.code.as_str()).collect()
    }

    /// SHA-256 over every field, in declaration order.
    ///
    /// Used by stores to tell a replaced document from an unchanged one.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            &self.id,
            &self.name,
            &self.description,
            &self.url,
            &self.resource_type,
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0x1f]);
        }
        for code in &self.codes {
            for field in [&code.code, &code.display, &code.description, &code.system] {
                hasher.update(field.as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Ontology registered with an ontology API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ontology {
    pub version: String,
    pub ontology_title: String,
    pub system: String,
    /// Normalized (lowercase) code for the ontology, e.g. `mondo`.
    pub ontology_code: String,
    pub short_list: bool,
}

/// An external ontology lookup service and the ontologies it serves.
///
/// `ontologies` is keyed by curie and is always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyApi {
    pub api_id: String,
    pub api_name: String,
    pub api_url: String,
    pub ontologies: BTreeMap<String, Ontology>,
}
