//! SQLite-backed [`SeedStore`] implementation.
//!
//! Terminologies and ontology API records are stored as JSON documents, one
//! row per id, with a few columns pulled out for listing. Every terminology
//! write also appends a provenance row naming the editor.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use locutils_core::models::{OntologyApi, Terminology};
use locutils_core::store::{SeedStore, WriteStatus};

use crate::db;
use crate::migrate;

/// SQLite implementation of the [`SeedStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `uri` and bring the schema up to date.
    pub async fn connect(uri: &str) -> Result<Self> {
        tracing::info!(db = %db::redact_uri(uri), "initializing locutus datamodel");
        let pool = db::connect(uri)
            .await
            .with_context(|| format!("Failed to open database {}", db::redact_uri(uri)))?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Number of provenance rows recorded for `terminology_id`.
    pub async fn provenance_count(&self, terminology_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM terminology_provenance WHERE terminology_id = ?",
        )
        .bind(terminology_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl SeedStore for SqliteStore {
    async fn get_terminology(&self, id: &str) -> Result<Option<Terminology>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM terminologies WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        document
            .map(|doc| {
                serde_json::from_str(&doc)
                    .with_context(|| format!("Stored terminology '{}' is not valid JSON", id))
            })
            .transpose()
    }

    async fn save_terminology(
        &self,
        terminology: &Terminology,
        editor: &str,
    ) -> Result<WriteStatus> {
        let content_hash = terminology.content_hash();
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT content_hash FROM terminologies WHERE id = ?")
                .bind(&terminology.id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = match existing {
            None => WriteStatus::Created,
            Some(hash) if hash == content_hash => WriteStatus::Unchanged,
            Some(_) => WriteStatus::Replaced,
        };

        if status == WriteStatus::Unchanged {
            tx.rollback().await?;
            return Ok(status);
        }

        let now = chrono::Utc::now().timestamp();
        let document = serde_json::to_string(terminology)?;
        let code_count = terminology.codes.len() as i64;

        sqlx::query(
            r#"
            INSERT INTO terminologies (id, name, resource_type, code_count, document,
                                       content_hash, editor, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                resource_type = excluded.resource_type,
                code_count = excluded.code_count,
                document = excluded.document,
                content_hash = excluded.content_hash,
                editor = excluded.editor,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&terminology.id)
        .bind(&terminology.name)
        .bind(&terminology.resource_type)
        .bind(code_count)
        .bind(&document)
        .bind(&content_hash)
        .bind(editor)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO terminology_provenance (terminology_id, editor, action, code_count, recorded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&terminology.id)
        .bind(editor)
        .bind(status.as_str())
        .bind(code_count)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(status)
    }

    async fn terminology_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM terminologies ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn get_ontology_api(&self, api_id: &str) -> Result<Option<OntologyApi>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM ontology_apis WHERE api_id = ?")
                .bind(api_id)
                .fetch_optional(&self.pool)
                .await?;

        document
            .map(|doc| {
                serde_json::from_str(&doc)
                    .with_context(|| format!("Stored ontology API '{}' is not valid JSON", api_id))
            })
            .transpose()
    }

    async fn upsert_ontology_api(&self, api: &OntologyApi) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let document = serde_json::to_string(api)?;

        sqlx::query(
            r#"
            INSERT INTO ontology_apis (api_id, api_name, api_url, document, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(api_id) DO UPDATE SET
                api_name = excluded.api_name,
                api_url = excluded.api_url,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&api.api_id)
        .bind(&api.api_name)
        .bind(&api.api_url)
        .bind(&document)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locutils_core::models::{Code, Ontology};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    async fn store(tmp: &TempDir) -> SqliteStore {
        let uri = format!("sqlite:{}", tmp.path().join("locutus.sqlite").display());
        SqliteStore::connect(&uri).await.unwrap()
    }

    fn terminology(codes: &[&str]) -> Terminology {
        Terminology {
            id: "HP".to_string(),
            name: "Human Phenotype Ontology".to_string(),
            description: "Phenotypic abnormalities".to_string(),
            url: "http://purl.obolibrary.org/obo/hp.owl".to_string(),
            resource_type: "Terminology".to_string(),
            codes: codes
                .iter()
                .map(|c| Code {
                    code: c.to_string(),
                    display: format!("{c} display"),
                    description: String::new(),
                    system: "http://purl.obolibrary.org/obo/hp.owl".to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_terminology_roundtrip_and_status() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;

        assert!(store.get_terminology("HP").await.unwrap().is_none());

        let v1 = terminology(&["HP:0001", "HP:0002"]);
        assert_eq!(
            store.save_terminology(&v1, "seed-script").await.unwrap(),
            WriteStatus::Created
        );
        assert_eq!(store.get_terminology("HP").await.unwrap(), Some(v1.clone()));

        assert_eq!(
            store.save_terminology(&v1, "seed-script").await.unwrap(),
            WriteStatus::Unchanged
        );

        let v2 = terminology(&["HP:0001", "HP:0002", "HP:0003"]);
        assert_eq!(
            store.save_terminology(&v2, "seed-script").await.unwrap(),
            WriteStatus::Replaced
        );
        assert_eq!(store.get_terminology("HP").await.unwrap(), Some(v2));
        assert_eq!(store.provenance_count("HP").await.unwrap(), 2);
        assert_eq!(store.terminology_ids().await.unwrap(), vec!["HP"]);
        store.close().await;
    }

    #[tokio::test]
    async fn test_ontology_api_full_replace() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).await;

        let ontology = |title: &str| Ontology {
            version: "2024-01".to_string(),
            ontology_title: title.to_string(),
            system: String::new(),
            ontology_code: title.to_lowercase(),
            short_list: true,
        };
        let mut api = OntologyApi {
            api_id: "umls".to_string(),
            api_name: "Unified Medical Language System".to_string(),
            api_url: "https://uts-ws.nlm.nih.gov/rest/".to_string(),
            ontologies: BTreeMap::from([
                ("HP".to_string(), ontology("HP")),
                ("MONDO".to_string(), ontology("MONDO")),
            ]),
        };
        store.upsert_ontology_api(&api).await.unwrap();

        api.ontologies = BTreeMap::from([("LOINC".to_string(), ontology("LOINC"))]);
        store.upsert_ontology_api(&api).await.unwrap();

        let stored = store.get_ontology_api("umls").await.unwrap().unwrap();
        assert_eq!(stored.ontologies.keys().collect::<Vec<_>>(), vec!["LOINC"]);
        store.close().await;
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let first = store(&tmp).await;
        first.save_terminology(&terminology(&["A"]), "seed-script").await.unwrap();
        first.close().await;

        let second = store(&tmp).await;
        assert_eq!(second.terminology_ids().await.unwrap(), vec!["HP"]);
        second.close().await;
    }
}
