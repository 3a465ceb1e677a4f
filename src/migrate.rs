use anyhow::Result;
use sqlx::SqlitePool;

/// Create the document tables. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // One row per terminology; `document` holds the full JSON document
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terminologies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            code_count INTEGER NOT NULL,
            document TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            editor TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only record of every terminology write
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terminology_provenance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            terminology_id TEXT NOT NULL,
            editor TEXT NOT NULL,
            action TEXT NOT NULL,
            code_count INTEGER NOT NULL,
            recorded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ontology_apis (
            api_id TEXT PRIMARY KEY,
            api_name TEXT NOT NULL,
            api_url TEXT NOT NULL,
            document TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_provenance_terminology ON terminology_provenance(terminology_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
