//! SQLite database connection management.
//!
//! Resolves the database target from CLI flags, settings and the
//! environment, and opens a connection pool to it. URIs are `sqlite:` URIs
//! or bare file paths; the database file and its parent directories are
//! created if missing.

use anyhow::{bail, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::config::Settings;
use crate::error::SeedError;

/// Environment variables consulted for the database URI, in order.
pub const DB_URI_ENV_VARS: [&str; 2] = ["LOCUTUS_DB_URI", "DATABASE_URL"];

/// Pick the database URI: flag, then settings, then environment.
pub fn resolve_db_uri(cli: Option<&str>, settings: &Settings) -> Result<String, SeedError> {
    resolve_db_uri_with(cli, settings, |key| std::env::var(key).ok())
}

pub fn resolve_db_uri_with<F>(
    cli: Option<&str>,
    settings: &Settings,
    env: F,
) -> Result<String, SeedError>
where
    F: Fn(&str) -> Option<String>,
{
    cli.map(str::to_string)
        .or_else(|| settings.db.uri.clone())
        .or_else(|| DB_URI_ENV_VARS.iter().find_map(|key| env(key)))
        .filter(|uri| !uri.trim().is_empty())
        .ok_or(SeedError::MissingDatabaseTarget)
}

/// Replace any password in `uri` so it can be logged.
pub fn redact_uri(uri: &str) -> String {
    match url::Url::parse(uri) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("****"));
            parsed.to_string()
        }
        _ => uri.to_string(),
    }
}

/// Local file path named by a `sqlite:` URI or bare path.
fn sqlite_path(uri: &str) -> Result<&str> {
    if let Some(rest) = uri.strip_prefix("sqlite://") {
        return Ok(rest);
    }
    if let Some(rest) = uri.strip_prefix("sqlite:") {
        return Ok(rest);
    }
    if let Some((scheme, _)) = uri.split_once("://") {
        bail!(
            "Unsupported database URI scheme '{}': expected a sqlite: URI or a file path",
            scheme
        );
    }
    Ok(uri)
}

/// Create a connection pool to the SQLite database named by `uri`.
///
/// WAL journal mode; at most one connection, since seeding is a single
/// sequential writer.
pub async fn connect(uri: &str) -> Result<SqlitePool> {
    let path = sqlite_path(uri)?;
    let (file, _query) = path.split_once('?').unwrap_or((path, ""));

    if file != ":memory:" {
        if let Some(parent) = Path::new(file).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}
