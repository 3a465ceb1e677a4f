//! Typed failures of the seeding pipeline.
//!
//! Most functions return `anyhow::Result`; the variants here are the
//! conditions callers (and tests) need to tell apart. They survive
//! `anyhow` wrapping and can be recovered with `downcast_ref`.

use locutils_core::orphan::OrphanedCodings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    /// Local file missing or unreadable, or a remote fetch failed.
    #[error("source unavailable: {source_ref}: {reason}")]
    SourceUnavailable { source_ref: String, reason: String },

    /// No reader exists for the file extension.
    #[error("unsupported format for '{source_ref}': no reader for extension '{extension}'")]
    UnsupportedFormat {
        source_ref: String,
        extension: String,
    },

    /// The source was read but its content could not be turned into rows
    /// or records.
    #[error("malformed source {source_ref}: {reason}")]
    MalformedSource { source_ref: String, reason: String },

    #[error(transparent)]
    PotentialOrphan(#[from] OrphanedCodings),

    #[error(
        "no database URI: pass --db-uri, set db.uri in the settings file, \
         or export LOCUTUS_DB_URI or DATABASE_URL"
    )]
    MissingDatabaseTarget,
}

impl SeedError {
    pub(crate) fn unavailable(source_ref: impl ToString, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_ref: source_ref.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(source_ref: impl ToString, reason: impl ToString) -> Self {
        Self::MalformedSource {
            source_ref: source_ref.to_string(),
            reason: reason.to_string(),
        }
    }
}
