//! # locutils
//!
//! Seed a locutus document store with terminologies and ontology API
//! metadata.
//!
//! Terminology sheets (CSV/TSV, or YAML/JSON row lists) are read from local
//! files or `https://` URLs, grouped into one document per terminology, and
//! written to the store. Before a terminology is replaced, its persisted
//! codes are compared with the incoming ones; a replacement that would drop
//! codes ("orphaned codings") is refused.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Catalog/CLI  │──▶│ Row reader  │──▶│  Aggregate   │──▶│  Orphan  │
//! │  selection   │   │ file/https  │   │ terminology  │   │  check   │
//! └──────────────┘   └─────────────┘   └──────────────┘   └────┬─────┘
//!                                                              ▼
//!                                                        ┌──────────┐
//!                                                        │  SQLite  │
//!                                                        │ document │
//!                                                        │  store   │
//!                                                        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! locutils seed --db-uri sqlite:data/locutus.sqlite            # catalog defaults for kf
//! locutils seed -o anvil -s terminologies                      # anvil terminologies only
//! locutils seed -t my_terms.csv -t https://example.org/x.csv   # explicit files
//! locutils seed -t skip                                        # ontology APIs only
//! locutils catalog -o include                                  # what would be seeded
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML settings parsing and validation |
//! | [`catalog`] | Default terminology source catalog (YAML) |
//! | [`reader`] | Row reader: local/remote sources, format dispatch |
//! | [`seed`] | Seed orchestration and run summary |
//! | [`sqlite_store`] | SQLite-backed [`store::SeedStore`] |
//! | [`db`] | Database target resolution and connection |
//! | [`migrate`] | Schema migrations (idempotent) |
//! | [`sources`] | Catalog listing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`error`] | Typed pipeline failures |

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod reader;
pub mod seed;
pub mod sources;
pub mod sqlite_store;

pub use error::SeedError;
pub use locutils_core::{aggregate, models, ontology, orphan, store};
