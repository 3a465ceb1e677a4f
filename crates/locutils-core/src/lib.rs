//! # locutils core
//!
//! Shared, I/O-free logic for locutils: data models, terminology and
//! ontology API aggregation, orphan detection, and the store abstraction.
//!
//! This crate contains no tokio, sqlx, network, or filesystem code. Row
//! sources and the SQLite store live in the `locutils` crate.

pub mod aggregate;
pub mod models;
pub mod ontology;
pub mod orphan;
pub mod store;
