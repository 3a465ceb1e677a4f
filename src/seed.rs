//! Seeding pipeline orchestration.
//!
//! Coordinates a seed run: source selection → row reading → terminology
//! aggregation → orphan check → store write → summary. Ontology API
//! metadata is loaded by a second, independent pass over one sheet.
//!
//! Everything runs sequentially against the single store handle passed in.

use anyhow::{Context, Result};
use serde::Deserialize;

use locutils_core::aggregate::{aggregate_terminologies, DuplicateCodePolicy, TerminologySet};
use locutils_core::models::Terminology;
use locutils_core::ontology::{aggregate_ontology_apis, known_api};
use locutils_core::orphan::{check_orphans, OrphanCheck, OrphanedCodings};
use locutils_core::store::{SeedStore, WriteStatus};

use crate::catalog::{Catalog, Organization};
use crate::config::Settings;
use crate::error::SeedError;
use crate::reader::{RowReader, SourceRef};

/// What to do when a terminology would orphan persisted codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Leave that terminology untouched, report it, and carry on.
    Skip,
}

/// Which pipelines a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SeedType {
    Terminologies,
    #[value(name = "ontology_api")]
    OntologyApi,
    #[default]
    All,
}

impl SeedType {
    pub fn includes_terminologies(&self) -> bool {
        matches!(self, Self::Terminologies | Self::All)
    }

    pub fn includes_ontology_apis(&self) -> bool {
        matches!(self, Self::OntologyApi | Self::All)
    }
}

/// Which terminology sources a run loads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TerminologySelection {
    /// Catalog entries for the run's organization.
    #[default]
    Defaults,
    /// No terminologies at all.
    Skip,
    /// Exactly these files; the catalog is ignored.
    Files(Vec<String>),
}

impl TerminologySelection {
    /// `skip` or `none` anywhere in the list bypasses terminology loading;
    /// an empty list means catalog defaults.
    pub fn from_args(args: &[String]) -> Self {
        if args.is_empty() {
            Self::Defaults
        } else if args
            .iter()
            .any(|a| a.eq_ignore_ascii_case("skip") || a.eq_ignore_ascii_case("none"))
        {
            Self::Skip
        } else {
            Self::Files(args.to_vec())
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub seed_type: SeedType,
    pub organization: Organization,
    pub terminologies: TerminologySelection,
    pub load_ontology_apis: bool,
    pub ontology_api_source: String,
    pub on_orphan: OrphanPolicy,
    pub duplicate_codes: DuplicateCodePolicy,
    pub editor: String,
    pub url_base: Option<String>,
}

impl SeedOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            seed_type: SeedType::default(),
            organization: Organization::Kf,
            terminologies: TerminologySelection::default(),
            load_ontology_apis: settings.ontology_api.enabled,
            ontology_api_source: settings.ontology_api.csv_url.clone(),
            on_orphan: settings.terminologies.on_orphan,
            duplicate_codes: settings.terminologies.duplicate_codes,
            editor: settings.terminologies.editor.clone(),
            url_base: settings.terminologies.url_base.clone(),
        }
    }
}

/// A terminology written (or found unchanged) during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededTerminology {
    pub id: String,
    pub name: String,
    pub code_count: usize,
    pub status: WriteStatus,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedOntologyApi {
    pub api_id: String,
    pub ontology_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SeedSummary {
    pub seeded: Vec<SeededTerminology>,
    pub skipped: Vec<OrphanedCodings>,
    pub ontology_apis: Vec<LoadedOntologyApi>,
}

impl SeedSummary {
    pub fn get(&self, id: &str) -> Option<&SeededTerminology> {
        self.seeded.iter().find(|s| s.id == id)
    }

    /// A later write of the same id replaces the earlier entry.
    fn record(&mut self, seeded: SeededTerminology) {
        match self.seeded.iter_mut().find(|s| s.id == seeded.id) {
            Some(existing) => *existing = seeded,
            None => self.seeded.push(seeded),
        }
    }

    pub fn print(&self) {
        println!("Loaded {} terminologies.", self.seeded.len());
        for t in &self.seeded {
            println!(
                "{} - {} with {} codes ({})",
                t.id,
                t.name,
                t.code_count,
                t.status.as_str()
            );
        }
        if !self.skipped.is_empty() {
            println!("Skipped {} terminologies with orphaned codings:", self.skipped.len());
            for s in &self.skipped {
                println!("  {} - {}", s.terminology_id, s.codes.join(","));
            }
        }
        if !self.ontology_apis.is_empty() {
            println!("Loaded {} ontology APIs.", self.ontology_apis.len());
            for api in &self.ontology_apis {
                println!("{} with {} ontologies", api.api_id, api.ontology_count);
            }
        }
    }
}

/// Result of [`seed_terminology`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Saved(WriteStatus),
    /// Nothing was written.
    Orphaned(OrphanedCodings),
}

/// Write one terminology unless doing so would orphan persisted codes.
pub async fn seed_terminology(
    store: &dyn SeedStore,
    terminology: &Terminology,
    editor: &str,
) -> Result<SeedOutcome> {
    tracing::debug!(
        id = %terminology.id,
        name = %terminology.name,
        codes = terminology.codes.len(),
        "saving terminology"
    );

    let persisted = store
        .get_terminology(&terminology.id)
        .await
        .with_context(|| format!("Failed to fetch terminology '{}'", terminology.id))?;

    if let OrphanCheck::Orphaned(orphans) = check_orphans(terminology, persisted.as_ref()) {
        return Ok(SeedOutcome::Orphaned(orphans));
    }

    let status = store
        .save_terminology(terminology, editor)
        .await
        .with_context(|| format!("Failed to save terminology '{}'", terminology.id))?;
    Ok(SeedOutcome::Saved(status))
}

/// Read a source and group its rows into terminologies.
pub async fn read_terminologies(
    reader: &RowReader,
    source: &SourceRef,
    duplicates: DuplicateCodePolicy,
) -> Result<TerminologySet, SeedError> {
    let rows = reader.read_rows(source).await?;
    aggregate_terminologies(rows, duplicates).map_err(|e| SeedError::malformed(source, e))
}

/// Drives a seed run against one store.
pub struct Seeder<'a> {
    store: &'a dyn SeedStore,
    reader: RowReader,
    catalog: Catalog,
    options: SeedOptions,
}

impl<'a> Seeder<'a> {
    pub fn new(store: &'a dyn SeedStore, catalog: Catalog, options: SeedOptions) -> Self {
        Self {
            store,
            reader: RowReader::new(),
            catalog,
            options,
        }
    }

    pub async fn run(&self) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        if self.options.seed_type.includes_terminologies() {
            match &self.options.terminologies {
                TerminologySelection::Skip => {
                    tracing::info!("terminology loading skipped");
                }
                TerminologySelection::Files(files) => {
                    for file in files {
                        self.ingest_file(file, &mut summary).await?;
                    }
                }
                TerminologySelection::Defaults => {
                    self.load_default_terminologies(&mut summary).await?;
                }
            }
        }

        if self.options.seed_type.includes_ontology_apis() && self.options.load_ontology_apis {
            self.load_ontology_apis(&mut summary).await?;
        }

        Ok(summary)
    }

    /// Seed every catalog file that applies to the run's organization.
    pub async fn load_default_terminologies(&self, summary: &mut SeedSummary) -> Result<()> {
        let org = self.options.organization;
        for (name, entry) in self.catalog.entries() {
            if !entry.should_seed(org) {
                tracing::debug!(source = name, %org, "catalog entry not seeded");
                continue;
            }
            let files = entry.file_refs(self.options.url_base.as_deref());
            if files.is_empty() {
                tracing::warn!(source = name, "catalog entry has no normalized_data files");
            }
            for file in files {
                tracing::debug!(source = name, file = %file, "reading catalog file");
                self.ingest_file(&file, summary).await?;
            }
        }
        Ok(())
    }

    /// Read, aggregate, reconcile and persist the terminologies in one file.
    pub async fn ingest_file(&self, file: &str, summary: &mut SeedSummary) -> Result<()> {
        let source = SourceRef::parse(file)?;
        let terminologies =
            read_terminologies(&self.reader, &source, self.options.duplicate_codes).await?;

        for terminology in terminologies.iter() {
            match seed_terminology(self.store, terminology, &self.options.editor).await? {
                SeedOutcome::Saved(status) => {
                    tracing::info!(
                        id = %terminology.id,
                        codes = terminology.codes.len(),
                        status = status.as_str(),
                        "seeded terminology"
                    );
                    summary.record(SeededTerminology {
                        id: terminology.id.clone(),
                        name: terminology.name.clone(),
                        code_count: terminology.codes.len(),
                        status,
                        source: source.to_string(),
                    });
                }
                SeedOutcome::Orphaned(orphans) => match self.options.on_orphan {
                    OrphanPolicy::Abort => return Err(SeedError::PotentialOrphan(orphans).into()),
                    OrphanPolicy::Skip => {
                        tracing::warn!("{}", orphans);
                        summary.skipped.push(orphans);
                    }
                },
            }
        }
        Ok(())
    }

    /// Load the ontology API sheet and replace each API's record.
    pub async fn load_ontology_apis(&self, summary: &mut SeedSummary) -> Result<()> {
        let source = SourceRef::parse(&self.options.ontology_api_source)?;
        let rows = self.reader.read_rows(&source).await?;
        let apis = aggregate_ontology_apis(rows).map_err(|e| SeedError::malformed(&source, e))?;

        for api in &apis {
            if known_api(&api.api_id).is_none() {
                tracing::warn!(api_id = %api.api_id, "unknown ontology API; using id as name");
            }
            self.store
                .upsert_ontology_api(api)
                .await
                .with_context(|| format!("Failed to upsert ontology API '{}'", api.api_id))?;
            tracing::info!(
                api_id = %api.api_id,
                ontologies = api.ontologies.len(),
                "upserted ontology API"
            );
            summary.ontology_apis.push(LoadedOntologyApi {
                api_id: api.api_id.clone(),
                ontology_count: api.ontologies.len(),
            });
        }
        Ok(())
    }
}
