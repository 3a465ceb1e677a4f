//! # locutils CLI
//!
//! The `locutils` binary seeds a locutus database with terminologies and
//! ontology API metadata, and lists the bundled catalog of default
//! terminology sources.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `locutils seed` | Load terminologies and ontology API metadata into the database |
//! | `locutils catalog` | List catalog sources and whether they are seeded |
//!
//! ## Examples
//!
//! ```bash
//! # Seed the defaults for Kids First
//! locutils seed --db-uri sqlite:data/locutus.sqlite
//!
//! # Seed two arbitrary terminology files, no ontology APIs
//! locutils seed -t hpo.csv -t mondo.tsv --ontology-api false
//!
//! # Carry on past terminologies that would orphan codes
//! locutils seed --on-orphan skip
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use locutils::aggregate::DuplicateCodePolicy;
use locutils::catalog::{Catalog, Organization};
use locutils::config::{self, Settings};
use locutils::seed::{OrphanPolicy, SeedOptions, SeedType, Seeder, TerminologySelection};
use locutils::sqlite_store::SqliteStore;
use locutils::{db, logging, sources};

/// Seed a locutus database with terminologies and ontology API metadata.
#[derive(Parser)]
#[command(name = "locutils", version)]
struct Cli {
    /// Path to a settings file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive; `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load terminologies and ontology API metadata.
    ///
    /// Without `-t`, the catalog sources for the chosen organization are
    /// loaded. With one or more `-t` files only those are loaded; `-t skip`
    /// loads no terminologies.
    Seed(SeedArgs),

    /// List catalog sources and whether they would be seeded.
    Catalog {
        /// Organization to evaluate the catalog for.
        #[arg(short, long, value_enum, default_value = "kf")]
        organization: Organization,
    },
}

#[derive(clap::Args)]
struct SeedArgs {
    /// Database URI. Falls back to `db.uri`, then `LOCUTUS_DB_URI`, then
    /// `DATABASE_URL`.
    #[arg(short = 'd', long)]
    db_uri: Option<String>,

    /// Which kinds of data to seed.
    #[arg(short, long, value_enum, default_value = "all")]
    seed_type: SeedType,

    /// Organization whose catalog sources are loaded.
    #[arg(short, long, value_enum, default_value = "kf")]
    organization: Organization,

    /// Terminology file or URL to load instead of the catalog defaults.
    /// Repeatable. `skip` (or `none`) loads no terminologies.
    #[arg(short = 't', long = "terminology")]
    terminologies: Vec<String>,

    /// Load ontology API metadata (`true`/`false`).
    #[arg(long)]
    ontology_api: Option<bool>,

    /// What to do when a terminology would orphan persisted codes.
    #[arg(long, value_enum)]
    on_orphan: Option<OrphanPolicy>,

    /// Handling of a code repeated within one terminology:
    /// `keep`, `last-wins`, or `reject`.
    #[arg(long)]
    duplicate_codes: Option<DuplicateCodePolicy>,

    /// Editor recorded as provenance for every write.
    #[arg(long)]
    editor: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::init_logging(&cli.log_level) {
        eprintln!("{:#}", err);
        std::process::exit(2);
    }

    if let Err(err) = run(cli).await {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = config::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Catalog { organization } => {
            let catalog = Catalog::from_settings(&settings)?;
            sources::list_sources(
                &catalog,
                organization,
                settings.terminologies.url_base.as_deref(),
            )?;
        }
        Commands::Seed(args) => {
            run_seed(&settings, args).await?;
        }
    }

    Ok(())
}

async fn run_seed(settings: &Settings, args: SeedArgs) -> anyhow::Result<()> {
    let uri = db::resolve_db_uri(args.db_uri.as_deref(), settings)?;

    let mut options = SeedOptions::from_settings(settings);
    options.seed_type = args.seed_type;
    options.organization = args.organization;
    options.terminologies = TerminologySelection::from_args(&args.terminologies);
    if let Some(enabled) = args.ontology_api {
        options.load_ontology_apis = enabled;
    }
    if let Some(policy) = args.on_orphan {
        options.on_orphan = policy;
    }
    if let Some(policy) = args.duplicate_codes {
        options.duplicate_codes = policy;
    }
    if let Some(editor) = args.editor {
        options.editor = editor;
    }

    let catalog = match options.terminologies {
        TerminologySelection::Defaults => Catalog::from_settings(settings)?,
        _ => Catalog::default(),
    };

    let store = SqliteStore::connect(&uri).await?;
    let seeder = Seeder::new(&store, catalog, options);
    let result = seeder.run().await;
    store.close().await;

    result?.print();
    Ok(())
}
