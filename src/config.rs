use anyhow::{Context, Result};
use locutils_core::aggregate::DuplicateCodePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::seed::OrphanPolicy;

/// Ontology API sheet loaded when no `ontology_api.csv_url` is configured.
pub const DEFAULT_ONTOLOGY_API_CSV: &str =
    "https://raw.githubusercontent.com/NIH-NCPI/locutus_utilities/main/data/input/ontology_api_metadata/ontology_api_metadata.csv";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub db: DbSettings,
    #[serde(default)]
    pub terminologies: TerminologySettings,
    #[serde(default)]
    pub ontology_api: OntologyApiSettings,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DbSettings {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TerminologySettings {
    /// Catalog of default terminology sources. The bundled catalog is used
    /// when unset.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Replaces every catalog entry's `url_prefix`.
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default = "default_editor")]
    pub editor: String,
    #[serde(default)]
    pub on_orphan: OrphanPolicy,
    #[serde(default)]
    pub duplicate_codes: DuplicateCodePolicy,
}

impl Default for TerminologySettings {
    fn default() -> Self {
        Self {
            catalog: None,
            url_base: None,
            editor: default_editor(),
            on_orphan: OrphanPolicy::default(),
            duplicate_codes: DuplicateCodePolicy::default(),
        }
    }
}

fn default_editor() -> String {
    "seed-script".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OntologyApiSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_csv_url")]
    pub csv_url: String,
}

impl Default for OntologyApiSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            csv_url: default_csv_url(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_csv_url() -> String {
    DEFAULT_ONTOLOGY_API_CSV.to_string()
}

/// Load settings from a TOML file, or defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
            parse_settings(&content)?
        }
        None => Settings::default(),
    };

    Ok(settings)
}

pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings =
        toml::from_str(content).with_context(|| "Failed to parse settings file")?;

    if settings.terminologies.editor.trim().is_empty() {
        anyhow::bail!("terminologies.editor must not be empty");
    }

    if settings.ontology_api.enabled && settings.ontology_api.csv_url.trim().is_empty() {
        anyhow::bail!("ontology_api.csv_url must be set when ontology_api.enabled is true");
    }

    if let Some(uri) = &settings.db.uri {
        if uri.trim().is_empty() {
            anyhow::bail!("db.uri must not be empty when present");
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_path() {
        let settings = load_settings(None).unwrap();
        assert!(settings.db.uri.is_none());
        assert_eq!(settings.terminologies.editor, "seed-script");
        assert_eq!(settings.terminologies.on_orphan, OrphanPolicy::Abort);
        assert_eq!(
            settings.terminologies.duplicate_codes,
            DuplicateCodePolicy::Keep
        );
        assert!(settings.ontology_api.enabled);
        assert_eq!(settings.ontology_api.csv_url, DEFAULT_ONTOLOGY_API_CSV);
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let settings = parse_settings("").unwrap();
        assert!(settings.terminologies.catalog.is_none());
        assert!(settings.ontology_api.enabled);
    }

    #[test]
    fn test_full_settings() {
        let settings = parse_settings(
            r#"
[db]
uri = "sqlite:data/locutus.sqlite"

[terminologies]
catalog = "support/custom.yaml"
url_base = "https://example.org/terms/"
editor = "curator"
on_orphan = "skip"
duplicate_codes = "last-wins"

[ontology_api]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(settings.db.uri.as_deref(), Some("sqlite:data/locutus.sqlite"));
        assert_eq!(
            settings.terminologies.catalog,
            Some(PathBuf::from("support/custom.yaml"))
        );
        assert_eq!(settings.terminologies.editor, "curator");
        assert_eq!(settings.terminologies.on_orphan, OrphanPolicy::Skip);
        assert_eq!(
            settings.terminologies.duplicate_codes,
            DuplicateCodePolicy::LastWins
        );
        assert!(!settings.ontology_api.enabled);
    }

    #[test]
    fn test_rejects_empty_editor() {
        let err = parse_settings("[terminologies]\neditor = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("editor"));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(parse_settings("[terminologies]\non_orphan = \"ignore\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_settings(Some(Path::new("/nonexistent/locutils.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }
}
