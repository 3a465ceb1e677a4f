//! Catalog of default terminology sources.
//!
//! The catalog is a YAML mapping from source name to its settings:
//!
//! ```yaml
//! hpo:
//!   organizations: [all]
//!   seed_db: true
//!   normalized_data:
//!     url_prefix: https://example.org/terminologies/
//!     name: [hpo.csv]
//! ```
//!
//! A copy ships inside the binary (`support/terminologies.yaml`); a settings
//! file may point at a different one. Entries are kept in file order.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::Settings;

const BUNDLED_CATALOG: &str = include_str!("../support/terminologies.yaml");

/// Organization a seed run is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Organization {
    Kf,
    Include,
    Anvil,
}

impl Organization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kf => "kf",
            Self::Include => "include",
            Self::Anvil => "anvil",
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub seed_db: bool,
    #[serde(default)]
    pub normalized_data: Option<NormalizedData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizedData {
    pub url_prefix: String,
    #[serde(default)]
    pub name: Vec<String>,
}

impl CatalogEntry {
    /// Tagged `all` or tagged with `org` (case-insensitive).
    pub fn applies_to(&self, org: Organization) -> bool {
        self.organizations
            .iter()
            .any(|o| o.eq_ignore_ascii_case("all") || o.eq_ignore_ascii_case(org.as_str()))
    }

    pub fn should_seed(&self, org: Organization) -> bool {
        self.seed_db && self.applies_to(org)
    }

    /// File references for this entry, each `name` prefixed with the entry's
    /// `url_prefix` or with `url_base` when given.
    pub fn file_refs(&self, url_base: Option<&str>) -> Vec<String> {
        let Some(data) = &self.normalized_data else {
            return Vec::new();
        };
        let prefix = url_base.unwrap_or(&data.url_prefix);
        data.name
            .iter()
            .map(|name| join_prefix(prefix, name))
            .collect()
    }
}

/// Join a file name onto a URL or directory prefix.
pub fn join_prefix(prefix: &str, name: &str) -> String {
    let lower = prefix.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    } else {
        Path::new(prefix).join(name).to_string_lossy().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<(String, CatalogEntry)>,
}

impl Catalog {
    pub fn bundled() -> Result<Self> {
        Self::from_yaml(BUNDLED_CATALOG).with_context(|| "Failed to parse bundled catalog")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))
    }

    /// The configured catalog, or the bundled one.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match &settings.terminologies.catalog {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(content)?;
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(s) => s,
                other => anyhow::bail!("catalog keys must be strings, found {:?}", other),
            };
            let entry: CatalogEntry = serde_yaml::from_value(value)
                .with_context(|| format!("Invalid catalog entry '{}'", name))?;
            entries.push((name, entry));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
zeta:
  organizations: [all]
  seed_db: true
  normalized_data:
    url_prefix: https://example.org/terms/
    name: [zeta.csv, zeta_extra.csv]
kf_only:
  organizations: [KF]
  seed_db: true
  normalized_data:
    url_prefix: /data/terms
    name: [kf.csv]
anvil_off:
  organizations: [anvil]
  seed_db: false
  normalized_data:
    url_prefix: /data/terms
    name: [anvil.csv]
no_data:
  organizations: [all]
  seed_db: true
"#;

    #[test]
    fn test_entries_keep_file_order() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let names: Vec<&str> = catalog.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "kf_only", "anvil_off", "no_data"]);
    }

    #[test]
    fn test_organization_filter() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let seeded = |org| {
            catalog
                .entries()
                .filter(|(_, e)| e.should_seed(org))
                .map(|(n, _)| n.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(seeded(Organization::Kf), vec!["zeta", "kf_only", "no_data"]);
        assert_eq!(seeded(Organization::Include), vec!["zeta", "no_data"]);
        assert_eq!(seeded(Organization::Anvil), vec!["zeta", "no_data"]);
    }

    #[test]
    fn test_file_refs() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let entries: Vec<_> = catalog.entries().collect();
        assert_eq!(
            entries[0].1.file_refs(None),
            vec![
                "https://example.org/terms/zeta.csv",
                "https://example.org/terms/zeta_extra.csv"
            ]
        );
        assert_eq!(entries[1].1.file_refs(None), vec!["/data/terms/kf.csv"]);
        assert_eq!(
            entries[1].1.file_refs(Some("https://mirror.example.org/t")),
            vec!["https://mirror.example.org/t/kf.csv"]
        );
        assert!(entries[3].1.file_refs(None).is_empty());
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog
            .entries()
            .any(|(_, e)| e.should_seed(Organization::Kf)));
    }

    #[test]
    fn test_invalid_entry_named() {
        let err = Catalog::from_yaml("broken:\n  seed_db: maybe\n").unwrap_err();
        assert!(format!("{:#}", err).contains("broken"));
    }
}
