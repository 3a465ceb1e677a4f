//! Row reader.
//!
//! Turns a source reference (local path or `http(s)://` URL) into ordered
//! [`Row`]s. Remote payloads are fetched in full before parsing; nothing is
//! streamed. The reader for a source is picked from its extension:
//!
//! | Extension | Format |
//! |-----------|--------|
//! | `.csv` | comma-delimited, header row |
//! | `.tsv`, `.txt` | tab-delimited, header row |
//! | `.yaml`, `.yml` | sequence of mappings |
//! | `.json` | array of objects |
//!
//! Remote sources without a known extension are read as CSV. Local sources
//! with any other extension are rejected before they are opened.
//!
//! Delimited rows shorter than the header get empty trailing fields.

use std::fmt;
use std::path::{Path, PathBuf};

use locutils_core::models::Row;
use url::Url;

use crate::error::SeedError;

/// Where a source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Local(PathBuf),
    Remote(Url),
}

impl SourceRef {
    /// `http://` and `https://` references are remote; everything else is a
    /// filesystem path.
    pub fn parse(reference: &str) -> Result<Self, SeedError> {
        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("https:") || lower.starts_with("http:") {
            let url = Url::parse(reference).map_err(|e| SeedError::unavailable(reference, e))?;
            Ok(Self::Remote(url))
        } else {
            Ok(Self::Local(PathBuf::from(reference)))
        }
    }

    fn extension(&self) -> Option<String> {
        let name = match self {
            Self::Local(path) => path.file_name()?.to_string_lossy().to_string(),
            Self::Remote(url) => url.path_segments()?.last()?.to_string(),
        };
        Path::new(&name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Supported tabular formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Yaml,
    Json,
}

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "txt" => Some(Self::Tsv),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn detect(source: &SourceRef) -> Result<Self, SeedError> {
        let extension = source.extension();
        match (source, extension.as_deref().and_then(Self::from_extension)) {
            (_, Some(format)) => Ok(format),
            (SourceRef::Remote(_), None) => Ok(Self::Csv),
            (SourceRef::Local(_), None) => Err(SeedError::UnsupportedFormat {
                source_ref: source.to_string(),
                extension: extension.unwrap_or_default(),
            }),
        }
    }
}

/// Reads rows from local files and remote URLs.
///
/// Holds one HTTP client for the life of the run.
#[derive(Debug, Clone, Default)]
pub struct RowReader {
    client: reqwest::Client,
}

impl RowReader {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn read_rows(&self, source: &SourceRef) -> Result<Vec<Row>, SeedError> {
        let format = SourceFormat::detect(source)?;
        let text = self.fetch_text(source).await?;
        let rows = parse_rows(&text, format, &source.to_string())?;
        tracing::debug!(source = %source, rows = rows.len(), "read source");
        Ok(rows)
    }

    /// Full source content decoded as UTF-8.
    async fn fetch_text(&self, source: &SourceRef) -> Result<String, SeedError> {
        let bytes = match source {
            SourceRef::Local(path) => {
                std::fs::read(path).map_err(|e| SeedError::unavailable(source, e))?
            }
            SourceRef::Remote(url) => {
                tracing::debug!(%url, "fetching remote source");
                let resp = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| SeedError::unavailable(source, e))?;
                if !resp.status().is_success() {
                    return Err(SeedError::unavailable(
                        source,
                        format!("HTTP {}", resp.status()),
                    ));
                }
                resp.bytes()
                    .await
                    .map_err(|e| SeedError::unavailable(source, e))?
                    .to_vec()
            }
        };

        String::from_utf8(bytes).map_err(|e| SeedError::malformed(source, e))
    }
}

/// Parse already-fetched text into rows.
pub fn parse_rows(text: &str, format: SourceFormat, label: &str) -> Result<Vec<Row>, SeedError> {
    match format {
        SourceFormat::Csv => parse_delimited(text, b',', label),
        SourceFormat::Tsv => parse_delimited(text, b'\t', label),
        SourceFormat::Yaml => parse_yaml(text, label),
        SourceFormat::Json => parse_json(text, label),
    }
}

fn parse_delimited(text: &str, delimiter: u8, label: &str) -> Result<Vec<Row>, SeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SeedError::malformed(label, e))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SeedError::malformed(label, e))?;
        // Short rows read as empty trailing fields; extra fields are dropped
        rows.push(Row::from_pairs(
            headers
                .iter()
                .map(str::trim)
                .zip(record.iter().chain(std::iter::repeat(""))),
        ));
    }

    Ok(rows)
}

fn parse_yaml(text: &str, label: &str) -> Result<Vec<Row>, SeedError> {
    let items: Vec<serde_yaml::Mapping> =
        serde_yaml::from_str(text).map_err(|e| SeedError::malformed(label, e))?;

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let mut row = Row::new();
        for (key, value) in item {
            let key = yaml_scalar(key)
                .ok_or_else(|| SeedError::malformed(label, format!("row {}: non-scalar key", i + 1)))?;
            let value = yaml_scalar(value).ok_or_else(|| {
                SeedError::malformed(label, format!("row {}: field '{}' is not a scalar", i + 1, key))
            })?;
            row.push(key, value);
        }
        rows.push(row);
    }

    Ok(rows)
}

fn yaml_scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s),
        _ => None,
    }
}

/// Object keys come back sorted; lookups are by name so order is moot.
fn parse_json(text: &str, label: &str) -> Result<Vec<Row>, SeedError> {
    let items: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(text).map_err(|e| SeedError::malformed(label, e))?;

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let mut row = Row::new();
        for (key, value) in item {
            let value = match value {
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => s,
                _ => {
                    return Err(SeedError::malformed(
                        label,
                        format!("row {}: field '{}' is not a scalar", i + 1, key),
                    ))
                }
            };
            row.push(key, value);
        }
        rows.push(row);
    }

    Ok(rows)
}
