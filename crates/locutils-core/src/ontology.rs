//! Ontology API aggregation.
//!
//! Rows of the ontology API sheet are grouped by `api_id` into
//! [`OntologyApi`] records. Each record carries the complete `ontologies`
//! mapping for its API; stores replace that mapping wholesale.

use std::collections::{BTreeMap, HashMap};

use crate::aggregate::{required, AggregateError};
use crate::models::{Ontology, OntologyApi, Row};

/// Columns every ontology API row must carry.
pub const ONTOLOGY_COLUMNS: [&str; 5] = ["api_id", "curie", "ontology_title", "system", "version"];

/// Display name and base URL of a known ontology API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiInfo {
    pub api_name: &'static str,
    pub api_url: &'static str,
}

/// Fixed lookup table of the ontology APIs locutus knows about.
pub fn known_api(api_id: &str) -> Option<ApiInfo> {
    let info = match api_id {
        "ols" => ApiInfo {
            api_name: "Ontology Lookup Service",
            api_url: "https://www.ebi.ac.uk/ols4/api/",
        },
        "umls" => ApiInfo {
            api_name: "Unified Medical Language System",
            api_url: "https://uts-ws.nlm.nih.gov/rest/",
        },
        "monarch" => ApiInfo {
            api_name: "Monarch Initiative",
            api_url: "https://api-v3.monarchinitiative.org/v3/api/",
        },
        "loinc" => ApiInfo {
            api_name: "LOINC",
            api_url: "https://loinc.regenstrief.org/searchapi/",
        },
        _ => return None,
    };
    Some(info)
}

/// Spreadsheet-style truthiness for the `short_list` column.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1" | "x"
    )
}

/// Group ontology rows by `api_id`, in first-seen order.
///
/// `ontology_code` defaults to the lowercased curie and `short_list` to
/// false when the columns are absent. APIs missing from [`known_api`] use
/// their id as the name and an empty URL. A curie repeated within one API
/// keeps the last row.
pub fn aggregate_ontology_apis<I>(rows: I) -> Result<Vec<OntologyApi>, AggregateError>
where
    I: IntoIterator<Item = Row>,
{
    let mut apis: Vec<OntologyApi> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.into_iter().enumerate() {
        let row_number = i + 1;
        for column in ONTOLOGY_COLUMNS {
            required(&row, column, row_number)?;
        }

        let api_id = required(&row, "api_id", row_number)?.trim();
        let curie = required(&row, "curie", row_number)?.trim();

        let idx = match index.get(api_id) {
            Some(&idx) => idx,
            None => {
                let (api_name, api_url) = match known_api(api_id) {
                    Some(info) => (info.api_name.to_string(), info.api_url.to_string()),
                    None => (api_id.to_string(), String::new()),
                };
                apis.push(OntologyApi {
                    api_id: api_id.to_string(),
                    api_name,
                    api_url,
                    ontologies: BTreeMap::new(),
                });
                index.insert(api_id.to_string(), apis.len() - 1);
                apis.len() - 1
            }
        };

        let ontology_code = match row.get("ontology_code").map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => curie.to_ascii_lowercase(),
        };

        apis[idx].ontologies.insert(
            curie.to_string(),
            Ontology {
                version: required(&row, "version", row_number)?.to_string(),
                ontology_title: required(&row, "ontology_title", row_number)?.to_string(),
                system: required(&row, "system", row_number)?.to_string(),
                ontology_code,
                short_list: row.get("short_list").map(parse_flag).unwrap_or(false),
            },
        );
    }

    Ok(apis)
}
