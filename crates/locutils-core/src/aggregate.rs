//! Terminology aggregation.
//!
//! Groups flat source rows into [`Terminology`] records keyed by
//! `terminology_id`. The first row seen for an id supplies the header fields
//! (name, description, system URL, resource type); later rows only contribute
//! codes. Single pass, O(rows).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Code, Row, Terminology};

/// Columns every terminology row must carry.
pub const TERMINOLOGY_COLUMNS: [&str; 8] = [
    "terminology_id",
    "terminology_description",
    "terminology_name",
    "system",
    "terminology_resource_type",
    "code",
    "display",
    "description",
];

/// What to do when a code value repeats within one terminology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateCodePolicy {
    /// Append every row, duplicates included.
    #[default]
    Keep,
    /// Overwrite the earlier entry in place with the later row.
    LastWins,
    /// Fail the aggregation.
    Reject,
}

impl FromStr for DuplicateCodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Self::Keep),
            "last-wins" => Ok(Self::LastWins),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown duplicate code policy '{}': expected keep, last-wins, or reject",
                other
            )),
        }
    }
}

impl fmt::Display for DuplicateCodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Keep => "keep",
            Self::LastWins => "last-wins",
            Self::Reject => "reject",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("row {row}: missing required column '{column}'")]
    MissingColumn { row: usize, column: &'static str },

    #[error("row {row}: code '{code}' appears more than once in terminology '{terminology_id}'")]
    DuplicateCode {
        row: usize,
        terminology_id: String,
        code: String,
    },
}

/// Terminologies keyed by id, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TerminologySet {
    entries: Vec<Terminology>,
    index: HashMap<String, usize>,
    /// Per entry: code value → position in `codes`. Only filled when the
    /// duplicate policy needs it.
    code_positions: Vec<HashMap<String, usize>>,
}

impl TerminologySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Terminology> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|t| t.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Terminology> {
        self.entries.iter()
    }

    fn get_or_insert_with(&mut self, id: &str, make: impl FnOnce() -> Terminology) -> usize {
        match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.entries.push(make());
                self.code_positions.push(HashMap::new());
                self.index.insert(id.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        }
    }

    /// Add `code` to entry `idx` under `policy`; `Err` carries the rejected
    /// code value.
    fn add_code(
        &mut self,
        idx: usize,
        code: Code,
        policy: DuplicateCodePolicy,
    ) -> Result<(), String> {
        let codes = &mut self.entries[idx].codes;
        if policy == DuplicateCodePolicy::Keep {
            codes.push(code);
            return Ok(());
        }

        let positions = &mut self.code_positions[idx];
        match positions.get(&code.code) {
            Some(&pos) if policy == DuplicateCodePolicy::LastWins => codes[pos] = code,
            Some(_) => return Err(code.code),
            None => {
                positions.insert(code.code.clone(), codes.len());
                codes.push(code);
            }
        }
        Ok(())
    }
}

impl IntoIterator for TerminologySet {
    type Item = Terminology;
    type IntoIter = std::vec::IntoIter<Terminology>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Look up a required column; `row` is 1-based for error messages.
pub(crate) fn required<'r>(
    row: &'r Row,
    column: &'static str,
    row_number: usize,
) -> Result<&'r str, AggregateError> {
    row.get(column).ok_or(AggregateError::MissingColumn {
        row: row_number,
        column,
    })
}

/// Group rows into terminologies.
///
/// Every row contributes exactly one code to the terminology named by its
/// `terminology_id`, except under [`DuplicateCodePolicy::LastWins`] where a
/// repeated code replaces the earlier entry at its original position.
pub fn aggregate_terminologies<I>(
    rows: I,
    duplicates: DuplicateCodePolicy,
) -> Result<TerminologySet, AggregateError>
where
    I: IntoIterator<Item = Row>,
{
    let mut set = TerminologySet::new();

    for (i, row) in rows.into_iter().enumerate() {
        let row_number = i + 1;
        for column in TERMINOLOGY_COLUMNS {
            required(&row, column, row_number)?;
        }

        let terminology_id = required(&row, "terminology_id", row_number)?;
        let system = required(&row, "system", row_number)?;

        let idx = set.get_or_insert_with(terminology_id, || Terminology {
            id: terminology_id.to_string(),
            description: row
                .get("terminology_description")
                .unwrap_or_default()
                .to_string(),
            name: row.get("terminology_name").unwrap_or_default().to_string(),
            url: system.to_string(),
            resource_type: row
                .get("terminology_resource_type")
                .unwrap_or_default()
                .to_string(),
            codes: Vec::new(),
        });

        let code = Code {
            code: required(&row, "code", row_number)?.to_string(),
            display: required(&row, "display", row_number)?.to_string(),
            description: required(&row, "description", row_number)?.to_string(),
            system: system.to_string(),
        };

        set.add_code(idx, code, duplicates)
            .map_err(|code| AggregateError::DuplicateCode {
                row: row_number,
                terminology_id: terminology_id.to_string(),
                code,
            })?;
    }

    Ok(set)
}
