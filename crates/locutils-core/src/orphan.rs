//! Orphaned coding detection.
//!
//! Replacing a persisted terminology with a new version silently drops any
//! code the new version lacks. [`check_orphans`] computes that set before the
//! write so the caller can refuse the replacement.

use thiserror::Error;

use crate::models::Terminology;

/// Codes that a replacement would drop from a persisted terminology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Terminology, {terminology_id}, exists in the database and has the following Codings \
     that will be orphaned (not replaced) by this operation. {}",
    .codes.join(",")
)]
pub struct OrphanedCodings {
    pub terminology_id: String,
    /// Sorted.
    pub codes: Vec<String>,
}

/// Outcome of comparing an incoming terminology with its persisted version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrphanCheck {
    /// Nothing persisted under this id.
    New,
    /// Every persisted code is present in the incoming version.
    Clean,
    Orphaned(OrphanedCodings),
}

pub fn check_orphans(incoming: &Terminology, persisted: Option<&Terminology>) -> OrphanCheck {
    let Some(persisted) = persisted else {
        return OrphanCheck::New;
    };

    let incoming_codes = incoming.code_values();
    let orphans: Vec<String> = persisted
        .code_values()
        .difference(&incoming_codes)
        .map(|c| c.to_string())
        .collect();

    if orphans.is_empty() {
        OrphanCheck::Clean
    } else {
        OrphanCheck::Orphaned(OrphanedCodings {
            terminology_id: incoming.id.clone(),
            codes: orphans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Code;

    fn terminology(codes: &[&str]) -> Terminology {
        Terminology {
            id: "HP".to_string(),
            name: "Human Phenotype Ontology".to_string(),
            description: String::new(),
            url: "http://purl.obolibrary.org/obo/hp.owl".to_string(),
            resource_type: "Terminology".to_string(),
            codes: codes
                .iter()
                .map(|c| Code {
                    code: c.to_string(),
                    display: String::new(),
                    description: String::new(),
                    system: "http://purl.obolibrary.org/obo/hp.owl".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_dropped_code_is_orphaned() {
        let persisted = terminology(&["A", "B", "C"]);
        let incoming = terminology(&["A", "B"]);
        let check = check_orphans(&incoming, Some(&persisted));
        assert_eq!(
            check,
            OrphanCheck::Orphaned(OrphanedCodings {
                terminology_id: "HP".to_string(),
                codes: vec!["C".to_string()],
            })
        );
    }

    #[test]
    fn test_superset_is_clean() {
        let persisted = terminology(&["A", "B"]);
        let incoming = terminology(&["A", "B", "C"]);
        assert_eq!(check_orphans(&incoming, Some(&persisted)), OrphanCheck::Clean);
    }

    #[test]
    fn test_identical_is_clean() {
        let persisted = terminology(&["A", "B"]);
        assert_eq!(check_orphans(&persisted, Some(&persisted)), OrphanCheck::Clean);
    }

    #[test]
    fn test_nothing_persisted_skips_check() {
        let incoming = terminology(&[]);
        assert_eq!(check_orphans(&incoming, None), OrphanCheck::New);
    }

    #[test]
    fn test_message_lists_codes_sorted() {
        let persisted = terminology(&["Z", "A", "M", "B"]);
        let incoming = terminology(&["B"]);
        let OrphanCheck::Orphaned(orphans) = check_orphans(&incoming, Some(&persisted)) else {
            panic!("expected orphans");
        };
        assert_eq!(orphans.codes, vec!["A", "M", "Z"]);
        let msg = orphans.to_string();
        assert!(msg.starts_with("Terminology, HP, exists in the database"));
        assert!(msg.ends_with("operation. A,M,Z"));
    }
}
