//! Assumption evidence validation: every LLM-proposed precondition must
//! carry a traceable justification before the verdict contract is allowed
//! to treat it as load-bearing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::AssumedInput;

const ALLOWED_SOURCE_TYPES: &[&str] =
    &["api_schema", "db_constraint", "validator", "policy", "runtime_guard"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceIssue {
    pub property: String,
    pub reason: String,
}

impl EvidenceIssue {
    fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// Runs every assumption through the same checks regardless of order, so
/// the `(valid, issues)` pair depends only on the input set.
pub fn validate_assumptions(assumptions: &[AssumedInput]) -> (bool, Vec<EvidenceIssue>) {
    let mut issues = Vec::new();
    let mut seen_properties: BTreeSet<String> = BTreeSet::new();

    for assumption in assumptions {
        let prop = assumption.property.trim();
        if prop.is_empty() {
            issues.push(EvidenceIssue::new("<empty>", "Missing property"));
            continue;
        }

        if seen_properties.contains(prop) {
            issues.push(EvidenceIssue::new(prop, "Duplicate assumption property"));
        }
        seen_properties.insert(prop.to_string());

        if !ALLOWED_SOURCE_TYPES.contains(&assumption.source_type.as_str()) {
            issues.push(EvidenceIssue::new(
                prop,
                format!("Unsupported source_type '{}'", assumption.source_type),
            ));
        }

        if assumption.justification.trim().is_empty() {
            issues.push(EvidenceIssue::new(prop, "Missing justification"));
        }
        if assumption.source_ref.trim().is_empty() {
            issues.push(EvidenceIssue::new(prop, "Missing source_ref"));
        }
        if assumption.evidence_id.trim().is_empty() {
            issues.push(EvidenceIssue::new(prop, "Missing evidence_id"));
        }
    }

    (issues.is_empty(), issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn valid_assumption(property: &str) -> AssumedInput {
        AssumedInput::new(
            property,
            "description",
            "validated upstream by the request schema",
            "api_schema",
            "schemas/request.json#/properties/amount",
            "ev-001",
            Severity::Medium,
        )
    }

    #[test]
    fn empty_set_is_valid() {
        let (valid, issues) = validate_assumptions(&[]);
        assert!(valid);
        assert!(issues.is_empty());
    }

    #[test]
    fn well_formed_assumption_passes() {
        let (valid, issues) = validate_assumptions(&[valid_assumption("amount")]);
        assert!(valid);
        assert!(issues.is_empty());
    }

    #[test]
    fn duplicate_property_is_flagged() {
        let (valid, issues) =
            validate_assumptions(&[valid_assumption("amount"), valid_assumption("amount")]);
        assert!(!valid);
        assert!(issues
            .iter()
            .any(|i| i.reason == "Duplicate assumption property"));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let broken = AssumedInput::new("x", "d", "", "unknown_source", "", "", Severity::Low);
        let (valid, issues) = validate_assumptions(&[broken]);
        assert!(!valid);
        assert_eq!(issues.len(), 4);
    }
}
