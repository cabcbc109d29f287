//! Canonical data model shared by every stage of the pipeline.
//!
//! Every type here is either immutable after construction (`Obligation`,
//! `AssumedInput`) or a plain aggregate built once by the orchestrator
//! (`VerificationSummary`). Nothing in this module reaches out to the
//! filesystem or network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered most-severe-first so a `Vec<Severity>` sorts deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::High
    }
}

/// The only terminal classifications a file can receive. There is
/// intentionally no "in progress" or "pending" member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    VERIFIED,
    FIXED,
    VULNERABLE,
    UNVERIFIED,
    ERROR,
}

impl Verdict {
    pub fn is_passing(&self) -> bool {
        matches!(self, Verdict::VERIFIED | Verdict::FIXED)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::VERIFIED => "VERIFIED",
            Verdict::FIXED => "FIXED",
            Verdict::VULNERABLE => "VULNERABLE",
            Verdict::UNVERIFIED => "UNVERIFIED",
            Verdict::ERROR => "ERROR",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Categories the Obligation Policy is defined over. Every obligation id
/// is stable for a given (function name, category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationCategory {
    NonNegativity,
    Bounds,
    Uniqueness,
    LoopInvariant,
    StateTransition,
}

impl ObligationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ObligationCategory::NonNegativity => "non_negativity",
            ObligationCategory::Bounds => "bounds",
            ObligationCategory::Uniqueness => "uniqueness",
            ObligationCategory::LoopInvariant => "loop_invariant",
            ObligationCategory::StateTransition => "state_transition",
        }
    }
}

/// A policy-derived, canonically hashed safety property the verifier must
/// discharge. Immutable once constructed; the Obligation Policy is the
/// only producer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub property: String,
    pub category: ObligationCategory,
    pub description: String,
    pub severity: Severity,
    #[serde(default = "default_obligation_source")]
    pub source: String,
}

fn default_obligation_source() -> String {
    "policy".to_string()
}

impl Obligation {
    pub fn new(
        id: impl Into<String>,
        property: impl Into<String>,
        category: ObligationCategory,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            property: property.into(),
            category,
            description: description.into(),
            severity,
            source: default_obligation_source(),
        }
    }

    /// Deterministic ordered-map projection used by the canonical hash.
    /// `BTreeMap` guarantees key order independent of insertion order.
    pub fn canonical_fields(&self) -> BTreeMap<&'static str, serde_json::Value> {
        let mut map = BTreeMap::new();
        map.insert("id", serde_json::Value::String(self.id.clone()));
        map.insert("property", serde_json::Value::String(self.property.clone()));
        map.insert(
            "category",
            serde_json::Value::String(self.category.as_str().to_string()),
        );
        map.insert(
            "description",
            serde_json::Value::String(self.description.clone()),
        );
        map.insert(
            "severity",
            serde_json::to_value(self.severity).expect("severity always serializes"),
        );
        map.insert("source", serde_json::Value::String(self.source.clone()));
        map
    }
}

/// Allowed provenance for an `AssumedInput`. The LLM proposer defaults to
/// `Policy` when it returns an unrecognized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    ApiSchema,
    DbConstraint,
    Validator,
    Policy,
    RuntimeGuard,
}

impl SourceType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "api_schema" => Some(SourceType::ApiSchema),
            "db_constraint" => Some(SourceType::DbConstraint),
            "validator" => Some(SourceType::Validator),
            "policy" => Some(SourceType::Policy),
            "runtime_guard" => Some(SourceType::RuntimeGuard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::ApiSchema => "api_schema",
            SourceType::DbConstraint => "db_constraint",
            SourceType::Validator => "validator",
            SourceType::Policy => "policy",
            SourceType::RuntimeGuard => "runtime_guard",
        }
    }
}

/// A precondition proposed by the LLM proposer. Never consulted by the
/// verdict contract directly; it must first survive evidence validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumedInput {
    pub property: String,
    pub description: String,
    pub justification: String,
    pub source_type: String,
    pub source_ref: String,
    pub evidence_id: String,
    pub severity: Severity,
}

impl AssumedInput {
    pub fn new(
        property: impl Into<String>,
        description: impl Into<String>,
        justification: impl Into<String>,
        source_type: impl Into<String>,
        source_ref: impl Into<String>,
        evidence_id: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            property: property.into(),
            description: description.into(),
            justification: justification.into(),
            source_type: source_type.into(),
            source_ref: source_ref.into(),
            evidence_id: evidence_id.into(),
            severity,
        }
    }
}

/// One obligation judged against one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationResult {
    pub obligation: Obligation,
    pub verified: bool,
    pub engine: String,
    #[serde(default)]
    pub message: String,
}

/// Everything the Verdict Contract needs, and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub obligation_results: Vec<ObligationResult>,
    pub assumptions_valid: bool,
    pub unsupported_constructs: Vec<String>,
    pub semantic_guard_passed: bool,
    #[serde(default)]
    pub verification_error: bool,
    #[serde(default)]
    pub repaired: bool,
}

impl VerificationSummary {
    /// Non-empty results AND every one of them verified. An empty result
    /// set never counts as "passed" — that would let a file with zero
    /// obligations sail through as VERIFIED.
    pub fn all_obligations_passed(&self) -> bool {
        !self.obligation_results.is_empty() && self.obligation_results.iter().all(|r| r.verified)
    }
}

/// Proof language a translator emits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofLanguage {
    Lean,
    Dafny,
}

impl ProofLanguage {
    pub fn as_str(self) -> &'static str {
        match self {
            ProofLanguage::Lean => "lean",
            ProofLanguage::Dafny => "dafny",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            ProofLanguage::Lean => "lean",
            ProofLanguage::Dafny => "dfy",
        }
    }
}

/// Which translator produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorKind {
    Ast,
    Llm,
    Dafny,
}

/// Result of attempting to translate source into a proof artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub success: bool,
    pub language: ProofLanguage,
    pub code: String,
    pub translator: TranslatorKind,
    #[serde(default)]
    pub used_llm: bool,
    #[serde(default)]
    pub error: String,
}

/// Result of invoking a verifier driver over one artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub engine: String,
    pub obligation_results: Vec<ObligationResult>,
    pub raw_output: String,
    #[serde(default)]
    pub verification_error: bool,
    #[serde(default)]
    pub error_message: String,
}

impl VerificationOutcome {
    pub fn all_passed(&self) -> bool {
        !self.obligation_results.is_empty() && self.obligation_results.iter().all(|r| r.verified)
    }
}
