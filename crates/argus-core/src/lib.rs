//! Canonical data model, deterministic obligation policy, invariant
//! discovery, assumption evidence validation, and the verdict contract.
//! Every other crate in the workspace depends on this one; this crate
//! depends on nothing Argus-specific.

pub mod discovery;
pub mod engine;
pub mod errors;
pub mod evidence;
pub mod models;
pub mod policy;
pub mod verdict;

pub use discovery::{DiscoveryConfig, DiscoveryResult, InvariantDiscovery};
pub use engine::{select_engine, Engine, EngineSelection};
pub use errors::{ArgusError, ArgusErrorKind};
pub use evidence::{validate_assumptions, EvidenceIssue};
pub use models::{
    AssumedInput, Obligation, ObligationCategory, ObligationResult, ProofLanguage, Severity,
    SourceType, TranslationOutcome, TranslatorKind, Verdict, VerificationOutcome,
    VerificationSummary,
};
pub use policy::{ObligationPolicy, ObligationPolicyResult};
pub use verdict::{compute_verdict, VerdictDecision};
