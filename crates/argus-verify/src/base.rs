//! Shared verifier driver contract.

use std::path::Path;

use argus_core::{Obligation, VerificationOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait VerifierDriver: Send + Sync {
    async fn verify(&self, proof_code: &str, obligations: &[Obligation]) -> VerificationOutcome;
}

/// Returns `true` inside a container, where subprocess-backed verification
/// is allowed to run unattended. Outside a container, verification is
/// refused unless the operator explicitly opts in.
pub fn running_in_container() -> bool {
    Path::new("/.dockerenv").exists()
}

pub fn local_verify_allowed() -> bool {
    std::env::var("ARGUS_ALLOW_LOCAL_VERIFY")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub(crate) fn all_failed(
    obligations: &[Obligation],
    engine: &str,
    message: &str,
) -> Vec<argus_core::ObligationResult> {
    obligations
        .iter()
        .map(|item| argus_core::ObligationResult {
            obligation: item.clone(),
            verified: false,
            engine: engine.to_string(),
            message: message.to_string(),
        })
        .collect()
}

pub(crate) fn docker_gate_outcome(engine: &str, obligations: &[Obligation]) -> VerificationOutcome {
    let message =
        "Docker-only verification is enabled (set ARGUS_ALLOW_LOCAL_VERIFY=true to override)";
    VerificationOutcome {
        engine: engine.to_string(),
        obligation_results: all_failed(obligations, engine, message),
        raw_output: String::new(),
        verification_error: true,
        error_message: message.to_string(),
    }
}
