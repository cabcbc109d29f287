//! Individual self-certification checks. Each gate is a pure function
//! (or a thin async wrapper around the translator) that answers one
//! narrow question about the pipeline's own soundness claims, never
//! about a specific file's verdict in isolation.

use argus_core::{AssumedInput, ObligationPolicy, Verdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub name: &'static str,
    pub passed: bool,
    pub details: String,
}

impl GateResult {
    pub fn ok(name: &'static str) -> Self {
        Self { name, passed: true, details: "ok".to_string() }
    }

    pub fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, passed: false, details: details.into() }
    }
}

/// Runs the Obligation Policy over the same source `runs` times and
/// checks every run produced an identical canonical hash. Catches a
/// policy that secretly depends on iteration order or wall-clock state.
pub fn obligation_determinism_gate(python_code: &str, policy: &ObligationPolicy, runs: usize) -> GateResult {
    let hashes: Vec<String> = (0..runs).map(|_| policy.derive(python_code).canonical_hash()).collect();
    let first = hashes.first().cloned().unwrap_or_default();
    let passed = hashes.iter().all(|h| h == &first);
    GateResult {
        name: "obligation-determinism",
        passed,
        details: format!("hashes={hashes:?}"),
    }
}

pub fn assumption_coverage_gate(assumptions: &[AssumedInput]) -> GateResult {
    let (ok, issues) = argus_core::validate_assumptions(assumptions);
    let details = if ok {
        "all assumptions evidenced".to_string()
    } else {
        issues.iter().map(|i| format!("{}:{}", i.property, i.reason)).collect::<Vec<_>>().join("; ")
    };
    GateResult { name: "assumption-evidence-coverage", passed: ok, details }
}

pub fn unsupported_fail_closed_gate(verdict: Verdict, unsupported_constructs: &[String]) -> GateResult {
    if unsupported_constructs.is_empty() {
        return GateResult::ok("unsupported-fail-closed");
    }
    let passed = verdict == Verdict::UNVERIFIED;
    GateResult {
        name: "unsupported-fail-closed",
        passed,
        details: format!("unsupported={unsupported_constructs:?}, verdict={}", verdict.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_gate_passes_for_pure_policy() {
        let policy = ObligationPolicy::new();
        let gate = obligation_determinism_gate("def withdraw(balance, amount):\n    return balance - amount\n", &policy, 3);
        assert!(gate.passed);
    }

    #[test]
    fn coverage_gate_fails_on_missing_justification() {
        let assumption = AssumedInput::new("x", "desc", "", "api_contract", "ref", "ev-1", argus_core::Severity::High);
        let gate = assumption_coverage_gate(&[assumption]);
        assert!(!gate.passed);
    }

    #[test]
    fn unsupported_fail_closed_requires_unverified_verdict() {
        let gate = unsupported_fail_closed_gate(Verdict::VERIFIED, &["async_function".to_string()]);
        assert!(!gate.passed);
        let gate = unsupported_fail_closed_gate(Verdict::UNVERIFIED, &["async_function".to_string()]);
        assert!(gate.passed);
    }
}
