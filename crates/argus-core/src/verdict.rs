//! Fail-closed verdict contract. A pure function over `VerificationSummary`
//! with a fixed evaluation order — no stage may be reordered without
//! changing what "fail closed" means.

use crate::models::{Verdict, VerificationSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictDecision {
    pub verdict: Verdict,
    pub reason: String,
}

impl VerdictDecision {
    fn new(verdict: Verdict, reason: impl Into<String>) -> Self {
        Self {
            verdict,
            reason: reason.into(),
        }
    }
}

/// Evaluation order is the contract:
/// 1. runtime/tooling error -> ERROR
/// 2. unsupported constructs -> UNVERIFIED
/// 3. invalid assumption evidence -> UNVERIFIED
/// 4. failed semantic guard -> UNVERIFIED
/// 5. all obligations passed -> VERIFIED or FIXED
/// 6. otherwise -> VULNERABLE
pub fn compute_verdict(summary: &VerificationSummary) -> VerdictDecision {
    if summary.verification_error {
        return VerdictDecision::new(Verdict::ERROR, "Verification runtime/tooling error");
    }

    if !summary.unsupported_constructs.is_empty() {
        let mut sorted = summary.unsupported_constructs.clone();
        sorted.sort();
        return VerdictDecision::new(
            Verdict::UNVERIFIED,
            format!("Unsupported constructs encountered: {}", sorted.join(", ")),
        );
    }

    if !summary.assumptions_valid {
        return VerdictDecision::new(Verdict::UNVERIFIED, "Assumption evidence validation failed");
    }

    if !summary.semantic_guard_passed {
        return VerdictDecision::new(Verdict::UNVERIFIED, "Semantic guard checks failed");
    }

    if summary.all_obligations_passed() {
        return if summary.repaired {
            VerdictDecision::new(Verdict::FIXED, "All obligations passed after repair")
        } else {
            VerdictDecision::new(Verdict::VERIFIED, "All obligations passed")
        };
    }

    VerdictDecision::new(Verdict::VULNERABLE, "One or more canonical obligations failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Obligation, ObligationCategory, ObligationResult, Severity};

    fn base_summary() -> VerificationSummary {
        VerificationSummary {
            obligation_results: vec![ObligationResult {
                obligation: Obligation::new(
                    "f:non_negative_result",
                    "f(...) >= 0",
                    ObligationCategory::NonNegativity,
                    "desc",
                    Severity::Critical,
                ),
                verified: true,
                engine: "lean".to_string(),
                message: String::new(),
            }],
            assumptions_valid: true,
            unsupported_constructs: Vec::new(),
            semantic_guard_passed: true,
            verification_error: false,
            repaired: false,
        }
    }

    #[test]
    fn verified_when_everything_passes() {
        let decision = compute_verdict(&base_summary());
        assert_eq!(decision.verdict, Verdict::VERIFIED);
    }

    #[test]
    fn fixed_when_repaired_flag_set() {
        let mut summary = base_summary();
        summary.repaired = true;
        let decision = compute_verdict(&summary);
        assert_eq!(decision.verdict, Verdict::FIXED);
    }

    #[test]
    fn error_outranks_everything_else() {
        let mut summary = base_summary();
        summary.verification_error = true;
        summary.unsupported_constructs = vec!["await_expression".to_string()];
        summary.assumptions_valid = false;
        let decision = compute_verdict(&summary);
        assert_eq!(decision.verdict, Verdict::ERROR);
    }

    #[test]
    fn unsupported_outranks_assumptions_and_guard() {
        let mut summary = base_summary();
        summary.unsupported_constructs = vec!["class_definition".to_string()];
        summary.assumptions_valid = false;
        summary.semantic_guard_passed = false;
        let decision = compute_verdict(&summary);
        assert_eq!(decision.verdict, Verdict::UNVERIFIED);
        assert!(decision.reason.contains("class_definition"));
    }

    #[test]
    fn vulnerable_when_an_obligation_fails_cleanly() {
        let mut summary = base_summary();
        summary.obligation_results[0].verified = false;
        let decision = compute_verdict(&summary);
        assert_eq!(decision.verdict, Verdict::VULNERABLE);
    }

    #[test]
    fn empty_obligation_set_is_vulnerable_not_verified() {
        let mut summary = base_summary();
        summary.obligation_results.clear();
        let decision = compute_verdict(&summary);
        assert_eq!(decision.verdict, Verdict::VULNERABLE);
    }
}
