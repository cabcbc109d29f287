//! Mutation testing: apply a small, fixed set of semantics-changing edits
//! to a source file and check that evaluating the pipeline's own verdict
//! logic against each mutant reliably flags it. A verification system
//! that can't distinguish a mutated `>=` from the original isn't proving
//! anything.

use crate::gates::GateResult;
use argus_core::Verdict;
use std::future::Future;

const REPLACEMENTS: &[(&str, &str)] = &[
    (">=", ">"),
    ("<=", "<"),
    ("==", "!="),
    ("return balance", "return balance - amount"),
    ("if ", "if not "),
];

pub fn generate_simple_mutations(code: &str) -> Vec<String> {
    REPLACEMENTS
        .iter()
        .filter(|(needle, _)| code.contains(needle))
        .map(|(needle, replacement)| code.replacen(needle, replacement, 1))
        .collect()
}

pub async fn mutation_kill_rate_gate<F, Fut>(
    original_code: &str,
    evaluate_mutation: F,
    minimum_kill_rate: f64,
) -> GateResult
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Verdict>,
{
    let mutations = generate_simple_mutations(original_code);
    if mutations.is_empty() {
        return GateResult::fail("mutation-kill-rate", "no mutations generated");
    }

    let mut killed = 0usize;
    for mutated in &mutations {
        let verdict = evaluate_mutation(mutated.clone()).await;
        if matches!(verdict, Verdict::VULNERABLE | Verdict::UNVERIFIED | Verdict::ERROR) {
            killed += 1;
        }
    }

    let rate = killed as f64 / mutations.len() as f64;
    GateResult {
        name: "mutation-kill-rate",
        passed: rate >= minimum_kill_rate,
        details: format!("killed={killed}/{} rate={rate:.3}", mutations.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_one_mutation_per_matching_pattern() {
        let code = "def withdraw(balance, amount):\n    if balance >= amount:\n        return balance - amount\n    return balance\n";
        let mutations = generate_simple_mutations(code);
        assert!(mutations.len() >= 2);
        assert!(mutations.iter().any(|m| m.contains("balance > amount")));
    }

    #[tokio::test]
    async fn gate_passes_when_every_mutation_is_killed() {
        let code = "def withdraw(balance, amount):\n    if balance >= amount:\n        return balance - amount\n    return balance\n";
        let gate = mutation_kill_rate_gate(code, |_mutated| async { Verdict::VULNERABLE }, 0.95).await;
        assert!(gate.passed);
    }

    #[tokio::test]
    async fn gate_fails_when_mutations_survive() {
        let code = "def withdraw(balance, amount):\n    if balance >= amount:\n        return balance - amount\n    return balance\n";
        let gate = mutation_kill_rate_gate(code, |_mutated| async { Verdict::VERIFIED }, 0.95).await;
        assert!(!gate.passed);
    }
}
