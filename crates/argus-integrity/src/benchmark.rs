//! Seeded-benchmark gate: a manifest of known-shape Python snippets,
//! each tagged with the outcome the pipeline is expected to reach, run
//! against the live policy/translator/guard stack. Catches a regression
//! that silently makes a previously-blocking pattern pass clean.

use crate::gates::GateResult;
use argus_core::ObligationPolicy;
use argus_translate::{run_semantic_guard, AstTranslator, Translator};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct BenchmarkManifest {
    cases: Vec<BenchmarkCase>,
}

#[derive(Debug, Deserialize)]
struct BenchmarkCase {
    path: String,
    expected: String,
}

pub async fn seeded_benchmark_gate(benchmark_root: Option<&Path>) -> GateResult {
    let Some(root) = benchmark_root else {
        return GateResult::fail("seeded-benchmark-gate", "benchmark root is not configured");
    };

    let manifest_path = root.join("manifest.json");
    let raw = match std::fs::read_to_string(&manifest_path) {
        Ok(raw) => raw,
        Err(_) => return GateResult::fail("seeded-benchmark-gate", "benchmarks/seeded/manifest.json missing"),
    };
    let manifest: BenchmarkManifest = match serde_json::from_str(&raw) {
        Ok(manifest) => manifest,
        Err(err) => return GateResult::fail("seeded-benchmark-gate", format!("invalid manifest: {err}")),
    };

    let policy = ObligationPolicy::new();
    let translator = AstTranslator::new();
    let mut failures = Vec::new();

    for case in &manifest.cases {
        let case_path = root.join(&case.path);
        let Ok(code) = std::fs::read_to_string(&case_path) else {
            failures.push(format!("missing_case:{}", case.path));
            continue;
        };
        let derived = policy.derive(&code);

        match case.expected.as_str() {
            "blocking" => {
                if derived.obligations.is_empty() && derived.unsupported_constructs.is_empty() {
                    failures.push(format!("{}:expected_blocking", case.path));
                }
            }
            "supported" => {
                if !derived.unsupported_constructs.is_empty() {
                    failures.push(format!("{}:unexpected_unsupported", case.path));
                }
            }
            "semantic_guard_failure" => {
                let translation = translator.translate(&code, &derived.obligations, &[]).await;
                if !translation.success {
                    failures.push(format!("{}:translation_failed", case.path));
                } else {
                    let guard = run_semantic_guard(&code, &translation.code, &derived.obligations);
                    if guard.passed {
                        failures.push(format!("{}:expected_guard_failure", case.path));
                    }
                }
            }
            other => failures.push(format!("{}:unknown_expected:{other}", case.path)),
        }
    }

    if failures.is_empty() {
        GateResult::ok("seeded-benchmark-gate")
    } else {
        failures.sort();
        GateResult::fail("seeded-benchmark-gate", failures.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_root_fails_closed() {
        let gate = seeded_benchmark_gate(None).await;
        assert!(!gate.passed);
    }

    #[tokio::test]
    async fn missing_manifest_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let gate = seeded_benchmark_gate(Some(dir.path())).await;
        assert!(!gate.passed);
    }

    #[tokio::test]
    async fn blocking_case_passes_when_policy_flags_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("withdraw.py"),
            "def withdraw(balance, amount):\n    return balance - amount\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("manifest.json"),
            r#"{"cases": [{"path": "withdraw.py", "expected": "blocking"}]}"#,
        )
        .unwrap();
        let gate = seeded_benchmark_gate(Some(dir.path())).await;
        assert!(gate.passed, "{}", gate.details);
    }
}
