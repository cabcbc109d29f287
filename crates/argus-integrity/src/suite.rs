//! Top-level CI integrity suite: wires together every gate, reads the
//! on-disk trace store the pipeline already wrote, and emits one
//! pass/fail verdict for the whole run.

use std::path::Path;

use argus_core::{ObligationPolicy, Verdict};
use argus_pipeline::FileReport;
use argus_translate::{run_semantic_guard, AstTranslator, DafnyTranslator, Translator};

use crate::benchmark::seeded_benchmark_gate;
use crate::gates::{assumption_coverage_gate, obligation_determinism_gate, GateResult};
use crate::mutation::mutation_kill_rate_gate;

#[derive(Debug, Clone)]
pub struct CIGateReport {
    pub passed: bool,
    pub gates: Vec<GateResult>,
}

fn contains_loop(code: &str) -> bool {
    code.contains("for ") || code.contains("while ")
}

async fn evaluate_mutation(mutated_code: String) -> Verdict {
    let policy = ObligationPolicy::new();
    let derived = policy.derive(&mutated_code);
    if !derived.unsupported_constructs.is_empty() {
        return Verdict::UNVERIFIED;
    }
    if derived.obligations.is_empty() {
        return Verdict::VERIFIED;
    }

    let translation = if contains_loop(&mutated_code) {
        DafnyTranslator::new().translate(&mutated_code, &derived.obligations, &[]).await
    } else {
        AstTranslator::new().translate(&mutated_code, &derived.obligations, &[]).await
    };

    if !translation.success {
        return Verdict::UNVERIFIED;
    }

    let guard = run_semantic_guard(&mutated_code, &translation.code, &derived.obligations);
    if !guard.passed {
        return Verdict::UNVERIFIED;
    }
    Verdict::VULNERABLE
}

fn traceability_gate(files: &[(String, String)], trace_root: &Path, run_id: Option<&str>) -> GateResult {
    let Some(run_id) = run_id else {
        return GateResult::fail("traceability-gate", "pipeline did not expose run_id");
    };

    let run_dir = trace_root.join(run_id);
    let mut missing = Vec::new();
    if !run_dir.join("manifest.json").exists() {
        missing.push("manifest.json".to_string());
    }
    if !run_dir.join("summary.json").exists() {
        missing.push("summary.json".to_string());
    }

    for (filename, _) in files {
        let base = run_dir.join("files").join(filename);
        for required in ["01_discovery.json", "result.json"] {
            if !base.join(required).exists() {
                missing.push(format!("{filename}:{required}"));
            }
        }

        let discovery_path = base.join("01_discovery.json");
        let mut unsupported = true;
        if let Ok(raw) = std::fs::read_to_string(&discovery_path) {
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(payload) => {
                    unsupported = payload
                        .get("unsupported_constructs")
                        .and_then(|v| v.as_array())
                        .map(|arr| !arr.is_empty())
                        .unwrap_or(false);
                }
                Err(_) => missing.push(format!("{filename}:01_discovery.json_unreadable")),
            }
        }

        if !unsupported {
            let translation_exists = base.join("02_translation.lean").exists() || base.join("02_translation.dfy").exists();
            if !translation_exists {
                missing.push(format!("{filename}:02_translation.*"));
            }
            if !base.join("02_semantic_guard.json").exists() {
                missing.push(format!("{filename}:02_semantic_guard.json"));
            }
            if !base.join("03_verify_stdout.txt").exists() {
                missing.push(format!("{filename}:03_verify_stdout.txt"));
            }
        }
    }

    if missing.is_empty() {
        GateResult::ok("traceability-gate")
    } else {
        missing.sort();
        GateResult::fail("traceability-gate", missing.join("; "))
    }
}

pub async fn run_ci_integrity_suite(
    files: &[(String, String)],
    reports: &[FileReport],
    trace_root: &Path,
    run_id: Option<&str>,
    benchmark_root: Option<&Path>,
) -> CIGateReport {
    let policy = ObligationPolicy::new();

    let mut unsupported_failures = Vec::new();
    let mut determinism_failures = Vec::new();
    let mut assumption_failures = Vec::new();
    let mut semantic_failures = Vec::new();
    let mut proof_failures = Vec::new();
    let mut verdict_failures = Vec::new();
    let mut reproducibility_failures = Vec::new();

    let ast_translator = AstTranslator::new();
    let dafny_translator = DafnyTranslator::new();

    for (filename, code) in files {
        let policy_result = policy.derive(code);
        let Some(report) = reports.iter().find(|r| &r.filename == filename) else {
            proof_failures.push(format!("{filename}:missing_pipeline_report"));
            verdict_failures.push(format!("{filename}:missing_pipeline_report"));
            continue;
        };

        if !policy_result.unsupported_constructs.is_empty() {
            unsupported_failures.push(format!("{filename}:{}", policy_result.unsupported_constructs.join(",")));
            if report.verdict != Verdict::UNVERIFIED {
                verdict_failures.push(format!("{filename}:unsupported_constructs_must_be_unverified"));
            }
        }

        let determinism = obligation_determinism_gate(code, &policy, 3);
        if !determinism.passed {
            determinism_failures.push(format!("{filename}:{}", determinism.details));
        }

        let reproducibility = obligation_determinism_gate(code, &policy, 2);
        if !reproducibility.passed {
            reproducibility_failures.push(format!("{filename}:{}", reproducibility.details));
        }

        let assumption_gate = assumption_coverage_gate(&report.assumptions);
        if !assumption_gate.passed {
            assumption_failures.push(format!("{filename}:{}", assumption_gate.details));
            if report.verdict != Verdict::UNVERIFIED {
                verdict_failures.push(format!("{filename}:invalid_assumptions_must_be_unverified"));
            }
        }

        if policy_result.unsupported_constructs.is_empty() {
            let translation = if contains_loop(code) {
                dafny_translator.translate(code, &policy_result.obligations, &report.assumptions).await
            } else {
                ast_translator.translate(code, &policy_result.obligations, &report.assumptions).await
            };
            if !translation.success {
                semantic_failures.push(format!("{filename}:translation_failed"));
            } else {
                let guard = run_semantic_guard(code, &translation.code, &policy_result.obligations);
                if !guard.passed {
                    let codes: Vec<&str> = guard.issues.iter().map(|i| i.code).collect();
                    semantic_failures.push(format!("{filename}:{}", codes.join(",")));
                }
            }
        }

        if !report.verdict.is_passing() {
            proof_failures.push(format!("{filename}:{}", report.verdict.as_str()));
        }
    }

    let trace_gate = traceability_gate(files, trace_root, run_id);
    let mutation_gate = mutation_gate_for_files(files).await;
    let benchmark_gate = seeded_benchmark_gate(benchmark_root).await;

    let sorted_details = |mut items: Vec<String>| {
        items.sort();
        items.join("; ")
    };

    let gates = vec![
        GateResult {
            name: "unsupported-construct-gate",
            passed: unsupported_failures.is_empty(),
            details: if unsupported_failures.is_empty() { "ok".to_string() } else { sorted_details(unsupported_failures) },
        },
        GateResult {
            name: "obligation-policy-gate",
            passed: determinism_failures.is_empty(),
            details: if determinism_failures.is_empty() { "ok".to_string() } else { sorted_details(determinism_failures) },
        },
        GateResult {
            name: "assumption-evidence-gate",
            passed: assumption_failures.is_empty(),
            details: if assumption_failures.is_empty() { "ok".to_string() } else { sorted_details(assumption_failures) },
        },
        GateResult {
            name: "semantic-guard-gate",
            passed: semantic_failures.is_empty(),
            details: if semantic_failures.is_empty() { "ok".to_string() } else { sorted_details(semantic_failures) },
        },
        GateResult {
            name: "proof-gate",
            passed: proof_failures.is_empty(),
            details: if proof_failures.is_empty() { "ok".to_string() } else { sorted_details(proof_failures) },
        },
        GateResult {
            name: "verdict-contract-gate",
            passed: verdict_failures.is_empty(),
            details: if verdict_failures.is_empty() { "ok".to_string() } else { sorted_details(verdict_failures) },
        },
        trace_gate,
        GateResult {
            name: "reproducibility-gate",
            passed: reproducibility_failures.is_empty(),
            details: if reproducibility_failures.is_empty() { "ok".to_string() } else { sorted_details(reproducibility_failures) },
        },
        mutation_gate,
        benchmark_gate,
    ];

    CIGateReport {
        passed: gates.iter().all(|g| g.passed),
        gates,
    }
}

async fn mutation_gate_for_files(files: &[(String, String)]) -> GateResult {
    let mut failures = Vec::new();
    for (filename, code) in files {
        let gate = mutation_kill_rate_gate(code, evaluate_mutation, 0.95).await;
        if !gate.passed {
            failures.push(format!("{filename}:{}", gate.details));
        }
    }
    if failures.is_empty() {
        GateResult::ok("mutation-gate")
    } else {
        failures.sort();
        GateResult::fail("mutation-gate", failures.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Verdict;

    #[tokio::test]
    async fn traceability_gate_fails_without_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let gate = traceability_gate(&[], dir.path(), None);
        assert!(!gate.passed);
    }

    #[tokio::test]
    async fn suite_fails_when_report_missing_for_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![("a.py".to_string(), "def f():\n    return 1\n".to_string())];
        let reports: Vec<FileReport> = Vec::new();
        let report = run_ci_integrity_suite(&files, &reports, dir.path(), Some("run-1"), None).await;
        assert!(!report.passed);
    }

    #[tokio::test]
    async fn suite_passes_proof_gate_for_verified_report() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![("a.py".to_string(), "def f():\n    return 1\n".to_string())];
        let reports = vec![FileReport {
            filename: "a.py".to_string(),
            verdict: Verdict::VERIFIED,
            obligations: Vec::new(),
            assumptions: Vec::new(),
            engine: "lean".to_string(),
            message: "ok".to_string(),
        }];
        let report = run_ci_integrity_suite(&files, &reports, dir.path(), Some("run-1"), None).await;
        let proof_gate = report.gates.iter().find(|g| g.name == "proof-gate").unwrap();
        assert!(proof_gate.passed);
    }
}
