//! Runs one Python source file through the full pipeline: discovery,
//! translation, the semantic guard, verification, and — on a vulnerable
//! verdict — a single bounded repair-and-rerun pass.

use std::path::PathBuf;

use argus_core::{
    compute_verdict, AssumedInput, DiscoveryConfig, Engine, InvariantDiscovery, Obligation,
    ObligationPolicy, ProofLanguage, Verdict, VerificationSummary,
};
use argus_repair::RepairEngine;
use argus_translate::{run_semantic_guard, AstTranslator, DafnyTranslator, LlmTranslator, Translator};
use argus_verify::{DafnyVerifier, LeanVerifier, VerifierDriver};
use tracing::info;

use crate::trace::TraceStore;

fn new_run_id() -> String {
    format!("run-{}", uuid::Uuid::new_v4().simple())
}

fn result_summary(results: &[PipelineResult]) -> serde_json::Value {
    let count = |verdict: Verdict| results.iter().filter(|r| r.verdict == verdict).count();
    serde_json::json!({
        "total": results.len(),
        "verified": count(Verdict::VERIFIED),
        "fixed": count(Verdict::FIXED),
        "vulnerable": count(Verdict::VULNERABLE),
        "unverified": count(Verdict::UNVERIFIED),
        "error": count(Verdict::ERROR),
    })
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model: String,
    pub max_repair_attempts: u32,
    pub trace_root: PathBuf,
    pub allow_repair: bool,
    pub require_docker_verify: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            max_repair_attempts: 3,
            trace_root: PathBuf::from(".argus-trace"),
            allow_repair: true,
            require_docker_verify: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub filename: String,
    pub verdict: Verdict,
    pub obligations: Vec<Obligation>,
    pub assumptions: Vec<AssumedInput>,
    pub engine: String,
    pub message: String,
    pub repaired_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub filename: String,
    pub verdict: Verdict,
    pub obligations: Vec<Obligation>,
    pub assumptions: Vec<AssumedInput>,
    pub engine: String,
    pub message: String,
}

pub struct ArgusPipeline {
    config: PipelineConfig,
    policy: ObligationPolicy,
    discovery: InvariantDiscovery,
    repair: RepairEngine,
    ast_translator: AstTranslator,
    llm_translator: LlmTranslator,
    dafny_translator: DafnyTranslator,
    lean_verifier: LeanVerifier,
    dafny_verifier: DafnyVerifier,
}

impl ArgusPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let discovery = InvariantDiscovery::new(DiscoveryConfig {
            model: config.model.clone(),
            use_llm: true,
            ..DiscoveryConfig::default()
        });
        let repair = RepairEngine::new(config.model.clone(), config.max_repair_attempts);
        Self {
            lean_verifier: LeanVerifier::new(None, config.require_docker_verify),
            dafny_verifier: DafnyVerifier::new(config.require_docker_verify),
            ast_translator: AstTranslator::new(),
            llm_translator: LlmTranslator::new(config.model.clone()),
            dafny_translator: DafnyTranslator::new(),
            policy: ObligationPolicy::new(),
            discovery,
            repair,
            config,
        }
    }

    /// Audits a single file as a standalone run: its own `run_id`, its own
    /// `manifest.json`/`summary.json`. For auditing several files under one
    /// run, use [`ArgusPipeline::run_many`] instead.
    pub async fn run_file(&self, filename: &str, python_code: &str) -> PipelineResult {
        let run_id = new_run_id();
        let trace = TraceStore::new(&self.config.trace_root, &run_id);
        let result = self.run_file_inner(&trace, filename, python_code, self.config.allow_repair).await;
        let _ = trace.write_manifest(&[filename.to_string()]).await;
        let _ = trace.write_summary(&result_summary(std::slice::from_ref(&result))).await;
        result
    }

    /// Audits every file under one shared `run_id`, so the trace store's
    /// top-level `manifest.json`/`summary.json` describe the whole batch.
    /// Returns the reports alongside the `run_id` that named their trace
    /// directory, so a caller (e.g. the CI integrity suite) can point the
    /// traceability gate at this exact run without guessing.
    pub async fn run_many(&self, files: &[(String, String)]) -> (Vec<FileReport>, String) {
        let run_id = new_run_id();
        let trace = TraceStore::new(&self.config.trace_root, &run_id);

        let mut results = Vec::with_capacity(files.len());
        for (filename, code) in files {
            let result = self.run_file_inner(&trace, filename, code, self.config.allow_repair).await;
            results.push(result);
        }

        let filenames: Vec<String> = results.iter().map(|r| r.filename.clone()).collect();
        let _ = trace.write_manifest(&filenames).await;
        let _ = trace.write_summary(&result_summary(&results)).await;

        let reports = results
            .into_iter()
            .map(|result| FileReport {
                filename: result.filename,
                verdict: result.verdict,
                obligations: result.obligations,
                assumptions: result.assumptions,
                engine: result.engine,
                message: result.message,
            })
            .collect();
        (reports, run_id)
    }

    async fn run_file_inner(
        &self,
        trace: &TraceStore,
        filename: &str,
        python_code: &str,
        allow_repair: bool,
    ) -> PipelineResult {
        let policy_result = self.policy.derive(python_code);
        let discovery = self
            .discovery
            .discover(python_code)
            .await
            .unwrap_or_else(|_| argus_core::DiscoveryResult {
                obligations: policy_result.obligations.clone(),
                assumed_inputs: Vec::new(),
                llm_candidates_raw: String::new(),
                assumptions_valid: true,
            });
        let (assumptions_valid, issues) = argus_core::validate_assumptions(&discovery.assumed_inputs);

        let _ = trace
            .write_discovery(
                filename,
                &policy_result.obligations,
                &discovery.assumed_inputs,
                assumptions_valid,
                &issues.iter().map(|i| i.reason.clone()).collect::<Vec<_>>(),
                &policy_result.unsupported_constructs,
            )
            .await;

        if !policy_result.unsupported_constructs.is_empty() {
            let summary = VerificationSummary {
                obligation_results: Vec::new(),
                assumptions_valid,
                unsupported_constructs: policy_result.unsupported_constructs.clone(),
                semantic_guard_passed: false,
                verification_error: false,
                repaired: false,
            };
            let decision = compute_verdict(&summary);
            let _ = trace.write_result(filename, decision.verdict, "n/a", &decision.reason).await;
            return PipelineResult {
                filename: filename.to_string(),
                verdict: decision.verdict,
                obligations: policy_result.obligations,
                assumptions: discovery.assumed_inputs,
                engine: "n/a".to_string(),
                message: decision.reason,
                repaired_code: None,
            };
        }

        let selection = argus_core::select_engine(python_code);
        let translation = self
            .translate(python_code, &policy_result.obligations, &discovery.assumed_inputs, selection.engine)
            .await;

        let _ = trace
            .write_translation(
                filename,
                translation.language.file_extension(),
                if translation.success { &translation.code } else { &translation.error },
            )
            .await;

        if !translation.success {
            let summary = VerificationSummary {
                obligation_results: Vec::new(),
                assumptions_valid,
                unsupported_constructs: Vec::new(),
                semantic_guard_passed: false,
                verification_error: true,
                repaired: false,
            };
            let decision = compute_verdict(&summary);
            let _ = trace
                .write_result(filename, decision.verdict, translation.language.as_str(), &translation.error)
                .await;
            return PipelineResult {
                filename: filename.to_string(),
                verdict: decision.verdict,
                obligations: policy_result.obligations,
                assumptions: discovery.assumed_inputs,
                engine: translation.language.as_str().to_string(),
                message: translation.error,
                repaired_code: None,
            };
        }

        let guard = run_semantic_guard(python_code, &translation.code, &policy_result.obligations);
        let _ = trace
            .write_semantic_guard(
                filename,
                guard.passed,
                &guard
                    .issues
                    .iter()
                    .map(|issue| (issue.code.to_string(), issue.message.clone()))
                    .collect::<Vec<_>>(),
            )
            .await;
        let verification = match selection.engine {
            Engine::Lean => self.lean_verifier.verify(&translation.code, &policy_result.obligations).await,
            Engine::Dafny => self.dafny_verifier.verify(&translation.code, &policy_result.obligations).await,
        };

        let _ = trace
            .write_verify_stdout(
                filename,
                if verification.raw_output.is_empty() { &verification.error_message } else { &verification.raw_output },
            )
            .await;

        let mut summary = VerificationSummary {
            obligation_results: verification.obligation_results.clone(),
            assumptions_valid,
            unsupported_constructs: Vec::new(),
            semantic_guard_passed: guard.passed,
            verification_error: verification.verification_error,
            repaired: false,
        };
        let decision = compute_verdict(&summary);

        let mut repaired_code = None;
        if decision.verdict == Verdict::VULNERABLE && allow_repair && !verification.verification_error {
            let repair_result = self
                .repair
                .repair(
                    python_code,
                    if verification.error_message.is_empty() { &verification.raw_output } else { &verification.error_message },
                    &policy_result.obligations,
                )
                .await;

            if repair_result.success {
                if let Some(fixed_code) = repair_result.fixed_code {
                    let _ = trace.write_repair_attempt(filename, 0, &fixed_code).await;
                    summary.repaired = true;
                    let repaired_filename = format!("{filename}_repaired");
                    let rerun = Box::pin(self.run_file_inner(trace, &repaired_filename, &fixed_code, false)).await;
                    if rerun.verdict.is_passing() {
                        let _ = trace
                            .write_result(filename, Verdict::FIXED, &rerun.engine, "Repaired and verified")
                            .await;
                        return PipelineResult {
                            filename: filename.to_string(),
                            verdict: Verdict::FIXED,
                            obligations: policy_result.obligations,
                            assumptions: discovery.assumed_inputs,
                            engine: rerun.engine,
                            message: "Repaired and verified".to_string(),
                            repaired_code: Some(fixed_code),
                        };
                    }
                    repaired_code = Some(fixed_code);
                }
            }
        }

        let message = if !decision.reason.is_empty() {
            decision.reason.clone()
        } else {
            verification.error_message.clone()
        };
        let _ = trace.write_result(filename, decision.verdict, selection.engine.as_str(), &message).await;

        info!(filename, verdict = %decision.verdict, "pipeline run complete");

        PipelineResult {
            filename: filename.to_string(),
            verdict: decision.verdict,
            obligations: policy_result.obligations,
            assumptions: discovery.assumed_inputs,
            engine: selection.engine.as_str().to_string(),
            message,
            repaired_code,
        }
    }

    async fn translate(
        &self,
        python_code: &str,
        obligations: &[Obligation],
        assumptions: &[AssumedInput],
        engine: Engine,
    ) -> argus_core::TranslationOutcome {
        if engine == Engine::Dafny {
            return self.dafny_translator.translate(python_code, obligations, assumptions).await;
        }

        let ast_outcome = self.ast_translator.translate(python_code, obligations, assumptions).await;
        if ast_outcome.success {
            return ast_outcome;
        }
        let mut llm_outcome = self.llm_translator.translate(python_code, obligations, assumptions).await;
        if !llm_outcome.success && llm_outcome.language != ProofLanguage::Lean {
            llm_outcome.language = ProofLanguage::Lean;
        }
        llm_outcome
    }
}
