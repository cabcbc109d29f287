//! Dafny verifier driver: shells out to `dafny verify` over a scratch
//! file. Dafny can exit 0 while still reporting errors in its summary
//! line, so the driver greps the combined output in addition to checking
//! the exit code.

use std::time::Duration;

use argus_core::{Obligation, VerificationOutcome};
use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use crate::base::{all_failed, docker_gate_outcome, local_verify_allowed, running_in_container, VerifierDriver};
use crate::scratch::ScratchFile;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct DafnyVerifier {
    timeout: Duration,
    require_docker: bool,
}

impl DafnyVerifier {
    pub fn new(require_docker: bool) -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            require_docker,
        }
    }
}

impl Default for DafnyVerifier {
    fn default() -> Self {
        Self::new(true)
    }
}

fn has_positive_error_count(output: &str) -> bool {
    let re = Regex::new(r"\b([1-9][0-9]*)\s+errors?\b").expect("static pattern compiles");
    re.is_match(&output.to_lowercase())
}

#[async_trait]
impl VerifierDriver for DafnyVerifier {
    async fn verify(&self, proof_code: &str, obligations: &[Obligation]) -> VerificationOutcome {
        if self.require_docker && !running_in_container() && !local_verify_allowed() {
            return docker_gate_outcome("dafny", obligations);
        }

        let scratch = match ScratchFile::write(&std::env::temp_dir(), "dfy", proof_code).await {
            Ok(scratch) => scratch,
            Err(e) => {
                return VerificationOutcome {
                    engine: "dafny".to_string(),
                    obligation_results: all_failed(obligations, "dafny", &e.to_string()),
                    raw_output: String::new(),
                    verification_error: true,
                    error_message: e.to_string(),
                }
            }
        };

        let run = tokio::time::timeout(
            self.timeout,
            Command::new("dafny").arg("verify").arg(scratch.path()).output(),
        )
        .await;

        match run {
            Err(_) => VerificationOutcome {
                engine: "dafny".to_string(),
                obligation_results: all_failed(obligations, "dafny", "verifier timed out"),
                raw_output: String::new(),
                verification_error: true,
                error_message: "verifier timed out".to_string(),
            },
            Ok(Err(e)) => VerificationOutcome {
                engine: "dafny".to_string(),
                obligation_results: all_failed(obligations, "dafny", &e.to_string()),
                raw_output: String::new(),
                verification_error: true,
                error_message: e.to_string(),
            },
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = format!("{stdout}\n{stderr}").trim().to_string();

                let verified = output.status.success() && !has_positive_error_count(&combined);
                let message = if verified {
                    String::new()
                } else {
                    combined.chars().take(400).collect()
                };

                VerificationOutcome {
                    engine: "dafny".to_string(),
                    obligation_results: obligations
                        .iter()
                        .map(|item| argus_core::ObligationResult {
                            obligation: item.clone(),
                            verified,
                            engine: "dafny".to_string(),
                            message: message.clone(),
                        })
                        .collect(),
                    raw_output: combined,
                    verification_error: false,
                    error_message: message,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_positive_error_count() {
        assert!(has_positive_error_count("Dafny program verifier finished with 2 errors"));
        assert!(!has_positive_error_count("Dafny program verifier finished with 0 errors"));
    }

    #[tokio::test]
    async fn docker_gate_fails_closed_outside_container() {
        std::env::remove_var("ARGUS_ALLOW_LOCAL_VERIFY");
        if running_in_container() {
            return;
        }
        let verifier = DafnyVerifier::new(true);
        let outcome = verifier.verify("method M() {}", &[]).await;
        assert!(outcome.verification_error);
    }
}
