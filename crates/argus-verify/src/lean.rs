//! Lean 4 verifier driver: shells out to `lake env lean` over a scratch
//! file and reads obligation results off the process exit code.

use std::path::PathBuf;
use std::time::Duration;

use argus_core::{Obligation, VerificationOutcome};
use async_trait::async_trait;
use tokio::process::Command;

use crate::base::{all_failed, docker_gate_outcome, local_verify_allowed, running_in_container, VerifierDriver};
use crate::scratch::ScratchFile;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct LeanVerifier {
    project_dir: Option<PathBuf>,
    timeout: Duration,
    require_docker: bool,
}

impl LeanVerifier {
    pub fn new(project_dir: Option<PathBuf>, require_docker: bool) -> Self {
        Self {
            project_dir,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            require_docker,
        }
    }

    fn resolve_project_dir(&self) -> PathBuf {
        if let Some(dir) = &self.project_dir {
            if dir.exists() {
                return dir.clone();
            }
        }
        std::env::temp_dir()
    }
}

impl Default for LeanVerifier {
    fn default() -> Self {
        Self::new(None, true)
    }
}

#[async_trait]
impl VerifierDriver for LeanVerifier {
    async fn verify(&self, proof_code: &str, obligations: &[Obligation]) -> VerificationOutcome {
        if self.require_docker && !running_in_container() && !local_verify_allowed() {
            return docker_gate_outcome("lean", obligations);
        }

        let project_dir = self.resolve_project_dir();
        let scratch = match ScratchFile::write(&project_dir, "lean", proof_code).await {
            Ok(scratch) => scratch,
            Err(e) => {
                return VerificationOutcome {
                    engine: "lean".to_string(),
                    obligation_results: all_failed(obligations, "lean", &e.to_string()),
                    raw_output: String::new(),
                    verification_error: true,
                    error_message: e.to_string(),
                }
            }
        };

        let filename = scratch
            .path()
            .file_name()
            .expect("scratch file always has a filename")
            .to_string_lossy()
            .to_string();

        let run = tokio::time::timeout(
            self.timeout,
            Command::new("lake")
                .arg("env")
                .arg("lean")
                .arg(&filename)
                .current_dir(&project_dir)
                .output(),
        )
        .await;

        match run {
            Err(_) => VerificationOutcome {
                engine: "lean".to_string(),
                obligation_results: all_failed(obligations, "lean", "verifier timed out"),
                raw_output: String::new(),
                verification_error: true,
                error_message: "verifier timed out".to_string(),
            },
            Ok(Err(e)) => VerificationOutcome {
                engine: "lean".to_string(),
                obligation_results: all_failed(obligations, "lean", &e.to_string()),
                raw_output: String::new(),
                verification_error: true,
                error_message: e.to_string(),
            },
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let combined = format!("{stdout}\n{stderr}").trim().to_string();

                let verified = output.status.success() && !proof_code.contains("sorry");
                let message = if verified {
                    String::new()
                } else {
                    combined.chars().take(400).collect()
                };

                VerificationOutcome {
                    engine: "lean".to_string(),
                    obligation_results: obligations
                        .iter()
                        .map(|item| argus_core::ObligationResult {
                            obligation: item.clone(),
                            verified,
                            engine: "lean".to_string(),
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
    use argus_core::{ObligationCategory, Severity};

    fn sample_obligation() -> Obligation {
        Obligation::new(
            "withdraw:non_negative_result",
            "withdraw(...) >= 0",
            ObligationCategory::NonNegativity,
            "desc",
            Severity::Critical,
        )
    }

    #[tokio::test]
    async fn docker_gate_fails_closed_outside_container() {
        std::env::remove_var("ARGUS_ALLOW_LOCAL_VERIFY");
        let verifier = LeanVerifier::new(None, true);
        if running_in_container() {
            return;
        }
        let outcome = verifier.verify("theorem t : True := by trivial", &[sample_obligation()]).await;
        assert!(outcome.verification_error);
        assert!(!outcome.obligation_results[0].verified);
    }
}
