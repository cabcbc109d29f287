//! Per-run, per-file traceability store. Every artifact the CI integrity
//! suite's traceability gate checks for is written here and nowhere else —
//! that gate reads only what's on disk, never in-memory pipeline state.

use std::path::{Path, PathBuf};

use argus_core::{AssumedInput, Obligation, Verdict};
use serde::Serialize;
use serde_json::json;

pub struct TraceStore {
    run_root: PathBuf,
}

impl TraceStore {
    pub fn new(trace_root: &Path, run_id: &str) -> Self {
        Self {
            run_root: trace_root.join(run_id),
        }
    }

    pub fn run_id_dir(&self) -> &Path {
        &self.run_root
    }

    fn file_dir(&self, filename: &str) -> PathBuf {
        self.run_root.join("files").join(filename)
    }

    pub async fn write_discovery(
        &self,
        filename: &str,
        obligations: &[Obligation],
        assumed_inputs: &[AssumedInput],
        assumptions_valid: bool,
        assumption_issues: &[String],
        unsupported_constructs: &[String],
    ) -> std::io::Result<()> {
        let payload = json!({
            "obligations": obligations,
            "assumed_inputs": assumed_inputs,
            "assumptions_valid": assumptions_valid,
            "assumption_issues": assumption_issues,
            "unsupported_constructs": unsupported_constructs,
        });
        self.write_json(filename, "01_discovery.json", &payload).await
    }

    pub async fn write_translation(
        &self,
        filename: &str,
        extension: &str,
        content: &str,
    ) -> std::io::Result<()> {
        self.write_text(filename, &format!("02_translation.{extension}"), content)
            .await
    }

    pub async fn write_semantic_guard(
        &self,
        filename: &str,
        passed: bool,
        issues: &[(String, String)],
    ) -> std::io::Result<()> {
        let payload = json!({
            "passed": passed,
            "issues": issues.iter().map(|(code, message)| json!({"code": code, "message": message})).collect::<Vec<_>>(),
        });
        self.write_json(filename, "02_semantic_guard.json", &payload).await
    }

    pub async fn write_verify_stdout(&self, filename: &str, content: &str) -> std::io::Result<()> {
        self.write_text(filename, "03_verify_stdout.txt", content).await
    }

    pub async fn write_repair_attempt(
        &self,
        filename: &str,
        index: u32,
        code: &str,
    ) -> std::io::Result<()> {
        self.write_text(filename, &format!("04_repair_{index}.py"), code).await
    }

    pub async fn write_result(
        &self,
        filename: &str,
        verdict: Verdict,
        engine: &str,
        message: &str,
    ) -> std::io::Result<()> {
        let payload = json!({
            "verdict": verdict.as_str(),
            "engine": engine,
            "message": message,
        });
        self.write_json(filename, "result.json", &payload).await
    }

    pub async fn write_manifest(&self, filenames: &[String]) -> std::io::Result<()> {
        let payload = json!({ "files": filenames });
        self.write_run_json("manifest.json", &payload).await
    }

    pub async fn write_summary<T: Serialize>(&self, summary: &T) -> std::io::Result<()> {
        self.write_run_json("summary.json", summary).await
    }

    async fn write_json<T: Serialize>(
        &self,
        filename: &str,
        name: &str,
        payload: &T,
    ) -> std::io::Result<()> {
        let dir = self.file_dir(filename);
        tokio::fs::create_dir_all(&dir).await?;
        let body = serde_json::to_string_pretty(payload).expect("trace payload always serializes");
        tokio::fs::write(dir.join(name), body).await
    }

    async fn write_text(&self, filename: &str, name: &str, content: &str) -> std::io::Result<()> {
        let dir = self.file_dir(filename);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(name), content).await
    }

    async fn write_run_json<T: Serialize>(&self, name: &str, payload: &T) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.run_root).await?;
        let body = serde_json::to_string_pretty(payload).expect("trace payload always serializes");
        tokio::fs::write(self.run_root.join(name), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_expected_discovery_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path(), "run-1");
        store
            .write_discovery("a.py", &[], &[], true, &[], &[])
            .await
            .unwrap();
        let path = dir.path().join("run-1/files/a.py/01_discovery.json");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn writes_result_json_for_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::new(dir.path(), "run-1");
        store.write_result("a.py", Verdict::VERIFIED, "lean", "ok").await.unwrap();
        let path = dir.path().join("run-1/files/a.py/result.json");
        assert!(path.exists());
    }
}
