//! Compact JSON report: summary counts plus a per-file breakdown. Mirrors
//! the wire shape the original `reporter.py` produced, so downstream
//! tooling consuming `summary.total`/`summary.verified`/... keeps working.

use argus_core::Verdict;
use argus_pipeline::FileReport;
use chrono::Utc;
use serde_json::{json, Value};

pub fn render_json_report(files: &[FileReport]) -> Value {
    let count = |verdict: Verdict| files.iter().filter(|f| f.verdict == verdict).count();

    json!({
        "tool": "Argus",
        "timestamp": Utc::now().to_rfc3339(),
        "summary": {
            "total": files.len(),
            "verified": count(Verdict::VERIFIED),
            "fixed": count(Verdict::FIXED),
            "vulnerable": count(Verdict::VULNERABLE),
            "unverified": count(Verdict::UNVERIFIED),
            "error": count(Verdict::ERROR),
        },
        "files": files.iter().map(|item| json!({
            "filename": item.filename,
            "verdict": item.verdict,
            "engine": item.engine,
            "message": item.message,
            "obligations": item.obligations,
            "assumptions": item.assumptions,
        })).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Verdict;

    fn report(verdict: Verdict) -> FileReport {
        FileReport {
            filename: "withdraw.py".to_string(),
            verdict,
            obligations: Vec::new(),
            assumptions: Vec::new(),
            engine: "lean".to_string(),
            message: "ok".to_string(),
        }
    }

    #[test]
    fn counts_each_verdict_bucket() {
        let payload = render_json_report(&[report(Verdict::VERIFIED), report(Verdict::VULNERABLE)]);
        assert_eq!(payload["summary"]["total"], 2);
        assert_eq!(payload["summary"]["verified"], 1);
        assert_eq!(payload["summary"]["vulnerable"], 1);
    }

    #[test]
    fn empty_file_list_yields_zeroed_summary() {
        let payload = render_json_report(&[]);
        assert_eq!(payload["summary"]["total"], 0);
        assert_eq!(payload["files"].as_array().unwrap().len(), 0);
    }
}
