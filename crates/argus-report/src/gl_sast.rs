//! GitLab SAST report renderer. Fingerprints are a stable SHA-256 of
//! `file:verdict:message` so the same finding keeps the same identity
//! across runs, letting GitLab track a vulnerability instead of
//! re-reporting it as new every pipeline.

use argus_core::Verdict;
use argus_pipeline::FileReport;
use chrono::Utc;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

fn severity(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::VULNERABLE | Verdict::ERROR => "Critical",
        Verdict::UNVERIFIED => "High",
        Verdict::VERIFIED | Verdict::FIXED => "Info",
    }
}

fn fingerprint(filename: &str, verdict: Verdict, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{filename}:{}:{message}", verdict.as_str()).as_bytes());
    hex::encode(hasher.finalize())
}

pub fn render_gl_sast_report(files: &[FileReport]) -> Value {
    let vulnerabilities: Vec<Value> = files
        .iter()
        .filter(|item| item.verdict != Verdict::VERIFIED)
        .map(|item| {
            let message = if item.message.is_empty() {
                format!("Argus verdict {} for {}", item.verdict.as_str(), item.filename)
            } else {
                item.message.clone()
            };
            json!({
                "id": fingerprint(&item.filename, item.verdict, &message),
                "category": "sast",
                "name": format!("Argus: {}", item.verdict.as_str()),
                "message": message,
                "severity": severity(item.verdict),
                "confidence": "High",
                "scanner": { "id": "argus", "name": "Argus" },
                "location": {
                    "file": item.filename,
                    "start_line": 1,
                },
                "identifiers": [{
                    "type": "argus_verdict",
                    "name": format!("Argus {}", item.verdict.as_str()),
                    "value": item.verdict.as_str(),
                }],
            })
        })
        .collect();

    json!({
        "version": "15.0.4",
        "scan": {
            "scanner": {
                "id": "argus",
                "name": "Argus",
                "version": env!("CARGO_PKG_VERSION"),
                "vendor": { "name": "Argus" },
            },
            "type": "sast",
            "start_time": Utc::now().to_rfc3339(),
            "end_time": Utc::now().to_rfc3339(),
            "status": "success",
        },
        "vulnerabilities": vulnerabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(verdict: Verdict) -> FileReport {
        FileReport {
            filename: "withdraw.py".to_string(),
            verdict,
            obligations: Vec::new(),
            assumptions: Vec::new(),
            engine: "lean".to_string(),
            message: "balance could go negative".to_string(),
        }
    }

    #[test]
    fn fingerprint_is_stable_for_identical_input() {
        let a = fingerprint("withdraw.py", Verdict::VULNERABLE, "balance could go negative");
        let b = fingerprint("withdraw.py", Verdict::VULNERABLE, "balance could go negative");
        assert_eq!(a, b);
    }

    #[test]
    fn vulnerable_maps_to_critical_severity() {
        let gl = render_gl_sast_report(&[report(Verdict::VULNERABLE)]);
        let vulns = gl["vulnerabilities"].as_array().unwrap();
        assert_eq!(vulns.len(), 1);
        assert_eq!(vulns[0]["severity"], "Critical");
    }

    #[test]
    fn unverified_maps_to_high_severity() {
        let gl = render_gl_sast_report(&[report(Verdict::UNVERIFIED)]);
        assert_eq!(gl["vulnerabilities"][0]["severity"], "High");
    }
}
