//! SARIF 2.1.0 renderer, for code-scanning integrations that understand
//! the standard format. Only non-VERIFIED files produce a result — a
//! VERIFIED file has nothing to report. Each non-terminal-pass verdict
//! gets its own fixed rule id so downstream triage can filter by kind.

use argus_core::Verdict;
use argus_pipeline::FileReport;
use serde_json::{json, Value};

fn rule_id(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::VULNERABLE => "ARGUS_VULNERABLE",
        Verdict::UNVERIFIED => "ARGUS_UNVERIFIED",
        Verdict::ERROR => "ARGUS_ERROR",
        Verdict::FIXED => "ARGUS_FIXED",
        Verdict::VERIFIED => unreachable!("VERIFIED findings are filtered out before rule_id is called"),
    }
}

fn level(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::VULNERABLE | Verdict::ERROR => "error",
        Verdict::UNVERIFIED => "warning",
        Verdict::FIXED => "note",
        Verdict::VERIFIED => unreachable!("VERIFIED findings are filtered out before level is called"),
    }
}

fn rule_definition(id: &'static str, level: &'static str, description: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "shortDescription": { "text": description },
        "defaultConfiguration": { "level": level },
        "properties": { "tags": ["security", "formal-verification"] },
    })
}

pub fn render_sarif_report(files: &[FileReport]) -> Value {
    let findings: Vec<&FileReport> = files.iter().filter(|f| f.verdict != Verdict::VERIFIED).collect();

    let rules = vec![
        rule_definition("ARGUS_VULNERABLE", "error", "Formal verification proved the code violates a safety obligation"),
        rule_definition("ARGUS_UNVERIFIED", "warning", "Verification could not reach a conclusive verdict"),
        rule_definition("ARGUS_ERROR", "error", "Verification pipeline failed before reaching a verdict"),
        rule_definition("ARGUS_FIXED", "note", "A vulnerability was found and an automated repair was verified"),
    ];

    let results: Vec<Value> = findings
        .iter()
        .map(|item| {
            let message = if item.message.is_empty() {
                format!("{} produced verdict {}", item.filename, item.verdict.as_str())
            } else {
                item.message.clone()
            };
            json!({
                "ruleId": rule_id(item.verdict),
                "level": level(item.verdict),
                "message": { "text": message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": item.filename },
                        "region": { "startLine": 1 },
                    }
                }],
            })
        })
        .collect();

    json!({
        "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "Argus",
                    "informationUri": "https://github.com/argus-verify/argus",
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                }
            },
            "results": results,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(filename: &str, verdict: Verdict) -> FileReport {
        FileReport {
            filename: filename.to_string(),
            verdict,
            obligations: Vec::new(),
            assumptions: Vec::new(),
            engine: "lean".to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn verified_files_produce_no_results() {
        let sarif = render_sarif_report(&[report("ok.py", Verdict::VERIFIED)]);
        assert!(sarif["runs"][0]["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn vulnerable_file_gets_error_level_result() {
        let sarif = render_sarif_report(&[report("bad.py", Verdict::VULNERABLE)]);
        let results = sarif["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["ruleId"], "ARGUS_VULNERABLE");
        assert_eq!(results[0]["level"], "error");
    }
}
