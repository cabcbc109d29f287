//! Human-readable Markdown report: a status table followed by a detail
//! section per file, in the order the pipeline produced them.

use argus_pipeline::FileReport;
use std::fmt::Write as _;

pub fn render_markdown_report(files: &[FileReport]) -> String {
    let mut out = String::new();
    out.push_str("# Argus Verification Report\n\n");
    out.push_str("| File | Verdict | Engine |\n");
    out.push_str("|:---|:---|:---|\n");
    for item in files {
        let _ = writeln!(out, "| `{}` | {} | {} |", item.filename, item.verdict.as_str(), item.engine);
    }
    out.push('\n');

    for item in files {
        let _ = writeln!(out, "## {}", item.filename);
        let _ = writeln!(out, "- Verdict: **{}**", item.verdict.as_str());
        let _ = writeln!(out, "- Engine: `{}`", item.engine);
        let message = if item.message.is_empty() { "n/a" } else { &item.message };
        let _ = writeln!(out, "- Message: {message}");
        out.push_str("- Obligations:\n");
        for obligation in &item.obligations {
            let _ = writeln!(out, "  - `{}`: {}", obligation.id, obligation.property);
        }
        out.push_str("- Assumptions:\n");
        for assumption in &item.assumptions {
            let _ = writeln!(
                out,
                "  - `{}` ({}:{})",
                assumption.property, assumption.source_type, assumption.source_ref
            );
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Verdict;

    #[test]
    fn renders_a_row_per_file() {
        let files = vec![FileReport {
            filename: "withdraw.py".to_string(),
            verdict: Verdict::VERIFIED,
            obligations: Vec::new(),
            assumptions: Vec::new(),
            engine: "lean".to_string(),
            message: String::new(),
        }];
        let markdown = render_markdown_report(&files);
        assert!(markdown.contains("| `withdraw.py` | VERIFIED | lean |"));
        assert!(markdown.contains("- Message: n/a"));
    }
}
