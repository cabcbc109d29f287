//! Optional merge-request comment publishing. Only fires when every
//! required `CI_*`/`GITLAB_TOKEN` environment variable is present and the
//! caller hasn't passed `--skip-gitlab-publish`; a missing variable is
//! treated as "not running in a pipeline that wants this," not an error.

use argus_pipeline::FileReport;
use argus_report::render_json_report;

struct ForgeContext {
    server_url: String,
    token: String,
    project_id: String,
    merge_request_iid: String,
    commit_sha: Option<String>,
}

fn forge_context_from_env() -> Option<ForgeContext> {
    Some(ForgeContext {
        server_url: std::env::var("CI_SERVER_URL").ok()?,
        token: std::env::var("GITLAB_TOKEN").ok()?,
        project_id: std::env::var("CI_PROJECT_ID").ok()?,
        merge_request_iid: std::env::var("CI_MERGE_REQUEST_IID").ok()?,
        commit_sha: std::env::var("CI_COMMIT_SHA").ok(),
    })
}

pub fn render_mr_comment(files: &[FileReport]) -> String {
    let report = render_json_report(files);
    let summary = &report["summary"];
    let mut lines = vec![
        "## Argus Formal Verification Report".to_string(),
        String::new(),
        format!(
            "Files audited: {} | Verified: {} | Fixed: {} | Vulnerable: {} | Unverified/Error: {}",
            summary["total"],
            summary["verified"],
            summary["fixed"],
            summary["vulnerable"],
            summary["unverified"].as_u64().unwrap_or(0) + summary["error"].as_u64().unwrap_or(0),
        ),
        String::new(),
        "| File | Verdict | Finding |".to_string(),
        "|:---|:---|:---|".to_string(),
    ];
    for item in files {
        let message = if item.message.is_empty() { "n/a" } else { &item.message };
        lines.push(format!("| `{}` | {} | {} |", item.filename, item.verdict.as_str(), message));
    }
    lines.join("\n")
}

pub async fn publish_mr_comment(files: &[FileReport], skip: bool) -> anyhow::Result<()> {
    if skip {
        tracing::info!("gitlab publish skipped by --skip-gitlab-publish");
        return Ok(());
    }
    let Some(ctx) = forge_context_from_env() else {
        tracing::info!("gitlab forge environment variables not present, skipping publish");
        return Ok(());
    };

    let mut body = render_mr_comment(files);
    if let Some(sha) = &ctx.commit_sha {
        body.push_str(&format!("\n\n_Evaluated at commit `{sha}`._"));
    }
    let url = format!(
        "{}/api/v4/projects/{}/merge_requests/{}/notes",
        ctx.server_url.trim_end_matches('/'),
        ctx.project_id,
        ctx.merge_request_iid
    );

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .header("PRIVATE-TOKEN", ctx.token)
        .json(&serde_json::json!({ "body": body }))
        .send()
        .await?;

    if !response.status().is_success() {
        anyhow::bail!("gitlab publish failed with status {}", response.status());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Verdict;

    #[test]
    fn renders_summary_line_with_counts() {
        let files = vec![FileReport {
            filename: "withdraw.py".to_string(),
            verdict: Verdict::VULNERABLE,
            obligations: Vec::new(),
            assumptions: Vec::new(),
            engine: "lean".to_string(),
            message: "balance could go negative".to_string(),
        }];
        let comment = render_mr_comment(&files);
        assert!(comment.contains("Vulnerable: 1"));
        assert!(comment.contains("withdraw.py"));
    }
}
