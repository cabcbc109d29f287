use std::path::Path;

use argus_pipeline::{ArgusPipeline, FileReport, PipelineConfig};
use argus_report::{render_gl_sast_report, render_json_report, render_markdown_report, render_sarif_report};

use crate::cli::args::Cli;
use crate::discovery::select_files;
use crate::exit_codes::{EXIT_CONFIG_ERROR, EXIT_FINDINGS, EXIT_SUCCESS};
use crate::gitlab::publish_mr_comment;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    if cli.allow_local_verify {
        std::env::set_var("ARGUS_ALLOW_LOCAL_VERIFY", "true");
    }

    let paths = match select_files(&cli) {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("fatal: {err:?}");
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let code = match std::fs::read_to_string(path) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("fatal: cannot read {}: {err}", path.display());
                return Ok(EXIT_CONFIG_ERROR);
            }
        };
        files.push((relative_label(path, &cli.repo_path), code));
    }

    let pipeline = ArgusPipeline::new(PipelineConfig {
        model: cli.model.clone(),
        trace_root: cli.trace_root.clone(),
        allow_repair: !cli.no_repair,
        require_docker_verify: !cli.allow_local_verify,
        ..PipelineConfig::default()
    });

    let (reports, run_id) = pipeline.run_many(&files).await;

    write_outputs(&cli, &reports).await?;

    let mut gates_passed = true;
    if let Some(gates_path) = &cli.output_ci_gates {
        gates_passed = run_and_write_ci_gates(&cli, &files, &reports, &run_id, gates_path).await?;
    }

    if let Err(err) = publish_mr_comment(&reports, cli.skip_gitlab_publish).await {
        tracing::warn!("gitlab publish failed: {err:?}");
    }

    let all_passing = reports.iter().all(|r| r.verdict.is_passing());
    if all_passing && gates_passed {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FINDINGS)
    }
}

fn relative_label(path: &Path, repo_path: &Path) -> String {
    path.strip_prefix(repo_path).unwrap_or(path).to_string_lossy().into_owned()
}

async fn write_outputs(cli: &Cli, reports: &[FileReport]) -> anyhow::Result<()> {
    if let Some(path) = &cli.output_json {
        let payload = render_json_report(reports);
        tokio::fs::write(path, serde_json::to_string_pretty(&payload)?).await?;
    }
    if let Some(path) = &cli.output_md {
        tokio::fs::write(path, render_markdown_report(reports)).await?;
    }
    if let Some(path) = &cli.output_sarif {
        let payload = render_sarif_report(reports);
        tokio::fs::write(path, serde_json::to_string_pretty(&payload)?).await?;
    }
    if let Some(path) = &cli.output_gl_sast {
        let payload = render_gl_sast_report(reports);
        tokio::fs::write(path, serde_json::to_string_pretty(&payload)?).await?;
    }
    Ok(())
}

async fn run_and_write_ci_gates(
    cli: &Cli,
    files: &[(String, String)],
    reports: &[FileReport],
    run_id: &str,
    gates_path: &Path,
) -> anyhow::Result<bool> {
    let gate_report = argus_integrity::run_ci_integrity_suite(
        files,
        reports,
        &cli.trace_root,
        Some(run_id),
        cli.benchmark_root.as_deref(),
    )
    .await;

    let payload = serde_json::json!({
        "passed": gate_report.passed,
        "gates": gate_report.gates.iter().map(|g| serde_json::json!({
            "name": g.name,
            "passed": g.passed,
            "details": g.details,
        })).collect::<Vec<_>>(),
    });
    tokio::fs::write(gates_path, serde_json::to_string_pretty(&payload)?).await?;
    Ok(gate_report.passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_label_strips_repo_prefix() {
        let repo = Path::new("/tmp/repo");
        let path = Path::new("/tmp/repo/src/a.py");
        assert_eq!(relative_label(path, repo), "src/a.py");
    }
}
