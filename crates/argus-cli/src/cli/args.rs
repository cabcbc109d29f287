use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "argus",
    version,
    about = "Neuro-symbolic verification gate: proves or disproves safety obligations for changed Python code"
)]
pub struct Cli {
    /// Audit exactly this file instead of discovering eligible files under `--repo-path`.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Root of the repository to scan when `--file` is not given.
    #[arg(long, default_value = ".")]
    pub repo_path: PathBuf,

    /// `single` audits every eligible file under `--repo-path`; `ci` additionally
    /// honors `--base-ref` for diff-based selection.
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    pub mode: Mode,

    /// Only in `ci` mode: restrict the file set to `git diff --name-only <base-ref>...HEAD`.
    #[arg(long)]
    pub base_ref: Option<String>,

    /// Write the compact JSON report here.
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Write the human Markdown report here.
    #[arg(long)]
    pub output_md: Option<PathBuf>,

    /// Write the SARIF 2.1.0 report here.
    #[arg(long)]
    pub output_sarif: Option<PathBuf>,

    /// Write the GitLab SAST report here.
    #[arg(long)]
    pub output_gl_sast: Option<PathBuf>,

    /// Run the CI integrity suite and write its gate report here.
    #[arg(long)]
    pub output_ci_gates: Option<PathBuf>,

    /// Root of the seeded-benchmark manifest, required for the seeded-benchmark gate.
    #[arg(long)]
    pub benchmark_root: Option<PathBuf>,

    /// Where the pipeline persists per-run trace artifacts.
    #[arg(long, default_value = ".argus-trace")]
    pub trace_root: PathBuf,

    /// Bypass the in-container requirement for the Lean/Dafny verifiers.
    #[arg(long)]
    pub allow_local_verify: bool,

    /// Don't post a merge-request comment even if forge environment variables are present.
    #[arg(long)]
    pub skip_gitlab_publish: bool,

    /// Gemini model used for invariant discovery, translation fallback, and repair.
    #[arg(long, default_value = "gemini-2.5-pro")]
    pub model: String,

    /// Disable the bounded LLM repair loop entirely.
    #[arg(long)]
    pub no_repair: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Single,
    Ci,
}
