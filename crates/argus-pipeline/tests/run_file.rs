use argus_core::Verdict;
use argus_pipeline::{ArgusPipeline, PipelineConfig};

#[tokio::test]
async fn unsupported_construct_routes_to_unverified() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ArgusPipeline::new(PipelineConfig {
        trace_root: dir.path().to_path_buf(),
        allow_repair: false,
        ..PipelineConfig::default()
    });

    let result = pipeline
        .run_file("async_example.py", "async def worker():\n    return 1\n")
        .await;

    assert_eq!(result.verdict, Verdict::UNVERIFIED);
    assert_eq!(result.engine, "n/a");
}

#[tokio::test]
async fn docker_gated_verification_surfaces_as_error() {
    std::env::remove_var("ARGUS_ALLOW_LOCAL_VERIFY");
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ArgusPipeline::new(PipelineConfig {
        trace_root: dir.path().to_path_buf(),
        allow_repair: false,
        require_docker_verify: true,
        ..PipelineConfig::default()
    });

    if std::path::Path::new("/.dockerenv").exists() {
        return;
    }

    let result = pipeline
        .run_file("withdraw.py", "def withdraw(balance, amount):\n    return balance - amount\n")
        .await;

    assert_eq!(result.verdict, Verdict::ERROR);
}

#[tokio::test]
async fn trace_artifacts_are_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ArgusPipeline::new(PipelineConfig {
        trace_root: dir.path().to_path_buf(),
        allow_repair: false,
        ..PipelineConfig::default()
    });

    pipeline
        .run_file("withdraw.py", "def withdraw(balance, amount):\n    return balance - amount\n")
        .await;

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(!entries.is_empty(), "expected at least one run directory to be created");
}
