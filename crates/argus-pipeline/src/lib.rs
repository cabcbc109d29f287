//! Per-file verification orchestrator: wires together discovery,
//! translation, the semantic guard, verification, and the bounded repair
//! loop, and persists every stage's output to the on-disk trace store.

pub mod orchestrator;
pub mod trace;

pub use orchestrator::{ArgusPipeline, FileReport, PipelineConfig, PipelineResult};
pub use trace::TraceStore;
