//! Argus proves things about other people's code; this crate proves
//! things about Argus. Ten gates check the pipeline's own soundness
//! claims — determinism, assumption evidence, mutation kill rate,
//! traceability — independently of any single file's verdict.

pub mod benchmark;
pub mod gates;
pub mod mutation;
pub mod suite;

pub use gates::GateResult;
pub use suite::{run_ci_integrity_suite, CIGateReport};
