//! Verifier drivers: subprocess-backed Lean and Dafny engines behind a
//! single fail-closed container gate, plus the scratch-file RAII guard
//! they share.

pub mod base;
pub mod dafny;
pub mod lean;
pub mod scratch;

pub use base::{local_verify_allowed, running_in_container, VerifierDriver};
pub use dafny::DafnyVerifier;
pub use lean::LeanVerifier;
pub use scratch::ScratchFile;
