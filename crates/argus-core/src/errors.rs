//! Stable error taxonomy shared by every pipeline stage.
//!
//! Shaped the way the rest of this codebase's error types are shaped: one
//! kind enum, one struct carrying the kind plus optional context, and a
//! stable string code that shows up verbatim in trace artifacts and CLI
//! diagnostics so a `grep` for `E_VERIFIER_TIMEOUT` finds every place that
//! can produce it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgusErrorKind {
    PolicyParse,
    TranslationFailed,
    GuardFailure,
    VerifierSpawnOrTimeout,
    RepairFailed,
    AssumptionEvidenceFailed,
    ConfigError,
}

impl ArgusErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ArgusErrorKind::PolicyParse => "E_POLICY_PARSE",
            ArgusErrorKind::TranslationFailed => "E_TRANSLATION_FAILED",
            ArgusErrorKind::GuardFailure => "E_GUARD_FAILURE",
            ArgusErrorKind::VerifierSpawnOrTimeout => "E_VERIFIER_TIMEOUT",
            ArgusErrorKind::RepairFailed => "E_REPAIR_FAILED",
            ArgusErrorKind::AssumptionEvidenceFailed => "E_ASSUMPTION_EVIDENCE",
            ArgusErrorKind::ConfigError => "E_CONFIG",
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind_code}: {message}")]
pub struct ArgusError {
    pub kind: ArgusErrorKind,
    #[serde(skip)]
    kind_code: &'static str,
    pub message: String,
    pub path: Option<String>,
    pub detail: Option<String>,
}

impl ArgusError {
    pub fn new(kind: ArgusErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            kind_code: kind.code(),
            message: message.into(),
            path: None,
            detail: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn policy_parse(detail: impl Into<String>) -> Self {
        Self::new(ArgusErrorKind::PolicyParse, "source failed to parse").with_detail(detail)
    }

    pub fn translation_failed(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ArgusErrorKind::TranslationFailed, detail.clone()).with_detail(detail)
    }

    pub fn guard_failure(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ArgusErrorKind::GuardFailure, detail.clone()).with_detail(detail)
    }

    pub fn verifier_timeout(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ArgusErrorKind::VerifierSpawnOrTimeout, detail.clone()).with_detail(detail)
    }

    pub fn repair_failed(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ArgusErrorKind::RepairFailed, detail.clone()).with_detail(detail)
    }

    pub fn assumption_evidence(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ArgusErrorKind::AssumptionEvidenceFailed, detail.clone()).with_detail(detail)
    }

    pub fn config(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ArgusErrorKind::ConfigError, detail.clone()).with_detail(detail)
    }
}
