//! Coarse, stable process exit codes. The pipeline's own pass/fail
//! judgment stays inside the JSON/Markdown/SARIF reports; the exit code
//! only needs to tell a CI runner whether to go green or red.

/// Every audited file reached VERIFIED or FIXED, and every requested CI
/// gate (if any) passed.
pub const EXIT_SUCCESS: i32 = 0;

/// At least one file is VULNERABLE, UNVERIFIED, or ERROR, or a requested
/// CI gate failed.
pub const EXIT_FINDINGS: i32 = 1;

/// The invocation itself was malformed: a bad flag, an unreadable file,
/// an unparsable ignore pattern. Never used for a verification outcome.
pub const EXIT_CONFIG_ERROR: i32 = 2;
