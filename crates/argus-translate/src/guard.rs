//! Semantic Guard: a syntactic cross-check between the original Python and
//! the generated proof artifact. It cannot tell whether a proof is
//! correct, only whether it looks like it's still about the same code —
//! catching a translator that silently drops a function or a proof that
//! leans on `sorry` to close a goal.

use argus_core::{Obligation, ObligationCategory};
use regex::Regex;
use rustpython_parser::ast::{self, Stmt};
use rustpython_parser::Parse;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticGuardIssue {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SemanticGuardResult {
    pub passed: bool,
    pub issues: Vec<SemanticGuardIssue>,
}

pub fn run_semantic_guard(
    python_code: &str,
    translated_code: &str,
    obligations: &[Obligation],
) -> SemanticGuardResult {
    let mut issues = Vec::new();

    if obligations.is_empty() {
        issues.push(SemanticGuardIssue {
            code: "NO_OBLIGATIONS",
            message: "Canonical obligation set is empty".to_string(),
        });
    }

    if contains_sorry(translated_code) {
        issues.push(SemanticGuardIssue {
            code: "PROOF_SORRY",
            message: "Translated proof contains `sorry`".to_string(),
        });
    }

    if translated_code.to_lowercase().contains("unsupported") {
        issues.push(SemanticGuardIssue {
            code: "UNSUPPORTED_MARKER",
            message: "Translated artifact contains unsupported marker".to_string(),
        });
    }

    for fn_name in extract_python_function_names(python_code) {
        if !contains_function_symbol(translated_code, &fn_name) {
            issues.push(SemanticGuardIssue {
                code: "MISSING_FUNCTION_SYMBOL",
                message: format!("Translated artifact missing function symbol '{fn_name}'"),
            });
        }
    }

    for obligation in obligations {
        match obligation.category {
            ObligationCategory::Uniqueness => {
                if !translated_code.contains("Nodup") && !translated_code.contains("no_duplicates") {
                    issues.push(weak_encoding_issue("WEAK_UNIQUENESS_ENCODING", &obligation.id));
                }
            }
            ObligationCategory::Bounds => {
                let has_comparison = translated_code.contains('<') || translated_code.contains('\u{2264}');
                if !has_comparison && !translated_code.contains("index") {
                    issues.push(weak_encoding_issue("WEAK_BOUNDS_ENCODING", &obligation.id));
                }
            }
            ObligationCategory::NonNegativity => {
                if !translated_code.contains("\u{2265} 0") && !translated_code.contains(">= 0") {
                    issues.push(weak_encoding_issue("WEAK_NONNEG_ENCODING", &obligation.id));
                }
            }
            _ => {}
        }
    }

    SemanticGuardResult {
        passed: issues.is_empty(),
        issues,
    }
}

fn weak_encoding_issue(code: &'static str, obligation_id: &str) -> SemanticGuardIssue {
    SemanticGuardIssue {
        code,
        message: format!("Obligation '{obligation_id}' appears unencoded in proof artifact"),
    }
}

fn extract_python_function_names(code: &str) -> BTreeSet<String> {
    let Ok(suite) = ast::Suite::parse(code, "<argus>") else {
        return BTreeSet::new();
    };
    suite
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::FunctionDef(def) => Some(def.name.as_str().to_string()),
            _ => None,
        })
        .collect()
}

fn contains_function_symbol(translated_code: &str, fn_name: &str) -> bool {
    let pattern = format!(r"\b(def|theorem|lemma|method)\s+{}\b", regex::escape(fn_name));
    Regex::new(&pattern)
        .map(|re| re.is_match(translated_code))
        .unwrap_or(false)
}

fn contains_sorry(code: &str) -> bool {
    let comment_re = Regex::new(r"(?m)--.*$").expect("static pattern compiles");
    let stripped = comment_re.replace_all(code, "");
    let sorry_re = Regex::new(r"\bsorry\b").expect("static pattern compiles");
    sorry_re.is_match(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::Severity;

    fn obligation(id: &str, category: ObligationCategory) -> Obligation {
        Obligation::new(id, "prop", category, "desc", Severity::High)
    }

    #[test]
    fn empty_obligations_flagged() {
        let result = run_semantic_guard("def f():\n    return 0\n", "def f : Int := 0", &[]);
        assert!(!result.passed);
        assert!(result.issues.iter().any(|i| i.code == "NO_OBLIGATIONS"));
    }

    #[test]
    fn sorry_outside_comment_fails() {
        let obligations = vec![obligation("f:x", ObligationCategory::NonNegativity)];
        let code = "theorem f_x : True := by\n  sorry\n-- not sorry here";
        let result = run_semantic_guard("def f():\n    return 0\n", code, &obligations);
        assert!(result.issues.iter().any(|i| i.code == "PROOF_SORRY"));
    }

    #[test]
    fn sorry_inside_comment_only_is_ignored() {
        let obligations = vec![obligation("f:x", ObligationCategory::NonNegativity)];
        let code = "def f : Int := 0\n-- sorry, not a real tactic here\n>= 0";
        let result = run_semantic_guard("def f():\n    return 0\n", code, &obligations);
        assert!(!result.issues.iter().any(|i| i.code == "PROOF_SORRY"));
    }

    #[test]
    fn missing_function_symbol_detected() {
        let code = "theorem whatever : True := by\n  trivial";
        let result = run_semantic_guard("def withdraw():\n    return 0\n", code, &[]);
        assert!(result
            .issues
            .iter()
            .any(|i| i.code == "MISSING_FUNCTION_SYMBOL" && i.message.contains("withdraw")));
    }

    #[test]
    fn well_formed_artifact_passes() {
        let obligations = vec![obligation("withdraw:non_negative_result", ObligationCategory::NonNegativity)];
        let code = "def withdraw (balance : Int) (amount : Int) : Int :=\n  (balance - amount)\n\ntheorem withdraw_non_negative_result : True := by\n  trivial\n  -- ensures >= 0";
        let result = run_semantic_guard(
            "def withdraw(balance, amount):\n    return balance - amount\n",
            code,
            &obligations,
        );
        assert!(result.passed, "unexpected issues: {:?}", result.issues);
    }
}
