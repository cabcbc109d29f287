//! One-shot verification engine selection. Chosen once per file, before
//! translation or verification runs, and never revisited after a failure —
//! there is no "try Lean, fall back to Dafny" path once this has returned.

use rustpython_parser::ast::{self, Stmt};
use rustpython_parser::Parse;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Lean,
    Dafny,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Lean => "lean",
            Engine::Dafny => "dafny",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSelection {
    pub engine: Engine,
    pub reason: &'static str,
}

/// Dafny is picked when the source contains a `for`/`while` loop anywhere;
/// everything else routes to Lean, including code that fails to parse (the
/// translator and verifier stages will surface the parse error themselves).
pub fn select_engine(python_code: &str) -> EngineSelection {
    let Ok(suite) = ast::Suite::parse(python_code, "<argus>") else {
        return EngineSelection {
            engine: Engine::Lean,
            reason: "syntax_error_fallback",
        };
    };

    if suite.iter().any(stmt_has_loop) {
        EngineSelection {
            engine: Engine::Dafny,
            reason: "loop_detected",
        }
    } else {
        EngineSelection {
            engine: Engine::Lean,
            reason: "non_loop_code",
        }
    }
}

fn stmt_has_loop(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::For(_) | Stmt::While(_) => true,
        Stmt::If(node) => {
            node.body.iter().any(stmt_has_loop) || node.orelse.iter().any(stmt_has_loop)
        }
        Stmt::FunctionDef(def) => def.body.iter().any(stmt_has_loop),
        Stmt::AsyncFunctionDef(def) => def.body.iter().any(stmt_has_loop),
        Stmt::ClassDef(def) => def.body.iter().any(stmt_has_loop),
        Stmt::Try(node) => {
            node.body.iter().any(stmt_has_loop)
                || node.handlers.iter().any(|handler| {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    handler.body.iter().any(stmt_has_loop)
                })
                || node.orelse.iter().any(stmt_has_loop)
                || node.finalbody.iter().any(stmt_has_loop)
        }
        Stmt::With(node) => node.body.iter().any(stmt_has_loop),
        Stmt::Match(node) => node.cases.iter().any(|case| case.body.iter().any(stmt_has_loop)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_routes_to_dafny() {
        let selection = select_engine("def total(xs):\n    s = 0\n    for x in xs:\n        s += x\n    return s\n");
        assert_eq!(selection.engine, Engine::Dafny);
        assert_eq!(selection.reason, "loop_detected");
    }

    #[test]
    fn non_loop_routes_to_lean() {
        let selection = select_engine("def withdraw(balance, amount):\n    return balance - amount\n");
        assert_eq!(selection.engine, Engine::Lean);
    }

    #[test]
    fn nested_loop_inside_branch_is_detected() {
        let selection = select_engine(
            "def scan(xs, flag):\n    if flag:\n        for x in xs:\n            pass\n    return 0\n",
        );
        assert_eq!(selection.engine, Engine::Dafny);
    }

    #[test]
    fn loop_inside_with_block_is_detected() {
        let selection = select_engine(
            "def scan(path):\n    with open(path) as fh:\n        for line in fh:\n            pass\n    return 0\n",
        );
        assert_eq!(selection.engine, Engine::Dafny);
        assert_eq!(selection.reason, "loop_detected");
    }

    #[test]
    fn syntax_error_falls_back_to_lean() {
        let selection = select_engine("def broken(:\n");
        assert_eq!(selection.engine, Engine::Lean);
        assert_eq!(selection.reason, "syntax_error_fallback");
    }
}
