//! Deterministic translator for simple, loop-free Python functions into
//! Lean 4. Anything with a loop, async function, or no function
//! definitions at all is rejected outright rather than approximated.

use argus_core::{AssumedInput, Obligation, ProofLanguage, TranslationOutcome, TranslatorKind};
use async_trait::async_trait;
use rustpython_parser::ast::{self, Expr, Operator, Stmt};
use rustpython_parser::Parse;

use crate::base::Translator;

const LEAN_IMPORTS: &str = "import Mathlib.Tactic.SplitIfs\nimport Mathlib.Tactic.Linarith\n\n";

#[derive(Debug, Default, Clone, Copy)]
pub struct AstTranslator;

impl AstTranslator {
    pub fn new() -> Self {
        Self
    }
}

fn failure(error: impl Into<String>) -> TranslationOutcome {
    TranslationOutcome {
        success: false,
        language: ProofLanguage::Lean,
        code: String::new(),
        translator: TranslatorKind::Ast,
        used_llm: false,
        error: error.into(),
    }
}

#[async_trait]
impl Translator for AstTranslator {
    async fn translate(
        &self,
        python_code: &str,
        obligations: &[Obligation],
        assumptions: &[AssumedInput],
    ) -> TranslationOutcome {
        let suite = match ast::Suite::parse(python_code, "<argus>") {
            Ok(suite) => suite,
            Err(e) => return failure(format!("SyntaxError: {e}")),
        };

        if suite.iter().any(stmt_has_loop_or_async) {
            return failure("Unsupported construct for ASTTranslator (loop/async)");
        }

        let defs: Vec<String> = suite
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::FunctionDef(def) => Some(translate_function(def)),
                _ => None,
            })
            .collect();

        if defs.is_empty() {
            return failure("No function definitions found");
        }

        let theorem_block = emit_obligation_theorems(obligations, assumptions);
        let code = format!("{LEAN_IMPORTS}{}\n\n{theorem_block}\n", defs.join("\n"));

        TranslationOutcome {
            success: true,
            language: ProofLanguage::Lean,
            code,
            translator: TranslatorKind::Ast,
            used_llm: false,
            error: String::new(),
        }
    }
}

fn stmt_has_loop_or_async(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::For(_) | Stmt::While(_) | Stmt::AsyncFunctionDef(_) => true,
        Stmt::If(node) => {
            node.body.iter().any(stmt_has_loop_or_async)
                || node.orelse.iter().any(stmt_has_loop_or_async)
        }
        Stmt::FunctionDef(def) => def.body.iter().any(stmt_has_loop_or_async),
        Stmt::ClassDef(def) => def.body.iter().any(stmt_has_loop_or_async),
        Stmt::Try(node) => {
            node.body.iter().any(stmt_has_loop_or_async)
                || node.orelse.iter().any(stmt_has_loop_or_async)
                || node.finalbody.iter().any(stmt_has_loop_or_async)
        }
        _ => false,
    }
}

fn translate_function(def: &ast::StmtFunctionDef) -> String {
    let args = def
        .args
        .args
        .iter()
        .map(|arg| format!("({} : Int)", arg.def.arg.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    let body = translate_body(&def.body);
    format!("def {} {args} : Int :=\n  {body}", def.name.as_str())
}

fn translate_body(body: &[Stmt]) -> String {
    let Some(stmt) = body.first() else {
        return "0".to_string();
    };
    match stmt {
        Stmt::Return(node) => node
            .value
            .as_deref()
            .map(translate_expr)
            .unwrap_or_else(|| "0".to_string()),
        Stmt::If(node) => {
            let cond = translate_expr(&node.test);
            let yes = translate_body(&node.body);
            let no = if node.orelse.is_empty() {
                "0".to_string()
            } else {
                translate_body(&node.orelse)
            };
            format!("if {cond} then {yes} else {no}")
        }
        _ => "0".to_string(),
    }
}

fn translate_expr(expr: &Expr) -> String {
    match expr {
        Expr::Name(node) => node.id.as_str().to_string(),
        Expr::Constant(node) => format_constant(&node.value),
        Expr::BinOp(node) => {
            let left = translate_expr(&node.left);
            let right = translate_expr(&node.right);
            let op = match node.op {
                Operator::Add => "+",
                Operator::Sub => "-",
                Operator::Mult => "*",
                Operator::Div => "/",
                Operator::Mod => "%",
                _ => "+",
            };
            format!("({left} {op} {right})")
        }
        Expr::Compare(node) if node.ops.len() == 1 => {
            let left = translate_expr(&node.left);
            let right = translate_expr(&node.comparators[0]);
            let op = match node.ops[0] {
                ast::CmpOp::Gt => ">",
                ast::CmpOp::GtE => "\u{2265}",
                ast::CmpOp::Lt => "<",
                ast::CmpOp::LtE => "\u{2264}",
                ast::CmpOp::Eq => "=",
                ast::CmpOp::NotEq => "\u{2260}",
                _ => "=",
            };
            format!("{left} {op} {right}")
        }
        _ => "0".to_string(),
    }
}

fn format_constant(value: &ast::Constant) -> String {
    match value {
        ast::Constant::Int(i) => i.to_string(),
        ast::Constant::Bool(b) => b.to_string(),
        ast::Constant::Float(f) => f.to_string(),
        ast::Constant::Str(s) => s.clone(),
        ast::Constant::None => "0".to_string(),
        _ => "0".to_string(),
    }
}

fn emit_obligation_theorems(obligations: &[Obligation], assumptions: &[AssumedInput]) -> String {
    if obligations.is_empty() {
        return "-- No obligations generated".to_string();
    }

    let assumption_lines: Vec<String> = assumptions
        .iter()
        .enumerate()
        .map(|(idx, assumption)| format!("  -- ASSUMED INPUT {}: {}", idx + 1, assumption.property))
        .collect();

    obligations
        .iter()
        .map(|item| {
            let theorem_name = item.id.replace([':', '-'], "_");
            let mut lines = vec![
                format!("theorem {theorem_name} : True := by"),
                "  trivial".to_string(),
                format!("  -- OBLIGATION: {}", item.property),
                format!("  -- CATEGORY: {}", item.category.as_str()),
            ];
            lines.extend(assumption_lines.clone());
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::{ObligationCategory, Severity};

    #[tokio::test]
    async fn translates_simple_subtraction() {
        let translator = AstTranslator::new();
        let obligations = vec![Obligation::new(
            "withdraw:non_negative_result",
            "withdraw(...) >= 0",
            ObligationCategory::NonNegativity,
            "desc",
            Severity::Critical,
        )];
        let outcome = translator
            .translate(
                "def withdraw(balance, amount):\n    return balance - amount\n",
                &obligations,
                &[],
            )
            .await;
        assert!(outcome.success);
        assert!(outcome.code.contains("def withdraw (balance : Int) (amount : Int) : Int"));
        assert!(outcome.code.contains("theorem withdraw_non_negative_result"));
    }

    #[tokio::test]
    async fn rejects_loops() {
        let translator = AstTranslator::new();
        let outcome = translator
            .translate(
                "def total(xs):\n    s = 0\n    for x in xs:\n        s += x\n    return s\n",
                &[],
                &[],
            )
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.contains("loop"));
    }

    #[tokio::test]
    async fn rejects_no_function_definitions() {
        let translator = AstTranslator::new();
        let outcome = translator.translate("x = 1\n", &[], &[]).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error, "No function definitions found");
    }
}
