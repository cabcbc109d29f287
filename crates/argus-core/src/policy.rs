//! Deterministic static analyzer: source string in, canonical obligation
//! set out. No network, no filesystem, no randomness — this is the one
//! part of the pipeline every other stage treats as ground truth.

use std::collections::{BTreeMap, BTreeSet};

use rustpython_parser::ast::{self, Expr, Operator, Stmt};
use rustpython_parser::Parse;
use sha2::{Digest, Sha256};

use crate::models::{Obligation, ObligationCategory, Severity};

const NUMERIC_HINT_NAMES: &[&str] = &["balance", "amount", "total", "count", "value"];
const STATE_HINT_NAMES: &[&str] = &["state", "status", "level"];

/// Output of one obligation derivation. `unsupported_constructs` is
/// populated independently of `obligations` — a file can have both, or
/// either, or neither.
#[derive(Debug, Clone, Default)]
pub struct ObligationPolicyResult {
    pub obligations: Vec<Obligation>,
    pub unsupported_constructs: Vec<String>,
}

impl ObligationPolicyResult {
    /// SHA-256 over a deterministic, key-sorted serialization of the
    /// sorted obligation set. Stable across process invocations given the
    /// same input — the property the reproducibility and determinism
    /// gates exist to check.
    pub fn canonical_hash(&self) -> String {
        let mut sorted = self.obligations.clone();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        let payload: Vec<BTreeMap<&'static str, serde_json::Value>> =
            sorted.iter().map(Obligation::canonical_fields).collect();
        let raw = serde_json::to_string(&payload).expect("canonical payload always serializes");
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Deterministic canonical obligation generation over Python source.
///
/// LLM output is advisory elsewhere in the pipeline; pass criteria are
/// produced here and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObligationPolicy;

impl ObligationPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(&self, source: &str) -> ObligationPolicyResult {
        let suite = match ast::Suite::parse(source, "<argus>") {
            Ok(suite) => suite,
            Err(_) => {
                return ObligationPolicyResult {
                    obligations: Vec::new(),
                    unsupported_constructs: vec!["syntax_error".to_string()],
                }
            }
        };

        let mut unsupported: BTreeSet<String> = BTreeSet::new();
        for stmt in &suite {
            collect_unsupported_stmt(stmt, &mut unsupported);
        }

        let mut by_id: BTreeMap<String, Obligation> = BTreeMap::new();
        for stmt in &suite {
            if let Stmt::FunctionDef(def) = stmt {
                for obligation in derive_function_obligations(def) {
                    by_id.insert(obligation.id.clone(), obligation);
                }
            }
        }

        ObligationPolicyResult {
            obligations: by_id.into_values().collect(),
            unsupported_constructs: unsupported.into_iter().collect(),
        }
    }
}

fn collect_unsupported_stmt(stmt: &Stmt, out: &mut BTreeSet<String>) {
    match stmt {
        Stmt::AsyncFunctionDef(def) => {
            out.insert("async_function".to_string());
            for s in &def.body {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::ClassDef(def) => {
            out.insert("class_definition".to_string());
            for s in &def.body {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::FunctionDef(def) => {
            for s in &def.body {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::If(node) => {
            collect_unsupported_expr(&node.test, out);
            for s in &node.body {
                collect_unsupported_stmt(s, out);
            }
            for s in &node.orelse {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::For(node) => {
            collect_unsupported_expr(&node.iter, out);
            for s in &node.body {
                collect_unsupported_stmt(s, out);
            }
            for s in &node.orelse {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::While(node) => {
            collect_unsupported_expr(&node.test, out);
            for s in &node.body {
                collect_unsupported_stmt(s, out);
            }
            for s in &node.orelse {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::Return(node) => {
            if let Some(value) = &node.value {
                collect_unsupported_expr(value, out);
            }
        }
        Stmt::Assign(node) => collect_unsupported_expr(&node.value, out),
        Stmt::AugAssign(node) => collect_unsupported_expr(&node.value, out),
        Stmt::Expr(node) => collect_unsupported_expr(&node.value, out),
        Stmt::Try(node) => {
            for s in &node.body {
                collect_unsupported_stmt(s, out);
            }
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                for s in &handler.body {
                    collect_unsupported_stmt(s, out);
                }
            }
            for s in &node.orelse {
                collect_unsupported_stmt(s, out);
            }
            for s in &node.finalbody {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::With(node) => {
            for item in &node.items {
                collect_unsupported_expr(&item.context_expr, out);
            }
            for s in &node.body {
                collect_unsupported_stmt(s, out);
            }
        }
        Stmt::Match(node) => {
            collect_unsupported_expr(&node.subject, out);
            for case in &node.cases {
                if let Some(guard) = &case.guard {
                    collect_unsupported_expr(guard, out);
                }
                for s in &case.body {
                    collect_unsupported_stmt(s, out);
                }
            }
        }
        _ => {}
    }
}

fn collect_unsupported_expr(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Yield(node) => {
            out.insert("generator_yield".to_string());
            if let Some(value) = &node.value {
                collect_unsupported_expr(value, out);
            }
        }
        Expr::YieldFrom(node) => {
            out.insert("generator_yield".to_string());
            collect_unsupported_expr(&node.value, out);
        }
        Expr::Await(node) => {
            out.insert("await_expression".to_string());
            collect_unsupported_expr(&node.value, out);
        }
        Expr::BinOp(node) => {
            collect_unsupported_expr(&node.left, out);
            collect_unsupported_expr(&node.right, out);
        }
        Expr::UnaryOp(node) => collect_unsupported_expr(&node.operand, out),
        Expr::Compare(node) => {
            collect_unsupported_expr(&node.left, out);
            for comparator in &node.comparators {
                collect_unsupported_expr(comparator, out);
            }
        }
        Expr::Call(node) => {
            collect_unsupported_expr(&node.func, out);
            for arg in &node.args {
                collect_unsupported_expr(arg, out);
            }
        }
        Expr::Subscript(node) => {
            collect_unsupported_expr(&node.value, out);
            collect_unsupported_expr(&node.slice, out);
        }
        Expr::Attribute(node) => collect_unsupported_expr(&node.value, out),
        Expr::List(node) => {
            for elt in &node.elts {
                collect_unsupported_expr(elt, out);
            }
        }
        Expr::Tuple(node) => {
            for elt in &node.elts {
                collect_unsupported_expr(elt, out);
            }
        }
        Expr::BoolOp(node) => {
            for value in &node.values {
                collect_unsupported_expr(value, out);
            }
        }
        Expr::IfExp(node) => {
            collect_unsupported_expr(&node.test, out);
            collect_unsupported_expr(&node.body, out);
            collect_unsupported_expr(&node.orelse, out);
        }
        Expr::NamedExpr(node) => collect_unsupported_expr(&node.value, out),
        Expr::Lambda(node) => collect_unsupported_expr(&node.body, out),
        Expr::ListComp(node) => {
            collect_unsupported_expr(&node.elt, out);
            for generator in &node.generators {
                collect_unsupported_comprehension(generator, out);
            }
        }
        Expr::SetComp(node) => {
            collect_unsupported_expr(&node.elt, out);
            for generator in &node.generators {
                collect_unsupported_comprehension(generator, out);
            }
        }
        Expr::GeneratorExp(node) => {
            collect_unsupported_expr(&node.elt, out);
            for generator in &node.generators {
                collect_unsupported_comprehension(generator, out);
            }
        }
        Expr::DictComp(node) => {
            collect_unsupported_expr(&node.key, out);
            collect_unsupported_expr(&node.value, out);
            for generator in &node.generators {
                collect_unsupported_comprehension(generator, out);
            }
        }
        _ => {}
    }
}

fn collect_unsupported_comprehension(generator: &ast::Comprehension, out: &mut BTreeSet<String>) {
    collect_unsupported_expr(&generator.iter, out);
    for if_clause in &generator.ifs {
        collect_unsupported_expr(if_clause, out);
    }
}

struct FunctionShape {
    has_loop: bool,
    has_subscript: bool,
    has_minus: bool,
    has_list_append: bool,
    has_concat_append: bool,
}

fn derive_function_obligations(def: &ast::StmtFunctionDef) -> Vec<Obligation> {
    let param_names: Vec<String> = def
        .args
        .args
        .iter()
        .map(|arg| arg.def.arg.as_str().to_lowercase())
        .collect();
    let param_set: BTreeSet<&str> = param_names.iter().map(String::as_str).collect();

    let shape = scan_function_body(&def.body);
    let has_state_hint = STATE_HINT_NAMES.iter().any(|hint| param_set.contains(hint));
    let has_numeric_hint = NUMERIC_HINT_NAMES.iter().any(|hint| param_set.contains(hint));

    let fn_name = def.name.as_str();
    let mut obligations = Vec::new();

    if shape.has_minus || has_numeric_hint {
        obligations.push(Obligation::new(
            format!("{fn_name}:non_negative_result"),
            format!("{fn_name}(...) >= 0"),
            ObligationCategory::NonNegativity,
            "Result should remain non-negative under validated inputs",
            Severity::Critical,
        ));
    }

    if shape.has_subscript {
        obligations.push(Obligation::new(
            format!("{fn_name}:bounds_safe_access"),
            "All index operations are bounds-safe",
            ObligationCategory::Bounds,
            "Indexing operations must not access out-of-range elements",
            Severity::Critical,
        ));
    }

    if shape.has_list_append || shape.has_concat_append {
        obligations.push(Obligation::new(
            format!("{fn_name}:preserve_uniqueness"),
            "Collection updates preserve uniqueness where required",
            ObligationCategory::Uniqueness,
            "List/set update patterns should avoid duplicate insertion",
            Severity::High,
        ));
    }

    if shape.has_loop {
        obligations.push(Obligation::new(
            format!("{fn_name}:loop_progress_and_safety"),
            "Loop preserves invariants and terminates",
            ObligationCategory::LoopInvariant,
            "Loop variables should stay in valid ranges with valid progress",
            Severity::High,
        ));
    }

    if has_state_hint {
        obligations.push(Obligation::new(
            format!("{fn_name}:valid_state_transition"),
            "State transitions remain within policy",
            ObligationCategory::StateTransition,
            "State-like values must follow allowed transition rules",
            Severity::High,
        ));
    }

    obligations
}

fn scan_function_body(body: &[Stmt]) -> FunctionShape {
    let mut shape = FunctionShape {
        has_loop: false,
        has_subscript: false,
        has_minus: false,
        has_list_append: false,
        has_concat_append: false,
    };
    for stmt in body {
        scan_stmt(stmt, &mut shape);
    }
    shape
}

fn scan_stmt(stmt: &Stmt, shape: &mut FunctionShape) {
    match stmt {
        Stmt::For(node) => {
            shape.has_loop = true;
            scan_expr(&node.iter, shape);
            for s in &node.body {
                scan_stmt(s, shape);
            }
            for s in &node.orelse {
                scan_stmt(s, shape);
            }
        }
        Stmt::While(node) => {
            shape.has_loop = true;
            scan_expr(&node.test, shape);
            for s in &node.body {
                scan_stmt(s, shape);
            }
            for s in &node.orelse {
                scan_stmt(s, shape);
            }
        }
        Stmt::If(node) => {
            scan_expr(&node.test, shape);
            for s in &node.body {
                scan_stmt(s, shape);
            }
            for s in &node.orelse {
                scan_stmt(s, shape);
            }
        }
        Stmt::Return(node) => {
            if let Some(value) = &node.value {
                scan_expr(value, shape);
            }
        }
        Stmt::Assign(node) => {
            for target in &node.targets {
                scan_expr(target, shape);
            }
            scan_expr(&node.value, shape);
        }
        Stmt::AugAssign(node) => {
            scan_expr(&node.target, shape);
            scan_expr(&node.value, shape);
        }
        Stmt::Expr(node) => scan_expr(&node.value, shape),
        Stmt::FunctionDef(nested) => {
            for s in &nested.body {
                scan_stmt(s, shape);
            }
        }
        Stmt::Try(node) => {
            for s in &node.body {
                scan_stmt(s, shape);
            }
            for handler in &node.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                for s in &handler.body {
                    scan_stmt(s, shape);
                }
            }
            for s in &node.orelse {
                scan_stmt(s, shape);
            }
            for s in &node.finalbody {
                scan_stmt(s, shape);
            }
        }
        Stmt::With(node) => {
            for item in &node.items {
                scan_expr(&item.context_expr, shape);
            }
            for s in &node.body {
                scan_stmt(s, shape);
            }
        }
        Stmt::Match(node) => {
            scan_expr(&node.subject, shape);
            for case in &node.cases {
                if let Some(guard) = &case.guard {
                    scan_expr(guard, shape);
                }
                for s in &case.body {
                    scan_stmt(s, shape);
                }
            }
        }
        _ => {}
    }
}

fn scan_expr(expr: &Expr, shape: &mut FunctionShape) {
    match expr {
        Expr::Subscript(node) => {
            shape.has_subscript = true;
            scan_expr(&node.value, shape);
            scan_expr(&node.slice, shape);
        }
        Expr::BinOp(node) => {
            if matches!(node.op, Operator::Sub) {
                shape.has_minus = true;
            }
            if matches!(node.op, Operator::Add) {
                if let Expr::List(list) = node.right.as_ref() {
                    if list.elts.len() == 1 {
                        shape.has_concat_append = true;
                    }
                }
            }
            scan_expr(&node.left, shape);
            scan_expr(&node.right, shape);
        }
        Expr::Call(node) => {
            if let Expr::Attribute(attr) = node.func.as_ref() {
                if attr.attr.as_str() == "append" {
                    shape.has_list_append = true;
                }
                scan_expr(&attr.value, shape);
            } else {
                scan_expr(&node.func, shape);
            }
            for arg in &node.args {
                scan_expr(arg, shape);
            }
        }
        Expr::Compare(node) => {
            scan_expr(&node.left, shape);
            for comparator in &node.comparators {
                scan_expr(comparator, shape);
            }
        }
        Expr::UnaryOp(node) => scan_expr(&node.operand, shape),
        Expr::List(node) => {
            for elt in &node.elts {
                scan_expr(elt, shape);
            }
        }
        Expr::Tuple(node) => {
            for elt in &node.elts {
                scan_expr(elt, shape);
            }
        }
        Expr::Attribute(node) => scan_expr(&node.value, shape),
        Expr::BoolOp(node) => {
            for value in &node.values {
                scan_expr(value, shape);
            }
        }
        Expr::IfExp(node) => {
            scan_expr(&node.test, shape);
            scan_expr(&node.body, shape);
            scan_expr(&node.orelse, shape);
        }
        Expr::NamedExpr(node) => scan_expr(&node.value, shape),
        Expr::Lambda(node) => scan_expr(&node.body, shape),
        Expr::ListComp(node) => {
            scan_expr(&node.elt, shape);
            for generator in &node.generators {
                scan_comprehension(generator, shape);
            }
        }
        Expr::SetComp(node) => {
            scan_expr(&node.elt, shape);
            for generator in &node.generators {
                scan_comprehension(generator, shape);
            }
        }
        Expr::GeneratorExp(node) => {
            scan_expr(&node.elt, shape);
            for generator in &node.generators {
                scan_comprehension(generator, shape);
            }
        }
        Expr::DictComp(node) => {
            scan_expr(&node.key, shape);
            scan_expr(&node.value, shape);
            for generator in &node.generators {
                scan_comprehension(generator, shape);
            }
        }
        _ => {}
    }
}

fn scan_comprehension(generator: &ast::Comprehension, shape: &mut FunctionShape) {
    scan_expr(&generator.iter, shape);
    for if_clause in &generator.ifs {
        scan_expr(if_clause, shape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdraw_yields_non_negative_obligation() {
        let policy = ObligationPolicy::new();
        let result = policy.derive(
            "def withdraw(balance, amount):\n    return balance - amount\n",
        );
        assert!(result.unsupported_constructs.is_empty());
        assert_eq!(result.obligations.len(), 1);
        assert_eq!(result.obligations[0].id, "withdraw:non_negative_result");
    }

    #[test]
    fn bounds_and_loop_obligations_combine() {
        let policy = ObligationPolicy::new();
        let result = policy.derive(
            "def total(xs):\n    s = 0\n    for x in xs:\n        s += x\n    return s\n",
        );
        let ids: BTreeSet<&str> = result.obligations.iter().map(|o| o.id.as_str()).collect();
        assert!(ids.contains("total:loop_progress_and_safety"));
    }

    #[test]
    fn async_function_is_unsupported() {
        let policy = ObligationPolicy::new();
        let result = policy.derive("async def worker():\n    return 1\n");
        assert_eq!(result.unsupported_constructs, vec!["async_function".to_string()]);
    }

    #[test]
    fn syntax_error_yields_single_marker() {
        let policy = ObligationPolicy::new();
        let result = policy.derive("def broken(:\n");
        assert_eq!(result.unsupported_constructs, vec!["syntax_error".to_string()]);
        assert!(result.obligations.is_empty());
    }

    #[test]
    fn subscript_inside_try_body_is_detected() {
        let policy = ObligationPolicy::new();
        let result = policy.derive(
            "def safe_get(xs, i):\n    try:\n        return xs[i]\n    except IndexError:\n        return -1\n",
        );
        let ids: BTreeSet<&str> = result.obligations.iter().map(|o| o.id.as_str()).collect();
        assert!(ids.contains("safe_get:bounds_safe_access"));
    }

    #[test]
    fn subscript_inside_ternary_is_detected() {
        let policy = ObligationPolicy::new();
        let result = policy.derive("def get_item(xs, i):\n    return xs[i] if i < len(xs) else -1\n");
        let ids: BTreeSet<&str> = result.obligations.iter().map(|o| o.id.as_str()).collect();
        assert!(ids.contains("get_item:bounds_safe_access"));
    }

    #[test]
    fn canonical_hash_is_stable_across_invocations() {
        let policy = ObligationPolicy::new();
        let source = "def withdraw(balance, amount):\n    return balance - amount\n";
        let first = policy.derive(source).canonical_hash();
        let second = policy.derive(source).canonical_hash();
        let third = policy.derive(source).canonical_hash();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }
}
