//! The two-pass `has_call` annotation that precedes lowering.
//!
//! A bottom-up pass marks every subtree that contains a `FunctionCall`; a
//! top-down pass then pushes that flag onto every child of a node whose own
//! subtree contains a call, so operands that must survive a call get lowered
//! into the callee-saved pool instead of the volatile one.

use lumenc_par::ast::{Block, ElseBranch, Expr, ExprKind, FunctionDef, IfStmt, Stmt, WhileStmt};

/// Bottom-up: sets `has_call` true on every node whose subtree contains a
/// call, leaving it false elsewhere. Returns the computed flag for `e`.
fn mark_bottom_up(e: &mut Expr) -> bool {
    let contains_call = match &mut e.kind {
        ExprKind::Value(_) | ExprKind::Variable(_) => false,
        ExprKind::Wrapper(inner) => mark_bottom_up(inner),
        ExprKind::Unary { operand, .. } => mark_bottom_up(operand),
        ExprKind::BinOp { left, right, .. } => {
            let l = mark_bottom_up(left);
            let r = mark_bottom_up(right);
            l || r
        }
        ExprKind::Assign { value, .. } => mark_bottom_up(value),
        ExprKind::FunctionCall { args, .. } => {
            for arg in args.iter_mut() {
                mark_bottom_up(arg);
            }
            true
        }
    };
    e.has_call = contains_call;
    contains_call
}

/// Top-down: once a node is known to contain a call, every descendant is
/// forced `has_call = true` regardless of its own bottom-up result, so a
/// leaf sibling of a call still gets stashed in a callee-saved register.
fn push_down(e: &mut Expr, inherited: bool) {
    e.has_call |= inherited;
    let pushed = e.has_call;
    match &mut e.kind {
        ExprKind::Value(_) | ExprKind::Variable(_) => {}
        ExprKind::Wrapper(inner) => push_down(inner, pushed),
        ExprKind::Unary { operand, .. } => push_down(operand, pushed),
        ExprKind::BinOp { left, right, .. } => {
            push_down(left, pushed);
            push_down(right, pushed);
        }
        ExprKind::Assign { value, .. } => push_down(value, pushed),
        ExprKind::FunctionCall { args, .. } => {
            for arg in args.iter_mut() {
                push_down(arg, pushed);
            }
        }
    }
}

pub fn annotate_expr(e: &mut Expr) {
    mark_bottom_up(e);
    push_down(e, false);
}

pub fn annotate_block(block: &mut Block) {
    for stmt in &mut block.stmts {
        annotate_stmt(stmt);
    }
}

fn annotate_stmt(stmt: &mut Stmt) {
    match stmt {
        Stmt::Expr(e) => annotate_expr(e),
        Stmt::Block(b) => annotate_block(b),
        Stmt::While(w) => annotate_while(w),
        Stmt::If(i) => annotate_if(i),
        Stmt::Function(f) => annotate_function(f),
        Stmt::Return(e, _) => annotate_expr(e),
    }
}

fn annotate_while(w: &mut WhileStmt) {
    annotate_expr(&mut w.cond);
    annotate_block(&mut w.body);
}

fn annotate_if(i: &mut IfStmt) {
    annotate_expr(&mut i.cond);
    annotate_block(&mut i.then_body);
    match &mut i.else_branch {
        None => {}
        Some(ElseBranch::Block(b)) => annotate_block(b),
        Some(ElseBranch::If(nested)) => annotate_if(nested),
    }
}

pub fn annotate_function(f: &mut FunctionDef) {
    annotate_block(&mut f.body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenc_par::{Algorithm, Parser};
    use lumenc_sem::TypeChecker;
    use lumenc_util::Interner;

    fn parse_and_annotate(source: &str) -> lumenc_par::ast::Ast {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner, Algorithm::PrecedenceClimbing).unwrap();
        let mut ast = parser.parse().unwrap();
        TypeChecker::new().check_program(&mut ast).unwrap();
        for stmt in &mut ast {
            annotate_stmt(stmt);
        }
        ast
    }

    #[test]
    fn a_leaf_sibling_of_a_call_inherits_has_call() {
        let ast = parse_and_annotate("i32 f() { return 0; } i32 x = 1 + f();");
        let Stmt::Expr(assign) = &ast[1] else { panic!() };
        let ExprKind::Assign { value, .. } = &assign.kind else { panic!() };
        let ExprKind::BinOp { left, right, .. } = &value.kind else { panic!() };
        assert!(left.has_call, "literal sibling of a call must inherit has_call");
        assert!(right.has_call);
        assert!(value.has_call);
    }

    #[test]
    fn an_expression_with_no_call_is_never_marked() {
        let ast = parse_and_annotate("i32 x = 1 + 2;");
        let Stmt::Expr(assign) = &ast[0] else { panic!() };
        assert!(!assign.has_call);
    }
}
