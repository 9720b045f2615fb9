//! The type checker: walks the AST in place, annotating every
//! expression's `value_type` and diagnosing mismatches.

use indexmap::IndexMap;
use lumenc_par::ast::{
    Ast, BinOpKind, Block, ElseBranch, Expr, ExprKind, FunctionDef, IfStmt, Literal, Stmt,
    UnaryOpKind, WhileStmt,
};
use lumenc_util::{Span, Symbol, ValueType};

use crate::error::TypeError;
use crate::scope::ScopeStack;

#[derive(Clone)]
struct FunctionSig {
    params: Vec<ValueType>,
    return_type: ValueType,
}

pub struct TypeChecker {
    scopes: ScopeStack,
    functions: IndexMap<Symbol, FunctionSig>,
    current_return_type: Option<ValueType>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            functions: IndexMap::new(),
            current_return_type: None,
        }
    }

    /// Type-checks the whole program in place. Function signatures are
    /// collected in a first pass so calls may reference functions declared
    /// anywhere in the top-level list, including later or recursively.
    pub fn check_program(&mut self, ast: &mut Ast) -> Result<(), TypeError> {
        self.collect_functions(ast);
        for stmt in ast.iter_mut() {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn collect_functions(&mut self, ast: &Ast) {
        for stmt in ast {
            if let Stmt::Function(f) = stmt {
                self.functions.insert(
                    f.name,
                    FunctionSig {
                        params: f.params.iter().map(|p| p.ty).collect(),
                        return_type: f.return_type,
                    },
                );
            }
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<(), TypeError> {
        match stmt {
            // A bare, undeclared `Variable` expression statement reads as a
            // declaration-without-initializer; the general `Variable` rule
            // in `check_expr` already produces exactly that effect, so
            // every expression statement recurses uniformly.
            Stmt::Expr(e) => self.check_expr(e),
            Stmt::Block(b) => self.check_block(b),
            Stmt::While(w) => self.check_while(w),
            Stmt::If(i) => self.check_if(i),
            Stmt::Function(f) => self.check_function(f),
            Stmt::Return(e, span) => self.check_return(e, *span),
        }
    }

    fn check_block(&mut self, block: &mut Block) -> Result<(), TypeError> {
        self.scopes.push();
        let result = block.stmts.iter_mut().try_for_each(|s| self.check_stmt(s));
        self.scopes.pop();
        result
    }

    fn check_while(&mut self, w: &mut WhileStmt) -> Result<(), TypeError> {
        self.check_expr(&mut w.cond)?;
        if w.cond.value_type != ValueType::Bool {
            return Err(TypeError::ConditionNotBool {
                found: w.cond.value_type,
                span: w.cond.span,
            });
        }
        self.check_block(&mut w.body)
    }

    fn check_if(&mut self, stmt: &mut IfStmt) -> Result<(), TypeError> {
        self.check_expr(&mut stmt.cond)?;
        if stmt.cond.value_type != ValueType::Bool {
            return Err(TypeError::ConditionNotBool {
                found: stmt.cond.value_type,
                span: stmt.cond.span,
            });
        }
        self.check_block(&mut stmt.then_body)?;
        match &mut stmt.else_branch {
            None => Ok(()),
            Some(ElseBranch::Block(b)) => self.check_block(b),
            Some(ElseBranch::If(nested)) => self.check_if(nested),
        }
    }

    fn check_function(&mut self, f: &mut FunctionDef) -> Result<(), TypeError> {
        self.scopes.push();
        for param in &f.params {
            self.scopes.declare(param.name, param.ty);
        }
        let prev_return_type = self.current_return_type.replace(f.return_type);

        let result = f.body.stmts.iter_mut().try_for_each(|s| self.check_stmt(s));

        self.current_return_type = prev_return_type;
        self.scopes.pop();
        result
    }

    fn check_return(&mut self, e: &mut Expr, span: Span) -> Result<(), TypeError> {
        self.check_expr(e)?;
        if let Some(expected) = self.current_return_type {
            if e.value_type != expected {
                return Err(TypeError::ReturnTypeMismatch {
                    expected,
                    found: e.value_type,
                    span,
                });
            }
        }
        Ok(())
    }

    fn check_expr(&mut self, e: &mut Expr) -> Result<(), TypeError> {
        let span = e.span;
        match &mut e.kind {
            ExprKind::Value(lit) => {
                e.value_type = literal_type(lit);
            }
            ExprKind::Variable(sym) => {
                let sym = *sym;
                let hint = e.value_type;
                e.value_type = self.check_variable(sym, hint);
            }
            ExprKind::Wrapper(inner) => {
                self.check_expr(inner.as_mut())?;
                e.value_type = inner.value_type;
            }
            ExprKind::Unary { op, operand } => {
                let op = *op;
                self.check_expr(operand.as_mut())?;
                e.value_type = check_unary(op, operand.as_ref())?;
            }
            ExprKind::BinOp { op, left, right } => {
                let op = *op;
                self.check_expr(left.as_mut())?;
                self.check_expr(right.as_mut())?;
                e.value_type = check_binop(op, left.as_ref(), right.as_ref(), span)?;
            }
            ExprKind::Assign { target, value } => {
                let target = *target;
                self.check_expr(value.as_mut())?;
                e.value_type = self.check_assign(target, value.value_type, span)?;
            }
            ExprKind::FunctionCall { name, args } => {
                let name = *name;
                for arg in args.iter_mut() {
                    self.check_expr(arg)?;
                }
                e.value_type = self.check_call(name, args.as_slice(), span)?;
            }
        }
        Ok(())
    }

    /// `Variable` rule: resolves from the nearest enclosing scope; an
    /// unresolved name is installed in the current scope if the parser
    /// pre-annotated it with a declared type (a typed declaration), and
    /// always yields `Unknown` to mark the statement as declaration-only.
    fn check_variable(&mut self, sym: Symbol, declared_hint: ValueType) -> ValueType {
        if let Some(ty) = self.scopes.lookup(sym) {
            return ty;
        }
        if declared_hint != ValueType::Unknown {
            self.scopes.declare(sym, declared_hint);
        }
        ValueType::Unknown
    }

    /// `Assign` rule: introduces the target if unbound, upgrades an
    /// `Unknown` binding to the value's type, otherwise requires agreement.
    fn check_assign(
        &mut self,
        target: Symbol,
        value_ty: ValueType,
        span: Span,
    ) -> Result<ValueType, TypeError> {
        match self.scopes.lookup(target) {
            None => {
                self.scopes.declare(target, value_ty);
                Ok(value_ty)
            }
            Some(ValueType::Unknown) => {
                self.scopes.upgrade(target, value_ty);
                Ok(value_ty)
            }
            Some(existing) if existing == value_ty => Ok(value_ty),
            Some(existing) => Err(TypeError::AssignMismatch {
                expected: existing,
                found: value_ty,
                span,
            }),
        }
    }

    fn check_call(&mut self, name: Symbol, args: &[Expr], span: Span) -> Result<ValueType, TypeError> {
        let sig = self
            .functions
            .get(&name)
            .cloned()
            .ok_or(TypeError::UndeclaredFunction { span })?;

        if sig.params.len() != args.len() {
            return Err(TypeError::ArityMismatch {
                expected: sig.params.len(),
                found: args.len(),
                span,
            });
        }

        for (index, (param_ty, arg)) in sig.params.iter().zip(args).enumerate() {
            if *param_ty != arg.value_type {
                return Err(TypeError::ArgTypeMismatch {
                    index,
                    expected: *param_ty,
                    found: arg.value_type,
                    span: arg.span,
                });
            }
        }

        Ok(sig.return_type)
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_type(lit: &Literal) -> ValueType {
    match lit {
        Literal::Int(_) => ValueType::I32,
        Literal::Float(_) => ValueType::F64,
        Literal::Bool(_) => ValueType::Bool,
        Literal::Str(_) => ValueType::Str,
        Literal::Char(_) => ValueType::Char,
    }
}

fn check_unary(op: UnaryOpKind, operand: &Expr) -> Result<ValueType, TypeError> {
    match op {
        UnaryOpKind::Not => {
            if operand.value_type == ValueType::Bool {
                Ok(ValueType::Bool)
            } else {
                Err(TypeError::NotRequiresBool {
                    found: operand.value_type,
                    span: operand.span,
                })
            }
        }
        UnaryOpKind::Neg => match operand.value_type {
            ValueType::I32 | ValueType::F64 => Ok(operand.value_type),
            other => Err(TypeError::NegRequiresNumeric {
                found: other,
                span: operand.span,
            }),
        },
    }
}

fn check_binop(
    op: BinOpKind,
    left: &Expr,
    right: &Expr,
    span: Span,
) -> Result<ValueType, TypeError> {
    if left.value_type == ValueType::Unknown || right.value_type == ValueType::Unknown {
        return Err(TypeError::UninitializedVariable { span });
    }
    if left.value_type != right.value_type {
        return Err(TypeError::BinOpMismatch {
            left: left.value_type,
            right: right.value_type,
            span,
        });
    }
    if op.is_comparison() {
        Ok(ValueType::Bool)
    } else {
        Ok(left.value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenc_par::{Algorithm, Parser};
    use lumenc_util::Interner;

    fn check(source: &str) -> Result<Ast, TypeError> {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner, Algorithm::PrecedenceClimbing).unwrap();
        let mut ast = parser.parse().unwrap();
        TypeChecker::new().check_program(&mut ast)?;
        Ok(ast)
    }

    #[test]
    fn arithmetic_between_matching_types_is_accepted() {
        let ast = check("i32 x = 1 + 2 * 3;").unwrap();
        let Stmt::Expr(e) = &ast[0] else { panic!() };
        assert_eq!(e.value_type, ValueType::I32);
    }

    // Assigning a bool to a declared-i32 variable is a type mismatch.
    #[test]
    fn assigning_bool_to_declared_i32_is_a_type_mismatch() {
        let err = check("bool b = true; i32 x = b;").unwrap_err();
        assert!(matches!(err, TypeError::AssignMismatch { .. }));
    }

    #[test]
    fn comparing_mismatched_types_is_rejected() {
        let err = check("i32 x = 1; bool y = true; x == y;").unwrap_err();
        assert!(matches!(err, TypeError::BinOpMismatch { .. }));
    }

    #[test]
    fn declaration_only_then_assignment_upgrades_unknown_binding() {
        let ast = check("i32 x; x = 5;").unwrap();
        let Stmt::Expr(decl) = &ast[0] else { panic!() };
        assert_eq!(decl.value_type, ValueType::Unknown);
        let Stmt::Expr(assign) = &ast[1] else { panic!() };
        assert_eq!(assign.value_type, ValueType::I32);
    }

    #[test]
    fn using_an_unknown_variable_in_arithmetic_is_rejected() {
        let err = check("i32 x; i32 y = x + 1;").unwrap_err();
        assert!(matches!(err, TypeError::UninitializedVariable { .. }));
    }

    #[test]
    fn while_condition_must_be_bool() {
        let err = check("while (1) { }").unwrap_err();
        assert!(matches!(err, TypeError::ConditionNotBool { .. }));
    }

    #[test]
    fn not_requires_bool_operand() {
        let err = check("i32 x = 1; bool y = !x;").unwrap_err();
        assert!(matches!(err, TypeError::NotRequiresBool { .. }));
    }

    #[test]
    fn function_call_checks_arity_and_argument_types() {
        let ast = check(
            "i32 add(i32 a, i32 b) { return a + b; } i32 main() { return add(2, 3); }",
        )
        .unwrap();
        let Stmt::Function(main_fn) = &ast[1] else { panic!() };
        let Stmt::Return(ret, _) = &main_fn.body.stmts[0] else { panic!() };
        assert_eq!(ret.value_type, ValueType::I32);

        let err = check("i32 add(i32 a, i32 b) { return a + b; } i32 x = add(1);").unwrap_err();
        assert!(matches!(err, TypeError::ArityMismatch { .. }));

        let err =
            check("i32 add(i32 a, i32 b) { return a + b; } bool t = true; i32 x = add(1, t);")
                .unwrap_err();
        assert!(matches!(err, TypeError::ArgTypeMismatch { .. }));
    }

    #[test]
    fn calling_an_undeclared_function_is_rejected() {
        let err = check("i32 x = missing(1);").unwrap_err();
        assert!(matches!(err, TypeError::UndeclaredFunction { .. }));
    }

    #[test]
    fn return_type_mismatch_is_rejected() {
        let err = check("bool f() { return 1; }").unwrap_err();
        assert!(matches!(err, TypeError::ReturnTypeMismatch { .. }));
    }

    // A binding declared inside a block does not resolve once that block
    // has been exited — the outer reference falls
    // through to `Unknown` instead of finding the inner declaration.
    #[test]
    fn a_block_scoped_declaration_does_not_leak_into_the_enclosing_scope() {
        let ast = check("if (1 == 1) { i32 y = 5; } i32 q = y;").unwrap();
        let Stmt::Expr(q) = &ast[1] else { panic!() };
        assert_eq!(q.value_type, ValueType::Unknown);
    }
}
