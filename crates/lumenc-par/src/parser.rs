//! The parser: turns a token stream into an [`Ast`].
//!
//! Offers two equivalent expression-parsing algorithms, selectable per
//! instance: precedence climbing and right-skew-then-descend must agree on
//! every valid input, which the test suite cross-checks directly.

use lumenc_lex::{Lexer, Token, TokenKind};
use lumenc_util::{Span, Symbol, Interner, ValueType};

use crate::ast::{
    Ast, Block, BinOpKind, ElseBranch, Expr, ExprKind, FunctionDef, IfStmt, Literal, Param, Stmt,
    UnaryOpKind, WhileStmt,
};
use crate::error::ParseError;
use crate::precedence::{binop_from_token, binop_prec, ASSIGN_PREC};

/// Maximum number of parameters a function may declare.
pub const MAX_PARAMS: usize = 6;

/// Which of the two equivalent expression grammars the parser runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Precedence climbing: each recursive call is handed a minimum binding
    /// power and only consumes operators that meet it.
    PrecedenceClimbing,
    /// Builds a fully right-skewed chain first, ignoring precedence, then
    /// repeatedly rotates it into the canonical shape.
    RightSkewThenDescend,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    interner: &'a mut Interner,
    algorithm: Algorithm,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        interner: &'a mut Interner,
        algorithm: Algorithm,
    ) -> Result<Self, ParseError> {
        let lexer = Lexer::new(source)?;
        Ok(Self {
            lexer,
            interner,
            algorithm,
        })
    }

    pub fn parse(&mut self) -> Result<Ast, ParseError> {
        let mut stmts = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    // --- token-stream plumbing -------------------------------------------------

    fn peek(&self) -> Token<'a> {
        self.lexer.peek()
    }

    fn bump(&mut self) -> Result<Token<'a>, ParseError> {
        let current = self.peek();
        self.lexer.advance()?;
        Ok(current)
    }

    fn expect_punct(
        &mut self,
        kind: TokenKind<'static>,
        repr: char,
        is_closer: bool,
    ) -> Result<Span, ParseError> {
        let tok = self.peek();
        if same_kind(tok.kind, kind) {
            self.bump()?;
            Ok(tok.span)
        } else if is_closer {
            Err(ParseError::MissingCloser {
                expected: repr,
                span: tok.span,
            })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: repr.to_string(),
                found: describe(tok.kind),
                span: tok.span,
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(Symbol, Span), ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Ident(text) => {
                self.bump()?;
                Ok((self.interner.intern(text), tok.span))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: describe(other),
                span: tok.span,
            }),
        }
    }

    fn expect_type(&mut self) -> Result<(ValueType, Span), ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Type(ty) => {
                self.bump()?;
                Ok((ty, tok.span))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "type".to_string(),
                found: describe(other),
                span: tok.span,
            }),
        }
    }

    /// Consumes a trailing `;` if present. A typed declaration's terminator
    /// is optional; everywhere else it is simply consumed when it follows
    /// the construct that emits it.
    fn consume_optional_semicolon(&mut self) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::Semicolon {
            self.bump()?;
        }
        Ok(())
    }

    fn expect_semicolon(&mut self) -> Result<Span, ParseError> {
        self.expect_punct(TokenKind::Semicolon, ';', false)
    }

    // --- statements --------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::If => self.parse_if().map(Stmt::If),
            TokenKind::While => self.parse_while().map(Stmt::While),
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::Return => self.parse_return(),
            TokenKind::Type(_) => self.parse_typed_statement(),
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.expect_punct(TokenKind::LBrace, '{', false)?;
        let mut stmts = Vec::new();
        while self.peek().kind != TokenKind::RBrace {
            if self.peek().kind == TokenKind::Eof {
                return Err(ParseError::MissingCloser {
                    expected: '}',
                    span: self.peek().span,
                });
            }
            stmts.push(self.parse_statement()?);
        }
        let end = self.expect_punct(TokenKind::RBrace, '}', true)?;
        Ok(Block {
            stmts,
            span: merge_span(start, end),
        })
    }

    fn parse_if(&mut self) -> Result<IfStmt, ParseError> {
        let start = self.bump()?.span; // `if`
        let cond = self.parse_expr()?;
        let then_body = self.parse_block()?;
        let mut span = merge_span(start, then_body.span);

        let else_branch = if self.peek().kind == TokenKind::Else {
            self.bump()?;
            if self.peek().kind == TokenKind::If {
                let nested = self.parse_if()?;
                span = merge_span(span, nested.span);
                Some(ElseBranch::If(Box::new(nested)))
            } else {
                let block = self.parse_block()?;
                span = merge_span(span, block.span);
                Some(ElseBranch::Block(block))
            }
        } else {
            None
        };

        Ok(IfStmt {
            cond,
            then_body,
            else_branch,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<WhileStmt, ParseError> {
        let start = self.bump()?.span; // `while`
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        let span = merge_span(start, body.span);
        Ok(WhileStmt { cond, body, span })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.bump()?.span; // `return`
        let value = self.parse_expr()?;
        let semi = self.expect_semicolon()?;
        Ok(Stmt::Return(value, merge_span(start, semi)))
    }

    /// A statement beginning with a type keyword: either a function
    /// definition, a typed assignment, or a declaration-only typed
    /// variable.
    fn parse_typed_statement(&mut self) -> Result<Stmt, ParseError> {
        let (ty, start) = self.expect_type()?;
        let (name, name_span) = self.expect_ident()?;

        if self.peek().kind == TokenKind::LParen {
            let def = self.parse_function_def(ty, name, start)?;
            return Ok(Stmt::Function(def));
        }

        if self.peek().kind == TokenKind::Eq {
            self.bump()?;
            let value = self.parse_expr()?;
            let assign_span = merge_span(start, value.span);
            let expr = Expr::new(
                ExprKind::Assign {
                    target: name,
                    value: Box::new(value),
                },
                assign_span,
            );
            self.consume_optional_semicolon()?;
            return Ok(Stmt::Expr(expr));
        }

        // Declaration-only: pre-annotate the bare variable with its declared
        // type so the checker can see it even though there is no
        // initializer to infer from.
        let mut var = Expr::new(ExprKind::Variable(name), merge_span(start, name_span));
        var.value_type = ty;
        self.consume_optional_semicolon()?;
        Ok(Stmt::Expr(var))
    }

    fn parse_function_def(
        &mut self,
        return_type: ValueType,
        name: Symbol,
        start: Span,
    ) -> Result<FunctionDef, ParseError> {
        self.expect_punct(TokenKind::LParen, '(', false)?;
        let mut params = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            loop {
                let (ty, _) = self.expect_type()?;
                let (pname, _) = self.expect_ident()?;
                params.push(Param { name: pname, ty });
                if self.peek().kind == TokenKind::Comma {
                    self.bump()?;
                } else {
                    break;
                }
            }
        }
        let close = self.expect_punct(TokenKind::RParen, ')', true)?;
        if params.len() > MAX_PARAMS {
            return Err(ParseError::TooManyParams {
                span: merge_span(start, close),
            });
        }
        let body = self.parse_block()?;
        let span = merge_span(start, body.span);
        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    fn parse_expr_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        self.consume_optional_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    // --- expressions ---------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        match self.algorithm {
            Algorithm::PrecedenceClimbing => self.parse_precedence(ASSIGN_PREC),
            Algorithm::RightSkewThenDescend => self.parse_expr_right_skew(),
        }
    }

    /// Algorithm A: precedence climbing.
    fn parse_precedence(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let tok = self.peek();
            if tok.kind == TokenKind::Eq {
                if ASSIGN_PREC < min_prec {
                    break;
                }
                self.bump()?;
                let target = match left.kind {
                    ExprKind::Variable(sym) => sym,
                    _ => return Err(ParseError::IllegalAssignTarget { span: left.span }),
                };
                // right-associative: recurse at the same minimum precedence.
                let rhs = self.parse_precedence(ASSIGN_PREC)?;
                if matches!(rhs.kind, ExprKind::Assign { .. }) {
                    return Err(ParseError::NestedAssignRhs { span: rhs.span });
                }
                let span = merge_span(left.span, rhs.span);
                left = Expr::new(
                    ExprKind::Assign {
                        target,
                        value: Box::new(rhs),
                    },
                    span,
                );
                continue;
            }

            let Some(op) = binop_from_token(tok.kind) else {
                break;
            };
            let prec = binop_prec(op);
            if prec < min_prec {
                break;
            }
            self.bump()?;
            // left-associative: the right side must bind strictly tighter.
            let right = self.parse_precedence(prec + 1)?;
            let span = merge_span(left.span, right.span);
            left = Expr::new(
                ExprKind::BinOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// Algorithm B: build a flat, fully right-skewed chain ignoring
    /// precedence, then rotate it into canonical shape. `=` is
    /// right-associative and is lifted out before the descent runs.
    fn parse_expr_right_skew(&mut self) -> Result<Expr, ParseError> {
        let chain = self.parse_chain()?;
        let canonical = descent(chain);

        if self.peek().kind == TokenKind::Eq {
            self.bump()?;
            let target = match canonical.kind {
                ExprKind::Variable(sym) => sym,
                _ => {
                    return Err(ParseError::IllegalAssignTarget {
                        span: canonical.span,
                    })
                }
            };
            let rhs = self.parse_expr_right_skew()?;
            if matches!(rhs.kind, ExprKind::Assign { .. }) {
                return Err(ParseError::NestedAssignRhs { span: rhs.span });
            }
            let span = merge_span(canonical.span, rhs.span);
            return Ok(Expr::new(
                ExprKind::Assign {
                    target,
                    value: Box::new(rhs),
                },
                span,
            ));
        }

        Ok(canonical)
    }

    /// Builds the raw right-skewed chain: `unary (op unary)*`, always
    /// nesting the remainder of the chain as the right child regardless of
    /// the new operator's precedence relative to the one above it.
    fn parse_chain(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_unary()?;
        let Some(op) = binop_from_token(self.peek().kind) else {
            return Ok(left);
        };
        self.bump()?;
        let right = self.parse_chain()?;
        let span = merge_span(left.span, right.span);
        Ok(Expr::new(
            ExprKind::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        ))
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Bang => {
                self.bump()?;
                let operand = self.parse_unary()?;
                let span = merge_span(tok.span, operand.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOpKind::Not,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::Minus => {
                self.bump()?;
                let operand = self.parse_unary()?;
                let span = merge_span(tok.span, operand.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOpKind::Neg,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Int(text) => {
                self.bump()?;
                let value = text.parse::<i64>().map_err(|_| ParseError::UnexpectedToken {
                    expected: "integer literal".to_string(),
                    found: text.to_string(),
                    span: tok.span,
                })?;
                Ok(Expr::new(ExprKind::Value(Literal::Int(value)), tok.span))
            }
            TokenKind::Float(text) => {
                self.bump()?;
                let value = text.parse::<f64>().map_err(|_| ParseError::UnexpectedToken {
                    expected: "float literal".to_string(),
                    found: text.to_string(),
                    span: tok.span,
                })?;
                Ok(Expr::new(ExprKind::Value(Literal::Float(value)), tok.span))
            }
            TokenKind::True => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Value(Literal::Bool(true)), tok.span))
            }
            TokenKind::False => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Value(Literal::Bool(false)), tok.span))
            }
            TokenKind::Str(text) => {
                self.bump()?;
                let inner = strip_quotes(text);
                Ok(Expr::new(
                    ExprKind::Value(Literal::Str(inner.to_string())),
                    tok.span,
                ))
            }
            TokenKind::Char(text) => {
                self.bump()?;
                let inner = strip_quotes(text);
                let ch = inner.chars().next().unwrap_or('\0');
                Ok(Expr::new(ExprKind::Value(Literal::Char(ch)), tok.span))
            }
            TokenKind::Ident(text) => {
                self.bump()?;
                let sym = self.interner.intern(text);
                if self.peek().kind == TokenKind::LParen {
                    self.bump()?;
                    let mut args = Vec::new();
                    if self.peek().kind != TokenKind::RParen {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.peek().kind == TokenKind::Comma {
                                self.bump()?;
                            } else {
                                break;
                            }
                        }
                    }
                    let close = self.expect_punct(TokenKind::RParen, ')', true)?;
                    let span = merge_span(tok.span, close);
                    Ok(Expr::new(ExprKind::FunctionCall { name: sym, args }, span))
                } else {
                    Ok(Expr::new(ExprKind::Variable(sym), tok.span))
                }
            }
            TokenKind::LParen => {
                self.bump()?;
                let inner = self.parse_expr()?;
                let close = self.expect_punct(TokenKind::RParen, ')', true)?;
                let span = merge_span(tok.span, close);
                Ok(Expr::new(ExprKind::Wrapper(Box::new(inner)), span))
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: describe(other),
                span: tok.span,
            }),
        }
    }
}

/// Rotates a right-skewed chain into the shape precedence climbing would
/// have produced directly. The chain's left children are
/// always atomic by construction, so after a rotation only the new right
/// spine can still be out of order; the right subtree is therefore
/// canonicalized before this node is checked against it.
fn descent(node: Expr) -> Expr {
    let ExprKind::BinOp { op, left, right } = node.kind else {
        return node;
    };
    let right = descent(*right);
    let mut current = Expr::new(
        ExprKind::BinOp {
            op,
            left,
            right: Box::new(right),
        },
        node.span,
    );

    loop {
        let should_rotate = match &current.kind {
            ExprKind::BinOp { op, right, .. } => match &right.kind {
                ExprKind::BinOp { op: right_op, .. } => binop_prec(*right_op) <= binop_prec(*op),
                _ => false,
            },
            _ => false,
        };
        if !should_rotate {
            break;
        }
        current = rotate_once(current);
    }

    current
}

/// Promotes `node.right` to the root: `op(left, op2(r_left, r_right))`
/// becomes `op2(op(left, r_left), r_right)`.
fn rotate_once(node: Expr) -> Expr {
    let ExprKind::BinOp { op, left, right } = node.kind else {
        unreachable!("rotate_once requires a BinOp node");
    };
    let ExprKind::BinOp {
        op: right_op,
        left: right_left,
        right: right_right,
    } = right.kind
    else {
        unreachable!("rotate_once requires a BinOp right child");
    };

    let new_left_span = merge_span(left.span, right_left.span);
    let new_left = Expr::new(
        ExprKind::BinOp {
            op,
            left,
            right: right_left,
        },
        new_left_span,
    );
    let new_span = merge_span(new_left.span, right_right.span);
    Expr::new(
        ExprKind::BinOp {
            op: right_op,
            left: Box::new(new_left),
            right: right_right,
        },
        new_span,
    )
}

fn strip_quotes(text: &str) -> &str {
    text.get(1..text.len().saturating_sub(1)).unwrap_or("")
}

fn same_kind(a: TokenKind<'_>, b: TokenKind<'static>) -> bool {
    std::mem::discriminant(&a) == std::mem::discriminant(&b)
}

fn describe(kind: TokenKind<'_>) -> String {
    format!("{kind:?}")
}

fn merge_span(a: Span, b: Span) -> Span {
    Span {
        start: a.start.min(b.start),
        end: a.end.max(b.end),
        line: a.line,
        column: a.column,
        file_id: a.file_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenc_util::Interner;

    fn parse_expr_with(algorithm: Algorithm, source: &str) -> Expr {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner, algorithm).expect("parser ok");
        parser.parse_expr().expect("parse ok")
    }

    /// Structural equality ignoring spans, value types, and has_call
    /// annotations — exactly the shape both algorithms are required to
    /// agree on.
    fn same_shape(a: &Expr, b: &Expr) -> bool {
        match (&a.kind, &b.kind) {
            (ExprKind::Wrapper(x), ExprKind::Wrapper(y)) => same_shape(x, y),
            (
                ExprKind::FunctionCall { name: n1, args: a1 },
                ExprKind::FunctionCall { name: n2, args: a2 },
            ) => n1 == n2 && a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| same_shape(x, y)),
            (
                ExprKind::Assign { target: t1, value: v1 },
                ExprKind::Assign { target: t2, value: v2 },
            ) => t1 == t2 && same_shape(v1, v2),
            (
                ExprKind::BinOp { op: o1, left: l1, right: r1 },
                ExprKind::BinOp { op: o2, left: l2, right: r2 },
            ) => o1 == o2 && same_shape(l1, l2) && same_shape(r1, r2),
            (ExprKind::Unary { op: o1, operand: x }, ExprKind::Unary { op: o2, operand: y }) => {
                o1 == o2 && same_shape(x, y)
            }
            (ExprKind::Variable(s1), ExprKind::Variable(s2)) => s1 == s2,
            (ExprKind::Value(v1), ExprKind::Value(v2)) => v1 == v2,
            _ => false,
        }
    }

    fn assert_algorithms_agree(source: &str) {
        let a = parse_expr_with(Algorithm::PrecedenceClimbing, source);
        let b = parse_expr_with(Algorithm::RightSkewThenDescend, source);
        assert!(
            same_shape(&a, &b),
            "algorithms disagree on `{source}`:\n  A: {a:?}\n  B: {b:?}"
        );
    }

    #[test]
    fn simple_left_associative_precedence_agrees() {
        assert_algorithms_agree("1 + 2 * 3");
        assert_algorithms_agree("1 * 2 + 3");
        assert_algorithms_agree("1 * 2 + 3 + 4");
        assert_algorithms_agree("1 + 2 * 3 * 4");
        assert_algorithms_agree("1 - 2 - 3");
        assert_algorithms_agree("1 < 2 + 3 == 4 - 5 * 6");
    }

    #[test]
    fn parenthesized_groups_block_rotation() {
        assert_algorithms_agree("(1 + 2) * 3");
        assert_algorithms_agree("1 * (2 + 3)");
    }

    #[test]
    fn unary_and_calls_agree() {
        assert_algorithms_agree("-1 + 2 * -3");
        assert_algorithms_agree("!a == !b");
        assert_algorithms_agree("f(1, 2) + g(3) * 4");
    }

    #[test]
    fn assignment_is_right_associative_and_lowest_precedence() {
        assert_algorithms_agree("x = 1 + 2 * 3");
    }

    #[test]
    fn chained_assignment_is_rejected_by_both_algorithms() {
        let mut interner = Interner::new();
        let a = Parser::new("a = b = c", &mut interner, Algorithm::PrecedenceClimbing)
            .unwrap()
            .parse_expr();
        assert!(matches!(a, Err(ParseError::NestedAssignRhs { .. })));

        let mut interner = Interner::new();
        let b = Parser::new("a = b = c", &mut interner, Algorithm::RightSkewThenDescend)
            .unwrap()
            .parse_expr();
        assert!(matches!(b, Err(ParseError::NestedAssignRhs { .. })));
    }

    #[test]
    fn assignment_to_a_literal_is_illegal() {
        let mut interner = Interner::new();
        let err = Parser::new("1 = 2", &mut interner, Algorithm::PrecedenceClimbing)
            .unwrap()
            .parse_expr();
        assert!(matches!(err, Err(ParseError::IllegalAssignTarget { .. })));
    }

    #[test]
    fn function_with_too_many_params_is_rejected() {
        let mut interner = Interner::new();
        let mut parser = Parser::new(
            "i32 f(i32 a, i32 b, i32 c, i32 d, i32 e, i32 f, i32 g) { return 0; }",
            &mut interner,
            Algorithm::PrecedenceClimbing,
        )
        .unwrap();
        let err = parser.parse();
        assert!(matches!(err, Err(ParseError::TooManyParams { .. })));
    }

    #[test]
    fn if_else_if_chain_parses_as_nested_else_branches() {
        let mut interner = Interner::new();
        let mut parser = Parser::new(
            "if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }",
            &mut interner,
            Algorithm::PrecedenceClimbing,
        )
        .unwrap();
        let ast = parser.parse().unwrap();
        assert_eq!(ast.len(), 1);
        let Stmt::If(if_stmt) = &ast[0] else {
            panic!("expected if statement");
        };
        assert!(matches!(if_stmt.else_branch, Some(ElseBranch::If(_))));
    }

    #[test]
    fn declaration_only_typed_variable_preannotates_the_type() {
        let mut interner = Interner::new();
        let mut parser = Parser::new("i32 x;", &mut interner, Algorithm::PrecedenceClimbing).unwrap();
        let ast = parser.parse().unwrap();
        let Stmt::Expr(expr) = &ast[0] else {
            panic!("expected expr statement");
        };
        assert!(matches!(expr.kind, ExprKind::Variable(_)));
        assert_eq!(expr.value_type, ValueType::I32);
    }

    #[test]
    fn missing_closing_brace_is_reported() {
        let mut interner = Interner::new();
        let mut parser = Parser::new("while (a) { x = 1;", &mut interner, Algorithm::PrecedenceClimbing).unwrap();
        let err = parser.parse();
        assert!(matches!(err, Err(ParseError::MissingCloser { expected: '}', .. })));
    }
}
