//! Expression parsing for the Reason surface syntax.
//!
//! Reason has no top-level sequence or tuple operators: sequences only
//! occur inside `{ ... }` blocks and tuples are always parenthesised.
//! Operator precedence matches the ML parser; `++` is concatenation and
//! `==` structural equality. `c ? a : b` is read as `if`.

use liveml_lexer::token::TokenKind;
use liveml_types::ast::*;
use liveml_types::{ErrorCode, Syntax};

use crate::parse_ml::{is_prefix_only, Infix};
use crate::parser::{Parser, Statement};

impl<'src> Parser<'src> {
    pub(crate) fn parse_re_expr(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_re_conditional();
        self.leave();
        result
    }

    /// `cond ? a : b`, right-associative and looser than every operator.
    fn parse_re_conditional(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let cond = self.parse_re_binary(prec::OR)?;
        if !matches!(self.peek_kind(), TokenKind::Op(s) if s == "?") {
            return Some(cond);
        }
        self.advance();
        let then_branch = self.parse_re_expr()?;
        self.expect(&TokenKind::Colon)?;
        let else_branch = self.parse_re_expr()?;
        Some(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Some(Box::new(else_branch)),
            },
            self.span_since(start),
        ))
    }

    /// Runs `f` with lambda detection switched on or off, then restores
    /// the previous mode.
    fn with_lambdas<T>(&mut self, allowed: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.no_lambda, !allowed);
        let result = f(self);
        self.no_lambda = saved;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Climbing
    // ══════════════════════════════════════════════════════════════════════════

    fn peek_re_infix(&self) -> Option<Infix> {
        match self.peek_kind() {
            TokenKind::Op(s) if !is_prefix_only(s) => {
                Some(Infix::Op(BinOp::from_symbol(s, Syntax::Reason)))
            }
            _ => None,
        }
    }

    fn parse_re_binary(&mut self, min_prec: u8) -> Option<Expr> {
        let mut left = self.parse_re_unary()?;
        while let Some(infix) = self.peek_re_infix() {
            let prec = infix.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if infix.is_right_assoc() { prec } else { prec + 1 };
            self.enter()?;
            let right = self.parse_re_binary(next_min);
            self.leave();
            let right = right?;
            left = match infix {
                Infix::Cons => Self::cons(left, right),
                Infix::Op(op) => Self::binary(op, left, right),
            };
        }
        Some(left)
    }

    fn parse_re_unary(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_re_prefix();
        self.leave();
        result
    }

    fn parse_re_prefix(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Op(s) if s == "-" => Some(UnaryOp::Neg),
            TokenKind::Op(s) if s == "-." => Some(UnaryOp::FNeg),
            TokenKind::Op(s) if s == "!" => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            self.enter()?;
            let operand = self.parse_re_unary();
            self.leave();
            let operand = operand?;
            return Some(match op {
                UnaryOp::Not => {
                    let span = start.merge(operand.span);
                    Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(operand),
                        },
                        span,
                    )
                }
                _ => Self::negate(op, operand, start),
            });
        }

        match self.peek_kind() {
            TokenKind::Switch => self.parse_re_switch(),
            TokenKind::If => self.parse_re_if(),
            TokenKind::Fun => {
                self.advance();
                let arms = self.parse_re_arms(false)?;
                Some(Expr::new(ExprKind::Function(arms), self.span_since(start)))
            }
            TokenKind::LIdent(_) | TokenKind::Underscore
                if !self.no_lambda && self.look_ahead(1) == &TokenKind::FatArrow =>
            {
                self.parse_re_lambda()
            }
            TokenKind::LParen
                if !self.no_lambda && self.paren_followed_by(&TokenKind::FatArrow) =>
            {
                self.parse_re_lambda()
            }
            _ => self.parse_re_postfix(),
        }
    }

    /// True if the parenthesised group at the cursor is directly followed
    /// by `kind`.
    pub(crate) fn paren_followed_by(&self, kind: &TokenKind) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            match self.look_ahead(n) {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.look_ahead(n + 1) == kind;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            n += 1;
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Lambdas
    // ══════════════════════════════════════════════════════════════════════════

    /// `x => body`, `(a, b) => body`, `() => body`
    fn parse_re_lambda(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let params = if self.eat(&TokenKind::LParen) {
            let mut params = Vec::new();
            if self.check(&TokenKind::RParen) {
                params.push(Pattern::new(PatternKind::Unit, self.current_span()));
            }
            while !self.check(&TokenKind::RParen) {
                params.push(self.parse_pattern()?);
                self.skip_type_annotation()?;
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
            params
        } else {
            vec![self.parse_pattern_atom()?]
        };
        self.expect(&TokenKind::FatArrow)?;
        let body = self.parse_re_expr()?;
        Some(Expr::new(
            ExprKind::Fun {
                params,
                body: Box::new(body),
            },
            self.span_since(start),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Application & primaries
    // ══════════════════════════════════════════════════════════════════════════

    /// A primary followed by any number of `(args)` groups.
    fn parse_re_postfix(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let mut expr = self.parse_re_primary()?;
        let is_constructor = matches!(expr.kind, ExprKind::Constructor { .. });
        while !is_constructor && self.check(&TokenKind::LParen) {
            let args = self.with_lambdas(true, Self::parse_re_args)?;
            expr = Expr::new(
                ExprKind::Apply {
                    func: Box::new(expr),
                    args,
                },
                self.span_since(start),
            );
        }
        Some(expr)
    }

    /// `(a, b)` argument list. `()` passes a single unit argument.
    fn parse_re_args(&mut self) -> Option<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            args.push(Expr::new(ExprKind::Unit, self.current_span()));
        }
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_re_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    fn parse_re_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            TokenKind::Float(x) => {
                self.advance();
                ExprKind::Float(x)
            }
            TokenKind::Str(s) => {
                self.advance();
                ExprKind::Str(s)
            }
            TokenKind::Char(c) => {
                self.advance();
                ExprKind::Char(c)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::LIdent(name) => {
                self.advance();
                ExprKind::Var(Path::simple(name))
            }
            TokenKind::UIdent(_) => {
                let (path, is_constructor) = self.parse_path()?;
                if is_constructor {
                    let args = if self.check(&TokenKind::LParen) {
                        self.with_lambdas(true, Self::parse_re_args)?
                    } else {
                        Vec::new()
                    };
                    ExprKind::Constructor { path, args }
                } else {
                    ExprKind::Var(path)
                }
            }
            TokenKind::LParen => {
                if let Some(name) = self.eat_operator_section() {
                    ExprKind::Var(Path::simple(name))
                } else {
                    return self.with_lambdas(true, Self::parse_re_paren);
                }
            }
            TokenKind::LBracket => return self.with_lambdas(true, Self::parse_re_list),
            TokenKind::LBrace => return self.with_lambdas(true, Self::parse_re_block),
            other => {
                self.error_at_current(
                    ErrorCode::EXPECTED_EXPRESSION,
                    format!("expected an expression, found '{other}'"),
                );
                return None;
            }
        };
        Some(Expr::new(kind, self.span_since(start)))
    }

    /// `()`, `(e)`, `(e: t)` or `(a, b, ...)`
    fn parse_re_paren(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LParen)?;
        if self.eat(&TokenKind::RParen) {
            return Some(Expr::new(ExprKind::Unit, self.span_since(start)));
        }
        let first = self.parse_re_expr()?;
        self.skip_type_annotation()?;
        if !self.check(&TokenKind::Comma) {
            self.expect(&TokenKind::RParen)?;
            return Some(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_re_expr()?);
        }
        self.expect(&TokenKind::RParen)?;
        Some(Expr::new(ExprKind::Tuple(items), self.span_since(start)))
    }

    /// `[a, b, ...rest]`
    fn parse_re_list(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LBracket)?;
        let mut items = Vec::new();
        let mut tail = None;
        while !self.check(&TokenKind::RBracket) {
            if self.eat(&TokenKind::DotDotDot) {
                tail = Some(Box::new(self.parse_re_expr()?));
                self.eat(&TokenKind::Comma);
                break;
            }
            items.push(self.parse_re_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let span = self.span_since(start);
        // The spread is rebuilt with `cons` so `[a, ...[b]]` is `[a, b]`
        // and `[...xs]` is just `xs`.
        match tail {
            None => Some(Expr::new(ExprKind::List { items, tail: None }, span)),
            Some(tail) => Some(
                items
                    .into_iter()
                    .rev()
                    .fold(*tail, |acc, item| Self::cons(item, acc)),
            ),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Blocks
    // ══════════════════════════════════════════════════════════════════════════

    /// `{ let x = 1; f(x); x + 1 }`
    fn parse_re_block(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let statements = self.parse_re_statements(|k| matches!(k, TokenKind::RBrace))?;
        self.expect(&TokenKind::RBrace)?;
        let span = self.span_since(start);
        Some(Self::fold_statements(statements, span))
    }

    /// `;`-separated statements up to (not including) a token accepted by
    /// `stop`.
    fn parse_re_statements(&mut self, stop: fn(&TokenKind) -> bool) -> Option<Vec<Statement>> {
        let mut statements = Vec::new();
        while !stop(self.peek_kind()) && !self.at_end() {
            if self.check(&TokenKind::Let) {
                let start = self.current_span();
                self.advance();
                let rec = self.eat(&TokenKind::Rec);
                let bindings = self.parse_bindings(rec)?;
                statements.push(Statement::Let {
                    rec,
                    bindings,
                    span: self.span_since(start),
                });
            } else {
                statements.push(Statement::Expr(self.parse_re_expr()?));
            }
            if !self.eat(&TokenKind::Semi) {
                break;
            }
        }
        Some(statements)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // switch / if
    // ══════════════════════════════════════════════════════════════════════════

    /// `switch (e) { | p when g => body ... }`
    fn parse_re_switch(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::Switch)?;
        let scrutinee = self.parse_re_expr()?;
        self.expect(&TokenKind::LBrace)?;
        let arms = self.parse_re_arms(true)?;
        self.expect(&TokenKind::RBrace)?;
        Some(Expr::new(
            ExprKind::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
            self.span_since(start),
        ))
    }

    /// Match arms. Inside a `switch` an arm body runs up to the next `|`
    /// or the closing brace and may be a sequence; in `fun | ...` each
    /// body is a single expression.
    fn parse_re_arms(&mut self, braced: bool) -> Option<Vec<MatchArm>> {
        self.eat(&TokenKind::Bar);
        let mut arms = Vec::new();
        loop {
            let start = self.current_span();
            let pattern = self.parse_pattern()?;
            let guard = if self.eat(&TokenKind::When) {
                Some(self.with_lambdas(false, Self::parse_re_expr)?)
            } else {
                None
            };
            self.expect(&TokenKind::FatArrow)?;
            let body = self.with_lambdas(true, |p| {
                if braced {
                    let body_start = p.current_span();
                    let statements = p.parse_re_statements(|k| {
                        matches!(k, TokenKind::Bar | TokenKind::RBrace)
                    })?;
                    Some(Self::fold_statements(statements, body_start))
                } else {
                    p.parse_re_expr()
                }
            })?;
            arms.push(MatchArm {
                pattern,
                guard,
                body,
                span: self.span_since(start),
            });
            if !self.eat(&TokenKind::Bar) {
                break;
            }
        }
        Some(arms)
    }

    /// `if (c) { a } else if (d) { b } else { c }`
    fn parse_re_if(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::If)?;
        let cond = self.parse_re_expr()?;
        let then_branch = self.parse_re_expr()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_re_expr()?))
        } else {
            None
        };
        Some(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            self.span_since(start),
        ))
    }
}
