//! Expression parsing for the ML surface syntax.
//!
//! Precedence (lowest → highest):
//! 1. `let`, `fun`, `function`, `match` (extend as far right as possible)
//! 2. `;` (sequence, right)
//! 3. `,` (tuple)
//! 4. `||` (right)
//! 5. `&&` (right)
//! 6. `=`, `<>`, `<`, `|…`, `$…` and other comparison-class operators
//! 7. `^`, `@` (right)
//! 8. `::` (right)
//! 9. `+`, `-`, `+.`, `-.`
//! 10. `*`, `/`, `mod`, `*.`, `/.`
//! 11. `**` (right)
//! 12. unary `-`, `-.`, `not`
//! 13. application, constructor application

use liveml_lexer::token::TokenKind;
use liveml_types::ast::*;
use liveml_types::{ErrorCode, Span, Syntax};

use crate::parser::Parser;

/// An infix operator found at the cursor.
pub(crate) enum Infix {
    Cons,
    Op(BinOp),
}

impl Infix {
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Self::Cons => prec::CONS,
            Self::Op(op) => op.precedence(),
        }
    }

    pub(crate) fn is_right_assoc(&self) -> bool {
        match self {
            Self::Cons => true,
            Self::Op(op) => op.is_right_assoc(),
        }
    }
}

/// Symbols that are only ever prefix operators.
pub(crate) fn is_prefix_only(symbol: &str) -> bool {
    (symbol.starts_with('!') && !symbol.starts_with("!=")) || symbol.starts_with('~') || symbol.starts_with('?')
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// `Expr = TupleExpr [ ";" Expr ]`
    pub(crate) fn parse_ml_expr(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_ml_seq();
        self.leave();
        result
    }

    fn parse_ml_seq(&mut self) -> Option<Expr> {
        let first = self.parse_ml_tuple()?;
        if self.check(&TokenKind::Semi) && self.ml_seq_continues() {
            self.advance();
            let rest = self.parse_ml_expr()?;
            let span = first.span.merge(rest.span);
            return Some(Expr::new(
                ExprKind::Seq(Box::new(first), Box::new(rest)),
                span,
            ));
        }
        // A trailing `;` before a closing token is allowed.
        if self.check(&TokenKind::Semi) {
            self.advance();
        }
        Some(first)
    }

    /// True if the token after the `;` at the cursor starts another
    /// expression of the same sequence.
    fn ml_seq_continues(&self) -> bool {
        !matches!(
            self.look_ahead(1),
            TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::End
                | TokenKind::SemiSemi
                | TokenKind::Semi
                | TokenKind::In
                | TokenKind::Bar
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::With
                | TokenKind::Type
                | TokenKind::Module
                | TokenKind::Open
                | TokenKind::Eof
        )
    }

    /// `TupleExpr = BinaryExpr { "," BinaryExpr }`
    pub(crate) fn parse_ml_tuple(&mut self) -> Option<Expr> {
        let first = self.parse_ml_binary(prec::OR)?;
        if !self.check(&TokenKind::Comma) {
            return Some(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            items.push(self.parse_ml_binary(prec::OR)?);
        }
        let span = items[0].span.merge(items[items.len() - 1].span);
        Some(Expr::new(ExprKind::Tuple(items), span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Climbing
    // ══════════════════════════════════════════════════════════════════════════

    fn peek_ml_infix(&self) -> Option<Infix> {
        match self.peek_kind() {
            TokenKind::ColonColon => Some(Infix::Cons),
            TokenKind::Equals => Some(Infix::Op(BinOp::Eq)),
            TokenKind::Op(s) if !is_prefix_only(s) => {
                Some(Infix::Op(BinOp::from_symbol(s, Syntax::Ml)))
            }
            _ => None,
        }
    }

    pub(crate) fn parse_ml_binary(&mut self, min_prec: u8) -> Option<Expr> {
        let mut left = self.parse_ml_unary()?;
        while let Some(infix) = self.peek_ml_infix() {
            let prec = infix.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if infix.is_right_assoc() { prec } else { prec + 1 };
            self.enter()?;
            let right = self.parse_ml_binary(next_min);
            self.leave();
            let right = right?;
            left = match infix {
                Infix::Cons => Self::cons(left, right),
                Infix::Op(op) => Self::binary(op, left, right),
            };
        }
        Some(left)
    }

    /// Every nested operand passes through here, so this is where the
    /// nesting limit is enforced.
    fn parse_ml_unary(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_ml_prefix();
        self.leave();
        result
    }

    /// Prefix operators and the keyword-led constructs.
    fn parse_ml_prefix(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Op(s) if s == "-" || s == "-." => {
                let op = if s == "-" { UnaryOp::Neg } else { UnaryOp::FNeg };
                self.advance();
                self.enter()?;
                let operand = self.parse_ml_unary();
                self.leave();
                Some(Self::negate(op, operand?, start))
            }
            TokenKind::Not => {
                self.advance();
                self.enter()?;
                let operand = self.parse_ml_unary();
                self.leave();
                let operand = operand?;
                let span = start.merge(operand.span);
                Some(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            TokenKind::Let => self.parse_ml_let(),
            TokenKind::Fun => self.parse_ml_fun(),
            TokenKind::Function => {
                self.advance();
                let arms = self.parse_ml_arms()?;
                Some(Expr::new(ExprKind::Function(arms), self.span_since(start)))
            }
            TokenKind::Match => self.parse_ml_match(),
            TokenKind::If => self.parse_ml_if(),
            _ => self.parse_ml_application(),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Application
    // ══════════════════════════════════════════════════════════════════════════

    fn ml_atom_starts(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::Char(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::LIdent(_)
                | TokenKind::UIdent(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Begin
        )
    }

    /// `f a b`, `Some x`, `Node (l, v, r)`
    fn parse_ml_application(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let func = if matches!(self.peek_kind(), TokenKind::UIdent(_)) {
            let (path, is_constructor) = self.parse_path()?;
            if is_constructor {
                let args = if self.ml_atom_starts() {
                    self.parse_ml_constructor_args()?
                } else {
                    Vec::new()
                };
                return Some(Expr::new(
                    ExprKind::Constructor { path, args },
                    self.span_since(start),
                ));
            }
            Expr::new(ExprKind::Var(path), self.span_since(start))
        } else {
            self.parse_ml_atom()?
        };

        let mut args = Vec::new();
        while self.ml_atom_starts() {
            args.push(self.parse_ml_atom()?);
        }
        if args.is_empty() {
            return Some(func);
        }
        Some(Expr::new(
            ExprKind::Apply {
                func: Box::new(func),
                args,
            },
            self.span_since(start),
        ))
    }

    /// Constructor arguments: a parenthesised comma list gives one
    /// argument per element, anything else is a single argument.
    fn parse_ml_constructor_args(&mut self) -> Option<Vec<Expr>> {
        if !self.check(&TokenKind::LParen) || self.look_ahead(1) == &TokenKind::RParen {
            return Some(vec![self.parse_ml_atom()?]);
        }
        if self.look_ahead(2) == &TokenKind::RParen
            && self.look_ahead(1).operator_text().is_some()
        {
            return Some(vec![self.parse_ml_atom()?]);
        }
        self.expect(&TokenKind::LParen)?;
        let mut args = vec![self.parse_ml_binary(prec::OR)?];
        while self.eat(&TokenKind::Comma) {
            args.push(self.parse_ml_binary(prec::OR)?);
        }
        if args.len() == 1 && !self.check(&TokenKind::RParen) {
            // `Some (a; b)` or an annotated argument: fall back to a full
            // expression inside the parentheses.
            let first = args.remove(0);
            let expr = self.continue_ml_paren(first)?;
            self.expect(&TokenKind::RParen)?;
            return Some(vec![expr]);
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    /// Finish a parenthesised expression whose first operand is already
    /// parsed: an optional sequence tail and type annotation.
    fn continue_ml_paren(&mut self, first: Expr) -> Option<Expr> {
        let mut expr = first;
        if self.check(&TokenKind::Semi) && self.ml_seq_continues() {
            self.advance();
            let rest = self.parse_ml_expr()?;
            let span = expr.span.merge(rest.span);
            expr = Expr::new(ExprKind::Seq(Box::new(expr), Box::new(rest)), span);
        }
        self.skip_type_annotation()?;
        Some(expr)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Atoms
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_ml_atom(&mut self) -> Option<Expr> {
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
                    ExprKind::Constructor {
                        path,
                        args: Vec::new(),
                    }
                } else {
                    ExprKind::Var(path)
                }
            }
            TokenKind::LParen => {
                if let Some(name) = self.eat_operator_section() {
                    ExprKind::Var(Path::simple(name))
                } else {
                    self.advance();
                    if self.eat(&TokenKind::RParen) {
                        ExprKind::Unit
                    } else {
                        let inner = self.parse_ml_expr()?;
                        self.skip_type_annotation()?;
                        self.expect(&TokenKind::RParen)?;
                        return Some(inner);
                    }
                }
            }
            TokenKind::Begin => {
                self.advance();
                if self.eat(&TokenKind::End) {
                    ExprKind::Unit
                } else {
                    let inner = self.parse_ml_expr()?;
                    self.expect(&TokenKind::End)?;
                    return Some(inner);
                }
            }
            TokenKind::LBracket => return self.parse_ml_list(),
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

    /// `[a; b; c]`
    fn parse_ml_list(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LBracket)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            items.push(self.parse_ml_tuple()?);
            if !self.eat(&TokenKind::Semi) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Some(Expr::new(
            ExprKind::List { items, tail: None },
            self.span_since(start),
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Keyword constructs
    // ══════════════════════════════════════════════════════════════════════════

    /// `let [rec] bindings in body`
    fn parse_ml_let(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::Let)?;
        let rec = self.eat(&TokenKind::Rec);
        let bindings = self.parse_bindings(rec)?;
        self.expect(&TokenKind::In)?;
        let body = self.parse_ml_expr()?;
        Some(Expr::new(
            ExprKind::Let {
                rec,
                bindings,
                body: Box::new(body),
            },
            self.span_since(start),
        ))
    }

    /// `fun p1 p2 -> body`
    fn parse_ml_fun(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::Fun)?;
        let mut params = vec![self.parse_pattern_atom()?];
        while !self.check(&TokenKind::Arrow) {
            params.push(self.parse_pattern_atom()?);
        }
        self.expect(&TokenKind::Arrow)?;
        let body = self.parse_ml_expr()?;
        Some(Expr::new(
            ExprKind::Fun {
                params,
                body: Box::new(body),
            },
            self.span_since(start),
        ))
    }

    /// `match e with | p [when g] -> e ...`
    fn parse_ml_match(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::Match)?;
        let scrutinee = self.parse_ml_expr()?;
        self.expect(&TokenKind::With)?;
        let arms = self.parse_ml_arms()?;
        Some(Expr::new(
            ExprKind::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
            self.span_since(start),
        ))
    }

    fn parse_ml_arms(&mut self) -> Option<Vec<MatchArm>> {
        self.eat(&TokenKind::Bar);
        let mut arms = Vec::new();
        loop {
            let start = self.current_span();
            let pattern = self.parse_pattern()?;
            let guard = if self.eat(&TokenKind::When) {
                Some(self.parse_ml_expr()?)
            } else {
                None
            };
            self.expect(&TokenKind::Arrow)?;
            let body = self.parse_ml_expr()?;
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

    /// `if c then a [else b]`
    fn parse_ml_if(&mut self) -> Option<Expr> {
        let start: Span = self.current_span();
        self.expect(&TokenKind::If)?;
        let cond = self.parse_ml_expr()?;
        self.expect(&TokenKind::Then)?;
        let then_branch = self.parse_ml_binary(prec::OR)?;
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_ml_binary(prec::OR)?))
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
