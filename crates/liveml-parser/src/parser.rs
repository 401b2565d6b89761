//! Core parser infrastructure: token cursor, error reporting, helpers.

use liveml_lexer::token::{Token, TokenKind};
use liveml_types::ast::{BinOp, Binding, Expr, ExprKind, Path, Program, UnaryOp};
use liveml_types::{Diagnostics, ErrorCode, LiveError, SourceFile, Span, Syntax};

/// Maximum expression nesting before the parser gives up.
pub(crate) const MAX_NESTING: u32 = 128;

/// The LiveML parser.
///
/// Consumes a token stream produced by the lexer and builds an AST for
/// the syntax it was created with. Collects errors and resynchronises at
/// item boundaries.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    source_file: &'src SourceFile,
    pub(crate) syntax: Syntax,
    errors: Diagnostics,
    /// Current expression nesting depth.
    pub(crate) depth: u32,
    /// Set while parsing a Reason `when` guard, where `x =>` ends the
    /// guard instead of starting a lambda.
    pub(crate) no_lambda: bool,
}

/// One entry of a Reason block before it is folded into an expression.
pub(crate) enum Statement {
    Let {
        rec: bool,
        bindings: Vec<Binding>,
        span: Span,
    },
    Expr(Expr),
}

/// Result of parsing.
pub struct ParseResult {
    /// `None` whenever any error was reported.
    pub program: Option<Program>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile, syntax: Syntax) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            syntax,
            errors: Diagnostics::empty(),
            depth: 0,
            no_lambda: false,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.look_ahead(0)
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, self.current_span()));
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    /// Span from `start` to the end of the previously consumed token.
    pub(crate) fn span_since(&self, start: Span) -> Span {
        start.merge(self.previous_span())
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True if the current token is the operator `symbol`.
    pub(crate) fn check_op(&self, symbol: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Op(s) if s == symbol)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            let code = match expected {
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace | TokenKind::End => {
                    ErrorCode::UNCLOSED_DELIMITER
                }
                _ => ErrorCode::UNEXPECTED_TOKEN,
            };
            self.error_at_current(
                code,
                format!("expected '{}', found '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    pub(crate) fn expect_lident(&mut self) -> Option<String> {
        match self.peek_kind().clone() {
            TokenKind::LIdent(name) => {
                self.advance();
                Some(name)
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a lowercase name, found '{other}'"),
                );
                None
            }
        }
    }

    pub(crate) fn expect_uident(&mut self) -> Option<String> {
        match self.peek_kind().clone() {
            TokenKind::UIdent(name) => {
                self.advance();
                Some(name)
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a capitalised name, found '{other}'"),
                );
                None
            }
        }
    }

    /// Parse `M.N.` prefixes after the current `UIdent`, then the final
    /// name. Returns the path and whether the final name is capitalised.
    ///
    /// The cursor must be on a `UIdent`.
    pub(crate) fn parse_path(&mut self) -> Option<(Path, bool)> {
        let mut modules = Vec::new();
        let mut name = self.expect_uident()?;
        while self.check(&TokenKind::Dot) {
            match self.look_ahead(1).clone() {
                TokenKind::UIdent(next) => {
                    self.advance();
                    self.advance();
                    modules.push(std::mem::replace(&mut name, next));
                }
                TokenKind::LIdent(next) => {
                    self.advance();
                    self.advance();
                    modules.push(name);
                    return Some((Path::qualified(modules, next), false));
                }
                _ => break,
            }
        }
        Some((Path::qualified(modules, name), true))
    }

    /// `( op )`: an operator used as a value or bound as a name.
    ///
    /// Consumes the section and returns the operator's name if the cursor
    /// is on one.
    pub(crate) fn eat_operator_section(&mut self) -> Option<String> {
        if !self.check(&TokenKind::LParen) || self.look_ahead(2) != &TokenKind::RParen {
            return None;
        }
        let symbol = self.look_ahead(1).operator_text()?;
        // Names are stored in canonical spelling so `(==)` in Reason and
        // `(=)` in ML refer to the same value.
        let name = BinOp::from_symbol(symbol, self.syntax)
            .symbol(Syntax::CANONICAL)
            .to_string();
        self.advance();
        self.advance();
        self.advance();
        Some(name)
    }

    // ── Nesting guard ─────────────────────────────────────────────────────────

    pub(crate) fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            self.error_at_current(
                ErrorCode::NESTING_TOO_DEEP,
                format!("expression nesting deeper than {MAX_NESTING} levels"),
            );
            self.depth -= 1;
            return None;
        }
        Some(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    // ── AST helpers ───────────────────────────────────────────────────────────

    pub(crate) fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// `head :: tail`, flattened into an existing list literal when the
    /// tail is one.
    pub(crate) fn cons(head: Expr, tail: Expr) -> Expr {
        let span = head.span.merge(tail.span);
        let kind = match tail.kind {
            ExprKind::List { mut items, tail } => {
                items.insert(0, head);
                ExprKind::List { items, tail }
            }
            other => ExprKind::List {
                items: vec![head],
                tail: Some(Box::new(Expr::new(other, tail.span))),
            },
        };
        Expr::new(kind, span)
    }

    /// Apply a prefix minus, folding it into numeric literals.
    pub(crate) fn negate(op: UnaryOp, operand: Expr, span: Span) -> Expr {
        let span = span.merge(operand.span);
        match (op, &operand.kind) {
            (UnaryOp::Neg, ExprKind::Int(n)) => Expr::new(ExprKind::Int(n.wrapping_neg()), span),
            (UnaryOp::Neg | UnaryOp::FNeg, ExprKind::Float(x)) => {
                Expr::new(ExprKind::Float(-x), span)
            }
            _ => Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ),
        }
    }

    /// Fold statements of a block or arm body into nested `Let`/`Seq`
    /// expressions. An empty body is `()`.
    pub(crate) fn fold_statements(statements: Vec<Statement>, span: Span) -> Expr {
        let mut acc: Option<Expr> = None;
        for statement in statements.into_iter().rev() {
            acc = Some(match statement {
                Statement::Expr(expr) => match acc {
                    None => expr,
                    Some(rest) => {
                        let span = expr.span.merge(rest.span);
                        Expr::new(ExprKind::Seq(Box::new(expr), Box::new(rest)), span)
                    }
                },
                Statement::Let {
                    rec,
                    bindings,
                    span: let_span,
                } => {
                    let body = acc.unwrap_or_else(|| Expr::new(ExprKind::Unit, let_span));
                    let span = let_span.merge(body.span);
                    Expr::new(
                        ExprKind::Let {
                            rec,
                            bindings,
                            body: Box::new(body),
                        },
                        span,
                    )
                }
            });
        }
        acc.unwrap_or_else(|| Expr::new(ExprKind::Unit, span))
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = LiveError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(error);
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until the start of the next top-level item.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0i32;
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::SemiSemi => {
                    self.advance();
                    return;
                }
                TokenKind::Semi if self.syntax == Syntax::Reason && depth <= 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Type | TokenKind::Module | TokenKind::Open if depth <= 0 => return,
                TokenKind::Let if depth <= 0 && self.syntax == Syntax::Reason => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Program`].
    pub fn parse(mut self) -> ParseResult {
        let start = self.current_span();
        let items = self.parse_items_until(&TokenKind::Eof);
        let program = Program {
            items,
            span: self.span_since(start),
        };
        let program = (!self.errors.has_errors()).then_some(program);
        ParseResult {
            program,
            errors: self.errors,
        }
    }
}
