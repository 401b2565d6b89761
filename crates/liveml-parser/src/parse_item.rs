//! Top-level items: `let`, `type`, `module`, `open` and bare expressions.
//!
//! Item boundaries differ per syntax. ML items may be separated by `;;`
//! (optional before a keyword that starts a new item); Reason items end
//! with `;`.

use liveml_lexer::token::TokenKind;
use liveml_types::ast::*;
use liveml_types::{ErrorCode, Syntax};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse items until `end` or end of input, without consuming `end`.
    pub(crate) fn parse_items_until(&mut self, end: &TokenKind) -> Vec<Item> {
        let mut items = Vec::new();
        loop {
            while self.eat(&TokenKind::SemiSemi) || self.eat(&TokenKind::Semi) {}
            if self.check(end) || self.at_end() || self.too_many_errors() {
                break;
            }
            match self.parse_item() {
                Some(item) => {
                    items.push(item);
                    if !self.finish_item(end) {
                        self.synchronize();
                    }
                }
                None => self.synchronize(),
            }
        }
        items
    }

    /// Consume the separator after an item. Returns `false` after
    /// reporting a missing separator.
    fn finish_item(&mut self, end: &TokenKind) -> bool {
        match self.syntax {
            Syntax::Ml => {
                if self.eat(&TokenKind::SemiSemi)
                    || self.check(end)
                    || self.at_end()
                    || self.starts_item()
                {
                    return true;
                }
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected '{}' after item, expected ';;'", self.peek_kind()),
                );
                false
            }
            Syntax::Reason => {
                if self.eat(&TokenKind::Semi) || self.check(end) || self.at_end() {
                    return true;
                }
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected ';' after item, found '{}'", self.peek_kind()),
                );
                false
            }
        }
    }

    fn starts_item(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Let | TokenKind::Type | TokenKind::Module | TokenKind::Open
        )
    }

    pub(crate) fn parse_item(&mut self) -> Option<Item> {
        let start = self.current_span();
        let kind = match self.peek_kind() {
            TokenKind::Let => return self.parse_let_item(),
            TokenKind::Type => {
                self.advance();
                ItemKind::Type(self.parse_type_decls()?)
            }
            TokenKind::Module => self.parse_module_item()?,
            TokenKind::Open => {
                self.advance();
                ItemKind::Open(self.parse_module_path()?)
            }
            _ => ItemKind::Expr(self.parse_expr()?),
        };
        Some(Item {
            kind,
            span: self.span_since(start),
        })
    }

    /// Parse an expression in the current syntax.
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        match self.syntax {
            Syntax::Ml => self.parse_ml_expr(),
            Syntax::Reason => self.parse_re_expr(),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // let
    // ══════════════════════════════════════════════════════════════════════════

    /// `let [rec] bindings` at top level. In ML a trailing `in` turns the
    /// item into an expression.
    fn parse_let_item(&mut self) -> Option<Item> {
        let start = self.current_span();
        self.expect(&TokenKind::Let)?;
        let rec = self.eat(&TokenKind::Rec);
        let bindings = self.parse_bindings(rec)?;

        if self.syntax == Syntax::Ml && self.eat(&TokenKind::In) {
            let body = self.parse_ml_expr()?;
            let span = self.span_since(start);
            let expr = Expr::new(
                ExprKind::Let {
                    rec,
                    bindings,
                    body: Box::new(body),
                },
                span,
            );
            return Some(Item {
                kind: ItemKind::Expr(expr),
                span,
            });
        }

        Some(Item {
            kind: ItemKind::Let { rec, bindings },
            span: self.span_since(start),
        })
    }

    /// `binding { and binding }`
    pub(crate) fn parse_bindings(&mut self, rec: bool) -> Option<Vec<Binding>> {
        let mut bindings = vec![self.parse_binding()?];
        while self.eat(&TokenKind::And) {
            bindings.push(self.parse_binding()?);
        }
        if rec {
            for binding in &bindings {
                let is_function = matches!(
                    binding.value.kind,
                    ExprKind::Fun { .. } | ExprKind::Function(_)
                );
                if !matches!(binding.pattern.kind, PatternKind::Var(_)) || !is_function {
                    self.error_at(
                        ErrorCode::INVALID_BINDING,
                        "'let rec' can only bind names to functions",
                        binding.span,
                    );
                    return None;
                }
            }
        }
        Some(bindings)
    }

    /// `pattern = expr`, plus ML's `let f x y = body` function sugar.
    fn parse_binding(&mut self) -> Option<Binding> {
        let start = self.current_span();

        if self.syntax == Syntax::Ml {
            let name = match self.peek_kind().clone() {
                TokenKind::LIdent(name) => {
                    self.advance();
                    Some(name)
                }
                _ => self.eat_operator_section(),
            };
            if let Some(name) = name {
                let name_span = self.previous_span();
                let pattern = Pattern::new(PatternKind::Var(name), start.merge(name_span));
                let mut params = Vec::new();
                while !self.check(&TokenKind::Equals) && !self.check(&TokenKind::Colon) {
                    params.push(self.parse_pattern_atom()?);
                }
                self.skip_type_annotation()?;
                self.expect(&TokenKind::Equals)?;
                let body = self.parse_ml_expr()?;
                let value = if params.is_empty() {
                    body
                } else {
                    let span = start.merge(body.span);
                    Expr::new(
                        ExprKind::Fun {
                            params,
                            body: Box::new(body),
                        },
                        span,
                    )
                };
                return Some(Binding {
                    pattern,
                    value,
                    span: self.span_since(start),
                });
            }
        }

        let pattern = self.parse_pattern()?;
        self.skip_type_annotation()?;
        self.expect(&TokenKind::Equals)?;
        let value = self.parse_expr()?;
        Some(Binding {
            pattern,
            value,
            span: self.span_since(start),
        })
    }

    /// Skip an optional `: type` annotation. Types are not checked.
    pub(crate) fn skip_type_annotation(&mut self) -> Option<()> {
        if self.eat(&TokenKind::Colon) {
            self.parse_type()?;
        }
        Some(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // module / open
    // ══════════════════════════════════════════════════════════════════════════

    /// `module M = struct ... end` (ML) or `module M = { ... }` (Reason).
    fn parse_module_item(&mut self) -> Option<ItemKind> {
        self.expect(&TokenKind::Module)?;
        let name = self.expect_uident()?;
        let items = match self.syntax {
            Syntax::Ml => {
                self.expect(&TokenKind::Equals)?;
                self.expect(&TokenKind::Struct)?;
                let items = self.parse_items_until(&TokenKind::End);
                self.expect(&TokenKind::End)?;
                items
            }
            Syntax::Reason => {
                self.eat(&TokenKind::Equals);
                self.expect(&TokenKind::LBrace)?;
                let items = self.parse_items_until(&TokenKind::RBrace);
                self.expect(&TokenKind::RBrace)?;
                items
            }
        };
        Some(ItemKind::Module { name, items })
    }

    /// `M` or `M.N`
    fn parse_module_path(&mut self) -> Option<Path> {
        let (path, capitalised) = self.parse_path()?;
        if !capitalised {
            self.error_at(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected a module name, found '{path}'"),
                self.previous_span(),
            );
            return None;
        }
        Some(path)
    }
}
