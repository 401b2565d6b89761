//! Type declarations and type expressions.
//!
//! Types are kept in the AST only so the converter can print them; the
//! evaluator never checks them.
//!
//! ML:     `type 'a tree = Leaf | Node of 'a tree * 'a * 'a tree`
//!         arrow → tuple (`*`) → postfix application → atom
//! Reason: `type tree('a) = Leaf | Node(tree('a), 'a, tree('a))`
//!         `(a, b) => c` is curried, `((a, b)) => c` takes a tuple

use liveml_lexer::token::TokenKind;
use liveml_types::ast::*;
use liveml_types::{ErrorCode, Syntax};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `decl { and decl }` after the `type` keyword.
    pub(crate) fn parse_type_decls(&mut self) -> Option<Vec<TypeDecl>> {
        let mut decls = vec![self.parse_type_decl()?];
        while self.eat(&TokenKind::And) {
            decls.push(self.parse_type_decl()?);
        }
        Some(decls)
    }

    fn parse_type_decl(&mut self) -> Option<TypeDecl> {
        let start = self.current_span();
        let (name, params) = match self.syntax {
            Syntax::Ml => {
                let params = self.parse_ml_type_params()?;
                (self.expect_lident()?, params)
            }
            Syntax::Reason => {
                let name = self.expect_lident()?;
                (name, self.parse_re_type_params()?)
            }
        };

        let body = if self.eat(&TokenKind::Equals) {
            if self.starts_variant() {
                TypeBody::Variant(self.parse_constructor_decls()?)
            } else {
                TypeBody::Alias(self.parse_type()?)
            }
        } else {
            TypeBody::Abstract
        };

        Some(TypeDecl {
            name,
            params,
            body,
            span: self.span_since(start),
        })
    }

    /// `'a`, `('a, 'b)` or nothing, before the name.
    fn parse_ml_type_params(&mut self) -> Option<Vec<String>> {
        match self.peek_kind().clone() {
            TokenKind::TypeVar(name) => {
                self.advance();
                Some(vec![name])
            }
            TokenKind::LParen => {
                self.advance();
                let mut params = vec![self.expect_type_var()?];
                while self.eat(&TokenKind::Comma) {
                    params.push(self.expect_type_var()?);
                }
                self.expect(&TokenKind::RParen)?;
                Some(params)
            }
            _ => Some(Vec::new()),
        }
    }

    /// `('a, 'b)` or nothing, after the name.
    fn parse_re_type_params(&mut self) -> Option<Vec<String>> {
        if !self.eat(&TokenKind::LParen) {
            return Some(Vec::new());
        }
        let mut params = vec![self.expect_type_var()?];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            params.push(self.expect_type_var()?);
        }
        self.expect(&TokenKind::RParen)?;
        Some(params)
    }

    fn expect_type_var(&mut self) -> Option<String> {
        match self.peek_kind().clone() {
            TokenKind::TypeVar(name) => {
                self.advance();
                Some(name)
            }
            other => {
                self.error_at_current(
                    ErrorCode::EXPECTED_TYPE,
                    format!("expected a type variable, found '{other}'"),
                );
                None
            }
        }
    }

    /// A variant body starts with `|` or a constructor name that is not a
    /// module prefix (`M.t` is an alias).
    fn starts_variant(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Bar => true,
            TokenKind::UIdent(_) => self.look_ahead(1) != &TokenKind::Dot,
            _ => false,
        }
    }

    fn parse_constructor_decls(&mut self) -> Option<Vec<ConstructorDecl>> {
        self.eat(&TokenKind::Bar);
        let mut constructors = vec![self.parse_constructor_decl()?];
        while self.eat(&TokenKind::Bar) {
            constructors.push(self.parse_constructor_decl()?);
        }
        Some(constructors)
    }

    fn parse_constructor_decl(&mut self) -> Option<ConstructorDecl> {
        let start = self.current_span();
        let name = self.expect_uident()?;
        let mut args = Vec::new();
        match self.syntax {
            Syntax::Ml => {
                if self.eat(&TokenKind::Of) {
                    args.push(self.parse_ml_type_app()?);
                    while self.check_op("*") {
                        self.advance();
                        args.push(self.parse_ml_type_app()?);
                    }
                }
            }
            Syntax::Reason => {
                if self.eat(&TokenKind::LParen) {
                    while !self.check(&TokenKind::RParen) {
                        args.push(self.parse_type()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                }
            }
        }
        Some(ConstructorDecl {
            name,
            args,
            span: self.span_since(start),
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Type expressions
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_type(&mut self) -> Option<TypeExpr> {
        self.enter()?;
        let result = match self.syntax {
            Syntax::Ml => self.parse_ml_type_arrow(),
            Syntax::Reason => self.parse_re_type(),
        };
        self.leave();
        result
    }

    /// `a -> b -> c`, right associative.
    fn parse_ml_type_arrow(&mut self) -> Option<TypeExpr> {
        let param = self.parse_ml_type_tuple()?;
        if !self.eat(&TokenKind::Arrow) {
            return Some(param);
        }
        let result = self.parse_type()?;
        Some(TypeExpr::Arrow(Box::new(param), Box::new(result)))
    }

    /// `a * b * c`
    fn parse_ml_type_tuple(&mut self) -> Option<TypeExpr> {
        let first = self.parse_ml_type_app()?;
        if !self.check_op("*") {
            return Some(first);
        }
        let mut items = vec![first];
        while self.check_op("*") {
            self.advance();
            items.push(self.parse_ml_type_app()?);
        }
        Some(TypeExpr::Tuple(items))
    }

    /// `int list option`: constructors apply postfix.
    fn parse_ml_type_app(&mut self) -> Option<TypeExpr> {
        let mut args = match self.peek_kind().clone() {
            TokenKind::TypeVar(name) => {
                self.advance();
                vec![TypeExpr::Var(name)]
            }
            TokenKind::LParen => {
                self.advance();
                let mut items = vec![self.parse_type()?];
                while self.eat(&TokenKind::Comma) {
                    items.push(self.parse_type()?);
                }
                self.expect(&TokenKind::RParen)?;
                if items.len() > 1 && !self.starts_type_path() {
                    self.error_at_current(
                        ErrorCode::EXPECTED_TYPE,
                        format!(
                            "expected a type constructor after a parameter list, found '{}'",
                            self.peek_kind()
                        ),
                    );
                    return None;
                }
                items
            }
            TokenKind::LIdent(_) | TokenKind::UIdent(_) => {
                let path = self.parse_type_path()?;
                vec![TypeExpr::Constr {
                    path,
                    args: Vec::new(),
                }]
            }
            other => {
                self.error_at_current(
                    ErrorCode::EXPECTED_TYPE,
                    format!("expected a type, found '{other}'"),
                );
                return None;
            }
        };

        while self.starts_type_path() {
            let path = self.parse_type_path()?;
            args = vec![TypeExpr::Constr { path, args }];
        }
        // A single parenthesised type without a constructor is grouping.
        args.pop()
    }

    fn starts_type_path(&self) -> bool {
        match self.peek_kind() {
            TokenKind::LIdent(_) => true,
            TokenKind::UIdent(_) => self.look_ahead(1) == &TokenKind::Dot,
            _ => false,
        }
    }

    /// `t` or `M.N.t`
    fn parse_type_path(&mut self) -> Option<Path> {
        let mut modules = Vec::new();
        while let TokenKind::UIdent(module) = self.peek_kind().clone() {
            self.advance();
            self.expect(&TokenKind::Dot)?;
            modules.push(module);
        }
        let name = self.expect_lident()?;
        Some(Path::qualified(modules, name))
    }

    /// Reason types: `t`, `list('a)`, `(a, b)`, `a => b`, `(a, b) => c`.
    fn parse_re_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let params = match self.peek_kind().clone() {
            TokenKind::LParen => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RParen) {
                    items.push(self.parse_type()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen)?;
                items
            }
            _ => vec![self.parse_re_type_atom()?],
        };

        if self.eat(&TokenKind::FatArrow) {
            let result = self.parse_type()?;
            if params.is_empty() {
                let unit = TypeExpr::Constr {
                    path: Path::simple("unit"),
                    args: Vec::new(),
                };
                return Some(TypeExpr::Arrow(Box::new(unit), Box::new(result)));
            }
            let arrow = params
                .into_iter()
                .rev()
                .fold(result, |acc, param| TypeExpr::Arrow(Box::new(param), Box::new(acc)));
            return Some(arrow);
        }

        match params.len() {
            0 => {
                self.error_at(
                    ErrorCode::EXPECTED_TYPE,
                    "expected a type inside '()'",
                    self.span_since(start),
                );
                None
            }
            1 => params.into_iter().next(),
            _ => Some(TypeExpr::Tuple(params)),
        }
    }

    fn parse_re_type_atom(&mut self) -> Option<TypeExpr> {
        match self.peek_kind().clone() {
            TokenKind::TypeVar(name) => {
                self.advance();
                Some(TypeExpr::Var(name))
            }
            TokenKind::LIdent(_) | TokenKind::UIdent(_) => {
                let path = self.parse_type_path()?;
                let mut args = Vec::new();
                if self.eat(&TokenKind::LParen) {
                    while !self.check(&TokenKind::RParen) {
                        args.push(self.parse_type()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                }
                Some(TypeExpr::Constr { path, args })
            }
            other => {
                self.error_at_current(
                    ErrorCode::EXPECTED_TYPE,
                    format!("expected a type, found '{other}'"),
                );
                None
            }
        }
    }
}
