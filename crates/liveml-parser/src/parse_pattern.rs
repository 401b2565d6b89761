//! Pattern parsing for both syntaxes.
//!
//! ML:     or → tuple → cons → constructor application → atom
//! Reason: or → constructor application → atom (tuples need parentheses,
//!         list tails use `...rest`)

use liveml_lexer::token::TokenKind;
use liveml_types::ast::*;
use liveml_types::{ErrorCode, Syntax};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `Pattern = Alternative { "|" Alternative }`
    pub(crate) fn parse_pattern(&mut self) -> Option<Pattern> {
        self.enter()?;
        let result = self.parse_pattern_or();
        self.leave();
        result
    }

    fn parse_pattern_or(&mut self) -> Option<Pattern> {
        let mut left = match self.syntax {
            Syntax::Ml => self.parse_pattern_tuple()?,
            Syntax::Reason => self.parse_pattern_app()?,
        };
        while self.eat(&TokenKind::Bar) {
            let right = match self.syntax {
                Syntax::Ml => self.parse_pattern_tuple()?,
                Syntax::Reason => self.parse_pattern_app()?,
            };
            let span = left.span.merge(right.span);
            left = Pattern::new(PatternKind::Or(Box::new(left), Box::new(right)), span);
        }
        Some(left)
    }

    /// ML: `p, q, r`
    fn parse_pattern_tuple(&mut self) -> Option<Pattern> {
        let first = self.parse_pattern_cons()?;
        if !self.check(&TokenKind::Comma) {
            return Some(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            items.push(self.parse_pattern_cons()?);
        }
        let span = items[0].span.merge(items[items.len() - 1].span);
        Some(Pattern::new(PatternKind::Tuple(items), span))
    }

    /// ML: `x :: rest`, right associative.
    fn parse_pattern_cons(&mut self) -> Option<Pattern> {
        let head = self.parse_pattern_app()?;
        if !self.eat(&TokenKind::ColonColon) {
            return Some(head);
        }
        self.enter()?;
        let tail = self.parse_pattern_cons();
        self.leave();
        Some(Self::cons_pattern(head, tail?))
    }

    /// `head :: tail`, flattened into the tail when it is a list pattern.
    fn cons_pattern(head: Pattern, tail: Pattern) -> Pattern {
        let span = head.span.merge(tail.span);
        let kind = match tail.kind {
            PatternKind::List { mut items, tail } => {
                items.insert(0, head);
                PatternKind::List { items, tail }
            }
            other => PatternKind::List {
                items: vec![head],
                tail: Some(Box::new(Pattern::new(other, tail.span))),
            },
        };
        Pattern::new(kind, span)
    }

    /// `Some x`, `Node (l, v, r)`, `Some(x)`
    fn parse_pattern_app(&mut self) -> Option<Pattern> {
        self.enter()?;
        let result = self.parse_pattern_constructor();
        self.leave();
        result
    }

    fn parse_pattern_constructor(&mut self) -> Option<Pattern> {
        if !matches!(self.peek_kind(), TokenKind::UIdent(_)) {
            return self.parse_pattern_atom();
        }
        let start = self.current_span();
        let (path, is_constructor) = self.parse_path()?;
        if !is_constructor {
            self.error_at(
                ErrorCode::EXPECTED_PATTERN,
                format!("expected a pattern, found '{path}'"),
                self.span_since(start),
            );
            return None;
        }
        let args = match self.syntax {
            Syntax::Ml if self.pattern_atom_starts() => self.parse_ml_pattern_args()?,
            Syntax::Reason if self.check(&TokenKind::LParen) => self.parse_re_pattern_args()?,
            _ => Vec::new(),
        };
        Some(Pattern::new(
            PatternKind::Constructor { path, args },
            self.span_since(start),
        ))
    }

    fn pattern_atom_starts(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Op(s) => s == "-",
            other => matches!(
                other,
                TokenKind::Underscore
                    | TokenKind::LIdent(_)
                    | TokenKind::UIdent(_)
                    | TokenKind::Int(_)
                    | TokenKind::Float(_)
                    | TokenKind::Str(_)
                    | TokenKind::Char(_)
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::LParen
                    | TokenKind::LBracket
            ),
        }
    }

    /// A parenthesised comma list gives one argument per element.
    fn parse_ml_pattern_args(&mut self) -> Option<Vec<Pattern>> {
        if self.check(&TokenKind::LParen) && self.look_ahead(1) != &TokenKind::RParen {
            self.advance();
            let mut args = vec![self.parse_pattern_cons()?];
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_pattern_cons()?);
            }
            if args.len() == 1 && self.check(&TokenKind::Bar) {
                // `Some (A | B)`
                let mut first = args.remove(0);
                while self.eat(&TokenKind::Bar) {
                    let right = self.parse_pattern_tuple()?;
                    let span = first.span.merge(right.span);
                    first = Pattern::new(PatternKind::Or(Box::new(first), Box::new(right)), span);
                }
                args.push(first);
            }
            self.skip_type_annotation()?;
            self.expect(&TokenKind::RParen)?;
            return Some(args);
        }
        Some(vec![self.parse_pattern_atom()?])
    }

    fn parse_re_pattern_args(&mut self) -> Option<Vec<Pattern>> {
        let start = self.current_span();
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            args.push(Pattern::new(PatternKind::Unit, start));
        }
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_pattern()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    /// Atomic patterns, also used for function parameters.
    pub(crate) fn parse_pattern_atom(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Underscore => {
                self.advance();
                PatternKind::Wildcard
            }
            TokenKind::LIdent(name) => {
                self.advance();
                PatternKind::Var(name)
            }
            TokenKind::UIdent(_) => {
                let (path, is_constructor) = self.parse_path()?;
                if !is_constructor {
                    self.error_at(
                        ErrorCode::EXPECTED_PATTERN,
                        format!("expected a pattern, found '{path}'"),
                        self.span_since(start),
                    );
                    return None;
                }
                PatternKind::Constructor {
                    path,
                    args: Vec::new(),
                }
            }
            TokenKind::Int(n) => {
                self.advance();
                PatternKind::Int(n)
            }
            TokenKind::Float(x) => {
                self.advance();
                PatternKind::Float(x)
            }
            TokenKind::Op(s) if s == "-" => {
                self.advance();
                match self.peek_kind().clone() {
                    TokenKind::Int(n) => {
                        self.advance();
                        PatternKind::Int(n.wrapping_neg())
                    }
                    TokenKind::Float(x) => {
                        self.advance();
                        PatternKind::Float(-x)
                    }
                    other => {
                        self.error_at_current(
                            ErrorCode::EXPECTED_PATTERN,
                            format!("expected a number after '-', found '{other}'"),
                        );
                        return None;
                    }
                }
            }
            TokenKind::Str(s) => {
                self.advance();
                PatternKind::Str(s)
            }
            TokenKind::Char(c) => {
                self.advance();
                PatternKind::Char(c)
            }
            TokenKind::True => {
                self.advance();
                PatternKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                PatternKind::Bool(false)
            }
            TokenKind::LParen => {
                if let Some(name) = self.eat_operator_section() {
                    PatternKind::Var(name)
                } else {
                    return self.parse_pattern_paren();
                }
            }
            TokenKind::LBracket => return self.parse_pattern_list(),
            other => {
                self.error_at_current(
                    ErrorCode::EXPECTED_PATTERN,
                    format!("expected a pattern, found '{other}'"),
                );
                return None;
            }
        };
        Some(Pattern::new(kind, self.span_since(start)))
    }

    /// `()`, `(p)`, `(p : t)`, and in Reason `(a, b)`.
    fn parse_pattern_paren(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        self.expect(&TokenKind::LParen)?;
        if self.eat(&TokenKind::RParen) {
            return Some(Pattern::new(PatternKind::Unit, self.span_since(start)));
        }
        let first = self.parse_pattern()?;
        self.skip_type_annotation()?;
        if self.syntax == Syntax::Reason && self.check(&TokenKind::Comma) {
            let mut items = vec![first];
            while self.eat(&TokenKind::Comma) {
                items.push(self.parse_pattern()?);
                self.skip_type_annotation()?;
            }
            self.expect(&TokenKind::RParen)?;
            return Some(Pattern::new(PatternKind::Tuple(items), self.span_since(start)));
        }
        self.expect(&TokenKind::RParen)?;
        Some(first)
    }

    /// `[a; b]` / `[a, b, ...rest]`
    fn parse_pattern_list(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        self.expect(&TokenKind::LBracket)?;
        let separator = match self.syntax {
            Syntax::Ml => TokenKind::Semi,
            Syntax::Reason => TokenKind::Comma,
        };
        let mut items = Vec::new();
        let mut tail = None;
        while !self.check(&TokenKind::RBracket) {
            if self.syntax == Syntax::Reason && self.eat(&TokenKind::DotDotDot) {
                tail = Some(self.parse_pattern()?);
                self.eat(&TokenKind::Comma);
                break;
            }
            let item = match self.syntax {
                Syntax::Ml => self.parse_pattern_tuple()?,
                Syntax::Reason => self.parse_pattern()?,
            };
            items.push(item);
            if !self.eat(&separator) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        match tail {
            None => Some(Pattern::new(
                PatternKind::List { items, tail: None },
                self.span_since(start),
            )),
            Some(tail) => Some(
                items
                    .into_iter()
                    .rev()
                    .fold(tail, |acc, item| Self::cons_pattern(item, acc)),
            ),
        }
    }
}
