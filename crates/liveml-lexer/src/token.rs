//! Token types for the LiveML lexer.
//!
//! One [`TokenKind`] covers both surface syntaxes. Which words are
//! keywords depends on the syntax being lexed, see [`TokenKind::keyword`].

use liveml_types::{Span, Syntax};
use std::fmt;

/// A single token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),

    // ── Names ─────────────────────────────────────────────────
    /// Lowercase identifier: `x`, `fact'`, `_tmp`
    LIdent(String),
    /// Capitalised identifier: module or constructor name
    UIdent(String),
    /// Type variable without the quote: `'a` carries `a`
    TypeVar(String),

    // ── Keywords ──────────────────────────────────────────────
    Let,
    Rec,
    In,
    And,
    Fun,
    Function,
    If,
    Then,
    Else,
    Match,
    With,
    When,
    Switch,
    Type,
    Of,
    Module,
    Struct,
    Begin,
    End,
    Open,
    True,
    False,
    Not,

    // ── Punctuation ───────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    /// `;;`
    SemiSemi,
    Dot,
    /// `...`
    DotDotDot,
    Colon,
    /// `::`
    ColonColon,
    Underscore,
    /// `=`
    Equals,
    /// `|`
    Bar,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,

    /// Any other infix or prefix symbol: `+`, `+.`, `|||`, `<>`, `mod`.
    Op(String),

    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for ordinary identifiers.
    pub fn keyword(word: &str, syntax: Syntax) -> Option<TokenKind> {
        let shared = match word {
            "let" => Some(Self::Let),
            "rec" => Some(Self::Rec),
            "and" => Some(Self::And),
            "fun" => Some(Self::Fun),
            "if" => Some(Self::If),
            "else" => Some(Self::Else),
            "when" => Some(Self::When),
            "type" => Some(Self::Type),
            "module" => Some(Self::Module),
            "open" => Some(Self::Open),
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "mod" => Some(Self::Op("mod".to_string())),
            _ => None,
        };
        if shared.is_some() {
            return shared;
        }
        match (word, syntax) {
            ("in", Syntax::Ml) => Some(Self::In),
            ("function", Syntax::Ml) => Some(Self::Function),
            ("then", Syntax::Ml) => Some(Self::Then),
            ("match", Syntax::Ml) => Some(Self::Match),
            ("with", Syntax::Ml) => Some(Self::With),
            ("of", Syntax::Ml) => Some(Self::Of),
            ("struct", Syntax::Ml) => Some(Self::Struct),
            ("begin", Syntax::Ml) => Some(Self::Begin),
            ("end", Syntax::Ml) => Some(Self::End),
            ("not", Syntax::Ml) => Some(Self::Not),
            ("switch", Syntax::Reason) => Some(Self::Switch),
            _ => None,
        }
    }

    /// Classify a scanned symbol run.
    pub fn symbol(text: &str) -> TokenKind {
        match text {
            "=" => Self::Equals,
            "|" => Self::Bar,
            "->" => Self::Arrow,
            "=>" => Self::FatArrow,
            ":" => Self::Colon,
            "::" => Self::ColonColon,
            "..." => Self::DotDotDot,
            "." => Self::Dot,
            other => Self::Op(other.to_string()),
        }
    }

    /// The operator name this token spells when written in parentheses,
    /// as in `let (|||) a b = ...`.
    pub fn operator_text(&self) -> Option<&str> {
        match self {
            Self::Op(s) => Some(s),
            Self::Equals => Some("="),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Char(c) => write!(f, "{c:?}"),
            Self::LIdent(s) | Self::UIdent(s) => write!(f, "{s}"),
            Self::TypeVar(s) => write!(f, "'{s}"),
            Self::Let => write!(f, "let"),
            Self::Rec => write!(f, "rec"),
            Self::In => write!(f, "in"),
            Self::And => write!(f, "and"),
            Self::Fun => write!(f, "fun"),
            Self::Function => write!(f, "function"),
            Self::If => write!(f, "if"),
            Self::Then => write!(f, "then"),
            Self::Else => write!(f, "else"),
            Self::Match => write!(f, "match"),
            Self::With => write!(f, "with"),
            Self::When => write!(f, "when"),
            Self::Switch => write!(f, "switch"),
            Self::Type => write!(f, "type"),
            Self::Of => write!(f, "of"),
            Self::Module => write!(f, "module"),
            Self::Struct => write!(f, "struct"),
            Self::Begin => write!(f, "begin"),
            Self::End => write!(f, "end"),
            Self::Open => write!(f, "open"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Not => write!(f, "not"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::Comma => write!(f, ","),
            Self::Semi => write!(f, ";"),
            Self::SemiSemi => write!(f, ";;"),
            Self::Dot => write!(f, "."),
            Self::DotDotDot => write!(f, "..."),
            Self::Colon => write!(f, ":"),
            Self::ColonColon => write!(f, "::"),
            Self::Underscore => write!(f, "_"),
            Self::Equals => write!(f, "="),
            Self::Bar => write!(f, "|"),
            Self::Arrow => write!(f, "->"),
            Self::FatArrow => write!(f, "=>"),
            Self::Op(s) => write!(f, "{s}"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}
