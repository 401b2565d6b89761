//! AST node types shared by both surface syntaxes.
//!
//! Every node carries a [`Span`] for error reporting. Spans are ignored by
//! the printers, so two programs that differ only in layout print the same.
//! Large recursive types are boxed to keep enum sizes reasonable.

use crate::{Span, Syntax};
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A parsed snippet: a sequence of top-level units.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

/// One top-level unit. The evaluator reports one output record per item.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// `let [rec] p = e and p = e`
    Let { rec: bool, bindings: Vec<Binding> },
    /// `type t = ... and u = ...`
    Type(Vec<TypeDecl>),
    /// `module M = struct ... end` / `module M = { ... }`
    Module { name: String, items: Vec<Item> },
    /// `open M`
    Open(Path),
    /// A bare expression.
    Expr(Expr),
}

/// `pattern = value` inside a `let`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub pattern: Pattern,
    pub value: Expr,
    pub span: Span,
}

/// A possibly module-qualified name: `x`, `List.map`, `Turtle.Forward`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub modules: Vec<String>,
    pub name: String,
}

impl Path {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            modules: Vec::new(),
            name: name.into(),
        }
    }

    pub fn qualified(modules: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            modules,
            name: name.into(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        !self.modules.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for module in &self.modules {
            write!(f, "{module}.")?;
        }
        write!(f, "{}", self.name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Type Declarations
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    /// Type parameters without the leading quote: `'a` is stored as `a`.
    pub params: Vec<String>,
    pub body: TypeBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    /// `type t`
    Abstract,
    /// `type t = int * int`
    Alias(TypeExpr),
    /// `type t = A | B of int`
    Variant(Vec<ConstructorDecl>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub name: String,
    /// One entry per constructor argument. `of (a * b)` is a single tuple.
    pub args: Vec<TypeExpr>,
    pub span: Span,
}

/// Type expressions are printed but never checked.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `'a`
    Var(String),
    /// `int`, `'a list`, `(int, string) result`
    Constr { path: Path, args: Vec<TypeExpr> },
    /// `a * b`
    Tuple(Vec<TypeExpr>),
    /// `a -> b`
    Arrow(Box<TypeExpr>, Box<TypeExpr>),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    /// `()`
    Unit,

    // ── Names ──
    /// `x`, `List.length`, `(+)`
    Var(Path),
    /// `None`, `Some x`, `Beside (a, b)`
    Constructor { path: Path, args: Vec<Expr> },

    // ── Aggregates ──
    /// `(a, b)`; always at least two elements
    Tuple(Vec<Expr>),
    /// `[a; b]`, `a :: rest`, `[a, ...rest]`
    List {
        items: Vec<Expr>,
        tail: Option<Box<Expr>>,
    },

    // ── Functions ──
    /// `f x y`, `f(x, y)`; curried application of one or more arguments
    Apply { func: Box<Expr>, args: Vec<Expr> },
    /// `fun x y -> body`, `(x, y) => body`
    Fun { params: Vec<Pattern>, body: Box<Expr> },
    /// `function | p -> e`, `fun | p => e`
    Function(Vec<MatchArm>),

    // ── Control ──
    /// `let [rec] p = e in body`; a Reason block binding
    Let {
        rec: bool,
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },
    /// `a; b`
    Seq(Box<Expr>, Box<Expr>),
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// `match e with ...`, `switch (e) { ... }`
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },

    // ── Operators ──
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-` on ints
    Neg,
    /// `-.` on floats
    FNeg,
    /// `not` / `!`
    Not,
}

impl UnaryOp {
    pub fn symbol(self, syntax: Syntax) -> &'static str {
        match (self, syntax) {
            (Self::Neg, _) => "-",
            (Self::FNeg, _) => "-.",
            (Self::Not, Syntax::Ml) => "not",
            (Self::Not, Syntax::Reason) => "!",
        }
    }
}

/// Binary operators.
///
/// Built-in operators differ in spelling between the two syntaxes; any
/// other infix symbol is kept as [`BinOp::Custom`] and takes its
/// precedence from its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FAdd,
    FSub,
    FMul,
    FDiv,
    Pow,
    /// String concatenation: `^` / `++`
    Concat,
    /// List append: `@`
    Append,
    /// Structural equality: `=` / `==`
    Eq,
    /// Structural inequality: `<>` / `!=`
    Ne,
    /// Physical equality: `==` / `===`
    PhysEq,
    /// Physical inequality: `!=` / `!==`
    PhysNe,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Custom(String),
}

/// Binding strength levels shared by the parsers and printers.
///
/// Higher binds tighter.
pub mod prec {
    pub const LOWEST: u8 = 0;
    pub const SEQ: u8 = 1;
    pub const TUPLE: u8 = 2;
    pub const OR: u8 = 3;
    pub const AND: u8 = 4;
    pub const COMPARE: u8 = 5;
    pub const CONCAT: u8 = 6;
    pub const CONS: u8 = 7;
    pub const ADD: u8 = 8;
    pub const MUL: u8 = 9;
    pub const POW: u8 = 10;
    pub const UNARY: u8 = 11;
    pub const APPLY: u8 = 12;
    pub const ATOM: u8 = 13;
}

impl BinOp {
    /// Resolve an infix symbol as written in `syntax`.
    pub fn from_symbol(symbol: &str, syntax: Syntax) -> BinOp {
        match (symbol, syntax) {
            ("+", _) => Self::Add,
            ("-", _) => Self::Sub,
            ("*", _) => Self::Mul,
            ("/", _) => Self::Div,
            ("mod", _) => Self::Mod,
            ("+.", _) => Self::FAdd,
            ("-.", _) => Self::FSub,
            ("*.", _) => Self::FMul,
            ("/.", _) => Self::FDiv,
            ("**", _) => Self::Pow,
            ("@", _) => Self::Append,
            ("<", _) => Self::Lt,
            (">", _) => Self::Gt,
            ("<=", _) => Self::Le,
            (">=", _) => Self::Ge,
            ("&&", _) => Self::And,
            ("||", _) => Self::Or,
            ("^", Syntax::Ml) | ("++", Syntax::Reason) => Self::Concat,
            ("=", Syntax::Ml) | ("==", Syntax::Reason) => Self::Eq,
            ("<>", Syntax::Ml) | ("!=", Syntax::Reason) => Self::Ne,
            ("==", Syntax::Ml) | ("===", Syntax::Reason) => Self::PhysEq,
            ("!=", Syntax::Ml) | ("!==", Syntax::Reason) => Self::PhysNe,
            (other, _) => Self::Custom(other.to_string()),
        }
    }

    /// The spelling of this operator in `syntax`.
    pub fn symbol(&self, syntax: Syntax) -> &str {
        match (self, syntax) {
            (Self::Add, _) => "+",
            (Self::Sub, _) => "-",
            (Self::Mul, _) => "*",
            (Self::Div, _) => "/",
            (Self::Mod, _) => "mod",
            (Self::FAdd, _) => "+.",
            (Self::FSub, _) => "-.",
            (Self::FMul, _) => "*.",
            (Self::FDiv, _) => "/.",
            (Self::Pow, _) => "**",
            (Self::Append, _) => "@",
            (Self::Lt, _) => "<",
            (Self::Gt, _) => ">",
            (Self::Le, _) => "<=",
            (Self::Ge, _) => ">=",
            (Self::And, _) => "&&",
            (Self::Or, _) => "||",
            (Self::Concat, Syntax::Ml) => "^",
            (Self::Concat, Syntax::Reason) => "++",
            (Self::Eq, Syntax::Ml) => "=",
            (Self::Eq, Syntax::Reason) => "==",
            (Self::Ne, Syntax::Ml) => "<>",
            (Self::Ne, Syntax::Reason) => "!=",
            (Self::PhysEq, Syntax::Ml) => "==",
            (Self::PhysEq, Syntax::Reason) => "===",
            (Self::PhysNe, Syntax::Ml) => "!=",
            (Self::PhysNe, Syntax::Reason) => "!==",
            (Self::Custom(s), _) => s,
        }
    }

    /// Binding strength, see [`prec`].
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => prec::OR,
            Self::And => prec::AND,
            Self::Eq
            | Self::Ne
            | Self::PhysEq
            | Self::PhysNe
            | Self::Lt
            | Self::Gt
            | Self::Le
            | Self::Ge => prec::COMPARE,
            Self::Concat | Self::Append => prec::CONCAT,
            Self::Add | Self::Sub | Self::FAdd | Self::FSub => prec::ADD,
            Self::Mul | Self::Div | Self::Mod | Self::FMul | Self::FDiv => prec::MUL,
            Self::Pow => prec::POW,
            Self::Custom(s) => symbol_precedence(s),
        }
    }

    pub fn is_right_assoc(&self) -> bool {
        matches!(
            self.precedence(),
            prec::OR | prec::AND | prec::CONCAT | prec::CONS | prec::POW
        )
    }
}

/// Precedence of a user-defined infix symbol, decided by its leading
/// characters.
pub fn symbol_precedence(symbol: &str) -> u8 {
    if symbol.starts_with("**") {
        return prec::POW;
    }
    match symbol.as_bytes().first() {
        Some(b'*' | b'/' | b'%') => prec::MUL,
        Some(b'+' | b'-') => prec::ADD,
        Some(b'@' | b'^') => prec::CONCAT,
        Some(b'&') if symbol == "&" || symbol == "&&" => prec::AND,
        Some(b'|') if symbol == "||" => prec::OR,
        _ => prec::COMPARE,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Patterns
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Names bound by this pattern, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            PatternKind::Var(name) => out.push(name),
            PatternKind::Tuple(items) => items.iter().for_each(|p| p.collect_names(out)),
            PatternKind::Constructor { args, .. } => {
                args.iter().for_each(|p| p.collect_names(out))
            }
            PatternKind::List { items, tail } => {
                items.iter().for_each(|p| p.collect_names(out));
                if let Some(tail) = tail {
                    tail.collect_names(out);
                }
            }
            // Both sides of an or-pattern bind the same names.
            PatternKind::Or(left, _) => left.collect_names(out),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// `_`
    Wildcard,
    Var(String),
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Unit,
    Tuple(Vec<Pattern>),
    Constructor { path: Path, args: Vec<Pattern> },
    List {
        items: Vec<Pattern>,
        tail: Option<Box<Pattern>>,
    },
    /// `p | q`
    Or(Box<Pattern>, Box<Pattern>),
}
