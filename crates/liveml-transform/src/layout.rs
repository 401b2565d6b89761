//! Output buffer and literal formatting shared by both printers.

use liveml_types::ast::{BinOp, Expr, ExprKind, UnaryOp};
use liveml_types::Syntax;

/// Indentation-aware text buffer.
///
/// Indentation is written lazily on the first text after a newline, so
/// blank lines never carry trailing spaces.
pub(crate) struct Layout {
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl Layout {
    pub(crate) fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    pub(crate) fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
            self.at_line_start = false;
        }
        self.out.push_str(text);
    }

    pub(crate) fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    pub(crate) fn indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

// ── Literals ──────────────────────────────────────────────────────────────────

/// A double-quoted string literal with escapes both lexers accept.
pub(crate) fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        push_escaped(&mut out, ch, '"');
    }
    out.push('"');
    out
}

pub(crate) fn char_literal(c: char) -> String {
    let mut out = String::from("'");
    push_escaped(&mut out, c, '\'');
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, ch: char, quote: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if (c as u32) < 0x20 || c as u32 == 0x7f => {
            out.push_str(&format!("\\{:03}", c as u32));
        }
        c => out.push(c),
    }
}

/// A float literal that re-lexes as a float: `3.`, `0.5`, `1e+300`.
pub(crate) fn float_literal(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "infinity" } else { "neg_infinity" }.to_string();
    }
    let text = format!("{x:?}");
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.")
    }
}

/// An operator used as a value: `(+)`, `( * )`, `(==)`.
///
/// Names are stored in canonical spelling and translated to `syntax`.
/// Operators touching `*` get inner spaces so they never open a comment.
pub(crate) fn operator_value(name: &str, syntax: Syntax) -> String {
    let op = BinOp::from_symbol(name, Syntax::CANONICAL);
    let symbol = op.symbol(syntax);
    if symbol.starts_with('*') || symbol.ends_with('*') {
        format!("( {symbol} )")
    } else {
        format!("({symbol})")
    }
}

/// True if `name` is an operator rather than an identifier.
pub(crate) fn is_operator_name(name: &str) -> bool {
    name == "mod"
        || name
            .chars()
            .next()
            .is_some_and(|c| !(c.is_alphanumeric() || c == '_' || c == '\''))
}

/// True if the printed form of `expr` begins with a minus sign.
pub(crate) fn starts_with_minus(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Int(n) => *n < 0,
        ExprKind::Float(x) => x.is_sign_negative() && !x.is_nan(),
        ExprKind::Unary { op, .. } => matches!(op, UnaryOp::Neg | UnaryOp::FNeg),
        _ => false,
    }
}

/// True for negative numeric literals, which print with a leading `-`
/// and bind like a prefix operator.
pub(crate) fn is_negative_literal(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Int(n) => *n < 0,
        ExprKind::Float(x) => x.is_sign_negative() && x.is_finite(),
        _ => false,
    }
}
