//! Printer for the ML (canonical) surface syntax.
//!
//! Parentheses are inserted from the precedence table in [`prec`]: each
//! expression has a level, and a child printed where a higher level is
//! required is wrapped. Tuples are always parenthesised. Constructs that
//! extend as far right as possible (`fun`, `let`, `match`, `function`,
//! `if`) sit at the lowest level.

use liveml_types::ast::*;
use liveml_types::Syntax;

use crate::layout::{self, Layout};

// Pattern levels.
const P_OR: u8 = 0;
const P_TUPLE: u8 = 1;
const P_CONS: u8 = 2;
const P_APP: u8 = 3;
const P_ATOM: u8 = 4;

// Type levels.
const T_ARROW: u8 = 0;
const T_TUPLE: u8 = 1;
const T_APP: u8 = 2;

pub(crate) fn print_program(program: &Program) -> String {
    let mut printer = MlPrinter { out: Layout::new() };
    printer.items(&program.items);
    printer.out.finish()
}

struct MlPrinter {
    out: Layout,
}

impl MlPrinter {
    // ══════════════════════════════════════════════════════════════════════════
    // Items
    // ══════════════════════════════════════════════════════════════════════════

    fn items(&mut self, items: &[Item]) {
        for item in items {
            self.item(item);
            self.out.text(";;");
            self.out.newline();
        }
    }

    fn item(&mut self, item: &Item) {
        match &item.kind {
            ItemKind::Let { rec, bindings } => self.let_bindings(*rec, bindings),
            ItemKind::Type(decls) => {
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        self.out.newline();
                        self.out.text("and ");
                    } else {
                        self.out.text("type ");
                    }
                    self.type_decl(decl);
                }
            }
            ItemKind::Module { name, items } => {
                self.out.text(&format!("module {name} = struct"));
                self.out.indent();
                self.out.newline();
                self.items(items);
                self.out.dedent();
                self.out.text("end");
            }
            ItemKind::Open(path) => self.out.text(&format!("open {path}")),
            ItemKind::Expr(expr) => self.expr(expr, prec::LOWEST),
        }
    }

    fn let_bindings(&mut self, rec: bool, bindings: &[Binding]) {
        self.out.text(if rec { "let rec " } else { "let " });
        for (i, binding) in bindings.iter().enumerate() {
            if i > 0 {
                self.out.newline();
                self.out.text("and ");
            }
            self.binding(binding);
        }
    }

    /// `f x y = body` for function bindings, `p = e` otherwise.
    fn binding(&mut self, binding: &Binding) {
        if let (PatternKind::Var(name), ExprKind::Fun { params, body }) =
            (&binding.pattern.kind, &binding.value.kind)
        {
            self.var_name(name);
            for param in params {
                self.out.text(" ");
                self.pattern(param, P_ATOM);
            }
            self.out.text(" =");
            self.body(body);
            return;
        }
        self.pattern(&binding.pattern, P_OR);
        self.out.text(" =");
        self.body(&binding.value);
    }

    /// The right-hand side of `=` or `->`: multi-line constructs start on
    /// an indented new line.
    fn body(&mut self, expr: &Expr) {
        if breaks_line(expr) {
            self.out.indent();
            self.out.newline();
            self.expr(expr, prec::LOWEST);
            self.out.dedent();
        } else {
            self.out.text(" ");
            self.expr(expr, prec::LOWEST);
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn level(expr: &Expr) -> u8 {
        match &expr.kind {
            _ if layout::is_negative_literal(expr) => prec::UNARY,
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Char(_)
            | ExprKind::Bool(_)
            | ExprKind::Unit
            | ExprKind::Var(_)
            | ExprKind::Tuple(_) => prec::ATOM,
            ExprKind::Constructor { args, .. } if args.is_empty() => prec::ATOM,
            ExprKind::Constructor { .. } | ExprKind::Apply { .. } => prec::APPLY,
            ExprKind::List { tail: None, .. } => prec::ATOM,
            ExprKind::List { items, tail: Some(tail) } if items.is_empty() => Self::level(tail),
            ExprKind::List { .. } => prec::CONS,
            ExprKind::Unary { .. } => prec::UNARY,
            ExprKind::Binary { op, .. } => op.precedence(),
            ExprKind::Seq(..) => prec::SEQ,
            ExprKind::Fun { .. }
            | ExprKind::Function(_)
            | ExprKind::Let { .. }
            | ExprKind::If { .. }
            | ExprKind::Match { .. } => prec::LOWEST,
        }
    }

    /// Print `expr`, parenthesised if its level is below `min`.
    fn expr(&mut self, expr: &Expr, min: u8) {
        let wrap = Self::level(expr) < min;
        if wrap {
            self.out.text("(");
        }
        self.expr_inner(expr);
        if wrap {
            self.out.text(")");
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Int(n) => self.out.text(&n.to_string()),
            ExprKind::Float(x) => self.out.text(&layout::float_literal(*x)),
            ExprKind::Str(s) => self.out.text(&layout::string_literal(s)),
            ExprKind::Char(c) => self.out.text(&layout::char_literal(*c)),
            ExprKind::Bool(b) => self.out.text(if *b { "true" } else { "false" }),
            ExprKind::Unit => self.out.text("()"),
            ExprKind::Var(path) => {
                for module in &path.modules {
                    self.out.text(&format!("{module}."));
                }
                self.var_name(&path.name);
            }
            ExprKind::Constructor { path, args } => {
                self.out.text(&path.to_string());
                match args.as_slice() {
                    [] => {}
                    [arg @ Expr {
                        kind: ExprKind::Tuple(_),
                        ..
                    }] => {
                        self.out.text(" (");
                        self.expr_inner(arg);
                        self.out.text(")");
                    }
                    [arg] => {
                        self.out.text(" ");
                        self.expr(arg, prec::ATOM);
                    }
                    args => {
                        self.out.text(" (");
                        self.comma_list(args);
                        self.out.text(")");
                    }
                }
            }
            ExprKind::Tuple(items) => {
                self.out.text("(");
                self.comma_list(items);
                self.out.text(")");
            }
            ExprKind::List { items, tail: None } => {
                self.out.text("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.text("; ");
                    }
                    self.expr(item, prec::OR);
                }
                self.out.text("]");
            }
            ExprKind::List {
                items,
                tail: Some(tail),
            } => {
                for item in items {
                    self.expr(item, prec::CONS + 1);
                    self.out.text(" :: ");
                }
                self.expr(tail, prec::CONS);
            }
            ExprKind::Apply { func, args } => {
                self.expr(func, prec::ATOM);
                for arg in args {
                    self.out.text(" ");
                    self.expr(arg, prec::ATOM);
                }
            }
            ExprKind::Fun { params, body } => {
                self.out.text("fun");
                for param in params {
                    self.out.text(" ");
                    self.pattern(param, P_ATOM);
                }
                self.out.text(" ->");
                self.body(body);
            }
            ExprKind::Function(arms) => {
                self.out.text("function");
                self.arms(arms);
            }
            ExprKind::Let {
                rec,
                bindings,
                body,
            } => {
                self.let_bindings(*rec, bindings);
                self.out.text(" in");
                self.out.newline();
                self.expr(body, prec::LOWEST);
            }
            ExprKind::Seq(first, rest) => {
                self.expr(first, prec::OR);
                self.out.text(";");
                self.out.newline();
                self.expr(rest, prec::LOWEST);
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.out.text("if ");
                self.expr(cond, prec::LOWEST);
                self.out.text(" then ");
                self.expr(then_branch, prec::OR);
                if let Some(else_branch) = else_branch {
                    self.out.text(" else ");
                    // `else if` chains need no parentheses.
                    if matches!(else_branch.kind, ExprKind::If { .. }) {
                        self.expr_inner(else_branch);
                    } else {
                        self.expr(else_branch, prec::OR);
                    }
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                self.out.text("match ");
                self.expr(scrutinee, prec::LOWEST);
                self.out.text(" with");
                self.arms(arms);
            }
            ExprKind::Unary { op, operand } => {
                match op {
                    UnaryOp::Not => self.out.text("not "),
                    op => self.out.text(op.symbol(Syntax::Ml)),
                }
                if *op != UnaryOp::Not && layout::starts_with_minus(operand) {
                    self.out.text("(");
                    self.expr_inner(operand);
                    self.out.text(")");
                } else {
                    self.expr(operand, prec::UNARY);
                }
            }
            ExprKind::Binary { op, left, right } => {
                let level = op.precedence();
                let (left_min, right_min) = if op.is_right_assoc() {
                    (level + 1, level)
                } else {
                    (level, level + 1)
                };
                self.expr(left, left_min);
                self.out.text(&format!(" {} ", op.symbol(Syntax::Ml)));
                self.expr(right, right_min);
            }
        }
    }

    fn comma_list(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.text(", ");
            }
            self.expr(item, prec::OR);
        }
    }

    fn var_name(&mut self, name: &str) {
        if layout::is_operator_name(name) {
            self.out.text(&layout::operator_value(name, Syntax::Ml));
        } else {
            self.out.text(name);
        }
    }

    /// One arm per line. A non-final arm whose body would swallow the
    /// following arms is parenthesised.
    fn arms(&mut self, arms: &[MatchArm]) {
        for (i, arm) in arms.iter().enumerate() {
            self.out.newline();
            self.out.text("| ");
            self.pattern(&arm.pattern, P_OR);
            if let Some(guard) = &arm.guard {
                self.out.text(" when ");
                self.expr(guard, prec::OR);
            }
            self.out.text(" ->");
            let is_last = i + 1 == arms.len();
            if !is_last && ends_open(&arm.body) {
                self.out.text(" (");
                self.out.indent();
                self.expr(&arm.body, prec::LOWEST);
                self.out.dedent();
                self.out.text(")");
            } else {
                self.body(&arm.body);
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Patterns
    // ══════════════════════════════════════════════════════════════════════════

    fn pattern_level(pattern: &Pattern) -> u8 {
        match &pattern.kind {
            PatternKind::Or(..) => P_OR,
            PatternKind::List {
                items,
                tail: Some(tail),
            } => {
                if items.is_empty() {
                    Self::pattern_level(tail)
                } else {
                    P_CONS
                }
            }
            PatternKind::Constructor { args, .. } if !args.is_empty() => P_APP,
            PatternKind::Int(n) if *n < 0 => P_APP,
            PatternKind::Float(x) if x.is_sign_negative() => P_APP,
            _ => P_ATOM,
        }
    }

    fn pattern(&mut self, pattern: &Pattern, min: u8) {
        let wrap = Self::pattern_level(pattern) < min;
        if wrap {
            self.out.text("(");
        }
        self.pattern_inner(pattern);
        if wrap {
            self.out.text(")");
        }
    }

    fn pattern_inner(&mut self, pattern: &Pattern) {
        match &pattern.kind {
            PatternKind::Wildcard => self.out.text("_"),
            PatternKind::Var(name) => self.var_name(name),
            PatternKind::Int(n) => self.out.text(&n.to_string()),
            PatternKind::Float(x) => self.out.text(&layout::float_literal(*x)),
            PatternKind::Str(s) => self.out.text(&layout::string_literal(s)),
            PatternKind::Char(c) => self.out.text(&layout::char_literal(*c)),
            PatternKind::Bool(b) => self.out.text(if *b { "true" } else { "false" }),
            PatternKind::Unit => self.out.text("()"),
            PatternKind::Tuple(items) => {
                self.out.text("(");
                self.pattern_list(items, ", ", P_CONS);
                self.out.text(")");
            }
            PatternKind::Constructor { path, args } => {
                self.out.text(&path.to_string());
                match args.as_slice() {
                    [] => {}
                    [arg @ Pattern {
                        kind: PatternKind::Tuple(_),
                        ..
                    }] => {
                        self.out.text(" (");
                        self.pattern_inner(arg);
                        self.out.text(")");
                    }
                    [arg] => {
                        self.out.text(" ");
                        self.pattern(arg, P_ATOM);
                    }
                    args => {
                        self.out.text(" (");
                        self.pattern_list(args, ", ", P_CONS);
                        self.out.text(")");
                    }
                }
            }
            PatternKind::List { items, tail: None } => {
                self.out.text("[");
                self.pattern_list(items, "; ", P_CONS);
                self.out.text("]");
            }
            PatternKind::List {
                items,
                tail: Some(tail),
            } => {
                for item in items {
                    self.pattern(item, P_APP);
                    self.out.text(" :: ");
                }
                self.pattern(tail, P_CONS);
            }
            PatternKind::Or(left, right) => {
                self.pattern(left, P_OR);
                self.out.text(" | ");
                self.pattern(right, P_TUPLE);
            }
        }
    }

    fn pattern_list(&mut self, items: &[Pattern], separator: &str, min: u8) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.text(separator);
            }
            self.pattern(item, min);
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Types
    // ══════════════════════════════════════════════════════════════════════════

    fn type_decl(&mut self, decl: &TypeDecl) {
        match decl.params.as_slice() {
            [] => {}
            [param] => self.out.text(&format!("'{param} ")),
            params => {
                let params: Vec<String> = params.iter().map(|p| format!("'{p}")).collect();
                self.out.text(&format!("({}) ", params.join(", ")));
            }
        }
        self.out.text(&decl.name);
        match &decl.body {
            TypeBody::Abstract => {}
            TypeBody::Alias(ty) => {
                self.out.text(" = ");
                self.type_expr(ty, T_ARROW);
            }
            TypeBody::Variant(constructors) => {
                self.out.text(" =");
                for (i, constructor) in constructors.iter().enumerate() {
                    let separator = if i == 0 { " " } else { " | " };
                    self.out.text(&format!("{separator}{}", constructor.name));
                    for (i, arg) in constructor.args.iter().enumerate() {
                        self.out.text(if i == 0 { " of " } else { " * " });
                        self.type_expr(arg, T_APP);
                    }
                }
            }
        }
    }

    fn type_expr(&mut self, ty: &TypeExpr, min: u8) {
        let level = match ty {
            TypeExpr::Arrow(..) => T_ARROW,
            TypeExpr::Tuple(_) => T_TUPLE,
            TypeExpr::Var(_) | TypeExpr::Constr { .. } => T_APP,
        };
        let wrap = level < min;
        if wrap {
            self.out.text("(");
        }
        match ty {
            TypeExpr::Var(name) => self.out.text(&format!("'{name}")),
            TypeExpr::Constr { path, args } => {
                match args.as_slice() {
                    [] => {}
                    [arg] => {
                        self.type_expr(arg, T_APP);
                        self.out.text(" ");
                    }
                    args => {
                        self.out.text("(");
                        for (i, arg) in args.iter().enumerate() {
                            if i > 0 {
                                self.out.text(", ");
                            }
                            self.type_expr(arg, T_ARROW);
                        }
                        self.out.text(") ");
                    }
                }
                self.out.text(&path.to_string());
            }
            TypeExpr::Tuple(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.text(" * ");
                    }
                    self.type_expr(item, T_APP);
                }
            }
            TypeExpr::Arrow(param, result) => {
                self.type_expr(param, T_TUPLE);
                self.out.text(" -> ");
                self.type_expr(result, T_ARROW);
            }
        }
        if wrap {
            self.out.text(")");
        }
    }
}

/// Constructs printed over several lines start on a fresh line after `=`
/// or `->`.
fn breaks_line(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Match { .. } | ExprKind::Function(_) | ExprKind::Let { .. } | ExprKind::Seq(..)
    )
}

/// True if the printed expression ends in match arms that would absorb a
/// following `| pattern -> ...`.
pub(crate) fn ends_open(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Match { .. } | ExprKind::Function(_) => true,
        ExprKind::Fun { body, .. } | ExprKind::Let { body, .. } => ends_open(body),
        ExprKind::Seq(_, rest) => ends_open(rest),
        ExprKind::If {
            else_branch: Some(else_branch),
            ..
        } => matches!(else_branch.kind, ExprKind::If { .. }) && ends_open(else_branch),
        _ => false,
    }
}
