//! Printer for the Reason surface syntax.
//!
//! Reason brackets most constructs explicitly, so far fewer parentheses
//! are needed than in ML:
//!
//! - `let` and sequences print as `{ ... }` blocks and behave as atoms
//! - application is postfix: `f(a, b)`, `f(a)(b)`, `f()`
//! - `if` branches are always braced
//! - `switch` is closed by its brace and binds like a prefix operator
//!
//! Only lambdas, `fun | ...` and `if` extend as far right as possible.

use liveml_types::ast::*;
use liveml_types::Syntax;

use crate::layout::{self, Layout};

// Pattern levels.
const P_OR: u8 = 0;
const P_ATOM: u8 = 1;

pub(crate) fn print_program(program: &Program) -> String {
    let mut printer = ReasonPrinter { out: Layout::new() };
    printer.items(&program.items);
    printer.out.finish()
}

struct ReasonPrinter {
    out: Layout,
}

impl ReasonPrinter {
    // ══════════════════════════════════════════════════════════════════════════
    // Items
    // ══════════════════════════════════════════════════════════════════════════

    fn items(&mut self, items: &[Item]) {
        for item in items {
            self.item(item);
            self.out.text(";");
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
                self.out.text(&format!("module {name} = {{"));
                self.out.indent();
                self.out.newline();
                self.items(items);
                self.out.dedent();
                self.out.text("}");
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
            self.pattern(&binding.pattern, P_OR);
            self.out.text(" = ");
            self.expr(&binding.value, prec::LOWEST);
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
            | ExprKind::Tuple(_)
            | ExprKind::List { .. }
            | ExprKind::Let { .. }
            | ExprKind::Seq(..) => prec::ATOM,
            ExprKind::Constructor { .. } | ExprKind::Apply { .. } => prec::APPLY,
            ExprKind::Unary { .. } | ExprKind::Match { .. } => prec::UNARY,
            ExprKind::Binary { op, .. } => op.precedence(),
            ExprKind::Fun { .. } | ExprKind::Function(_) | ExprKind::If { .. } => prec::LOWEST,
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
                if !args.is_empty() {
                    self.call_args(args);
                }
            }
            ExprKind::Tuple(items) => {
                self.out.text("(");
                self.comma_list(items);
                self.out.text(")");
            }
            ExprKind::List { items, tail } => {
                self.out.text("[");
                self.comma_list(items);
                if let Some(tail) = tail {
                    if !items.is_empty() {
                        self.out.text(", ");
                    }
                    self.out.text("...");
                    self.expr(tail, prec::LOWEST);
                }
                self.out.text("]");
            }
            ExprKind::Apply { func, args } => {
                self.expr(func, prec::APPLY);
                self.call_args(args);
            }
            ExprKind::Fun { params, body } => {
                self.lambda_params(params);
                self.out.text(" => ");
                self.expr(body, prec::LOWEST);
            }
            ExprKind::Function(arms) => {
                self.out.text("fun");
                self.out.indent();
                self.fun_arms(arms);
                self.out.dedent();
            }
            ExprKind::Let { .. } | ExprKind::Seq(..) => self.block(expr),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.out.text("if (");
                self.expr(cond, prec::LOWEST);
                self.out.text(") ");
                self.block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.out.text(" else ");
                    if matches!(else_branch.kind, ExprKind::If { .. }) {
                        self.expr_inner(else_branch);
                    } else {
                        self.block(else_branch);
                    }
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                self.out.text("switch ");
                if matches!(scrutinee.kind, ExprKind::Tuple(_)) {
                    self.expr_inner(scrutinee);
                } else {
                    self.out.text("(");
                    self.expr(scrutinee, prec::LOWEST);
                    self.out.text(")");
                }
                self.out.text(" {");
                self.out.indent();
                self.switch_arms(arms);
                self.out.dedent();
                self.out.newline();
                self.out.text("}");
            }
            ExprKind::Unary { op, operand } => {
                self.out.text(op.symbol(Syntax::Reason));
                // `--x` and `!-x` would lex as a single operator.
                if layout::starts_with_minus(operand)
                    || matches!(operand.kind, ExprKind::Unary { .. })
                {
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
                self.out.text(&format!(" {} ", op.symbol(Syntax::Reason)));
                self.expr(right, right_min);
            }
        }
    }

    /// `(a, b)` after a function or constructor. A lone unit prints `()`.
    fn call_args(&mut self, args: &[Expr]) {
        if let [Expr {
            kind: ExprKind::Unit,
            ..
        }] = args
        {
            self.out.text("()");
            return;
        }
        self.out.text("(");
        self.comma_list(args);
        self.out.text(")");
    }

    fn comma_list(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.text(", ");
            }
            self.expr(item, prec::LOWEST);
        }
    }

    fn var_name(&mut self, name: &str) {
        if layout::is_operator_name(name) {
            self.out.text(&layout::operator_value(name, Syntax::Reason));
        } else {
            self.out.text(name);
        }
    }

    /// `x`, `_`, `()` or a parenthesised parameter list.
    fn lambda_params(&mut self, params: &[Pattern]) {
        match params {
            [Pattern {
                kind: PatternKind::Var(name),
                ..
            }] if !layout::is_operator_name(name) => self.out.text(name),
            [Pattern {
                kind: PatternKind::Wildcard,
                ..
            }] => self.out.text("_"),
            [Pattern {
                kind: PatternKind::Unit,
                ..
            }] => self.out.text("()"),
            params => {
                self.out.text("(");
                self.pattern_list(params, ", ");
                self.out.text(")");
            }
        }
    }

    // ── Blocks ────────────────────────────────────────────────────────────────

    /// `{ statements }` on separate lines.
    fn block(&mut self, expr: &Expr) {
        self.out.text("{");
        self.out.indent();
        self.out.newline();
        self.statements(expr);
        self.out.dedent();
        self.out.newline();
        self.out.text("}");
    }

    /// Flatten `let` and sequence chains into `;`-separated statements.
    fn statements(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Let {
                rec,
                bindings,
                body,
            } => {
                self.let_bindings(*rec, bindings);
                self.out.text(";");
                if matches!(body.kind, ExprKind::Unit) {
                    return;
                }
                self.out.newline();
                self.statements(body);
            }
            ExprKind::Seq(first, rest) => {
                self.expr(first, prec::LOWEST);
                self.out.text(";");
                self.out.newline();
                self.statements(rest);
            }
            _ => self.expr(expr, prec::LOWEST),
        }
    }

    // ── Arms ──────────────────────────────────────────────────────────────────

    fn arm_head(&mut self, arm: &MatchArm) {
        self.out.newline();
        self.out.text("| ");
        self.pattern(&arm.pattern, P_OR);
        if let Some(guard) = &arm.guard {
            self.out.text(" when ");
            self.expr(guard, prec::OR);
        }
        self.out.text(" =>");
    }

    /// Arms inside `switch { ... }`: bodies are statement lists that run
    /// to the next `|`.
    fn switch_arms(&mut self, arms: &[MatchArm]) {
        for (i, arm) in arms.iter().enumerate() {
            self.arm_head(arm);
            let is_last = i + 1 == arms.len();
            if !is_last && ends_open(&arm.body) {
                self.out.text(" ");
                self.block(&arm.body);
            } else if matches!(arm.body.kind, ExprKind::Let { .. } | ExprKind::Seq(..)) {
                self.out.indent();
                self.out.newline();
                self.statements(&arm.body);
                self.out.dedent();
            } else {
                self.out.text(" ");
                self.expr(&arm.body, prec::LOWEST);
            }
        }
    }

    /// Arms of `fun | ...`: each body is a single expression.
    fn fun_arms(&mut self, arms: &[MatchArm]) {
        for (i, arm) in arms.iter().enumerate() {
            self.arm_head(arm);
            self.out.text(" ");
            let is_last = i + 1 == arms.len();
            if !is_last && ends_open(&arm.body) {
                self.block(&arm.body);
            } else {
                self.expr(&arm.body, prec::LOWEST);
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Patterns
    // ══════════════════════════════════════════════════════════════════════════

    fn pattern(&mut self, pattern: &Pattern, min: u8) {
        let level = match pattern.kind {
            PatternKind::Or(..) => P_OR,
            _ => P_ATOM,
        };
        let wrap = level < min;
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
                self.pattern_list(items, ", ");
                self.out.text(")");
            }
            PatternKind::Constructor { path, args } => {
                self.out.text(&path.to_string());
                match args.as_slice() {
                    [] => {}
                    [Pattern {
                        kind: PatternKind::Unit,
                        ..
                    }] => self.out.text("()"),
                    args => {
                        self.out.text("(");
                        self.pattern_list(args, ", ");
                        self.out.text(")");
                    }
                }
            }
            PatternKind::List { items, tail } => {
                self.out.text("[");
                self.pattern_list(items, ", ");
                if let Some(tail) = tail {
                    if !items.is_empty() {
                        self.out.text(", ");
                    }
                    self.out.text("...");
                    self.pattern(tail, P_OR);
                }
                self.out.text("]");
            }
            PatternKind::Or(left, right) => {
                self.pattern(left, P_OR);
                self.out.text(" | ");
                self.pattern(right, P_ATOM);
            }
        }
    }

    fn pattern_list(&mut self, items: &[Pattern], separator: &str) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.text(separator);
            }
            self.pattern(item, P_OR);
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Types
    // ══════════════════════════════════════════════════════════════════════════

    fn type_decl(&mut self, decl: &TypeDecl) {
        self.out.text(&decl.name);
        if !decl.params.is_empty() {
            let params: Vec<String> = decl.params.iter().map(|p| format!("'{p}")).collect();
            self.out.text(&format!("({})", params.join(", ")));
        }
        match &decl.body {
            TypeBody::Abstract => {}
            TypeBody::Alias(ty) => {
                self.out.text(" = ");
                self.type_expr(ty);
            }
            TypeBody::Variant(constructors) => {
                self.out.text(" =");
                for (i, constructor) in constructors.iter().enumerate() {
                    let separator = if i == 0 { " " } else { " | " };
                    self.out.text(&format!("{separator}{}", constructor.name));
                    if !constructor.args.is_empty() {
                        self.type_list(&constructor.args);
                    }
                }
            }
        }
    }

    /// `(a, b)`
    fn type_list(&mut self, types: &[TypeExpr]) {
        self.out.text("(");
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                self.out.text(", ");
            }
            self.type_expr(ty);
        }
        self.out.text(")");
    }

    fn type_expr(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Var(name) => self.out.text(&format!("'{name}")),
            TypeExpr::Constr { path, args } => {
                self.out.text(&path.to_string());
                if !args.is_empty() {
                    self.type_list(args);
                }
            }
            TypeExpr::Tuple(items) => self.type_list(items),
            TypeExpr::Arrow(..) => {
                // Curried arrows print as one parameter list.
                let mut params = Vec::new();
                let mut result = ty;
                while let TypeExpr::Arrow(param, rest) = result {
                    params.push(param.as_ref());
                    result = rest;
                }
                match params.as_slice() {
                    [param @ (TypeExpr::Var(_) | TypeExpr::Constr { .. })] => {
                        self.type_expr(param)
                    }
                    params => {
                        self.out.text("(");
                        for (i, param) in params.iter().enumerate() {
                            if i > 0 {
                                self.out.text(", ");
                            }
                            self.type_expr(param);
                        }
                        self.out.text(")");
                    }
                }
                self.out.text(" => ");
                self.type_expr(result);
            }
        }
    }
}

/// True if the printed expression ends in `fun` arms that would absorb a
/// following `| pattern => ...`.
fn ends_open(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(_) => true,
        ExprKind::Fun { body, .. } | ExprKind::Let { body, .. } => ends_open(body),
        ExprKind::Seq(_, rest) => ends_open(rest),
        _ => false,
    }
}
