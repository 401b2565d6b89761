//! Parser tests for both surface syntaxes.
//!
//! Covers: let bindings and function sugar, precedence and associativity,
//! application, constructors, lists and cons, match/switch, blocks, type
//! declarations, modules, error reporting and recovery, and determinism.

use liveml_parser::{parse, ParseResult};
use liveml_types::ast::*;
use liveml_types::{ErrorCode, SourceFile, Syntax};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse_in(syntax: Syntax, source: &str) -> ParseResult {
    let sf = SourceFile::new("test", source);
    parse(&sf, syntax)
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(syntax: Syntax, source: &str) -> Program {
    let result = parse_in(syntax, source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.program.expect("no program returned")
}

fn ml(source: &str) -> Program {
    parse_ok(Syntax::Ml, source)
}

fn re(source: &str) -> Program {
    parse_ok(Syntax::Reason, source)
}

/// The single bare expression of a one-item program.
fn expr_of(program: &Program) -> &Expr {
    assert_eq!(program.items.len(), 1, "expected exactly one item");
    match &program.items[0].kind {
        ItemKind::Expr(e) => e,
        other => panic!("expected an expression item, got {other:?}"),
    }
}

/// The value of the first binding of a one-item `let` program.
fn let_value(program: &Program) -> &Expr {
    match &program.items[0].kind {
        ItemKind::Let { bindings, .. } => &bindings[0].value,
        other => panic!("expected a let item, got {other:?}"),
    }
}

fn error_codes(syntax: Syntax, source: &str) -> Vec<ErrorCode> {
    parse_in(syntax, source)
        .errors
        .errors
        .iter()
        .map(|e| e.code)
        .collect()
}

fn is_var(expr: &Expr, name: &str) -> bool {
    matches!(&expr.kind, ExprKind::Var(p) if p.name == name && p.modules.is_empty())
}

// ─────────────────────────────────────────────────────────────────────
// ML: let bindings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_simple_let() {
    let prog = ml("let x = 42;;");
    match &prog.items[0].kind {
        ItemKind::Let { rec, bindings } => {
            assert!(!rec);
            assert_eq!(bindings.len(), 1);
            assert!(matches!(bindings[0].pattern.kind, PatternKind::Var(ref n) if n == "x"));
            assert!(matches!(bindings[0].value.kind, ExprKind::Int(42)));
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_ml_function_sugar() {
    let prog = ml("let add x y = x + y");
    match &let_value(&prog).kind {
        ExprKind::Fun { params, body } => {
            assert_eq!(params.len(), 2);
            assert!(matches!(body.kind, ExprKind::Binary { op: BinOp::Add, .. }));
        }
        other => panic!("expected fun, got {other:?}"),
    }
}

#[test]
fn test_ml_let_rec() {
    let prog = ml("let rec fact n = if n = 0 then 1 else n * fact (n - 1);;");
    match &prog.items[0].kind {
        ItemKind::Let { rec, bindings } => {
            assert!(rec);
            match &bindings[0].value.kind {
                ExprKind::Fun { body, .. } => {
                    assert!(matches!(body.kind, ExprKind::If { else_branch: Some(_), .. }))
                }
                other => panic!("expected fun, got {other:?}"),
            }
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_ml_let_rec_and() {
    let prog = ml(
        "let rec even n = if n = 0 then true else odd (n - 1)\n\
         and odd n = if n = 0 then false else even (n - 1);;",
    );
    match &prog.items[0].kind {
        ItemKind::Let { rec, bindings } => {
            assert!(rec);
            assert_eq!(bindings.len(), 2);
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_ml_let_rec_requires_function() {
    assert_eq!(
        error_codes(Syntax::Ml, "let rec x = 5;;"),
        vec![ErrorCode::INVALID_BINDING]
    );
}

#[test]
fn test_ml_let_in_at_top_level_is_expression() {
    let prog = ml("let x = 1 in x + 1;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Let { .. }));
}

#[test]
fn test_ml_tuple_pattern_binding() {
    let prog = ml("let (a, b) = (1, 2);;");
    match &prog.items[0].kind {
        ItemKind::Let { bindings, .. } => {
            assert!(matches!(bindings[0].pattern.kind, PatternKind::Tuple(ref ps) if ps.len() == 2));
            assert!(matches!(bindings[0].value.kind, ExprKind::Tuple(ref es) if es.len() == 2));
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_ml_annotated_binding() {
    let prog = ml("let f (x : int) : int = x * 2;;");
    assert!(matches!(let_value(&prog).kind, ExprKind::Fun { ref params, .. } if params.len() == 1));
}

#[test]
fn test_ml_operator_definition() {
    let prog = ml("let (|||) a b = a + b;;");
    match &prog.items[0].kind {
        ItemKind::Let { bindings, .. } => {
            assert!(matches!(bindings[0].pattern.kind, PatternKind::Var(ref n) if n == "|||"));
            assert!(matches!(bindings[0].value.kind, ExprKind::Fun { .. }));
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_ml_items_without_double_semicolon() {
    let prog = ml("let x = 1\nlet y = 2\ntype t = A\nopen List");
    assert_eq!(prog.items.len(), 4);
}

// ─────────────────────────────────────────────────────────────────────
// ML: precedence
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_mul_binds_tighter_than_add() {
    let prog = ml("1 + 2 * 3;;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Add, left, right } => {
            assert!(matches!(left.kind, ExprKind::Int(1)));
            assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("expected add, got {other:?}"),
    }
}

#[test]
fn test_ml_sub_is_left_assoc() {
    let prog = ml("10 - 3 - 2;;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Sub, left, right } => {
            assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
            assert!(matches!(right.kind, ExprKind::Int(2)));
        }
        other => panic!("expected sub, got {other:?}"),
    }
}

#[test]
fn test_ml_pow_is_right_assoc() {
    let prog = ml("2. ** 3. ** 2.;;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Pow, left, right } => {
            assert!(matches!(left.kind, ExprKind::Float(_)));
            assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
        }
        other => panic!("expected pow, got {other:?}"),
    }
}

#[test]
fn test_ml_concat_is_right_assoc() {
    let prog = ml("\"a\" ^ \"b\" ^ \"c\";;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Concat, right, .. } => {
            assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Concat, .. }));
        }
        other => panic!("expected concat, got {other:?}"),
    }
}

#[test]
fn test_ml_custom_operator_precedence_from_first_char() {
    // `|||` compares, so `+` binds tighter.
    let prog = ml("a ||| b + c;;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Custom(name), right, .. } => {
            assert_eq!(name, "|||");
            assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Add, .. }));
        }
        other => panic!("expected custom operator, got {other:?}"),
    }
}

#[test]
fn test_ml_comparison_and_boolean() {
    let prog = ml("a < b && b < c || d;;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Or, left, .. } => {
            assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::And, .. }));
        }
        other => panic!("expected or, got {other:?}"),
    }
}

#[test]
fn test_ml_equality_operators() {
    let prog = ml("a = b;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Binary { op: BinOp::Eq, .. }));
    let prog = ml("a <> b;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Binary { op: BinOp::Ne, .. }));
    let prog = ml("a == b;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Binary { op: BinOp::PhysEq, .. }));
}

#[test]
fn test_ml_application_binds_tighter_than_operators() {
    let prog = ml("f x + g y;;");
    match &expr_of(&prog).kind {
        ExprKind::Binary { op: BinOp::Add, left, right } => {
            assert!(matches!(left.kind, ExprKind::Apply { .. }));
            assert!(matches!(right.kind, ExprKind::Apply { .. }));
        }
        other => panic!("expected add, got {other:?}"),
    }
}

#[test]
fn test_ml_negative_literal_is_folded() {
    let prog = ml("-5;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Int(-5)));
    let prog = ml("-. 2.5;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Float(x) if x == -2.5));
}

#[test]
fn test_ml_negation_of_variable() {
    let prog = ml("- x;;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::Unary { op: UnaryOp::Neg, .. }
    ));
}

#[test]
fn test_ml_not() {
    let prog = ml("not true;;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::Unary { op: UnaryOp::Not, .. }
    ));
}

#[test]
fn test_ml_tuple() {
    let prog = ml("1, 2, 3;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Tuple(ref items) if items.len() == 3));
}

#[test]
fn test_ml_sequence() {
    let prog = ml("print_string \"a\"; print_string \"b\";;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Seq(..)));
}

// ─────────────────────────────────────────────────────────────────────
// ML: application, constructors, lists
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_curried_application() {
    let prog = ml("f a b;;");
    match &expr_of(&prog).kind {
        ExprKind::Apply { func, args } => {
            assert!(is_var(func, "f"));
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected apply, got {other:?}"),
    }
}

#[test]
fn test_ml_qualified_name() {
    let prog = ml("List.map f xs;;");
    match &expr_of(&prog).kind {
        ExprKind::Apply { func, .. } => match &func.kind {
            ExprKind::Var(path) => {
                assert_eq!(path.modules, vec!["List".to_string()]);
                assert_eq!(path.name, "map");
            }
            other => panic!("expected var, got {other:?}"),
        },
        other => panic!("expected apply, got {other:?}"),
    }
}

#[test]
fn test_ml_constructor_arguments() {
    let prog = ml("Node (l, v, r);;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::Constructor { ref args, .. } if args.len() == 3
    ));
    let prog = ml("Some x;;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::Constructor { ref args, .. } if args.len() == 1
    ));
    let prog = ml("None;;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::Constructor { ref args, .. } if args.is_empty()
    ));
}

#[test]
fn test_ml_list_literal() {
    let prog = ml("[1; 2; 3];;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::List { ref items, tail: None } if items.len() == 3
    ));
}

#[test]
fn test_ml_cons_flattens_into_list() {
    let prog = ml("1 :: 2 :: [];;");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::List { ref items, tail: None } if items.len() == 2
    ));
}

#[test]
fn test_ml_cons_onto_variable() {
    let prog = ml("x :: rest;;");
    match &expr_of(&prog).kind {
        ExprKind::List { items, tail: Some(tail) } => {
            assert_eq!(items.len(), 1);
            assert!(is_var(tail, "rest"));
        }
        other => panic!("expected list with tail, got {other:?}"),
    }
}

#[test]
fn test_ml_operator_section_as_value() {
    let prog = ml("List.fold_left (+) 0 xs;;");
    match &expr_of(&prog).kind {
        ExprKind::Apply { args, .. } => assert!(is_var(&args[0], "+")),
        other => panic!("expected apply, got {other:?}"),
    }
}

#[test]
fn test_ml_begin_end_and_unit() {
    let prog = ml("begin () end;;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Unit));
}

// ─────────────────────────────────────────────────────────────────────
// ML: match / function / fun / if
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_match_on_list() {
    let prog = ml("match l with\n| [] -> 0\n| x :: rest -> x;;");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => {
            assert_eq!(arms.len(), 2);
            assert!(matches!(
                arms[0].pattern.kind,
                PatternKind::List { ref items, tail: None } if items.is_empty()
            ));
            assert!(matches!(
                arms[1].pattern.kind,
                PatternKind::List { ref items, tail: Some(_) } if items.len() == 1
            ));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_ml_match_guard_and_or_pattern() {
    let prog = ml("match n with 1 | 2 -> \"small\" | n when n < 0 -> \"neg\" | _ -> \"big\";;");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => {
            assert_eq!(arms.len(), 3);
            assert!(matches!(arms[0].pattern.kind, PatternKind::Or(..)));
            assert!(arms[1].guard.is_some());
            assert!(matches!(arms[2].pattern.kind, PatternKind::Wildcard));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_ml_constructor_patterns() {
    let prog = ml("match t with Leaf -> 0 | Node (l, _, r) -> 1 | Some -1 -> 2;;");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => {
            assert!(matches!(
                arms[1].pattern.kind,
                PatternKind::Constructor { ref args, .. } if args.len() == 3
            ));
            match &arms[2].pattern.kind {
                PatternKind::Constructor { args, .. } => {
                    assert!(matches!(args[0].kind, PatternKind::Int(-1)))
                }
                other => panic!("expected constructor, got {other:?}"),
            }
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_ml_function_keyword() {
    let prog = ml("let f = function 0 -> \"zero\" | _ -> \"other\";;");
    assert!(matches!(let_value(&prog).kind, ExprKind::Function(ref arms) if arms.len() == 2));
}

#[test]
fn test_ml_fun_extends_right() {
    let prog = ml("fun x -> x + 1;;");
    match &expr_of(&prog).kind {
        ExprKind::Fun { params, body } => {
            assert_eq!(params.len(), 1);
            assert!(matches!(body.kind, ExprKind::Binary { op: BinOp::Add, .. }));
        }
        other => panic!("expected fun, got {other:?}"),
    }
}

#[test]
fn test_ml_if_without_else_in_sequence() {
    let prog = ml("if x then print_string \"a\"; print_string \"b\";;");
    match &expr_of(&prog).kind {
        ExprKind::Seq(first, _) => {
            assert!(matches!(first.kind, ExprKind::If { else_branch: None, .. }))
        }
        other => panic!("expected sequence, got {other:?}"),
    }
}

#[test]
fn test_ml_comments_are_ignored() {
    let prog = ml("(* a (* nested *) comment *) let x = 1;;");
    assert_eq!(prog.items.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────
// ML: types and modules
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_variant_type() {
    let prog = ml("type 'a tree = Leaf | Node of 'a tree * 'a * 'a tree;;");
    match &prog.items[0].kind {
        ItemKind::Type(decls) => {
            assert_eq!(decls[0].name, "tree");
            assert_eq!(decls[0].params, vec!["a".to_string()]);
            match &decls[0].body {
                TypeBody::Variant(ctors) => {
                    assert_eq!(ctors.len(), 2);
                    assert_eq!(ctors[0].name, "Leaf");
                    assert!(ctors[0].args.is_empty());
                    assert_eq!(ctors[1].args.len(), 3);
                }
                other => panic!("expected variant, got {other:?}"),
            }
        }
        other => panic!("expected type, got {other:?}"),
    }
}

#[test]
fn test_ml_alias_and_abstract_types() {
    let prog = ml("type point = int * int\nand name\nand f = int -> int list;;");
    match &prog.items[0].kind {
        ItemKind::Type(decls) => {
            assert_eq!(decls.len(), 3);
            assert!(matches!(decls[0].body, TypeBody::Alias(TypeExpr::Tuple(ref t)) if t.len() == 2));
            assert!(matches!(decls[1].body, TypeBody::Abstract));
            assert!(matches!(decls[2].body, TypeBody::Alias(TypeExpr::Arrow(..))));
        }
        other => panic!("expected type, got {other:?}"),
    }
}

#[test]
fn test_ml_multi_param_type() {
    let prog = ml("type ('k, 'v) assoc = ('k * 'v) list;;");
    match &prog.items[0].kind {
        ItemKind::Type(decls) => {
            assert_eq!(decls[0].params.len(), 2);
            assert!(matches!(
                decls[0].body,
                TypeBody::Alias(TypeExpr::Constr { ref args, .. }) if args.len() == 1
            ));
        }
        other => panic!("expected type, got {other:?}"),
    }
}

#[test]
fn test_ml_module_and_qualified_access() {
    let prog = ml("module M = struct let x = 1 let y = 2 end;; M.x;;");
    assert_eq!(prog.items.len(), 2);
    match &prog.items[0].kind {
        ItemKind::Module { name, items } => {
            assert_eq!(name, "M");
            assert_eq!(items.len(), 2);
        }
        other => panic!("expected module, got {other:?}"),
    }
}

#[test]
fn test_ml_open() {
    let prog = ml("open Turtle;;");
    assert!(matches!(prog.items[0].kind, ItemKind::Open(ref p) if p.name == "Turtle"));
}

// ─────────────────────────────────────────────────────────────────────
// Reason
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_re_simple_let() {
    let prog = re("let x = 1 + 2;");
    assert!(matches!(let_value(&prog).kind, ExprKind::Binary { op: BinOp::Add, .. }));
}

#[test]
fn test_re_lambda_with_params() {
    let prog = re("let add = (a, b) => a + b;");
    assert!(matches!(let_value(&prog).kind, ExprKind::Fun { ref params, .. } if params.len() == 2));
}

#[test]
fn test_re_lambda_single_and_unit() {
    let prog = re("let f = x => x * 2;");
    assert!(matches!(let_value(&prog).kind, ExprKind::Fun { ref params, .. } if params.len() == 1));
    let prog = re("let g = () => 1;");
    match &let_value(&prog).kind {
        ExprKind::Fun { params, .. } => assert!(matches!(params[0].kind, PatternKind::Unit)),
        other => panic!("expected fun, got {other:?}"),
    }
}

#[test]
fn test_re_application() {
    let prog = re("f(1, 2);");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Apply { ref args, .. } if args.len() == 2));
    let prog = re("f();");
    match &expr_of(&prog).kind {
        ExprKind::Apply { args, .. } => assert!(matches!(args[0].kind, ExprKind::Unit)),
        other => panic!("expected apply, got {other:?}"),
    }
}

#[test]
fn test_re_chained_application_is_nested() {
    let prog = re("f(a)(b);");
    match &expr_of(&prog).kind {
        ExprKind::Apply { func, args } => {
            assert_eq!(args.len(), 1);
            assert!(matches!(func.kind, ExprKind::Apply { .. }));
        }
        other => panic!("expected apply, got {other:?}"),
    }
}

#[test]
fn test_re_operators() {
    let prog = re("\"a\" ++ \"b\";");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Binary { op: BinOp::Concat, .. }));
    let prog = re("a == b;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Binary { op: BinOp::Eq, .. }));
    let prog = re("a != b;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Binary { op: BinOp::Ne, .. }));
    let prog = re("!done;");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn test_re_tuple_needs_parens() {
    let prog = re("(1, \"two\", 3.0);");
    assert!(matches!(expr_of(&prog).kind, ExprKind::Tuple(ref items) if items.len() == 3));
}

#[test]
fn test_re_list_with_spread() {
    let prog = re("[1, 2, ...rest];");
    match &expr_of(&prog).kind {
        ExprKind::List { items, tail: Some(tail) } => {
            assert_eq!(items.len(), 2);
            assert!(is_var(tail, "rest"));
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_re_constructor_arguments() {
    let prog = re("Node(l, v, r);");
    assert!(matches!(
        expr_of(&prog).kind,
        ExprKind::Constructor { ref args, .. } if args.len() == 3
    ));
}

#[test]
fn test_re_block_becomes_let() {
    let prog = re("let f = x => {\n  let y = x + 1;\n  print_int(y);\n  y * 2\n};");
    match &let_value(&prog).kind {
        ExprKind::Fun { body, .. } => match &body.kind {
            ExprKind::Let { body, .. } => assert!(matches!(body.kind, ExprKind::Seq(..))),
            other => panic!("expected let, got {other:?}"),
        },
        other => panic!("expected fun, got {other:?}"),
    }
}

#[test]
fn test_re_switch() {
    let prog = re("switch (l) {\n| [] => 0\n| [x, ...rest] => x\n};");
    match &expr_of(&prog).kind {
        ExprKind::Match { scrutinee, arms } => {
            assert!(is_var(scrutinee, "l"));
            assert_eq!(arms.len(), 2);
            assert!(matches!(
                arms[1].pattern.kind,
                PatternKind::List { ref items, tail: Some(_) } if items.len() == 1
            ));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_re_switch_arm_with_sequence_body() {
    let prog = re("switch (x) {\n| Some(v) => print_int(v); v\n| None => 0\n};");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => {
            assert!(matches!(arms[0].body.kind, ExprKind::Seq(..)));
            assert!(matches!(arms[1].body.kind, ExprKind::Int(0)));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_re_fun_arms() {
    let prog = re("let f = fun | 0 => \"zero\" | _ => \"other\";");
    assert!(matches!(let_value(&prog).kind, ExprKind::Function(ref arms) if arms.len() == 2));
}

#[test]
fn test_re_if_else_chain() {
    let prog = re("if (x > 0) { 1 } else if (x < 0) { -1 } else { 0 };");
    match &expr_of(&prog).kind {
        ExprKind::If {
            else_branch: Some(else_branch),
            ..
        } => assert!(matches!(else_branch.kind, ExprKind::If { .. })),
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_re_guard_ending_in_identifier() {
    let prog = re("let limit = 3;\nlet f = x => switch (x) { | Some(y) when y > limit => 1 | _ => 0 };");
    let value = match &prog.items[1].kind {
        ItemKind::Let { bindings, .. } => &bindings[0].value,
        other => panic!("expected a let item, got {other:?}"),
    };
    match &value.kind {
        ExprKind::Fun { body, .. } => match &body.kind {
            ExprKind::Match { arms, .. } => {
                assert_eq!(arms.len(), 2);
                let guard = arms[0].guard.as_ref().expect("guard");
                match &guard.kind {
                    ExprKind::Binary { op: BinOp::Gt, right, .. } => assert!(is_var(right, "limit")),
                    other => panic!("expected comparison guard, got {other:?}"),
                }
                assert!(matches!(arms[0].body.kind, ExprKind::Int(1)));
            }
            other => panic!("expected switch, got {other:?}"),
        },
        other => panic!("expected fun, got {other:?}"),
    }
}

#[test]
fn test_re_guard_ending_in_parens() {
    let prog = re("switch (p) { | (a, b) when (a > b) => a | (_, b) when ok(b) => b | _ => 0 };");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => {
            assert_eq!(arms.len(), 3);
            assert!(is_var(&arms[0].body, "a"));
            assert!(matches!(
                arms[1].guard.as_ref().map(|g| &g.kind),
                Some(ExprKind::Apply { .. })
            ));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_re_lambda_inside_guard_parens() {
    let prog = re("switch (xs) { | [x, ..._] when exists(y => y == x) => 1 | _ => 0 };");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => match &arms[0].guard.as_ref().expect("guard").kind {
            ExprKind::Apply { args, .. } => assert!(matches!(args[0].kind, ExprKind::Fun { .. })),
            other => panic!("expected apply, got {other:?}"),
        },
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_re_arm_body_lambda_after_guard() {
    let prog = re("switch (n) { | k when k > 0 => x => x + k | _ => x => x };");
    match &expr_of(&prog).kind {
        ExprKind::Match { arms, .. } => {
            assert!(matches!(arms[0].body.kind, ExprKind::Fun { .. }));
            assert!(matches!(arms[1].body.kind, ExprKind::Fun { .. }));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_re_conditional_operator() {
    let prog = re("let sign = x => x > 0 ? \"pos\" : x < 0 ? \"neg\" : \"zero\";");
    match &let_value(&prog).kind {
        ExprKind::Fun { body, .. } => match &body.kind {
            ExprKind::If {
                cond,
                else_branch: Some(else_branch),
                ..
            } => {
                assert!(matches!(cond.kind, ExprKind::Binary { op: BinOp::Gt, .. }));
                assert!(matches!(else_branch.kind, ExprKind::If { .. }));
            }
            other => panic!("expected if, got {other:?}"),
        },
        other => panic!("expected fun, got {other:?}"),
    }
}

#[test]
fn test_re_conditional_needs_colon() {
    assert!(!error_codes(Syntax::Reason, "let x = a ? 1;").is_empty());
}

#[test]
fn test_re_variant_type() {
    let prog = re("type tree('a) = Leaf | Node(tree('a), 'a, tree('a));");
    match &prog.items[0].kind {
        ItemKind::Type(decls) => {
            assert_eq!(decls[0].params, vec!["a".to_string()]);
            match &decls[0].body {
                TypeBody::Variant(ctors) => assert_eq!(ctors[1].args.len(), 3),
                other => panic!("expected variant, got {other:?}"),
            }
        }
        other => panic!("expected type, got {other:?}"),
    }
}

#[test]
fn test_re_function_types() {
    let prog = re("type f = (int, int) => int;\ntype g = ((int, int)) => int;");
    let body = |i: usize| match &prog.items[i].kind {
        ItemKind::Type(decls) => decls[0].body.clone(),
        other => panic!("expected type, got {other:?}"),
    };
    match body(0) {
        TypeBody::Alias(TypeExpr::Arrow(param, result)) => {
            assert!(matches!(*param, TypeExpr::Constr { .. }));
            assert!(matches!(*result, TypeExpr::Arrow(..)));
        }
        other => panic!("expected curried arrow, got {other:?}"),
    }
    match body(1) {
        TypeBody::Alias(TypeExpr::Arrow(param, _)) => {
            assert!(matches!(*param, TypeExpr::Tuple(_)));
        }
        other => panic!("expected tuple arrow, got {other:?}"),
    }
}

#[test]
fn test_re_module() {
    let prog = re("module M = {\n  let x = 1;\n  let y = 2;\n};\nM.y;");
    assert_eq!(prog.items.len(), 2);
    assert!(matches!(prog.items[0].kind, ItemKind::Module { ref items, .. } if items.len() == 2));
}

#[test]
fn test_re_comments_are_ignored() {
    let prog = re("// line\n/* block */ let x = 1;");
    assert_eq!(prog.items.len(), 1);
}

#[test]
fn test_same_program_in_both_syntaxes() {
    let a = ml("let rec len l = match l with [] -> 0 | _ :: t -> 1 + len t;;");
    let b = re("let rec len = l => switch (l) { | [] => 0 | [_, ...t] => 1 + len(t) };");
    let shape = |p: &Program| match &p.items[0].kind {
        ItemKind::Let { rec, bindings } => (
            *rec,
            bindings.len(),
            matches!(bindings[0].value.kind, ExprKind::Fun { .. }),
        ),
        _ => (false, 0, false),
    };
    assert_eq!(shape(&a), shape(&b));
}

// ─────────────────────────────────────────────────────────────────────
// Errors and recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unclosed_paren() {
    let result = parse_in(Syntax::Ml, "(1 + 2;;");
    assert!(result.program.is_none());
    assert_eq!(
        result.errors.first().map(|e| e.code),
        Some(ErrorCode::UNCLOSED_DELIMITER)
    );
}

#[test]
fn test_missing_expression_reports_position() {
    let result = parse_in(Syntax::Ml, "let x =\n;;");
    let first = result.errors.first().expect("an error");
    assert_eq!(first.code, ErrorCode::EXPECTED_EXPRESSION);
    assert_eq!(first.span.start_line, 2);
    assert_eq!(first.span.start_col, 1);
}

#[test]
fn test_ml_recovers_at_double_semicolon() {
    let result = parse_in(Syntax::Ml, "let x = ;;\nlet y = 2;;\nlet z = );;");
    assert!(result.program.is_none());
    assert_eq!(result.errors.total_errors, 2);
}

#[test]
fn test_re_missing_semicolon() {
    assert_eq!(
        error_codes(Syntax::Reason, "let x = 1 let y = 2;"),
        vec![ErrorCode::UNEXPECTED_TOKEN]
    );
}

#[test]
fn test_lexer_errors_are_reported() {
    let result = parse_in(Syntax::Ml, "let s = \"abc");
    assert!(result.program.is_none());
    assert!(result
        .errors
        .errors
        .iter()
        .any(|e| e.code == ErrorCode::UNTERMINATED_STRING));
}

#[test]
fn test_ml_keyword_is_not_reason_keyword() {
    // `match` is an ordinary name in Reason.
    let prog = re("let match = 1;");
    assert_eq!(prog.items.len(), 1);
    assert!(!parse_in(Syntax::Ml, "let match = 1;;").errors.errors.is_empty());
}

#[test]
fn test_deep_nesting_is_an_error_not_a_crash() {
    let source = format!("{}1{};;", "(".repeat(500), ")".repeat(500));
    let result = parse_in(Syntax::Ml, &source);
    assert!(result
        .errors
        .errors
        .iter()
        .any(|e| e.code == ErrorCode::NESTING_TOO_DEEP));
}

#[test]
fn test_empty_program() {
    assert!(ml("").items.is_empty());
    assert!(re("  // nothing\n").items.is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "type shape = Circle of float | Rect of float * float;;\n\
                  let area = function Circle r -> 3.0 *. r *. r | Rect (w, h) -> w *. h;;\n\
                  List.map area [Circle 1.0; Rect (2.0, 3.0)];;";
    let first = ml(source);
    for i in 0..100 {
        let again = ml(source);
        assert_eq!(first, again, "parse differed on iteration {i}");
    }
}
