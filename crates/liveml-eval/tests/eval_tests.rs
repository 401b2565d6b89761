//! Integration tests for the LiveML evaluator.
//!
//! Tests key language features through a session:
//! - Arithmetic, strings, chars and printing
//! - Functions, partial application and user operators
//! - Pattern matching, user types and structural comparison
//! - The List prelude and Printf
//! - Picture natives (bbox, focus, render, draw) and Turtle.run
//! - Exceptions and resource bounds
//! - Determinism across repeated runs

use liveml_eval::{Session, SessionConfig, UnitOutput};
use liveml_types::Syntax;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Test configuration with a depth limit small enough for test threads.
fn config() -> SessionConfig {
    SessionConfig {
        max_call_depth: 64,
        ..SessionConfig::default()
    }
}

fn run(source: &str) -> Vec<UnitOutput> {
    let mut session = Session::new(config());
    session
        .execute(source)
        .expect("snippet should parse")
}

/// Printed value of the last unit, asserting it did not fault.
fn value(source: &str) -> String {
    let outputs = run(source);
    let last = outputs.last().expect("at least one unit");
    assert!(last.stderr.is_empty(), "unexpected fault: {}", last.stderr);
    last.value.clone()
}

/// Stderr of the last unit.
fn fault(source: &str) -> String {
    run(source).last().expect("at least one unit").stderr.clone()
}

fn stdout(source: &str) -> String {
    run(source)
        .iter()
        .map(|out| out.stdout.as_str())
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Numbers, strings and printing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn integer_arithmetic() {
    assert_eq!(value("1 + 2 * 3"), "7");
    assert_eq!(value("7 / 2"), "3");
    assert_eq!(value("-7 mod 2"), "-1");
    assert_eq!(value("(1 + 2) * 3"), "9");
}

#[test]
fn float_arithmetic() {
    assert_eq!(value("1.5 +. 1.5"), "3.");
    assert_eq!(value("2. ** 10."), "1024.");
    assert_eq!(value("float_of_int 3 /. 2."), "1.5");
    assert_eq!(value("int_of_float 3.9"), "3");
}

#[test]
fn strings_are_concatenated_and_quoted() {
    assert_eq!(value("\"ab\" ^ \"cd\""), "\"abcd\"");
    assert_eq!(value("String.length \"hello\""), "5");
    assert_eq!(value("String.sub \"hello\" 1 3"), "\"ell\"");
    assert_eq!(value("String.concat \", \" [\"a\"; \"b\"]"), "\"a, b\"");
    assert_eq!(
        value("String.split_on_char ',' \"x,y\""),
        "[\"x\"; \"y\"]"
    );
    assert_eq!(value("string_of_int 42 ^ \"!\""), "\"42!\"");
}

#[test]
fn chars_print_quoted() {
    assert_eq!(value("'a'"), "'a'");
    assert_eq!(value("Char.code 'A'"), "65");
    assert_eq!(value("Char.uppercase_ascii 'q'"), "'Q'");
}

#[test]
fn tuples_and_options_print_canonically() {
    assert_eq!(value("(1, \"a\", 'c')"), "(1, \"a\", 'c')");
    assert_eq!(value("Some (-1)"), "Some (-1)");
    assert_eq!(value("[Some 1; None]"), "[Some 1; None]");
}

#[test]
fn values_print_in_requested_syntax() {
    let mut session = Session::new(config());
    let outputs = session
        .execute_as("[Some 1; None]", Syntax::Reason)
        .unwrap();
    assert_eq!(outputs[0].value, "[Some(1), None]");
}

#[test]
fn print_functions_write_stdout() {
    assert_eq!(stdout("print_int 4; print_string \" \"; print_float 3."), "4 3.");
    assert_eq!(stdout("print_endline \"hi\""), "hi\n");
    let outputs = run("print_string \"side\"; 5");
    assert_eq!(outputs[0].stdout, "side");
    assert_eq!(outputs[0].value, "5");
}

#[test]
fn definitions_and_unit_print_nothing() {
    let outputs = run("let x = 1;; ()");
    assert!(outputs[0].is_empty());
    assert!(outputs[1].is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn functions_print_as_fun() {
    assert_eq!(value("fun x -> x"), "<fun>");
    assert_eq!(value("String.length"), "<fun>");
}

#[test]
fn partial_application() {
    assert_eq!(value("let add a b = a + b;; let inc = add 1;; inc 41"), "42");
    assert_eq!(value("List.map ((+) 10) [1; 2]"), "[11; 12]");
}

#[test]
fn pipes_from_prelude() {
    assert_eq!(
        value("[1; 2; 3] |> List.map (fun x -> x + 1) |> List.length"),
        "3"
    );
    assert_eq!(value("string_of_int @@ 6 * 7"), "\"42\"");
}

#[test]
fn user_operators() {
    assert_eq!(value("let ( <+> ) a b = a * 10 + b;; 1 <+> 2"), "12");
}

#[test]
fn recursion_and_tail_calls() {
    assert_eq!(
        value("let rec fact n = if n <= 1 then 1 else n * fact (n - 1);; fact 10"),
        "3628800"
    );
    assert_eq!(
        value("let rec count n acc = if n = 0 then acc else count (n - 1) (acc + 1);; count 50000 0"),
        "50000"
    );
}

#[test]
fn modules_and_open() {
    assert_eq!(value("module M = struct let x = 1 end;; M.x + 1"), "2");
    assert_eq!(
        value("module M = struct let double x = x * 2 end;; open M;; double 21"),
        "42"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Matching, types and comparison
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn match_with_guards() {
    assert_eq!(
        value("match 5 with n when n > 3 -> \"big\" | _ -> \"small\""),
        "\"big\""
    );
    assert_eq!(
        value("let f = function 0 | 1 -> \"small\" | _ -> \"many\";; f 1"),
        "\"small\""
    );
}

#[test]
fn user_variant_types() {
    let source = "type shape = Circle of float | Square of float;;
        let area = function Circle r -> 3. *. r *. r | Square s -> s *. s;;
        area (Square 2.)";
    assert_eq!(value(source), "4.");
}

#[test]
fn constructors_compare_in_declaration_order() {
    let source = "type t = A | B of int;; (A < B 0, B 1 < B 2, compare (B 3) (B 3))";
    assert_eq!(value(source), "(true, true, 0)");
}

#[test]
fn structural_and_physical_equality() {
    assert_eq!(value("[1; 2] = [1; 2]"), "true");
    assert_eq!(value("compare [1; 2] [1; 3]"), "-1");
    assert_eq!(value("let s = \"a\" in s == s"), "true");
    assert_eq!(value("(1, 'a') <> (1, 'b')"), "true");
}

#[test]
fn comparing_functions_raises() {
    assert_eq!(
        fault("(fun x -> x) = (fun x -> x)"),
        "Exception: Invalid_argument \"compare: functional value\"."
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// List prelude and Printf
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn list_library() {
    assert_eq!(value("List.map (fun x -> x * 2) [1; 2; 3]"), "[2; 4; 6]");
    assert_eq!(value("List.fold_left (+) 0 [1; 2; 3]"), "6");
    assert_eq!(value("List.fold_right (fun x acc -> x :: acc) [1; 2] [3]"), "[1; 2; 3]");
    assert_eq!(value("List.rev [1; 2; 3]"), "[3; 2; 1]");
    assert_eq!(value("List.filter (fun x -> x mod 2 = 0) [1; 2; 3; 4]"), "[2; 4]");
    assert_eq!(value("List.exists (fun x -> x > 2) [1; 2; 3]"), "true");
    assert_eq!(value("List.for_all (fun x -> x > 2) [1; 2; 3]"), "false");
    assert_eq!(value("List.assoc \"b\" [(\"a\", 1); (\"b\", 2)]"), "2");
    assert_eq!(value("List.nth [5; 6; 7] 2"), "7");
    assert_eq!(value("[1] @ [2; 3]"), "[1; 2; 3]");
    assert_eq!(value("List.concat [[1]; []; [2; 3]]"), "[1; 2; 3]");
}

#[test]
fn list_sort_is_stable_merge_sort() {
    assert_eq!(value("List.sort compare [3; 1; 2; 5; 4]"), "[1; 2; 3; 4; 5]");
    assert_eq!(value("List.sort compare []"), "[]");
}

#[test]
fn long_lists_do_not_exhaust_the_stack() {
    assert_eq!(value("List.init 20000 (fun i -> i) |> List.map succ |> List.length"), "20000");
}

#[test]
fn list_failures_raise() {
    assert_eq!(fault("List.hd []"), "Exception: Failure \"hd\".");
    assert_eq!(fault("List.find (fun x -> x > 9) [1]"), "Exception: Not_found.");
}

#[test]
fn printf_and_sprintf() {
    assert_eq!(value("Printf.sprintf \"%d-%s\" 3 \"x\""), "\"3-x\"");
    assert_eq!(value("Printf.sprintf \"%.1f%%\" 12.34"), "\"12.3%\"");
    assert_eq!(stdout("Printf.printf \"%s=%d\\n\" \"n\" 7"), "n=7\n");
    let partial = "let show = Printf.sprintf \"(%d, %d)\";; show 1 2";
    assert_eq!(value(partial), "\"(1, 2)\"");
}

// ══════════════════════════════════════════════════════════════════════════════
// Pictures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn bbox_of_shapes() {
    assert_eq!(value("bbox (circle 10.)"), "(-10., 10., -10., 10.)");
    assert_eq!(value("width (circle 10. ||| square 4.)"), "24.");
    assert_eq!(value("height (square 4. --- square 6.)"), "10.");
    assert_eq!(value("bbox (text \"label\")"), "(0., 0., 0., 0.)");
}

#[test]
fn focus_translates_anchor_to_origin() {
    assert_eq!(
        value("focus TL (square 10.)"),
        "Translate (Rectangle (10., 10.), 5., 5.)"
    );
    assert_eq!(value("bbox (focus BR (square 10.))"), "(-10., 0., -10., 0.)");
}

#[test]
fn draw_prints_svg_document() {
    let out = stdout("draw (circle 10.)");
    assert!(out.starts_with("<svg"), "got: {out}");
    assert!(out.ends_with("</svg>\n"), "got: {out}");
    assert!(out.contains("<ellipse"));
}

#[test]
fn render_escapes_text() {
    let svg = value("render (text \"<b>\")");
    assert!(svg.contains("&lt;b&gt;"), "got: {svg}");
}

#[test]
fn styles_reach_the_svg() {
    let out = stdout("draw (circle 5. |> fill (color \"red\") |> dashed)");
    assert!(out.contains("red"), "got: {out}");
}

#[test]
fn invalid_paths_are_rejected() {
    let err = fault("draw (OpenPath [LineTo (1., 1.)])");
    assert!(err.starts_with("Invalid image"), "got: {err}");
}

#[test]
fn turtle_paths() {
    assert_eq!(
        value("Turtle.run [Turtle.Forward 10.]"),
        "OpenPath [MoveTo (0., 0.); LineTo (10., 0.)]"
    );
    assert_eq!(
        value("open Turtle;; run [Branch [Forward 5.]; Forward 5.]"),
        "OpenPath [MoveTo (0., 0.); LineTo (5., 0.); MoveTo (0., 0.); LineTo (5., 0.)]"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Faults and resource bounds
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn exceptions_are_reported_in_stderr() {
    assert_eq!(fault("failwith \"boom\""), "Exception: Failure \"boom\".");
    assert_eq!(fault("invalid_arg \"bad\""), "Exception: Invalid_argument \"bad\".");
    assert_eq!(fault("raise Exit"), "Exception: Exit.");
    assert_eq!(fault("1 / 0"), "Exception: Division_by_zero.");
    assert_eq!(fault("match 3 with 1 -> 0"), "Exception: Match_failure.");
}

#[test]
fn unbound_names() {
    assert_eq!(fault("y + 1"), "Unbound value y");
    assert_eq!(fault("Nope 1"), "Unbound constructor Nope");
}

#[test]
fn step_limit_stops_runaway_loop() {
    let mut session = Session::new(SessionConfig {
        gas_limit: 10_000,
        ..config()
    });
    let outputs = session
        .execute("let rec spin () = spin ();; spin ()")
        .unwrap();
    assert_eq!(
        outputs[1].stderr,
        "Execution stopped: step limit of 10000 exceeded"
    );
}

#[test]
fn depth_limit_stops_deep_recursion() {
    let err = fault("let rec f n = 1 + f n;; f 0");
    assert!(err.starts_with("Stack overflow"), "got: {err}");
}

#[test]
fn timeout_stops_runaway_loop() {
    let mut session = Session::new(SessionConfig {
        gas_limit: u64::MAX,
        timeout_ms: Some(50),
        ..config()
    });
    let outputs = session
        .execute("let rec spin () = spin ();; spin ()")
        .unwrap();
    assert_eq!(outputs[1].stderr, "Execution stopped: timed out after 50 ms");
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn evaluation_is_deterministic() {
    let source = "let xs = List.init 50 (fun i -> (i * 7919) mod 101);;
        List.sort compare xs;;
        draw (regularPolygon 6 20. 0. ||| circle 5.)";
    let mut session = Session::new(config());
    let first = session.execute(source).unwrap();
    for _ in 0..100 {
        session.reset().unwrap();
        assert_eq!(session.execute(source).unwrap(), first);
    }
}
