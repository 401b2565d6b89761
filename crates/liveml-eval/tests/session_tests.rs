//! Tests for persistent evaluation sessions.
//!
//! Covers:
//! - Bindings persisting across executions until reset
//! - Syntax errors rejecting a whole snippet without side effects
//! - Per-unit fault isolation
//! - Reset semantics and prelude failure
//! - Step, time and nesting limits on large images and deep data
//! - Cancellation from another thread

use std::thread;
use std::time::Duration;

use liveml_eval::{Session, SessionConfig, SessionError, UnitOutput};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn config() -> SessionConfig {
    SessionConfig {
        max_call_depth: 64,
        ..SessionConfig::default()
    }
}

fn session() -> Session {
    Session::new(config())
}

/// Run `f` on a thread with a stack of `bytes`.
fn on_stack<T: Send + 'static>(bytes: usize, f: impl FnOnce() -> T + Send + 'static) -> T {
    thread::Builder::new()
        .stack_size(bytes)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

/// Doubles an image `n` times by placing it beside itself. The value
/// shares its halves, but the drawing has 2^n leaves.
const GROW: &str = "let rec grow n img = if n = 0 then img else grow (n - 1) (beside img img);;";

/// Wraps `acc` in `n` layers of `Some`.
const BUILD: &str = "let rec build n acc = if n = 0 then acc else build (n - 1) (Some acc);;";

/// Execute and return the outputs, failing the test on a session error.
fn exec(session: &mut Session, source: &str) -> Vec<UnitOutput> {
    match session.execute(source) {
        Ok(outputs) => outputs,
        Err(e) => panic!("execute failed for {source:?}: {e}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Persistence
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn bindings_persist_across_executions() {
    let mut s = session();
    let first = exec(&mut s, "let x = 6 * 7");
    assert_eq!(first.len(), 1);
    assert!(first[0].is_empty());
    let second = exec(&mut s, "x + 1");
    assert_eq!(second[0].value, "43");
}

#[test]
fn later_units_see_earlier_units() {
    let mut s = session();
    let outputs = exec(&mut s, "let a = 2;; let b = a * 3;; a + b");
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[2].value, "8");
}

#[test]
fn rebinding_shadows_previous_value() {
    let mut s = session();
    exec(&mut s, "let x = 1;; let f () = x");
    exec(&mut s, "let x = 2");
    let outputs = exec(&mut s, "(x, f ())");
    assert_eq!(outputs[0].value, "(2, 1)");
}

#[test]
fn types_persist_across_executions() {
    let mut s = session();
    exec(&mut s, "type dir = North | South");
    assert_eq!(exec(&mut s, "[North; South]")[0].value, "[North; South]");
}

// ══════════════════════════════════════════════════════════════════════════════
// Syntax errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn syntax_error_runs_nothing() {
    let mut s = session();
    exec(&mut s, "let x = 1");
    let err = s.execute("let x = 2;; print_string \"no\";; let = ;;").unwrap_err();
    match err {
        SessionError::Syntax(diagnostics) => assert!(diagnostics.has_errors()),
        other => panic!("expected a syntax error, got {other:?}"),
    }
    assert_eq!(exec(&mut s, "x")[0].value, "1");
}

#[test]
fn syntax_error_serializes_diagnostics() {
    let mut s = session();
    let err = s.execute("let = 1").unwrap_err();
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["kind"], "Syntax");
    assert!(json["detail"]["total_errors"].as_u64().unwrap() >= 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Fault isolation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn faulting_unit_does_not_stop_later_units() {
    let mut s = session();
    let outputs = exec(&mut s, "1 / 0;; 2");
    assert_eq!(outputs[0].stderr, "Exception: Division_by_zero.");
    assert_eq!(outputs[0].value, "");
    assert_eq!(outputs[1].value, "2");
    assert!(outputs[1].stderr.is_empty());
}

#[test]
fn failed_binding_is_not_recorded() {
    let mut s = session();
    let outputs = exec(&mut s, "let y = failwith \"no\";; y");
    assert_eq!(outputs[0].stderr, "Exception: Failure \"no\".");
    assert_eq!(outputs[1].stderr, "Unbound value y");
}

#[test]
fn fault_follows_error_channel_text() {
    let mut s = session();
    let outputs = exec(&mut s, "prerr_string \"a\"; failwith \"b\"");
    assert_eq!(outputs[0].stderr, "a\nException: Failure \"b\".");
    let outputs = exec(&mut s, "prerr_endline \"warn\"");
    assert_eq!(outputs[0].stderr, "warn\n");
}

#[test]
fn stdout_before_fault_is_kept() {
    let mut s = session();
    let outputs = exec(&mut s, "print_string \"partial\"; 1 / 0");
    assert_eq!(outputs[0].stdout, "partial");
    assert_eq!(outputs[0].stderr, "Exception: Division_by_zero.");
}

#[test]
fn each_unit_gets_a_fresh_budget() {
    let mut s = Session::new(SessionConfig {
        gas_limit: 20_000,
        ..config()
    });
    let count = "let rec count n = if n = 0 then 0 else count (n - 1);;";
    let outputs = exec(&mut s, &format!("{count} count 1000;; count 1000;; count 1000"));
    assert!(outputs.iter().all(|out| out.stderr.is_empty()), "{outputs:?}");
}

#[test]
fn session_survives_resource_fault() {
    let mut s = Session::new(SessionConfig {
        gas_limit: 10_000,
        ..config()
    });
    exec(&mut s, "let z = 5");
    let outputs = exec(&mut s, "let rec spin () = spin ();; spin ()");
    assert!(outputs[1].stderr.starts_with("Execution stopped"));
    assert_eq!(exec(&mut s, "z")[0].value, "5");
}

// ══════════════════════════════════════════════════════════════════════════════
// Reset and prelude
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn reset_discards_user_bindings() {
    let mut s = session();
    exec(&mut s, "let x = 99;; type c = Red");
    s.reset().unwrap();
    assert_eq!(exec(&mut s, "x")[0].stderr, "Unbound value x");
    assert_eq!(exec(&mut s, "Red")[0].stderr, "Unbound constructor Red");
    assert_eq!(exec(&mut s, "List.length [1; 2]")[0].value, "2");
}

#[test]
fn reset_is_idempotent() {
    let script = "let n = 3;; List.init n (fun i -> i * i)";
    let mut once = session();
    exec(&mut once, "let n = 10");
    once.reset().unwrap();
    let expected = exec(&mut once, script);

    let mut twice = session();
    exec(&mut twice, "let n = 10");
    twice.reset().unwrap();
    twice.reset().unwrap();
    assert_eq!(exec(&mut twice, script), expected);
    assert_eq!(expected[1].value, "[0; 1; 4]");
}

#[test]
fn custom_prelude_is_the_baseline() {
    let mut s = Session::with_prelude(config(), "let base = 10");
    assert!(s.is_available());
    assert_eq!(exec(&mut s, "base + 1")[0].value, "11");
    s.reset().unwrap();
    assert_eq!(exec(&mut s, "base")[0].value, "10");
}

#[test_log::test]
fn failing_prelude_makes_session_unavailable() {
    let mut s = Session::with_prelude(config(), "let x = 1 / 0");
    assert!(!s.is_available());
    match s.execute("1 + 1") {
        Err(SessionError::Unavailable(reason)) => {
            assert!(reason.contains("Division_by_zero"), "got: {reason}")
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert!(matches!(s.reset(), Err(SessionError::Unavailable(_))));
}

#[test_log::test]
fn unparsable_prelude_makes_session_unavailable() {
    let s = Session::with_prelude(config(), "let = ;;");
    assert!(!s.is_available());
}

#[test]
fn standard_prelude_loads() {
    let s = session();
    assert!(s.is_available());
    assert_eq!(s.config().max_call_depth, 64);
}

// ══════════════════════════════════════════════════════════════════════════════
// Large images
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn drawing_a_huge_image_hits_the_step_limit() {
    let mut s = Session::new(SessionConfig {
        gas_limit: 100_000,
        ..config()
    });
    let outputs = exec(&mut s, &format!("{GROW} draw (grow 30 (circle 1.))"));
    assert_eq!(outputs[1].stderr, "Execution stopped: step limit of 100000 exceeded");
    assert!(outputs[1].stdout.is_empty());
    let outputs = exec(&mut s, "bbox (grow 30 (circle 1.))");
    assert!(outputs[0].stderr.starts_with("Execution stopped: step limit"));
}

#[test_log::test]
fn drawing_a_huge_image_times_out() {
    let mut s = Session::new(SessionConfig {
        gas_limit: u64::MAX,
        timeout_ms: Some(50),
        ..config()
    });
    let outputs = exec(&mut s, &format!("{GROW} render (grow 40 (circle 1.))"));
    assert_eq!(outputs[1].stderr, "Execution stopped: timed out after 50 ms");
    assert_eq!(exec(&mut s, "1 + 1")[0].value, "2");
}

#[test_log::test]
fn cancel_interrupts_a_drawing() {
    let mut s = Session::new(SessionConfig {
        gas_limit: u64::MAX,
        ..config()
    });
    let token = s.cancel_token();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        token.cancel();
    });
    let outputs = exec(&mut s, &format!("{GROW} draw (grow 40 (circle 1.))"));
    canceller.join().unwrap();
    assert_eq!(outputs[1].stderr, "Execution interrupted");
}

#[test]
fn wide_row_within_the_depth_limit_draws() {
    let row = "let rec row n img = if n = 0 then img else row (n - 1) (beside img (circle 1.));;";
    let outputs = on_stack(32 << 20, move || {
        let mut s = Session::new(SessionConfig {
            max_call_depth: 1_000,
            ..config()
        });
        exec(&mut s, &format!("{row} draw (row 900 (circle 1.));; row 3000 (circle 1.)"))
    });
    assert!(outputs[1].stderr.is_empty(), "{:?}", outputs[1].stderr);
    assert!(outputs[1].stdout.starts_with("<svg"));
    assert_eq!(
        outputs[2].stderr,
        "Stack overflow during evaluation (data nested deeper than 1000 levels)"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Deep data
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn deeply_nested_value_faults_on_a_small_stack() {
    let outputs = on_stack(1 << 20, || {
        let mut s = Session::new(SessionConfig {
            max_call_depth: 1_000,
            ..config()
        });
        let mut outputs = exec(&mut s, &format!("{BUILD} build 50000 None"));
        outputs.extend(exec(&mut s, "1 + 1"));
        outputs
    });
    assert_eq!(
        outputs[1].stderr,
        "Stack overflow during evaluation (data nested deeper than 1000 levels)"
    );
    assert_eq!(outputs[2].value, "2");
}

#[test]
fn nested_value_within_the_limit_prints_and_compares() {
    let outputs = on_stack(1 << 20, || {
        let mut s = Session::new(SessionConfig {
            max_call_depth: 1_000,
            ..config()
        });
        exec(
            &mut s,
            &format!("{BUILD} let v = build 900 None;; v;; v = build 900 None;; compare v (Some v)"),
        )
    });
    assert!(outputs[2].value.starts_with("Some (Some (Some"), "{:?}", outputs[2]);
    assert!(outputs[2].value.ends_with("None)))"));
    assert_eq!(outputs[3].value, "true");
    assert_eq!(outputs[4].value, "-1");
}

#[test]
fn closure_chain_faults_on_a_small_stack() {
    let outputs = on_stack(1 << 20, || {
        let mut s = Session::new(SessionConfig {
            max_call_depth: 1_000,
            ..config()
        });
        exec(
            &mut s,
            "let rec wrap n f = if n = 0 then f else wrap (n - 1) (fun x -> f x);; \
             wrap 50000 (fun x -> x)",
        )
    });
    assert_eq!(
        outputs[1].stderr,
        "Stack overflow during evaluation (data nested deeper than 1000 levels)"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Cancellation
// ══════════════════════════════════════════════════════════════════════════════

#[test_log::test]
fn cancel_interrupts_current_and_remaining_units() {
    let mut s = Session::new(SessionConfig {
        gas_limit: u64::MAX,
        ..config()
    });
    let token = s.cancel_token();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        token.cancel();
    });
    let outputs = exec(&mut s, "let rec spin () = spin ();; spin ();; 1 + 1");
    canceller.join().unwrap();
    assert!(outputs[0].stderr.is_empty());
    assert_eq!(outputs[1].stderr, "Execution interrupted");
    assert_eq!(outputs[2].stderr, "Execution interrupted");
    assert_eq!(outputs[2].value, "");

    // The next request starts with a cleared token.
    assert_eq!(exec(&mut s, "1 + 1")[0].value, "2");
}

#[test]
fn output_record_serializes() {
    let mut s = session();
    let outputs = exec(&mut s, "print_string \"o\"; 3");
    let json = serde_json::to_value(&outputs[0]).unwrap();
    assert_eq!(json["value"], "3");
    assert_eq!(json["stdout"], "o");
    assert_eq!(json["stderr"], "");
}
