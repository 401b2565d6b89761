//! Integration tests for the playground controller.
//!
//! Covers:
//! - Mount behaviour per flag (run once, noexec, hidden, canvas)
//! - Draft editing without evaluation
//! - Reason snippets converted and evaluated against a persistent session
//! - Syntax errors kept away from the session
//! - Reset restoring the draft and the session baseline
//! - Shared sessions and the worker-thread backend

use std::cell::RefCell;
use std::rc::Rc;

use liveml_eval::{Session, SessionConfig};
use liveml_playground::{
    Display, Evaluate, Flags, OutputBlock, Playground, PlaygroundConfig, SessionHandle,
};
use liveml_types::Syntax;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn session() -> Session {
    Session::new(SessionConfig {
        max_call_depth: 64,
        ..SessionConfig::default()
    })
}

fn mount(code: &str, syntax: Syntax, metastring: &str) -> Playground<Session> {
    Playground::mount(session(), code, syntax, Flags::parse(metastring))
}

fn echoes(display: &Display) -> Vec<&str> {
    display
        .blocks
        .iter()
        .filter_map(|block| match block {
            OutputBlock::Echo(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Worker configuration small enough for tests.
fn worker_config() -> PlaygroundConfig {
    PlaygroundConfig {
        session: SessionConfig {
            max_call_depth: 1_000,
            ..SessionConfig::default()
        },
        worker_stack_bytes: 64 * 1024 * 1024,
        ..PlaygroundConfig::default()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Mounting
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn demo_block_runs_once_at_mount() {
    let pg = mount("print_string \"hi\";; 1 + 1", Syntax::Ml, "demo");
    let display = pg.display();
    assert_eq!(
        display.blocks,
        vec![
            OutputBlock::Stdout("hi".into()),
            OutputBlock::Echo("2".into()),
        ]
    );
    assert!(!display.editable);
    assert_eq!(display.editor.as_deref(), Some("print_string \"hi\";; 1 + 1"));
}

#[test]
fn noexec_block_waits_for_execute() {
    let mut pg = mount("  40 + 2  \n", Syntax::Ml, "fix");
    assert!(pg.blocks().is_empty());
    assert_eq!(pg.draft(), "40 + 2");
    pg.execute();
    assert_eq!(pg.blocks(), &[OutputBlock::Echo("42".into())]);
}

#[test]
fn hidden_block_shows_only_side_effects() {
    let pg = mount("print_string \"side\";; 5", Syntax::Ml, "hidden");
    let display = pg.display();
    assert_eq!(display.editor, None);
    assert_eq!(display.blocks, vec![OutputBlock::Stdout("side".into())]);
}

#[test]
fn canvas_block_collects_graphics() {
    let pg = mount("draw (circle 10.);; draw (square 4.)", Syntax::Ml, "canvas=pic");
    let display = pg.display();
    let canvas = display.canvas.expect("canvas reserved");
    assert_eq!(canvas.id, "pic");
    assert_eq!(canvas.graphics.len(), 2);
    assert!(canvas.graphics.iter().all(|svg| svg.starts_with("<svg")));
    assert!(display.blocks.is_empty());
}

#[test]
fn empty_canvas_is_still_shown() {
    let pg = mount("1 + 1", Syntax::Ml, "canvas");
    let canvas = pg.display().canvas.expect("canvas reserved");
    assert!(canvas.graphics.is_empty());
}

#[test]
fn graphics_without_canvas_are_inline_blocks() {
    let pg = mount("print_endline \"before\";; draw (circle 1.)", Syntax::Ml, "demo");
    let blocks = pg.blocks();
    assert_eq!(blocks[0], OutputBlock::Stdout("before\n".into()));
    assert!(matches!(&blocks[1], OutputBlock::Graphic(svg) if svg.ends_with("</svg>")));
}

// ══════════════════════════════════════════════════════════════════════════════
// Editing and execution
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn edit_only_updates_the_draft() {
    let mut pg = mount("1", Syntax::Ml, "edit");
    assert_eq!(pg.blocks(), &[OutputBlock::Echo("1".into())]);
    assert!(pg.edit("2"));
    assert_eq!(pg.draft(), "2");
    assert_eq!(pg.blocks(), &[OutputBlock::Echo("1".into())]);
    pg.execute();
    assert_eq!(pg.blocks(), &[OutputBlock::Echo("2".into())]);
}

#[test]
fn read_only_block_rejects_edits() {
    let mut pg = mount("1", Syntax::Ml, "demo");
    assert!(!pg.edit("2"));
    assert_eq!(pg.draft(), "1");
}

#[test]
fn reason_snippets_share_bindings() {
    let mut pg = mount("let x = 6 * 7;", Syntax::Reason, "edit");
    assert!(pg.blocks().is_empty());
    pg.edit("x + 1;");
    pg.execute();
    assert_eq!(echoes(&pg.display()), vec!["43"]);
}

#[test]
fn reason_values_print_in_reason() {
    let pg = mount("[Some(1), None];", Syntax::Reason, "demo");
    assert_eq!(echoes(&pg.display()), vec!["[Some(1), None]"]);
}

#[test]
fn syntax_error_leaves_session_untouched() {
    let mut pg = mount("let x = 1;", Syntax::Reason, "edit");
    pg.edit("let x = 2;\nlet y = ;");
    pg.execute();
    let display = pg.display();
    assert!(matches!(display.blocks.as_slice(), [OutputBlock::SyntaxError(_)]));
    assert!(display.has_errors());

    pg.edit("x;");
    pg.execute();
    assert_eq!(echoes(&pg.display()), vec!["1"]);
}

#[test]
fn runtime_fault_is_an_error_block() {
    let pg = mount("1 / 0;; 2", Syntax::Ml, "demo");
    assert_eq!(
        pg.blocks(),
        &[
            OutputBlock::Stderr("Exception: Division_by_zero.".into()),
            OutputBlock::Echo("2".into()),
        ]
    );
    assert!(pg.display().has_errors());
}

#[test]
fn plain_text_concatenates_blocks() {
    let pg = mount("print_string \"a\";; 3", Syntax::Ml, "demo");
    assert_eq!(pg.display().plain_text(), "a\n3\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Reset
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn reset_restores_mounted_code_and_baseline() {
    let mut pg = mount("let y = 5;;", Syntax::Ml, "edit noexec");
    pg.execute();
    pg.edit("y * 2");
    pg.execute();
    assert_eq!(echoes(&pg.display()), vec!["10"]);

    pg.reset();
    assert_eq!(pg.draft(), "let y = 5;;");
    assert!(pg.blocks().is_empty());

    pg.edit("y");
    pg.execute();
    assert_eq!(pg.blocks(), &[OutputBlock::Stderr("Unbound value y".into())]);
}

#[test]
fn unavailable_session_is_reported() {
    let broken = Session::with_prelude(SessionConfig::default(), "let x = failwith \"boom\"");
    let mut pg = Playground::mount(broken, "1", Syntax::Ml, Flags::parse("edit"));
    assert!(matches!(pg.blocks(), [OutputBlock::SessionError(_)]));
    pg.reset();
    assert!(matches!(pg.blocks(), [OutputBlock::SessionError(_)]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Backends
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn shared_session_links_playgrounds() {
    let shared = Rc::new(RefCell::new(session()));
    let _first = Playground::mount(shared.clone(), "let r = 3;", Syntax::Reason, Flags::parse("demo"));
    let second = Playground::mount(shared, "r * r;", Syntax::Reason, Flags::parse("demo"));
    assert_eq!(echoes(&second.display()), vec!["9"]);
}

#[test_log::test]
fn worker_backend_runs_requests_in_order() {
    let mut handle = SessionHandle::spawn(&worker_config()).unwrap();
    handle.execute("let a = 1", Syntax::Ml).unwrap();
    handle.execute("let a = a + 1", Syntax::Ml).unwrap();
    let outputs = handle.execute("a", Syntax::Ml).unwrap();
    assert_eq!(outputs[0].value, "2");

    handle.reset().unwrap();
    let outputs = handle.execute("a", Syntax::Ml).unwrap();
    assert_eq!(outputs[0].stderr, "Unbound value a");
}

#[test_log::test]
fn worker_handles_deep_recursion() {
    let mut handle = SessionHandle::spawn(&worker_config()).unwrap();
    let source = "let rec sum n = if n = 0 then 0 else n + sum (n - 1);; sum 900";
    let outputs = handle.execute(source, Syntax::Ml).unwrap();
    assert_eq!(outputs[1].value, "405450");
}

#[test_log::test]
fn worker_timeout_interrupts_runaway_snippet() {
    let config = PlaygroundConfig {
        session: SessionConfig {
            gas_limit: u64::MAX,
            ..worker_config().session
        },
        reply_timeout_ms: Some(100),
        ..worker_config()
    };
    let mut handle = SessionHandle::spawn(&config).unwrap();
    let outputs = handle
        .execute("let rec spin () = spin ();; spin ()", Syntax::Ml)
        .unwrap();
    assert_eq!(outputs[1].stderr, "Execution interrupted");

    let outputs = handle.execute("1 + 1", Syntax::Ml).unwrap();
    assert_eq!(outputs[0].value, "2");
}

#[test_log::test]
fn worker_with_broken_prelude_is_unavailable() {
    let mut handle = SessionHandle::spawn_with_prelude(&worker_config(), "let = ;;").unwrap();
    let err = handle.execute("1", Syntax::Ml).unwrap_err();
    assert!(err.to_string().starts_with("Session unavailable"));
}

#[test]
fn playground_over_worker_backend() {
    let handle = SessionHandle::spawn(&worker_config()).unwrap();
    let mut pg = Playground::mount(handle, "let z = 20;", Syntax::Reason, Flags::parse("edit"));
    pg.edit("z + 1;");
    pg.execute();
    assert_eq!(echoes(&pg.display()), vec!["21"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn display_is_deterministic() {
    let code = "let xs = [3, 1, 2];\nList.sort(compare, xs);\ndraw(circle(5.));";
    let first = mount(code, Syntax::Reason, "demo").display();
    for _ in 0..100 {
        assert_eq!(mount(code, Syntax::Reason, "demo").display(), first);
    }
}
