//! Lexer tests for both surface syntaxes.
//!
//! Covers keywords per syntax, operators and maximal munch, numeric,
//! string and character literals, type variables, comments, error
//! recovery and determinism.

use liveml_lexer::{Lexer, TokenKind};
use liveml_types::{ErrorCode, SourceFile, Syntax};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str, syntax: Syntax) -> Vec<TokenKind> {
    let sf = SourceFile::new("test", source);
    Lexer::new(&sf, syntax)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

fn ml(source: &str) -> Vec<TokenKind> {
    kinds(source, Syntax::Ml)
}

fn re(source: &str) -> Vec<TokenKind> {
    kinds(source, Syntax::Reason)
}

fn errors(source: &str, syntax: Syntax) -> Vec<(ErrorCode, String)> {
    let sf = SourceFile::new("test", source);
    Lexer::new(&sf, syntax)
        .lex()
        .errors
        .errors
        .into_iter()
        .map(|e| (e.code, e.message))
        .collect()
}

fn ident(s: &str) -> TokenKind {
    TokenKind::LIdent(s.to_string())
}

fn op(s: &str) -> TokenKind {
    TokenKind::Op(s.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & identifiers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_let_binding() {
    assert_eq!(
        ml("let x = 6 * 7;;"),
        vec![
            TokenKind::Let,
            ident("x"),
            TokenKind::Equals,
            TokenKind::Int(6),
            op("*"),
            TokenKind::Int(7),
            TokenKind::SemiSemi,
        ]
    );
}

#[test]
fn test_reason_let_binding() {
    assert_eq!(
        re("let x = 6 * 7;"),
        vec![
            TokenKind::Let,
            ident("x"),
            TokenKind::Equals,
            TokenKind::Int(6),
            op("*"),
            TokenKind::Int(7),
            TokenKind::Semi,
        ]
    );
}

#[test]
fn test_ml_only_keywords_are_identifiers_in_reason() {
    assert_eq!(ml("match with then"), vec![TokenKind::Match, TokenKind::With, TokenKind::Then]);
    assert_eq!(re("match with then"), vec![ident("match"), ident("with"), ident("then")]);
    assert_eq!(re("switch"), vec![TokenKind::Switch]);
    assert_eq!(ml("switch"), vec![ident("switch")]);
}

#[test]
fn test_primes_and_underscores_in_identifiers() {
    assert_eq!(
        ml("fact' _acc x_1 _"),
        vec![ident("fact'"), ident("_acc"), ident("x_1"), TokenKind::Underscore]
    );
}

#[test]
fn test_upper_identifiers() {
    assert_eq!(
        ml("Turtle.Forward"),
        vec![
            TokenKind::UIdent("Turtle".into()),
            TokenKind::Dot,
            TokenKind::UIdent("Forward".into()),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_float_operators() {
    assert_eq!(
        ml("a +. b *. c -. d /. e ** f"),
        vec![
            ident("a"),
            op("+."),
            ident("b"),
            op("*."),
            ident("c"),
            op("-."),
            ident("d"),
            op("/."),
            ident("e"),
            op("**"),
            ident("f"),
        ]
    );
}

#[test]
fn test_user_operators_munch() {
    assert_eq!(
        ml("a ||| b --- c +++ d |> f"),
        vec![
            ident("a"),
            op("|||"),
            ident("b"),
            op("---"),
            ident("c"),
            op("+++"),
            ident("d"),
            op("|>"),
            ident("f"),
        ]
    );
}

#[test]
fn test_arrows_and_bars() {
    assert_eq!(
        ml("| x -> y"),
        vec![TokenKind::Bar, ident("x"), TokenKind::Arrow, ident("y")]
    );
    assert_eq!(
        re("(x) => x"),
        vec![
            TokenKind::LParen,
            ident("x"),
            TokenKind::RParen,
            TokenKind::FatArrow,
            ident("x"),
        ]
    );
}

#[test]
fn test_cons_and_spread() {
    assert_eq!(
        ml("x :: xs"),
        vec![ident("x"), TokenKind::ColonColon, ident("xs")]
    );
    assert_eq!(re("...rest"), vec![TokenKind::DotDotDot, ident("rest")]);
}

#[test]
fn test_mod_is_an_operator() {
    assert_eq!(ml("a mod b"), vec![ident("a"), op("mod"), ident("b")]);
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_numbers() {
    assert_eq!(
        ml("42 3.5 2. 1e3 1_000 0xff 2.5e-1"),
        vec![
            TokenKind::Int(42),
            TokenKind::Float(3.5),
            TokenKind::Float(2.0),
            TokenKind::Float(1000.0),
            TokenKind::Int(1000),
            TokenKind::Int(255),
            TokenKind::Float(0.25),
        ]
    );
}

#[test]
fn test_negative_number_is_two_tokens() {
    assert_eq!(ml("-1"), vec![op("-"), TokenKind::Int(1)]);
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        ml(r#""a\n\t\"b\\" "\065\x42""#),
        vec![
            TokenKind::Str("a\n\t\"b\\".into()),
            TokenKind::Str("AB".into()),
        ]
    );
}

#[test]
fn test_string_line_continuation() {
    assert_eq!(
        ml("\"hello \\\n     world\""),
        vec![TokenKind::Str("hello world".into())]
    );
}

#[test]
fn test_char_and_type_var() {
    assert_eq!(
        ml("'a' '\\n' 'a list"),
        vec![
            TokenKind::Char('a'),
            TokenKind::Char('\n'),
            TokenKind::TypeVar("a".into()),
            ident("list"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ml_nested_comments() {
    assert_eq!(ml("1 (* outer (* inner *) still *) 2"), vec![TokenKind::Int(1), TokenKind::Int(2)]);
}

#[test]
fn test_reason_comments() {
    assert_eq!(
        re("1 // line\n/* block */ 2"),
        vec![TokenKind::Int(1), TokenKind::Int(2)]
    );
}

#[test]
fn test_reason_slash_star_is_not_ml_comment() {
    // `( * )` style operator sections are unaffected in Reason.
    assert_eq!(
        re("(*)"),
        vec![TokenKind::LParen, op("*"), TokenKind::RParen]
    );
}

#[test]
fn test_unterminated_comment() {
    let errs = errors("1 (* never closed", Syntax::Ml);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].0, ErrorCode::UNTERMINATED_COMMENT);
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unterminated_string() {
    let errs = errors("\"abc", Syntax::Reason);
    assert_eq!(errs[0].0, ErrorCode::UNTERMINATED_STRING);
}

#[test]
fn test_unexpected_character_recovers() {
    let sf = SourceFile::new("test", "1 # 2");
    let result = Lexer::new(&sf, Syntax::Ml).lex();
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(result.errors.errors[0].message, "Unexpected character '#'");
    let kinds: Vec<_> = result.tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]);
}

#[test]
fn test_error_cap() {
    let source = "#".repeat(40);
    let sf = SourceFile::new("test", source);
    let result = Lexer::new(&sf, Syntax::Ml).lex();
    assert_eq!(result.errors.errors.len(), liveml_types::MAX_ERRORS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

#[test]
fn test_spans_are_one_based() {
    let sf = SourceFile::new("test", "let\n  x");
    let tokens = Lexer::new(&sf, Syntax::Ml).lex().tokens;
    assert_eq!((tokens[0].span.start_line, tokens[0].span.start_col), (1, 1));
    assert_eq!((tokens[1].span.start_line, tokens[1].span.start_col), (2, 3));
}

#[test]
fn test_lexer_determinism_100_iterations() {
    let source = "let rec fact x = if x <= 1 then 1 else x * fact (x - 1);;";
    let first = ml(source);
    for i in 0..100 {
        assert_eq!(first, ml(source), "Determinism failure at iteration {i}");
    }
}
