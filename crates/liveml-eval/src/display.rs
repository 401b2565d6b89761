//! Printing values in a surface syntax.

use liveml_types::Syntax;

use crate::value::Value;

/// Print `value` the way a toplevel for `syntax` would.
pub fn display_value(value: &Value, syntax: Syntax) -> String {
    let mut out = String::new();
    write_value(&mut out, value, syntax, false);
    out
}

/// OCaml-style float text: `3.`, `0.5`, `1e+20`, `inf`, `nan`.
pub fn float_text(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{x:?}");
    if let Some(stripped) = text.strip_suffix(".0") {
        return format!("{stripped}.");
    }
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        push_escaped(&mut out, ch, '"');
    }
    out.push('"');
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
        c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\{:03}", c as u32)),
        c => out.push(c),
    }
}

/// `nested` is set for constructor arguments in ML, where anything that
/// is not atomic needs parentheses.
fn write_value(out: &mut String, value: &Value, syntax: Syntax, nested: bool) {
    match value {
        Value::Int(n) => {
            if nested && *n < 0 {
                out.push_str(&format!("({n})"));
            } else {
                out.push_str(&n.to_string());
            }
        }
        Value::Float(x) => {
            let text = float_text(*x);
            if nested && text.starts_with('-') {
                out.push_str(&format!("({text})"));
            } else {
                out.push_str(&text);
            }
        }
        Value::Str(s) => out.push_str(&quote_string(s)),
        Value::Char(c) => {
            out.push('\'');
            push_escaped(out, *c, '\'');
            out.push('\'');
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Unit => out.push_str("()"),
        Value::Tuple(tuple) => {
            out.push('(');
            write_seq(out, tuple.items().iter(), ", ", syntax);
            out.push(')');
        }
        Value::List(list) => {
            let sep = match syntax {
                Syntax::Ml => "; ",
                Syntax::Reason => ", ",
            };
            out.push('[');
            write_seq(out, list.iter(), sep, syntax);
            out.push(']');
        }
        Value::Variant(variant) => {
            let args = &variant.args;
            match (syntax, args.len()) {
                (_, 0) => out.push_str(variant.name()),
                (Syntax::Ml, 1) => {
                    let wrap = nested;
                    if wrap {
                        out.push('(');
                    }
                    out.push_str(variant.name());
                    out.push(' ');
                    write_value(out, &args[0], syntax, true);
                    if wrap {
                        out.push(')');
                    }
                }
                (Syntax::Ml, _) => {
                    if nested {
                        out.push('(');
                    }
                    out.push_str(variant.name());
                    out.push_str(" (");
                    write_seq(out, args.iter(), ", ", syntax);
                    out.push(')');
                    if nested {
                        out.push(')');
                    }
                }
                (Syntax::Reason, _) => {
                    out.push_str(variant.name());
                    out.push('(');
                    write_seq(out, args.iter(), ", ", syntax);
                    out.push(')');
                }
            }
        }
        Value::Closure(_) | Value::Native(_) => out.push_str("<fun>"),
    }
}

fn write_seq<'a>(
    out: &mut String,
    items: impl Iterator<Item = &'a Value>,
    sep: &str,
    syntax: Syntax,
) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_value(out, item, syntax, false);
    }
}
