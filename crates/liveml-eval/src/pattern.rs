//! Pattern matching.

use liveml_types::ast::{Pattern, PatternKind};

use crate::value::{List, Value};

/// Match `value` against `pattern`, appending bound names to `out`.
///
/// On failure `out` is left as it was on entry. Constructors are matched
/// by name. A single pattern argument against a multi-argument
/// constructor sees the arguments as one tuple, and the reverse.
pub fn matches(pattern: &Pattern, value: &Value, out: &mut Vec<(String, Value)>) -> bool {
    let mark = out.len();
    let ok = match_inner(pattern, value, out);
    if !ok {
        out.truncate(mark);
    }
    ok
}

fn match_inner(pattern: &Pattern, value: &Value, out: &mut Vec<(String, Value)>) -> bool {
    match (&pattern.kind, value) {
        (PatternKind::Wildcard, _) => true,
        (PatternKind::Var(name), v) => {
            out.push((name.clone(), v.clone()));
            true
        }
        (PatternKind::Int(a), Value::Int(b)) => a == b,
        (PatternKind::Float(a), Value::Float(b)) => a == b,
        (PatternKind::Str(a), Value::Str(b)) => a.as_str() == &**b,
        (PatternKind::Char(a), Value::Char(b)) => a == b,
        (PatternKind::Bool(a), Value::Bool(b)) => a == b,
        (PatternKind::Unit, Value::Unit) => true,
        (PatternKind::Tuple(pats), Value::Tuple(tuple)) => all(pats, tuple.items(), out),
        (PatternKind::Constructor { path, args }, Value::Variant(variant)) => {
            if path.name != variant.name() {
                return false;
            }
            match (args.len(), variant.args.len()) {
                (p, n) if p == n => all(args, &variant.args, out),
                (1, n) if n > 1 => {
                    let packed = Value::tuple(variant.args.clone());
                    match_inner(&args[0], &packed, out)
                }
                (p, 1) if p > 1 => match &variant.args[0] {
                    Value::Tuple(tuple) => all(args, tuple.items(), out),
                    _ => false,
                },
                _ => false,
            }
        }
        (PatternKind::List { items, tail }, Value::List(list)) => {
            match_list(items, tail.as_deref(), list, out)
        }
        (PatternKind::Or(left, right), v) => matches(left, v, out) || matches(right, v, out),
        _ => false,
    }
}

fn all(pats: &[Pattern], values: &[Value], out: &mut Vec<(String, Value)>) -> bool {
    pats.len() == values.len() && pats.iter().zip(values).all(|(p, v)| match_inner(p, v, out))
}

fn match_list(
    items: &[Pattern],
    tail: Option<&Pattern>,
    list: &List,
    out: &mut Vec<(String, Value)>,
) -> bool {
    let mut rest = list;
    for item in items {
        match rest.split() {
            Some((head, next)) => {
                if !match_inner(item, head, out) {
                    return false;
                }
                rest = next;
            }
            None => return false,
        }
    }
    match tail {
        Some(tail) => match_inner(tail, &Value::List(rest.clone()), out),
        None => rest.is_empty(),
    }
}
