//! Built-in functions implemented in Rust.
//!
//! Natives are curried like any other function: a [`NativeCall`] collects
//! arguments until [`Native::required`] are present and then runs. The
//! tables below are installed into the base namespace before the prelude
//! runs.

use std::cmp::Ordering;
use std::rc::Rc;

use liveml_types::ast::BinOp;
use liveml_types::Syntax;

use crate::display::{display_value, float_text};
use crate::env::Namespace;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::ops;
use crate::printf;
use crate::value::{compare, List, NativeCall, Value};

pub type NativeFn = fn(&mut Evaluator, Vec<Value>) -> EvalResult<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// A format string followed by one argument per conversion.
    Format,
}

#[derive(Debug)]
pub struct Native {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl Native {
    pub const fn fixed(name: &'static str, arity: usize, func: NativeFn) -> Self {
        Self {
            name,
            arity: Arity::Fixed(arity),
            func,
        }
    }

    pub const fn format(name: &'static str, func: NativeFn) -> Self {
        Self {
            name,
            arity: Arity::Format,
            func,
        }
    }

    /// Arguments needed before the call can run, given those collected so
    /// far.
    pub fn required(&self, args: &[Value]) -> EvalResult<usize> {
        match self.arity {
            Arity::Fixed(n) => Ok(n),
            Arity::Format => match args.first() {
                None => Ok(1),
                Some(fmt) => {
                    let fmt = fmt.as_str()?;
                    printf::arity(fmt)
                        .map(|n| n + 1)
                        .ok_or_else(|| EvalError::invalid_argument(format!("{}: bad format {fmt:?}", self.name)))
                }
            },
        }
    }

    /// An unapplied value for this native.
    pub fn value(&'static self) -> Value {
        NativeCall::value(self, Vec::new())
    }
}

/// Split an exact argument vector into an array.
pub(crate) fn take<const N: usize>(args: Vec<Value>) -> EvalResult<[Value; N]> {
    let found = args.len();
    args.try_into().map_err(|_| {
        EvalError::TypeMismatch(format!("expected {N} argument(s), found {found}"))
    })
}

fn float1(args: Vec<Value>, f: fn(f64) -> f64) -> EvalResult<Value> {
    let [x] = take(args)?;
    Ok(Value::Float(f(x.as_float()?)))
}

fn order(a: &Value, b: &Value) -> EvalResult<Value> {
    Ok(Value::Int(match compare(a, b)? {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

// ══════════════════════════════════════════════════════════════════════════════
// Global functions
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) static GLOBALS: &[Native] = &[
    // ── Output ──
    Native::fixed("print_string", 1, |ev, args| {
        let [s] = take(args)?;
        ev.print(s.as_str()?);
        Ok(Value::Unit)
    }),
    Native::fixed("print_endline", 1, |ev, args| {
        let [s] = take(args)?;
        ev.print(s.as_str()?);
        ev.print("\n");
        Ok(Value::Unit)
    }),
    Native::fixed("print_int", 1, |ev, args| {
        let [n] = take(args)?;
        ev.print(&n.as_int()?.to_string());
        Ok(Value::Unit)
    }),
    Native::fixed("print_float", 1, |ev, args| {
        let [x] = take(args)?;
        ev.print(&float_text(x.as_float()?));
        Ok(Value::Unit)
    }),
    Native::fixed("print_char", 1, |ev, args| {
        let [c] = take(args)?;
        ev.print(&c.as_char()?.to_string());
        Ok(Value::Unit)
    }),
    Native::fixed("print_newline", 1, |ev, _| {
        ev.print("\n");
        Ok(Value::Unit)
    }),
    Native::fixed("prerr_string", 1, |ev, args| {
        let [s] = take(args)?;
        ev.eprint(s.as_str()?);
        Ok(Value::Unit)
    }),
    Native::fixed("prerr_endline", 1, |ev, args| {
        let [s] = take(args)?;
        ev.eprint(s.as_str()?);
        ev.eprint("\n");
        Ok(Value::Unit)
    }),
    // ── Conversions ──
    Native::fixed("string_of_int", 1, |_, args| {
        let [n] = take(args)?;
        Ok(Value::str(n.as_int()?.to_string()))
    }),
    Native::fixed("string_of_float", 1, |_, args| {
        let [x] = take(args)?;
        Ok(Value::str(float_text(x.as_float()?)))
    }),
    Native::fixed("string_of_bool", 1, |_, args| {
        let [b] = take(args)?;
        Ok(Value::str(b.as_bool()?.to_string()))
    }),
    Native::fixed("int_of_string", 1, |_, args| {
        let [s] = take(args)?;
        s.as_str()?
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::failure("int_of_string"))
    }),
    Native::fixed("float_of_string", 1, |_, args| {
        let [s] = take(args)?;
        s.as_str()?
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EvalError::failure("float_of_string"))
    }),
    Native::fixed("int_of_float", 1, |_, args| {
        let [x] = take(args)?;
        Ok(Value::Int(x.as_float()? as i64))
    }),
    Native::fixed("float_of_int", 1, |_, args| {
        let [n] = take(args)?;
        Ok(Value::Float(n.as_int()? as f64))
    }),
    Native::fixed("float", 1, |_, args| {
        let [n] = take(args)?;
        Ok(Value::Float(n.as_int()? as f64))
    }),
    Native::fixed("int_of_char", 1, |_, args| {
        let [c] = take(args)?;
        Ok(Value::Int(c.as_char()? as i64))
    }),
    Native::fixed("char_of_int", 1, |_, args| {
        let [n] = take(args)?;
        char_of_code(n.as_int()?, "char_of_int")
    }),
    // ── Exceptions ──
    Native::fixed("failwith", 1, |_, args| {
        let [s] = take(args)?;
        Err(EvalError::failure(s.as_str()?))
    }),
    Native::fixed("invalid_arg", 1, |_, args| {
        let [s] = take(args)?;
        Err(EvalError::invalid_argument(s.as_str()?))
    }),
    Native::fixed("raise", 1, |_, args| {
        let [exn] = take(args)?;
        Err(EvalError::Raised(display_value(&exn, Syntax::Ml)))
    }),
    // ── Numbers ──
    Native::fixed("abs", 1, |_, args| {
        let [n] = take(args)?;
        Ok(Value::Int(n.as_int()?.wrapping_abs()))
    }),
    Native::fixed("abs_float", 1, |_, args| float1(args, f64::abs)),
    Native::fixed("sqrt", 1, |_, args| float1(args, f64::sqrt)),
    Native::fixed("exp", 1, |_, args| float1(args, f64::exp)),
    Native::fixed("log", 1, |_, args| float1(args, f64::ln)),
    Native::fixed("sin", 1, |_, args| float1(args, f64::sin)),
    Native::fixed("cos", 1, |_, args| float1(args, f64::cos)),
    Native::fixed("tan", 1, |_, args| float1(args, f64::tan)),
    Native::fixed("asin", 1, |_, args| float1(args, f64::asin)),
    Native::fixed("acos", 1, |_, args| float1(args, f64::acos)),
    Native::fixed("atan", 1, |_, args| float1(args, f64::atan)),
    Native::fixed("floor", 1, |_, args| float1(args, f64::floor)),
    Native::fixed("ceil", 1, |_, args| float1(args, f64::ceil)),
    Native::fixed("atan2", 2, |_, args| {
        let [y, x] = take(args)?;
        Ok(Value::Float(y.as_float()?.atan2(x.as_float()?)))
    }),
    Native::fixed("succ", 1, |_, args| {
        let [n] = take(args)?;
        Ok(Value::Int(n.as_int()?.wrapping_add(1)))
    }),
    Native::fixed("pred", 1, |_, args| {
        let [n] = take(args)?;
        Ok(Value::Int(n.as_int()?.wrapping_sub(1)))
    }),
    // ── Polymorphic helpers ──
    Native::fixed("compare", 2, |_, args| {
        let [a, b] = take(args)?;
        order(&a, &b)
    }),
    Native::fixed("min", 2, |_, args| {
        let [a, b] = take(args)?;
        Ok(if compare(&a, &b)?.is_le() { a } else { b })
    }),
    Native::fixed("max", 2, |_, args| {
        let [a, b] = take(args)?;
        Ok(if compare(&a, &b)?.is_ge() { a } else { b })
    }),
    Native::fixed("ignore", 1, |_, _| Ok(Value::Unit)),
    Native::fixed("fst", 1, |_, args| {
        let [pair] = take(args)?;
        Ok(pair.as_tuple(2)?[0].clone())
    }),
    Native::fixed("snd", 1, |_, args| {
        let [pair] = take(args)?;
        Ok(pair.as_tuple(2)?[1].clone())
    }),
];

fn char_of_code(code: i64, name: &str) -> EvalResult<Value> {
    u8::try_from(code)
        .map(|b| Value::Char(b as char))
        .map_err(|_| EvalError::invalid_argument(name))
}

// ══════════════════════════════════════════════════════════════════════════════
// Modules
// ══════════════════════════════════════════════════════════════════════════════

// Strings are indexed by character, not by byte.
pub(crate) static STRING: &[Native] = &[
    Native::fixed("length", 1, |_, args| {
        let [s] = take(args)?;
        Ok(Value::Int(s.as_str()?.chars().count() as i64))
    }),
    Native::fixed("get", 2, |_, args| {
        let [s, i] = take(args)?;
        let i = i.as_int()?;
        usize::try_from(i)
            .ok()
            .and_then(|i| s.as_str().ok()?.chars().nth(i))
            .map(Value::Char)
            .ok_or_else(|| EvalError::invalid_argument("index out of bounds"))
    }),
    Native::fixed("sub", 3, |_, args| {
        let [s, start, len] = take(args)?;
        let s = s.as_str()?;
        let (start, len) = (start.as_int()?, len.as_int()?);
        let total = s.chars().count() as i64;
        if start < 0 || len < 0 || start + len > total {
            return Err(EvalError::invalid_argument("String.sub"));
        }
        Ok(Value::str(
            s.chars().skip(start as usize).take(len as usize).collect::<String>(),
        ))
    }),
    Native::fixed("concat", 2, |_, args| {
        let [sep, parts] = take(args)?;
        let parts = parts
            .as_list()?
            .iter()
            .map(|part| part.as_str())
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Value::str(parts.join(sep.as_str()?)))
    }),
    Native::fixed("make", 2, |_, args| {
        let [n, c] = take(args)?;
        let n = usize::try_from(n.as_int()?).map_err(|_| EvalError::invalid_argument("String.make"))?;
        Ok(Value::str(c.as_char()?.to_string().repeat(n)))
    }),
    Native::fixed("uppercase_ascii", 1, |_, args| {
        let [s] = take(args)?;
        Ok(Value::str(s.as_str()?.to_ascii_uppercase()))
    }),
    Native::fixed("lowercase_ascii", 1, |_, args| {
        let [s] = take(args)?;
        Ok(Value::str(s.as_str()?.to_ascii_lowercase()))
    }),
    Native::fixed("trim", 1, |_, args| {
        let [s] = take(args)?;
        Ok(Value::str(s.as_str()?.trim()))
    }),
    Native::fixed("split_on_char", 2, |_, args| {
        let [c, s] = take(args)?;
        let c = c.as_char()?;
        Ok(Value::List(s.as_str()?.split(c).map(Value::str).collect()))
    }),
    Native::fixed("contains", 2, |_, args| {
        let [s, c] = take(args)?;
        Ok(Value::Bool(s.as_str()?.contains(c.as_char()?)))
    }),
    Native::fixed("index", 2, |_, args| {
        let [s, c] = take(args)?;
        let c = c.as_char()?;
        s.as_str()?
            .chars()
            .position(|ch| ch == c)
            .map(|i| Value::Int(i as i64))
            .ok_or_else(|| EvalError::Raised("Not_found".into()))
    }),
];

pub(crate) static CHAR: &[Native] = &[
    Native::fixed("code", 1, |_, args| {
        let [c] = take(args)?;
        Ok(Value::Int(c.as_char()? as i64))
    }),
    Native::fixed("chr", 1, |_, args| {
        let [n] = take(args)?;
        char_of_code(n.as_int()?, "Char.chr")
    }),
    Native::fixed("uppercase_ascii", 1, |_, args| {
        let [c] = take(args)?;
        Ok(Value::Char(c.as_char()?.to_ascii_uppercase()))
    }),
    Native::fixed("lowercase_ascii", 1, |_, args| {
        let [c] = take(args)?;
        Ok(Value::Char(c.as_char()?.to_ascii_lowercase()))
    }),
];

pub(crate) static PRINTF: &[Native] = &[
    Native::format("printf", |ev, args| {
        let (fmt, rest) = split_format(&args)?;
        let text = printf::format(fmt, rest)?;
        ev.print(&text);
        Ok(Value::Unit)
    }),
    Native::format("sprintf", |_, args| {
        let (fmt, rest) = split_format(&args)?;
        Ok(Value::str(printf::format(fmt, rest)?))
    }),
];

fn split_format(args: &[Value]) -> EvalResult<(&str, &[Value])> {
    match args.split_first() {
        Some((fmt, rest)) => Ok((fmt.as_str()?, rest)),
        None => Err(EvalError::invalid_argument("missing format string")),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators as values
// ══════════════════════════════════════════════════════════════════════════════

macro_rules! operators {
    ($($symbol:literal => $op:expr),* $(,)?) => {
        /// Built-in infix operators, bound under their canonical spelling
        /// so `(+)` and `List.fold_left (+) 0 xs` work.
        pub(crate) static OPERATORS: &[Native] = &[
            $(Native::fixed($symbol, 2, |_, args| {
                let [a, b] = take(args)?;
                ops::binary(&$op, a, b)
            }),)*
        ];
    };
}

operators! {
    "+" => BinOp::Add,
    "-" => BinOp::Sub,
    "*" => BinOp::Mul,
    "/" => BinOp::Div,
    "mod" => BinOp::Mod,
    "+." => BinOp::FAdd,
    "-." => BinOp::FSub,
    "*." => BinOp::FMul,
    "/." => BinOp::FDiv,
    "**" => BinOp::Pow,
    "^" => BinOp::Concat,
    "@" => BinOp::Append,
    "=" => BinOp::Eq,
    "<>" => BinOp::Ne,
    "==" => BinOp::PhysEq,
    "!=" => BinOp::PhysNe,
    "<" => BinOp::Lt,
    ">" => BinOp::Gt,
    "<=" => BinOp::Le,
    ">=" => BinOp::Ge,
    "&&" => BinOp::And,
    "||" => BinOp::Or,
}

fn module_of(natives: &'static [Native]) -> Rc<Namespace> {
    let mut ns = Namespace::default();
    for native in natives {
        ns.define(native.name, native.value());
    }
    Rc::new(ns)
}

/// Install the built-in types, functions and modules into `ns`.
pub fn install(ns: &mut Namespace) {
    ns.declare_type("option", &[("None", 0), ("Some", 1)]);
    ns.declare_type(
        "exn",
        &[
            ("Not_found", 0),
            ("Exit", 0),
            ("Failure", 1),
            ("Invalid_argument", 1),
        ],
    );
    for native in GLOBALS.iter().chain(OPERATORS) {
        ns.define(native.name, native.value());
    }
    ns.modules.insert("String".into(), module_of(STRING));
    ns.modules.insert("Char".into(), module_of(CHAR));
    ns.modules.insert("Printf".into(), module_of(PRINTF));
}

/// `[a; b; c]` from a Rust vector.
pub(crate) fn list(items: Vec<Value>) -> Value {
    Value::List(List::from(items))
}
