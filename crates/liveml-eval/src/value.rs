//! Runtime values.
//!
//! Values are immutable and cheap to clone: every aggregate sits behind
//! an `Rc`. Lists are persistent cons cells so `::` and pattern matching
//! on a tail never copy.
//!
//! Every aggregate records how deeply it nests other aggregates. Printing,
//! comparison and dropping recurse once per level, so the evaluator
//! refuses to build values deeper than its call-depth bound.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use liveml_types::ast::{Expr, MatchArm, Pattern};

use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::natives::Native;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Char(char),
    Bool(bool),
    Unit,
    Tuple(Rc<Tuple>),
    List(List),
    Variant(Rc<Variant>),
    Closure(Rc<Closure>),
    Native(Rc<NativeCall>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Self::Str(s.into())
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        let depth = nested_depth(&items);
        Self::Tuple(Rc::new(Tuple { items, depth }))
    }

    /// Levels of aggregate nesting: 0 for scalars, 1 for `Some 1`, 2 for
    /// `[(1, 2)]`. A list's length does not count.
    pub fn depth(&self) -> usize {
        match self {
            Self::Tuple(tuple) => tuple.depth,
            Self::List(list) => list.depth(),
            Self::Variant(variant) => variant.depth,
            Self::Closure(closure) => closure.depth,
            Self::Native(call) => call.depth,
            Self::Int(_)
            | Self::Float(_)
            | Self::Str(_)
            | Self::Char(_)
            | Self::Bool(_)
            | Self::Unit => 0,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Char(_) => "char",
            Self::Bool(_) => "bool",
            Self::Unit => "unit",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::Variant(v) => &v.ctor.type_name,
            Self::Closure(_) | Self::Native(_) => "function",
        }
    }

    pub fn as_int(&self) -> EvalResult<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            other => Err(EvalError::type_mismatch("int", other.type_name())),
        }
    }

    pub fn as_float(&self) -> EvalResult<f64> {
        match self {
            Self::Float(x) => Ok(*x),
            other => Err(EvalError::type_mismatch("float", other.type_name())),
        }
    }

    /// A float, accepting ints as well. Used where a dynamic caller is
    /// likely to pass `10` for `10.`.
    pub fn as_number(&self) -> EvalResult<f64> {
        match self {
            Self::Float(x) => Ok(*x),
            Self::Int(n) => Ok(*n as f64),
            other => Err(EvalError::type_mismatch("float", other.type_name())),
        }
    }

    pub fn as_str(&self) -> EvalResult<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(EvalError::type_mismatch("string", other.type_name())),
        }
    }

    pub fn as_char(&self) -> EvalResult<char> {
        match self {
            Self::Char(c) => Ok(*c),
            other => Err(EvalError::type_mismatch("char", other.type_name())),
        }
    }

    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(EvalError::type_mismatch("bool", other.type_name())),
        }
    }

    pub fn as_list(&self) -> EvalResult<&List> {
        match self {
            Self::List(list) => Ok(list),
            other => Err(EvalError::type_mismatch("list", other.type_name())),
        }
    }

    pub fn as_tuple(&self, len: usize) -> EvalResult<&[Value]> {
        match self {
            Self::Tuple(tuple) if tuple.items.len() == len => Ok(&tuple.items),
            other => Err(EvalError::type_mismatch(
                &format!("{len}-tuple"),
                other.type_name(),
            )),
        }
    }
}

/// One more than the deepest of `values`.
fn nested_depth<'a>(values: impl IntoIterator<Item = &'a Value>) -> usize {
    1 + values.into_iter().map(Value::depth).max().unwrap_or(0)
}

#[derive(Debug)]
pub struct Tuple {
    items: Vec<Value>,
    depth: usize,
}

impl Tuple {
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Lists
// ══════════════════════════════════════════════════════════════════════════════

/// A persistent singly linked list.
#[derive(Clone, Default)]
pub struct List(Option<Rc<Cons>>);

struct Cons {
    head: Value,
    tail: List,
    /// Deepest element of this cell and every cell after it, plus one.
    depth: usize,
}

impl List {
    pub fn nil() -> Self {
        Self(None)
    }

    pub fn cons(head: Value, tail: List) -> Self {
        let depth = (head.depth() + 1).max(tail.depth());
        Self(Some(Rc::new(Cons { head, tail, depth })))
    }

    /// Nesting depth of the elements plus one; 0 for the empty list.
    pub fn depth(&self) -> usize {
        self.0.as_ref().map_or(0, |cons| cons.depth)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Head and tail, or `None` for the empty list.
    pub fn split(&self) -> Option<(&Value, &List)> {
        self.0.as_deref().map(|cons| (&cons.head, &cons.tail))
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter(self)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// `items` prepended to `tail`.
    pub fn prepend(items: Vec<Value>, tail: List) -> Self {
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| List::cons(item, acc))
    }

    fn ptr_eq(&self, other: &List) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        List::prepend(items, List::nil())
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        List::from(iter.into_iter().collect::<Vec<_>>())
    }
}

pub struct ListIter<'a>(&'a List);

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let (head, tail) = self.0.split()?;
        self.0 = tail;
        Some(head)
    }
}

// Long lists would otherwise be dropped recursively, one native frame per
// cell.
impl Drop for List {
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(cell) = next {
            match Rc::try_unwrap(cell) {
                Ok(mut cons) => next = cons.tail.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Variants
// ══════════════════════════════════════════════════════════════════════════════

/// A declared constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub name: String,
    pub type_name: String,
    /// Position in the declaring type; orders values of that type.
    pub tag: usize,
    pub arity: usize,
}

#[derive(Debug)]
pub struct Variant {
    pub ctor: Rc<Constructor>,
    pub args: Vec<Value>,
    depth: usize,
}

impl Variant {
    pub fn value(ctor: Rc<Constructor>, args: Vec<Value>) -> Value {
        let depth = nested_depth(&args);
        Value::Variant(Rc::new(Variant { ctor, args, depth }))
    }

    pub fn name(&self) -> &str {
        &self.ctor.name
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct FunDef {
    pub params: Vec<Pattern>,
    pub body: FunBody,
}

#[derive(Debug)]
pub enum FunBody {
    /// `fun p1 p2 -> e`
    Expr(Expr),
    /// `function | p -> e`; takes exactly one argument.
    Arms(Vec<MatchArm>),
}

impl FunDef {
    pub fn arity(&self) -> usize {
        match self.body {
            FunBody::Expr(_) => self.params.len(),
            FunBody::Arms(_) => 1,
        }
    }
}

/// Functions defined together by `let rec ... and ...`.
///
/// Members are re-bound by name each time one of them is called, so the
/// group never refers to its own closures.
#[derive(Debug)]
pub struct RecGroup {
    pub env: Env,
    pub members: Vec<(String, Rc<FunDef>)>,
}

pub struct Closure {
    pub def: Rc<FunDef>,
    pub env: Env,
    pub group: Option<Rc<RecGroup>>,
    /// Arguments supplied by earlier partial applications.
    pub applied: Vec<Value>,
    /// Counts captured locals, so chains of closures wrapping closures
    /// are bounded like any other nested data.
    depth: usize,
}

impl Closure {
    pub fn value(
        def: Rc<FunDef>,
        env: Env,
        group: Option<Rc<RecGroup>>,
        applied: Vec<Value>,
    ) -> Value {
        let depth = nested_depth(&applied).max(env.depth() + 1);
        Value::Closure(Rc::new(Closure {
            def,
            env,
            group,
            applied,
            depth,
        }))
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fun/{}>", self.def.arity())
    }
}

/// A native function with the arguments applied so far.
#[derive(Debug)]
pub struct NativeCall {
    pub native: &'static Native,
    pub args: Vec<Value>,
    depth: usize,
}

impl NativeCall {
    pub fn value(native: &'static Native, args: Vec<Value>) -> Value {
        let depth = nested_depth(&args);
        Value::Native(Rc::new(NativeCall {
            native,
            args,
            depth,
        }))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Comparison
// ══════════════════════════════════════════════════════════════════════════════

/// Structural equality (`=`). Floats compare with IEEE semantics, so
/// `nan = nan` is false.
pub fn structural_eq(a: &Value, b: &Value) -> EvalResult<bool> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Ok(x == y),
        (Value::Tuple(xs), Value::Tuple(ys)) => {
            all_eq(xs.items.iter(), ys.items.iter(), xs.items.len() == ys.items.len())
        }
        (Value::List(xs), Value::List(ys)) => {
            if xs.ptr_eq(ys) {
                return Ok(true);
            }
            let (mut xs, mut ys) = (xs.iter(), ys.iter());
            loop {
                match (xs.next(), ys.next()) {
                    (None, None) => return Ok(true),
                    (Some(x), Some(y)) => {
                        if !structural_eq(x, y)? {
                            return Ok(false);
                        }
                    }
                    _ => return Ok(false),
                }
            }
        }
        (Value::Variant(x), Value::Variant(y)) => {
            if x.ctor.type_name != y.ctor.type_name || x.ctor.tag != y.ctor.tag {
                return Ok(false);
            }
            all_eq(x.args.iter(), y.args.iter(), x.args.len() == y.args.len())
        }
        _ => Ok(compare(a, b)? == Ordering::Equal),
    }
}

fn all_eq<'a>(
    xs: impl Iterator<Item = &'a Value>,
    mut ys: impl Iterator<Item = &'a Value>,
    same_len: bool,
) -> EvalResult<bool> {
    if !same_len {
        return Ok(false);
    }
    for x in xs {
        match ys.next() {
            Some(y) if structural_eq(x, y)? => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Total structural order (`compare`, `<`, ...).
///
/// Variants order by declaration position, then by arguments. `nan` is
/// equal to itself and below every other float.
pub fn compare(a: &Value, b: &Value) -> EvalResult<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => Ok(compare_floats(*x, *y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Char(x), Value::Char(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Unit, Value::Unit) => Ok(Ordering::Equal),
        (Value::Tuple(xs), Value::Tuple(ys)) => compare_seq(xs.items.iter(), ys.items.iter()),
        (Value::List(xs), Value::List(ys)) => compare_seq(xs.iter(), ys.iter()),
        (Value::Variant(x), Value::Variant(y)) if x.ctor.type_name == y.ctor.type_name => {
            match x.ctor.tag.cmp(&y.ctor.tag) {
                Ordering::Equal => compare_seq(x.args.iter(), y.args.iter()),
                other => Ok(other),
            }
        }
        (Value::Closure(_) | Value::Native(_), _) | (_, Value::Closure(_) | Value::Native(_)) => {
            Err(EvalError::FunctionalValue)
        }
        _ => Err(EvalError::TypeMismatch(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn compare_floats(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn compare_seq<'a>(
    mut xs: impl Iterator<Item = &'a Value>,
    mut ys: impl Iterator<Item = &'a Value>,
) -> EvalResult<Ordering> {
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return Ok(Ordering::Equal),
            (None, Some(_)) => return Ok(Ordering::Less),
            (Some(_), None) => return Ok(Ordering::Greater),
            (Some(x), Some(y)) => match compare(x, y)? {
                Ordering::Equal => {}
                other => return Ok(other),
            },
        }
    }
}

/// Physical equality (`==`): identity for boxed values, value equality
/// for immediates.
pub fn physical_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Unit, Value::Unit) => true,
        (Value::Str(x), Value::Str(y)) => Rc::ptr_eq(x, y),
        (Value::Tuple(x), Value::Tuple(y)) => Rc::ptr_eq(x, y),
        (Value::List(x), Value::List(y)) => x.ptr_eq(y),
        (Value::Variant(x), Value::Variant(y)) => {
            Rc::ptr_eq(x, y) || (x.args.is_empty() && y.args.is_empty() && x.ctor == y.ctor)
        }
        (Value::Closure(x), Value::Closure(y)) => Rc::ptr_eq(x, y),
        (Value::Native(x), Value::Native(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(ns: &[i64]) -> Value {
        Value::List(ns.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_list_basics() {
        let list = List::from(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.len(), 2);
        let (head, tail) = list.split().unwrap();
        assert!(matches!(head, Value::Int(1)));
        assert_eq!(tail.len(), 1);
        assert!(List::nil().is_empty());
    }

    #[test]
    fn test_long_list_drops_without_recursion() {
        let list: List = (0..1_000_000).map(Value::Int).collect();
        assert_eq!(list.len(), 1_000_000);
        drop(list);
    }

    #[test]
    fn test_depth_counts_nesting_not_length() {
        assert_eq!(Value::Int(1).depth(), 0);
        assert_eq!(ints(&[1, 2, 3]).depth(), 1);
        assert_eq!(Value::List(List::nil()).depth(), 0);
        let pair = Value::tuple(vec![ints(&[1]), Value::Unit]);
        assert_eq!(pair.depth(), 2);
        let nested: List = vec![pair.clone(), Value::Int(0)].into();
        assert_eq!(nested.depth(), 3);
        assert_eq!(List::cons(Value::Int(0), nested).depth(), 3);
    }

    #[test]
    fn test_structural_compare() {
        assert_eq!(compare(&ints(&[1, 2]), &ints(&[1, 3])).unwrap(), Ordering::Less);
        assert_eq!(compare(&ints(&[]), &ints(&[0])).unwrap(), Ordering::Less);
        assert!(structural_eq(&ints(&[1, 2]), &ints(&[1, 2])).unwrap());
        assert!(!structural_eq(&Value::Float(f64::NAN), &Value::Float(f64::NAN)).unwrap());
        assert_eq!(
            compare(&Value::Float(f64::NAN), &Value::Float(1.0)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_variant_order_follows_declaration() {
        let ctor = |name: &str, tag| {
            Rc::new(Constructor {
                name: name.into(),
                type_name: "t".into(),
                tag,
                arity: 1,
            })
        };
        let a = Variant::value(ctor("A", 0), vec![Value::Int(9)]);
        let b = Variant::value(ctor("B", 1), vec![Value::Int(1)]);
        assert_eq!(compare(&a, &b).unwrap(), Ordering::Less);
        assert!(!structural_eq(&a, &b).unwrap());
    }

    #[test]
    fn test_mixed_kinds_are_type_errors() {
        assert!(matches!(
            compare(&Value::Int(1), &Value::Float(1.0)),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_physical_equality() {
        let s = Value::str("abc");
        assert!(physical_eq(&s, &s.clone()));
        assert!(!physical_eq(&s, &Value::str("abc")));
        assert!(structural_eq(&s, &Value::str("abc")).unwrap());
    }
}
