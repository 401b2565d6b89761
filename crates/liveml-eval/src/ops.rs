//! Built-in operators on evaluated operands.
//!
//! `&&` and `||` are short-circuited by the evaluator; they only reach
//! this module when used as values, e.g. `List.fold_left (&&) true bs`.

use std::cmp::Ordering;

use liveml_types::ast::{BinOp, UnaryOp};
use liveml_types::Syntax;

use crate::error::{EvalError, EvalResult};
use crate::value::{compare, physical_eq, structural_eq, List, Value};

pub(crate) fn binary(op: &BinOp, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinOp::Add => ints(op, &left, &right, |a, b| Ok(a.wrapping_add(b))),
        BinOp::Sub => ints(op, &left, &right, |a, b| Ok(a.wrapping_sub(b))),
        BinOp::Mul => ints(op, &left, &right, |a, b| Ok(a.wrapping_mul(b))),
        BinOp::Div => ints(op, &left, &right, |a, b| {
            if b == 0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(a.wrapping_div(b))
            }
        }),
        BinOp::Mod => ints(op, &left, &right, |a, b| {
            if b == 0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(a.wrapping_rem(b))
            }
        }),
        BinOp::FAdd => floats(op, &left, &right, |a, b| a + b),
        BinOp::FSub => floats(op, &left, &right, |a, b| a - b),
        BinOp::FMul => floats(op, &left, &right, |a, b| a * b),
        BinOp::FDiv => floats(op, &left, &right, |a, b| a / b),
        BinOp::Pow => floats(op, &left, &right, f64::powf),
        BinOp::Concat => match (&left, &right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
            _ => Err(operand_error(op, "string", &left, &right)),
        },
        BinOp::Append => match (&left, &right) {
            (Value::List(a), Value::List(b)) => {
                Ok(Value::List(List::prepend(a.iter().cloned().collect(), b.clone())))
            }
            _ => Err(operand_error(op, "list", &left, &right)),
        },
        BinOp::Eq => Ok(Value::Bool(structural_eq(&left, &right)?)),
        BinOp::Ne => Ok(Value::Bool(!structural_eq(&left, &right)?)),
        BinOp::PhysEq => Ok(Value::Bool(physical_eq(&left, &right))),
        BinOp::PhysNe => Ok(Value::Bool(!physical_eq(&left, &right))),
        BinOp::Lt => ordering(&left, &right, Ordering::is_lt),
        BinOp::Gt => ordering(&left, &right, Ordering::is_gt),
        BinOp::Le => ordering(&left, &right, Ordering::is_le),
        BinOp::Ge => ordering(&left, &right, Ordering::is_ge),
        BinOp::And => Ok(Value::Bool(left.as_bool()? && right.as_bool()?)),
        BinOp::Or => Ok(Value::Bool(left.as_bool()? || right.as_bool()?)),
        BinOp::Custom(name) => Err(EvalError::Unbound(name.clone())),
    }
}

pub(crate) fn unary(op: UnaryOp, operand: Value) -> EvalResult<Value> {
    match (op, &operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::FNeg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(EvalError::type_mismatch("int", other.type_name())),
        (UnaryOp::FNeg, other) => Err(EvalError::type_mismatch("float", other.type_name())),
        (UnaryOp::Not, other) => Err(EvalError::type_mismatch("bool", other.type_name())),
    }
}

fn ints(
    op: &BinOp,
    left: &Value,
    right: &Value,
    f: impl FnOnce(i64, i64) -> EvalResult<i64>,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => f(*a, *b).map(Value::Int),
        _ => Err(operand_error(op, "int", left, right)),
    }
}

fn floats(op: &BinOp, left: &Value, right: &Value, f: impl FnOnce(f64, f64) -> f64) -> EvalResult<Value> {
    match (left, right) {
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(f(*a, *b))),
        _ => Err(operand_error(op, "float", left, right)),
    }
}

fn ordering(left: &Value, right: &Value, test: fn(Ordering) -> bool) -> EvalResult<Value> {
    Ok(Value::Bool(test(compare(left, right)?)))
}

fn operand_error(op: &BinOp, expected: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "({}) expects {expected} operands, found {} and {}",
        op.symbol(Syntax::CANONICAL),
        left.type_name(),
        right.type_name()
    ))
}
