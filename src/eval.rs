//! Evaluator module: walks the AST over a binding context and produces a
//! value.
//!
//! Evaluation is pure and deterministic: no side effects on the context, no
//! I/O. Missing bindings, bad indices, and failed coercions all resolve to
//! `Nil`; only unknown filters and arity mismatches surface as errors.

use std::cmp::Ordering;

use crate::coerce;
use crate::context::Bindings;
use crate::expr::{BinaryOp, Expr, FilterCall, Segment, UnaryOp};
use crate::filters::FilterRegistry;
use crate::value::Value;
use crate::Error;

pub(crate) fn eval(
    expr: &Expr,
    bindings: &dyn Bindings,
    filters: &FilterRegistry,
) -> Result<Value, Error> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        // Standalone `empty` / `blank` render as nothing; they only carry
        // meaning inside an equality.
        Expr::Empty | Expr::Blank => Ok(Value::Nil),
        Expr::Var(segments) => eval_path(segments, bindings, filters),
        Expr::Unary { op, expr } => {
            let v = eval(expr, bindings, filters)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!v.is_truthy()),
                UnaryOp::Neg => match coerce::view_as_number(&v) {
                    Some(coerce::Num::Int(i)) => Value::Int(-i),
                    Some(coerce::Num::Float(f)) => Value::Float(-f),
                    None => Value::Nil,
                },
            })
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, bindings, filters),
        Expr::Range { lo, hi } => {
            let lo = eval(lo, bindings, filters)?;
            let hi = eval(hi, bindings, filters)?;
            Ok(eval_range(&lo, &hi))
        }
        Expr::FilterChain { head, filters: calls } => {
            let mut acc = eval(head, bindings, filters)?;
            for call in calls {
                acc = apply_filter(acc, call, bindings, filters)?;
            }
            Ok(acc)
        }
    }
}

fn apply_filter(
    input: Value,
    call: &FilterCall,
    bindings: &dyn Bindings,
    filters: &FilterRegistry,
) -> Result<Value, Error> {
    let mut args = Vec::with_capacity(call.args.len() + 1);
    args.push(input);
    for arg in &call.args {
        args.push(eval(arg, bindings, filters)?);
    }
    filters.apply(&call.name, args)
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    bindings: &dyn Bindings,
    filters: &FilterRegistry,
) -> Result<Value, Error> {
    match op {
        // Short-circuit logicals return the deciding operand, not a bool.
        BinaryOp::Or => {
            let left = eval(lhs, bindings, filters)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval(rhs, bindings, filters)
            }
        }
        BinaryOp::And => {
            let left = eval(lhs, bindings, filters)?;
            if left.is_truthy() {
                eval(rhs, bindings, filters)
            } else {
                Ok(left)
            }
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let result = match (lhs, rhs) {
                (Expr::Empty | Expr::Blank, other) | (other, Expr::Empty | Expr::Blank) => {
                    eval(other, bindings, filters)?.is_empty()
                }
                _ => {
                    let left = eval(lhs, bindings, filters)?;
                    let right = eval(rhs, bindings, filters)?;
                    left == right
                }
            };
            Ok(Value::Bool(if op == BinaryOp::Eq { result } else { !result }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let left = eval(lhs, bindings, filters)?;
            let right = eval(rhs, bindings, filters)?;
            let ord = coerce::compare_values(&left, &right);
            let result = match op {
                BinaryOp::Lt => ord == Some(Ordering::Less),
                BinaryOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => ord == Some(Ordering::Greater),
                BinaryOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Contains => {
            let left = eval(lhs, bindings, filters)?;
            let right = eval(rhs, bindings, filters)?;
            Ok(Value::Bool(contains(&left, &right)))
        }
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => s.contains(&needle.to_display_string()),
        Value::Array(a) => a.iter().any(|v| v == needle),
        _ => false,
    }
}

// `(1..n)` produces the inclusive integer array. Ends without a numeric
// view make the range Nil rather than an error.
fn eval_range(lo: &Value, hi: &Value) -> Value {
    let (Some(lo), Some(hi)) = (view_as_int(lo), view_as_int(hi)) else {
        return Value::Nil;
    };
    if lo > hi {
        return Value::Array(Vec::new());
    }
    Value::Array((lo..=hi).map(Value::Int).collect())
}

fn view_as_int(v: &Value) -> Option<i64> {
    match coerce::view_as_number(v)? {
        coerce::Num::Int(i) => Some(i),
        coerce::Num::Float(f) => Some(f.trunc() as i64),
    }
}

fn eval_path(
    segments: &[Segment],
    bindings: &dyn Bindings,
    filters: &FilterRegistry,
) -> Result<Value, Error> {
    let Some(Segment::Name(root)) = segments.first() else {
        return Ok(Value::Nil);
    };
    let mut current = bindings.lookup(root).unwrap_or(Value::Nil);
    for segment in &segments[1..] {
        let key = match segment {
            Segment::Name(name) => Value::String(name.clone()),
            Segment::Index(expr) => eval(expr, bindings, filters)?,
        };
        current = access(&current, &key);
    }
    Ok(current)
}

// One step of path resolution. Any miss is Nil, never an error.
fn access(value: &Value, key: &Value) -> Value {
    match value {
        Value::Map(m) => {
            let name = key.to_display_string();
            if let Some(v) = m.get(name.as_str()) {
                return v.clone();
            }
            synthetic_property(value, &name)
        }
        Value::Array(a) => {
            if let Some(i) = view_as_int(key) {
                let len = a.len() as i64;
                let i = if i < 0 { i + len } else { i };
                if (0..len).contains(&i) {
                    return a[i as usize].clone();
                }
                return Value::Nil;
            }
            synthetic_property(value, &key.to_display_string())
        }
        Value::Opaque(o) => o
            .property(&key.to_display_string())
            .unwrap_or(Value::Nil),
        Value::String(_) => synthetic_property(value, &key.to_display_string()),
        _ => Value::Nil,
    }
}

// Liquid's special properties: `size`, `first`, `last` resolve on strings,
// arrays, and maps when the segment is not a real key.
fn synthetic_property(value: &Value, name: &str) -> Value {
    match (value, name) {
        (Value::String(s), "size") => Value::Int(s.chars().count() as i64),
        (Value::Array(a), "size") => Value::Int(a.len() as i64),
        (Value::Map(m), "size") => Value::Int(m.len() as i64),
        (Value::Array(a), "first") => a.first().cloned().unwrap_or(Value::Nil),
        (Value::Array(a), "last") => a.last().cloned().unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}
