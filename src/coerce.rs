//! Coercion module: every cross-kind rule in one place.
//!
//! Arithmetic filters, comparison operators, and the dispatcher all consult
//! this module, so the numeric-string grammar, int/float promotion, and the
//! ordering rules are defined exactly once.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::value::Value;

/// A value viewed as a number. Strings that parse as integer or decimal
/// literals participate in arithmetic through this view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Num::Float(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::Int(i),
            Num::Float(f) => Value::Float(f),
        }
    }
}

impl From<Num> for Value {
    fn from(n: Num) -> Self {
        n.into_value()
    }
}

/// View a value as a number, if it has one: ints and floats directly,
/// strings through the numeric literal grammar (optional sign, digits,
/// optional fractional part — no exponent, no surrounding junk).
pub fn view_as_number(v: &Value) -> Option<Num> {
    match v {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse a numeric literal. Returns `Num::Int` when there is no fractional
/// part, `Num::Float` otherwise.
pub fn parse_number(s: &str) -> Option<Num> {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    match body.split('.').collect::<Vec<_>>()[..] {
        [int] if !int.is_empty() => s.parse::<i64>().ok().map(Num::Int),
        [int, frac] if !int.is_empty() && !frac.is_empty() => {
            s.parse::<f64>().ok().map(Num::Float)
        }
        _ => None,
    }
}

/// Arithmetic over two numeric views. The result is float if either side is
/// float; int/int division truncates toward zero; division or modulo by zero
/// yields `None`, which the filter layer turns into `Nil`.
pub fn arithmetic(op: ArithOp, a: Num, b: Num) -> Option<Num> {
    if a.is_float() || b.is_float() {
        let (x, y) = (a.as_f64(), b.as_f64());
        let r = match op {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
            ArithOp::Div => {
                if y == 0.0 {
                    return None;
                }
                x / y
            }
            ArithOp::Rem => {
                if y == 0.0 {
                    return None;
                }
                x % y
            }
        };
        Some(Num::Float(r))
    } else {
        let (Num::Int(x), Num::Int(y)) = (a, b) else {
            unreachable!()
        };
        let r = match op {
            ArithOp::Add => x.wrapping_add(y),
            ArithOp::Sub => x.wrapping_sub(y),
            ArithOp::Mul => x.wrapping_mul(y),
            ArithOp::Div => return x.checked_div(y).map(Num::Int),
            ArithOp::Rem => return x.checked_rem(y).map(Num::Int),
        };
        Some(Num::Int(r))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Equality across kinds. Numbers compare by value, times by instant (with
/// string sides parsed), dates calendar-wise, opaque values by host
/// equivalence. `Nil` equals only `Nil`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, _) | (_, Value::Nil) => false,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        (Value::Time(x), Value::Time(y)) => x == y,
        (Value::Time(t), Value::String(s)) | (Value::String(s), Value::Time(t)) => {
            parse_time(s).is_some_and(|p| p == *t)
        }
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Date(d), Value::String(s)) | (Value::String(s), Value::Date(d)) => {
            parse_date(s).is_some_and(|p| p == *d)
        }
        (Value::Opaque(o), other) | (other, Value::Opaque(o)) => o.equals(other),
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    }
}

/// Ordering for `<` and friends. Only like-kinded numerics, strings, bools,
/// and date/time pairs are ordered; `Nil` against a concrete kind behaves as
/// that kind's zero. Unordered pairs return `None`, which comparisons treat
/// as false.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Some(Ordering::Equal),
        (Value::Nil, other) => compare_values(&nil_as_zero(other)?, other),
        (other, Value::Nil) => compare_values(other, &nil_as_zero(other)?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
        (Value::Time(t), Value::String(s)) => parse_time(s).map(|p| t.cmp(&p)),
        (Value::String(s), Value::Time(t)) => parse_time(s).map(|p| p.cmp(t)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::Date(d), Value::String(s)) => parse_date(s).map(|p| d.cmp(&p)),
        (Value::String(s), Value::Date(d)) => parse_date(s).map(|p| p.cmp(d)),
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (view_as_number(a)?.as_f64(), view_as_number(b)?.as_f64());
            x.partial_cmp(&y)
        }
        _ => None,
    }
}

fn nil_as_zero(like: &Value) -> Option<Value> {
    match like {
        Value::String(_) => Some(Value::String(String::new())),
        Value::Int(_) => Some(Value::Int(0)),
        Value::Float(_) => Some(Value::Float(0.0)),
        _ => None,
    }
}

/// Parse a string as an instant. Accepts RFC 3339, `%Y-%m-%d %H:%M:%S` with
/// or without a numeric offset, and a bare `%Y-%m-%d` (midnight UTC).
pub fn parse_time(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(t);
    }
    if let Ok(n) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(n.and_utc().fixed_offset());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset());
    }
    None
}

/// Parse a string as a calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_time(s).map(|t| t.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_as_number() {
        assert_eq!(view_as_number(&Value::Int(3)), Some(Num::Int(3)));
        assert_eq!(
            view_as_number(&Value::String("-10".into())),
            Some(Num::Int(-10))
        );
        assert_eq!(
            view_as_number(&Value::String("10.5".into())),
            Some(Num::Float(10.5))
        );
        assert_eq!(view_as_number(&Value::String("1e5".into())), None);
        assert_eq!(view_as_number(&Value::String("12px".into())), None);
        assert_eq!(view_as_number(&Value::String("".into())), None);
        assert_eq!(view_as_number(&Value::String(".5".into())), None);
        assert_eq!(view_as_number(&Value::Bool(true)), None);
    }

    #[test]
    fn test_arithmetic_promotion() {
        let r = arithmetic(ArithOp::Add, Num::Int(1), Num::Float(0.5)).unwrap();
        assert_eq!(r, Num::Float(1.5));
        let r = arithmetic(ArithOp::Mul, Num::Int(3), Num::Int(4)).unwrap();
        assert_eq!(r, Num::Int(12));
    }

    #[test]
    fn test_int_division_truncates() {
        let r = arithmetic(ArithOp::Div, Num::Int(20), Num::Int(7)).unwrap();
        assert_eq!(r, Num::Int(2));
        let r = arithmetic(ArithOp::Div, Num::Int(20), Num::Float(7.0)).unwrap();
        match r {
            Num::Float(f) => assert!((f - 2.857142857142857).abs() < 1e-12),
            Num::Int(_) => panic!("expected float"),
        }
    }

    #[test]
    fn test_division_by_zero_is_soft() {
        assert_eq!(arithmetic(ArithOp::Div, Num::Int(20), Num::Int(0)), None);
        assert_eq!(
            arithmetic(ArithOp::Div, Num::Float(1.0), Num::Int(0)),
            None
        );
        assert_eq!(arithmetic(ArithOp::Rem, Num::Int(5), Num::Int(0)), None);
    }

    #[test]
    fn test_ordering_nil_as_kind_zero() {
        assert_eq!(
            compare_values(&Value::Nil, &Value::Int(1)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::String("a".into()), &Value::Nil),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&Value::Nil, &Value::String(String::new())),
            Some(Ordering::Equal)
        );
        // No zero for arrays; the comparison is simply unordered.
        assert_eq!(compare_values(&Value::Nil, &Value::Array(vec![])), None);
    }

    #[test]
    fn test_ordering_cross_kind_is_unordered() {
        assert_eq!(compare_values(&Value::Int(1), &Value::String("2".into())), None);
        assert_eq!(compare_values(&Value::Bool(true), &Value::Int(1)), None);
    }

    #[test]
    fn test_bool_ordering() {
        assert_eq!(
            compare_values(&Value::Bool(false), &Value::Bool(true)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_time_equality_with_string() {
        let t = parse_time("2017-02-08 09:00:00").unwrap();
        assert!(values_equal(
            &Value::Time(t),
            &Value::String("2017-02-08T09:00:00Z".into())
        ));
    }

    #[test]
    fn test_date_comparison_with_string() {
        let d = NaiveDate::from_ymd_opt(2017, 2, 8).unwrap();
        assert_eq!(
            compare_values(&Value::Date(d), &Value::String("2017-03-01".into())),
            Some(Ordering::Less)
        );
    }
}
