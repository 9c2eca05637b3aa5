//! Number filters.
//!
//! All of these lean on the coercion module: numeric strings participate,
//! float-ness is contagious, and anything without a numeric view resolves
//! to `Nil` rather than erroring.

use super::filter;
use crate::coerce::{self, ArithOp, Num};
use crate::filters::{ArgSpec, FilterRegistry};
use crate::value::Value;

pub(super) fn register(reg: &mut FilterRegistry) {
    filter!(reg, "to_number", (1, 1)[ArgSpec::any()], args => {
        coerce::view_as_number(&args[0]).map(Num::into_value)
    });

    filter!(reg, "abs", (1, 1)[ArgSpec::number()], args => {
        match num(&args[0])? {
            Num::Int(i) => Some(Value::Int(i.wrapping_abs())),
            Num::Float(f) => Some(Value::Float(f.abs())),
        }
    });

    filter!(reg, "ceil", (1, 1)[ArgSpec::number()], args => {
        match num(&args[0])? {
            Num::Int(i) => Some(Value::Int(i)),
            Num::Float(f) => Some(Value::Int(f.ceil() as i64)),
        }
    });

    filter!(reg, "floor", (1, 1)[ArgSpec::number()], args => {
        match num(&args[0])? {
            Num::Int(i) => Some(Value::Int(i)),
            Num::Float(f) => Some(Value::Int(f.floor() as i64)),
        }
    });

    // Zero (or omitted) places rounds to an integer; positive places keep a
    // float. Halves round away from zero.
    filter!(reg, "round", (1, 2)[ArgSpec::number(), ArgSpec::number()], args => {
        let n = num(&args[0])?;
        let places = match args.get(1) {
            Some(v) => match num(v)? {
                Num::Int(i) => i,
                Num::Float(f) => f.trunc() as i64,
            },
            None => 0,
        };
        match n {
            Num::Int(i) => Some(Value::Int(i)),
            Num::Float(f) if places <= 0 => Some(Value::Int(f.round() as i64)),
            Num::Float(f) => {
                let factor = 10f64.powi(places.min(15) as i32);
                Some(Value::Float((f * factor).round() / factor))
            }
        }
    });

    arith(reg, "plus", ArithOp::Add);
    arith(reg, "minus", ArithOp::Sub);
    arith(reg, "times", ArithOp::Mul);
    arith(reg, "divided_by", ArithOp::Div);
    arith(reg, "modulo", ArithOp::Rem);

    filter!(reg, "at_least", (2, 2)[ArgSpec::any().nil_ok(), ArgSpec::any().nil_ok()], args => {
        clamp_filter(args, true)
    });

    filter!(reg, "at_most", (2, 2)[ArgSpec::any().nil_ok(), ArgSpec::any().nil_ok()], args => {
        clamp_filter(args, false)
    });
}

fn arith(reg: &mut FilterRegistry, name: &'static str, op: ArithOp) {
    reg.register_fn(
        name,
        crate::FilterSignature::new(2, 2, vec![ArgSpec::number(), ArgSpec::number()]),
        move |args: &[Value]| {
            let (a, b) = (num(&args[0])?, num(&args[1])?);
            coerce::arithmetic(op, a, b).map(Num::into_value)
        },
    );
}

// `at_least` / `at_most`. An operand without a numeric view short-circuits:
// the empty string comes back unchanged, anything else resolves to Nil.
// Float-ness of either operand carries into the result.
fn clamp_filter(args: &[Value], want_max: bool) -> Option<Value> {
    let (a, b) = (
        coerce::view_as_number(&args[0]),
        coerce::view_as_number(&args[1]),
    );
    let (Some(a), Some(b)) = (a, b) else {
        for v in args {
            if matches!(v, Value::String(s) if s.is_empty()) {
                return Some(v.clone());
            }
        }
        return None;
    };
    let pick_first = (a.as_f64() >= b.as_f64()) == want_max;
    let chosen = if pick_first { a } else { b };
    if a.is_float() || b.is_float() {
        Some(Value::Float(chosen.as_f64()))
    } else {
        Some(chosen.into_value())
    }
}

// Dispatch has already run the slot through view-as-number; a slot that had
// no numeric view arrives as Nil.
fn num(v: &Value) -> Option<Num> {
    match v {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}
