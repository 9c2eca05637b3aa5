//! The standard filter library.
//!
//! Every filter here follows the lenient evaluation model: structural
//! problems never originate in a filter body, and data problems (bad
//! coercions, unparseable dates, division by zero) return `None`, which the
//! dispatcher resolves to `Nil`.

mod array;
mod date;
mod hash;
mod math;
mod string;

use crate::filters::{ArgSpec, FilterRegistry};
use crate::value::Value;

// Registers a closure filter with its declared signature in one line:
//   filter!(reg, "join", (1, 2)[ArgSpec::any(), ArgSpec::string()], args => { ... });
macro_rules! filter {
    ($reg:ident, $name:literal, ($min:expr, $max:expr) [$($spec:expr),* $(,)?], $args:ident => $body:block) => {
        $reg.register_fn(
            $name,
            $crate::FilterSignature::new($min, $max, vec![$($spec),*]),
            move |$args: &[$crate::Value]| -> ::std::option::Option<$crate::Value> { $body },
        )
    };
}
pub(crate) use filter;

/// Install the full standard library onto a registry.
pub fn register_stdlib(reg: &mut FilterRegistry) {
    register_value_filters(reg);
    array::register(reg);
    string::register(reg);
    math::register(reg);
    hash::register(reg);
    date::register(reg);
}

fn register_value_filters(reg: &mut FilterRegistry) {
    filter!(reg, "default", (2, 2)[ArgSpec::any(), ArgSpec::any()], args => {
        if args[0].is_empty() {
            Some(args[1].clone())
        } else {
            Some(args[0].clone())
        }
    });

    filter!(reg, "size", (1, 1)[ArgSpec::any()], args => {
        let n = match &args[0] {
            Value::String(s) => s.chars().count(),
            Value::Array(a) => a.len(),
            Value::Map(m) => m.len(),
            _ => 0,
        };
        Some(Value::Int(n as i64))
    });

    filter!(reg, "inspect", (1, 1)[ArgSpec::any()], args => {
        Some(Value::String(args[0].inspect()))
    });

    filter!(reg, "type", (1, 1)[ArgSpec::any()], args => {
        Some(Value::String(args[0].type_name().to_string()))
    });
}
