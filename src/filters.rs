//! Filters module: the registry mapping filter names to callables, and the
//! dispatch path that checks arity and coerces arguments.
//!
//! A filter's host function receives the already-coerced argument slice
//! (position 0 is the primary input) and returns `Some(value)` or `None`;
//! `None` is the soft-failure signal and becomes `Nil` in the chain. Only
//! structural problems (unknown name, wrong arity) surface as errors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::coerce;
use crate::value::Value;
use crate::Error;

/// A filter callable. Implement this (or use [`FilterRegistry::register_fn`]
/// with a closure) to host domain-specific filters.
pub trait FilterFn: Send + Sync {
    fn call(&self, args: &[Value]) -> Option<Value>;
}

impl<F> FilterFn for F
where
    F: Fn(&[Value]) -> Option<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> Option<Value> {
        self(args)
    }
}

/// Expected kind of one positional slot. The dispatcher coerces the
/// evaluated argument before the filter sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArgKind {
    /// Pass the value through untouched.
    Any,
    /// View as a number: the slot becomes `Int`/`Float`, or `Nil` when the
    /// value has no numeric view.
    Number,
    /// Stringify: the slot becomes `String` (`Nil` stringifies to `""`).
    String,
    /// Coerce to an array: arrays pass through, maps contribute their
    /// values, `Nil` becomes the empty array, scalars wrap as one element.
    Array,
}

/// One positional slot: its expected kind, and whether `Nil` is passed
/// through untouched instead of being coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub nil_passthrough: bool,
}

impl ArgSpec {
    pub const fn new(kind: ArgKind) -> Self {
        Self {
            kind,
            nil_passthrough: false,
        }
    }

    pub const fn any() -> Self {
        Self::new(ArgKind::Any)
    }

    pub const fn number() -> Self {
        Self::new(ArgKind::Number)
    }

    pub const fn string() -> Self {
        Self::new(ArgKind::String)
    }

    pub const fn array() -> Self {
        Self::new(ArgKind::Array)
    }

    /// Let `Nil` through uncoerced so the filter can distinguish an absent
    /// value from an empty one.
    pub const fn nil_ok(mut self) -> Self {
        self.nil_passthrough = true;
        self
    }
}

/// Declared shape of a filter: arity bounds (the primary input counts as
/// position 0, so `min_args` is at least 1) and one [`ArgSpec`] per slot up
/// to `max_args`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSignature {
    min_args: usize,
    max_args: usize,
    slots: Vec<ArgSpec>,
}

impl FilterSignature {
    pub fn new(min_args: usize, max_args: usize, slots: Vec<ArgSpec>) -> Self {
        assert!(min_args >= 1, "the primary input counts as position 0");
        assert!(min_args <= max_args);
        assert_eq!(
            slots.len(),
            max_args,
            "one ArgSpec per slot up to max_args"
        );
        Self {
            min_args,
            max_args,
            slots,
        }
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    pub fn max_args(&self) -> usize {
        self.max_args
    }

    fn expected(&self) -> String {
        if self.min_args == self.max_args {
            self.min_args.to_string()
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        }
    }
}

struct RegisteredFilter {
    signature: FilterSignature,
    func: Box<dyn FilterFn>,
}

/// Registry mapping filter names to callables with declared signatures.
///
/// Registration is additive and last-writer-wins; after engine setup the
/// registry is only read, so concurrent renders share it without locking.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<RegisteredFilter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter. A duplicate name replaces the earlier entry.
    pub fn register<F>(&mut self, name: impl Into<String>, signature: FilterSignature, func: F)
    where
        F: FilterFn + 'static,
    {
        self.filters.insert(
            name.into(),
            Arc::new(RegisteredFilter {
                signature,
                func: Box::new(func),
            }),
        );
    }

    /// Register a closure as a filter.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, signature: FilterSignature, func: F)
    where
        F: Fn(&[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(name, signature, func);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Registered filter names, sorted for stable listings.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch a filter application: arity check, per-slot coercion,
    /// invocation. A `None` from the host function resolves to `Nil`.
    pub fn apply(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let entry = self.filters.get(name).ok_or_else(|| Error::UnknownFilter {
            name: name.to_string(),
        })?;
        let sig = &entry.signature;
        if args.len() < sig.min_args || args.len() > sig.max_args {
            return Err(Error::WrongArity {
                name: name.to_string(),
                got: args.len(),
                expected: sig.expected(),
            });
        }
        let coerced: Vec<Value> = args
            .into_iter()
            .zip(&sig.slots)
            .map(|(v, spec)| coerce_slot(v, *spec))
            .collect();
        Ok(entry.func.call(&coerced).unwrap_or(Value::Nil))
    }
}

fn coerce_slot(v: Value, spec: ArgSpec) -> Value {
    if spec.nil_passthrough && matches!(v, Value::Nil) {
        return v;
    }
    match spec.kind {
        ArgKind::Any => v,
        ArgKind::Number => coerce::view_as_number(&v).map_or(Value::Nil, Into::into),
        ArgKind::String => Value::String(v.to_display_string()),
        ArgKind::Array => match v {
            Value::Array(a) => Value::Array(a),
            Value::Map(m) => Value::Array(m.into_values().collect()),
            Value::Nil => Value::Array(Vec::new()),
            other => Value::Array(vec![other]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_map;

    fn echo_sig(n: usize) -> FilterSignature {
        FilterSignature::new(n, n, vec![ArgSpec::any(); n])
    }

    #[test]
    fn test_register_and_apply() {
        let mut reg = FilterRegistry::new();
        reg.register_fn("shout", echo_sig(1), |args| {
            Some(Value::String(args[0].to_display_string().to_uppercase()))
        });
        let out = reg.apply("shout", vec![Value::from("hi")]).unwrap();
        assert_eq!(out, Value::String("HI".into()));
    }

    #[test]
    fn test_unknown_filter_is_structural() {
        let reg = FilterRegistry::new();
        let err = reg.apply("nope", vec![Value::Nil]).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownFilter {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn test_wrong_arity_is_structural() {
        let mut reg = FilterRegistry::new();
        reg.register_fn("pair", echo_sig(2), |_| Some(Value::Nil));
        match reg.apply("pair", vec![Value::Int(1)]).unwrap_err() {
            Error::WrongArity { name, got, .. } => {
                assert_eq!(name, "pair");
                assert_eq!(got, 1);
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn test_last_registration_wins() {
        let mut reg = FilterRegistry::new();
        reg.register_fn("f", echo_sig(1), |_| Some(Value::Int(1)));
        reg.register_fn("f", echo_sig(1), |_| Some(Value::Int(2)));
        assert_eq!(reg.apply("f", vec![Value::Nil]).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_none_from_filter_becomes_nil() {
        let mut reg = FilterRegistry::new();
        reg.register_fn("soft", echo_sig(1), |_| None);
        assert_eq!(reg.apply("soft", vec![Value::Int(1)]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_number_slot_coercion() {
        let mut reg = FilterRegistry::new();
        reg.register_fn(
            "id",
            FilterSignature::new(1, 1, vec![ArgSpec::number()]),
            |args| Some(args[0].clone()),
        );
        assert_eq!(
            reg.apply("id", vec![Value::from("10.5")]).unwrap(),
            Value::Float(10.5)
        );
        assert_eq!(
            reg.apply("id", vec![Value::from("ten")]).unwrap(),
            Value::Nil
        );
    }

    #[test]
    fn test_string_slot_coercion() {
        let mut reg = FilterRegistry::new();
        reg.register_fn(
            "id",
            FilterSignature::new(1, 1, vec![ArgSpec::string()]),
            |args| Some(args[0].clone()),
        );
        assert_eq!(
            reg.apply("id", vec![Value::Int(7)]).unwrap(),
            Value::String("7".into())
        );
        assert_eq!(
            reg.apply("id", vec![Value::Nil]).unwrap(),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_array_slot_coercion() {
        let mut reg = FilterRegistry::new();
        reg.register_fn(
            "id",
            FilterSignature::new(1, 1, vec![ArgSpec::array()]),
            |args| Some(args[0].clone()),
        );
        // A map contributes its values, in insertion order.
        let m = value_map! { "a" => 1, "b" => 2 };
        assert_eq!(
            reg.apply("id", vec![Value::Map(m)]).unwrap(),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
        // Scalars wrap.
        assert_eq!(
            reg.apply("id", vec![Value::Int(3)]).unwrap(),
            Value::Array(vec![Value::Int(3)])
        );
        // Nil becomes the empty array.
        assert_eq!(
            reg.apply("id", vec![Value::Nil]).unwrap(),
            Value::Array(vec![])
        );
    }

    #[test]
    fn test_nil_passthrough() {
        let mut reg = FilterRegistry::new();
        reg.register_fn(
            "probe",
            FilterSignature::new(1, 1, vec![ArgSpec::string().nil_ok()]),
            |args| Some(Value::Bool(matches!(args[0], Value::Nil))),
        );
        assert_eq!(
            reg.apply("probe", vec![Value::Nil]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            reg.apply("probe", vec![Value::Int(1)]).unwrap(),
            Value::Bool(false)
        );
    }
}
