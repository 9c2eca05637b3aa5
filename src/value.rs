//! Value module: the dynamic value space shared by bindings, the evaluator,
//! and every filter.
//!
//! This module provides the [`Value`] enum, the insertion-ordered
//! [`ValueMap`], and the [`OpaqueObject`] trait for host-supplied objects.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::coerce;

/// Mapping from string keys to values. Iteration order equals insertion
/// order, which `map`, `sort`, `uniq`, and `inspect` depend on.
pub type ValueMap = IndexMap<String, Value>;

/// A host-supplied object that crosses into the engine without being
/// decomposed into the plain value kinds.
///
/// The engine only asks it to stringify itself, optionally resolve a
/// property, and decide equivalence against another value. The default
/// equivalence compares canonical string forms, which is what lets e.g. a
/// phone object equal its formatted string.
pub trait OpaqueObject: fmt::Debug + Send + Sync {
    /// Canonical string form, used for rendering and default equivalence.
    fn stringify(&self) -> String;

    /// Resolve a property by name. `None` means the property does not exist
    /// and path resolution falls through to `Nil`.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Host-defined equivalence against another value.
    fn equals(&self, other: &Value) -> bool {
        match other {
            Value::String(s) => self.stringify() == *s,
            Value::Opaque(o) => self.stringify() == o.stringify(),
            _ => false,
        }
    }
}

/// A dynamic value.
///
/// `Nil` is the absent value and is distinct from the empty string, `false`,
/// and empty collections, though all of those are empty for the purposes of
/// `default`. Values are immutable from the evaluator's perspective; filters
/// always return new values.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(ValueMap),
    Date(NaiveDate),
    Time(DateTime<FixedOffset>),
    Opaque(Arc<dyn OpaqueObject>),
}

impl Value {
    /// Truthiness: only `Nil` and `false` are false. `0`, `""`, and empty
    /// collections are all true, matching Liquid.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Emptiness, as consulted by `default` and comparisons against the
    /// `empty` / `blank` keywords. Broader than falsiness: the empty string,
    /// array, and map are empty but truthy.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Nil | Value::Bool(false) => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Kind name as reported by the `type` filter.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Render this value the way the template layer writes it into output.
    ///
    /// `Nil` renders as nothing, arrays concatenate their elements, maps use
    /// the `inspect` form, and numbers use their canonical representation
    /// (integers without a decimal point, floats in shortest form).
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(a) => a.iter().map(Value::to_display_string).collect(),
            Value::Map(_) => self.inspect(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.to_rfc3339(),
            Value::Opaque(o) => o.stringify(),
        }
    }

    /// Debug rendering: a JSON-like string with insertion-ordered maps.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        self.write_inspect(&mut out);
        out
    }

    fn write_inspect(&self, out: &mut String) {
        match self {
            Value::Nil => out.push_str("null"),
            Value::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            Value::String(s) => write_json_string(out, s),
            Value::Array(a) => {
                out.push('[');
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    v.write_inspect(out);
                }
                out.push(']');
            }
            Value::Map(m) => {
                out.push('{');
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json_string(out, k);
                    out.push(':');
                    v.write_inspect(out);
                }
                out.push('}');
            }
            Value::Date(_) | Value::Time(_) | Value::Opaque(_) => {
                write_json_string(out, &self.to_display_string());
            }
        }
    }
}

fn write_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Equality follows the Liquid coercion rules: numbers compare by value
/// across int/float, dates and times compare against parseable strings, and
/// opaque values use their host-defined equivalence.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        coerce::values_equal(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Value::Map(m)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for v in a {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            // Dates, times, and opaque host objects cross serde boundaries
            // as their canonical string form.
            Value::Date(_) | Value::Time(_) | Value::Opaque(_) => {
                serializer.serialize_str(&self.to_display_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a liquid value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Nil)
            }

            fn visit_none<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Nil)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
                Ok(Value::Bool(b))
            }

            fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
                Ok(Value::Int(i))
            }

            fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
                i64::try_from(u)
                    .map(Value::Int)
                    .or(Ok(Value::Float(u as f64)))
            }

            fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
                Ok(Value::Float(f))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
                Ok(Value::String(s.to_string()))
            }

            fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
                Ok(Value::String(s))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut out = Vec::new();
                while let Some(v) = seq.next_element()? {
                    out.push(v);
                }
                Ok(Value::Array(out))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
                let mut out = ValueMap::new();
                while let Some((k, v)) = map.next_entry::<String, Value>()? {
                    out.insert(k, v);
                }
                Ok(Value::Map(out))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Convenience for building a [`ValueMap`] literal in tests and host code.
#[macro_export]
macro_rules! value_map {
    ($( $key:expr => $val:expr ),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut m = $crate::ValueMap::new();
        $( m.insert($key.to_string(), $crate::Value::from($val)); )*
        m
    }};
}
