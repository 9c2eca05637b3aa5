//! Array filters.

use std::cmp::Ordering;

use super::filter;
use crate::coerce;
use crate::filters::{ArgSpec, FilterRegistry};
use crate::value::Value;

pub(super) fn register(reg: &mut FilterRegistry) {
    filter!(reg, "map", (2, 2)[ArgSpec::array(), ArgSpec::string()], args => {
        let Value::Array(items) = &args[0] else { return None };
        let key = args[1].to_display_string();
        let out = items
            .iter()
            .map(|item| match item {
                Value::Map(m) => m.get(key.as_str()).cloned().unwrap_or(Value::Nil),
                _ => Value::Nil,
            })
            .collect();
        Some(Value::Array(out))
    });

    filter!(reg, "compact", (1, 1)[ArgSpec::array()], args => {
        let Value::Array(items) = &args[0] else { return None };
        let out = items
            .iter()
            .filter(|v| !matches!(v, Value::Nil))
            .cloned()
            .collect();
        Some(Value::Array(out))
    });

    // A string input passes through unchanged; everything else joins its
    // stringified elements. The separator defaults to a single space.
    filter!(reg, "join", (1, 2)[ArgSpec::any(), ArgSpec::string()], args => {
        let sep = match args.get(1) {
            Some(Value::String(s)) => s.clone(),
            _ => " ".to_string(),
        };
        match &args[0] {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_display_string).collect();
                Some(Value::String(parts.join(&sep)))
            }
            Value::Map(m) => {
                let parts: Vec<String> = m.values().map(Value::to_display_string).collect();
                Some(Value::String(parts.join(&sep)))
            }
            Value::Nil => Some(Value::String(String::new())),
            other => Some(Value::String(other.to_display_string())),
        }
    });

    // Trailing empty segments are dropped; interior ones survive. An empty
    // separator splits into individual characters.
    filter!(reg, "split", (2, 2)[ArgSpec::string(), ArgSpec::string()], args => {
        let (Value::String(s), Value::String(sep)) = (&args[0], &args[1]) else {
            return None;
        };
        let mut parts: Vec<String> = if sep.is_empty() {
            s.chars().map(String::from).collect()
        } else {
            s.split(sep.as_str()).map(String::from).collect()
        };
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        Some(Value::Array(parts.into_iter().map(Value::String).collect()))
    });

    filter!(reg, "first", (1, 1)[ArgSpec::array()], args => {
        let Value::Array(items) = &args[0] else { return None };
        Some(items.first().cloned().unwrap_or(Value::Nil))
    });

    filter!(reg, "last", (1, 1)[ArgSpec::array()], args => {
        let Value::Array(items) = &args[0] else { return None };
        Some(items.last().cloned().unwrap_or(Value::Nil))
    });

    filter!(reg, "reverse", (1, 1)[ArgSpec::array()], args => {
        let Value::Array(items) = &args[0] else { return None };
        let mut out = items.clone();
        out.reverse();
        Some(Value::Array(out))
    });

    filter!(reg, "sort", (1, 2)[ArgSpec::array(), ArgSpec::string()], args => {
        sort_filter(args, false)
    });

    filter!(reg, "sort_natural", (1, 2)[ArgSpec::array(), ArgSpec::string()], args => {
        sort_filter(args, true)
    });

    filter!(reg, "uniq", (1, 1)[ArgSpec::array()], args => {
        let Value::Array(items) = &args[0] else { return None };
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !out.contains(item) {
                out.push(item.clone());
            }
        }
        Some(Value::Array(out))
    });
}

fn sort_filter(args: &[Value], natural: bool) -> Option<Value> {
    let Value::Array(items) = &args[0] else {
        return None;
    };
    let key = match args.get(1) {
        Some(Value::String(k)) => Some(k.clone()),
        _ => None,
    };
    let mut out = items.clone();
    // Vec::sort_by is stable, so unordered pairs keep their input order.
    out.sort_by(|a, b| {
        let (a, b) = match &key {
            Some(k) => (key_of(a, k), key_of(b, k)),
            None => (a.clone(), b.clone()),
        };
        sort_cmp(&a, &b, natural)
    });
    Some(Value::Array(out))
}

fn key_of(item: &Value, key: &str) -> Value {
    match item {
        Value::Map(m) => m.get(key).cloned().unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}

// Nil sorts before everything; strings optionally compare case-insensitively.
fn sort_cmp(a: &Value, b: &Value, natural: bool) -> Ordering {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ordering::Equal,
        (Value::Nil, _) => Ordering::Less,
        (_, Value::Nil) => Ordering::Greater,
        (Value::String(x), Value::String(y)) if natural => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
        _ => coerce::compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}
