// Property tests for the universal filter laws.

use liquidrust::{Engine, Value};
use proptest::prelude::*;

fn engine() -> Engine {
    Engine::new()
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn array() -> impl Strategy<Value = Value> {
    prop::collection::vec(scalar(), 0..8).prop_map(Value::Array)
}

fn apply(engine: &Engine, name: &str, args: Vec<Value>) -> Value {
    engine.filters().apply(name, args).unwrap()
}

proptest! {
    #[test]
    fn default_returns_input_when_non_empty(x in scalar(), d in scalar()) {
        let engine = engine();
        let out = apply(&engine, "default", vec![x.clone(), d.clone()]);
        if x.is_empty() {
            prop_assert_eq!(out, d);
        } else {
            prop_assert_eq!(out, x);
        }
    }

    #[test]
    fn reverse_is_an_involution(arr in array()) {
        let engine = engine();
        let once = apply(&engine, "reverse", vec![arr.clone()]);
        let twice = apply(&engine, "reverse", vec![once]);
        prop_assert_eq!(twice, arr);
    }

    #[test]
    fn uniq_never_grows(arr in array()) {
        let engine = engine();
        let uniq = apply(&engine, "uniq", vec![arr.clone()]);
        let size = |v: &Value| apply(&engine, "size", vec![v.clone()]);
        match (size(&uniq), size(&arr)) {
            (Value::Int(a), Value::Int(b)) => prop_assert!(a <= b),
            _ => prop_assert!(false),
        }
    }

    #[test]
    fn split_join_recovers_modulo_trailing_empties(
        parts in prop::collection::vec("[a-z]{0,4}", 0..6),
    ) {
        let engine = engine();
        let s = parts.join("/");
        let split = apply(&engine, "split", vec![Value::from(s.clone()), Value::from("/")]);
        let joined = apply(&engine, "join", vec![split, Value::from("/")]);
        let expected = s.trim_end_matches('/');
        prop_assert_eq!(joined, Value::from(expected));
    }

    #[test]
    fn sorted_first_is_not_greater_than_last(
        items in prop::collection::vec(any::<i64>(), 1..8),
    ) {
        let engine = engine();
        let arr = Value::Array(items.into_iter().map(Value::Int).collect());
        let sorted = apply(&engine, "sort", vec![arr]);
        let first = apply(&engine, "first", vec![sorted.clone()]);
        let last = apply(&engine, "last", vec![sorted]);
        match (first, last) {
            (Value::Int(a), Value::Int(b)) => prop_assert!(a <= b),
            _ => prop_assert!(false),
        }
    }

    #[test]
    fn plus_then_minus_round_trips(x in -1_000_000i64..1_000_000, y in -1_000_000i64..1_000_000) {
        let engine = engine();
        let sum = apply(&engine, "plus", vec![Value::Int(x), Value::Int(y)]);
        let back = apply(&engine, "minus", vec![sum, Value::Int(y)]);
        prop_assert_eq!(back, Value::Int(x));
    }

    #[test]
    fn inspect_round_trips_through_json(arr in array()) {
        let engine = engine();
        let inspected = apply(&engine, "inspect", vec![arr.clone()]);
        let Value::String(json) = inspected else {
            panic!("inspect must return a string");
        };
        let back: Value = serde_json::from_str(&json).unwrap();
        // Kind survives the trip; nil/number/string/array payloads compare
        // equal under value equality.
        prop_assert_eq!(back.type_name(), arr.type_name());
        prop_assert_eq!(back, arr);
    }
}
