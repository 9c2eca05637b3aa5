//! The `date` filter: strftime-style formatting of times, dates, parseable
//! strings, and epoch seconds.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};

use super::filter;
use crate::coerce;
use crate::filters::{ArgSpec, FilterRegistry};
use crate::value::Value;

const DEFAULT_FORMAT: &str = "%a, %b %d, %y";

pub(super) fn register(reg: &mut FilterRegistry) {
    // Values that cannot be read as a moment, and format strings with
    // malformed directives, both resolve to the empty string.
    filter!(reg, "date", (1, 2)[ArgSpec::any(), ArgSpec::string()], args => {
        let Some(moment) = as_moment(&args[0]) else {
            return Some(Value::String(String::new()));
        };
        let fmt = match args.get(1) {
            Some(Value::String(f)) => f.as_str(),
            _ => DEFAULT_FORMAT,
        };
        Some(Value::String(format_moment(&moment, fmt)))
    });
}

// Everything formats through a zoned instant so time-of-day and zone
// directives are always answerable: bare dates sit at midnight UTC and
// integers count epoch seconds.
fn as_moment(v: &Value) -> Option<DateTime<FixedOffset>> {
    match v {
        Value::Time(t) => Some(*t),
        Value::Date(d) => Some(d.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset()),
        Value::String(s) => coerce::parse_time(s),
        Value::Int(secs) => DateTime::from_timestamp(*secs, 0).map(|t| t.fixed_offset()),
        _ => None,
    }
}

fn format_moment(moment: &DateTime<FixedOffset>, fmt: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return String::new();
    }
    moment.format_with_items(items.into_iter()).to_string()
}
