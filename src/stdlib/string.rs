//! String filters.

use std::sync::OnceLock;

use regex::Regex;

use super::filter;
use crate::filters::{ArgSpec, FilterRegistry};
use crate::value::Value;

pub(super) fn register(reg: &mut FilterRegistry) {
    filter!(reg, "replace", (3, 3)[ArgSpec::string(), ArgSpec::string(), ArgSpec::string()], args => {
        let (s, find, with) = three_strings(args)?;
        Some(Value::String(s.replace(find, with)))
    });

    filter!(reg, "replace_first", (3, 3)[ArgSpec::string(), ArgSpec::string(), ArgSpec::string()], args => {
        let (s, find, with) = three_strings(args)?;
        Some(Value::String(s.replacen(find, with, 1)))
    });

    filter!(reg, "remove", (2, 2)[ArgSpec::string(), ArgSpec::string()], args => {
        let (s, what) = two_strings(args)?;
        Some(Value::String(s.replace(what, "")))
    });

    filter!(reg, "remove_first", (2, 2)[ArgSpec::string(), ArgSpec::string()], args => {
        let (s, what) = two_strings(args)?;
        Some(Value::String(s.replacen(what, "", 1)))
    });

    filter!(reg, "append", (2, 2)[ArgSpec::string(), ArgSpec::string()], args => {
        let (s, suffix) = two_strings(args)?;
        Some(Value::String(format!("{s}{suffix}")))
    });

    filter!(reg, "prepend", (2, 2)[ArgSpec::string(), ArgSpec::string()], args => {
        let (s, prefix) = two_strings(args)?;
        Some(Value::String(format!("{prefix}{s}")))
    });

    filter!(reg, "capitalize", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        let mut chars = s.chars();
        let out = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Some(Value::String(out))
    });

    filter!(reg, "downcase", (1, 1)[ArgSpec::string()], args => {
        Some(Value::String(one_string(args)?.to_lowercase()))
    });

    filter!(reg, "upcase", (1, 1)[ArgSpec::string()], args => {
        Some(Value::String(one_string(args)?.to_uppercase()))
    });

    filter!(reg, "escape", (1, 1)[ArgSpec::string()], args => {
        Some(Value::String(escape_html(one_string(args)?)))
    });

    // Re-escapes a string without double-escaping existing entity
    // references. Recognized entities: named (`&amp;`-shaped), decimal
    // (`&#39;`) and hex (`&#x27;`) numeric references.
    filter!(reg, "escape_once", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(i) = rest.find(['&', '<', '>', '"', '\'']) {
            out.push_str(&rest[..i]);
            let c = rest[i..].chars().next().unwrap();
            if c == '&' {
                if let Some(len) = entity_len(&rest[i..]) {
                    out.push_str(&rest[i..i + len]);
                    rest = &rest[i + len..];
                    continue;
                }
            }
            out.push_str(escape_char(c));
            rest = &rest[i + c.len_utf8()..];
        }
        out.push_str(rest);
        Some(Value::String(out))
    });

    filter!(reg, "strip", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        Some(Value::String(s.trim_matches(|c: char| c.is_ascii_whitespace()).to_string()))
    });

    filter!(reg, "lstrip", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        Some(Value::String(s.trim_start_matches(|c: char| c.is_ascii_whitespace()).to_string()))
    });

    filter!(reg, "rstrip", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        Some(Value::String(s.trim_end_matches(|c: char| c.is_ascii_whitespace()).to_string()))
    });

    filter!(reg, "strip_html", (1, 1)[ArgSpec::string()], args => {
        static TAGS: OnceLock<Regex> = OnceLock::new();
        let re = TAGS.get_or_init(|| {
            Regex::new(r"(?is)<script.*?</script>|<style.*?</style>|<!--.*?-->|<[^>]*>")
                .unwrap()
        });
        Some(Value::String(re.replace_all(one_string(args)?, "").into_owned()))
    });

    filter!(reg, "strip_newlines", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        Some(Value::String(s.chars().filter(|c| *c != '\n' && *c != '\r').collect()))
    });

    filter!(reg, "newline_to_br", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        Some(Value::String(s.replace("\r\n", "\n").replace('\n', "<br />\n")))
    });

    // Codepoint-indexed substring; also slices arrays element-wise.
    filter!(reg, "slice", (2, 3)[ArgSpec::any(), ArgSpec::number(), ArgSpec::number()], args => {
        let start = int_arg(&args[1])?;
        let len = match args.get(2) {
            Some(v) => int_arg(v)?,
            None => 1,
        };
        match &args[0] {
            Value::Array(items) => Some(Value::Array(slice_seq(items, start, len))),
            other => {
                let chars: Vec<char> = other.to_display_string().chars().collect();
                Some(Value::String(slice_seq(&chars, start, len).into_iter().collect()))
            }
        }
    });

    filter!(reg, "truncate", (2, 3)[ArgSpec::string(), ArgSpec::number(), ArgSpec::string()], args => {
        let s = one_string(args)?;
        let n = usize_arg(&args[1])?;
        let ellipsis = opt_string(args.get(2), "...");
        if s.chars().count() <= n {
            return Some(Value::String(s.to_string()));
        }
        let keep = n.saturating_sub(ellipsis.chars().count());
        let mut out: String = s.chars().take(keep).collect();
        out.push_str(&ellipsis);
        Some(Value::String(out))
    });

    // When no truncation happens, the input comes back byte-identical,
    // leading whitespace included.
    filter!(reg, "truncatewords", (2, 3)[ArgSpec::string(), ArgSpec::number(), ArgSpec::string()], args => {
        let s = one_string(args)?;
        let n = usize_arg(&args[1])?.max(1);
        let ellipsis = opt_string(args.get(2), "...");
        let words: Vec<&str> = s.split_whitespace().collect();
        if words.len() <= n {
            return Some(Value::String(s.to_string()));
        }
        let mut out = words[..n].join(" ");
        out.push_str(&ellipsis);
        Some(Value::String(out))
    });

    // Form encoding: space becomes '+', unreserved bytes pass through,
    // everything else is percent-escaped.
    filter!(reg, "url_encode", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        let mut out = String::with_capacity(s.len());
        for b in s.bytes() {
            match b {
                b' ' => out.push('+'),
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                    out.push(b as char)
                }
                _ => out.push_str(&format!("%{b:02X}")),
            }
        }
        Some(Value::String(out))
    });

    filter!(reg, "url_decode", (1, 1)[ArgSpec::string()], args => {
        let s = one_string(args)?;
        let bytes = s.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'+' => {
                    out.push(b' ');
                    i += 1;
                }
                b'%' => match hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                },
                b => {
                    out.push(b);
                    i += 1;
                }
            }
        }
        Some(Value::String(String::from_utf8_lossy(&out).into_owned()))
    });
}

fn one_string(args: &[Value]) -> Option<&str> {
    match &args[0] {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn two_strings(args: &[Value]) -> Option<(&str, &str)> {
    match (&args[0], &args[1]) {
        (Value::String(a), Value::String(b)) => Some((a, b)),
        _ => None,
    }
}

fn three_strings(args: &[Value]) -> Option<(&str, &str, &str)> {
    match (&args[0], &args[1], &args[2]) {
        (Value::String(a), Value::String(b), Value::String(c)) => Some((a, b, c)),
        _ => None,
    }
}

fn opt_string(arg: Option<&Value>, default: &str) -> String {
    match arg {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

fn int_arg(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Float(f) => Some(f.trunc() as i64),
        _ => None,
    }
}

fn usize_arg(v: &Value) -> Option<usize> {
    int_arg(v).map(|i| i.max(0) as usize)
}

fn hex_pair(a: Option<u8>, b: Option<u8>) -> Option<u8> {
    let hi = (a? as char).to_digit(16)?;
    let lo = (b? as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

// Shared by the string and array forms of `slice`: negative start counts
// from the end, out-of-range yields the empty sequence.
fn slice_seq<T: Clone>(items: &[T], start: i64, len: i64) -> Vec<T> {
    let total = items.len() as i64;
    let start = if start < 0 { start + total } else { start };
    if start < 0 || start > total || len <= 0 {
        return Vec::new();
    }
    let end = (start + len).min(total);
    items[start as usize..end as usize].to_vec()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' | '<' | '>' | '"' | '\'' => out.push_str(escape_char(c)),
            c => out.push(c),
        }
    }
    out
}

fn escape_char(c: char) -> &'static str {
    match c {
        '&' => "&amp;",
        '<' => "&lt;",
        '>' => "&gt;",
        '"' => "&quot;",
        '\'' => "&#39;",
        _ => unreachable!(),
    }
}

// Length of a valid entity reference at the start of `s` (which begins with
// '&'), or None when the ampersand is bare.
fn entity_len(s: &str) -> Option<usize> {
    let semi = s.find(';')?;
    let body = &s[1..semi];
    let valid = if let Some(num) = body.strip_prefix('#') {
        if let Some(hex) = num.strip_prefix(['x', 'X']) {
            !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit())
        } else {
            !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit())
        }
    } else {
        !body.is_empty()
            && body.bytes().next().is_some_and(|b| b.is_ascii_alphabetic())
            && body.bytes().all(|b| b.is_ascii_alphanumeric())
    };
    valid.then_some(semi + 1)
}
