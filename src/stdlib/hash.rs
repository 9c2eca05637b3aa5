//! Digest and HMAC filters.
//!
//! Input and key are hashed as the UTF-8 bytes of their canonical string
//! form. An empty message (or key) yields the empty string, not the digest
//! of nothing; boolean keys also yield the empty string. Both rules come
//! from the host application's test suite and are kept as-is.

use std::fmt::Write as _;

use hmac::{digest::KeyInit, Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;

use super::filter;
use crate::filters::{ArgSpec, FilterRegistry};
use crate::value::Value;

pub(super) fn register(reg: &mut FilterRegistry) {
    filter!(reg, "md5", (1, 1)[ArgSpec::string()], args => {
        digest_filter::<Md5>(&args[0])
    });

    filter!(reg, "sha1", (1, 1)[ArgSpec::string()], args => {
        digest_filter::<Sha1>(&args[0])
    });

    filter!(reg, "sha256", (1, 1)[ArgSpec::string()], args => {
        digest_filter::<Sha256>(&args[0])
    });

    filter!(reg, "hmac", (2, 2)[ArgSpec::string(), ArgSpec::any().nil_ok()], args => {
        hmac_filter::<Hmac<Md5>>(&args[0], &args[1])
    });

    filter!(reg, "hmac_sha1", (2, 2)[ArgSpec::string(), ArgSpec::any().nil_ok()], args => {
        hmac_filter::<Hmac<Sha1>>(&args[0], &args[1])
    });

    filter!(reg, "hmac_sha256", (2, 2)[ArgSpec::string(), ArgSpec::any().nil_ok()], args => {
        hmac_filter::<Hmac<Sha256>>(&args[0], &args[1])
    });
}

fn digest_filter<D: Digest>(input: &Value) -> Option<Value> {
    let Value::String(s) = input else { return None };
    if s.is_empty() {
        return Some(Value::String(String::new()));
    }
    let mut hasher = D::new();
    hasher.update(s.as_bytes());
    Some(Value::String(hex(&hasher.finalize())))
}

fn hmac_filter<M: Mac + KeyInit>(input: &Value, key: &Value) -> Option<Value> {
    let Value::String(message) = input else { return None };
    // Keys stringify canonically; anything that is not a string or number
    // degrades to the empty key.
    let key = match key {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        _ => String::new(),
    };
    if message.is_empty() || key.is_empty() {
        return Some(Value::String(String::new()));
    }
    let mut mac = <M as KeyInit>::new_from_slice(key.as_bytes()).ok()?;
    mac.update(message.as_bytes());
    Some(Value::String(hex(&mac.finalize().into_bytes())))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
