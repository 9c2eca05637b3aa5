//! Liquidrust: A modular, embeddable Liquid expression engine.
//!
//! This crate implements the expression core of a Liquid template engine: the
//! dynamic value model, the expression parser, the evaluator, and the filter
//! registry with the standard filter library. The outer template machinery
//! (splitting source text into literal chunks and `{{ }}` / `{% %}`
//! fragments, tags, blocks) lives above this crate and talks to it through
//! [`Engine`] and [`Bindings`].
//!
//! # Architecture
//! - Dynamic value model with Liquid coercion rules ([`Value`])
//! - Expression parsing into an AST ([`parse`], [`Expr`])
//! - Stateless evaluation over pluggable bindings ([`Engine::evaluate`])
//! - Extensible filter registry with declared signatures ([`FilterRegistry`])
//! - The Liquid standard filter library ([`stdlib`])
//!
//! # Example
//! ```
//! use liquidrust::{Context, Engine, Value};
//!
//! let engine = Engine::new();
//! let mut ctx = Context::new();
//! ctx.set("fruits", Value::from(vec!["apples", "oranges", "plums"]));
//!
//! let out = engine.render("fruits | reverse | join: \", \"", &ctx).unwrap();
//! assert_eq!(out, "plums, oranges, apples");
//! ```

mod coerce;
mod context;
mod engine;
mod eval;
mod expr;
mod filters;
pub mod stdlib;
mod value;

pub use coerce::Num;
pub use context::*;
pub use engine::*;
pub use expr::*;
pub use filters::*;
pub use value::*;

use thiserror::Error;

/// Unified error type for liquidrust operations.
///
/// Only structural problems surface as errors: malformed expression source,
/// a filter name the registry does not know, or a filter called with the
/// wrong number of arguments. Anything that could be an author's data
/// mistake (missing bindings, unparseable dates, division by zero) resolves
/// quietly to [`Value::Nil`] or an empty string so templates degrade instead
/// of aborting.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("unknown filter '{name}'")]
    UnknownFilter { name: String },
    #[error("filter '{name}' expects {expected} arguments, got {got}")]
    WrongArity {
        name: String,
        got: usize,
        expected: String,
    },
}
