//! Engine module: the public entry point that owns the filter registry and
//! exposes parse/evaluate to the surrounding template machinery.

use crate::context::Bindings;
use crate::eval;
use crate::expr::{self, Expr};
use crate::filters::{FilterFn, FilterRegistry, FilterSignature};
use crate::stdlib;
use crate::value::Value;
use crate::Error;

/// An expression engine: a filter registry plus the operations the outer
/// template renderer needs.
///
/// Build one per application, register any domain filters, then share it
/// across concurrent renders; nothing in it is mutated during evaluation.
pub struct Engine {
    filters: FilterRegistry,
}

impl Engine {
    /// An engine with the standard filter library installed.
    pub fn new() -> Self {
        let mut filters = FilterRegistry::new();
        stdlib::register_stdlib(&mut filters);
        Self { filters }
    }

    /// An engine with no filters at all.
    pub fn empty() -> Self {
        Self {
            filters: FilterRegistry::new(),
        }
    }

    /// Install a filter. Replaces any existing filter of the same name.
    pub fn register_filter<F>(
        &mut self,
        name: impl Into<String>,
        signature: FilterSignature,
        func: F,
    ) where
        F: FilterFn + 'static,
    {
        self.filters.register(name, signature, func);
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Parse an expression (or filter chain) source.
    pub fn parse(&self, source: &str) -> Result<Expr, Error> {
        expr::parse(source)
    }

    /// Evaluate a parsed expression over a binding context.
    pub fn evaluate(&self, expr: &Expr, bindings: &dyn Bindings) -> Result<Value, Error> {
        eval::eval(expr, bindings, &self.filters)
    }

    /// Parse and evaluate in one step.
    pub fn evaluate_str(&self, source: &str, bindings: &dyn Bindings) -> Result<Value, Error> {
        let expr = self.parse(source)?;
        self.evaluate(&expr, bindings)
    }

    /// Evaluate and render the result the way the template layer writes an
    /// object expression into output.
    pub fn render(&self, source: &str, bindings: &dyn Bindings) -> Result<String, Error> {
        Ok(self.evaluate_str(source, bindings)?.to_display_string())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
