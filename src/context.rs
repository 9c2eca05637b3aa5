//! Context module: name resolution for the evaluator.
//!
//! The evaluator only ever asks for the value of a root name; everything
//! after that (dots, brackets) is path resolution over the returned value.
//! The [`Bindings`] trait keeps that seam pluggable so the outer template
//! engine can supply its own resolver.

use crate::value::{Value, ValueMap};

/// Root-name lookup, as consumed by the evaluator.
///
/// Implemented by [`Context`] and by any closure `Fn(&str) -> Option<Value>`,
/// so embedding code can route lookups wherever it likes.
pub trait Bindings {
    /// Resolve a root name. `None` means unbound, which evaluates to `Nil`.
    fn lookup(&self, name: &str) -> Option<Value>;
}

/// A scope chain: the caller's root bindings plus frames pushed by
/// control-flow constructs at the template layer (for-loop variables,
/// captures). Innermost frame wins.
#[derive(Debug, Clone, Default)]
pub struct Context {
    root: ValueMap,
    frames: Vec<ValueMap>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: ValueMap) -> Self {
        Self {
            root,
            frames: Vec::new(),
        }
    }

    /// Bind a name in the root scope.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.root.insert(name.into(), value.into());
    }

    /// Push an inner frame. Names in it shadow outer scopes until [`pop`].
    ///
    /// [`pop`]: Context::pop
    pub fn push(&mut self, frame: ValueMap) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ValueMap> {
        self.frames.pop()
    }
}

impl Bindings for Context {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.get(name))
            .or_else(|| self.root.get(name))
            .cloned()
    }
}

impl<F> Bindings for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn lookup(&self, name: &str) -> Option<Value> {
        self(name)
    }
}
