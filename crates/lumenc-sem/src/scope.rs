//! The type checker's scope stack.
//!
//! Scopes are pushed on entry to a block, function body, or loop body and
//! popped on exit; lookups walk from the innermost scope outward so that
//! nested declarations shadow outer ones.

use indexmap::IndexMap;
use lumenc_util::{Symbol, ValueType};

pub struct ScopeStack {
    scopes: Vec<IndexMap<Symbol, ValueType>>,
}

impl ScopeStack {
    /// A fresh stack holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![IndexMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// The type bound to `name` in the nearest enclosing scope, if any.
    pub fn lookup(&self, name: Symbol) -> Option<ValueType> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name).copied())
    }

    /// Binds `name` to `ty` in the current (innermost) scope.
    pub fn declare(&mut self, name: Symbol, ty: ValueType) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, ty);
    }

    /// Overwrites the binding of `name` wherever it currently lives,
    /// upgrading an `Unknown` declaration to a concrete type when the
    /// `Assign` rule resolves it.
    pub fn upgrade(&mut self, name: Symbol, ty: ValueType) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(&name) {
                *slot = ty;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenc_util::Interner;

    #[test]
    fn lookup_finds_the_innermost_binding() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.declare(x, ValueType::I32);
        scopes.push();
        scopes.declare(x, ValueType::Bool);
        assert_eq!(scopes.lookup(x), Some(ValueType::Bool));
        scopes.pop();
        assert_eq!(scopes.lookup(x), Some(ValueType::I32));
    }

    #[test]
    fn lookup_falls_through_to_outer_scope_when_not_shadowed() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.declare(x, ValueType::I64);
        scopes.push();
        assert_eq!(scopes.lookup(x), Some(ValueType::I64));
    }

    #[test]
    fn upgrade_rewrites_the_binding_in_place() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.declare(x, ValueType::Unknown);
        scopes.upgrade(x, ValueType::F64);
        assert_eq!(scopes.lookup(x), Some(ValueType::F64));
    }
}
