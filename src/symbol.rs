//! Ordered, named bindings with mutability and a parent chain.
//!
//! This mirrors the shape of the teacher's `Scope`/`Frame` pair (see
//! `typechecker::scope::Frame` in the Y compiler) but is a single reusable
//! type: the same `SymbolTable` backs both attribute tables (no parent,
//! name lookup only) and locals tables (parent-chained, insertion order
//! preserved) per the spec.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::TypeId;

/// A single named binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub type_id: TypeId,
    pub mutable: bool,
    pub index: usize,
    pub defined: bool,
}

impl Symbol {
    pub fn new(name: impl ToString, type_id: TypeId, mutable: bool, index: usize) -> Self {
        Symbol {
            name: name.to_string(),
            type_id,
            mutable,
            index,
            defined: true,
        }
    }
}

#[derive(Default)]
struct TableInner {
    order: Vec<String>,
    bindings: HashMap<String, Symbol>,
}

/// An ordered, name-indexed table of symbols, optionally chained to a
/// parent table for lexical lookup (locals) or left unchained for flat
/// name-based lookup (attributes, type parameters, required methods).
///
/// Cloning a `SymbolTable` clones the handle, not the contents -- the
/// same pattern the teacher uses for its `Scope`'s shared method map, so
/// that nested traversal frames can all see mutations made while
/// checking a declaration's body.
#[derive(Clone)]
pub struct SymbolTable {
    inner: Rc<RefCell<TableInner>>,
    parent: Option<Box<SymbolTable>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable {
            inner: Rc::default(),
            parent: None,
        }
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("order", &self.inner.borrow().order)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, empty table chained to `parent` for lookup.
    pub fn child_of(parent: &SymbolTable) -> Self {
        SymbolTable {
            inner: Rc::default(),
            parent: Some(Box::new(parent.clone())),
        }
    }

    /// Insert or overwrite a binding in *this* table (never the parent).
    /// Returns the index assigned to the binding.
    pub fn insert(&self, name: impl ToString, type_id: TypeId, mutable: bool) -> usize {
        let name = name.to_string();
        let mut inner = self.inner.borrow_mut();
        if let Some(existing) = inner.bindings.get(&name) {
            let index = existing.index;
            let symbol = Symbol::new(&name, type_id, mutable, index);
            inner.bindings.insert(name, symbol);
            index
        } else {
            let index = inner.order.len();
            inner.order.push(name.clone());
            inner.bindings.insert(name.clone(), Symbol::new(name, type_id, mutable, index));
            index
        }
    }

    /// Name-based lookup in this table only (no parent chain). Used for
    /// attribute tables, required-method tables and type-parameter tables.
    pub fn get_local(&self, name: &str) -> Option<Symbol> {
        self.inner.borrow().bindings.get(name).cloned()
    }

    /// Lookup walking outward through the parent chain. Used for locals.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.get_local(name) {
            return Some(symbol);
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Like [`lookup`](Self::lookup) but returns `dynamic` instead of
    /// `None` when the name is unresolved, matching the spec's
    /// "absent symbol answers Dynamic" contract without an actual
    /// null-but-responds sentinel object.
    pub fn lookup_or(&self, name: &str, dynamic: TypeId) -> TypeId {
        self.lookup(name).map(|s| s.type_id).unwrap_or(dynamic)
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.inner.borrow().bindings.contains_key(name)
    }

    /// Names in insertion order, this table only.
    pub fn names(&self) -> Vec<String> {
        self.inner.borrow().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bindings, in insertion order, this table only.
    pub fn symbols(&self) -> Vec<Symbol> {
        let inner = self.inner.borrow();
        inner
            .order
            .iter()
            .filter_map(|name| inner.bindings.get(name).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(n: usize) -> TypeId {
        TypeId::from_raw(n)
    }

    #[test]
    fn preserves_insertion_order() {
        let table = SymbolTable::new();
        table.insert("b", ty(1), false);
        table.insert("a", ty(2), false);
        assert_eq!(table.names(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn parent_chain_lookup() {
        let parent = SymbolTable::new();
        parent.insert("x", ty(1), false);
        let child = SymbolTable::child_of(&parent);
        child.insert("y", ty(2), false);

        assert!(child.lookup("x").is_some());
        assert!(child.get_local("x").is_none());
        assert!(parent.lookup("y").is_none());
    }

    #[test]
    fn lookup_or_falls_back_to_dynamic() {
        let table = SymbolTable::new();
        let dynamic = ty(99);
        assert_eq!(table.lookup_or("missing", dynamic), dynamic);
    }

    #[test]
    fn reinsert_keeps_original_index() {
        let table = SymbolTable::new();
        let first = table.insert("x", ty(1), false);
        let second = table.insert("x", ty(2), true);
        assert_eq!(first, second);
        assert_eq!(table.get_local("x").unwrap().type_id, ty(2));
        assert!(table.get_local("x").unwrap().mutable);
    }
}
