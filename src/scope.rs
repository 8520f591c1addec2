//! Per-frame type-checking context (spec section 4.5).
//!
//! Grounded in the teacher's `Context { scope: Scope }` wrapper: a small,
//! cheaply clonable value threaded down through every recursive call of
//! the walker rather than a mutable field on some larger checker struct.
//! Each frame is immutable once built -- entering a block creates a new
//! child frame rather than mutating the caller's.

use crate::symbol::SymbolTable;
use crate::types::TypeId;

/// The three pieces of context every expression needs to resolve a name
/// or a bare type reference: what `self` is, what block (if any) enclosing
/// `return`/`throw` target, and the locals visible at this point.
#[derive(Clone, Debug)]
pub struct TypeScope {
    pub self_type: TypeId,
    pub block_type: Option<TypeId>,
    pub locals: SymbolTable,
}

impl TypeScope {
    /// The scope a module body is checked under: `self` is the module's
    /// own type, there is no enclosing block, and locals starts empty.
    pub fn for_module(module_type: TypeId) -> Self {
        TypeScope {
            self_type: module_type,
            block_type: None,
            locals: SymbolTable::new(),
        }
    }

    /// Enter a nested block (closure, method, try, or else): `self_type`
    /// is inherited unless the block rebinds it (methods always keep the
    /// receiver's `self_type`; closures capture the enclosing one too),
    /// locals start in a fresh table chained to the enclosing scope's.
    pub fn enter_block(&self, block_type: TypeId, self_type: Option<TypeId>) -> Self {
        TypeScope {
            self_type: self_type.unwrap_or(self.self_type),
            block_type: Some(block_type),
            locals: SymbolTable::child_of(&self.locals),
        }
    }

    /// True while checking the body of some block (closure, method, try,
    /// or else) rather than directly at module top level.
    pub fn in_block(&self) -> bool {
        self.block_type.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_scope_has_no_enclosing_block() {
        let module_type = TypeId::from_raw(0);
        let scope = TypeScope::for_module(module_type);
        assert_eq!(scope.self_type, module_type);
        assert!(!scope.in_block());
        assert!(scope.locals.is_empty());
    }

    #[test]
    fn entering_a_block_chains_locals_and_keeps_self_by_default() {
        let module_type = TypeId::from_raw(0);
        let block_type = TypeId::from_raw(1);
        let module_scope = TypeScope::for_module(module_type);
        module_scope.locals.insert("x", TypeId::from_raw(2), false);

        let block_scope = module_scope.enter_block(block_type, None);
        assert!(block_scope.in_block());
        assert_eq!(block_scope.self_type, module_type);
        assert!(block_scope.locals.lookup("x").is_some());
        assert!(block_scope.locals.get_local("x").is_none());
    }

    #[test]
    fn method_block_can_rebind_self_type() {
        let module_type = TypeId::from_raw(0);
        let receiver = TypeId::from_raw(3);
        let block_type = TypeId::from_raw(1);
        let module_scope = TypeScope::for_module(module_type);

        let method_scope = module_scope.enter_block(block_type, Some(receiver));
        assert_eq!(method_scope.self_type, receiver);
    }
}
