//! `throw`/`try` (spec section 4.6, "Control-flow expressions").

use crate::ast::{ThrowNode, TryNode};
use crate::config;
use crate::diagnostics::type_mismatch;
use crate::scope::TypeScope;
use crate::types::{BlockKind, TypeData};

use super::{Checker, ModuleCtx};

impl<'a> Checker<'a> {
    /// A `throw` is typed as `Void`; if the enclosing block has no
    /// declared throw type yet, the thrown value's type back-fills it,
    /// mirroring the same inference the closure return type gets.
    pub(super) fn check_throw(&self, node: &ThrowNode, scope: &TypeScope, mctx: &ModuleCtx) -> crate::types::TypeId {
        let value_type = self.check_node(&node.value, scope, mctx);

        if let Some(block_id) = scope.block_type {
            if let TypeData::Block(block) = &*self.db.types.get(block_id) {
                if block.kind == BlockKind::Closure && block.throws.borrow().is_none() {
                    *block.throws.borrow_mut() = Some(value_type);
                }
            }
        }

        node.type_slot.set(self.db.void_type);
        self.db.void_type
    }

    /// `try`/`else`: two synthesized block types sharing the enclosing
    /// `self`, each given a unique name so repeated `try` expressions in
    /// the same body don't collide in diagnostics (spec section 4.6).
    pub(super) fn check_try(&self, node: &TryNode, scope: &TypeScope, mctx: &ModuleCtx) -> crate::types::TypeId {
        let id = self.next_try_id();

        let try_block = self.db.new_block(
            format!("{}_{id}", config::TRY_BLOCK_BASE_NAME),
            BlockKind::TryBlock,
            None,
            None,
            true,
            None,
        );
        if let TypeData::Block(block) = &*self.db.types.get(try_block) {
            block.arguments.insert("self", scope.self_type, false);
        }
        let try_scope = scope.enter_block(try_block, None);
        let try_type = self.check_body(&node.try_body, &try_scope, mctx);
        if let TypeData::Block(block) = &*self.db.types.get(try_block) {
            *block.returns.borrow_mut() = Some(try_type);
        }
        node.try_block_type.set(try_block);

        let thrown_type = match &*self.db.types.get(try_block) {
            TypeData::Block(block) => block.throws.borrow().unwrap_or(self.db.types.dynamic),
            _ => self.db.types.dynamic,
        };

        let else_block = self.db.new_block(
            format!("{}_{id}", config::ELSE_BLOCK_BASE_NAME),
            BlockKind::ElseBlock,
            None,
            None,
            true,
            None,
        );
        if let TypeData::Block(block) = &*self.db.types.get(else_block) {
            block.arguments.insert("self", scope.self_type, false);
        }
        let else_scope = scope.enter_block(else_block, None);
        if let Some(param) = &node.else_parameter {
            else_scope.locals.insert(param, thrown_type, false);
        }
        let else_type = self.check_body(&node.else_body, &else_scope, mctx);
        if let TypeData::Block(block) = &*self.db.types.get(else_block) {
            *block.returns.borrow_mut() = Some(else_type);
        }
        node.else_block_type.set(else_block);

        let result = if try_type == self.db.void_type {
            else_type
        } else if else_type == self.db.void_type {
            try_type
        } else if self.db.types.is_compatible(else_type, try_type) {
            try_type
        } else {
            self.diag(type_mismatch(&self.db.types, try_type, else_type), node.span.clone());
            try_type
        };

        node.type_slot.set(result);
        result
    }
}
