//! Declaration forms: `object`, `trait`, `trait_implementation`,
//! `reopen_object`, `method`, `block` (closure), `define_variable`,
//! `reassign_*` (spec section 4.6, "Declarations").

use crate::ast::{
    BlockNode, DefineVariableKind, DefineVariableNode, MethodNode, ObjectNode, ReassignNode,
    ReassignTarget, ReopenObjectNode, TraitImplementationNode, TraitNode,
};
use crate::config::{self, NAME_ATTRIBUTE};
use crate::diagnostics::{type_mismatch, DiagnosticKind};
use crate::scope::TypeScope;
use crate::types::{BlockKind, TypeData, TypeId};

use super::{Checker, ModuleCtx, QueuedMethod};

impl<'a> Checker<'a> {
    /// Register a freshly declared type under the enclosing `self`, and
    /// in the module's globals too when declared at true module scope
    /// (spec section 3, invariant 6).
    fn register_declaration(&self, scope: &TypeScope, mctx: &ModuleCtx, name: &str, ty: TypeId) {
        if let Some(object) = self.db.types.get(scope.self_type).as_object_like() {
            object.attributes.insert(name, ty, false);
        }
        if scope.self_type == mctx.module_type {
            mctx.globals.insert(name, ty, false);
        }
    }

    pub(super) fn check_object(&self, node: &ObjectNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let object_type = self.db.types.new_object(&node.name, Some(self.db.object_type));
        if let TypeData::Object(data) = &*self.db.types.get(object_type) {
            data.0.attributes.insert(NAME_ATTRIBUTE, self.db.string_type, false);
            for param in &node.type_parameters {
                let generated = self.db.types.new_trait(&param.name, None, true);
                if let TypeData::Trait(t) = &*self.db.types.get(generated) {
                    for constraint in &param.constraints {
                        let resolved = self.resolve_type_ref(constraint, scope, mctx);
                        t.required_traits.borrow_mut().push(resolved);
                    }
                }
                data.0.type_parameters.insert(&param.name, generated, false);
            }
        }

        self.register_declaration(scope, mctx, &node.name, object_type);
        node.type_slot.set(object_type);

        let body_scope = TypeScope::for_module(object_type);
        self.check_body(&node.body, &body_scope, mctx);
        object_type
    }

    pub(super) fn check_trait(&self, node: &TraitNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let trait_type = self.db.types.new_trait(&node.name, Some(self.db.trait_type), false);
        if let TypeData::Trait(data) = &*self.db.types.get(trait_type) {
            data.object.attributes.insert(NAME_ATTRIBUTE, self.db.string_type, false);
            for param in &node.type_parameters {
                let generated = self.db.types.new_trait(&param.name, None, true);
                if let TypeData::Trait(t) = &*self.db.types.get(generated) {
                    for constraint in &param.constraints {
                        let resolved = self.resolve_type_ref(constraint, scope, mctx);
                        t.required_traits.borrow_mut().push(resolved);
                    }
                }
                data.object.type_parameters.insert(&param.name, generated, false);
            }
            for required in &node.required_traits {
                let resolved = self.resolve_type_ref(required, scope, mctx);
                data.required_traits.borrow_mut().push(resolved);
            }
        }

        self.register_declaration(scope, mctx, &node.name, trait_type);
        node.type_slot.set(trait_type);

        let body_scope = TypeScope::for_module(trait_type);
        self.check_body(&node.body, &body_scope, mctx);
        trait_type
    }

    pub(super) fn check_trait_implementation(
        &self,
        node: &TraitImplementationNode,
        scope: &TypeScope,
        mctx: &ModuleCtx,
    ) -> TypeId {
        let trait_id = self.resolve_type_ref(&node.trait_ref, scope, mctx);
        let object_id = self.resolve_type_ref(&node.object_ref, scope, mctx);

        if let Some(object) = self.db.types.get(object_id).as_object_like() {
            object.add_implemented_trait(trait_id);
        }

        let body_scope = TypeScope::for_module(object_id);
        self.check_body(&node.body, &body_scope, mctx);

        self.verify_trait_implementation(object_id, trait_id, &node.span);

        node.type_slot.set(object_id);
        object_id
    }

    /// Spec section 4.7: both the required-traits and required-methods
    /// predicates must hold for `object` to retain `trait_id`.
    fn verify_trait_implementation(&self, object_id: TypeId, trait_id: TypeId, span: &crate::ast::Span) {
        let data = self.db.types.get(trait_id);
        let Some(trait_data) = data.as_trait() else {
            return;
        };

        let mut ok = true;
        for required in trait_data.required_traits.borrow().iter() {
            if !self.db.types.is_compatible(object_id, *required) {
                let required_name = self.db.types.get(*required).name().to_string();
                self.diag(
                    DiagnosticKind::UnimplementedTrait {
                        trait_name: trait_data.object.name.clone(),
                        required_trait: required_name,
                    },
                    span.clone(),
                );
                ok = false;
            }
        }
        for method in trait_data.required_methods.symbols() {
            if !self.db.types.implements_method(object_id, &method.name, method.type_id) {
                self.diag(
                    DiagnosticKind::UnimplementedMethod {
                        trait_name: trait_data.object.name.clone(),
                        method_name: method.name.clone(),
                    },
                    span.clone(),
                );
                ok = false;
            }
        }

        if !ok {
            if let Some(object) = self.db.types.get(object_id).as_object_like() {
                object.remove_implemented_trait(trait_id);
            }
        }
    }

    pub(super) fn check_reopen_object(
        &self,
        node: &ReopenObjectNode,
        scope: &TypeScope,
        mctx: &ModuleCtx,
    ) -> TypeId {
        let object_id = self.resolve_type_ref(&node.object_ref, scope, mctx);
        node.type_slot.set(object_id);

        let body_scope = TypeScope::for_module(object_id);
        self.check_body(&node.body, &body_scope, mctx);
        object_id
    }

    pub(super) fn check_method(&self, node: &MethodNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let returns = node.return_type.as_ref().map(|r| self.resolve_type_ref(r, scope, mctx));
        let throws = node.throw_type.as_ref().map(|t| self.resolve_type_ref(t, scope, mctx));
        let infer = node.return_type.is_none();

        let block_id = self.db.new_block(
            &node.name,
            BlockKind::Method,
            returns,
            throws,
            infer,
            node.rest_parameter.clone(),
        );

        if let TypeData::Block(block) = &*self.db.types.get(block_id) {
            block.arguments.insert("self", scope.self_type, false);
            for param in &node.parameters {
                let pty = param
                    .type_annotation
                    .as_ref()
                    .map(|t| self.resolve_type_ref(t, scope, mctx))
                    .unwrap_or(self.db.types.dynamic);
                block.arguments.insert(&param.name, pty, false);
            }
        }

        node.receiver_type.set(scope.self_type);
        node.type_slot.set(block_id);

        if node.required {
            let data = self.db.types.get(scope.self_type);
            match data.as_trait() {
                Some(trait_data) => {
                    trait_data.required_methods.insert(&node.name, block_id, false);
                }
                None => self.diag(
                    DiagnosticKind::DefineRequiredMethodOnNonTrait { name: node.name.clone() },
                    node.span.clone(),
                ),
            }
            return block_id;
        }

        if let Some(object) = self.db.types.get(scope.self_type).as_object_like() {
            object.attributes.insert(&node.name, block_id, false);
        }

        let method_scope = scope.enter_block(block_id, Some(scope.self_type));
        for param in &node.parameters {
            let pty = param
                .type_annotation
                .as_ref()
                .map(|t| self.resolve_type_ref(t, scope, mctx))
                .unwrap_or(self.db.types.dynamic);
            method_scope.locals.insert(&param.name, pty, false);
        }

        self.queue.borrow_mut().push(QueuedMethod {
            body: node.body.clone(),
            scope: method_scope,
            declared_return: returns.unwrap_or(self.db.types.dynamic),
            span: node.span.clone(),
        });

        block_id
    }

    pub(super) fn check_closure(&self, node: &BlockNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let returns = node.return_type.as_ref().map(|r| self.resolve_type_ref(r, scope, mctx));
        let throws = node.throw_type.as_ref().map(|t| self.resolve_type_ref(t, scope, mctx));
        let infer = node.return_type.is_none();

        let block_id = self.db.new_block(
            "closure",
            BlockKind::Closure,
            returns,
            throws,
            infer,
            node.rest_parameter.clone(),
        );

        let closure_scope = scope.enter_block(block_id, None);
        if let TypeData::Block(block) = &*self.db.types.get(block_id) {
            block.arguments.insert("self", scope.self_type, false);
            for param in &node.parameters {
                let pty = match &param.type_annotation {
                    Some(annotation) => self.resolve_type_ref(annotation, scope, mctx),
                    // Unannotated closure arguments get a fresh Constraint,
                    // filled in lazily as the body sends messages to it
                    // (spec section 4.6, `block` declaration rule).
                    None => self.db.types.new_constraint(&param.name),
                };
                block.arguments.insert(&param.name, pty, false);
                closure_scope.locals.insert(&param.name, pty, false);
            }
        }

        node.block_type.set(block_id);

        let body_type = self.check_body(&node.body, &closure_scope, mctx);

        match returns {
            Some(declared) => {
                if !self.db.types.is_compatible(body_type, declared) {
                    self.diag(type_mismatch(&self.db.types, declared, body_type), node.span.clone());
                }
            }
            None => {
                if let TypeData::Block(block) = &*self.db.types.get(block_id) {
                    *block.returns.borrow_mut() = Some(body_type);
                }
            }
        }

        node.type_slot.set(block_id);
        block_id
    }

    pub(super) fn check_define_variable(
        &self,
        node: &DefineVariableNode,
        scope: &TypeScope,
        mctx: &ModuleCtx,
    ) -> TypeId {
        let value_type = self.check_node(&node.value, scope, mctx);

        let mut final_type = value_type;
        if let Some(annotation) = &node.type_annotation {
            let annotated = self.resolve_type_ref(annotation, scope, mctx);
            if !self.db.types.is_compatible(value_type, annotated) {
                self.diag(type_mismatch(&self.db.types, annotated, value_type), node.span.clone());
            }
            final_type = annotated;
        }

        match node.kind {
            DefineVariableKind::Constant => {
                if config::is_reserved_constant(&node.name) {
                    self.diag(
                        DiagnosticKind::RedefineReservedConstant { name: node.name.clone() },
                        node.span.clone(),
                    );
                }
                self.register_declaration(scope, mctx, &node.name, final_type);
            }
            DefineVariableKind::Attribute => {
                let inside_init = scope
                    .block_type
                    .and_then(|bt| self.db.types.get(bt).as_block().map(|b| b.name == config::INIT_METHOD_NAME))
                    .unwrap_or(false);
                if inside_init {
                    if let Some(object) = self.db.types.get(scope.self_type).as_object_like() {
                        object.attributes.insert(&node.name, final_type, node.mutable);
                    }
                } else {
                    self.diag(
                        DiagnosticKind::DefineInstanceAttributeOutsideInit { name: node.name.clone() },
                        node.span.clone(),
                    );
                }
            }
            DefineVariableKind::Local => {
                scope.locals.insert(&node.name, final_type, node.mutable);
            }
        }

        node.type_slot.set(final_type);
        final_type
    }

    pub(super) fn check_reassign(&self, node: &ReassignNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let value_type = self.check_node(&node.value, scope, mctx);

        let result = match &node.target {
            ReassignTarget::Local(name) => match scope.locals.lookup(name) {
                None => {
                    self.diag(
                        DiagnosticKind::ReassignUndefinedLocal { name: name.clone() },
                        node.span.clone(),
                    );
                    self.db.types.dynamic
                }
                Some(symbol) if !symbol.mutable => {
                    self.diag(
                        DiagnosticKind::ReassignImmutableLocal { name: name.clone() },
                        node.span.clone(),
                    );
                    symbol.type_id
                }
                Some(symbol) => {
                    if !self.db.types.is_compatible(value_type, symbol.type_id) {
                        self.diag(type_mismatch(&self.db.types, symbol.type_id, value_type), node.span.clone());
                    }
                    symbol.type_id
                }
            },
            ReassignTarget::Attribute(name) => match self.db.types.lookup_attribute(scope.self_type, name) {
                None => {
                    self.diag(
                        DiagnosticKind::ReassignUndefinedAttribute { name: name.clone() },
                        node.span.clone(),
                    );
                    self.db.types.dynamic
                }
                Some(symbol) if !symbol.mutable => {
                    self.diag(
                        DiagnosticKind::ReassignImmutableAttribute { name: name.clone() },
                        node.span.clone(),
                    );
                    symbol.type_id
                }
                Some(symbol) => {
                    if !self.db.types.is_compatible(value_type, symbol.type_id) {
                        self.diag(type_mismatch(&self.db.types, symbol.type_id, value_type), node.span.clone());
                    }
                    symbol.type_id
                }
            },
        };

        node.type_slot.set(result);
        result
    }
}
