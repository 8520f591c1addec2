//! The eight-step message-send algorithm (spec section 4.6, "Sends").

use crate::ast::SendNode;
use crate::diagnostics::{type_mismatch, DiagnosticKind};
use crate::scope::TypeScope;
use crate::types::{BlockKind, TypeData};

use super::{Checker, ModuleCtx};

impl<'a> Checker<'a> {
    pub(super) fn check_send(&self, node: &SendNode, scope: &TypeScope, mctx: &ModuleCtx) -> crate::types::TypeId {
        // Step 1: determine the receiver type.
        let receiver_type = match &node.receiver {
            Some(receiver_expr) => self.check_node(receiver_expr, scope, mctx),
            None => {
                if self.db.types.lookup_method(scope.self_type, &node.name).is_some() {
                    scope.self_type
                } else if scope.self_type != mctx.module_type
                    && self.db.types.lookup_method(mctx.module_type, &node.name).is_some()
                {
                    mctx.module_type
                } else {
                    scope.self_type
                }
            }
        };
        node.receiver_type.set(receiver_type);

        // Step 2: type all arguments first, left to right.
        let arg_types: Vec<(Option<String>, crate::types::TypeId)> = node
            .arguments
            .iter()
            .map(|argument| (argument.keyword.clone(), self.check_node(&argument.value, scope, mctx)))
            .collect();

        if self.db.types.is_dynamic(receiver_type) {
            node.type_slot.set(receiver_type);
            return receiver_type;
        }

        // Step 3: an unresolved parameter constraint synthesizes a
        // required method from the call site instead of failing lookup.
        if matches!(&*self.db.types.get(receiver_type), TypeData::Constraint(_)) {
            let synthesized_return = self.db.types.dynamic;
            let synthesized = self.db.new_block(
                &node.name,
                BlockKind::Method,
                Some(synthesized_return),
                None,
                false,
                None,
            );
            if let TypeData::Block(block) = &*self.db.types.get(synthesized) {
                block.arguments.insert("self", receiver_type, false);
                for (index, (_, ty)) in arg_types.iter().enumerate() {
                    block.arguments.insert(format!("arg{index}"), *ty, false);
                }
            }
            if let TypeData::Constraint(constraint) = &*self.db.types.get(receiver_type) {
                constraint.required_methods.insert(&node.name, synthesized, false);
            }
            node.type_slot.set(synthesized_return);
            return synthesized_return;
        }

        // Step 4: look up the method.
        let Some(symbol) = self.db.types.lookup_method(receiver_type, &node.name) else {
            self.diag(DiagnosticKind::UndefinedMethod { name: node.name.clone() }, node.span.clone());
            node.type_slot.set(self.db.types.dynamic);
            return self.db.types.dynamic;
        };

        let method_data = self.db.types.get(symbol.type_id);
        let Some(block) = method_data.as_block() else {
            self.diag(DiagnosticKind::UndefinedMethod { name: node.name.clone() }, node.span.clone());
            node.type_slot.set(symbol.type_id);
            return symbol.type_id;
        };

        // Step 5: every keyword argument must match a declared name.
        let declared = block.arguments.symbols();
        for (keyword, _) in &arg_types {
            if let Some(keyword) = keyword {
                if !declared.iter().any(|d| &d.name == keyword) {
                    self.diag(
                        DiagnosticKind::UndefinedKeywordArgument { name: keyword.clone() },
                        node.span.clone(),
                    );
                }
            }
        }

        // Step 6: arity, accounting for a trailing rest argument.
        let required = declared.len().saturating_sub(1);
        let given = arg_types.len();
        let has_rest = block.rest_argument.is_some();
        let arity_ok = if has_rest { given >= required.saturating_sub(1) } else { given == required };
        if !arity_ok {
            self.diag(
                DiagnosticKind::ArgumentCountMismatch {
                    expected_min: required,
                    expected_max: if has_rest { None } else { Some(required) },
                    given,
                },
                node.span.clone(),
            );
        }

        // Step 7: align each argument to its declared slot (by keyword
        // name, else positionally), then resolve generated-trait
        // inference and generic/self substitution through instantiation.
        let mut ordered: Vec<Option<crate::types::TypeId>> = vec![None; required];
        let mut positional_index = 0;
        for (keyword, ty) in &arg_types {
            match keyword {
                None => {
                    if positional_index < ordered.len() {
                        ordered[positional_index] = Some(*ty);
                    }
                    positional_index += 1;
                }
                Some(name) => {
                    if let Some(position) = declared.iter().skip(1).position(|d| &d.name == name) {
                        ordered[position] = Some(*ty);
                    }
                }
            }
        }
        let args_for_instantiation: Vec<crate::types::TypeId> =
            ordered.iter().map(|given| given.unwrap_or(self.db.types.dynamic)).collect();

        let signature =
            self.db
                .types
                .instantiate_call(receiver_type, symbol.type_id, &args_for_instantiation, mctx.module_type);

        for (index, expected) in signature.expected_args.iter().enumerate() {
            if let Some(given_ty) = ordered.get(index).copied().flatten() {
                if !self.db.types.is_compatible(given_ty, *expected) {
                    self.diag(type_mismatch(&self.db.types, *expected, given_ty), node.span.clone());
                }
            }
        }

        // Step 8: the call expression's type is the instantiated return.
        node.type_slot.set(signature.return_type);
        signature.return_type
    }
}
