//! Parameter instantiation at method-call sites (spec section 4.1, last
//! paragraph). Every call gets its own fresh parameter table; mutation
//! only ever touches the *receiver's* stored instances, and only when the
//! receiver isn't the module currently being checked (calling a method on
//! your own still-generic `self` must not freeze a parameter for every
//! future caller).

use std::collections::HashMap;

use super::{TypeData, TypeId, Types};

/// The result of resolving a method's signature against a concrete
/// receiver and argument list: the method's declared argument types
/// (excluding `self`) with any generated-trait parameters substituted,
/// plus the resolved return and throw types.
#[derive(Debug, Clone)]
pub struct CallSignature {
    pub expected_args: Vec<TypeId>,
    pub return_type: TypeId,
    pub throws: Option<TypeId>,
}

impl Types {
    /// Resolve `method`'s signature for a call on `receiver` with the
    /// given (already-typed) argument list. `current_module` identifies
    /// the module under active type-checking, so that calls to its own
    /// not-yet-concrete generics don't prematurely bind a parameter.
    pub fn instantiate_call(
        &self,
        receiver: TypeId,
        method: TypeId,
        args: &[TypeId],
        current_module: TypeId,
    ) -> CallSignature {
        let data = self.get(method);
        let Some(block) = data.as_block() else {
            return CallSignature {
                expected_args: Vec::new(),
                return_type: self.dynamic,
                throws: None,
            };
        };

        let mut table: HashMap<String, TypeId> = HashMap::new();
        if let Some(object) = self.get(receiver).as_object_like() {
            table.extend(
                object
                    .type_parameter_instances
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), *v)),
            );
        }

        let declared = block.arguments.symbols();
        let mut expected_args = Vec::new();
        for (position, arg_symbol) in declared.iter().enumerate().skip(1) {
            let given = args.get(position - 1).copied();
            let resolved =
                self.resolve_parameter(arg_symbol.type_id, given, &mut table, receiver, current_module);
            expected_args.push(resolved);
        }

        let return_type = match *block.returns.borrow() {
            Some(r) => self.resolve_in_table(r, &table, receiver),
            None => self.dynamic,
        };
        let throws = block
            .throws
            .borrow()
            .map(|t| self.resolve_in_table(t, &table, receiver));

        if let Some(object) = self.get(receiver).as_object_like() {
            object.type_parameter_instances.borrow_mut().extend(table);
        }

        CallSignature {
            expected_args,
            return_type,
            throws,
        }
    }

    fn generated_trait_name(&self, id: TypeId) -> Option<String> {
        match &*self.get(id) {
            TypeData::Trait(t) if t.generated => Some(t.object.name.clone()),
            _ => None,
        }
    }

    fn resolve_parameter(
        &self,
        expected: TypeId,
        given: Option<TypeId>,
        table: &mut HashMap<String, TypeId>,
        receiver: TypeId,
        current_module: TypeId,
    ) -> TypeId {
        if let Some(name) = self.generated_trait_name(expected) {
            if let Some(bound) = table.get(&name) {
                return *bound;
            }
            if let Some(given) = given {
                if self.is_compatible(given, expected) && receiver != current_module {
                    table.insert(name, given);
                    return given;
                }
            }
            return expected;
        }

        self.resolve_self(expected, receiver)
    }

    fn resolve_in_table(
        &self,
        type_id: TypeId,
        table: &HashMap<String, TypeId>,
        receiver: TypeId,
    ) -> TypeId {
        if let Some(name) = self.generated_trait_name(type_id) {
            if let Some(bound) = table.get(&name) {
                return *bound;
            }
        }
        self.resolve_self(type_id, receiver)
    }
}

#[cfg(test)]
mod tests {
    use crate::types::BlockKind;

    use super::*;

    #[test]
    fn binds_generated_trait_parameter_from_argument() {
        let types = Types::new();
        let module = types.new_object("TestModule", None);
        let receiver = types.new_object("Box", None);
        let item_param = types.new_trait("Item", None, true);

        let method = types.new_block(
            "set",
            BlockKind::Method,
            None,
            Some(types.dynamic),
            None,
            false,
            None,
        );
        if let TypeData::Block(b) = &*types.get(method) {
            b.arguments.insert("self", receiver, false);
            b.arguments.insert("value", item_param, false);
        }

        let integer = types.new_object("Integer", None);
        let sig = types.instantiate_call(receiver, method, &[integer], module);
        assert_eq!(sig.expected_args, vec![integer]);

        // second call without rebinding should reuse the stored instance
        let string_ty = types.new_object("String", None);
        let sig2 = types.instantiate_call(receiver, method, &[string_ty], module);
        assert_eq!(sig2.expected_args, vec![integer]);
    }

    #[test]
    fn self_type_resolves_to_receiver_in_return() {
        let types = Types::new();
        let module = types.new_object("TestModule", None);
        let receiver = types.new_object("Builder", None);

        let method = types.new_block(
            "build",
            BlockKind::Method,
            None,
            Some(types.self_type),
            None,
            false,
            None,
        );
        if let TypeData::Block(b) = &*types.get(method) {
            b.arguments.insert("self", receiver, false);
        }

        let sig = types.instantiate_call(receiver, method, &[], module);
        assert_eq!(sig.return_type, receiver);
    }
}
