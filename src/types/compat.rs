//! Structural compatibility, attribute/method lookup.
//!
//! Grounded on the spec's section 4.1; the shape of "walk the attribute
//! table, then fall back to the prototype chain" mirrors the teacher's
//! `Scope::resolve_property_for_type` (struct fields first, associated
//! methods after).

use crate::symbol::Symbol;

use super::{BlockData, TraitData, TypeData, TypeId, Types};

impl Types {
    /// `a compatible-with b`: can a value of type `a` be used wherever a
    /// `b` is expected?
    pub fn is_compatible(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if self.is_dynamic(a) || self.is_dynamic(b) {
            return true;
        }

        let a_data = self.get(a);
        let b_data = self.get(b);

        match (&*a_data, &*b_data) {
            (_, TypeData::Optional(inner)) => {
                self.is_compatible(a, *inner) || Some(a) == self.nil()
            }
            (TypeData::Optional(_), _) => false,
            (TypeData::Object(_), _) | (TypeData::Trait(_), _) => self.object_compatible(a, b),
            (TypeData::Block(given), TypeData::Block(expected)) => {
                self.blocks_compatible(expected, given)
            }
            (TypeData::Constraint(_), _) => false,
            _ => false,
        }
    }

    /// `Object A` compatible with `Object/Trait B` iff `B` is reachable
    /// via `A`'s prototype chain, `B` is a trait `A` implements, or `A`
    /// recursively satisfies every required trait and method of `B`.
    fn object_compatible(&self, a: TypeId, b: TypeId) -> bool {
        if self.prototype_chain(a).contains(&b) {
            return true;
        }

        let a_data = self.get(a);
        let Some(a_object) = a_data.as_object_like() else {
            return false;
        };

        if a_object.implements(b) {
            return true;
        }

        let b_data = self.get(b);
        if let Some(b_trait) = b_data.as_trait() {
            return self.implements_trait(a, b_trait);
        }

        false
    }

    fn blocks_compatible(&self, expected: &BlockData, given: &BlockData) -> bool {
        let expected_args = expected.arguments.symbols();
        let given_args = given.arguments.symbols();

        if expected.rest_argument.is_none() && given.rest_argument.is_none() {
            if expected_args.len() != given_args.len() {
                return false;
            }
        } else if given_args.len() < expected_args.len() {
            return false;
        }

        for (expected_arg, given_arg) in expected_args.iter().zip(given_args.iter()) {
            // Contravariant: the callee's expected argument type must
            // accept whatever the caller supplies.
            if !self.is_compatible(given_arg.type_id, expected_arg.type_id) {
                return false;
            }
        }

        let returns_ok = match (*expected.returns.borrow(), *given.returns.borrow()) {
            (Some(e), Some(g)) => self.is_compatible(g, e),
            (None, None) => true,
            _ => false,
        };
        if !returns_ok {
            return false;
        }

        match (*expected.throws.borrow(), *given.throws.borrow()) {
            (Some(e), Some(g)) => self.is_compatible(g, e),
            (None, None) => true,
            _ => false,
        }
    }

    /// A type implements a trait iff every required trait is implemented
    /// and every required method is present, per section 4.7.
    pub fn implements_trait(&self, candidate: TypeId, trait_data: &TraitData) -> bool {
        for required in trait_data.required_traits.borrow().iter() {
            if !self.object_implements_trait_id(candidate, *required) {
                return false;
            }
        }

        for method in trait_data.required_methods.symbols() {
            if !self.implements_method(candidate, &method.name, method.type_id) {
                return false;
            }
        }

        true
    }

    fn object_implements_trait_id(&self, candidate: TypeId, trait_id: TypeId) -> bool {
        let data = self.get(trait_id);
        match &*data {
            TypeData::Trait(t) => {
                self.get(candidate)
                    .as_object_like()
                    .is_some_and(|o| o.implements(trait_id))
                    || self.implements_trait(candidate, t)
            }
            _ => self.object_compatible(candidate, trait_id),
        }
    }

    pub fn implements_method(&self, candidate: TypeId, name: &str, required: TypeId) -> bool {
        match self.lookup_method(candidate, name) {
            Some(found) => self.is_compatible(found.type_id, required),
            None => false,
        }
    }

    /// Look up an attribute by name: the attribute table first, then the
    /// prototype chain (first match wins).
    pub fn lookup_attribute(&self, receiver: TypeId, name: &str) -> Option<Symbol> {
        for id in self.prototype_chain(receiver) {
            let data = self.get(id);
            if let Some(object) = data.as_object_like() {
                if let Some(symbol) = object.attributes.get_local(name) {
                    return Some(symbol);
                }
            }
        }
        None
    }

    /// Method lookup: attribute table, prototype chain, and -- on a trait
    /// -- its required methods too.
    pub fn lookup_method(&self, receiver: TypeId, name: &str) -> Option<Symbol> {
        for id in self.prototype_chain(receiver) {
            let data = self.get(id);
            if let Some(object) = data.as_object_like() {
                if let Some(symbol) = object.attributes.get_local(name) {
                    return Some(symbol);
                }
            }
            if let TypeData::Trait(t) = &*data {
                if let Some(symbol) = t.required_methods.get_local(name) {
                    return Some(symbol);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::types::BlockKind;

    use super::*;

    #[test]
    fn reflexive_and_dynamic() {
        let types = Types::new();
        let obj = types.new_object("Foo", None);
        assert!(types.is_compatible(obj, obj));
        assert!(types.is_compatible(obj, types.dynamic));
        assert!(types.is_compatible(types.dynamic, obj));
    }

    #[test]
    fn prototype_chain_compatibility() {
        let types = Types::new();
        let base = types.new_object("Base", None);
        let derived = types.new_object("Derived", Some(base));
        assert!(types.is_compatible(derived, base));
        assert!(!types.is_compatible(base, derived));
    }

    #[test]
    fn optional_accepts_inner_and_nil() {
        let types = Types::new();
        let integer = types.new_object("Integer", None);
        let nil = types.new_object("Nil", None);
        types.set_nil(nil);
        let optional_int = types.new_optional(integer);

        assert!(types.is_compatible(integer, optional_int));
        assert!(types.is_compatible(nil, optional_int));
    }

    #[test]
    fn trait_implementation_compatibility() {
        let types = Types::new();
        let eq_trait = types.new_trait("Eq", None, false);
        let block_base = types.new_block("Block", BlockKind::Method, None, None, None, false, None);
        let eq_method = types.new_block(
            "eq?",
            BlockKind::Method,
            Some(block_base),
            Some(types.dynamic),
            None,
            false,
            None,
        );

        if let TypeData::Trait(t) = &*types.get(eq_trait) {
            t.required_methods.insert("eq?", eq_method, false);
        }

        let point = types.new_object("Point", None);
        assert!(!types.is_compatible(point, eq_trait));

        if let TypeData::Object(o) = &*types.get(point) {
            o.0.attributes.insert("eq?", eq_method, false);
            o.0.add_implemented_trait(eq_trait);
        }

        assert!(types.is_compatible(point, eq_trait));
    }

    #[test]
    fn block_compatibility_is_contravariant_in_args_covariant_in_return() {
        let types = Types::new();
        let animal = types.new_object("Animal", None);
        let dog = types.new_object("Dog", Some(animal));

        let expected = types.new_block("expected", BlockKind::Closure, None, Some(animal), None, false, None);
        if let TypeData::Block(b) = &*types.get(expected) {
            b.arguments.insert("self", expected, false);
            b.arguments.insert("a", dog, false);
        }

        let given = types.new_block("given", BlockKind::Closure, None, Some(dog), None, false, None);
        if let TypeData::Block(b) = &*types.get(given) {
            b.arguments.insert("self", given, false);
            // accepts a wider type than required -- contravariant, ok
            b.arguments.insert("a", animal, false);
        }

        assert!(types.is_compatible(given, expected));
    }
}
