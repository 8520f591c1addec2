//! Process-wide registry of built-in prototypes (spec section 4.2).
//!
//! Created once before any module is processed and shared read-only
//! across the whole compile, the way the teacher's `lexer`/`parser`
//! pipeline is wrapped by a single, long-lived `Context`. `top_level`
//! additionally owns two attributes: `Modules` (every module type by
//! qualified name) and `Module` (the prototype every module type
//! inherits from).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{BlockKind, TypeData, TypeId, Types};

/// Handles to every built-in prototype, plus the shared type arena they
/// (and everything created while checking a module) live in.
#[derive(Clone)]
pub struct TypeDatabase {
    pub types: Types,
    pub integer_type: TypeId,
    pub float_type: TypeId,
    pub string_type: TypeId,
    pub array_type: TypeId,
    pub block_type: TypeId,
    pub trait_type: TypeId,
    pub object_type: TypeId,
    pub nil_type: TypeId,
    pub true_type: TypeId,
    pub false_type: TypeId,
    pub void_type: TypeId,
    pub top_level: TypeId,
    /// `top_level.Modules`: every module type registered so far, keyed by
    /// qualified module name. Grow-only for the lifetime of the process.
    modules: Rc<RefCell<HashMap<String, TypeId>>>,
    /// `top_level.Module`: the prototype every module type inherits from.
    pub module_prototype: TypeId,
}

impl TypeDatabase {
    pub fn new() -> Self {
        let types = Types::new();

        let object_type = types.new_object("Object", None);
        let trait_type = types.new_trait("Trait", Some(object_type), false);
        let block_type = types.new_object("Block", Some(object_type));
        let integer_type = types.new_object("Integer", Some(object_type));
        let float_type = types.new_object("Float", Some(object_type));
        let string_type = types.new_object("String", Some(object_type));
        let array_type = types.new_object("Array", Some(object_type));
        let nil_type = types.new_object("NilType", Some(object_type));
        let true_type = types.new_object("TrueClass", Some(object_type));
        let false_type = types.new_object("FalseClass", Some(object_type));
        let void_type = types.new_object("Void", Some(object_type));
        let module_prototype = types.new_object("Module", Some(object_type));
        let top_level = types.new_object("ToplevelObject", Some(object_type));

        types.set_nil(nil_type);

        let modules = Rc::new(RefCell::new(HashMap::new()));

        if let TypeData::Object(o) = &*types.get(top_level) {
            o.0.attributes
                .insert(crate::config::MODULE_PROTOTYPE_ATTRIBUTE, module_prototype, false);
        }

        TypeDatabase {
            types,
            integer_type,
            float_type,
            string_type,
            array_type,
            block_type,
            trait_type,
            object_type,
            nil_type,
            true_type,
            false_type,
            void_type,
            top_level,
            modules,
            module_prototype,
        }
    }

    /// Register a module type under its qualified name. Qualified names
    /// are unique for the lifetime of the process -- re-registering a
    /// name overwrites the earlier registration, matching the append-only
    /// "compile modules" driver that owns this registry.
    pub fn register_module(&self, qualified_name: impl ToString, module_type: TypeId) {
        self.modules
            .borrow_mut()
            .insert(qualified_name.to_string(), module_type);
    }

    pub fn lookup_module(&self, qualified_name: &str) -> Option<TypeId> {
        self.modules.borrow().get(qualified_name).copied()
    }

    /// Build a block type whose prototype is `block_type`, the shape
    /// every closure/method/try/else block ultimately inherits.
    pub fn new_block(
        &self,
        name: impl ToString,
        kind: BlockKind,
        returns: Option<TypeId>,
        throws: Option<TypeId>,
        infer: bool,
        rest_argument: Option<String>,
    ) -> TypeId {
        self.types
            .new_block(name, kind, Some(self.block_type), returns, throws, infer, rest_argument)
    }
}

impl Default for TypeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_all_distinct() {
        let db = TypeDatabase::new();
        let ids = [
            db.integer_type,
            db.float_type,
            db.string_type,
            db.array_type,
            db.block_type,
            db.trait_type,
            db.object_type,
            db.nil_type,
            db.true_type,
            db.false_type,
            db.void_type,
            db.top_level,
        ];
        for (i, a) in ids.iter().enumerate() {
            for (j, b) in ids.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn top_level_exposes_module_prototype() {
        let db = TypeDatabase::new();
        let symbol = db.types.lookup_attribute(db.top_level, "Module");
        assert_eq!(symbol.unwrap().type_id, db.module_prototype);
    }

    #[test]
    fn module_registry_round_trips() {
        let db = TypeDatabase::new();
        let module_type = db.types.new_object("app::main", Some(db.module_prototype));
        db.register_module("app::main", module_type);
        assert_eq!(db.lookup_module("app::main"), Some(module_type));
        assert_eq!(db.lookup_module("app::missing"), None);
    }
}
