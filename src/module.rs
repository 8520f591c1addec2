//! Per-module state threaded through a single pass (spec section 4.3).
//!
//! Grounded in the teacher's top-level `Ast<T>`/file-unit pairing, but
//! widened to also own the module's registered globals and its two
//! built-in types, since those outlive the traversal that produced them
//! and get handed to importers.

use crate::ast::{ImportNode, Node};
use crate::symbol::SymbolTable;
use crate::types::TypeId;

/// A single compiled module: its qualified name, the two built-in types
/// it owns (the module's own object type and the type of its top-level
/// body block), its import list, and its globals table.
pub struct Module {
    pub name: String,
    /// The module's own `Object` type. When the module opted out of
    /// defining one (spec section 4.3, "does not define a module type"),
    /// this is the shared `top_level` type instead of a freshly minted
    /// object.
    pub module_type: TypeId,
    /// Whether `module_type` above is a fresh per-module object or the
    /// shared `top_level` fallback.
    pub defines_module_type: bool,
    /// The `Block` type of the module's top-level body.
    pub body_type: Option<TypeId>,
    /// The module's top-level forms, in source order, as handed to
    /// `run`. Import nodes are interleaved with declarations here; see
    /// `imports` for the extracted, order-preserving import list Phase 1
    /// populates as it walks this.
    pub body: Vec<Node>,
    /// Every import node encountered while walking `body`, in source
    /// order (spec section 4.3). Empty until `run` processes the module.
    pub imports: Vec<ImportNode>,
    /// Every imported symbol and every non-block top-level declaration
    /// (spec section 3, invariant 6: methods never leak in here).
    pub globals: SymbolTable,
}

impl Module {
    /// A module that defines its own object type, inheriting from the
    /// database's module prototype via `module_type`.
    pub fn new(name: impl ToString, module_type: TypeId) -> Self {
        Module {
            name: name.to_string(),
            module_type,
            defines_module_type: true,
            body_type: None,
            body: Vec::new(),
            imports: Vec::new(),
            globals: SymbolTable::new(),
        }
    }

    /// A module that opts out of its own type, reusing `top_level`
    /// (spec section 4.3).
    pub fn without_module_type(name: impl ToString, top_level: TypeId) -> Self {
        Module {
            name: name.to_string(),
            module_type: top_level,
            defines_module_type: false,
            body_type: None,
            body: Vec::new(),
            imports: Vec::new(),
            globals: SymbolTable::new(),
        }
    }

    pub fn with_body(mut self, body: Vec<Node>) -> Self {
        self.body = body;
        self
    }

    /// Whether a zero-argument message send of `name` against the
    /// module's own type would succeed -- used by the receiver-inference
    /// rule in spec section 4.6, Sends step 1.
    pub fn responds_to_message(&self, types: &crate::types::Types, name: &str) -> bool {
        types.lookup_method(self.module_type, name).is_some() || self.globals.contains_local(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Types;

    #[test]
    fn fresh_module_defines_its_own_type() {
        let types = Types::new();
        let module_type = types.new_object("app::main", None);
        let module = Module::new("app::main", module_type);
        assert!(module.defines_module_type);
        assert_eq!(module.module_type, module_type);
    }

    #[test]
    fn module_without_a_type_reuses_top_level() {
        let types = Types::new();
        let top_level = types.new_object("ToplevelObject", None);
        let module = Module::without_module_type("app::script", top_level);
        assert!(!module.defines_module_type);
        assert_eq!(module.module_type, top_level);
    }

    #[test]
    fn responds_to_message_checks_methods_and_globals() {
        let types = Types::new();
        let module_type = types.new_object("app::main", None);
        let mut module = Module::new("app::main", module_type);
        module.globals.insert("VERSION", types.dynamic, false);
        assert!(module.responds_to_message(&types, "VERSION"));
        assert!(!module.responds_to_message(&types, "missing"));
    }
}
