//! Process-wide name tables: reserved constants, intrinsic opcode names,
//! and the special method/block/attribute names the pass treats
//! structurally (spec section 6's "external contract").
//!
//! Grounded in the teacher's use of `once_cell::sync::Lazy` for shared,
//! lazily-built startup state (e.g. its keyword and operator tables).

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// The name a method must carry for `define_variable(attribute)` to be
/// legal inside its body (spec section 3, invariant 3).
pub const INIT_METHOD_NAME: &str = "init";

/// The reserved string attribute every `object`/`trait` declaration
/// defines on itself (spec section 4.6, `object` declaration rule).
pub const NAME_ATTRIBUTE: &str = "$name";

/// The name a module's own type is registered under in its globals table
/// (spec section 8, "Module.globals contains the module type under the
/// configured module-global name").
pub const MODULE_GLOBAL_NAME: &str = "Module";

/// The attribute name on `top_level` that exposes the module prototype
/// (spec section 4.2).
pub const MODULE_PROTOTYPE_ATTRIBUTE: &str = "Module";

/// Base names used to derive the two synthesized block names inside a
/// `try` expression (spec section 4.6, `try`): the actual type names are
/// suffixed with a per-node disambiguator by the checker.
pub const TRY_BLOCK_BASE_NAME: &str = "try_block";
pub const ELSE_BLOCK_BASE_NAME: &str = "else_block";

/// Names that may not be redefined as a constant (spec section 3,
/// invariant 5). Redefining one still binds the new value; it is
/// recorded as a diagnostic only.
pub static RESERVED_CONSTANTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Self", "Dyn", "Integer", "Float", "String", "Array", "Block", "Trait", "Object", "Nil",
        "True", "False", "Void", MODULE_GLOBAL_NAME,
    ]
    .into_iter()
    .collect()
});

/// The closed set of raw/intrinsic opcodes and the built-in prototype
/// their result type is taken from (spec section 4.6, "Raw instruction
/// nodes"). Resolved against a [`crate::database::TypeDatabase`] by
/// [`crate::instructions::instruction_result_type`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicResult {
    Integer,
    Float,
    String,
    Array,
    Nil,
    TopLevel,
    Void,
}

pub static RAW_INSTRUCTIONS: Lazy<std::collections::HashMap<&'static str, IntrinsicResult>> =
    Lazy::new(|| {
        use IntrinsicResult::*;
        [
            ("integer_to_string", String),
            ("integer_add", Integer),
            ("integer_subtract", Integer),
            ("integer_multiply", Integer),
            ("integer_divide", Integer),
            ("float_to_string", String),
            ("float_add", Float),
            ("string_concat", String),
            ("string_to_upper", String),
            ("array_new", Array),
            ("array_length", Integer),
            ("stdout_write", Integer),
            ("stdout_flush", Nil),
            ("get_toplevel", TopLevel),
            ("process_panic", Void),
        ]
        .into_iter()
        .collect()
    });

pub fn is_reserved_constant(name: &str) -> bool {
    RESERVED_CONSTANTS.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_constants_cover_builtin_names() {
        assert!(is_reserved_constant("Integer"));
        assert!(is_reserved_constant(MODULE_GLOBAL_NAME));
        assert!(!is_reserved_constant("MyCustomConstant"));
    }

    #[test]
    fn raw_instruction_table_has_no_unknown_lookups() {
        assert_eq!(
            RAW_INSTRUCTIONS.get("integer_to_string"),
            Some(&IntrinsicResult::String)
        );
        assert_eq!(RAW_INSTRUCTIONS.get("does_not_exist"), None);
    }
}
