//! Type assignment for raw/intrinsic instruction nodes (spec section 4.6,
//! "Raw instruction nodes"; section 2, "Built-in instruction table").
//!
//! A closed registry: each opcode has a fixed result type, resolved
//! against a [`TypeDatabase`] rather than hardcoded `TypeId`s, since the
//! database is what actually owns the built-in prototypes.

use crate::config::{IntrinsicResult, RAW_INSTRUCTIONS};
use crate::database::TypeDatabase;
use crate::diagnostics::DiagnosticKind;
use crate::types::TypeId;

/// Resolve `opcode`'s result type. Unknown opcodes are reported by the
/// caller (who has the node's span); this just signals the miss via
/// `Err` carrying the diagnostic to emit, and the nil fallback type is
/// the caller's to use since it's the database's job to own `nil_type`.
pub fn instruction_result_type(
    db: &TypeDatabase,
    opcode: &str,
) -> Result<TypeId, DiagnosticKind> {
    match RAW_INSTRUCTIONS.get(opcode) {
        Some(result) => Ok(resolve(db, *result)),
        None => Err(DiagnosticKind::UnknownRawInstruction {
            opcode: opcode.to_string(),
        }),
    }
}

fn resolve(db: &TypeDatabase, result: IntrinsicResult) -> TypeId {
    match result {
        IntrinsicResult::Integer => db.integer_type,
        IntrinsicResult::Float => db.float_type,
        IntrinsicResult::String => db.string_type,
        IntrinsicResult::Array => db.array_type,
        IntrinsicResult::Nil => db.nil_type,
        IntrinsicResult::TopLevel => db.top_level,
        IntrinsicResult::Void => db.void_type,
    }
}

/// Type an unknown opcode as the database's `nil_type`, matching "Unknown
/// opcodes emit a diagnostic and return nil" from spec section 4.6.
pub fn unknown_instruction_fallback(db: &TypeDatabase) -> TypeId {
    db.nil_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_opcode_resolves_to_its_builtin() {
        let db = TypeDatabase::new();
        assert_eq!(
            instruction_result_type(&db, "integer_to_string"),
            Ok(db.string_type)
        );
        assert_eq!(instruction_result_type(&db, "get_toplevel"), Ok(db.top_level));
    }

    #[test]
    fn unknown_opcode_reports_and_falls_back_to_nil() {
        let db = TypeDatabase::new();
        assert_eq!(
            instruction_result_type(&db, "bogus_opcode"),
            Err(DiagnosticKind::UnknownRawInstruction {
                opcode: "bogus_opcode".to_string()
            })
        );
        assert_eq!(unknown_instruction_fallback(&db), db.nil_type);
    }
}
