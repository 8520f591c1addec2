//! Append-only collection of typed error records with source locations
//! (spec section 4.4).
//!
//! Unlike the teacher's `TypeCheckError`, which is returned via
//! `Result<_, TypeCheckError>` and aborts the surrounding `?` chain on
//! first failure, diagnostics here are *pushed* into a sink and every
//! rule that can fail still returns a usable type (almost always
//! `Dynamic`) so the pass can keep going. This is spec section 7's
//! "diagnostic-then-continue" contract, not the teacher's control flow --
//! the error *payload* shapes below are grounded in
//! `why_lib::typechecker::error`, the *sink* itself is not.

use std::fmt::Display;

use crate::ast::Span;
use crate::types::{TypeId, Types};

/// One error kind per spec section 4.4.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticKind {
    UndefinedAttribute { name: String },
    UndefinedMethod { name: String },
    UndefinedConstant { name: String },
    UndefinedKeywordArgument { name: String },
    UndefinedLocal { name: String },
    ImportUndefinedSymbol { name: String, module: String },
    ImportExistingSymbol { name: String },
    TypeMismatch { expected: String, actual: String },
    ReturnTypeMismatch { expected: String, actual: String },
    ArgumentCountMismatch { expected_min: usize, expected_max: Option<usize>, given: usize },
    GeneratedTraitNotImplemented { trait_name: String, type_name: String },
    UnimplementedTrait { trait_name: String, required_trait: String },
    UnimplementedMethod { trait_name: String, method_name: String },
    ReassignUndefinedAttribute { name: String },
    ReassignUndefinedLocal { name: String },
    ReassignImmutableAttribute { name: String },
    ReassignImmutableLocal { name: String },
    DefineInstanceAttributeOutsideInit { name: String },
    DefineRequiredMethodOnNonTrait { name: String },
    RedefineReservedConstant { name: String },
    UnknownRawInstruction { opcode: String },
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UndefinedAttribute { name } => {
                write!(f, "undefined attribute '{name}'")
            }
            DiagnosticKind::UndefinedMethod { name } => write!(f, "undefined method '{name}'"),
            DiagnosticKind::UndefinedConstant { name } => write!(f, "undefined constant '{name}'"),
            DiagnosticKind::UndefinedKeywordArgument { name } => {
                write!(f, "undefined keyword argument '{name}'")
            }
            DiagnosticKind::UndefinedLocal { name } => write!(f, "undefined local '{name}'"),
            DiagnosticKind::ImportUndefinedSymbol { name, module } => {
                write!(f, "'{name}' is not defined in module '{module}'")
            }
            DiagnosticKind::ImportExistingSymbol { name } => {
                write!(f, "'{name}' is already defined")
            }
            DiagnosticKind::TypeMismatch { expected, actual } => {
                write!(f, "expected type '{expected}' but got '{actual}'")
            }
            DiagnosticKind::ReturnTypeMismatch { expected, actual } => {
                write!(f, "expected return type '{expected}' but got '{actual}'")
            }
            DiagnosticKind::ArgumentCountMismatch {
                expected_min,
                expected_max,
                given,
            } => match expected_max {
                Some(max) if max == expected_min => {
                    write!(f, "expected {expected_min} argument(s) but got {given}")
                }
                Some(max) => write!(
                    f,
                    "expected between {expected_min} and {max} argument(s) but got {given}"
                ),
                None => write!(f, "expected at least {expected_min} argument(s) but got {given}"),
            },
            DiagnosticKind::GeneratedTraitNotImplemented { trait_name, type_name } => {
                write!(f, "'{type_name}' does not satisfy constraint '{trait_name}'")
            }
            DiagnosticKind::UnimplementedTrait { trait_name, required_trait } => write!(
                f,
                "implementation of '{trait_name}' is missing required trait '{required_trait}'"
            ),
            DiagnosticKind::UnimplementedMethod { trait_name, method_name } => write!(
                f,
                "implementation of '{trait_name}' is missing required method '{method_name}'"
            ),
            DiagnosticKind::ReassignUndefinedAttribute { name } => {
                write!(f, "cannot reassign undefined attribute '{name}'")
            }
            DiagnosticKind::ReassignUndefinedLocal { name } => {
                write!(f, "cannot reassign undefined local '{name}'")
            }
            DiagnosticKind::ReassignImmutableAttribute { name } => {
                write!(f, "cannot reassign immutable attribute '{name}'")
            }
            DiagnosticKind::ReassignImmutableLocal { name } => {
                write!(f, "cannot reassign immutable local '{name}'")
            }
            DiagnosticKind::DefineInstanceAttributeOutsideInit { name } => write!(
                f,
                "attribute '{name}' can only be defined inside 'init'"
            ),
            DiagnosticKind::DefineRequiredMethodOnNonTrait { name } => write!(
                f,
                "required method '{name}' can only be declared inside a trait"
            ),
            DiagnosticKind::RedefineReservedConstant { name } => {
                write!(f, "'{name}' is a reserved constant and cannot be redefined")
            }
            DiagnosticKind::UnknownRawInstruction { opcode } => {
                write!(f, "unknown raw instruction '{opcode}'")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: Span) -> Self {
        Diagnostic { kind, location }
    }

    pub fn render(&self) -> String {
        self.location.to_string(self.kind.to_string())
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Convenience helper for building a `TypeMismatch`/`ReturnTypeMismatch`
/// diagnostic from resolved `TypeId`s, formatting them via the type
/// database's naming.
pub fn type_mismatch(types: &Types, expected: TypeId, actual: TypeId) -> DiagnosticKind {
    DiagnosticKind::TypeMismatch {
        expected: types.get(expected).name().to_string(),
        actual: types.get(actual).name().to_string(),
    }
}

pub fn return_type_mismatch(types: &Types, expected: TypeId, actual: TypeId) -> DiagnosticKind {
    DiagnosticKind::ReturnTypeMismatch {
        expected: types.get(expected).name().to_string(),
        actual: types.get(actual).name().to_string(),
    }
}

/// Append-only diagnostics sink. The pass never aborts on an error: it
/// records one diagnostic per violation, substitutes `Dynamic`, and
/// keeps walking (spec section 7).
#[derive(Default, Clone, Debug)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, location: Span) {
        self.entries.push(Diagnostic::new(kind, location));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_is_append_only_and_ordered() {
        let mut sink = Diagnostics::new();
        sink.push(
            DiagnosticKind::UndefinedLocal { name: "a".into() },
            Span::default(),
        );
        sink.push(
            DiagnosticKind::UndefinedLocal { name: "b".into() },
            Span::default(),
        );

        let entries = sink.into_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].kind,
            DiagnosticKind::UndefinedLocal { name: "a".into() }
        );
    }
}
