//! Unresolved type annotations as written in source, before the checker
//! resolves them against a lookup scope (spec section 4.6, "Type
//! resolution"). Grounded in the teacher's `TypeAnnotation`/`TypeName`
//! split: the parser only ever hands back a name, the checker turns it
//! into a concrete type.

use serde::{Deserialize, Serialize};

use super::Span;

/// One positional or keyword-named block parameter's declared type, as
/// written (`None` when the parameter has no annotation and must be
/// inferred as a [`crate::types::ConstraintData`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockTypeRef {
    pub parameters: Vec<TypeRef>,
    pub rest: bool,
    pub returns: Option<Box<TypeRef>>,
    pub throws: Option<Box<TypeRef>>,
}

/// A type as written in source, not yet resolved to a `TypeId`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TypeRef {
    /// A (possibly qualified) name with optional generic arguments, e.g.
    /// `Array[Integer]` or `other_module::Thing`.
    Named {
        path: Vec<String>,
        arguments: Vec<TypeRef>,
        span: Span,
    },
    /// `T?` sugar, produces `Optional[T]`.
    Optional(Box<TypeRef>),
    /// `Self`.
    SelfRef(Span),
    /// `Dyn`.
    Dyn(Span),
    /// An inline block type signature.
    Block(BlockTypeRef),
}

impl TypeRef {
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        TypeRef::Named {
            path: vec![name.into()],
            arguments: Vec::new(),
            span,
        }
    }
}
