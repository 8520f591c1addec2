//! The external AST interface the pass consumes (spec section 6): node
//! shapes, source spans, and the unresolved type-reference syntax.

mod node;
mod span;
mod type_ref;

pub use node::{
    Argument, AttributeNode, BlockNode, ConstantNode, DefineVariableKind, DefineVariableNode,
    GlobalNode, IdentifierNode, ImportNode, ImportedSymbol, Literal, LiteralNode, MethodNode,
    Node, ObjectNode, Parameter, RawInstructionNode, ReassignNode, ReassignTarget,
    ReopenObjectNode, ReturnNode, SelfNode, SendNode, ThrowNode, TraitImplementationNode,
    TraitNode, TryNode, TypeParameterDecl, TypeSlot,
};
pub use span::Span;
pub use type_ref::{BlockTypeRef, TypeRef};
