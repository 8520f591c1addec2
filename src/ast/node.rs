//! The AST node shapes the pass consumes and annotates (spec section 6).
//!
//! Every node carries a [`Span`] and a [`TypeSlot`]: a mutable cell the
//! checker fills in, directly grounded in the teacher's
//! `TypeInformation { type_id: Rc<RefCell<Option<Type>>>, .. }` field,
//! which is exactly this mechanism under a different name. Supplementary
//! slots called out in spec section 6 (`block_type`, `receiver_type`,
//! `try_block_type`, `else_block_type`) are plain fields of the same
//! shape on the nodes that need them.
//!
//! `TypeSlot` itself is skipped by serde: wire-format ASTs carry source
//! structure and annotations, not a previous run's computed types, so a
//! deserialized node starts with every slot empty, exactly as if freshly
//! parsed.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::types::TypeId;

use super::type_ref::TypeRef;
use super::Span;

#[derive(Clone, Debug, Default)]
pub struct TypeSlot(Rc<RefCell<Option<TypeId>>>);

impl TypeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<TypeId> {
        *self.0.borrow()
    }

    pub fn set(&self, type_id: TypeId) {
        *self.0.borrow_mut() = Some(type_id);
    }

    /// The slot's value, or `dynamic` if it hasn't been assigned yet --
    /// every node is expected to carry a non-null type after a full run
    /// (spec section 8, universal invariant 1), so this is a convenience
    /// for callers that run after the pass completed.
    pub fn get_or(&self, dynamic: TypeId) -> TypeId {
        self.get().unwrap_or(dynamic)
    }
}

impl Serialize for TypeSlot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

impl<'de> Deserialize<'de> for TypeSlot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(serde::de::IgnoredAny)?;
        Ok(TypeSlot::default())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    True,
    False,
    Nil,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LiteralNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub value: Literal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfNode {
    pub span: Span,
    pub type_slot: TypeSlot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstantNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    /// A possibly-qualified path, e.g. `["json", "Parser"]`.
    pub path: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentifierNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlobalNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Argument {
    /// `None` for positional arguments, `Some(name)` for keyword ones.
    pub keyword: Option<String>,
    pub value: Node,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SendNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    /// Explicit receiver expression; `None` means the receiver must be
    /// inferred per spec section 4.6, Sends step 1.
    pub receiver: Option<Box<Node>>,
    pub name: String,
    pub arguments: Vec<Argument>,
    /// Supplementary slot: the receiver type actually used, whether
    /// explicit or inferred (spec section 6).
    pub receiver_type: TypeSlot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<TypeRef>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub parameters: Vec<Parameter>,
    pub rest_parameter: Option<String>,
    pub return_type: Option<TypeRef>,
    pub throw_type: Option<TypeRef>,
    pub body: Vec<Node>,
    /// Supplementary slot: the synthesized `Block` type for this closure
    /// (spec section 6, `block_type`).
    pub block_type: TypeSlot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReturnNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub value: Option<Box<Node>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThrowNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub value: Box<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TryNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub try_body: Vec<Node>,
    /// Name bound to the thrown value inside the else branch, if any.
    pub else_parameter: Option<String>,
    pub else_body: Vec<Node>,
    /// Supplementary slots (spec section 6): the two synthesized block
    /// types sharing the enclosing self.
    pub try_block_type: TypeSlot,
    pub else_block_type: TypeSlot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawInstructionNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub opcode: String,
    pub arguments: Vec<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeParameterDecl {
    pub name: String,
    pub constraints: Vec<TypeRef>,
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub name: String,
    pub type_parameters: Vec<TypeParameterDecl>,
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraitNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub name: String,
    pub type_parameters: Vec<TypeParameterDecl>,
    pub required_traits: Vec<TypeRef>,
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraitImplementationNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub trait_ref: TypeRef,
    pub object_ref: TypeRef,
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReopenObjectNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub object_ref: TypeRef,
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub name: String,
    pub required: bool,
    pub parameters: Vec<Parameter>,
    pub rest_parameter: Option<String>,
    pub return_type: Option<TypeRef>,
    pub throw_type: Option<TypeRef>,
    pub body: Vec<Node>,
    /// Supplementary slot: the `self` type this method was registered
    /// against (spec section 6, `receiver_type`).
    pub receiver_type: TypeSlot,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefineVariableKind {
    Constant,
    Attribute,
    Local,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefineVariableNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub kind: DefineVariableKind,
    pub name: String,
    pub mutable: bool,
    pub type_annotation: Option<TypeRef>,
    pub value: Box<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ReassignTarget {
    Local(String),
    Attribute(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReassignNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub target: ReassignTarget,
    pub value: Box<Node>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportedSymbol {
    pub source_name: String,
    pub alias: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportNode {
    pub span: Span,
    pub type_slot: TypeSlot,
    pub module_path: Vec<String>,
    pub symbols: Vec<ImportedSymbol>,
    pub glob: bool,
    /// `import self as Alias` re-export form: binds `alias` to the
    /// imported module's own type (spec section 4.6, Phase 1).
    pub reexport_self: Option<String>,
}

/// The closed set of AST node kinds the pass understands. Dispatch is an
/// explicit match on this tag (spec section 9, "Visitor dispatch →
/// pattern match"), not reflection on a node-kind string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Node {
    Literal(LiteralNode),
    SelfExpr(SelfNode),
    Attribute(AttributeNode),
    Constant(ConstantNode),
    Identifier(IdentifierNode),
    Global(GlobalNode),
    Send(SendNode),
    Block(BlockNode),
    Return(ReturnNode),
    Throw(ThrowNode),
    Try(TryNode),
    RawInstruction(RawInstructionNode),
    Object(ObjectNode),
    Trait(TraitNode),
    TraitImplementation(TraitImplementationNode),
    ReopenObject(ReopenObjectNode),
    Method(MethodNode),
    DefineVariable(DefineVariableNode),
    Reassign(ReassignNode),
    Import(ImportNode),
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Literal(n) => &n.span,
            Node::SelfExpr(n) => &n.span,
            Node::Attribute(n) => &n.span,
            Node::Constant(n) => &n.span,
            Node::Identifier(n) => &n.span,
            Node::Global(n) => &n.span,
            Node::Send(n) => &n.span,
            Node::Block(n) => &n.span,
            Node::Return(n) => &n.span,
            Node::Throw(n) => &n.span,
            Node::Try(n) => &n.span,
            Node::RawInstruction(n) => &n.span,
            Node::Object(n) => &n.span,
            Node::Trait(n) => &n.span,
            Node::TraitImplementation(n) => &n.span,
            Node::ReopenObject(n) => &n.span,
            Node::Method(n) => &n.span,
            Node::DefineVariable(n) => &n.span,
            Node::Reassign(n) => &n.span,
            Node::Import(n) => &n.span,
        }
    }

    pub fn type_slot(&self) -> &TypeSlot {
        match self {
            Node::Literal(n) => &n.type_slot,
            Node::SelfExpr(n) => &n.type_slot,
            Node::Attribute(n) => &n.type_slot,
            Node::Constant(n) => &n.type_slot,
            Node::Identifier(n) => &n.type_slot,
            Node::Global(n) => &n.type_slot,
            Node::Send(n) => &n.type_slot,
            Node::Block(n) => &n.type_slot,
            Node::Return(n) => &n.type_slot,
            Node::Throw(n) => &n.type_slot,
            Node::Try(n) => &n.type_slot,
            Node::RawInstruction(n) => &n.type_slot,
            Node::Object(n) => &n.type_slot,
            Node::Trait(n) => &n.type_slot,
            Node::TraitImplementation(n) => &n.type_slot,
            Node::ReopenObject(n) => &n.type_slot,
            Node::Method(n) => &n.type_slot,
            Node::DefineVariable(n) => &n.type_slot,
            Node::Reassign(n) => &n.type_slot,
            Node::Import(n) => &n.type_slot,
        }
    }

    /// The type this node was assigned, or `dynamic` if `run` hasn't
    /// reached it yet.
    pub fn get_type(&self, dynamic: TypeId) -> TypeId {
        self.type_slot().get_or(dynamic)
    }
}
