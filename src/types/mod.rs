//! The algebraic universe of types and their operations.
//!
//! This is the "mixed-in behavior -> capability interfaces" redesign from
//! the spec: the source material (and the teacher's `why_lib::typechecker`)
//! both compose type behavior from several pieces. Here every variant is a
//! case of one closed `TypeData` enum, stored in an arena and referenced by
//! the `Copy` handle `TypeId` ("open recursion through prototypes ->
//! explicit link"), and the shared operations (compatibility, lookup,
//! instantiation) live in `compat` and `instantiate` as inherent methods on
//! [`Types`].

mod compat;
mod instantiate;

pub use instantiate::CallSignature;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::symbol::SymbolTable;

/// A cheap, `Copy` handle into a [`TypeArena`]. Two `TypeId`s are equal
/// iff they name the same arena slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct TypeId(usize);

impl TypeId {
    pub fn from_raw(raw: usize) -> Self {
        TypeId(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }
}

/// The kind of a [`BlockData`]. Every block has a self argument at index 0
/// regardless of kind (invariant 2 in the spec's data model).
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BlockKind {
    Closure,
    Method,
    TryBlock,
    ElseBlock,
}

/// Shared fields between objects and traits: a name, an optional
/// prototype link, an attribute table (methods are attributes whose type
/// is `Block`), the set of traits implemented, and the type-parameter
/// machinery used for generics.
#[derive(Debug)]
pub struct ObjectLike {
    pub name: String,
    pub prototype: Option<TypeId>,
    pub attributes: SymbolTable,
    pub implemented_traits: RefCell<Vec<TypeId>>,
    pub type_parameters: SymbolTable,
    pub type_parameter_instances: RefCell<HashMap<String, TypeId>>,
}

impl ObjectLike {
    fn new(name: impl ToString, prototype: Option<TypeId>) -> Self {
        ObjectLike {
            name: name.to_string(),
            prototype,
            attributes: SymbolTable::new(),
            implemented_traits: RefCell::new(Vec::new()),
            type_parameters: SymbolTable::new(),
            type_parameter_instances: RefCell::new(HashMap::new()),
        }
    }

    pub fn implements(&self, trait_id: TypeId) -> bool {
        self.implemented_traits.borrow().contains(&trait_id)
    }

    pub fn add_implemented_trait(&self, trait_id: TypeId) {
        let mut traits = self.implemented_traits.borrow_mut();
        if !traits.contains(&trait_id) {
            traits.push(trait_id);
        }
    }

    pub fn remove_implemented_trait(&self, trait_id: TypeId) {
        self.implemented_traits.borrow_mut().retain(|t| *t != trait_id);
    }
}

#[derive(Debug)]
pub struct ObjectData(pub ObjectLike);

#[derive(Debug)]
pub struct TraitData {
    pub object: ObjectLike,
    pub required_methods: SymbolTable,
    pub required_traits: RefCell<Vec<TypeId>>,
    /// Marks a trait synthesized from a type-parameter constraint; its
    /// name matches the parameter's name.
    pub generated: bool,
}

#[derive(Debug)]
pub struct BlockData {
    pub name: String,
    pub kind: BlockKind,
    pub prototype: Option<TypeId>,
    /// Ordered argument table; index 0 is always the implicit `self`.
    pub arguments: SymbolTable,
    pub returns: RefCell<Option<TypeId>>,
    pub throws: RefCell<Option<TypeId>>,
    pub type_parameters: SymbolTable,
    /// Set at construction time; true when the block was written without
    /// an explicit return-type annotation, in which case `returns` may
    /// later be back-filled from its body.
    pub infer: bool,
    /// Name of the last positional argument, if it collects a variable
    /// number of trailing arguments ("rest" argument).
    pub rest_argument: Option<String>,
}

#[derive(Debug)]
pub struct ConstraintData {
    pub name: String,
    pub required_methods: SymbolTable,
}

/// The closed sum of semantic types (spec section 3). `Type` is the public
/// name used by callers outside this module; `TypeData` is kept as the
/// internal name since it's what gets stored behind a `TypeId` in the arena.
pub type Type = TypeData;

#[derive(Debug)]
pub enum TypeData {
    Object(ObjectData),
    Trait(TraitData),
    Block(BlockData),
    /// Exactly wraps one other type.
    Optional(TypeId),
    /// Deferred `self` reference, resolved against the enclosing
    /// `self_type` at the point of use.
    SelfType,
    /// Universal escape hatch, compatible with everything both ways.
    Dynamic,
    Constraint(ConstraintData),
}

impl TypeData {
    pub fn prototype(&self) -> Option<TypeId> {
        match self {
            TypeData::Object(o) => o.0.prototype,
            TypeData::Trait(t) => t.object.prototype,
            TypeData::Block(b) => b.prototype,
            TypeData::Optional(_) | TypeData::SelfType | TypeData::Dynamic => None,
            TypeData::Constraint(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeData::Object(o) => &o.0.name,
            TypeData::Trait(t) => &t.object.name,
            TypeData::Block(b) => &b.name,
            TypeData::Optional(_) => "Optional",
            TypeData::SelfType => "Self",
            TypeData::Dynamic => "Dyn",
            TypeData::Constraint(c) => &c.name,
        }
    }

    pub fn as_object_like(&self) -> Option<&ObjectLike> {
        match self {
            TypeData::Object(o) => Some(&o.0),
            TypeData::Trait(t) => Some(&t.object),
            _ => None,
        }
    }

    pub fn as_trait(&self) -> Option<&TraitData> {
        match self {
            TypeData::Trait(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockData> {
        match self {
            TypeData::Block(b) => Some(b),
            _ => None,
        }
    }
}

/// Backing storage for all types created during a compile: built-ins
/// (created once, shared process-wide), module-scoped objects/traits/
/// top-level blocks (created while walking declarations, retained for the
/// whole compile) and closure block types (live exactly as long as their
/// AST node, but are never explicitly freed -- the arena simply outlives
/// them, matching the spec's resource discipline).
#[derive(Default)]
struct Arena {
    entries: Vec<Rc<TypeData>>,
}

/// Shared handle to a [`TypeArena`]. Cheap to clone; every clone refers to
/// the same underlying storage.
#[derive(Clone)]
pub struct Types {
    arena: Rc<RefCell<Arena>>,
    pub dynamic: TypeId,
    pub self_type: TypeId,
    nil: Rc<RefCell<Option<TypeId>>>,
}

impl Types {
    /// Create a fresh arena seeded with the two stateless singletons every
    /// pass needs: `Dynamic` at a fixed handle and `SelfType` right after
    /// it, so both are cheap to hand out without a lookup.
    pub fn new() -> Self {
        let arena = Rc::new(RefCell::new(Arena::default()));
        let dynamic = Self::push_raw(&arena, TypeData::Dynamic);
        let self_type = Self::push_raw(&arena, TypeData::SelfType);
        Types {
            arena,
            dynamic,
            self_type,
            nil: Rc::default(),
        }
    }

    /// Record which built-in type stands in for "no value" so `Optional`
    /// compatibility checks can recognize it. Set once by
    /// [`crate::database::TypeDatabase::new`].
    pub fn set_nil(&self, nil: TypeId) {
        *self.nil.borrow_mut() = Some(nil);
    }

    pub fn nil(&self) -> Option<TypeId> {
        *self.nil.borrow()
    }

    fn push_raw(arena: &Rc<RefCell<Arena>>, data: TypeData) -> TypeId {
        let mut inner = arena.borrow_mut();
        let id = TypeId(inner.entries.len());
        inner.entries.push(Rc::new(data));
        id
    }

    pub fn push(&self, data: TypeData) -> TypeId {
        Self::push_raw(&self.arena, data)
    }

    pub fn get(&self, id: TypeId) -> Rc<TypeData> {
        self.arena
            .borrow()
            .entries
            .get(id.0)
            .cloned()
            .unwrap_or_else(|| panic!("dangling TypeId({})", id.0))
    }

    pub fn new_object(&self, name: impl ToString, prototype: Option<TypeId>) -> TypeId {
        self.push(TypeData::Object(ObjectData(ObjectLike::new(name, prototype))))
    }

    pub fn new_trait(
        &self,
        name: impl ToString,
        prototype: Option<TypeId>,
        generated: bool,
    ) -> TypeId {
        self.push(TypeData::Trait(TraitData {
            object: ObjectLike::new(name, prototype),
            required_methods: SymbolTable::new(),
            required_traits: RefCell::new(Vec::new()),
            generated,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_block(
        &self,
        name: impl ToString,
        kind: BlockKind,
        prototype: Option<TypeId>,
        returns: Option<TypeId>,
        throws: Option<TypeId>,
        infer: bool,
        rest_argument: Option<String>,
    ) -> TypeId {
        self.push(TypeData::Block(BlockData {
            name: name.to_string(),
            kind,
            prototype,
            arguments: SymbolTable::new(),
            returns: RefCell::new(returns),
            throws: RefCell::new(throws),
            type_parameters: SymbolTable::new(),
            infer,
            rest_argument,
        }))
    }

    pub fn new_optional(&self, inner: TypeId) -> TypeId {
        self.push(TypeData::Optional(inner))
    }

    pub fn new_constraint(&self, name: impl ToString) -> TypeId {
        self.push(TypeData::Constraint(ConstraintData {
            name: name.to_string(),
            required_methods: SymbolTable::new(),
        }))
    }

    /// Walk `id`'s prototype chain (including `id` itself), yielding
    /// handles outward. Acyclic by construction: a prototype must exist
    /// (and therefore have a strictly smaller `TypeId`) before it can be
    /// referenced.
    pub fn prototype_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(next) = self.get(current).prototype() {
            chain.push(next);
            current = next;
        }
        chain
    }

    pub fn is_dynamic(&self, id: TypeId) -> bool {
        id == self.dynamic
    }

    pub fn is_self_type(&self, id: TypeId) -> bool {
        id == self.self_type
    }

    /// Resolve an unresolved `SelfType` against `receiver`; everything
    /// else passes through unchanged.
    pub fn resolve_self(&self, id: TypeId, receiver: TypeId) -> TypeId {
        if self.is_self_type(id) {
            receiver
        } else {
            id
        }
    }
}

impl Default for Types {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_and_self_are_stable_singletons() {
        let types = Types::new();
        assert!(types.is_dynamic(types.dynamic));
        assert!(types.is_self_type(types.self_type));
        assert_ne!(types.dynamic, types.self_type);
    }

    #[test]
    fn prototype_chain_walks_outward() {
        let types = Types::new();
        let root = types.new_object("Root", None);
        let mid = types.new_object("Mid", Some(root));
        let leaf = types.new_object("Leaf", Some(mid));

        assert_eq!(types.prototype_chain(leaf), vec![leaf, mid, root]);
    }

    #[test]
    fn resolve_self_substitutes_only_self_type() {
        let types = Types::new();
        let concrete = types.new_object("Foo", None);

        assert_eq!(types.resolve_self(types.self_type, concrete), concrete);
        assert_eq!(types.resolve_self(concrete, types.dynamic), concrete);
    }
}
