//! Type-reference resolution, import processing, and the primitive
//! per-node rules: attribute, constant, identifier, global, raw
//! instruction (spec section 4.6, "Type resolution" and "Declarations").

use crate::ast::{
    AttributeNode, ConstantNode, GlobalNode, IdentifierNode, ImportNode, Node, RawInstructionNode,
    TypeRef,
};
use crate::diagnostics::DiagnosticKind;
use crate::instructions;
use crate::module::Module;
use crate::scope::TypeScope;
use crate::types::TypeId;

use super::{Checker, ModuleCtx};

impl<'a> Checker<'a> {
    /// Extract every `Import` node from `module.body`, bind its symbols
    /// into `module.globals`, and record the processed node in
    /// `module.imports` in source order (spec section 4.3).
    pub(super) fn process_imports(&self, module: &mut Module) {
        let import_nodes: Vec<ImportNode> = module
            .body
            .iter()
            .filter_map(|n| match n {
                Node::Import(i) => Some(i.clone()),
                _ => None,
            })
            .collect();

        for import in import_nodes {
            let qualified = import.module_path.join("::");
            let source = self.imports.get(&qualified).copied();

            match source {
                None => {
                    self.diag(
                        DiagnosticKind::ImportUndefinedSymbol {
                            name: qualified.clone(),
                            module: qualified.clone(),
                        },
                        import.span.clone(),
                    );
                }
                Some(source_module) => {
                    if let Some(alias) = &import.reexport_self {
                        self.bind_import(&module.globals, alias, source_module.module_type, &import.span);
                    }

                    if import.glob {
                        for symbol in source_module.globals.symbols() {
                            self.bind_import(&module.globals, &symbol.name, symbol.type_id, &import.span);
                        }
                    } else {
                        for symbol in &import.symbols {
                            match source_module.globals.lookup(&symbol.source_name) {
                                Some(found) => {
                                    self.bind_import(&module.globals, &symbol.alias, found.type_id, &import.span);
                                }
                                None => self.diag(
                                    DiagnosticKind::ImportUndefinedSymbol {
                                        name: symbol.source_name.clone(),
                                        module: qualified.clone(),
                                    },
                                    import.span.clone(),
                                ),
                            }
                        }
                    }
                }
            }

            module.imports.push(import);
        }
    }

    /// Bind `alias` into `globals` unless it's already taken, in which
    /// case the existing binding wins and an `ImportExistingSymbol`
    /// diagnostic is raised (spec section 8, boundary case).
    fn bind_import(&self, globals: &crate::symbol::SymbolTable, alias: &str, ty: TypeId, span: &crate::ast::Span) {
        if globals.contains_local(alias) {
            self.diag(DiagnosticKind::ImportExistingSymbol { name: alias.to_string() }, span.clone());
        } else {
            globals.insert(alias, ty, false);
        }
    }

    /// Resolve an unresolved type-reference syntax node to a concrete
    /// `TypeId`, looking it up through `[block attributes, self type
    /// parameters/attributes, module globals, builtin names]` in that
    /// order (spec section 4.6, "Type resolution").
    pub(super) fn resolve_type_ref(&self, type_ref: &TypeRef, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        match type_ref {
            TypeRef::SelfRef(_) => self.db.types.self_type,
            TypeRef::Dyn(_) => self.db.types.dynamic,
            TypeRef::Optional(inner) => {
                let resolved = self.resolve_type_ref(inner, scope, mctx);
                self.db.types.new_optional(resolved)
            }
            TypeRef::Block(block_ref) => {
                let returns = block_ref.returns.as_ref().map(|r| self.resolve_type_ref(r, scope, mctx));
                let throws = block_ref.throws.as_ref().map(|t| self.resolve_type_ref(t, scope, mctx));
                let block_id = self.db.new_block(
                    "block",
                    crate::types::BlockKind::Closure,
                    returns,
                    throws,
                    returns.is_none(),
                    if block_ref.rest { Some("rest".to_string()) } else { None },
                );
                if let crate::types::TypeData::Block(block) = &*self.db.types.get(block_id) {
                    block.arguments.insert("self", scope.self_type, false);
                    for (index, parameter) in block_ref.parameters.iter().enumerate() {
                        let pty = self.resolve_type_ref(parameter, scope, mctx);
                        block.arguments.insert(format!("arg{index}"), pty, false);
                    }
                }
                block_id
            }
            TypeRef::Named { path, arguments, span } => {
                let resolved = self.resolve_named_type(path, span, scope, mctx);
                if !arguments.is_empty() {
                    self.bind_type_arguments(resolved, arguments, scope, mctx);
                }
                resolved
            }
        }
    }

    /// `Array[Integer]`-style generic arguments: resolve each argument
    /// and bind it to the resolved type's own parameter names, in
    /// declaration order, the same table `instantiate_call` later reads
    /// from (spec section 4.1, parameter instantiation).
    fn bind_type_arguments(&self, resolved: TypeId, arguments: &[TypeRef], scope: &TypeScope, mctx: &ModuleCtx) {
        let binding = self.db.types.get(resolved);
        let Some(object) = binding.as_object_like() else {
            return;
        };
        let names = object.type_parameters.names();
        for (name, argument) in names.iter().zip(arguments.iter()) {
            let bound = self.resolve_type_ref(argument, scope, mctx);
            object.type_parameter_instances.borrow_mut().insert(name.clone(), bound);
        }
    }

    fn resolve_named_type(&self, path: &[String], span: &crate::ast::Span, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let Some(head) = path.first() else {
            return self.db.types.dynamic;
        };

        let mut current = self.resolve_name_head(head, scope, mctx);
        if current.is_none() {
            self.diag(DiagnosticKind::UndefinedConstant { name: head.clone() }, span.clone());
            return self.db.types.dynamic;
        }

        for segment in &path[1..] {
            let found = current.and_then(|ty| self.db.types.lookup_attribute(ty, segment));
            match found {
                Some(symbol) => current = Some(symbol.type_id),
                None => {
                    self.diag(DiagnosticKind::UndefinedConstant { name: segment.clone() }, span.clone());
                    return self.db.types.dynamic;
                }
            }
        }

        current.unwrap_or(self.db.types.dynamic)
    }

    fn resolve_name_head(&self, name: &str, scope: &TypeScope, mctx: &ModuleCtx) -> Option<TypeId> {
        match name {
            "Integer" => return Some(self.db.integer_type),
            "Float" => return Some(self.db.float_type),
            "String" => return Some(self.db.string_type),
            "Array" => return Some(self.db.array_type),
            "Block" => return Some(self.db.block_type),
            "Trait" => return Some(self.db.trait_type),
            "Object" => return Some(self.db.object_type),
            "Nil" => return Some(self.db.nil_type),
            "True" => return Some(self.db.true_type),
            "False" => return Some(self.db.false_type),
            "Void" => return Some(self.db.void_type),
            crate::config::MODULE_PROTOTYPE_ATTRIBUTE => return Some(self.db.module_prototype),
            _ => {}
        }

        if let Some(object) = self.db.types.get(scope.self_type).as_object_like() {
            if let Some(symbol) = object.type_parameters.get_local(name) {
                return Some(symbol.type_id);
            }
            if let Some(symbol) = object.attributes.get_local(name) {
                return Some(symbol.type_id);
            }
        }

        mctx.globals.lookup(name).map(|s| s.type_id)
    }

    pub(super) fn check_attribute(&self, node: &AttributeNode, scope: &TypeScope) -> TypeId {
        let ty = match self.db.types.lookup_attribute(scope.self_type, &node.name) {
            Some(symbol) => symbol.type_id,
            None => {
                self.diag(DiagnosticKind::UndefinedAttribute { name: node.name.clone() }, node.span.clone());
                self.db.types.dynamic
            }
        };
        node.type_slot.set(ty);
        ty
    }

    pub(super) fn check_constant(&self, node: &ConstantNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        let ty = self.resolve_named_type(&node.path, &node.span, scope, mctx);
        node.type_slot.set(ty);
        ty
    }

    /// Local, then a zero-argument send on `self`, then a zero-argument
    /// send on the module, then a module global -- the full fallback
    /// chain for a bare identifier (spec section 4.6).
    pub(super) fn check_identifier(&self, node: &IdentifierNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        if let Some(symbol) = scope.locals.lookup(&node.name) {
            node.type_slot.set(symbol.type_id);
            return symbol.type_id;
        }

        if let Some(ty) = self.zero_arg_send_return(scope.self_type, &node.name, mctx) {
            node.type_slot.set(ty);
            return ty;
        }

        if scope.self_type != mctx.module_type {
            if let Some(ty) = self.zero_arg_send_return(mctx.module_type, &node.name, mctx) {
                node.type_slot.set(ty);
                return ty;
            }
        }

        if let Some(symbol) = mctx.globals.lookup(&node.name) {
            node.type_slot.set(symbol.type_id);
            return symbol.type_id;
        }

        self.diag(DiagnosticKind::UndefinedLocal { name: node.name.clone() }, node.span.clone());
        node.type_slot.set(self.db.types.dynamic);
        self.db.types.dynamic
    }

    fn zero_arg_send_return(&self, receiver: TypeId, name: &str, mctx: &ModuleCtx) -> Option<TypeId> {
        let symbol = self.db.types.lookup_method(receiver, name)?;
        if self.db.types.get(symbol.type_id).as_block().is_some() {
            let signature = self.db.types.instantiate_call(receiver, symbol.type_id, &[], mctx.module_type);
            Some(signature.return_type)
        } else {
            Some(symbol.type_id)
        }
    }

    pub(super) fn check_global(&self, node: &GlobalNode, mctx: &ModuleCtx) -> TypeId {
        let ty = match mctx.globals.lookup(&node.name) {
            Some(symbol) => symbol.type_id,
            None => {
                self.diag(DiagnosticKind::UndefinedLocal { name: node.name.clone() }, node.span.clone());
                self.db.types.dynamic
            }
        };
        node.type_slot.set(ty);
        ty
    }

    pub(super) fn check_raw_instruction(&self, node: &RawInstructionNode, scope: &TypeScope, mctx: &ModuleCtx) -> TypeId {
        for argument in &node.arguments {
            self.check_node(argument, scope, mctx);
        }

        let ty = match instructions::instruction_result_type(self.db, &node.opcode) {
            Ok(ty) => ty,
            Err(kind) => {
                self.diag(kind, node.span.clone());
                instructions::unknown_instruction_fallback(self.db)
            }
        };
        node.type_slot.set(ty);
        ty
    }
}
