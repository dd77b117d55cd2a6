//! Name resolution, type inference and monomorphization
//!
//! Inference runs in rounds over the whole program. A round rebuilds every
//! scope and symbol from scratch, annotates each reachable node with its
//! primitive type and resolved symbol, and infers every function instance the
//! round reaches through a worklist. Instances and their recorded return types
//! survive between rounds; a call to an instance whose body has not been
//! inferred yet is assumed to return an integer. Rounds repeat until no
//! instance's return type changes.

mod monomorphize;

pub use monomorphize::{decorate, Instance, Instantiations};

use crate::context::CompilerContext;
use crate::error::{CompileError, CompileResult, SemanticErrorKind};
use crate::symbols::{Scope, Storage, Symbol};
use pico_parser::{BinaryOp, NodeId, NodeKind, PrimitiveType, SymbolId, UnaryOp};
use tracing::{debug, debug_span, trace};

/// Run inference rounds until the return types of all instances are stable.
pub fn infer_types(ctx: &mut CompilerContext) -> CompileResult<()> {
    let _span = debug_span!("infer", file = %ctx.file_name).entered();
    let root = ctx.root()?;

    let mut round = 0usize;
    loop {
        round += 1;
        let changed = TypeInferrer::new(ctx).run_round(root)?;
        debug!(
            round,
            instances = ctx.instances.len(),
            changed,
            "inference round finished"
        );
        if !changed {
            return Ok(());
        }
        if round > 2 * ctx.instances.len() + 2 {
            return Err(CompileError::internal(
                "function return types did not converge",
            ));
        }
    }
}

/// Look up the prototype name and parameters of a function definition.
pub fn prototype_of(ctx: &CompilerContext, def: NodeId) -> CompileResult<(NodeId, String, Vec<String>)> {
    let NodeKind::FunctionDef { prototype, .. } = *ctx.ast.kind(def) else {
        return Err(CompileError::internal(format!(
            "expected a function definition, found {}",
            ctx.ast.kind(def).name()
        )));
    };
    match ctx.ast.kind(prototype) {
        NodeKind::Prototype { name, params } => Ok((prototype, name.clone(), params.clone())),
        other => Err(CompileError::internal(format!(
            "expected a prototype, found {}",
            other.name()
        ))),
    }
}

/// One inference round.
struct TypeInferrer<'a> {
    ctx: &'a mut CompilerContext,
    changed: bool,
}

impl<'a> TypeInferrer<'a> {
    fn new(ctx: &'a mut CompilerContext) -> Self {
        Self {
            ctx,
            changed: false,
        }
    }

    fn run_round(mut self, root: NodeId) -> CompileResult<bool> {
        self.ctx.symbols.clear();
        self.ctx.scopes.clear();
        self.ctx.counters.reset_temps();
        self.ctx.instances.begin_round();
        self.ctx.scopes.insert(root, Scope::global());

        self.declare_functions(root)?;
        self.visit(root)?;

        while let Some(name) = self.ctx.instances.next_pending() {
            self.infer_instance(&name)?;
        }
        Ok(self.changed)
    }

    /// Hoist every top-level definition into the global scope.
    fn declare_functions(&mut self, root: NodeId) -> CompileResult<()> {
        let NodeKind::CompilationUnit(items) = self.ctx.ast.kind(root).clone() else {
            return Err(CompileError::internal("root is not a compilation unit"));
        };

        for item in items {
            if !matches!(self.ctx.ast.kind(item), NodeKind::FunctionDef { .. }) {
                continue;
            }
            let (prototype, name, _) = prototype_of(self.ctx, item)?;
            if self.global_scope(root)?.contains(&name) {
                return Err(self.ctx.semantic_error(
                    SemanticErrorKind::DuplicateDefinition(name),
                    self.ctx.ast.span(prototype),
                ));
            }
            let symbol = self.ctx.symbols.add(Symbol::function(&name, item));
            self.global_scope(root)?.bind(&name, symbol);
        }
        Ok(())
    }

    fn global_scope(&mut self, root: NodeId) -> CompileResult<&mut Scope> {
        self.ctx
            .scopes
            .get_mut(&root)
            .ok_or_else(|| CompileError::internal("global scope missing"))
    }

    fn visit(&mut self, id: NodeId) -> CompileResult<PrimitiveType> {
        let ty = match self.ctx.ast.kind(id).clone() {
            NodeKind::Literal(value) => value.ty(),
            NodeKind::Identifier(name) => self.visit_identifier(id, &name)?,
            NodeKind::Binary {
                op: BinaryOp::Assign,
                left,
                right,
            } => self.visit_assignment(id, left, right)?,
            NodeKind::Binary { op, left, right } => {
                let lhs = self.visit(left)?;
                let rhs = self.visit(right)?;
                if op.is_comparison() {
                    PrimitiveType::Int
                } else {
                    lhs.promote(rhs)
                }
            }
            NodeKind::Unary { op, operand } => {
                let ty = self.visit(operand)?;
                match op {
                    UnaryOp::Not => PrimitiveType::Int,
                    UnaryOp::Plus | UnaryOp::Minus => ty,
                }
            }
            NodeKind::Call { callee, args } => self.visit_call(id, callee, &args)?,
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit(condition)?;
                let ty = self.visit(then_branch)?;
                // Branches that disagree meet at float
                match else_branch {
                    Some(else_branch) => ty.promote(self.visit(else_branch)?),
                    None => ty,
                }
            }
            NodeKind::While { condition, body } => {
                self.visit(condition)?;
                self.visit(body)?;
                PrimitiveType::Int
            }
            NodeKind::Return { value } => self.visit(value)?,
            NodeKind::StatementList(items) => self.visit_list(&items)?,
            NodeKind::CompilationUnit(items) => {
                // Definitions are inferred per instance, on demand
                for item in items {
                    if !matches!(self.ctx.ast.kind(item), NodeKind::FunctionDef { .. }) {
                        self.visit(item)?;
                    }
                }
                PrimitiveType::Int
            }
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::InlineAsm(_)
            | NodeKind::Nop
            | NodeKind::FunctionDef { .. }
            | NodeKind::Prototype { .. } => PrimitiveType::Int,
        };

        self.ctx.ast.node_mut(id).resolved_type = Some(ty);
        Ok(ty)
    }

    fn visit_list(&mut self, items: &[NodeId]) -> CompileResult<PrimitiveType> {
        let mut ty = PrimitiveType::Int;
        for &item in items {
            let item_ty = self.visit(item)?;
            ty = if self.ctx.ast.kind(item).produces_value() {
                item_ty
            } else {
                PrimitiveType::Int
            };
        }
        Ok(ty)
    }

    fn visit_identifier(&mut self, id: NodeId, name: &str) -> CompileResult<PrimitiveType> {
        let Some(symbol) = self.ctx.lookup(id, name) else {
            return Err(self.ctx.semantic_error(
                SemanticErrorKind::UnknownIdentifier(name.to_string()),
                self.ctx.ast.span(id),
            ));
        };
        let entry = self.ctx.symbols.get(symbol);
        if entry.is_function() {
            return Err(self.ctx.semantic_error(
                SemanticErrorKind::NotAValue(name.to_string()),
                self.ctx.ast.span(id),
            ));
        }
        let ty = entry.ty.unwrap_or(PrimitiveType::Int);
        self.ctx.ast.node_mut(id).resolved_symbol = Some(symbol);
        Ok(ty)
    }

    /// The first assignment to a name declares it with the type of the value.
    fn visit_assignment(
        &mut self,
        id: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> CompileResult<PrimitiveType> {
        let NodeKind::Identifier(name) = self.ctx.ast.kind(left).clone() else {
            return Err(self.ctx.semantic_error(
                SemanticErrorKind::AssignToNonIdentifier,
                self.ctx.ast.span(left),
            ));
        };

        let value_ty = self.visit(right)?;
        let symbol = match self.ctx.lookup(id, &name) {
            Some(symbol) if self.ctx.symbols.get(symbol).is_function() => {
                return Err(self.ctx.semantic_error(
                    SemanticErrorKind::NotAValue(name),
                    self.ctx.ast.span(left),
                ));
            }
            Some(symbol) => symbol,
            None => self.declare_variable(id, &name, value_ty)?,
        };

        let ty = self.ctx.symbols.get(symbol).ty.unwrap_or(value_ty);
        let target = self.ctx.ast.node_mut(left);
        target.resolved_symbol = Some(symbol);
        target.resolved_type = Some(ty);
        Ok(ty)
    }

    /// Declare `name` in the scope that owns `at`.
    fn declare_variable(
        &mut self,
        at: NodeId,
        name: &str,
        ty: PrimitiveType,
    ) -> CompileResult<SymbolId> {
        let owner = self
            .ctx
            .scope_owner(at)
            .ok_or_else(|| CompileError::internal(format!("no scope encloses '{}'", name)))?;
        let ctx = &mut *self.ctx;
        let scope = ctx
            .scopes
            .get_mut(&owner)
            .ok_or_else(|| CompileError::internal("scope owner without a scope"))?;

        let symbol = if scope.is_global() {
            let emitted = ctx.counters.fresh_global(name);
            Symbol::variable(name, emitted.clone(), ty, Storage::Global(emitted))
        } else {
            let offset = scope.allocate_local();
            let emitted = ctx.counters.fresh_local(name);
            Symbol::variable(name, emitted, ty, Storage::Stack(offset))
        };
        trace!(name, emitted = %symbol.emitted_name, ?ty, "declared variable");

        let id = ctx.symbols.add(symbol);
        scope.bind(name, id);
        Ok(id)
    }

    fn visit_call(
        &mut self,
        id: NodeId,
        callee: NodeId,
        args: &[NodeId],
    ) -> CompileResult<PrimitiveType> {
        let NodeKind::Identifier(base) = self.ctx.ast.kind(callee).clone() else {
            let kind = self.ctx.ast.kind(callee).name().to_string();
            return Err(self
                .ctx
                .semantic_error(SemanticErrorKind::NotCallable(kind), self.ctx.ast.span(callee)));
        };

        let mut arg_types = Vec::with_capacity(args.len());
        for &arg in args {
            arg_types.push(self.visit(arg)?);
        }

        let Some(template_symbol) = self.ctx.lookup(id, &base) else {
            return Err(self.ctx.semantic_error(
                SemanticErrorKind::UnknownIdentifier(base),
                self.ctx.ast.span(callee),
            ));
        };
        let Some(template) = self.ctx.symbols.get(template_symbol).function else {
            return Err(self.ctx.semantic_error(
                SemanticErrorKind::NotCallable(base),
                self.ctx.ast.span(callee),
            ));
        };
        self.ctx.ast.node_mut(callee).resolved_symbol = Some(template_symbol);

        let (_, _, params) = prototype_of(self.ctx, template)?;
        if params.len() != args.len() {
            return Err(self.ctx.semantic_error(
                SemanticErrorKind::ArityMismatch {
                    name: base,
                    expected: params.len(),
                    found: args.len(),
                },
                self.ctx.ast.span(id),
            ));
        }

        let name = decorate(&base, &arg_types);
        let symbol = match self.ctx.lookup(id, &name) {
            Some(symbol) => symbol,
            None => self.instantiate(template, &base, &name, arg_types)?,
        };
        self.ctx.symbols.get_mut(symbol).used = true;
        self.ctx.ast.node_mut(id).resolved_symbol = Some(symbol);

        Ok(self.ctx.instances.return_type(&name))
    }

    /// Bind the instance `name` in the global scope, cloning the template the
    /// first time the name is seen, and queue it for inference.
    fn instantiate(
        &mut self,
        template: NodeId,
        base: &str,
        name: &str,
        arg_types: Vec<PrimitiveType>,
    ) -> CompileResult<SymbolId> {
        let definition = match self.ctx.instances.get(name) {
            Some(instance) => instance.definition,
            None => {
                let clone = self.ctx.ast.clone_subtree(template);
                let (prototype, _, _) = prototype_of(self.ctx, clone)?;
                if let NodeKind::Prototype { name: proto_name, .. } =
                    &mut self.ctx.ast.node_mut(prototype).kind
                {
                    *proto_name = name.to_string();
                }
                let parent = self.ctx.ast.enclosing(template);
                self.ctx.ast.link_parents(clone, parent);

                debug!(instance = name, template = base, "instantiated function");
                self.ctx.instances.insert(Instance {
                    name: name.to_string(),
                    base: base.to_string(),
                    definition: clone,
                    arg_types,
                });
                clone
            }
        };

        let root = self.ctx.root()?;
        let symbol = self.ctx.symbols.add(Symbol::function(name, definition));
        self.global_scope(root)?.bind(name, symbol);
        self.ctx.instances.enqueue(name);
        Ok(symbol)
    }

    fn infer_instance(&mut self, name: &str) -> CompileResult<()> {
        let Some(instance) = self.ctx.instances.get(name).cloned() else {
            return Err(CompileError::internal(format!("unknown instance '{}'", name)));
        };
        let definition = instance.definition;
        let (prototype, _, params) = prototype_of(self.ctx, definition)?;
        let NodeKind::FunctionDef { body, .. } = *self.ctx.ast.kind(definition) else {
            return Err(CompileError::internal("instance is not a function definition"));
        };

        let mut scope = Scope::function();
        for (param, &ty) in params.iter().zip(&instance.arg_types) {
            if scope.contains(param) {
                return Err(self.ctx.semantic_error(
                    SemanticErrorKind::DuplicateDefinition(param.clone()),
                    self.ctx.ast.span(prototype),
                ));
            }
            let offset = scope.allocate_param();
            let emitted = self.ctx.counters.fresh_local(param);
            let symbol = self
                .ctx
                .symbols
                .add(Symbol::variable(param, emitted, ty, Storage::Stack(offset)));
            scope.bind(param, symbol);
        }
        self.ctx.scopes.insert(definition, scope);

        let body_ty = self.visit(body)?;
        self.ctx.ast.node_mut(definition).resolved_type = Some(body_ty);

        let root = self.ctx.root()?;
        if let Some(symbol) = self.global_scope(root)?.lookup(name) {
            self.ctx.symbols.get_mut(symbol).ty = Some(body_ty);
        }
        if self.ctx.instances.record_return_type(name, body_ty) {
            debug!(instance = name, ?body_ty, "return type changed");
            self.changed = true;
        }
        Ok(())
    }
}
