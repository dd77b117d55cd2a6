//! AST to IR Lowering
//!
//! Converts the typed AST into one instruction list: top-level code, `HLT`,
//! then every function instance reached by the final inference round.
//!
//! Stack discipline: lowering a value-producing node leaves exactly one cell
//! on the stack. `break`, `continue`, `return` and inline assembly leave
//! nothing; [`Lowerer::lower_value`] pads them with a zero cell where a
//! value is required. Operand cells still waiting for their consumer are
//! counted in `Lowerer::depth` so a jump out of an expression can drop
//! them first.

mod control;
mod expr;

use crate::context::CompilerContext;
use crate::error::{CompileError, CompileResult};
use crate::infer::{prototype_of, Instance};
use crate::ir::{InstrId, IrProgram, Op, Operand};
use crate::symbols::{Storage, Symbol};
use pico_parser::{Literal, NodeId, NodeKind, PrimitiveType};
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span};

/// Lower a fully inferred compilation unit.
pub fn lower(ctx: &mut CompilerContext) -> CompileResult<IrProgram> {
    let _span = debug_span!("lower", file = %ctx.file_name).entered();
    Lowerer::new(ctx).lower_program()
}

/// Jump targets of an enclosing `while`
#[derive(Debug, Clone, Copy)]
struct LoopTargets {
    head: InstrId,
    exit: InstrId,
    /// Pending operand cells when the loop started
    depth: u32,
}

/// AST to IR lowerer
pub struct Lowerer<'a> {
    ctx: &'a mut CompilerContext,
    program: IrProgram,
    /// Loop targets keyed by `while` node
    loops: FxHashMap<NodeId, LoopTargets>,
    /// Operand cells pushed by enclosing expressions and not yet consumed
    depth: u32,
}

impl<'a> Lowerer<'a> {
    pub fn new(ctx: &'a mut CompilerContext) -> Self {
        Self {
            ctx,
            program: IrProgram::new(),
            loops: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn lower_program(mut self) -> CompileResult<IrProgram> {
        let root = self.ctx.root()?;
        let NodeKind::CompilationUnit(items) = self.ctx.ast.kind(root).clone() else {
            return Err(CompileError::internal("root is not a compilation unit"));
        };
        let statements: Vec<NodeId> = items
            .into_iter()
            .filter(|&item| !matches!(self.ctx.ast.kind(item), NodeKind::FunctionDef { .. }))
            .collect();

        self.lower_list(&statements)?;
        let halt = self.program.append(Op::Halt, Operand::None);
        if let Some(start) = self.program.head() {
            self.program.resolve_returns(start, halt);
        }

        for instance in self.reachable_instances(root)? {
            self.lower_function(root, &instance)?;
        }

        debug!(instructions = self.program.len(), "lowered program");
        Ok(self.program)
    }

    /// Instances bound and called in the final inference round, in creation order.
    fn reachable_instances(&self, root: NodeId) -> CompileResult<Vec<Instance>> {
        let scope = self
            .ctx
            .scopes
            .get(&root)
            .ok_or_else(|| CompileError::internal("global scope missing"))?;
        Ok(self
            .ctx
            .instances
            .iter()
            .filter(|instance| {
                scope
                    .lookup(&instance.name)
                    .is_some_and(|symbol| self.ctx.symbols.get(symbol).used)
            })
            .cloned()
            .collect())
    }

    fn lower_function(&mut self, root: NodeId, instance: &Instance) -> CompileResult<()> {
        let symbol = self
            .ctx
            .scopes
            .get(&root)
            .and_then(|scope| scope.lookup(&instance.name))
            .ok_or_else(|| CompileError::internal(format!("instance '{}' is unbound", instance.name)))?;
        if self.ctx.symbols.get(symbol).emitted {
            return Ok(());
        }
        self.ctx.symbols.get_mut(symbol).emitted = true;

        let definition = instance.definition;
        let (_, _, params) = prototype_of(self.ctx, definition)?;
        let NodeKind::FunctionDef { body, .. } = *self.ctx.ast.kind(definition) else {
            return Err(CompileError::internal("instance is not a function definition"));
        };
        let locals = self
            .ctx
            .scopes
            .get(&definition)
            .map(|scope| scope.local_count())
            .ok_or_else(|| CompileError::internal(format!("'{}' has no scope", instance.name)))?;

        let entry = self
            .program
            .append(Op::Entry(instance.name.clone()), Operand::None);
        for _ in 0..locals {
            self.program.append(Op::Load, Operand::int(0));
        }

        self.depth = 0;
        self.lower_value(body)?;

        let return_slot = 4 + 4 * params.len() as i32;
        let epilogue = self.program.append(Op::Store, Operand::Frame(return_slot));
        self.program.get_mut(epilogue).comment = Some("return value".to_string());
        for _ in 0..locals {
            self.program.append(Op::Pop, Operand::None);
        }
        self.program.append(Op::Ret, Operand::None);
        self.program.resolve_returns(entry, epilogue);

        debug!(function = %instance.name, params = params.len(), locals, "lowered function");
        Ok(())
    }

    /// Lower `id` and guarantee it leaves one cell on the stack.
    fn lower_value(&mut self, id: NodeId) -> CompileResult<()> {
        self.lower_node(id)?;
        if !self.ctx.ast.kind(id).produces_value() {
            self.program.append(Op::Load, Operand::int(0));
        }
        Ok(())
    }

    fn lower_node(&mut self, id: NodeId) -> CompileResult<()> {
        match self.ctx.ast.kind(id).clone() {
            NodeKind::Literal(value) => {
                let operand = match value {
                    Literal::Int(n) => Operand::int(n),
                    Literal::Float(n) => Operand::float(n),
                };
                self.program.append(Op::Load, operand);
            }
            NodeKind::Identifier(_) => self.lower_identifier(id)?,
            NodeKind::Binary { op, left, right } => self.lower_binary(id, op, left, right)?,
            NodeKind::Unary { op, operand } => self.lower_unary(id, op, operand)?,
            NodeKind::Call { args, .. } => self.lower_call(id, &args)?,
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(id, condition, then_branch, else_branch)?,
            NodeKind::While { condition, body } => self.lower_while(id, condition, body)?,
            NodeKind::Break | NodeKind::Continue => self.lower_loop_jump(id)?,
            NodeKind::Return { value } => self.lower_return(value)?,
            NodeKind::StatementList(items) => self.lower_list(&items)?,
            NodeKind::InlineAsm(text) => {
                self.program.append(Op::Asm(text), Operand::None);
            }
            NodeKind::Nop => {
                self.program.append(Op::Load, Operand::int(0));
            }
            NodeKind::FunctionDef { .. } | NodeKind::Prototype { .. } => {}
            NodeKind::CompilationUnit(_) => {
                return Err(CompileError::internal("nested compilation unit"));
            }
        }
        Ok(())
    }

    fn ty(&self, id: NodeId) -> CompileResult<PrimitiveType> {
        self.ctx.ast.node(id).resolved_type.ok_or_else(|| {
            CompileError::internal(format!(
                "{} at {} was never typed",
                self.ctx.ast.kind(id).name(),
                self.ctx.ast.span(id)
            ))
        })
    }

    fn symbol(&self, id: NodeId) -> CompileResult<&Symbol> {
        let symbol = self.ctx.ast.node(id).resolved_symbol.ok_or_else(|| {
            CompileError::internal(format!(
                "{} at {} was never resolved",
                self.ctx.ast.kind(id).name(),
                self.ctx.ast.span(id)
            ))
        })?;
        Ok(self.ctx.symbols.get(symbol))
    }

    /// Drop `count` pending operand cells before a jump that leaves them behind.
    fn drop_pending(&mut self, count: u32) {
        for _ in 0..count {
            self.program.append(Op::Pop, Operand::None);
        }
    }

    /// Push a cell converted from `from` to `to`, if they differ.
    fn convert(&mut self, from: PrimitiveType, to: PrimitiveType) {
        match (from, to) {
            (PrimitiveType::Int, PrimitiveType::Float) => {
                self.program.append(Op::ConvertToFloat, Operand::None);
            }
            (PrimitiveType::Float, PrimitiveType::Int) => {
                self.program.append(Op::ConvertToInt, Operand::None);
            }
            _ => {}
        }
    }
}

/// Operand addressing a variable's storage.
fn storage_operand(symbol: &Symbol) -> CompileResult<Operand> {
    match &symbol.storage {
        Storage::Stack(offset) => Ok(Operand::Frame(*offset)),
        Storage::Global(name) => Ok(Operand::Global(name.clone())),
        Storage::None => Err(CompileError::internal(format!(
            "'{}' has no storage",
            symbol.source_name
        ))),
    }
}

/// Zero cell of the given type.
fn zero(ty: PrimitiveType) -> Operand {
    match ty {
        PrimitiveType::Int => Operand::int(0),
        PrimitiveType::Float => Operand::float(0.0),
    }
}
