//! Expression lowering

use super::{storage_operand, zero, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{ArithOp, BranchTarget, Condition, Op, Operand};
use crate::symbols::Storage;
use pico_parser::{BinaryOp, NodeId, PrimitiveType, UnaryOp};

impl Lowerer<'_> {
    pub(super) fn lower_identifier(&mut self, id: NodeId) -> CompileResult<()> {
        let symbol = self.symbol(id)?;
        let operand = storage_operand(symbol)?;
        let comment = matches!(symbol.storage, Storage::Stack(_))
            .then(|| format!("load {}", symbol.source_name));

        let load = self.program.append(Op::Load, operand);
        self.program.get_mut(load).comment = comment;
        Ok(())
    }

    pub(super) fn lower_binary(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    ) -> CompileResult<()> {
        if op == BinaryOp::Assign {
            return self.lower_assignment(left, right);
        }
        if let Some(cond) = Condition::from_comparison(op) {
            let operand_ty = self.ty(left)?.promote(self.ty(right)?);
            self.lower_operands(left, right, operand_ty)?;
            self.program
                .append(Op::Arith(ArithOp::Sub, operand_ty), Operand::None);
            self.program.append(Op::Pop, Operand::None);
            self.lower_truth_value(cond);
            return Ok(());
        }

        let arith = ArithOp::from_binary(op).ok_or_else(|| {
            CompileError::internal(format!("no instruction for operator '{}'", op.symbol()))
        })?;
        let ty = self.ty(id)?;
        self.lower_operands(left, right, ty)?;
        self.program.append(Op::Arith(arith, ty), Operand::None);
        Ok(())
    }

    /// Push both operands, each converted to `ty` right after it is computed.
    fn lower_operands(
        &mut self,
        left: NodeId,
        right: NodeId,
        ty: PrimitiveType,
    ) -> CompileResult<()> {
        self.lower_value(left)?;
        self.convert(self.ty(left)?, ty);
        self.depth += 1;
        self.lower_value(right)?;
        self.depth -= 1;
        self.convert(self.ty(right)?, ty);
        Ok(())
    }

    /// Push 1 if the last popped value satisfies `cond`, else 0.
    ///
    /// ```text
    ///     Jcc  T
    ///     LOAD32 0
    ///     JMP  E
    /// T:  LOAD32 1
    /// E:  NOP
    /// ```
    pub(super) fn lower_truth_value(&mut self, cond: Condition) {
        let load_true = self.program.alloc(Op::Load, Operand::int(1));
        let end = self.program.alloc(Op::Nop, Operand::None);

        self.program
            .append_jump(cond, BranchTarget::Instr(load_true));
        self.program.append(Op::Load, Operand::int(0));
        self.program
            .append_jump(Condition::Always, BranchTarget::Instr(end));
        self.program.link(load_true);
        self.program.link(end);
    }

    fn lower_assignment(&mut self, left: NodeId, right: NodeId) -> CompileResult<()> {
        let symbol = self.symbol(left)?;
        let operand = storage_operand(symbol)?;
        let name = symbol.source_name.clone();
        let target_ty = self.ty(left)?;

        self.lower_value(right)?;
        self.convert(self.ty(right)?, target_ty);

        let store = self.program.append(Op::Store, operand.clone());
        self.program.get_mut(store).comment = Some(format!("store {}", name));
        let load = self.program.append(Op::Load, operand);
        self.program.get_mut(load).comment = Some(format!("load {}", name));
        Ok(())
    }

    pub(super) fn lower_unary(
        &mut self,
        id: NodeId,
        op: UnaryOp,
        operand: NodeId,
    ) -> CompileResult<()> {
        match op {
            UnaryOp::Plus => self.lower_value(operand),
            UnaryOp::Minus => {
                let ty = self.ty(id)?;
                self.program.append(Op::Load, zero(ty));
                self.depth += 1;
                self.lower_value(operand)?;
                self.depth -= 1;
                self.program.append(Op::Arith(ArithOp::Sub, ty), Operand::None);
                Ok(())
            }
            UnaryOp::Not => {
                self.lower_value(operand)?;
                self.program.append(Op::Pop, Operand::None);
                self.lower_truth_value(Condition::Equal);
                Ok(())
            }
        }
    }

    /// Push the return slot and the arguments right to left, call, then drop
    /// the arguments so only the return slot remains.
    pub(super) fn lower_call(&mut self, id: NodeId, args: &[NodeId]) -> CompileResult<()> {
        let callee = self.symbol(id)?.emitted_name.clone();

        let slot = self.program.append(Op::Load, Operand::int(0));
        self.program.get_mut(slot).comment = Some("return slot".to_string());
        let base = self.depth;
        self.depth += 1;
        for &arg in args.iter().rev() {
            self.lower_value(arg)?;
            self.depth += 1;
        }
        self.depth = base;
        self.program.append(Op::Call, Operand::Label(callee));
        for _ in args {
            self.program.append(Op::Pop, Operand::None);
        }
        Ok(())
    }
}
