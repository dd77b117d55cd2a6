//! Control flow lowering

use super::{zero, LoopTargets, Lowerer};
use crate::error::CompileResult;
use crate::ir::{BranchTarget, Condition, Op, Operand};
use pico_parser::{Literal, NodeId, NodeKind};

impl Lowerer<'_> {
    /// Lower a statement list, keeping only the last value.
    pub(super) fn lower_list(&mut self, items: &[NodeId]) -> CompileResult<()> {
        let Some((&last, rest)) = items.split_last() else {
            self.program.append(Op::Load, Operand::int(0));
            return Ok(());
        };

        for &item in rest {
            self.lower_node(item)?;
            if self.ctx.ast.kind(item).produces_value() {
                self.program.append(Op::Pop, Operand::None);
            }
        }
        self.lower_value(last)
    }

    /// ```text
    ///     <condition>
    ///     POP32
    ///     JEQ  else
    ///     <then, converted to the type of the if>
    ///     JMP  exit
    /// else:
    ///     <else, converted to the type of the if>
    /// exit:
    /// ```
    pub(super) fn lower_if(
        &mut self,
        id: NodeId,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> CompileResult<()> {
        let ty = self.ty(id)?;
        let else_target = self.program.alloc(Op::Nop, Operand::None);
        let exit = self.program.alloc(Op::Nop, Operand::None);

        self.lower_value(condition)?;
        self.program.append(Op::Pop, Operand::None);
        self.program
            .append_jump(Condition::Equal, BranchTarget::Instr(else_target));

        self.lower_value(then_branch)?;
        self.convert(self.ty(then_branch)?, ty);
        self.program
            .append_jump(Condition::Always, BranchTarget::Instr(exit));

        self.program.link(else_target);
        match else_branch {
            Some(else_branch) => {
                self.lower_value(else_branch)?;
                self.convert(self.ty(else_branch)?, ty);
            }
            None => {
                self.program.append(Op::Load, zero(ty));
            }
        }
        self.program.link(exit);
        Ok(())
    }

    /// ```text
    /// loop:
    ///     <condition>        omitted for a non-zero integer literal
    ///     POP32
    ///     JEQ  exit
    ///     <body>
    ///     POP32
    ///     JMP  loop
    /// exit:
    ///     LOAD32 0
    /// ```
    pub(super) fn lower_while(
        &mut self,
        id: NodeId,
        condition: NodeId,
        body: NodeId,
    ) -> CompileResult<()> {
        let head = self.program.append(Op::Nop, Operand::None);
        let exit = self.program.alloc(Op::Nop, Operand::None);
        self.loops.insert(
            id,
            LoopTargets {
                head,
                exit,
                depth: self.depth,
            },
        );

        let always = matches!(
            self.ctx.ast.kind(condition),
            NodeKind::Literal(Literal::Int(n)) if *n != 0
        );
        if !always {
            self.lower_value(condition)?;
            self.program.append(Op::Pop, Operand::None);
            self.program
                .append_jump(Condition::Equal, BranchTarget::Instr(exit));
        }

        self.lower_value(body)?;
        self.program.append(Op::Pop, Operand::None);
        self.program
            .append_jump(Condition::Always, BranchTarget::Instr(head));

        self.program.link(exit);
        self.program.append(Op::Load, Operand::int(0));
        Ok(())
    }

    /// `break` and `continue` jump to the nearest enclosing loop; outside a
    /// loop they do nothing.
    pub(super) fn lower_loop_jump(&mut self, id: NodeId) -> CompileResult<()> {
        let Some(targets) = self
            .ctx
            .ast
            .ancestors(id)
            .find_map(|node| self.loops.get(&node).copied())
        else {
            return Ok(());
        };

        let target = match self.ctx.ast.kind(id) {
            NodeKind::Continue => targets.head,
            _ => targets.exit,
        };
        self.drop_pending(self.depth.saturating_sub(targets.depth));
        self.program
            .append_jump(Condition::Always, BranchTarget::Instr(target));
        Ok(())
    }

    /// Leave the value on the stack and jump to the function epilogue.
    /// Pending operand cells are dropped before the value is pushed.
    pub(super) fn lower_return(&mut self, value: NodeId) -> CompileResult<()> {
        self.drop_pending(self.depth);
        let pending = std::mem::replace(&mut self.depth, 0);
        self.lower_value(value)?;
        self.depth = pending;
        self.program
            .append_jump(Condition::Always, BranchTarget::Return);
        Ok(())
    }
}
