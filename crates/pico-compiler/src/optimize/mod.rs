//! IR Optimization Passes
//!
//! The peephole optimizer runs to a fixed point: no-ops are spliced out, one
//! pass of rules runs, and the two repeat until a pass rewrites nothing.
//! [`finalize`] is not an optimization; it always runs before emission.

mod finalize;
mod peephole;

pub use finalize::{assign_labels, finalize, splice_nops};

use crate::ir::IrProgram;
use tracing::{debug, debug_span};

/// Peephole optimizer
#[derive(Debug, Default)]
pub struct Optimizer {
    stats: OptStats,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `program` until no rule applies.
    pub fn optimize(&mut self, program: &mut IrProgram) -> &OptStats {
        let _span = debug_span!("peephole").entered();
        loop {
            self.stats.nops_removed += splice_nops(program);
            let rewrites = peephole::run_pass(program, &mut self.stats);
            self.stats.passes += 1;
            debug!(pass = self.stats.passes, rewrites, "peephole pass");
            if rewrites == 0 {
                break;
            }
        }
        &self.stats
    }

    /// Statistics accumulated over every run of this optimizer
    pub fn stats(&self) -> &OptStats {
        &self.stats
    }
}

/// Statistics about optimizations performed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Passes run, including the final one that changed nothing
    pub passes: usize,
    pub duplicate_loads: usize,
    pub dead_pairs: usize,
    pub constant_jumps: usize,
    pub float_literals: usize,
    pub comparison_jumps: usize,
    pub jumps_to_next: usize,
    pub nops_removed: usize,
}

impl OptStats {
    /// Rule applications across all passes
    pub fn total_rewrites(&self) -> usize {
        self.duplicate_loads
            + self.dead_pairs
            + self.constant_jumps
            + self.float_literals
            + self.comparison_jumps
            + self.jumps_to_next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Counters;
    use crate::ir::{ArithOp, BranchTarget, Condition, Op, Operand};
    use pico_parser::PrimitiveType;

    /// `while x { x = x - 1 }` after lowering
    fn countdown() -> IrProgram {
        let mut p = IrProgram::new();
        let head = p.append(Op::Nop, Operand::None);
        let exit = p.alloc(Op::Nop, Operand::None);
        p.append(Op::Load, Operand::Global("x".into()));
        p.append(Op::Pop, Operand::None);
        p.append_jump(Condition::Equal, BranchTarget::Instr(exit));
        p.append(Op::Load, Operand::Global("x".into()));
        p.append(Op::Load, Operand::int(1));
        p.append(Op::Arith(ArithOp::Sub, PrimitiveType::Int), Operand::None);
        p.append(Op::Store, Operand::Global("x".into()));
        p.append(Op::Load, Operand::Global("x".into()));
        p.append(Op::Pop, Operand::None);
        p.append_jump(Condition::Always, BranchTarget::Instr(head));
        p.link(exit);
        p.append(Op::Load, Operand::int(0));
        p.append(Op::Halt, Operand::None);
        p
    }

    #[test]
    fn test_fixed_point() {
        let mut program = countdown();
        let mut optimizer = Optimizer::new();
        let stats = optimizer.optimize(&mut program).clone();
        assert_eq!(stats.dead_pairs, 1);
        assert_eq!(program.len(), 10);
    }

    #[test]
    fn test_optimizing_finished_program_changes_nothing() {
        let mut counters = Counters::default();
        let mut program = countdown();
        Optimizer::new().optimize(&mut program);
        finalize(&mut program, &mut counters);
        let once = program.clone();

        let stats = Optimizer::new().optimize(&mut program).clone();
        finalize(&mut program, &mut counters);
        assert_eq!(stats.total_rewrites(), 0);
        let before: Vec<_> = once.iter().map(|id| once.get(id).clone()).collect();
        let after: Vec<_> = program.iter().map(|id| program.get(id).clone()).collect();
        assert_eq!(before, after);
    }
}
