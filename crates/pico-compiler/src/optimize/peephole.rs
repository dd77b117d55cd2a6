//! Peephole rules
//!
//! One pass walks the list once and applies at most one rule per anchor
//! instruction. Rules only ever turn instructions into no-ops or rewrite them
//! in place, so the walk order stays valid for the whole pass. An
//! instruction that other branches target is never folded into the
//! instruction before it.

use super::OptStats;
use crate::ir::{BranchTarget, Condition, InstrId, IrProgram, Op, Operand};
use rustc_hash::FxHashMap;

/// Run one pass over `program`. Returns the number of rewrites.
pub fn run_pass(program: &mut IrProgram, stats: &mut OptStats) -> usize {
    let mut pass = Pass {
        refs: reference_counts(program),
        rewrites: 0,
    };

    let order: Vec<InstrId> = program.iter().collect();
    for id in order {
        if program.get(id).op.is_nop() {
            continue;
        }
        pass.apply(program, id, stats);
    }
    pass.rewrites
}

/// Number of branches targeting each instruction.
fn reference_counts(program: &IrProgram) -> FxHashMap<InstrId, u32> {
    let mut refs = FxHashMap::default();
    for id in program.iter() {
        if let Some(BranchTarget::Instr(target)) = program.get(id).target {
            *refs.entry(target).or_insert(0) += 1;
        }
    }
    refs
}

struct Pass {
    refs: FxHashMap<InstrId, u32>,
    rewrites: usize,
}

impl Pass {
    fn apply(&mut self, p: &mut IrProgram, id: InstrId, stats: &mut OptStats) {
        if self.comparison_jump(p, id) {
            stats.comparison_jumps += 1;
        } else if self.jump_to_next(p, id) {
            stats.jumps_to_next += 1;
        } else if self.constant_jump(p, id) {
            stats.constant_jumps += 1;
        } else if self.dead_pair(p, id) {
            stats.dead_pairs += 1;
        } else if self.float_literal(p, id) {
            stats.float_literals += 1;
        } else if self.duplicate_load(p, id) {
            stats.duplicate_loads += 1;
        } else {
            return;
        }
        self.rewrites += 1;
    }

    fn is_target(&self, id: InstrId) -> bool {
        self.refs.get(&id).is_some_and(|&n| n > 0)
    }

    fn ref_count(&self, id: InstrId) -> u32 {
        self.refs.get(&id).copied().unwrap_or(0)
    }

    fn release(&mut self, target: Option<BranchTarget>) {
        if let Some(BranchTarget::Instr(target)) = target {
            if let Some(n) = self.refs.get_mut(&target) {
                *n = n.saturating_sub(1);
            }
        }
    }

    /// Next instruction that is not a branch target.
    fn next_plain(&self, p: &IrProgram, id: InstrId) -> Option<InstrId> {
        p.next(id).filter(|&next| !self.is_target(next))
    }

    /// `LOAD x; LOAD x` → `LOAD x; DUP`
    fn duplicate_load(&mut self, p: &mut IrProgram, id: InstrId) -> bool {
        let Some(next) = self.next_plain(p, id) else {
            return false;
        };
        let (first, second) = (p.get(id), p.get(next));
        if first.op != Op::Load || second.op != Op::Load || first.operand != second.operand {
            return false;
        }

        let dup = p.get_mut(next);
        dup.op = Op::Dup;
        dup.operand = Operand::None;
        dup.comment = None;
        true
    }

    /// `LOAD x; POP` → nothing, unless the pop feeds a conditional jump.
    fn dead_pair(&mut self, p: &mut IrProgram, id: InstrId) -> bool {
        if !matches!(p.get(id).op, Op::Load | Op::Dup) {
            return false;
        }
        let Some(pop) = self.next_plain(p, id) else {
            return false;
        };
        if p.get(pop).op != Op::Pop {
            return false;
        }
        if let Some(after) = next_live(p, pop) {
            if matches!(p.get(after).op, Op::Jump(cond) if cond.is_conditional()) {
                return false;
            }
        }

        make_nop(p, id);
        make_nop(p, pop);
        true
    }

    /// `LOAD n; POP; Jcc X` → `JMP X` if `n` satisfies the condition, else nothing.
    fn constant_jump(&mut self, p: &mut IrProgram, id: InstrId) -> bool {
        let Some(value) = load_int(p, id) else {
            return false;
        };
        let Some(pop) = self.next_plain(p, id) else {
            return false;
        };
        let Some(jump) = self.next_plain(p, pop) else {
            return false;
        };
        if p.get(pop).op != Op::Pop {
            return false;
        }
        let Op::Jump(cond) = p.get(jump).op else {
            return false;
        };
        if !cond.is_conditional() {
            return false;
        }

        let target = p.get(jump).target;
        if cond.holds(value) {
            let instr = p.get_mut(id);
            instr.op = Op::Jump(Condition::Always);
            instr.operand = Operand::None;
            instr.comment = None;
            instr.target = target;
        } else {
            self.release(target);
            make_nop(p, id);
        }
        make_nop(p, pop);
        make_nop(p, jump);
        true
    }

    /// `LOAD int n; CONVF` → `LOAD float(n)`
    fn float_literal(&mut self, p: &mut IrProgram, id: InstrId) -> bool {
        let Some(value) = load_int(p, id) else {
            return false;
        };
        let Some(convert) = self.next_plain(p, id) else {
            return false;
        };
        if p.get(convert).op != Op::ConvertToFloat {
            return false;
        }

        let instr = p.get_mut(id);
        instr.operand = Operand::float(value as f32);
        instr.comment = None;
        make_nop(p, convert);
        true
    }

    /// Collapse a comparison whose 0/1 result is immediately tested:
    ///
    /// ```text
    ///     Jcc  T              J(!cc) X   for JEQ X
    ///     LOAD32 0            Jcc    X   for JNE X
    ///     JMP  E
    /// T:  LOAD32 1
    /// E:  POP32
    ///     JEQ/JNE X
    /// ```
    ///
    /// This is the jump/load/jump/load/pop/conditional-jump pattern around
    /// the unconditional `JMP E`, matched from the `Jcc` that starts it.
    fn comparison_jump(&mut self, p: &mut IrProgram, id: InstrId) -> bool {
        let Op::Jump(cc) = p.get(id).op else {
            return false;
        };
        let Some(BranchTarget::Instr(load_true)) = p.get(id).target else {
            return false;
        };
        if !cc.is_conditional() {
            return false;
        }

        let Some(load_false) = self.next_plain(p, id) else {
            return false;
        };
        let Some(skip) = self.next_plain(p, load_false) else {
            return false;
        };
        if load_int(p, load_false) != Some(0) || p.get(skip).op != Op::Jump(Condition::Always) {
            return false;
        }
        let Some(BranchTarget::Instr(end)) = p.get(skip).target else {
            return false;
        };

        if p.next(skip) != Some(load_true)
            || load_int(p, load_true) != Some(1)
            || self.ref_count(load_true) != 1
        {
            return false;
        }
        if p.next(load_true) != Some(end) || p.get(end).op != Op::Pop || self.ref_count(end) != 1 {
            return false;
        }
        let Some(test) = self.next_plain(p, end) else {
            return false;
        };
        let cond = match p.get(test).op {
            Op::Jump(Condition::Equal) => cc.negate(),
            Op::Jump(Condition::NotEqual) => cc,
            _ => return false,
        };

        let target = p.get(test).target;
        let instr = p.get_mut(id);
        instr.op = Op::Jump(cond);
        instr.target = target;
        self.release(Some(BranchTarget::Instr(load_true)));
        self.release(Some(BranchTarget::Instr(end)));
        for dead in [load_false, skip, load_true, end, test] {
            make_nop(p, dead);
        }
        true
    }

    /// A jump to the instruction right after it, ignoring no-ops.
    fn jump_to_next(&mut self, p: &mut IrProgram, id: InstrId) -> bool {
        if !matches!(p.get(id).op, Op::Jump(_)) {
            return false;
        }
        let Some(BranchTarget::Instr(target)) = p.get(id).target else {
            return false;
        };

        let mut cursor = p.next(id);
        while let Some(current) = cursor {
            if current == target {
                self.release(Some(BranchTarget::Instr(target)));
                make_nop(p, id);
                return true;
            }
            if !p.get(current).op.is_nop() {
                break;
            }
            cursor = p.next(current);
        }
        false
    }
}

fn load_int(p: &IrProgram, id: InstrId) -> Option<i32> {
    let instr = p.get(id);
    if instr.op != Op::Load {
        return None;
    }
    instr.operand.as_int()
}

/// Next instruction that is not a no-op.
fn next_live(p: &IrProgram, id: InstrId) -> Option<InstrId> {
    let mut cursor = p.next(id);
    while let Some(current) = cursor {
        if !p.get(current).op.is_nop() {
            return Some(current);
        }
        cursor = p.next(current);
    }
    None
}

fn make_nop(p: &mut IrProgram, id: InstrId) {
    let instr = p.get_mut(id);
    instr.op = Op::Nop;
    instr.operand = Operand::None;
    instr.target = None;
    instr.comment = None;
}
