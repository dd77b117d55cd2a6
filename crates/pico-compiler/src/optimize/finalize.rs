//! No-op splicing and label assignment

use crate::context::Counters;
use crate::ir::{BranchTarget, InstrId, IrProgram};
use rustc_hash::FxHashMap;

/// Remove every no-op from the list, redirecting branches that targeted one
/// to the next surviving instruction. Returns the number of no-ops removed.
///
/// A trailing no-op with referrers has nothing to redirect to and is kept.
pub fn splice_nops(program: &mut IrProgram) -> usize {
    let order: Vec<InstrId> = program.iter().collect();

    let mut redirect = FxHashMap::default();
    let mut kept = Vec::with_capacity(order.len());
    let mut next_survivor: Option<InstrId> = None;
    for &id in order.iter().rev() {
        if program.get(id).op.is_nop() {
            if let Some(survivor) = next_survivor {
                redirect.insert(id, survivor);
                continue;
            }
        }
        kept.push(id);
        next_survivor = Some(id);
    }
    kept.reverse();

    if redirect.is_empty() {
        return 0;
    }

    for &id in &kept {
        let instr = program.get_mut(id);
        if let Some(BranchTarget::Instr(target)) = instr.target {
            if let Some(&survivor) = redirect.get(&target) {
                instr.target = Some(BranchTarget::Instr(survivor));
            }
        }
    }
    program.relink(&kept);
    redirect.len()
}

/// Give every branch target a label, in order of first reference.
///
/// Existing labels are kept, so running this twice changes nothing.
pub fn assign_labels(program: &mut IrProgram, counters: &mut Counters) -> usize {
    let order: Vec<InstrId> = program.iter().collect();
    let mut assigned = 0;
    for id in order {
        let Some(BranchTarget::Instr(target)) = program.get(id).target else {
            continue;
        };
        let target = program.get_mut(target);
        if target.label.is_none() {
            target.label = Some(counters.fresh_label());
            assigned += 1;
        }
    }
    assigned
}

/// Splice no-ops and label branch targets; always run before emission.
pub fn finalize(program: &mut IrProgram, counters: &mut Counters) {
    let removed = splice_nops(program);
    let labelled = assign_labels(program, counters);
    tracing::debug!(removed, labelled, "finalized instruction list");
}
