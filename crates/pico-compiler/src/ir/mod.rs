//! Intermediate Representation
//!
//! A program is one singly linked list of stack-machine instructions stored
//! in an arena. Instructions can be allocated before they are linked, which
//! is how forward branch targets are created: the lowering pass allocates a
//! placeholder, points jumps at it, and links it once the code in between has
//! been appended.

mod instr;

pub use instr::{ArithOp, BranchTarget, Condition, Instr, InstrId, Op, Operand};

/// Instruction list of one compilation
#[derive(Debug, Clone, Default)]
pub struct IrProgram {
    instrs: Vec<Instr>,
    head: Option<InstrId>,
    tail: Option<InstrId>,
}

impl IrProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an instruction without linking it into the list.
    pub fn alloc(&mut self, op: Op, operand: Operand) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        self.instrs.push(Instr::new(op, operand));
        id
    }

    /// Link a previously allocated instruction at the end of the list.
    pub fn link(&mut self, id: InstrId) {
        self.instrs[id.index()].next = None;
        match self.tail {
            Some(tail) => self.instrs[tail.index()].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Allocate and link an instruction, returning its handle.
    pub fn append(&mut self, op: Op, operand: Operand) -> InstrId {
        let id = self.alloc(op, operand);
        self.link(id);
        id
    }

    /// Append a jump.
    pub fn append_jump(&mut self, cond: Condition, target: BranchTarget) -> InstrId {
        let id = self.append(Op::Jump(cond), Operand::None);
        self.instrs[id.index()].target = Some(target);
        id
    }

    #[inline]
    pub fn get(&self, id: InstrId) -> &Instr {
        &self.instrs[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: InstrId) -> &mut Instr {
        &mut self.instrs[id.index()]
    }

    pub fn head(&self) -> Option<InstrId> {
        self.head
    }

    pub fn tail(&self) -> Option<InstrId> {
        self.tail
    }

    #[inline]
    pub fn next(&self, id: InstrId) -> Option<InstrId> {
        self.instrs[id.index()].next
    }

    /// Linked instructions in list order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            program: self,
            next: self.head,
        }
    }

    /// Linked instructions starting at `from`.
    pub fn iter_from(&self, from: InstrId) -> Iter<'_> {
        Iter {
            program: self,
            next: Some(from),
        }
    }

    /// Number of linked instructions.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Point every return-sentinel jump at or after `from` to `epilogue`.
    pub fn resolve_returns(&mut self, from: InstrId, epilogue: InstrId) {
        let ids: Vec<InstrId> = self.iter_from(from).collect();
        for id in ids {
            let instr = &mut self.instrs[id.index()];
            if instr.target == Some(BranchTarget::Return) {
                instr.target = Some(BranchTarget::Instr(epilogue));
            }
        }
    }

    /// Replace the list with `order`, relinking in sequence.
    pub(crate) fn relink(&mut self, order: &[InstrId]) {
        self.head = None;
        self.tail = None;
        for &id in order {
            self.link(id);
        }
    }
}

/// Iterator over linked instruction ids
pub struct Iter<'a> {
    program: &'a IrProgram,
    next: Option<InstrId>,
}

impl Iterator for Iter<'_> {
    type Item = InstrId;

    fn next(&mut self) -> Option<InstrId> {
        let current = self.next?;
        self.next = self.program.next(current);
        Some(current)
    }
}
