//! IR Instructions
//!
//! Abstract stack-machine instructions. Every value is one 32-bit cell; the
//! primitive type of a cell only matters for arithmetic opcode selection and
//! for printing immediates.

use pico_parser::{BinaryOp, PrimitiveType};
use std::fmt;

/// Instruction identifier in an [`super::IrProgram`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(pub(super) u32);

impl InstrId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Where a jump goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchTarget {
    Instr(InstrId),
    /// The epilogue of the enclosing function, patched once it is appended
    Return,
}

/// Jump condition, tested against the value most recently popped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Always,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Condition {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Condition::Always => "JMP",
            Condition::Equal => "JEQ",
            Condition::NotEqual => "JNE",
            Condition::Less => "JLT",
            Condition::LessEqual => "JLE",
            Condition::Greater => "JGT",
            Condition::GreaterEqual => "JGE",
        }
    }

    /// Condition that holds exactly when `self` does not.
    ///
    /// `Always` has no complement and is returned unchanged.
    pub fn negate(self) -> Condition {
        match self {
            Condition::Always => Condition::Always,
            Condition::Equal => Condition::NotEqual,
            Condition::NotEqual => Condition::Equal,
            Condition::Less => Condition::GreaterEqual,
            Condition::LessEqual => Condition::Greater,
            Condition::Greater => Condition::LessEqual,
            Condition::GreaterEqual => Condition::Less,
        }
    }

    /// Whether the jump is taken after popping `value`.
    pub fn holds(self, value: i32) -> bool {
        match self {
            Condition::Always => true,
            Condition::Equal => value == 0,
            Condition::NotEqual => value != 0,
            Condition::Less => value < 0,
            Condition::LessEqual => value <= 0,
            Condition::Greater => value > 0,
            Condition::GreaterEqual => value >= 0,
        }
    }

    /// Jump condition testing `left - right` for a comparison operator.
    pub fn from_comparison(op: BinaryOp) -> Option<Condition> {
        match op {
            BinaryOp::Equal => Some(Condition::Equal),
            BinaryOp::NotEqual => Some(Condition::NotEqual),
            BinaryOp::Less => Some(Condition::Less),
            BinaryOp::LessEqual => Some(Condition::LessEqual),
            BinaryOp::Greater => Some(Condition::Greater),
            BinaryOp::GreaterEqual => Some(Condition::GreaterEqual),
            _ => None,
        }
    }

    pub fn is_conditional(self) -> bool {
        self != Condition::Always
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn from_binary(op: BinaryOp) -> Option<ArithOp> {
        match op {
            BinaryOp::Add => Some(ArithOp::Add),
            BinaryOp::Subtract => Some(ArithOp::Sub),
            BinaryOp::Multiply => Some(ArithOp::Mul),
            BinaryOp::Divide => Some(ArithOp::Div),
            _ => None,
        }
    }

    fn stem(self) -> &'static str {
        match self {
            ArithOp::Add => "ADD",
            ArithOp::Sub => "SUB",
            ArithOp::Mul => "MUL",
            ArithOp::Div => "DIV",
        }
    }
}

/// Instruction opcode
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push the operand
    Load,
    /// Pop into the operand's storage
    Store,
    Pop,
    /// Push a copy of the top cell
    Dup,
    Arith(ArithOp, PrimitiveType),
    ConvertToFloat,
    ConvertToInt,
    Jump(Condition),
    Call,
    Ret,
    Halt,
    /// Verbatim assembly text
    Asm(String),
    /// Placeholder; removed before emission
    Nop,
    /// Function entry point, printed as a bare label
    Entry(String),
}

impl Op {
    /// Mnemonic for ops printed as a single instruction.
    pub fn mnemonic(&self) -> Option<String> {
        let text = match self {
            Op::Load => "LOAD32".to_string(),
            Op::Store => "STORE32".to_string(),
            Op::Pop => "POP32".to_string(),
            Op::Dup => "DUP32".to_string(),
            Op::Arith(op, PrimitiveType::Int) => format!("{}32", op.stem()),
            Op::Arith(op, PrimitiveType::Float) => format!("{}F", op.stem()),
            Op::ConvertToFloat => "CONVF".to_string(),
            Op::ConvertToInt => "CONVI".to_string(),
            Op::Jump(cond) => cond.mnemonic().to_string(),
            Op::Call => "CALL".to_string(),
            Op::Ret => "RET".to_string(),
            Op::Halt => "HLT".to_string(),
            Op::Asm(_) | Op::Nop | Op::Entry(_) => return None,
        };
        Some(text)
    }

    pub fn is_nop(&self) -> bool {
        matches!(self, Op::Nop)
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    None,
    /// Raw 32-bit cell value
    Immediate { bits: u32, ty: PrimitiveType },
    /// Frame-relative slot, `[SFP + n]`
    Frame(i32),
    /// Global variable, `[name]`
    Global(String),
    /// Code label, used by calls
    Label(String),
}

impl Operand {
    pub fn int(value: i32) -> Self {
        Operand::Immediate {
            bits: value as u32,
            ty: PrimitiveType::Int,
        }
    }

    pub fn float(value: f32) -> Self {
        Operand::Immediate {
            bits: value.to_bits(),
            ty: PrimitiveType::Float,
        }
    }

    /// The integer value of an integer immediate.
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Operand::Immediate {
                bits,
                ty: PrimitiveType::Int,
            } => Some(bits as i32),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Immediate {
                bits,
                ty: PrimitiveType::Int,
            } => write!(f, "{}", *bits as i32),
            Operand::Immediate {
                bits,
                ty: PrimitiveType::Float,
            } => write!(f, "0x{:08X}", bits),
            Operand::Frame(offset) if *offset < 0 => write!(f, "[SFP - {}]", -offset),
            Operand::Frame(offset) => write!(f, "[SFP + {}]", offset),
            Operand::Global(name) => write!(f, "[{}]", name),
            Operand::Label(name) => write!(f, "{}", name),
        }
    }
}

/// A node of the instruction list
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub op: Op,
    pub operand: Operand,
    pub target: Option<BranchTarget>,
    /// Assigned during finalization to branch targets only
    pub label: Option<String>,
    pub comment: Option<String>,
    pub next: Option<InstrId>,
}

impl Instr {
    pub fn new(op: Op, operand: Operand) -> Self {
        Self {
            op,
            operand,
            target: None,
            label: None,
            comment: None,
            next: None,
        }
    }

    /// Text of the trailing `;` comment, if any.
    pub fn comment_text(&self) -> Option<String> {
        if let Some(comment) = &self.comment {
            return Some(comment.clone());
        }
        match self.operand {
            Operand::Immediate {
                bits,
                ty: PrimitiveType::Float,
            } => Some(format!("{:?}", f32::from_bits(bits))),
            _ => None,
        }
    }
}
