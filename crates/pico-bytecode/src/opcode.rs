//! Opcode table for the picovm
//!
//! Most opcodes are computed from a family base plus modifier bits:
//!
//! - bits 0-1: operand width (`0` = 8, `1` = 16, `2` = 32 bit)
//! - bits 2-3: addressing mode for `LOAD`/`STORE` (see [`MODE_MEMORY`],
//!   [`MODE_BARE`], [`MODE_IMMEDIATE`]), depth for `DUP`/`DIG`
//! - jumps: `JUMP_BASE + 2 * condition`, bit 0 selects the 16-bit absolute
//!   form over the 8-bit relative one
//!
//! This is the wire format consumed by the virtual machine.

/// Halt execution
pub const HLT: u8 = 0xFF;
/// Yield to the host
pub const YIELD: u8 = 0xFE;

pub const LOAD: u8 = 0x00;
pub const STORE: u8 = 0x10;
pub const POP: u8 = 0x1C;
pub const DUP: u8 = 0x20;
pub const DIG: u8 = 0x30;

/// `LOAD [SFP ± n]`, plus width
pub const LOAD_SFP: u8 = 0x5C;
/// `STORE [SFP ± n]`, plus width
pub const STORE_SFP: u8 = 0x6C;

/// Address taken from the operand bytes, `[n]`
pub const MODE_MEMORY: u8 = 0x4;
/// Address taken from the stack
pub const MODE_BARE: u8 = 0x8;
/// Value taken from the operand bytes
pub const MODE_IMMEDIATE: u8 = 0xC;

pub const ARITH_BASE: u8 = 0x80;
/// `CONVI`; `CONVF` is `CONV + 1`
pub const CONV: u8 = 0xBC;

pub const CALL: u8 = 0x40;
/// `CALL` with the target address on the stack
pub const CALL_STACK: u8 = 0x41;
pub const RET: u8 = 0x42;
pub const CALLUSER: u8 = 0x43;

pub const JUMP_BASE: u8 = 0xC0;
/// Software interrupt. Shares its value with the 8-bit `JLE`.
pub const INT: u8 = 0xC6;

/// Operand width selected by a mnemonic suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Short,
    Word,
}

impl Width {
    /// Low opcode bits selecting this width
    pub fn modifier(self) -> u8 {
        match self {
            Width::Byte => 0,
            Width::Short => 1,
            Width::Word => 2,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Short => 2,
            Width::Word => 4,
        }
    }

    /// Accepted immediate values, signed or unsigned
    pub fn range(self) -> (i64, i64) {
        match self {
            Width::Byte => (-128, 255),
            Width::Short => (-32768, 65535),
            Width::Word => (i32::MIN as i64, u32::MAX as i64),
        }
    }
}

/// Integer and float arithmetic operators, in opcode order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Not,
    AddF,
    SubF,
    MulF,
    DivF,
}

impl ArithOp {
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_float(self) -> bool {
        matches!(self, ArithOp::AddF | ArithOp::SubF | ArithOp::MulF | ArithOp::DivF)
    }

    pub fn opcode(self, width: Width) -> u8 {
        ARITH_BASE + (self.index() << 2) + width.modifier()
    }

    fn from_name(name: &str) -> Option<ArithOp> {
        let op = match name {
            "ADD" => ArithOp::Add,
            "SUB" => ArithOp::Sub,
            "MUL" => ArithOp::Mul,
            "DIV" => ArithOp::Div,
            "MOD" => ArithOp::Mod,
            "SHL" => ArithOp::Shl,
            "SHR" => ArithOp::Shr,
            "AND" => ArithOp::And,
            "OR" => ArithOp::Or,
            "XOR" => ArithOp::Xor,
            "NOT" => ArithOp::Not,
            "ADDF" => ArithOp::AddF,
            "SUBF" => ArithOp::SubF,
            "MULF" => ArithOp::MulF,
            "DIVF" => ArithOp::DivF,
            _ => return None,
        };
        Some(op)
    }
}

/// Jump conditions, in opcode order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpCondition {
    Always,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
}

impl JumpCondition {
    /// 8-bit relative form
    pub fn byte_opcode(self) -> u8 {
        JUMP_BASE + 2 * self as u8
    }

    /// 16-bit absolute form
    pub fn short_opcode(self) -> u8 {
        self.byte_opcode() + 1
    }
}

/// A parsed instruction or directive name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Hlt,
    Yield,
    Load(Width),
    Store(Width),
    Pop(Width),
    Dup(Width),
    Dig(Width),
    Arith(ArithOp, Width),
    ConvI,
    ConvF,
    Call,
    CallUser,
    Ret,
    Jump(JumpCondition),
    Int,
    /// Literal bytes
    Db,
    /// Reserve `n` bytes, words or double words
    Res(Width),
}

impl Mnemonic {
    /// Parse a mnemonic, ignoring case.
    pub fn parse(name: &str) -> Option<Mnemonic> {
        let upper = name.to_ascii_uppercase();
        let fixed = match upper.as_str() {
            "HLT" => Some(Mnemonic::Hlt),
            "YIELD" => Some(Mnemonic::Yield),
            "CONV" | "CONVI" => Some(Mnemonic::ConvI),
            "CONVF" => Some(Mnemonic::ConvF),
            "CALL" => Some(Mnemonic::Call),
            "CALLUSER" => Some(Mnemonic::CallUser),
            "RET" => Some(Mnemonic::Ret),
            "JMP" => Some(Mnemonic::Jump(JumpCondition::Always)),
            "JEQ" => Some(Mnemonic::Jump(JumpCondition::Equal)),
            "JNE" => Some(Mnemonic::Jump(JumpCondition::NotEqual)),
            "JLE" => Some(Mnemonic::Jump(JumpCondition::LessEqual)),
            "JGE" => Some(Mnemonic::Jump(JumpCondition::GreaterEqual)),
            "JLT" => Some(Mnemonic::Jump(JumpCondition::Less)),
            "JGT" => Some(Mnemonic::Jump(JumpCondition::Greater)),
            "INT" => Some(Mnemonic::Int),
            "DB" => Some(Mnemonic::Db),
            "RESB" => Some(Mnemonic::Res(Width::Byte)),
            "RESW" => Some(Mnemonic::Res(Width::Short)),
            "RESD" => Some(Mnemonic::Res(Width::Word)),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        if let Some(op) = ArithOp::from_name(&upper) {
            return Some(Mnemonic::Arith(op, Width::Byte));
        }

        let (stem, width) = if let Some(stem) = upper.strip_suffix("16") {
            (stem, Width::Short)
        } else if let Some(stem) = upper.strip_suffix("32") {
            (stem, Width::Word)
        } else {
            (upper.as_str(), Width::Byte)
        };
        match stem {
            "LOAD" => Some(Mnemonic::Load(width)),
            "STORE" => Some(Mnemonic::Store(width)),
            "POP" => Some(Mnemonic::Pop(width)),
            "DUP" => Some(Mnemonic::Dup(width)),
            "DIG" => Some(Mnemonic::Dig(width)),
            _ if width != Width::Byte => ArithOp::from_name(stem)
                .filter(|op| !op.is_float())
                .map(|op| Mnemonic::Arith(op, width)),
            _ => None,
        }
    }

    /// Directives emit data rather than instructions.
    pub fn is_directive(self) -> bool {
        matches!(self, Mnemonic::Db | Mnemonic::Res(_))
    }
}
