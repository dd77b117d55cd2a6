//! Two-pass assembler
//!
//! The first pass encodes each line into the cell buffer and records label
//! addresses. The second pass relaxes jumps and resolves label references.

mod buffer;
mod line;
mod operand;

use crate::error::{AsmError, AsmResult};
use crate::opcode::{self, Mnemonic, Width};
use buffer::CellBuffer;
use line::{split_operands, SourceLine};
use operand::{qualify, Address, Number, Operand};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, debug_span};

/// An assembled image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assembly {
    /// Address of the first byte
    pub origin: u16,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Absolute address of each instruction to its 0-based source line
    pub line_mapping: BTreeMap<u32, usize>,
    /// Absolute label addresses
    pub labels: BTreeMap<String, u32>,
}

/// Assemble `text`, placing the first byte at `origin`.
pub fn assemble(text: &str, origin: u16) -> AsmResult<Assembly> {
    let _span = debug_span!("assemble", origin).entered();
    let mut assembler = Assembler::new(origin);
    for (line, source) in text.lines().enumerate() {
        assembler.assemble_line(line, source)?;
    }
    assembler.finish()
}

/// Line-at-a-time assembler state
pub struct Assembler {
    origin: u16,
    buffer: CellBuffer,
    labels: BTreeMap<String, u32>,
    /// Uppercased label names, for duplicate detection
    seen: FxHashSet<String>,
    line_mapping: BTreeMap<u32, usize>,
    /// Last global label, qualifying `.local` names
    scope: Option<String>,
}

impl Assembler {
    pub fn new(origin: u16) -> Self {
        Self {
            origin,
            buffer: CellBuffer::new(origin),
            labels: BTreeMap::new(),
            seen: FxHashSet::default(),
            line_mapping: BTreeMap::new(),
            scope: None,
        }
    }

    /// Encode one source line. `line` is 0-based.
    pub fn assemble_line(&mut self, line: usize, text: &str) -> AsmResult<()> {
        let parsed = SourceLine::parse(text, line)?;

        if let Some(label) = parsed.label {
            self.define_label(label, line)?;
        }

        let Some(name) = parsed.mnemonic else {
            return Ok(());
        };
        let mnemonic = Mnemonic::parse(name).ok_or_else(|| AsmError::UnknownMnemonic {
            line,
            mnemonic: name.to_string(),
        })?;

        if mnemonic.is_directive() {
            return self.encode_directive(mnemonic, parsed.operand, line);
        }

        self.line_mapping.insert(self.buffer.position(), line);
        let operand = parsed
            .operand
            .map(|text| Operand::parse(text, line, self.scope.as_deref()))
            .transpose()?;
        self.encode_instruction(mnemonic, operand, line)
    }

    /// Relax jumps, resolve references and produce the image.
    pub fn finish(mut self) -> AsmResult<Assembly> {
        let shrunk = self.buffer.relax(&mut self.labels, &mut self.line_mapping)?;
        let bytes = self.buffer.resolve(&self.labels)?;
        debug!(bytes = bytes.len(), labels = self.labels.len(), shrunk, "assembled");
        Ok(Assembly {
            origin: self.origin,
            bytes,
            line_mapping: self.line_mapping,
            labels: self.labels,
        })
    }

    fn define_label(&mut self, label: &str, line: usize) -> AsmResult<()> {
        let name = qualify(label, self.scope.as_deref());
        if !label.starts_with('.') {
            self.scope = Some(name.clone());
        }
        if !self.seen.insert(name.to_ascii_uppercase()) {
            return Err(AsmError::DuplicateLabel { line, label: name });
        }
        self.labels.insert(name, self.buffer.position());
        Ok(())
    }

    fn encode_instruction(
        &mut self,
        mnemonic: Mnemonic,
        operand: Option<Operand>,
        line: usize,
    ) -> AsmResult<()> {
        match mnemonic {
            Mnemonic::Hlt => self.simple(opcode::HLT, operand, line),
            Mnemonic::Yield => self.simple(opcode::YIELD, operand, line),
            Mnemonic::Ret => self.simple(opcode::RET, operand, line),
            Mnemonic::CallUser => self.simple(opcode::CALLUSER, operand, line),
            Mnemonic::ConvI => self.simple(opcode::CONV, operand, line),
            Mnemonic::ConvF => self.simple(opcode::CONV + 1, operand, line),
            Mnemonic::Pop(width) => self.simple(opcode::POP | width.modifier(), operand, line),
            Mnemonic::Arith(op, width) => {
                let width = if op.is_float() { Width::Byte } else { width };
                self.simple(op.opcode(width), operand, line)
            }
            Mnemonic::Load(width) => self.encode_memory(opcode::LOAD, width, operand, line),
            Mnemonic::Store(width) => self.encode_memory(opcode::STORE, width, operand, line),
            Mnemonic::Dup(width) => self.encode_depth(opcode::DUP, width, operand, line),
            Mnemonic::Dig(width) => self.encode_depth(opcode::DIG, width, operand, line),
            Mnemonic::Call => match operand {
                None => self.simple(opcode::CALL_STACK, None, line),
                Some(Operand::Label(label)) => {
                    self.buffer.push(opcode::CALL);
                    self.buffer.push_address(label, 0, line);
                    Ok(())
                }
                Some(other) => Err(unexpected(&other, "CALL", line)),
            },
            Mnemonic::Jump(condition) => match operand {
                Some(Operand::Label(label)) => {
                    self.buffer.push(condition.short_opcode());
                    self.buffer.push_branch(label, line);
                    Ok(())
                }
                Some(other) => Err(unexpected(&other, "a jump", line)),
                None => Err(AsmError::syntax(line, "jump requires a label")),
            },
            Mnemonic::Int => {
                let value = operand
                    .as_ref()
                    .and_then(immediate)
                    .ok_or_else(|| AsmError::syntax(line, "INT requires a number"))?;
                AsmError::check_range(line, value, (0, 0xFFFF))?;
                self.buffer.push(opcode::INT);
                self.buffer.push_le(value, 2);
                Ok(())
            }
            Mnemonic::Db | Mnemonic::Res(_) => Err(AsmError::syntax(line, "not an instruction")),
        }
    }

    fn simple(&mut self, byte: u8, operand: Option<Operand>, line: usize) -> AsmResult<()> {
        if let Some(operand) = operand {
            return Err(unexpected(&operand, "this instruction", line));
        }
        self.buffer.push(byte);
        Ok(())
    }

    fn encode_memory(
        &mut self,
        base: u8,
        width: Width,
        operand: Option<Operand>,
        line: usize,
    ) -> AsmResult<()> {
        let op = base | width.modifier();
        let is_load = base == opcode::LOAD;
        match operand {
            None => self.buffer.push(op | opcode::MODE_BARE),
            Some(Operand::Memory(Address::Frame(offset))) => {
                AsmError::check_range(line, offset, (-128, 127))?;
                let frame = if is_load { opcode::LOAD_SFP } else { opcode::STORE_SFP };
                self.buffer.push(frame + width.modifier());
                self.buffer.push_le(offset, 1);
            }
            Some(Operand::Memory(Address::Absolute(address))) => {
                AsmError::check_range(line, address, Width::Short.range())?;
                self.buffer.push(op | opcode::MODE_MEMORY);
                self.buffer.push_le(address, 2);
            }
            Some(Operand::Memory(Address::Label { name, offset })) => {
                self.buffer.push(op);
                self.buffer.push_address(name, offset, line);
            }
            Some(Operand::Label(label)) if width == Width::Short => {
                self.buffer.push(op | opcode::MODE_IMMEDIATE);
                self.buffer.push_address(label, 0, line);
            }
            Some(Operand::Label(label)) => {
                return Err(AsmError::syntax(
                    line,
                    format!("label '{}' as an immediate needs a 16-bit operand", label),
                ));
            }
            Some(other) => {
                let value = immediate(&other)
                    .filter(|_| is_load)
                    .ok_or_else(|| unexpected(&other, "this instruction", line))?;
                AsmError::check_range(line, value, width.range())?;
                self.buffer.push(op | opcode::MODE_IMMEDIATE);
                self.buffer.push_le(value, width.bytes());
            }
        }
        Ok(())
    }

    fn encode_depth(
        &mut self,
        base: u8,
        width: Width,
        operand: Option<Operand>,
        line: usize,
    ) -> AsmResult<()> {
        let depth = match operand {
            None => 0,
            Some(Operand::Number(number)) => number.value,
            Some(other) => return Err(unexpected(&other, "DUP/DIG", line)),
        };
        AsmError::check_range(line, depth, (0, 255))?;

        let op = base | width.modifier();
        if depth < 3 {
            self.buffer.push(op | ((depth as u8) << 2));
        } else {
            self.buffer.push(op | 0xC);
            self.buffer.push(depth as u8);
        }
        Ok(())
    }

    fn encode_directive(&mut self, mnemonic: Mnemonic, operand: Option<&str>, line: usize) -> AsmResult<()> {
        match mnemonic {
            Mnemonic::Res(width) => {
                let count = match operand {
                    None => 1,
                    Some(text) => operand::parse_number(text.trim(), line)?.value,
                };
                AsmError::check_range(line, count, (1, 0xFFFF))?;
                self.buffer.reserve(count as usize * width.bytes());
            }
            Mnemonic::Db => {
                let text = operand.ok_or_else(|| AsmError::syntax(line, "DB requires an operand"))?;
                for part in split_operands(text) {
                    match Operand::parse(part, line, self.scope.as_deref())? {
                        Operand::Str(bytes) => self.buffer.extend(&bytes),
                        Operand::Char(byte) => self.buffer.push(byte),
                        Operand::Number(Number {
                            value,
                            hex_digits: Some(digits),
                        }) if digits > 2 => {
                            let width = digits.div_ceil(2);
                            if width > 8 {
                                return Err(AsmError::syntax(line, format!("'{}' is too wide", part)));
                            }
                            self.buffer.push_le(value, width);
                        }
                        Operand::Number(Number { value, .. }) => {
                            AsmError::check_range(line, value, Width::Byte.range())?;
                            self.buffer.push_le(value, 1);
                        }
                        other => return Err(unexpected(&other, "DB", line)),
                    }
                }
            }
            _ => return Err(AsmError::syntax(line, "not a directive")),
        }
        Ok(())
    }
}

/// Integer value of a number or character operand
fn immediate(operand: &Operand) -> Option<i64> {
    match operand {
        Operand::Number(number) => Some(number.value),
        Operand::Char(c) => Some(i64::from(*c)),
        _ => None,
    }
}

fn unexpected(operand: &Operand, context: &str, line: usize) -> AsmError {
    let kind = match operand {
        Operand::Number(_) => "a number",
        Operand::Char(_) => "a character",
        Operand::Str(_) => "a string",
        Operand::Label(_) => "a label",
        Operand::Memory(_) => "an address",
    };
    AsmError::syntax(line, format!("{} is not a valid operand for {}", kind, context))
}
