//! Test harness for end-to-end compilation and execution
//!
//! Runs a finalized [`IrProgram`] on a small stack machine that follows the
//! picovm calling convention: the stack grows downward one 32-bit cell at a
//! time, `CALL` pushes a return cell that `SFP` points at, parameters sit
//! above it and locals below it.

use pico_compiler::ir::{ArithOp, BranchTarget, InstrId, IrProgram, Op, Operand};
use pico_compiler::{CompileError, CompileOptions, CompiledUnit, Compiler};
use pico_parser::PrimitiveType;
use std::collections::HashMap;

const STEP_LIMIT: usize = 1_000_000;

/// State at `HLT`
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Top cell of the stack
    pub top: u32,
    /// Cells left on the stack
    pub depth: usize,
    pub globals: HashMap<String, u32>,
}

impl Outcome {
    pub fn int(&self) -> i32 {
        self.top as i32
    }

    pub fn float(&self) -> f32 {
        f32::from_bits(self.top)
    }
}

pub fn compile(source: &str, optimize: bool) -> CompiledUnit {
    try_compile(source, optimize).unwrap_or_else(|e| panic!("compilation failed: {}", e))
}

pub fn try_compile(source: &str, optimize: bool) -> Result<CompiledUnit, CompileError> {
    Compiler::new(CompileOptions { optimize }).compile_unit(source, "test.pico")
}

/// Compile and run with the given optimization setting.
pub fn run_with(source: &str, optimize: bool) -> Outcome {
    let unit = compile(source, optimize);
    execute(&unit.program).unwrap_or_else(|e| {
        panic!(
            "execution failed (optimize = {}): {}\n{}",
            optimize, e, unit.assembly
        )
    })
}

/// Run optimized and unoptimized, check both agree and leave one cell.
pub fn run(source: &str) -> Outcome {
    let optimized = run_with(source, true);
    let plain = run_with(source, false);
    assert_eq!(optimized.top, plain.top, "optimization changed the result");
    assert_eq!(optimized.depth, 1, "optimized program left {} cells", optimized.depth);
    assert_eq!(plain.depth, 1, "unoptimized program left {} cells", plain.depth);
    optimized
}

pub fn expect_int(source: &str, expected: i32) {
    assert_eq!(run(source).int(), expected, "source: {}", source);
}

pub fn expect_float(source: &str, expected: f32) {
    assert_eq!(run(source).float(), expected, "source: {}", source);
}

#[derive(Debug, Default)]
struct Machine {
    stack: Vec<u32>,
    sfp: usize,
    /// Return instruction and caller `SFP` per active call
    frames: Vec<(Option<InstrId>, usize)>,
    globals: HashMap<String, u32>,
    /// Value most recently popped, tested by conditional jumps
    flag: i32,
}

impl Machine {
    fn push(&mut self, value: u32) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<u32, String> {
        self.stack.pop().ok_or_else(|| "pop on empty stack".to_string())
    }

    fn frame_slot(&self, offset: i32) -> Result<usize, String> {
        let slot = self.sfp as i64 - i64::from(offset / 4);
        if slot < 0 || slot as usize >= self.stack.len() {
            return Err(format!("[SFP {:+}] is outside the stack", offset));
        }
        Ok(slot as usize)
    }

    fn read(&self, operand: &Operand) -> Result<u32, String> {
        match operand {
            Operand::Immediate { bits, .. } => Ok(*bits),
            Operand::Frame(offset) => Ok(self.stack[self.frame_slot(*offset)?]),
            Operand::Global(name) => Ok(self.globals.get(name).copied().unwrap_or(0)),
            other => Err(format!("cannot load {:?}", other)),
        }
    }

    fn write(&mut self, operand: &Operand, value: u32) -> Result<(), String> {
        match operand {
            Operand::Frame(offset) => {
                let slot = self.frame_slot(*offset)?;
                self.stack[slot] = value;
            }
            Operand::Global(name) => {
                self.globals.insert(name.clone(), value);
            }
            other => return Err(format!("cannot store to {:?}", other)),
        }
        Ok(())
    }
}

fn arith(op: ArithOp, ty: PrimitiveType, a: u32, b: u32) -> Result<u32, String> {
    match ty {
        PrimitiveType::Int => {
            let (a, b) = (a as i32, b as i32);
            let value = match op {
                ArithOp::Add => a.wrapping_add(b),
                ArithOp::Sub => a.wrapping_sub(b),
                ArithOp::Mul => a.wrapping_mul(b),
                ArithOp::Div if b == 0 => return Err("division by zero".to_string()),
                ArithOp::Div => a.wrapping_div(b),
            };
            Ok(value as u32)
        }
        PrimitiveType::Float => {
            let (a, b) = (f32::from_bits(a), f32::from_bits(b));
            let value = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
            };
            Ok(value.to_bits())
        }
    }
}

/// Execute `program` from its first instruction until `HLT`.
pub fn execute(program: &IrProgram) -> Result<Outcome, String> {
    let entries: HashMap<&str, InstrId> = program
        .iter()
        .filter_map(|id| match &program.get(id).op {
            Op::Entry(name) => Some((name.as_str(), id)),
            _ => None,
        })
        .collect();

    let mut machine = Machine::default();
    let mut pc = program.head();
    for _ in 0..STEP_LIMIT {
        let id = pc.ok_or("ran past the last instruction")?;
        let instr = program.get(id);
        let mut next = program.next(id);

        match &instr.op {
            Op::Load => {
                let value = machine.read(&instr.operand)?;
                machine.push(value);
            }
            Op::Store => {
                let value = machine.pop()?;
                machine.write(&instr.operand, value)?;
            }
            Op::Pop => machine.flag = machine.pop()? as i32,
            Op::Dup => {
                let top = *machine.stack.last().ok_or("dup on empty stack")?;
                machine.push(top);
            }
            Op::Arith(op, ty) => {
                let b = machine.pop()?;
                let a = machine.pop()?;
                machine.push(arith(*op, *ty, a, b)?);
            }
            Op::ConvertToFloat => {
                let value = machine.pop()? as i32;
                machine.push((value as f32).to_bits());
            }
            Op::ConvertToInt => {
                let value = f32::from_bits(machine.pop()?);
                machine.push(value as i32 as u32);
            }
            Op::Jump(cond) => {
                if cond.holds(machine.flag) {
                    match instr.target {
                        Some(BranchTarget::Instr(target)) => next = Some(target),
                        other => return Err(format!("jump at {} has target {:?}", id, other)),
                    }
                }
            }
            Op::Call => {
                let Operand::Label(name) = &instr.operand else {
                    return Err(format!("call at {} has no label", id));
                };
                let entry = *entries
                    .get(name.as_str())
                    .ok_or_else(|| format!("no entry for {}", name))?;
                machine.frames.push((next, machine.sfp));
                machine.push(0);
                machine.sfp = machine.stack.len() - 1;
                next = Some(entry);
            }
            Op::Ret => {
                if machine.stack.len() != machine.sfp + 1 {
                    return Err(format!(
                        "RET with {} cells above the frame",
                        machine.stack.len() as i64 - machine.sfp as i64 - 1
                    ));
                }
                machine.pop()?;
                let (ret, sfp) = machine.frames.pop().ok_or("RET outside a call")?;
                machine.sfp = sfp;
                next = ret;
            }
            Op::Halt => {
                return Ok(Outcome {
                    top: machine.stack.last().copied().unwrap_or(0),
                    depth: machine.stack.len(),
                    globals: machine.globals,
                });
            }
            Op::Asm(text) => return Err(format!("cannot execute inline assembly {:?}", text)),
            Op::Nop | Op::Entry(_) => {}
        }
        pc = next;
    }
    Err("step limit exceeded".to_string())
}
