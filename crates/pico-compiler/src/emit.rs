//! Assembly emission
//!
//! Prints finalized IR in the picovm assembly dialect: one tab-indented
//! instruction per line, with a labelled instruction preceded by `label:` on
//! its own line.

use crate::error::{CompileError, CompileResult};
use crate::ir::{BranchTarget, IrProgram, Op};
use crate::symbols::{Storage, SymbolTable};

/// Render a finalized program.
///
/// Fails if a jump has no labelled target, which means finalization did not
/// run.
pub fn emit_program(program: &IrProgram) -> CompileResult<String> {
    let mut lines = Vec::new();
    for id in program.iter() {
        let instr = program.get(id);
        if let Some(label) = &instr.label {
            lines.push(format!("{}:", label));
        }

        let mnemonic = match &instr.op {
            Op::Entry(name) => {
                lines.push(format!("{}:", name));
                continue;
            }
            Op::Asm(text) => {
                lines.extend(text.lines().map(str::to_string));
                continue;
            }
            Op::Nop => continue,
            op => op.mnemonic().ok_or_else(|| {
                CompileError::internal(format!("no mnemonic for {:?}", op))
            })?,
        };

        let operand = match instr.target {
            Some(BranchTarget::Instr(target)) => {
                program.get(target).label.clone().ok_or_else(|| {
                    CompileError::internal(format!("jump at {} targets an unlabelled instruction", id))
                })?
            }
            Some(BranchTarget::Return) => {
                return Err(CompileError::internal(format!(
                    "jump at {} still targets the return sentinel",
                    id
                )));
            }
            None => instr.operand.to_string(),
        };

        let mut line = format!("\t{}", mnemonic);
        if !operand.is_empty() {
            line.push(' ');
            line.push_str(&operand);
        }
        if let Some(comment) = instr.comment_text() {
            line.push_str("    ; ");
            line.push_str(&comment);
        }
        lines.push(line);
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Reserve one 32-bit cell per global variable not yet emitted.
///
/// Marks each symbol as emitted, so a second call returns an empty string.
pub fn emit_global_symbols(symbols: &mut SymbolTable) -> String {
    let pending: Vec<_> = symbols
        .iter()
        .filter(|(_, symbol)| !symbol.emitted && matches!(symbol.storage, Storage::Global(_)))
        .map(|(id, _)| id)
        .collect();

    let mut text = String::new();
    for id in pending {
        let symbol = symbols.get_mut(id);
        symbol.emitted = true;
        if let Storage::Global(name) = &symbol.storage {
            text.push_str(&format!("{}: RESD 1\n", name));
        }
    }
    text
}
