//! Assembler errors
//!
//! Every error carries the 0-based source line it was found on.

use thiserror::Error;

pub type AsmResult<T> = Result<T, AsmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("line {line}: syntax error: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: operand {value} out of range {min}..={max}")]
    OperandOutOfRange {
        line: usize,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("line {line}: duplicate label '{label}'")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: undefined label '{label}'")]
    UndefinedLabel { line: usize, label: String },
}

impl AsmError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        AsmError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn check_range(line: usize, value: i64, (min, max): (i64, i64)) -> AsmResult<()> {
        if value < min || value > max {
            return Err(AsmError::OperandOutOfRange {
                line,
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Source line the error was reported on
    pub fn line(&self) -> usize {
        match self {
            AsmError::Syntax { line, .. }
            | AsmError::UnknownMnemonic { line, .. }
            | AsmError::OperandOutOfRange { line, .. }
            | AsmError::DuplicateLabel { line, .. }
            | AsmError::UndefinedLabel { line, .. } => *line,
        }
    }
}
