//! picovm Bytecode
//!
//! Opcode table and two-pass assembler for the picovm. The assembler turns
//! assembly text into a byte image, relaxing jumps to their 8-bit relative
//! form wherever the target is close enough.
//!
//! # Example
//!
//! ```
//! let assembly = pico_bytecode::assemble("start: JMP start", 0).unwrap();
//! assert_eq!(assembly.bytes, vec![0xC0, 0xFF]);
//! ```

#![warn(rust_2018_idioms)]

pub mod error;
pub mod opcode;

mod assembler;

pub use assembler::{assemble, Assembler, Assembly};
pub use error::{AsmError, AsmResult};
pub use opcode::{ArithOp, JumpCondition, Mnemonic, Width};
