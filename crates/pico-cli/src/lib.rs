//! Shared plumbing for the `picoc` and `picoasm` drivers
//!
//! All file I/O, diagnostics rendering and logging setup live here; the
//! compiler and assembler crates only return structured errors.

pub mod diagnostics;
pub mod logging;
pub mod output;
pub mod sources;

pub use diagnostics::Reporter;
pub use sources::SourceSet;

/// Parse an address given in decimal or with a `0x` prefix.
pub fn parse_origin(text: &str) -> Result<u16, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| format!("'{}' is not an address between 0 and 0xFFFF", text))
}
