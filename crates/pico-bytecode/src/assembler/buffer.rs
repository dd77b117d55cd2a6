//! Cell buffer and branch relaxation
//!
//! The first pass appends one cell per output byte. Label references stay
//! symbolic until every label is known: jumps are relaxed from the 16-bit
//! absolute form to the 8-bit relative form where the distance allows, then
//! every reference is substituted.

use crate::error::{AsmError, AsmResult};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// One output byte, possibly still unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Cell {
    Byte(u8),
    /// Zero byte from a `RES*` directive
    Reserved,
    /// Low byte of `label + offset`; followed by [`Cell::High`]
    Address {
        label: String,
        offset: i64,
        line: usize,
    },
    /// Jump operand. Wide jumps are followed by [`Cell::High`].
    Branch {
        label: String,
        line: usize,
        wide: bool,
    },
    /// Second byte of a 16-bit reference, written with its low byte
    High,
}

#[derive(Debug, Clone)]
pub(crate) struct CellBuffer {
    origin: u32,
    cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(origin: u16) -> Self {
        Self {
            origin: u32::from(origin),
            cells: Vec::new(),
        }
    }

    /// Absolute address of the next cell
    pub fn position(&self) -> u32 {
        self.origin + self.cells.len() as u32
    }

    pub fn push(&mut self, byte: u8) {
        self.cells.push(Cell::Byte(byte));
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.cells.extend(bytes.iter().copied().map(Cell::Byte));
    }

    /// Append `value` as `width` little-endian bytes.
    pub fn push_le(&mut self, value: i64, width: usize) {
        self.extend(&value.to_le_bytes()[..width]);
    }

    pub fn push_address(&mut self, label: String, offset: i64, line: usize) {
        self.cells.push(Cell::Address {
            label,
            offset,
            line,
        });
        self.cells.push(Cell::High);
    }

    /// Append a jump operand in its wide form.
    pub fn push_branch(&mut self, label: String, line: usize) {
        self.cells.push(Cell::Branch {
            label,
            line,
            wide: true,
        });
        self.cells.push(Cell::High);
    }

    pub fn reserve(&mut self, count: usize) {
        self.cells.extend(std::iter::repeat(Cell::Reserved).take(count));
    }

    /// Shrink every jump whose target is within a signed byte, to a fixed
    /// point. Labels and line mappings past each removed cell move down.
    ///
    /// Returns the number of jumps shrunk.
    pub fn relax(
        &mut self,
        labels: &mut BTreeMap<String, u32>,
        line_mapping: &mut BTreeMap<u32, usize>,
    ) -> AsmResult<usize> {
        let mut total = 0;
        let mut iteration = 0;
        loop {
            iteration += 1;
            let mut shrunk = 0;
            let mut i = 0;
            while i < self.cells.len() {
                if let Cell::Branch {
                    label,
                    line,
                    wide: true,
                } = &self.cells[i]
                {
                    let target = lookup(labels, label, *line)?;
                    let here = self.origin + i as u32;
                    // A forward target moves down once this jump shrinks.
                    let distance = if target > here {
                        target as i64 - 1 - here as i64
                    } else {
                        target as i64 - here as i64
                    };
                    if (-128..=127).contains(&distance) {
                        trace!(at = here, target, distance, "shrinking jump");
                        self.shrink(i);
                        shift_down(labels, line_mapping, here);
                        shrunk += 1;
                    }
                }
                i += 1;
            }
            debug!(iteration, shrunk, "relaxation pass");
            total += shrunk;
            if shrunk == 0 {
                return Ok(total);
            }
        }
    }

    /// Switch the jump whose operand starts at `index` to its byte form.
    fn shrink(&mut self, index: usize) {
        if let Some(Cell::Branch { wide, .. }) = self.cells.get_mut(index) {
            *wide = false;
        }
        if let Some(Cell::Byte(opcode)) = index.checked_sub(1).and_then(|op| self.cells.get_mut(op)) {
            *opcode &= !1;
        }
        self.cells.remove(index + 1);
    }

    /// Substitute every reference and produce the final image.
    ///
    /// Reserved cells at the end of the image are dropped.
    pub fn resolve(&self, labels: &BTreeMap<String, u32>) -> AsmResult<Vec<u8>> {
        let end = self
            .cells
            .iter()
            .rposition(|cell| *cell != Cell::Reserved)
            .map_or(0, |last| last + 1);

        let mut bytes = Vec::with_capacity(end);
        for (i, cell) in self.cells[..end].iter().enumerate() {
            match cell {
                Cell::Byte(byte) => bytes.push(*byte),
                Cell::Reserved => bytes.push(0),
                Cell::Address {
                    label,
                    offset,
                    line,
                } => {
                    let address = lookup(labels, label, *line)? as i64 + offset;
                    bytes.extend_from_slice(&(address as u16).to_le_bytes());
                }
                Cell::Branch {
                    label,
                    line,
                    wide: true,
                } => {
                    let target = lookup(labels, label, *line)?;
                    bytes.extend_from_slice(&(target as u16).to_le_bytes());
                }
                Cell::Branch {
                    label,
                    line,
                    wide: false,
                } => {
                    let target = lookup(labels, label, *line)? as i64;
                    let here = (self.origin as usize + i) as i64;
                    bytes.push((target - here) as i8 as u8);
                }
                Cell::High => {}
            }
        }
        Ok(bytes)
    }
}

fn lookup(labels: &BTreeMap<String, u32>, label: &str, line: usize) -> AsmResult<u32> {
    labels
        .get(label)
        .copied()
        .ok_or_else(|| AsmError::UndefinedLabel {
            line,
            label: label.to_string(),
        })
}

fn shift_down(labels: &mut BTreeMap<String, u32>, line_mapping: &mut BTreeMap<u32, usize>, after: u32) {
    for address in labels.values_mut() {
        if *address > after {
            *address -= 1;
        }
    }
    *line_mapping = std::mem::take(line_mapping)
        .into_iter()
        .map(|(address, line)| (if address > after { address - 1 } else { address }, line))
        .collect();
}
