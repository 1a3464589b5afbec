//! Code/data classification bitmap (§4.2).
//!
//! One bit per code byte: set means "opcode start", clear means "PUSH
//! immediate data byte". Grounded on the teacher pack's bytecode
//! preprocessing bitmaps, but built with safe `bitvec` indexing rather than
//! the unchecked-bit accessors those use, since this crate forbids
//! `unsafe_code`.

use bitvec::prelude::*;

use crate::bytecode::Bytecode;
use crate::opcodes::Opcode;

/// A bit per code byte, set iff that byte is an opcode start.
#[derive(Debug, Clone)]
pub struct CodeBitmap {
    bits: BitVec<u8, Lsb0>,
}

impl CodeBitmap {
    /// Builds the bitmap for `code` in a single forward pass: every byte
    /// starts out as an opcode; PUSH-N immediates clear the bits they occupy.
    pub fn build(code: &Bytecode) -> Self {
        let len = code.len();
        let mut bits = bitvec![u8, Lsb0; 1; len];

        let mut pc = 0usize;
        while pc < len {
            // byte_at is in-bounds by the loop condition.
            let byte = code.byte_at(pc).unwrap_or(0);
            let push_size = Opcode::from_u8(byte).and_then(Opcode::push_size);
            match push_size {
                Some(n) if n > 0 => {
                    let data_end = (pc + 1 + n as usize).min(len);
                    for data_pc in (pc + 1)..data_end {
                        bits.set(data_pc, false);
                    }
                    pc += 1 + n as usize;
                }
                _ => pc += 1,
            }
        }

        Self { bits }
    }

    /// True iff `pc` names an opcode start (not PUSH immediate data).
    /// Positions past the end of the code are never opcode starts.
    pub fn is_opcode_start(&self, pc: usize) -> bool {
        self.bits.get(pc).is_some_and(|bit| *bit)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}
