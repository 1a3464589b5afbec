//! JUMPDEST scanner (§4.3).
//!
//! Grounded on the teacher's `get_valid_jump_destinations` forward scan over
//! the bytecode (`crates/vm/levm/src/vm.rs`), but collecting into a sorted
//! packed array of 15-bit PCs instead of a `HashSet<usize>` — `MAX_CONTRACT_SIZE`
//! is well under `2^15`, so `u16` is both sufficient and half the size.

use crate::bitmap::CodeBitmap;
use crate::bytecode::Bytecode;
use crate::opcodes::Opcode;

/// Sorted, densely packed set of valid JUMPDEST program counters.
#[derive(Debug, Clone, Default)]
pub struct JumpdestArray {
    pcs: Vec<u16>,
}

impl JumpdestArray {
    /// Scans `code` using `bitmap` to skip PUSH immediate data. The resulting
    /// sequence is strictly increasing by construction (single forward pass).
    pub fn scan(code: &Bytecode, bitmap: &CodeBitmap) -> Self {
        let mut pcs = Vec::new();
        for pc in 0..code.len() {
            if bitmap.is_opcode_start(pc) && code.byte_at(pc) == Some(Opcode::JumpDest.as_u8()) {
                // code.len() <= MAX_CONTRACT_SIZE (0x6000), well under u16::MAX.
                pcs.push(pc as u16);
            }
        }
        Self { pcs }
    }

    /// True iff `pc` is a recorded JUMPDEST position.
    pub fn is_valid_jumpdest(&self, pc: usize) -> bool {
        u16::try_from(pc)
            .is_ok_and(|pc| self.pcs.binary_search(&pc).is_ok())
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.pcs
    }

    pub fn len(&self) -> usize {
        self.pcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcs.is_empty()
    }
}
