//! Jump resolver (§4.6): a retrofit pass over the finished instruction
//! stream, run once the emitter has produced every entry.

use tracing::debug;

use crate::bytecode::Bytecode;
use crate::emitter::{EmitOutput, SENTINEL_PC};
use crate::instruction::{Instruction, JumpKind};
use crate::jumpdest::JumpdestArray;

/// Output of both resolver passes, folded into the finished [`crate::analysis::CodeAnalysis`].
pub struct ResolvedAnalysis {
    pub instructions: Vec<Instruction>,
    pub instruction_jump_kind: Vec<JumpKind>,
    pub pc_to_block_start: Vec<u16>,
    pub instruction_to_pc: Vec<u16>,
}

/// Pass A: derive `pc_to_block_start` from the emitter's `pc_to_instruction`
/// map by walking backward to the nearest `BlockBegin`. Also derives the
/// inverse `instruction_to_pc` map.
fn pass_a(code_len: usize, instructions: &[Instruction], pc_to_instruction: &[u16]) -> (Vec<u16>, Vec<u16>) {
    let mut pc_to_block_start = vec![SENTINEL_PC; code_len];
    let mut instruction_to_pc = vec![SENTINEL_PC; instructions.len()];

    for (pc, &inst_index) in pc_to_instruction.iter().enumerate() {
        if inst_index == SENTINEL_PC {
            continue;
        }
        if instruction_to_pc[inst_index as usize] == SENTINEL_PC {
            instruction_to_pc[inst_index as usize] = pc as u16;
        }

        let mut search = inst_index as usize;
        loop {
            if instructions[search].is_block_begin() {
                pc_to_block_start[pc] = search as u16;
                break;
            }
            if search == 0 {
                break;
            }
            search -= 1;
        }
    }

    (pc_to_block_start, instruction_to_pc)
}

/// Pass B: for every `jump`/`jumpi` site, try to fuse the statically-known
/// destination carried by the immediately preceding `word` instruction.
fn pass_b(
    code: &Bytecode,
    jumpdests: &JumpdestArray,
    instructions: &mut [Instruction],
    jump_kind: &[JumpKind],
) {
    for index in 0..instructions.len() {
        let kind = jump_kind[index];
        if kind == JumpKind::None {
            continue;
        }

        let preceding_word = if index > 0 {
            match instructions[index - 1] {
                Instruction::Word { start_pc, len } => Some((start_pc, len)),
                _ => None,
            }
        } else {
            None
        };

        let Some((start_pc, len)) = preceding_word else {
            debug!(instruction = index, "jump left unresolved: no preceding push");
            continue;
        };

        let dest = crate::emitter::word_value_u16(code, start_pc, len);
        let Some(dest) = dest else {
            debug!(instruction = index, "jump left unresolved: destination does not fit in pc space");
            continue;
        };

        if dest as usize >= code.len() || !jumpdests.is_valid_jumpdest(dest as usize) {
            debug!(instruction = index, dest, "jump left unresolved: invalid destination");
            continue;
        }

        instructions[index] = match kind {
            JumpKind::Jump => Instruction::JumpPc { dest },
            JumpKind::Jumpi => Instruction::ConditionalJumpPc { dest },
            JumpKind::None => unreachable!(),
        };
        instructions[index - 1] = Instruction::None;
    }
}

pub fn resolve(code: &Bytecode, jumpdests: &JumpdestArray, emitted: EmitOutput) -> ResolvedAnalysis {
    let EmitOutput {
        mut instructions,
        jump_kind,
        pc_to_instruction,
    } = emitted;

    pass_b(code, jumpdests, &mut instructions, &jump_kind);
    let (pc_to_block_start, instruction_to_pc) = pass_a(code.len(), &instructions, &pc_to_instruction);

    ResolvedAnalysis {
        instructions,
        instruction_jump_kind: jump_kind,
        pc_to_block_start,
        instruction_to_pc,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::bitmap::CodeBitmap;
    use crate::constants::MAX_INSTRUCTIONS;
    use crate::metadata::OPCODE_METADATA;

    fn analyze_bytes(bytes: Vec<u8>) -> ResolvedAnalysis {
        let code = Bytecode::new(bytes).unwrap();
        let bitmap = CodeBitmap::build(&code);
        let jumpdests = JumpdestArray::scan(&code, &bitmap);
        let emitted = crate::emitter::emit(&code, &OPCODE_METADATA, MAX_INSTRUCTIONS).unwrap();
        resolve(&code, &jumpdests, emitted)
    }

    #[test]
    fn s3_forward_push_jump_resolves() {
        // PUSH1 3, JUMP, JUMPDEST, STOP
        let resolved = analyze_bytes(vec![0x60, 0x03, 0x56, 0x5B, 0x00]);
        assert!(resolved
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::JumpPc { dest: 3 })));
    }

    #[test]
    fn s5_invalid_jump_target_stays_unresolved() {
        // PUSH1 5, JUMP, PUSH1 0, PUSH1 1, STOP
        let resolved = analyze_bytes(vec![0x60, 0x05, 0x56, 0x60, 0x00, 0x60, 0x01, 0x00]);
        assert!(resolved
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::JumpUnresolved)));
    }

    #[test]
    fn pc_to_block_start_points_at_a_block_begin() {
        let resolved = analyze_bytes(vec![0x5B, 0x60, 0x01, 0x00]);
        for &slot in &resolved.pc_to_block_start {
            if slot != SENTINEL_PC {
                assert!(resolved.instructions[slot as usize].is_block_begin());
            }
        }
    }

    #[test]
    fn instruction_to_pc_is_non_decreasing() {
        let resolved = analyze_bytes(vec![0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
        let mut last_real = 0u16;
        for &pc in &resolved.instruction_to_pc {
            if pc != SENTINEL_PC {
                assert!(pc >= last_real);
                last_real = pc;
            }
        }
    }
}
