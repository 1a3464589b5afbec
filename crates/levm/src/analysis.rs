//! The finished artifact (§4.7) and the `analyze` entry point.

use tracing::trace_span;

use crate::bitmap::CodeBitmap;
use crate::bytecode::Bytecode;
use crate::constants::MAX_INSTRUCTIONS;
use crate::emitter;
use crate::errors::AnalysisError;
use crate::instruction::{Instruction, JumpKind};
use crate::jump_resolver::{self, ResolvedAnalysis};
use crate::jumpdest::JumpdestArray;
use crate::metadata::OpcodeMetadata;

/// Caps an embedder can tighten for its own purposes; `MAX_CONTRACT_SIZE`
/// itself is enforced unconditionally by [`Bytecode::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisLimits {
    pub max_instructions: usize,
}

impl Default for AnalysisLimits {
    fn default() -> Self {
        Self {
            max_instructions: MAX_INSTRUCTIONS,
        }
    }
}

/// The execution-ready artifact produced by [`analyze`].
///
/// Immutable after construction; every field is freed on drop, including on
/// an error path unwound mid-construction (ordinary Rust ownership, no
/// explicit arena handle needed — see `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct CodeAnalysis {
    instructions: Vec<Instruction>,
    pc_to_block_start: Vec<u16>,
    instruction_to_pc: Vec<u16>,
    instruction_jump_kind: Vec<JumpKind>,
    jumpdest_array: JumpdestArray,
    code: Bytecode,
}

/// Sentinel stored in `pc_to_block_start` for PC positions inside PUSH data
/// or otherwise unmapped.
pub const SENTINEL: u16 = u16::MAX;

impl CodeAnalysis {
    /// The instruction at stream index `i`, or `None` if out of range.
    pub fn instruction(&self, i: usize) -> Option<&Instruction> {
        self.instructions.get(i)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// True iff `pc` is a valid JUMPDEST: in-bounds, a JUMPDEST byte, and not
    /// PUSH immediate data.
    pub fn is_valid_jumpdest(&self, pc: usize) -> bool {
        self.jumpdest_array.is_valid_jumpdest(pc)
    }

    /// The instruction index of the `BlockBegin` enclosing `pc`, or `None` if
    /// `pc` is not an opcode-start position.
    pub fn block_for_pc(&self, pc: usize) -> Option<usize> {
        self.pc_to_block_start
            .get(pc)
            .copied()
            .filter(|&slot| slot != SENTINEL)
            .map(|slot| slot as usize)
    }

    /// The raw bytecode byte at `pc`, or `None` past the end of the code.
    pub fn byte_at(&self, pc: usize) -> Option<u8> {
        self.code.byte_at(pc)
    }

    pub fn code_len(&self) -> usize {
        self.code.len()
    }

    /// The originating PC of `instructions()[i]`, for tracing/debugging.
    pub fn instruction_pc(&self, i: usize) -> Option<u16> {
        self.instruction_to_pc
            .get(i)
            .copied()
            .filter(|&pc| pc != SENTINEL)
    }

    pub fn jump_kind(&self, i: usize) -> Option<JumpKind> {
        self.instruction_jump_kind.get(i).copied()
    }
}

/// Produces a [`CodeAnalysis`] from raw bytecode and a caller-supplied opcode
/// metadata table (§4).
pub fn analyze(
    code: Bytecode,
    metadata: &[OpcodeMetadata; 256],
    limits: AnalysisLimits,
) -> Result<CodeAnalysis, AnalysisError> {
    let span = trace_span!("analyze", code_len = code.len());
    let _enter = span.enter();

    let bitmap = CodeBitmap::build(&code);
    let jumpdest_array = JumpdestArray::scan(&code, &bitmap);

    let emitted = emitter::emit(&code, metadata, limits.max_instructions)?;

    let ResolvedAnalysis {
        instructions,
        instruction_jump_kind,
        pc_to_block_start,
        instruction_to_pc,
    } = jump_resolver::resolve(&code, &jumpdest_array, emitted);

    Ok(CodeAnalysis {
        instructions,
        pc_to_block_start,
        instruction_to_pc,
        instruction_jump_kind,
        jumpdest_array,
        code,
    })
}
