//! Instruction emitter (§4.5): the single authoritative forward pass over
//! decoded bytecode, driving basic-block accumulation and peephole fusion.
//!
//! Jump target resolution is deliberately *not* done here — that is a
//! retrofit pass over the finished stream, see [`crate::jump_resolver`].

use ethereum_types::U256;

use crate::block::BlockAnalysis;
use crate::bytecode::Bytecode;
use crate::constants::DECODE_LOOP_SAFETY_CAP;
use crate::errors::AnalysisError;
use crate::instruction::{FusedArithOp, Instruction, JumpKind};
use crate::metadata::{DynamicGasKind, OpcodeMetadata};
use crate::opcodes::Opcode;

pub const SENTINEL_PC: u16 = u16::MAX;

/// Everything the emitter produced, handed off to the jump resolver.
pub struct EmitOutput {
    pub instructions: Vec<Instruction>,
    pub jump_kind: Vec<JumpKind>,
    /// `pc_to_instruction[pc]`: the instruction index an opcode-start `pc`
    /// became, or [`SENTINEL_PC`] for PUSH-data / out-of-range positions.
    pub pc_to_instruction: Vec<u16>,
}

/// An instruction emitted but not yet charged against the current block,
/// because the next opcode might still fuse with or eliminate it.
#[derive(Clone, Copy)]
enum Pending {
    None,
    Push {
        index: usize,
        start_pc: u16,
        len: u8,
        meta: OpcodeMetadata,
    },
    Dup1 {
        index: usize,
        meta: OpcodeMetadata,
    },
    Dup1Push0 {
        dup_index: usize,
        push_index: usize,
        dup_meta: OpcodeMetadata,
    },
}

struct Emitter<'a> {
    code: &'a Bytecode,
    metadata: &'a [OpcodeMetadata; 256],
    max_instructions: usize,
    instructions: Vec<Instruction>,
    jump_kind: Vec<JumpKind>,
    pc_to_instruction: Vec<u16>,
    last_was_terminator: bool,
}

/// Reads the 256-bit value a `word { start_pc, len }` represents, treating
/// bytes past the end of the code as zero (truncated trailing PUSH, §4.1).
fn word_value(code: &Bytecode, start_pc: u16, len: u8) -> U256 {
    let mut buf = [0u8; 32];
    let len = len as usize;
    for i in 0..len {
        if let Some(byte) = code.byte_at(start_pc as usize + i) {
            buf[32 - len + i] = byte;
        }
    }
    U256::from_big_endian(&buf)
}

/// Reads a `word`'s value and narrows it to `u16`, for jump-target
/// resolution (§4.6 Pass B). `None` if the value does not fit.
pub(crate) fn word_value_u16(code: &Bytecode, start_pc: u16, len: u8) -> Option<u16> {
    let value = word_value(code, start_pc, len);
    if value > U256::from(u16::MAX) {
        None
    } else {
        Some(value.as_u32() as u16)
    }
}

impl<'a> Emitter<'a> {
    fn new(code: &'a Bytecode, metadata: &'a [OpcodeMetadata; 256], max_instructions: usize) -> Self {
        Self {
            code,
            metadata,
            max_instructions,
            instructions: Vec::new(),
            jump_kind: Vec::new(),
            pc_to_instruction: vec![SENTINEL_PC; code.len()],
            last_was_terminator: false,
        }
    }

    fn push_instruction(&mut self, inst: Instruction, kind: JumpKind) -> Result<usize, AnalysisError> {
        if self.instructions.len() >= self.max_instructions {
            return Err(AnalysisError::InstructionLimitExceeded);
        }
        self.instructions.push(inst);
        self.jump_kind.push(kind);
        Ok(self.instructions.len() - 1)
    }

    fn open_block(&mut self) -> Result<BlockAnalysis, AnalysisError> {
        let index = self.push_instruction(
            Instruction::BlockBegin {
                gas: 0,
                stack_req: 0,
                stack_max_growth: 0,
            },
            JumpKind::None,
        )?;
        Ok(BlockAnalysis::open(index))
    }

    fn close_block(&mut self, block: BlockAnalysis) {
        let (gas, stack_req, stack_max_growth) = block.close();
        self.instructions[block.begin_block_index] = Instruction::BlockBegin {
            gas,
            stack_req,
            stack_max_growth,
        };
    }

    /// Charges a deferred push/dup against the block because it turned out
    /// not to be fused or eliminated.
    fn flush(&mut self, pending: Pending, block: &mut BlockAnalysis) {
        match pending {
            Pending::None => {}
            Pending::Push { meta, .. } => block.accumulate(&meta),
            Pending::Dup1 { meta, .. } => block.accumulate(&meta),
            Pending::Dup1Push0 { dup_meta, .. } => {
                block.accumulate(&dup_meta);
                block.accumulate(&self.metadata[Opcode::Push0.as_u8() as usize]);
            }
        }
    }

    fn run(mut self) -> Result<EmitOutput, AnalysisError> {
        let len = self.code.len();
        let mut block = self.open_block()?;
        let mut pending = Pending::None;
        let mut pc = 0usize;
        let mut iterations = 0usize;

        while pc < len {
            iterations += 1;
            if iterations > DECODE_LOOP_SAFETY_CAP {
                return Err(AnalysisError::InstructionLimitExceeded);
            }

            let current_pc = pc;
            // Safe: current_pc < len by the loop condition.
            let byte = self.code.byte_at(current_pc).unwrap_or(0);
            let op = Opcode::from_u8(byte);
            let meta = self.metadata[byte as usize];

            // --- Peephole fusion against the pending instruction ---
            let fused_op = op.and_then(FusedArithOp::from_opcode);
            match (pending, op, fused_op) {
                (
                    Pending::Push { index, start_pc, len: push_len, meta: push_meta },
                    Some(arith_op),
                    Some(fused_op),
                ) => {
                    let value = word_value(self.code, start_pc, push_len);
                    let identity = match arith_op {
                        Opcode::Add => value.is_zero(),
                        Opcode::Mul | Opcode::Div => value == U256::one(),
                        _ => false,
                    };
                    if identity {
                        self.instructions[index] = Instruction::None;
                    } else {
                        block.accumulate(&push_meta);
                        block.accumulate(&meta);
                        self.instructions[index] = Instruction::FusedArithImm {
                            op: fused_op,
                            imm_start_pc: start_pc,
                            imm_len: push_len,
                        };
                    }
                    self.pc_to_instruction[current_pc] = index as u16;
                    self.last_was_terminator = false;
                    pending = Pending::None;
                    pc += 1;
                    continue;
                }
                (Pending::Push { index, .. }, Some(Opcode::Pop), _) => {
                    // PUSH v + POP: dead, eliminate both.
                    self.instructions[index] = Instruction::None;
                    self.pc_to_instruction[current_pc] = index as u16;
                    self.last_was_terminator = false;
                    pending = Pending::None;
                    pc += 1;
                    continue;
                }
                (Pending::Dup1 { index, .. }, Some(Opcode::Pop), _) => {
                    // DUP1 + POP: no-op, eliminate both.
                    self.instructions[index] = Instruction::None;
                    self.pc_to_instruction[current_pc] = index as u16;
                    self.last_was_terminator = false;
                    pending = Pending::None;
                    pc += 1;
                    continue;
                }
                (Pending::Dup1 { index, meta: dup_meta }, Some(Opcode::Push0), _) => {
                    // First two legs of DUP1 + PUSH0 + EQ -> ISZERO; keep
                    // deferred, waiting to see whether EQ follows.
                    let push_index = self.push_instruction(
                        Instruction::Word { start_pc: 0, len: 0 },
                        JumpKind::None,
                    )?;
                    self.pc_to_instruction[current_pc] = push_index as u16;
                    pending = Pending::Dup1Push0 {
                        dup_index: index,
                        push_index,
                        dup_meta,
                    };
                    pc += 1;
                    continue;
                }
                (Pending::Dup1Push0 { dup_index, push_index, dup_meta }, Some(Opcode::Eq), _) => {
                    // DUP1 survives: its duplicated value still needs to sit
                    // under the PUSH0 that becomes ISZERO's operand.
                    self.instructions[dup_index] = Instruction::exec(Opcode::Dup1);
                    block.accumulate(&dup_meta);
                    self.instructions[push_index] = Instruction::exec(Opcode::IsZero);
                    block.accumulate(&self.metadata[Opcode::IsZero.as_u8() as usize]);
                    self.pc_to_instruction[current_pc] = push_index as u16;
                    self.last_was_terminator = false;
                    pending = Pending::None;
                    pc += 1;
                    continue;
                }
                _ => {
                    self.flush(pending, &mut block);
                    pending = Pending::None;
                }
            }

            // --- Normal per-opcode dispatch (§4.5) ---
            let push_len_candidate = op.and_then(Opcode::push_size);
            match (op, push_len_candidate) {
                (Some(Opcode::JumpDest), _) => {
                    self.close_block(block);
                    block = self.open_block()?;
                    let idx = self.push_instruction(Instruction::exec(Opcode::JumpDest), JumpKind::None)?;
                    block.accumulate(&meta);
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.last_was_terminator = false;
                    pc += 1;
                }
                (Some(Opcode::Jump), _) => {
                    block.accumulate(&meta);
                    let idx = self.push_instruction(Instruction::JumpUnresolved, JumpKind::Jump)?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.close_block(block);
                    pc += 1;
                    self.last_was_terminator = true;
                    if pc < len {
                        block = self.open_block()?;
                    }
                }
                (Some(Opcode::Jumpi), _) => {
                    block.accumulate(&meta);
                    let idx = self.push_instruction(
                        Instruction::ConditionalJumpUnresolved,
                        JumpKind::Jumpi,
                    )?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.close_block(block);
                    pc += 1;
                    block = self.open_block()?;
                    self.last_was_terminator = false;
                }
                (Some(_), Some(push_len)) => {
                    let idx = self.push_instruction(
                        Instruction::Word {
                            start_pc: (current_pc + 1) as u16,
                            len: push_len,
                        },
                        JumpKind::None,
                    )?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    pending = Pending::Push {
                        index: idx,
                        start_pc: (current_pc + 1) as u16,
                        len: push_len,
                        meta,
                    };
                    self.last_was_terminator = false;
                    pc += 1 + push_len as usize;
                }
                (Some(Opcode::Dup1), _) => {
                    let idx = self.push_instruction(Instruction::exec(Opcode::Dup1), JumpKind::None)?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    pending = Pending::Dup1 { index: idx, meta };
                    pc += 1;
                }
                (Some(op), _) if meta.dynamic_gas_kind == DynamicGasKind::Dynamic => {
                    self.close_block(block);
                    let mut isolated = self.open_block()?;
                    isolated.accumulate(&meta);
                    let idx = self.push_instruction(Instruction::dynamic_gas(op), JumpKind::None)?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.close_block(isolated);
                    block = self.open_block()?;
                    self.last_was_terminator = false;
                    pc += 1;
                }
                (Some(Opcode::Pc), _) => {
                    block.accumulate(&meta);
                    let idx = self.push_instruction(
                        Instruction::Pc {
                            value: current_pc as u16,
                        },
                        JumpKind::None,
                    )?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.last_was_terminator = false;
                    pc += 1;
                }
                (Some(op), _) if op.is_terminator() => {
                    // Jump already handled above; this covers Stop, Return,
                    // Revert, Invalid, SelfDestruct.
                    block.accumulate(&meta);
                    let idx = self.push_instruction(Instruction::exec(op), JumpKind::None)?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.close_block(block);
                    pc += 1;
                    self.last_was_terminator = true;
                    if pc < len {
                        block = self.open_block()?;
                    }
                }
                (maybe_op, _) => {
                    // A defined, ordinary opcode, or an undefined byte
                    // lowered to INVALID (§4.1).
                    let effective = maybe_op.unwrap_or(Opcode::Invalid);
                    block.accumulate(&meta);
                    let idx = self.push_instruction(Instruction::exec(effective), JumpKind::None)?;
                    self.pc_to_instruction[current_pc] = idx as u16;
                    self.last_was_terminator = effective.is_terminator();
                    pc += 1;
                    if self.last_was_terminator {
                        self.close_block(block);
                        if pc < len {
                            block = self.open_block()?;
                        }
                    }
                }
            }
        }

        self.flush(pending, &mut block);

        if !self.last_was_terminator {
            block.accumulate(&self.metadata[Opcode::Stop.as_u8() as usize]);
            self.push_instruction(Instruction::exec(Opcode::Stop), JumpKind::None)?;
        }
        self.close_block(block);

        Ok(EmitOutput {
            instructions: self.instructions,
            jump_kind: self.jump_kind,
            pc_to_instruction: self.pc_to_instruction,
        })
    }
}

pub fn emit(
    code: &Bytecode,
    metadata: &[OpcodeMetadata; 256],
    max_instructions: usize,
) -> Result<EmitOutput, AnalysisError> {
    Emitter::new(code, metadata, max_instructions).run()
}
