//! The instruction stream's element type.
//!
//! The reference design embeds function pointers directly in `exec` and
//! `dynamic_gas` entries; this crate tags each entry with a [`HandlerId`] /
//! [`GasHandlerId`] instead; both exist because the handlers they conceptually
//! point to (arithmetic, storage, memory, calls) are not implemented in this
//! crate (see the design note in `DESIGN.md`). An interpreter dispatches on
//! the wrapped [`Opcode`] the same way it would on a function pointer.

use crate::opcodes::Opcode;

/// Tags an `exec` entry with the opcode whose handler the interpreter should
/// invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(pub Opcode);

/// Tags a `dynamic_gas` entry with the opcode whose dynamic-gas function the
/// interpreter should invoke before its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasHandlerId(pub Opcode);

/// An arithmetic opcode fused with an immediate PUSH operand (§4.5 peephole
/// table). Carries the operand as a back-reference into the bytecode rather
/// than an inline 256-bit value, the same trick [`Instruction::Word`] uses,
/// to keep the instruction payload small.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusedArithOp {
    Add,
    Mul,
    Sub,
    Div,
    And,
    Or,
    Xor,
}

impl FusedArithOp {
    pub const fn from_opcode(op: Opcode) -> Option<Self> {
        match op {
            Opcode::Add => Some(Self::Add),
            Opcode::Mul => Some(Self::Mul),
            Opcode::Sub => Some(Self::Sub),
            Opcode::Div => Some(Self::Div),
            Opcode::And => Some(Self::And),
            Opcode::Or => Some(Self::Or),
            Opcode::Xor => Some(Self::Xor),
            _ => None,
        }
    }
}

/// Marks whether an instruction is a dynamic jump site, and which kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpKind {
    #[default]
    None,
    Jump,
    Jumpi,
}

/// One entry of the emitted instruction stream.
///
/// A tagged enum rather than embedded function pointers or a struct-of-arrays
/// layout — the spec permits either; this shape matches how the teacher's
/// `Operation` enum represents a decoded instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Header of a basic block: aggregate gas and stack requirements the
    /// interpreter validates once on block entry.
    BlockBegin {
        gas: u32,
        stack_req: u16,
        stack_max_growth: u16,
    },
    /// Plain opcode; gas and stack already charged by the enclosing
    /// `BlockBegin`.
    Exec { handler: HandlerId },
    /// Opcode whose gas cost depends on runtime state (GAS, CALL family,
    /// CREATE family, SSTORE).
    DynamicGas {
        gas_fn: GasHandlerId,
        exec_fn: HandlerId,
    },
    /// PUSH immediate; `len=0` is PUSH0. The payload is a slice reference
    /// into the bytecode, not an inline value.
    Word { start_pc: u16, len: u8 },
    /// The PC opcode's fixed value.
    Pc { value: u16 },
    /// PUSH+ARITH fused with the immediate operand carried as a bytecode
    /// back-reference.
    FusedArithImm {
        op: FusedArithOp,
        imm_start_pc: u16,
        imm_len: u8,
    },
    /// PUSH+JUMP fused with a validated immediate target.
    JumpPc { dest: u16 },
    /// PUSH+JUMPI fused with a validated immediate target.
    ConditionalJumpPc { dest: u16 },
    /// JUMP whose destination must be resolved at runtime.
    JumpUnresolved,
    /// JUMPI whose destination must be resolved at runtime.
    ConditionalJumpUnresolved,
    /// Neutralized entry: a PUSH or DUP whose value was consumed into a
    /// fusion, or eliminated outright by an identity peephole. Advances PC
    /// only; pushes/pops nothing.
    None,
}

impl Instruction {
    pub const fn exec(op: Opcode) -> Self {
        Self::Exec {
            handler: HandlerId(op),
        }
    }

    pub const fn dynamic_gas(op: Opcode) -> Self {
        Self::DynamicGas {
            gas_fn: GasHandlerId(op),
            exec_fn: HandlerId(op),
        }
    }

    pub const fn is_block_begin(&self) -> bool {
        matches!(self, Self::BlockBegin { .. })
    }
}
