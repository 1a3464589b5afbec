//! Per-opcode static facts the block analyzer and emitter need: constant
//! gas, stack requirements, and a few behavioral flags. Analogous in spirit
//! to revm's `OpCodeInfo` / `OPCODE_INFO_JUMPTABLE`, but shaped around what
//! this crate's block analyzer consumes rather than an interpreter's
//! dispatch table.

use crate::opcodes::Opcode;

/// Tags opcodes whose gas cost depends on runtime state and therefore cannot
/// be folded into a block's static `gas_cost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicGasKind {
    /// Gas is fully static; charged entirely through the block's `gas_cost`.
    None,
    /// `GAS`, `SSTORE`, the `CALL` family, `CREATE`/`CREATE2`: isolated into
    /// their own single-instruction block (§4.5).
    Dynamic,
}

/// Static facts about one of the 256 opcodes, as provided by the caller's
/// fork rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeMetadata {
    pub constant_gas: u32,
    pub min_stack: u8,
    pub net_stack_delta: i8,
    pub is_undefined: bool,
    pub push_size: u8,
    pub is_terminator: bool,
    pub dynamic_gas_kind: DynamicGasKind,
}

impl OpcodeMetadata {
    const UNDEFINED: OpcodeMetadata = OpcodeMetadata {
        constant_gas: 0,
        min_stack: 0,
        net_stack_delta: 0,
        is_undefined: true,
        push_size: 0,
        is_terminator: false,
        dynamic_gas_kind: DynamicGasKind::None,
    };

    const fn op(
        constant_gas: u32,
        min_stack: u8,
        net_stack_delta: i8,
        is_terminator: bool,
    ) -> OpcodeMetadata {
        OpcodeMetadata {
            constant_gas,
            min_stack,
            net_stack_delta,
            is_undefined: false,
            push_size: 0,
            is_terminator,
            dynamic_gas_kind: DynamicGasKind::None,
        }
    }

    const fn dynamic(min_stack: u8, net_stack_delta: i8) -> OpcodeMetadata {
        OpcodeMetadata {
            constant_gas: 0,
            min_stack,
            net_stack_delta,
            is_undefined: false,
            push_size: 0,
            is_terminator: false,
            dynamic_gas_kind: DynamicGasKind::Dynamic,
        }
    }

    const fn push(n: u8) -> OpcodeMetadata {
        OpcodeMetadata {
            constant_gas: if n == 0 { 2 } else { 3 },
            min_stack: 0,
            net_stack_delta: 1,
            is_undefined: false,
            push_size: n,
            is_terminator: false,
            dynamic_gas_kind: DynamicGasKind::None,
        }
    }

    const fn dup(n: u8) -> OpcodeMetadata {
        OpcodeMetadata {
            constant_gas: 3,
            min_stack: n,
            net_stack_delta: 1,
            is_undefined: false,
            push_size: 0,
            is_terminator: false,
            dynamic_gas_kind: DynamicGasKind::None,
        }
    }

    const fn swap(n: u8) -> OpcodeMetadata {
        OpcodeMetadata {
            constant_gas: 3,
            min_stack: n + 1,
            net_stack_delta: 0,
            is_undefined: false,
            push_size: 0,
            is_terminator: false,
            dynamic_gas_kind: DynamicGasKind::None,
        }
    }

    const fn log(n: u8) -> OpcodeMetadata {
        OpcodeMetadata {
            constant_gas: 375 + 375 * n as u32,
            min_stack: 2 + n,
            net_stack_delta: -(2 + n as i8),
            is_undefined: false,
            push_size: 0,
            is_terminator: false,
            dynamic_gas_kind: DynamicGasKind::None,
        }
    }
}

/// The full 256-entry table, indexed by raw opcode byte.
///
/// Constant gas values are Cancun-era base costs; a caller targeting a
/// different fork rule set supplies its own table (§6 — the fork rule
/// selection itself is out of scope for this crate).
pub const OPCODE_METADATA: [OpcodeMetadata; 256] = build_table();

const fn build_table() -> [OpcodeMetadata; 256] {
    let mut table = [OpcodeMetadata::UNDEFINED; 256];

    table[Opcode::Stop.as_u8() as usize] = OpcodeMetadata::op(0, 0, 0, true);
    table[Opcode::Add.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Mul.as_u8() as usize] = OpcodeMetadata::op(5, 2, -1, false);
    table[Opcode::Sub.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Div.as_u8() as usize] = OpcodeMetadata::op(5, 2, -1, false);
    table[Opcode::SDiv.as_u8() as usize] = OpcodeMetadata::op(5, 2, -1, false);
    table[Opcode::Mod.as_u8() as usize] = OpcodeMetadata::op(5, 2, -1, false);
    table[Opcode::SMod.as_u8() as usize] = OpcodeMetadata::op(5, 2, -1, false);
    table[Opcode::AddMod.as_u8() as usize] = OpcodeMetadata::op(8, 3, -2, false);
    table[Opcode::MulMod.as_u8() as usize] = OpcodeMetadata::op(8, 3, -2, false);
    table[Opcode::Exp.as_u8() as usize] = OpcodeMetadata::op(10, 2, -1, false);
    table[Opcode::SignExtend.as_u8() as usize] = OpcodeMetadata::op(5, 2, -1, false);

    table[Opcode::Lt.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Gt.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Slt.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Sgt.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Eq.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::IsZero.as_u8() as usize] = OpcodeMetadata::op(3, 1, 0, false);
    table[Opcode::And.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Or.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Xor.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Not.as_u8() as usize] = OpcodeMetadata::op(3, 1, 0, false);
    table[Opcode::Byte.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Shl.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Shr.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);
    table[Opcode::Sar.as_u8() as usize] = OpcodeMetadata::op(3, 2, -1, false);

    table[Opcode::Keccak256.as_u8() as usize] = OpcodeMetadata::op(30, 2, -1, false);

    table[Opcode::Address.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::Balance.as_u8() as usize] = OpcodeMetadata::op(100, 1, 0, false);
    table[Opcode::Origin.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::Caller.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::CallValue.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::CallDataLoad.as_u8() as usize] = OpcodeMetadata::op(3, 1, 0, false);
    table[Opcode::CallDataSize.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::CallDataCopy.as_u8() as usize] = OpcodeMetadata::op(3, 3, -3, false);
    table[Opcode::CodeSize.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::CodeCopy.as_u8() as usize] = OpcodeMetadata::op(3, 3, -3, false);
    table[Opcode::GasPrice.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::ExtCodeSize.as_u8() as usize] = OpcodeMetadata::op(100, 1, 0, false);
    table[Opcode::ExtCodeCopy.as_u8() as usize] = OpcodeMetadata::op(100, 4, -4, false);
    table[Opcode::ReturnDataSize.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::ReturnDataCopy.as_u8() as usize] = OpcodeMetadata::op(3, 3, -3, false);
    table[Opcode::ExtCodeHash.as_u8() as usize] = OpcodeMetadata::op(100, 1, 0, false);

    table[Opcode::BlockHash.as_u8() as usize] = OpcodeMetadata::op(20, 1, 0, false);
    table[Opcode::Coinbase.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::Timestamp.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::Number.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::PrevRandao.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::GasLimit.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::ChainId.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::SelfBalance.as_u8() as usize] = OpcodeMetadata::op(5, 0, 1, false);
    table[Opcode::BaseFee.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::BlobHash.as_u8() as usize] = OpcodeMetadata::op(3, 1, 0, false);
    table[Opcode::BlobBaseFee.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);

    table[Opcode::Pop.as_u8() as usize] = OpcodeMetadata::op(2, 1, -1, false);
    table[Opcode::MLoad.as_u8() as usize] = OpcodeMetadata::op(3, 1, 0, false);
    table[Opcode::MStore.as_u8() as usize] = OpcodeMetadata::op(3, 2, -2, false);
    table[Opcode::MStore8.as_u8() as usize] = OpcodeMetadata::op(3, 2, -2, false);
    table[Opcode::SLoad.as_u8() as usize] = OpcodeMetadata::op(100, 1, 0, false);
    table[Opcode::SStore.as_u8() as usize] = OpcodeMetadata::dynamic(2, -2);
    table[Opcode::Jump.as_u8() as usize] = OpcodeMetadata::op(8, 1, -1, true);
    table[Opcode::Jumpi.as_u8() as usize] = OpcodeMetadata::op(10, 2, -2, false);
    table[Opcode::Pc.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::MSize.as_u8() as usize] = OpcodeMetadata::op(2, 0, 1, false);
    table[Opcode::Gas.as_u8() as usize] = OpcodeMetadata::dynamic(0, 1);
    table[Opcode::JumpDest.as_u8() as usize] = OpcodeMetadata::op(1, 0, 0, false);
    table[Opcode::TLoad.as_u8() as usize] = OpcodeMetadata::op(100, 1, 0, false);
    table[Opcode::TStore.as_u8() as usize] = OpcodeMetadata::op(100, 2, -2, false);
    table[Opcode::MCopy.as_u8() as usize] = OpcodeMetadata::op(3, 3, -3, false);

    table[Opcode::Push0.as_u8() as usize] = OpcodeMetadata::push(0);
    let mut n = 1u8;
    while n <= 32 {
        table[(Opcode::Push1.as_u8() + n - 1) as usize] = OpcodeMetadata::push(n);
        n += 1;
    }

    let mut n = 1u8;
    while n <= 16 {
        table[(Opcode::Dup1.as_u8() + n - 1) as usize] = OpcodeMetadata::dup(n);
        table[(Opcode::Swap1.as_u8() + n - 1) as usize] = OpcodeMetadata::swap(n);
        n += 1;
    }

    let mut n = 0u8;
    while n <= 4 {
        table[(Opcode::Log0.as_u8() + n) as usize] = OpcodeMetadata::log(n);
        n += 1;
    }

    table[Opcode::Create.as_u8() as usize] = OpcodeMetadata::dynamic(3, -2);
    table[Opcode::Call.as_u8() as usize] = OpcodeMetadata::dynamic(7, -6);
    table[Opcode::CallCode.as_u8() as usize] = OpcodeMetadata::dynamic(7, -6);
    table[Opcode::Return.as_u8() as usize] = OpcodeMetadata::op(0, 2, -2, true);
    table[Opcode::DelegateCall.as_u8() as usize] = OpcodeMetadata::dynamic(6, -5);
    table[Opcode::Create2.as_u8() as usize] = OpcodeMetadata::dynamic(4, -3);
    table[Opcode::StaticCall.as_u8() as usize] = OpcodeMetadata::dynamic(6, -5);
    table[Opcode::Revert.as_u8() as usize] = OpcodeMetadata::op(0, 2, -2, true);
    // INVALID is itself a defined, always-terminating opcode: distinct from
    // an undefined byte, which also lowers to it at emission time.
    table[Opcode::Invalid.as_u8() as usize] = OpcodeMetadata::op(0, 0, 0, true);
    table[Opcode::SelfDestruct.as_u8() as usize] = OpcodeMetadata::op(5000, 1, -1, true);

    table
}

/// Looks up metadata for a raw opcode byte. Bytes that name no defined
/// opcode carry `UNDEFINED` metadata, lowering to the `INVALID` handler.
pub fn metadata_for(byte: u8) -> &'static OpcodeMetadata {
    &OPCODE_METADATA[byte as usize]
}
