/// Maximum size of deployed contract bytecode (EIP-170).
pub const MAX_CONTRACT_SIZE: usize = 0x6000;

/// Upper bound on the number of instructions a single analysis may emit.
pub const MAX_INSTRUCTIONS: usize = 65536;

/// Safety cap on the decode loop, guarding against a non-advancing iteration bug.
pub const DECODE_LOOP_SAFETY_CAP: usize = 2 * MAX_CONTRACT_SIZE;

/// Maximum EVM stack depth.
pub const STACK_LIMIT: usize = 1024;
