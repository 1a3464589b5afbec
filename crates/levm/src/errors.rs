use thiserror::Error;

use crate::constants::{MAX_CONTRACT_SIZE, MAX_INSTRUCTIONS};

/// Errors surfaced by bytecode analysis.
///
/// None of these are recoverable within `analyze` itself; every error path
/// releases whatever partial allocations were made before the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("code length {len} exceeds MAX_CONTRACT_SIZE ({MAX_CONTRACT_SIZE})")]
    CodeTooLarge { len: usize },

    #[error("emission would exceed MAX_INSTRUCTIONS ({MAX_INSTRUCTIONS})")]
    InstructionLimitExceeded,

    #[error("allocator could not satisfy a request during analysis")]
    AllocationFailed,
}
