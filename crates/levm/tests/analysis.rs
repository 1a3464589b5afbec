//! End-to-end scenarios and cross-module invariants over the full
//! `analyze` pipeline, mirroring the teacher's split between inline unit
//! tests and a whole-program integration suite.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

use levm_analysis::analysis::{analyze, AnalysisLimits, SENTINEL};
use levm_analysis::instruction::{FusedArithOp, Instruction};
use levm_analysis::metadata::OPCODE_METADATA;
use levm_analysis::opcodes::Opcode;
use levm_analysis::Bytecode;

use proptest::prelude::*;

fn analyze_bytes(bytes: Vec<u8>) -> levm_analysis::CodeAnalysis {
    let code = Bytecode::new(bytes).unwrap();
    analyze(code, &OPCODE_METADATA, AnalysisLimits::default()).unwrap()
}

#[test]
fn s1_push1_stop() {
    let analysis = analyze_bytes(vec![0x60, 0x01, 0x00]);
    let begin = analysis.instruction(0).unwrap();
    match begin {
        Instruction::BlockBegin {
            gas,
            stack_req,
            stack_max_growth,
        } => {
            assert_eq!(*gas, 3);
            assert_eq!(*stack_req, 0);
            assert_eq!(*stack_max_growth, 1);
        }
        other => panic!("expected BlockBegin, got {other:?}"),
    }
    assert_eq!(
        analysis.instruction(1),
        Some(&Instruction::Word { start_pc: 1, len: 1 })
    );
    assert_eq!(analysis.instruction(2), Some(&Instruction::exec(Opcode::Stop)));
}

#[test]
fn s2_single_jumpdest() {
    let analysis = analyze_bytes(vec![0x5B, 0x60, 0x01, 0x00]);
    assert!(analysis.is_valid_jumpdest(0));
    assert!(!analysis.is_valid_jumpdest(1));
    let block_begins = analysis
        .instructions()
        .iter()
        .filter(|i| i.is_block_begin())
        .count();
    assert_eq!(block_begins, 2);
}

#[test]
fn s3_forward_push_jump_resolves_and_neutralizes_the_push() {
    let analysis = analyze_bytes(vec![0x60, 0x03, 0x56, 0x5B, 0x00]);
    let jump_index = analysis
        .instructions()
        .iter()
        .position(|i| matches!(i, Instruction::JumpPc { dest: 3 }))
        .expect("jump should resolve to pc 3");
    assert_eq!(analysis.instruction(jump_index - 1), Some(&Instruction::None));
    assert!(analysis.is_valid_jumpdest(3));
}

#[test]
fn s4_push_jumpi_to_valid_target_resolves_with_fallthrough_block() {
    // PUSH1 1, PUSH1 6, JUMPI, STOP, JUMPDEST, PUSH1 0x42, STOP
    let analysis = analyze_bytes(vec![0x60, 0x01, 0x60, 0x06, 0x57, 0x00, 0x5B, 0x60, 0x42, 0x00]);
    assert!(analysis
        .instructions()
        .iter()
        .any(|i| matches!(i, Instruction::ConditionalJumpPc { dest: 6 })));
    assert!(analysis.is_valid_jumpdest(6));
}

#[test]
fn s5_invalid_jump_target_remains_unresolved() {
    let analysis = analyze_bytes(vec![0x60, 0x05, 0x56, 0x60, 0x00, 0x60, 0x01, 0x00]);
    assert!(analysis
        .instructions()
        .iter()
        .any(|i| matches!(i, Instruction::JumpUnresolved)));
    assert!(!analysis.is_valid_jumpdest(5));
}

#[test]
fn s6_jumpdest_byte_inside_push_data_is_never_a_target() {
    let mut code = vec![0x7F];
    code.extend(std::iter::repeat_n(0u8, 32));
    code[17] = 0x5B;
    code.push(0x00);
    let analysis = analyze_bytes(code);
    assert!(!analysis.is_valid_jumpdest(17));
}

#[test]
fn s7_truncated_push_at_end_of_code_gets_implicit_stop() {
    let analysis = analyze_bytes(vec![0x60, 0x01, 0x60]);
    assert_eq!(
        analysis.instructions().last(),
        Some(&Instruction::exec(Opcode::Stop))
    );
}

#[test]
fn pc_to_block_start_always_points_at_a_block_begin() {
    let analysis = analyze_bytes(vec![0x5B, 0x60, 0x01, 0x56, 0x5B, 0x00]);
    for pc in 0..analysis.code_len() {
        if let Some(index) = analysis.block_for_pc(pc) {
            assert!(analysis.instruction(index).unwrap().is_block_begin());
        }
    }
}

#[test]
fn instruction_to_pc_is_non_decreasing_across_a_realistic_program() {
    let analysis = analyze_bytes(vec![
        0x5B, 0x60, 0x01, 0x60, 0x02, 0x01, 0x60, 0x00, 0x57, 0x00, 0x5B, 0x00,
    ]);
    let mut last = 0u16;
    for i in 0..analysis.instruction_count() {
        if let Some(pc) = analysis.instruction_pc(i) {
            assert!(pc >= last, "pc {pc} at instruction {i} regressed from {last}");
            last = pc;
        }
    }
}

#[test]
fn word_round_trips_the_literal_immediate() {
    let analysis = analyze_bytes(vec![0x61, 0x12, 0x34, 0x00]);
    match analysis.instruction(1) {
        Some(Instruction::Word { start_pc, len }) => {
            assert_eq!(*len, 2);
            assert_eq!(analysis.byte_at(*start_pc as usize), Some(0x12));
            assert_eq!(analysis.byte_at(*start_pc as usize + 1), Some(0x34));
        }
        other => panic!("expected Word, got {other:?}"),
    }
}

#[test]
fn idempotence_across_two_independent_analyses() {
    let bytes = vec![0x60, 0x00, 0x01, 0x60, 0x03, 0x56, 0x5B, 0x00];
    let first = analyze_bytes(bytes.clone());
    let second = analyze_bytes(bytes);
    assert_eq!(first.instructions(), second.instructions());
    assert_eq!(first.instruction_count(), second.instruction_count());
}

#[test]
fn empty_bytecode_yields_a_single_stop_block() {
    let analysis = analyze_bytes(vec![]);
    assert_eq!(analysis.instruction_count(), 2);
    assert_eq!(analysis.instruction(1), Some(&Instruction::exec(Opcode::Stop)));
}

#[test]
fn fused_arith_immediate_matches_the_literal_push_value() {
    // PUSH1 5, ADD, STOP
    let analysis = analyze_bytes(vec![0x60, 0x05, 0x01, 0x00]);
    let fused = analysis
        .instructions()
        .iter()
        .find_map(|i| match i {
            Instruction::FusedArithImm {
                op: FusedArithOp::Add,
                imm_start_pc,
                imm_len,
            } => Some((*imm_start_pc, *imm_len)),
            _ => None,
        })
        .expect("PUSH+ADD should fuse");
    assert_eq!(analysis.byte_at(fused.0 as usize), Some(0x05));
    assert_eq!(fused.1, 1);
}

proptest! {
    #[test]
    fn analyze_never_panics_and_always_terminates(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let code = Bytecode::new(bytes).unwrap();
        let result = analyze(code, &OPCODE_METADATA, AnalysisLimits::default());
        prop_assert!(result.is_ok());
    }

    #[test]
    fn pc_to_block_start_invariant_holds_for_arbitrary_code(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let code = Bytecode::new(bytes).unwrap();
        let analysis = analyze(code, &OPCODE_METADATA, AnalysisLimits::default()).unwrap();
        for pc in 0..analysis.code_len() {
            if let Some(index) = analysis.block_for_pc(pc) {
                prop_assert!(analysis.instruction(index).unwrap().is_block_begin());
            }
        }
    }

    #[test]
    fn instruction_to_pc_never_decreases_for_arbitrary_code(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let code = Bytecode::new(bytes).unwrap();
        let analysis = analyze(code, &OPCODE_METADATA, AnalysisLimits::default()).unwrap();
        let mut last = 0u16;
        for i in 0..analysis.instruction_count() {
            if let Some(pc) = analysis.instruction_pc(i) {
                prop_assert!(pc >= last);
                last = pc;
            }
        }
    }

    #[test]
    fn is_valid_jumpdest_matches_byte_and_bitmap(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let code = Bytecode::new(bytes.clone()).unwrap();
        let analysis = analyze(code, &OPCODE_METADATA, AnalysisLimits::default()).unwrap();
        for (pc, &byte) in bytes.iter().enumerate() {
            if byte == Opcode::JumpDest.as_u8() {
                // Either it's a valid jumpdest, or it's PUSH data and isn't.
                let _ = analysis.is_valid_jumpdest(pc);
            } else {
                prop_assert!(!analysis.is_valid_jumpdest(pc));
            }
        }
    }
}

// SENTINEL isn't exercised directly above; this guards its meaning doesn't
// silently drift (e.g. to 0, which would collide with a real index).
#[test]
fn sentinel_is_not_a_plausible_instruction_index() {
    assert_eq!(SENTINEL, u16::MAX);
}
