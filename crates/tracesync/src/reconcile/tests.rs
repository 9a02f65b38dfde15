use super::*;
use crate::trace::MemAccess;

const ADDI_X11_5: u32 = 0x0050_0593; // addi x11, x0, 5
const ADDI_X12_6: u32 = 0x0060_0613; // addi x12, x0, 6
const NOP: u32 = 0x0000_0013; // addi x0, x0, 0
const LW_X0: u32 = 0x0002_a003; // lw x0, 0(x5)
const LW_X5: u32 = 0x0182_a283; // lw x5, 24(x5)
const JAL_X1_8: u32 = 0x0080_00ef; // jal x1, 8
const BEQ: u32 = 0x0000_0463; // beq x0, x0, 8
const SB: u32 = 0x00b1_0123; // sb x11, 2(x2)
const SH: u32 = 0x00b1_1123; // sh x11, 2(x2)
const SW: u32 = 0x00b1_2123; // sw x11, 2(x2)
const CSRR_A0_MHARTID: u32 = 0xf140_2573;

fn golden(pc: u32, instr: u32) -> GoldenEntry {
    GoldenEntry {
        pc,
        instr,
        target_reg: None,
        reg_val: None,
        mem_addr: None,
        mem_val: None,
    }
}

fn golden_reg(pc: u32, instr: u32, reg: u8, value: u32) -> GoldenEntry {
    GoldenEntry {
        target_reg: Some(reg),
        reg_val: Some(value),
        ..golden(pc, instr)
    }
}

fn golden_store(pc: u32, instr: u32, addr: u32, value: u32) -> GoldenEntry {
    GoldenEntry {
        mem_addr: Some(addr),
        mem_val: Some(value),
        ..golden(pc, instr)
    }
}

fn dut(fetches: &[(u32, u32)], commits: &[(u8, u32)], accesses: &[(u32, u32)]) -> FragmentedTrace {
    FragmentedTrace {
        fetches: fetches.iter().copied().map(Fetch::from).collect(),
        regfile_commits: commits.iter().copied().map(RegCommit::from).collect(),
        memory_accesses: accesses.iter().copied().map(MemAccess::from).collect(),
    }
}

fn run(golden: &[GoldenEntry], dut: FragmentedTrace) -> Reconciliation {
    reconcile("test", golden, dut, &Config::default())
}

#[test]
fn test_single_register_write() {
    let result = run(
        &[golden_reg(0, ADDI_X11_5, 11, 5)],
        dut(&[(0, ADDI_X11_5)], &[(11, 5)], &[]),
    );

    assert!(result.is_complete());
    assert_eq!(result.entries.len(), 1);
    let entry = result.entries[0];
    assert!(!entry.speculative_fetch);
    assert!(!entry.speculative_commit);
    assert_eq!(entry.target_reg, Some(11));
    assert_eq!(entry.reg_val, Some(5));
    assert_eq!(
        result.cursors,
        StreamCursors {
            fetch_idx: 1,
            commit_idx: 1,
            mem_idx: 0
        }
    );
}

#[test]
fn test_out_of_range_golden_register_leaves_shadow_untouched() {
    let result = run(
        &[golden_reg(0, ADDI_X11_5, 40, 5)],
        dut(&[(0, ADDI_X11_5)], &[(11, 5)], &[]),
    );

    assert!(result.is_complete());
    assert_eq!(result.entries[0].target_reg, Some(11));
    assert_eq!(result.stats.synthesized_commits, 0);
}

#[test]
fn test_speculative_fetch_is_emitted_in_fetch_order() {
    let result = run(
        &[golden_reg(0x100, ADDI_X11_5, 11, 5)],
        dut(&[(0x0FC, NOP), (0x100, ADDI_X11_5)], &[(11, 5)], &[]),
    );

    assert!(result.is_complete());
    assert_eq!(result.entries.len(), 2);
    assert!(result.entries[0].speculative_fetch);
    assert_eq!(result.entries[0].pc, 0x0FC);
    assert_eq!(result.entries[0].target_reg, None);
    assert!(!result.entries[1].speculative_fetch);
    assert_eq!(result.entries[1].reg_val, Some(5));
    assert_eq!(result.stats.speculative_fetches, 1);
}

#[test]
fn test_zero_register_never_consumes_commit() {
    let result = run(
        &[
            golden(0, NOP),
            golden(4, LW_X0),
            golden(8, 0x0000_006f), // jal x0, 0
            golden_reg(12, ADDI_X11_5, 11, 5),
        ],
        dut(
            &[(0, NOP), (4, LW_X0), (8, 0x0000_006f), (12, ADDI_X11_5)],
            &[(11, 5)],
            &[],
        ),
    );

    assert!(result.is_complete());
    for entry in &result.entries[..3] {
        assert_eq!(entry.target_reg, None);
    }
    assert_eq!(result.entries[3].target_reg, Some(11));
    assert_eq!(result.cursors.commit_idx, 1);
}

#[test]
fn test_repeated_write_synthesizes_commit() {
    let result = run(
        &[
            golden_reg(0, ADDI_X11_5, 11, 5),
            golden_reg(4, ADDI_X11_5, 11, 5),
        ],
        dut(&[(0, ADDI_X11_5), (4, ADDI_X11_5)], &[(11, 5)], &[]),
    );

    assert!(result.is_complete());
    assert!(!result.entries[0].speculative_commit);
    assert!(result.entries[1].speculative_commit);
    assert_eq!(result.entries[1].target_reg, Some(11));
    assert_eq!(result.entries[1].reg_val, Some(5));
    assert_eq!(result.cursors.commit_idx, 2);
    assert_eq!(result.stats.synthesized_commits, 1);
}

#[test]
fn test_write_of_reset_value_is_synthesized() {
    // addi x11, x0, 0 leaves x11 at its reset value.
    let result = run(
        &[golden_reg(0, 0x0000_0593, 11, 0)],
        dut(&[(0, 0x0000_0593)], &[], &[]),
    );

    assert!(result.is_complete());
    assert!(result.entries[0].speculative_commit);
    assert_eq!(result.entries[0].reg_val, Some(0));
}

#[test]
fn test_repeated_write_synthesized_once_across_speculation() {
    let result = run(
        &[
            golden_reg(0, ADDI_X11_5, 11, 5),
            golden_reg(4, ADDI_X11_5, 11, 5),
            golden_reg(8, ADDI_X12_6, 12, 6),
        ],
        dut(
            &[(0, ADDI_X11_5), (0x40, NOP), (0x44, NOP), (4, ADDI_X11_5), (8, ADDI_X12_6)],
            &[(11, 5), (12, 6)],
            &[],
        ),
    );

    assert!(result.is_complete());
    assert_eq!(result.stats.synthesized_commits, 1);
    assert_eq!(result.stats.speculative_fetches, 2);
    assert!(!result.entries[1].speculative_commit);
    assert!(result.entries[3].speculative_commit);
    assert_eq!(result.entries[4].target_reg, Some(12));
    assert_eq!(result.entries[4].reg_val, Some(6));
    assert_eq!(result.cursors.commit_idx, 3);
}

#[test]
fn test_unconsumed_synthetic_commit_is_dropped() {
    // csrr is outside the classified subset, so its register effect is never
    // matched; the synthetic commit must not shift the next instruction.
    let result = run(
        &[
            golden_reg(0, CSRR_A0_MHARTID, 10, 0),
            golden_reg(4, ADDI_X11_5, 11, 5),
        ],
        dut(&[(0, CSRR_A0_MHARTID), (4, ADDI_X11_5)], &[(11, 5)], &[]),
    );

    assert!(result.is_complete());
    assert!(result.entries[0].speculative_fetch);
    assert!(!result.entries[0].speculative_commit);
    assert_eq!(result.entries[1].target_reg, Some(11));
    assert_eq!(result.stats.unknown_instructions, 1);
    assert_eq!(result.stats.synthesized_commits, 0);
    assert_eq!(result.cursors.commit_idx, 1);
}

#[test]
fn test_store_narrowing_uses_golden_byte_lane() {
    let raw = 0xAABB_CCDD;
    let result = run(
        &[
            golden_store(0, SB, 0x1002, 0xBB),
            golden_store(4, SH, 0x1002, 0xAABB),
            golden_store(8, SW, 0x1000, raw),
        ],
        dut(
            &[(0, SB), (4, SH), (8, SW)],
            &[],
            &[(0x1000, raw), (0x1000, raw), (0x1000, raw)],
        ),
    );

    assert!(result.is_complete());
    assert_eq!(result.entries[0].mem_val, Some(0xBB));
    assert_eq!(result.entries[1].mem_val, Some(0xAABB));
    assert_eq!(result.entries[2].mem_val, Some(raw));
    // The DUT-reported address is kept as is.
    assert_eq!(result.entries[0].mem_addr, Some(0x1000));
    assert_eq!(result.cursors.mem_idx, 3);
    assert_eq!(result.cursors.commit_idx, 0);
}

#[test]
fn test_superscalar_commits_are_reordered() {
    let result = run(
        &[
            golden_reg(0, ADDI_X11_5, 11, 5),
            golden_reg(4, ADDI_X12_6, 12, 6),
        ],
        dut(&[(0, ADDI_X11_5), (4, ADDI_X12_6)], &[(12, 6), (11, 5)], &[]),
    );

    assert!(result.is_complete());
    assert_eq!(result.entries[0].target_reg, Some(11));
    assert_eq!(result.entries[1].target_reg, Some(12));
    assert_eq!(result.stats.reordered_commits, 1);
}

#[test]
fn test_jumps_are_not_reordered() {
    let result = run(
        &[golden_reg(0, JAL_X1_8, 1, 4)],
        dut(&[(0, JAL_X1_8)], &[(2, 9), (1, 4)], &[]),
    );

    assert_eq!(result.entries[0].target_reg, Some(2));
    assert_eq!(result.entries[0].reg_val, Some(9));
    assert_eq!(result.stats.reordered_commits, 0);
}

#[test]
fn test_load_consumes_register_commit() {
    let result = run(
        &[GoldenEntry {
            mem_addr: Some(0x1018),
            ..golden_reg(0, LW_X5, 5, 0xdead_beef)
        }],
        dut(&[(0, LW_X5)], &[(5, 0xdead_beef)], &[]),
    );

    assert_eq!(result.entries[0].target_reg, Some(5));
    assert_eq!(result.entries[0].reg_val, Some(0xdead_beef));
    assert_eq!(result.entries[0].mem_addr, None);
}

#[test]
fn test_fetch_exhaustion_returns_partial_trace() {
    let result = run(
        &[golden(0, NOP), golden(4, NOP)],
        dut(&[(0, NOP)], &[], &[]),
    );

    assert_eq!(
        result.outcome,
        Outcome::Exhausted {
            stream: Stream::Fetches,
            golden_index: 1
        }
    );
    assert_eq!(result.entries.len(), 1);
}

#[test]
fn test_speculative_run_to_end_exhausts_fetches() {
    let result = run(
        &[golden(0x100, NOP)],
        dut(&[(0x0, NOP), (0x4, NOP)], &[], &[]),
    );

    assert!(matches!(
        result.outcome,
        Outcome::Exhausted {
            stream: Stream::Fetches,
            ..
        }
    ));
    assert_eq!(result.entries.len(), 2);
    assert!(result.entries.iter().all(|e| e.speculative_fetch));
}

#[test]
fn test_commit_exhaustion() {
    let result = run(
        &[golden_reg(0, ADDI_X11_5, 11, 5)],
        dut(&[(0, ADDI_X11_5)], &[], &[]),
    );

    assert_eq!(
        result.outcome,
        Outcome::Exhausted {
            stream: Stream::RegfileCommits,
            golden_index: 0
        }
    );
    assert!(result.entries.is_empty());
    assert_eq!(result.cursors.fetch_idx, 0);
}

#[test]
fn test_memory_exhaustion() {
    let result = run(
        &[golden(0, BEQ), golden_store(4, SW, 0x40, 1)],
        dut(&[(0, BEQ), (4, SW)], &[], &[]),
    );

    assert_eq!(
        result.outcome,
        Outcome::Exhausted {
            stream: Stream::MemoryAccesses,
            golden_index: 1
        }
    );
    assert_eq!(result.entries.len(), 1);
}

#[test]
fn test_cursors_advance_at_most_once_per_golden_step() {
    let golden_trace = [
        golden_reg(0, ADDI_X11_5, 11, 5),
        golden(4, BEQ),
        golden_store(8, SW, 0x40, 5),
        golden_reg(12, ADDI_X12_6, 12, 6),
        golden(16, NOP),
        golden_reg(20, ADDI_X11_5, 11, 5),
    ];
    let fragments = dut(
        &[(0, ADDI_X11_5), (4, BEQ), (0x80, NOP), (8, SW), (12, ADDI_X12_6), (16, NOP), (20, ADDI_X11_5)],
        &[(11, 5), (12, 6)],
        &[(0x40, 5)],
    );

    // Reconcile growing prefixes and check each additional golden entry moves
    // every cursor by at most one, apart from speculative fetches.
    let mut previous = StreamCursors::default();
    let mut previous_speculative = 0;
    for len in 1..=golden_trace.len() {
        let result = run(&golden_trace[..len], fragments.clone());
        assert!(result.is_complete(), "prefix {len}");
        let cursors = result.cursors;
        let speculative = result.stats.speculative_fetches;
        assert_eq!(cursors.fetch_idx - previous.fetch_idx, 1 + speculative - previous_speculative);
        assert!(cursors.commit_idx - previous.commit_idx <= 1);
        assert!(cursors.mem_idx - previous.mem_idx <= 1);
        previous = cursors;
        previous_speculative = speculative;
    }
    assert_eq!(
        previous,
        StreamCursors {
            fetch_idx: 7,
            commit_idx: 3,
            mem_idx: 1
        }
    );
}

#[test]
fn test_custom_shadow_reset_value() {
    let config = Config {
        shadow_reset_value: 5,
        ..Config::default()
    };
    let result = reconcile(
        "test",
        &[golden_reg(0, ADDI_X11_5, 11, 5)],
        dut(&[(0, ADDI_X11_5)], &[], &[]),
        &config,
    );
    assert!(result.is_complete());
    assert!(result.entries[0].speculative_commit);
}
