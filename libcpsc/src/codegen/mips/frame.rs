// Copyright 2025-2026 Neil Henderson
//
//! The `frame` module lays out activation records and builds the prologue/epilogue sequences.
//!
//! Frame layout, relative to `$fp`:
//!
//! ```text
//!   4($fp)   saved $ra
//!   0($fp)   caller's $fp
//!  -4($fp)   $s0 save slot  \
//!   ...                      | fixed 8-word callee-save area
//! -32($fp)   $s7 save slot  /
//! -36($fp)   temporary slot 0 (caller-save area used across calls)
//!   ...      more temporary slots, then the reserved local area
//! ```
//!
//! Stack arguments beyond the fourth sit above the frame: the callee reads argument `i`
//! (0-based, `i >= 4`) at `8 + 4*(i-4)($fp)`.

use super::registers::Register;

/// Bytes of the fixed `$s`-register save area.
const SAVED_AREA_BYTES: usize = 32;

/// Computes a function's frame reservation: the fixed callee-save area plus one word per local
/// and per temporary slot.
pub fn frame_bytes(locals: usize, temp_slots: usize) -> usize {
    SAVED_AREA_BYTES + 4 * (locals + temp_slots)
}

/// The `$fp`-relative offset of a saved register's spill slot in the prologue area.
pub fn saved_slot_offset(register: Register) -> i32 {
    match register.saved_index() {
        Some(index) => -4 * (index as i32 + 1),
        None => crate::ICE!("'{register}' has no callee-save slot"),
    }
}

/// The `$fp`-relative offset of a temporary's slot, used to preserve caller-save registers
/// across calls.
pub fn temp_slot_offset(slot: usize) -> i32 {
    -(SAVED_AREA_BYTES as i32 + 4) - 4 * slot as i32
}

/// The `$fp`-relative offset at which the callee reads stack-passed argument `index`
/// (0-based; the first four arguments arrive in `$a0..$a3`).
pub fn stack_arg_offset(index: usize) -> i32 {
    debug_assert!(index >= 4);
    8 + 4 * (index as i32 - 4)
}

/// The prologue: link the frame, then reserve space and store the used saved registers.
pub fn prologue(frame_bytes: usize, saved_used: &[Register]) -> Vec<String> {
    let mut lines = vec![
        "addiu $sp, $sp, -8".to_string(),
        "sw $ra, 4($sp)".to_string(),
        "sw $fp, 0($sp)".to_string(),
        "move $fp, $sp".to_string(),
        format!("addiu $sp, $sp, -{frame_bytes}"),
    ];

    for register in saved_used {
        lines.push(format!("sw {register}, {}($fp)", saved_slot_offset(*register)));
    }

    lines
}

/// The epilogue: restore the saved registers touched so far, unwind the frame, and return.
pub fn epilogue(saved_used: &[Register]) -> Vec<String> {
    let mut lines = Vec::new();

    for register in saved_used {
        lines.push(format!("lw {register}, {}($fp)", saved_slot_offset(*register)));
    }

    lines.push("move $sp, $fp".to_string());
    lines.push("lw $fp, 0($sp)".to_string());
    lines.push("lw $ra, 4($sp)".to_string());
    lines.push("addiu $sp, $sp, 8".to_string());
    lines.push("jr $ra".to_string());

    lines
}
