// Copyright 2025-2026 Neil Henderson

use crate::codegen::GenerationError;

use super::super::register_manager::RegisterManager;
use super::super::registers::Register;

#[test]
fn first_fit_scans_in_canonical_order() {
    let mut regs = RegisterManager::new();

    assert_eq!(regs.allocate_temp("t0").unwrap(), Register::T0);
    assert_eq!(regs.allocate_temp("t1").unwrap(), Register::T1);
    assert_eq!(regs.allocate_saved("x").unwrap(), Register::S0);
    assert_eq!(regs.allocate_saved("y").unwrap(), Register::S1);
}

#[test]
fn a_mapped_name_keeps_its_register() {
    let mut regs = RegisterManager::new();

    let first = regs.allocate_temp("t0").unwrap();
    let second = regs.allocate_temp("t0").unwrap();
    assert_eq!(first, second);

    let x1 = regs.allocate_saved("x").unwrap();
    let x2 = regs.allocate_saved("x").unwrap();
    assert_eq!(x1, x2);
}

#[test]
fn freeing_returns_a_register_to_the_pool() {
    let mut regs = RegisterManager::new();

    let t0 = regs.allocate_temp("t0").unwrap();
    let _t1 = regs.allocate_temp("t1").unwrap();

    regs.free_temp(t0);

    // First-fit reuses the freed register, and the old mapping is gone.
    assert_eq!(regs.allocate_temp("t9").unwrap(), Register::T0);
    assert!(regs.register_of("t0").is_none());
}

#[test]
fn pools_are_disjoint() {
    let mut regs = RegisterManager::new();

    for i in 0..10 {
        regs.allocate_temp(&format!("t{i}")).unwrap();
    }

    // The temporary pool is full, but saved allocation is unaffected.
    assert_eq!(regs.allocate_saved("x").unwrap(), Register::S0);
}

#[test]
fn exhausting_a_pool_is_a_hard_error() {
    let mut regs = RegisterManager::new();

    for i in 0..10 {
        regs.allocate_temp(&format!("t{i}")).unwrap();
    }
    assert!(matches!(
        regs.allocate_temp("t10"),
        Err(GenerationError::RegisterPoolExhausted { pool: "temporary" })
    ));

    for i in 0..8 {
        regs.allocate_saved(&format!("v{i}")).unwrap();
    }
    assert!(matches!(
        regs.allocate_saved("v8"),
        Err(GenerationError::RegisterPoolExhausted { pool: "saved" })
    ));
}

#[test]
fn reset_clears_all_state() {
    let mut regs = RegisterManager::new();

    regs.allocate_temp("t0").unwrap();
    regs.allocate_saved("x").unwrap();

    regs.reset_function();

    assert!(regs.register_of("t0").is_none());
    assert!(regs.register_of("x").is_none());
    assert!(regs.saved_used().is_empty());

    // The pools start fresh.
    assert_eq!(regs.allocate_temp("t0").unwrap(), Register::T0);
    assert_eq!(regs.allocate_saved("x").unwrap(), Register::S0);
}

#[test]
fn saved_used_tracks_allocations_for_the_prologue() {
    let mut regs = RegisterManager::new();

    regs.allocate_saved("a").unwrap();
    regs.allocate_saved("b").unwrap();

    assert_eq!(regs.saved_used(), vec![Register::S0, Register::S1]);
}

#[test]
fn mapped_temps_lists_live_caller_save_values() {
    let mut regs = RegisterManager::new();

    regs.allocate_temp("t0").unwrap();
    regs.allocate_temp("t1").unwrap();
    regs.allocate_saved("x").unwrap();

    let live = regs.mapped_temps();
    assert_eq!(live.len(), 2);
    assert_eq!(live[0], ("t0".to_string(), Register::T0));
    assert_eq!(live[1], ("t1".to_string(), Register::T1));
}
