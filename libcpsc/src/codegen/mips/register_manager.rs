// Copyright 2025-2026 Neil Henderson
//
//! The `register_manager` module allocates MIPS registers from two disjoint pools.
//!
//! Temporaries (`$t0..$t9`, caller-save) hold expression intermediates; saved registers
//! (`$s0..$s7`, callee-save) hold named variables for the length of a function. Allocation is
//! first-fit over the pool's canonical order. There is no spilling: exhausting a pool is a hard
//! compilation error.

use std::collections::{HashMap, HashSet};

use crate::codegen::GenerationError;

use super::registers::Register;

/// The register manager: in-use sets for both pools plus the name-to-register map.
///
/// A name maps to at most one register at a time, and a register belongs to at most one name.
/// The whole state is cleared at function entry.
#[derive(Debug, Default)]
pub struct RegisterManager {
    in_use: HashSet<Register>,
    map: HashMap<String, Register>,

    /// Every saved register allocated since the last reset, for prologue/epilogue saves.
    saved_touched: HashSet<Register>,
}

impl RegisterManager {
    /// Creates a new register manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a temporary register for the given name.
    ///
    /// If the name is already mapped, its existing register is returned with no reallocation.
    pub fn allocate_temp(&mut self, name: &str) -> Result<Register, GenerationError> {
        if let Some(register) = self.map.get(name) {
            return Ok(*register);
        }

        let register = self.first_fit(&Register::TEMP_POOL, "temporary")?;
        self.map.insert(name.to_string(), register);
        Ok(register)
    }

    /// Allocates a saved register for the given name.
    ///
    /// If the name is already mapped, its existing register is returned with no reallocation.
    pub fn allocate_saved(&mut self, name: &str) -> Result<Register, GenerationError> {
        if let Some(register) = self.map.get(name) {
            return Ok(*register);
        }

        let register = self.first_fit(&Register::SAVED_POOL, "saved")?;
        self.map.insert(name.to_string(), register);
        self.saved_touched.insert(register);
        Ok(register)
    }

    /// Allocates an anonymous temporary register (for literal loads and address arithmetic).
    /// The caller must release it with [RegisterManager::free_temp].
    pub fn allocate_scratch(&mut self) -> Result<Register, GenerationError> {
        self.first_fit(&Register::TEMP_POOL, "temporary")
    }

    /// Releases a temporary register.
    pub fn free_temp(&mut self, register: Register) {
        self.in_use.remove(&register);
        self.map.retain(|_, r| *r != register);
    }

    /// Clears all allocation state at function entry.
    pub fn reset_function(&mut self) {
        self.in_use.clear();
        self.map.clear();
        self.saved_touched.clear();
    }

    /// The register currently mapped to the given name.
    pub fn register_of(&self, name: &str) -> Option<Register> {
        self.map.get(name).copied()
    }

    /// Every name mapped to a temporary-pool register, sorted by register for determinism.
    /// These are the values a caller must preserve across a call.
    pub fn mapped_temps(&self) -> Vec<(String, Register)> {
        let mut live: Vec<(String, Register)> = self
            .map
            .iter()
            .filter(|(_, register)| register.is_temp())
            .map(|(name, register)| (name.clone(), *register))
            .collect();

        live.sort_by_key(|(_, register)| *register);
        live
    }

    /// Every saved register allocated since the last reset, sorted.
    pub fn saved_used(&self) -> Vec<Register> {
        let mut used: Vec<Register> = self.saved_touched.iter().copied().collect();
        used.sort();
        used
    }

    fn first_fit(&mut self, pool: &[Register], pool_name: &'static str) -> Result<Register, GenerationError> {
        for register in pool {
            if !self.in_use.contains(register) {
                self.in_use.insert(*register);
                return Ok(*register);
            }
        }

        Err(GenerationError::RegisterPoolExhausted { pool: pool_name })
    }
}
