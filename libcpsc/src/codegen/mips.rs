// Copyright 2025-2026 Neil Henderson
//
//! The `mips` module holds the MIPS32 target: registers, the register manager, the stack-frame
//! layer, the literal pool, and the per-opcode emitter.

mod data_segment;
mod emit;
mod frame;
mod register_manager;
mod registers;


pub use emit::emit_program;
pub use register_manager::RegisterManager;
pub use registers::Register;
