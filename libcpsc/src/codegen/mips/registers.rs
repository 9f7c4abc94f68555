// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `registers` module defines the MIPS32 registers the backend works with.

use std::fmt;

/// MIPS32 registers.
///
/// `$t0..$t9` are caller-save and hold expression temporaries; `$s0..$s7` are callee-save and
/// hold named variables. `$a0..$a3` carry the first four arguments, `$v0` the return value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Register {
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,

    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,

    A0,
    A1,
    A2,
    A3,

    V0,

    SP,
    FP,
    RA,
    ZERO,
}

#[rustfmt::skip]
impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::T0   => write!(f, "$t0"),
            Register::T1   => write!(f, "$t1"),
            Register::T2   => write!(f, "$t2"),
            Register::T3   => write!(f, "$t3"),
            Register::T4   => write!(f, "$t4"),
            Register::T5   => write!(f, "$t5"),
            Register::T6   => write!(f, "$t6"),
            Register::T7   => write!(f, "$t7"),
            Register::T8   => write!(f, "$t8"),
            Register::T9   => write!(f, "$t9"),

            Register::S0   => write!(f, "$s0"),
            Register::S1   => write!(f, "$s1"),
            Register::S2   => write!(f, "$s2"),
            Register::S3   => write!(f, "$s3"),
            Register::S4   => write!(f, "$s4"),
            Register::S5   => write!(f, "$s5"),
            Register::S6   => write!(f, "$s6"),
            Register::S7   => write!(f, "$s7"),

            Register::A0   => write!(f, "$a0"),
            Register::A1   => write!(f, "$a1"),
            Register::A2   => write!(f, "$a2"),
            Register::A3   => write!(f, "$a3"),

            Register::V0   => write!(f, "$v0"),

            Register::SP   => write!(f, "$sp"),
            Register::FP   => write!(f, "$fp"),
            Register::RA   => write!(f, "$ra"),
            Register::ZERO => write!(f, "$zero"),
        }
    }
}

impl Register {
    /// The temporary pool, in first-fit scan order.
    pub const TEMP_POOL: [Register; 10] = [
        Register::T0,
        Register::T1,
        Register::T2,
        Register::T3,
        Register::T4,
        Register::T5,
        Register::T6,
        Register::T7,
        Register::T8,
        Register::T9,
    ];

    /// The saved pool, in first-fit scan order.
    pub const SAVED_POOL: [Register; 8] = [
        Register::S0,
        Register::S1,
        Register::S2,
        Register::S3,
        Register::S4,
        Register::S5,
        Register::S6,
        Register::S7,
    ];

    /// The argument registers, in argument order.
    pub const ARG_POOL: [Register; 4] = [Register::A0, Register::A1, Register::A2, Register::A3];

    /// The index of a saved register within its pool (`$s3` is 3), or None.
    pub fn saved_index(&self) -> Option<usize> {
        Self::SAVED_POOL.iter().position(|r| r == self)
    }

    /// Is this register in the temporary pool?
    pub fn is_temp(&self) -> bool {
        Self::TEMP_POOL.contains(self)
    }
}
