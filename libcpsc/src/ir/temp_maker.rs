// Copyright 2025-2026 Neil Henderson
//
//! The `temp_maker` module generates temporary names (`t0`, `t1`, ...) with a free-list.

use std::collections::BTreeSet;

/// Generates temporary names from a monotonic counter, recycling through a free-list.
///
/// The IR generator returns a statement's temporaries to the free-list once the statement
/// completes, so the set of distinct names in a function stays bounded by the widest single
/// statement. A temporary's value never lives across a statement boundary.
#[derive(Debug, Default)]
pub struct TempMaker {
    counter: usize,
    free: BTreeSet<usize>,
    live: BTreeSet<usize>,
}

impl TempMaker {
    /// Creates a new temp maker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh temporary name, preferring the lowest recycled number.
    pub fn new_temp(&mut self) -> String {
        let number = match self.free.iter().next().copied() {
            Some(number) => {
                self.free.remove(&number);
                number
            }
            None => {
                let number = self.counter;
                self.counter += 1;
                number
            }
        };

        self.live.insert(number);
        format!("t{number}")
    }

    /// Returns one temporary to the free-list.
    pub fn free_temp(&mut self, name: &str) {
        if let Some(number) = parse_temp(name) {
            if self.live.remove(&number) {
                self.free.insert(number);
            }
        }
    }

    /// Returns every live temporary to the free-list. Called between statements.
    pub fn recycle_statement(&mut self) {
        self.free.extend(std::mem::take(&mut self.live));
    }

    /// Resets all state for a new function body.
    pub fn reset_function(&mut self) {
        self.counter = 0;
        self.free.clear();
        self.live.clear();
    }

    /// Is the given token a temporary name?
    pub fn is_temp(name: &str) -> bool {
        parse_temp(name).is_some()
    }
}

fn parse_temp(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('t')?;
    if digits.is_empty() {
        return None;
    }
    digits.parse::<usize>().ok()
}
