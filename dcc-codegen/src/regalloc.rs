//! Register allocation
//!
//! Two fixed pools with `in_use` flags and no spill path: exhausting a pool
//! is a hard error surfaced as an internal compiler error. `allocate` scans
//! its pool for the first free register, so generated code always prefers
//! low register numbers; `reserve` claims a specific register (the call
//! lowering pins argument registers this way); `release` returns a register
//! to its pool. The untracked specials (`fp`, `sp`, `lr`, `pc`, `out`) pass
//! through every operation.

use crate::asm::{Reg, CALLEE_SAVED, CALLER_SAVED};
use dcc_common::CompilerError;
use log::debug;
use thiserror::Error;

/// Allocation failures. These are compiler invariant violations, not user
/// errors: the language has no construct the fixed pools cannot serve, so
/// hitting one means the generator mismanaged register lifetimes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegAllocError {
    #[error("no free register in the {pool} pool")]
    NoFreeRegister { pool: &'static str },

    #[error("register {reg} is already in use")]
    RegisterAlreadyInUse { reg: Reg },

    #[error("register {reg} is not in use")]
    RegisterNotInUse { reg: Reg },
}

impl From<RegAllocError> for CompilerError {
    fn from(err: RegAllocError) -> Self {
        CompilerError::internal_error(err.to_string())
    }
}

/// Which pool to allocate from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// `r0`-`r5`; clobbered by calls
    CallerSaved,
    /// `r6`-`r10`; preserved across calls
    CalleeSaved,
}

impl Pool {
    fn registers(self) -> &'static [Reg] {
        match self {
            Pool::CallerSaved => &CALLER_SAVED,
            Pool::CalleeSaved => &CALLEE_SAVED,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Pool::CallerSaved => "caller-saved",
            Pool::CalleeSaved => "callee-saved",
        }
    }
}

/// The allocator: one `in_use` flag per tracked register
pub struct RegisterAllocator {
    caller_saved: [bool; CALLER_SAVED.len()],
    callee_saved: [bool; CALLEE_SAVED.len()],
    log_allocation: bool,
}

impl RegisterAllocator {
    pub fn new(log_allocation: bool) -> Self {
        Self {
            caller_saved: [false; CALLER_SAVED.len()],
            callee_saved: [false; CALLEE_SAVED.len()],
            log_allocation,
        }
    }

    /// First free register of the pool
    pub fn allocate(&mut self, pool: Pool) -> Result<Reg, RegAllocError> {
        for (i, reg) in pool.registers().iter().enumerate() {
            if !self.flags(pool)[i] {
                self.flags_mut(pool)[i] = true;
                if self.log_allocation {
                    debug!("allocate {} from {} pool", reg, pool.name());
                }
                return Ok(*reg);
            }
        }
        Err(RegAllocError::NoFreeRegister { pool: pool.name() })
    }

    /// Claim a specific register. Untracked specials always succeed; a
    /// tracked register that is already in use fails unless `overwrite`.
    pub fn reserve(&mut self, reg: Reg, overwrite: bool) -> Result<(), RegAllocError> {
        let Some((pool, index)) = self.locate(reg) else {
            return Ok(());
        };
        if self.flags(pool)[index] && !overwrite {
            return Err(RegAllocError::RegisterAlreadyInUse { reg });
        }
        self.flags_mut(pool)[index] = true;
        if self.log_allocation {
            debug!("reserve {}", reg);
        }
        Ok(())
    }

    /// Return a register to its pool
    pub fn release(&mut self, reg: Reg) -> Result<(), RegAllocError> {
        let Some((pool, index)) = self.locate(reg) else {
            return Ok(());
        };
        if !self.flags(pool)[index] {
            return Err(RegAllocError::RegisterNotInUse { reg });
        }
        self.flags_mut(pool)[index] = false;
        if self.log_allocation {
            debug!("release {}", reg);
        }
        Ok(())
    }

    /// How many tracked registers are currently held. Zero at every
    /// statement boundary; the generator checks this at function end.
    pub fn live_count(&self) -> usize {
        self.caller_saved.iter().filter(|used| **used).count()
            + self.callee_saved.iter().filter(|used| **used).count()
    }

    fn locate(&self, reg: Reg) -> Option<(Pool, usize)> {
        if !reg.is_tracked() {
            return None;
        }
        if let Some(index) = CALLER_SAVED.iter().position(|r| *r == reg) {
            return Some((Pool::CallerSaved, index));
        }
        CALLEE_SAVED
            .iter()
            .position(|r| *r == reg)
            .map(|index| (Pool::CalleeSaved, index))
    }

    fn flags(&self, pool: Pool) -> &[bool] {
        match pool {
            Pool::CallerSaved => &self.caller_saved,
            Pool::CalleeSaved => &self.callee_saved,
        }
    }

    fn flags_mut(&mut self, pool: Pool) -> &mut [bool] {
        match pool {
            Pool::CallerSaved => &mut self.caller_saved,
            Pool::CalleeSaved => &mut self.callee_saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_first_free() {
        let mut alloc = RegisterAllocator::new(false);
        assert_eq!(alloc.allocate(Pool::CallerSaved).unwrap(), Reg::R0);
        assert_eq!(alloc.allocate(Pool::CallerSaved).unwrap(), Reg::R1);
        alloc.release(Reg::R0).unwrap();
        // Freed low register is handed out again before higher ones
        assert_eq!(alloc.allocate(Pool::CallerSaved).unwrap(), Reg::R0);
        assert_eq!(alloc.allocate(Pool::CalleeSaved).unwrap(), Reg::R6);
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut alloc = RegisterAllocator::new(false);
        for _ in 0..CALLER_SAVED.len() {
            alloc.allocate(Pool::CallerSaved).unwrap();
        }
        assert_eq!(
            alloc.allocate(Pool::CallerSaved),
            Err(RegAllocError::NoFreeRegister {
                pool: "caller-saved"
            })
        );
        // The other pool is unaffected
        assert!(alloc.allocate(Pool::CalleeSaved).is_ok());
    }

    #[test]
    fn test_reserve_conflicts() {
        let mut alloc = RegisterAllocator::new(false);
        alloc.reserve(Reg::R2, false).unwrap();
        assert_eq!(
            alloc.reserve(Reg::R2, false),
            Err(RegAllocError::RegisterAlreadyInUse { reg: Reg::R2 })
        );
        // Overwrite bypasses the conflict
        alloc.reserve(Reg::R2, true).unwrap();
        // Allocation skips the reserved register
        assert_eq!(alloc.allocate(Pool::CallerSaved).unwrap(), Reg::R0);
        assert_eq!(alloc.allocate(Pool::CallerSaved).unwrap(), Reg::R1);
        assert_eq!(alloc.allocate(Pool::CallerSaved).unwrap(), Reg::R3);
    }

    #[test]
    fn test_special_registers_are_untracked() {
        let mut alloc = RegisterAllocator::new(false);
        alloc.reserve(Reg::Sp, false).unwrap();
        alloc.reserve(Reg::Sp, false).unwrap();
        alloc.release(Reg::Fp).unwrap();
        assert_eq!(alloc.live_count(), 0);
    }

    #[test]
    fn test_double_release_is_an_error() {
        let mut alloc = RegisterAllocator::new(false);
        let reg = alloc.allocate(Pool::CallerSaved).unwrap();
        alloc.release(reg).unwrap();
        assert_eq!(
            alloc.release(reg),
            Err(RegAllocError::RegisterNotInUse { reg })
        );
    }

    #[test]
    fn test_live_count_balances() {
        let mut alloc = RegisterAllocator::new(false);
        let a = alloc.allocate(Pool::CallerSaved).unwrap();
        let b = alloc.allocate(Pool::CalleeSaved).unwrap();
        assert_eq!(alloc.live_count(), 2);
        alloc.release(a).unwrap();
        alloc.release(b).unwrap();
        assert_eq!(alloc.live_count(), 0);
    }
}
