//! Per-CPU counter storage.
//!
//! The host's accounting code owns this storage and bumps it from interrupt
//! handlers and the scheduler tick. Readers never lock: every slot is an
//! independent `AtomicU64` updated with relaxed ordering, so a read of many
//! slots is not a consistent cut. Counters only ever grow, which bounds the
//! skew to values that were all true within the same instant.
//!
//! # Memory Layout
//!
//! Each CPU's block is cache-line aligned so that two CPUs accounting at the
//! same time never share a line.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::cputime::{CpuTime, NR_STATS};
use crate::source::CpuStatSource;

// =============================================================================
// Counter Block
// =============================================================================

/// The counter block of a single CPU.
#[repr(C, align(64))]
pub struct KernelCpustat {
    /// One accumulator per [`CpuTime`] slot, in clock ticks.
    pub cpustat: [AtomicU64; NR_STATS],
}

impl KernelCpustat {
    /// Create a block with every slot at 0.
    pub const fn new() -> Self {
        Self {
            cpustat: [const { AtomicU64::new(0) }; NR_STATS],
        }
    }

    /// Read one slot.
    #[inline]
    pub fn load(&self, slot: usize) -> u64 {
        self.cpustat[slot].load(Ordering::Relaxed)
    }
}

impl Default for KernelCpustat {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(
    core::mem::align_of::<KernelCpustat>() == 64,
    "KernelCpustat must start on a cache line"
);

// =============================================================================
// Per-CPU Storage
// =============================================================================

/// Counter blocks for every possible CPU.
///
/// The CPU count is fixed at construction; CPUs are never hot-added.
pub struct PerCpuStat {
    per_cpu: Box<[KernelCpustat]>,
}

impl PerCpuStat {
    /// Allocate zeroed blocks for `nr_cpu_ids` CPUs.
    pub fn new(nr_cpu_ids: usize) -> Self {
        let mut per_cpu = Vec::with_capacity(nr_cpu_ids);
        per_cpu.resize_with(nr_cpu_ids, KernelCpustat::new);
        Self {
            per_cpu: per_cpu.into_boxed_slice(),
        }
    }

    /// Number of CPUs this storage covers.
    #[inline]
    pub fn nr_cpu_ids(&self) -> usize {
        self.per_cpu.len()
    }

    /// The counter block of `cpu`, if it exists.
    pub fn cpu(&self, cpu: usize) -> Option<&KernelCpustat> {
        self.per_cpu.get(cpu)
    }

    /// Charge `ticks` of `kind` time to `cpu`.
    ///
    /// Host-side writer. Lock-free, safe from interrupt context. Writes to a
    /// CPU that does not exist are dropped.
    #[inline(always)]
    pub fn account(&self, cpu: usize, kind: CpuTime, ticks: u64) {
        if let Some(block) = self.per_cpu.get(cpu) {
            block.cpustat[kind.slot()].fetch_add(ticks, Ordering::Relaxed);
        }
    }

    /// Overwrite one slot of `cpu`.
    ///
    /// Used when seeding storage from an external sample.
    pub fn store(&self, cpu: usize, kind: CpuTime, ticks: u64) {
        if let Some(block) = self.per_cpu.get(cpu) {
            block.cpustat[kind.slot()].store(ticks, Ordering::Relaxed);
        }
    }
}

impl CpuStatSource for PerCpuStat {
    fn nr_cpu_ids(&self) -> usize {
        self.per_cpu.len()
    }

    fn read(&self, cpu: usize, slot: usize) -> u64 {
        self.per_cpu[cpu].load(slot)
    }
}
