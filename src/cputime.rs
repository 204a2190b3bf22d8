//! CPU time accounting slots.
//!
//! Each processing unit owns one block of `NR_STATS` counters. The slot
//! numbering follows the kernel's `cpu_usage_stat` layout, which is NOT the
//! order the counters are reported in: `SOFTIRQ` and `IRQ` sit before
//! `IDLE` in storage but after it in `/proc/stat`. The registry is what maps
//! one order onto the other.

/// Index of a counter slot inside a per-CPU counter block.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CpuTime {
    /// Time spent in user mode.
    User = 0,
    /// Time spent in user mode at low priority (nice).
    Nice = 1,
    /// Time spent in system mode.
    System = 2,
    /// Time spent servicing softirqs.
    Softirq = 3,
    /// Time spent servicing interrupts.
    Irq = 4,
    /// Time spent in the idle task.
    Idle = 5,
    /// Time spent waiting for I/O to complete.
    Iowait = 6,
    /// Time stolen by other operating systems (virtualized environment).
    Steal = 7,
    /// Time spent running a virtual CPU for a guest.
    Guest = 8,
    /// Time spent running a niced guest.
    GuestNice = 9,
    /// Time a sibling was forced idle by core scheduling.
    #[cfg(feature = "sched_core")]
    ForceIdle = 10,
}

/// Number of counter slots compiled into each per-CPU block.
#[cfg(not(feature = "sched_core"))]
pub const NR_STATS: usize = 10;

/// Number of counter slots compiled into each per-CPU block.
#[cfg(feature = "sched_core")]
pub const NR_STATS: usize = 11;

impl CpuTime {
    /// Slot index inside a per-CPU block.
    #[inline(always)]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// The kind stored in `slot`, if this build has such a slot.
    pub const fn from_slot(slot: usize) -> Option<Self> {
        Some(match slot {
            0 => CpuTime::User,
            1 => CpuTime::Nice,
            2 => CpuTime::System,
            3 => CpuTime::Softirq,
            4 => CpuTime::Irq,
            5 => CpuTime::Idle,
            6 => CpuTime::Iowait,
            7 => CpuTime::Steal,
            8 => CpuTime::Guest,
            9 => CpuTime::GuestNice,
            #[cfg(feature = "sched_core")]
            10 => CpuTime::ForceIdle,
            _ => return None,
        })
    }
}

// Conditional slots are only ever appended.
const _: () = assert!(CpuTime::GuestNice as usize == 9);
#[cfg(feature = "sched_core")]
const _: () = assert!(CpuTime::ForceIdle as usize == NR_STATS - 1);
#[cfg(not(feature = "sched_core"))]
const _: () = assert!(CpuTime::GuestNice as usize == NR_STATS - 1);
