//! cpustat: per-CPU time accounting counters.
//!
//! Exposes the kernel's per-CPU CPU-time counters (user, nice, system, idle,
//! iowait, irq, softirq, steal, guest, guest_nice, and with core scheduling
//! forceidle) as snapshots, either for one CPU or summed across all of them.
//!
//! # Architecture
//!
//! ```text
//!   script: cpustat.get(cpu) / cpustat.count() / cpustat.stat.USER
//!                 |
//!                 v
//!   +-------------------------+      +---------------------------+
//!   |  binding::CpuStatLib    |----->|  registry::CounterRegistry|
//!   +-------------------------+      |  (name, slot), built once |
//!                 |                  +---------------------------+
//!                 v                               ^
//!   +-------------------------+                   |
//!   |  aggregate::Aggregator  |-------------------+
//!   +-------------------------+
//!                 |
//!                 v
//!   source::CpuStatSource  <- block::PerCpuStat (atomics)
//!                          <- procfs::ProcStat  (/proc/stat, std only)
//! ```
//!
//! - **Registry** (`registry.rs`): ordered `(name, slot)` list, the one
//!   place counter kinds are defined
//! - **Aggregator** (`aggregate.rs`): single-CPU copy or all-CPU sum
//! - **Storage** (`block.rs`): cache-line aligned atomic per-CPU blocks
//! - **Binding** (`binding.rs`): `get`/`count`/`stat` for a script runtime
//! - **Procfs** (`procfs.rs`): `/proc/stat` rendering and parsing
//!
//! # Features
//!
//! - `std` (default): hosted `/proc/stat` backend
//! - `sched_core`: compile in the `FORCEIDLE` counter

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod aggregate;
pub mod binding;
pub mod block;
pub mod cputime;
pub mod error;
pub mod procfs;
pub mod registry;
pub mod source;

pub use aggregate::{Aggregator, Snapshot, UnitSelector, ALL_CPUS};
pub use block::{KernelCpustat, PerCpuStat};
pub use cputime::{CpuTime, NR_STATS};
pub use error::{CpuStatError, CpuStatResult};
pub use registry::{Capabilities, CounterDescriptor, CounterRegistry};
pub use source::CpuStatSource;
