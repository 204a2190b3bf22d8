//! Snapshot aggregation.
//!
//! A query walks the registry once. For a single CPU it copies that CPU's
//! slots; for all CPUs it sums each slot over every CPU into a temporary
//! array indexed by slot, then maps slots to field names. Nothing is cached:
//! every query reads the live counters again.
//!
//! Counters are read without locking (see [`crate::block`]), so an
//! aggregate taken while the host is accounting may mix values from just
//! before and just after a tick. Each individual value is exact.

use alloc::vec::Vec;
use core::fmt;

use crate::cputime::NR_STATS;
use crate::error::{CpuStatError, CpuStatResult};
use crate::registry::CounterRegistry;
use crate::source::CpuStatSource;

/// Argument value that selects every CPU.
pub const ALL_CPUS: i64 = -1;

// =============================================================================
// Unit Selection
// =============================================================================

/// Which CPUs a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSelector {
    /// Sum over every CPU.
    All,
    /// One CPU, by 0-based index.
    Cpu(usize),
}

impl UnitSelector {
    /// Validate a caller-supplied CPU argument.
    ///
    /// `None` and `-1` select every CPU. Anything below `-1` or at or above
    /// `nr_cpu_ids` is rejected.
    pub fn from_arg(cpu: Option<i64>, nr_cpu_ids: usize) -> CpuStatResult<Self> {
        let cpu = match cpu {
            None | Some(ALL_CPUS) => return Ok(UnitSelector::All),
            Some(cpu) => cpu,
        };
        match usize::try_from(cpu) {
            Ok(index) if index < nr_cpu_ids => Ok(UnitSelector::Cpu(index)),
            _ => Err(out_of_range(cpu, nr_cpu_ids)),
        }
    }
}

fn out_of_range(cpu: i64, nr_cpu_ids: usize) -> CpuStatError {
    let max = i64::try_from(nr_cpu_ids).unwrap_or(i64::MAX) - 1;
    log::debug!("cpustat: rejected CPU {} (max: {})", cpu, max);
    CpuStatError::OutOfRangeUnit { cpu, max }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Field name to value, one entry per registry descriptor, in registry
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<'r> {
    entries: Vec<(&'r str, u64)>,
}

impl<'r> Snapshot<'r> {
    /// Number of fields; always the registry length.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True only for a snapshot taken against an empty registry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the counter reported as `field`.
    pub fn get(&self, field: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|&(_, value)| value)
    }

    /// Iterate `(field, value)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&'r str, u64)> + '_ {
        self.entries.iter().copied()
    }
}

impl<'r> IntoIterator for Snapshot<'r> {
    type Item = (&'r str, u64);
    type IntoIter = alloc::vec::IntoIter<(&'r str, u64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", field, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Answers snapshot queries against one counter source.
pub struct Aggregator<'r, S> {
    registry: &'r CounterRegistry,
    source: S,
}

impl<'r, S: CpuStatSource> Aggregator<'r, S> {
    /// Bind `registry` to the counters of `source`.
    pub fn new(registry: &'r CounterRegistry, source: S) -> Self {
        Self { registry, source }
    }

    /// Registry that decides which fields a snapshot carries.
    pub fn registry(&self) -> &'r CounterRegistry {
        self.registry
    }

    /// Counter source queries read from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of CPUs known to the host.
    pub fn total_unit_count(&self) -> usize {
        self.source.nr_cpu_ids()
    }

    /// Snapshot for a raw CPU argument (`None` or `-1` for all CPUs).
    pub fn query_arg(&self, cpu: Option<i64>) -> CpuStatResult<Snapshot<'r>> {
        let selector = UnitSelector::from_arg(cpu, self.total_unit_count())?;
        self.query(selector)
    }

    /// Snapshot for `selector`.
    ///
    /// Fails only when a single CPU is selected that the host does not have.
    pub fn query(&self, selector: UnitSelector) -> CpuStatResult<Snapshot<'r>> {
        let nr_cpu_ids = self.total_unit_count();
        let mut values = [0u64; NR_STATS];

        match selector {
            UnitSelector::Cpu(cpu) => {
                if cpu >= nr_cpu_ids {
                    let cpu = i64::try_from(cpu).unwrap_or(i64::MAX);
                    return Err(out_of_range(cpu, nr_cpu_ids));
                }
                for descriptor in self.registry {
                    values[descriptor.slot] = self.source.read(cpu, descriptor.slot);
                }
            }
            UnitSelector::All => {
                for descriptor in self.registry {
                    let slot = descriptor.slot;
                    for cpu in 0..nr_cpu_ids {
                        values[slot] = values[slot].wrapping_add(self.source.read(cpu, slot));
                    }
                }
            }
        }

        let entries = self
            .registry
            .fields()
            .map(|(descriptor, field)| (field, values[descriptor.slot]))
            .collect();
        Ok(Snapshot { entries })
    }
}
