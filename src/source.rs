//! Where counter values come from.

/// Read-only view of the host's per-CPU counter storage.
///
/// Implementations must not block. `read` is only called with
/// `cpu < nr_cpu_ids()` and `slot < NR_STATS`.
pub trait CpuStatSource {
    /// Number of CPUs known to the host. Never shrinks while the process
    /// runs.
    fn nr_cpu_ids(&self) -> usize;

    /// Current value of counter `slot` on `cpu`, in clock ticks.
    fn read(&self, cpu: usize, slot: usize) -> u64;
}

impl<S: CpuStatSource + ?Sized> CpuStatSource for &S {
    fn nr_cpu_ids(&self) -> usize {
        (**self).nr_cpu_ids()
    }

    fn read(&self, cpu: usize, slot: usize) -> u64 {
        (**self).read(cpu, slot)
    }
}
