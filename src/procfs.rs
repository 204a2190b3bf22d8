//! `/proc/stat` text format.
//!
//! Renders counter storage the way the kernel's `/proc/stat` shows it, and
//! (with `std`) parses the live file back into a counter source so the
//! aggregator can run against a real Linux host.
//!
//! # Format
//!
//! ```text
//! cpu  150 0 0 210 0 0 0 0 0 0
//! cpu0 100 0 0 200 0 0 0 0 0 0
//! cpu1 50 0 0 10 0 0 0 0 0 0
//! ```
//!
//! Columns follow registry order. Only the `cpu`/`cpuN` lines are produced
//! or consumed; the other lines of the kernel file (`intr`, `ctxt`, ...) are
//! not counter slots.

use alloc::format;
use alloc::string::String;

use crate::aggregate::{Aggregator, Snapshot, UnitSelector};
use crate::error::CpuStatResult;
use crate::source::CpuStatSource;

/// Path of the kernel's CPU statistics file.
pub const PROC_STAT_PATH: &str = "/proc/stat";

/// Highest CPU count accepted from a `/proc/stat` sample (Linux `NR_CPUS`
/// upper limit).
pub const MAX_PROC_CPUS: usize = 8192;

/// Generate `/proc/stat` content for every CPU the source knows.
pub fn generate_stat<S: CpuStatSource>(aggregator: &Aggregator<'_, S>) -> CpuStatResult<String> {
    let mut output = String::new();

    let total = aggregator.query(UnitSelector::All)?;
    push_line(&mut output, "cpu ", &total);

    for cpu in 0..aggregator.total_unit_count() {
        let snapshot = aggregator.query(UnitSelector::Cpu(cpu))?;
        push_line(&mut output, &format!("cpu{}", cpu), &snapshot);
    }

    Ok(output)
}

fn push_line(output: &mut String, label: &str, snapshot: &Snapshot<'_>) {
    output.push_str(label);
    for (_, value) in snapshot.iter() {
        output.push_str(&format!(" {}", value));
    }
    output.push('\n');
}

#[cfg(feature = "std")]
pub use hosted::{ProcStat, ProcStatError};

#[cfg(feature = "std")]
mod hosted {
    use std::fmt;
    use std::io;
    use std::path::Path;

    use crate::cputime::NR_STATS;
    use crate::registry::CounterRegistry;
    use crate::source::CpuStatSource;

    use super::{MAX_PROC_CPUS, PROC_STAT_PATH};

    /// Failure to obtain a `/proc/stat` sample.
    #[derive(Debug)]
    pub enum ProcStatError {
        /// The file could not be read.
        Io(io::Error),
        /// A `cpuN` line could not be understood. `line` is 1-based.
        Parse { line: usize, message: String },
    }

    impl fmt::Display for ProcStatError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ProcStatError::Io(err) => write!(f, "failed to read {}: {}", PROC_STAT_PATH, err),
                ProcStatError::Parse { line, message } => {
                    write!(f, "failed to parse {} line {}: {}", PROC_STAT_PATH, line, message)
                }
            }
        }
    }

    impl std::error::Error for ProcStatError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                ProcStatError::Io(err) => Some(err),
                ProcStatError::Parse { .. } => None,
            }
        }
    }

    impl From<io::Error> for ProcStatError {
        fn from(err: io::Error) -> Self {
            ProcStatError::Io(err)
        }
    }

    /// One sample of the per-CPU lines of `/proc/stat`.
    ///
    /// A sample is frozen at parse time; take a new one for every query that
    /// should see current values.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ProcStat {
        per_cpu: Vec<[u64; NR_STATS]>,
    }

    impl ProcStat {
        /// Sample the live `/proc/stat`.
        pub fn sample(registry: &CounterRegistry) -> Result<Self, ProcStatError> {
            Self::read_from(PROC_STAT_PATH, registry)
        }

        /// Sample a file in `/proc/stat` format.
        pub fn read_from(
            path: impl AsRef<Path>,
            registry: &CounterRegistry,
        ) -> Result<Self, ProcStatError> {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content, registry)
        }

        /// Parse `/proc/stat` content.
        ///
        /// Column `i` of a `cpuN` line is stored in the slot of the `i`-th
        /// registry descriptor. The CPU count is the highest index seen plus
        /// one; CPUs without a line (offline) and missing trailing columns
        /// read as zero. Extra columns are ignored.
        ///
        /// A CPU index at or above [`MAX_PROC_CPUS`] and a CPU that appears
        /// on more than one line are both parse errors.
        pub fn parse(content: &str, registry: &CounterRegistry) -> Result<Self, ProcStatError> {
            let mut per_cpu: Vec<[u64; NR_STATS]> = Vec::new();
            let mut seen: Vec<bool> = Vec::new();

            for (index, line) in content.lines().enumerate() {
                let mut fields = line.split_whitespace();
                let Some(label) = fields.next() else {
                    continue;
                };
                let Some(cpu) = label.strip_prefix("cpu") else {
                    continue;
                };
                if cpu.is_empty() {
                    // Aggregate line; recomputed from the per-CPU lines.
                    continue;
                }

                let line_no = index + 1;
                let cpu: usize = cpu.parse().map_err(|_| ProcStatError::Parse {
                    line: line_no,
                    message: format!("bad CPU label {:?}", label),
                })?;
                if cpu >= MAX_PROC_CPUS {
                    return Err(ProcStatError::Parse {
                        line: line_no,
                        message: format!("CPU index out of range: {} (max: {})", cpu, MAX_PROC_CPUS - 1),
                    });
                }

                let mut block = [0u64; NR_STATS];
                for (descriptor, field) in registry.iter().zip(&mut fields) {
                    block[descriptor.slot] = field.parse().map_err(|_| ProcStatError::Parse {
                        line: line_no,
                        message: format!("bad {} value {:?}", descriptor.name, field),
                    })?;
                }

                if cpu >= per_cpu.len() {
                    per_cpu.resize(cpu + 1, [0; NR_STATS]);
                    seen.resize(cpu + 1, false);
                }
                if core::mem::replace(&mut seen[cpu], true) {
                    return Err(ProcStatError::Parse {
                        line: line_no,
                        message: format!("duplicate line for cpu{}", cpu),
                    });
                }
                per_cpu[cpu] = block;
            }

            if per_cpu.is_empty() {
                log::warn!("cpustat: no per-CPU lines in {}", PROC_STAT_PATH);
            }
            Ok(Self { per_cpu })
        }
    }

    impl CpuStatSource for ProcStat {
        fn nr_cpu_ids(&self) -> usize {
            self.per_cpu.len()
        }

        fn read(&self, cpu: usize, slot: usize) -> u64 {
            self.per_cpu[cpu][slot]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::PerCpuStat;
    use crate::cputime::CpuTime;
    use crate::registry::{Capabilities, CounterRegistry};

    #[test]
    fn renders_aggregate_then_per_cpu_lines() {
        let registry = CounterRegistry::build(Capabilities::base());
        let stat = PerCpuStat::new(2);
        stat.account(0, CpuTime::User, 100);
        stat.account(0, CpuTime::Idle, 200);
        stat.account(1, CpuTime::User, 50);
        stat.account(1, CpuTime::Idle, 10);

        let text = generate_stat(&Aggregator::new(&registry, &stat)).unwrap();
        let lines: alloc::vec::Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "cpu  150 0 0 210 0 0 0 0 0 0");
        assert_eq!(lines[1], "cpu0 100 0 0 200 0 0 0 0 0 0");
        assert_eq!(lines[2], "cpu1 50 0 0 10 0 0 0 0 0 0");
    }

    #[cfg(feature = "std")]
    #[test]
    fn parses_kernel_file() {
        let registry = CounterRegistry::build(Capabilities::base());
        let content = "\
cpu  10 1 2 30 4 5 6 0 0 0
cpu0 4 1 2 10 4 5 6 0 0 0
cpu1 6 0 0 20 0 0 0 0 0 0
intr 12345 0 0
ctxt 999
btime 1700000000
";
        let sample = ProcStat::parse(content, &registry).unwrap();
        assert_eq!(sample.nr_cpu_ids(), 2);
        assert_eq!(sample.read(0, CpuTime::User.slot()), 4);
        assert_eq!(sample.read(0, CpuTime::Irq.slot()), 5);
        assert_eq!(sample.read(0, CpuTime::Softirq.slot()), 6);
        assert_eq!(sample.read(1, CpuTime::Idle.slot()), 20);
    }

    #[cfg(feature = "std")]
    #[test]
    fn offline_cpus_and_short_lines_read_as_zero() {
        let registry = CounterRegistry::build(Capabilities::base());
        let sample = ProcStat::parse("cpu2 1 2 3 4\n", &registry).unwrap();
        assert_eq!(sample.nr_cpu_ids(), 3);
        assert_eq!(sample.read(0, CpuTime::User.slot()), 0);
        assert_eq!(sample.read(2, CpuTime::Idle.slot()), 4);
        assert_eq!(sample.read(2, CpuTime::Steal.slot()), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn malformed_value_reports_line() {
        let registry = CounterRegistry::build(Capabilities::base());
        let err = ProcStat::parse("cpu  1 2\ncpu0 1 x 3\n", &registry).unwrap_err();
        match err {
            ProcStatError::Parse { line, ref message } => {
                assert_eq!(line, 2);
                assert!(message.contains("NICE"), "{}", message);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn huge_cpu_index_is_rejected() {
        let registry = CounterRegistry::build(Capabilities::base());
        for content in [
            "cpu18446744073709551615 1 2 3\n",
            "cpu100000000000 1 2 3\n",
            "cpu8192 1 2 3\n",
        ] {
            match ProcStat::parse(content, &registry) {
                Err(ProcStatError::Parse { line, message }) => {
                    assert_eq!(line, 1);
                    assert!(message.starts_with("CPU index out of range"), "{}", message);
                }
                other => panic!("unexpected result for {:?}: {:?}", content, other),
            }
        }
        let sample = ProcStat::parse("cpu8191 1\n", &registry).unwrap();
        assert_eq!(sample.nr_cpu_ids(), MAX_PROC_CPUS);
    }

    #[cfg(feature = "std")]
    #[test]
    fn duplicate_cpu_line_is_rejected() {
        let registry = CounterRegistry::build(Capabilities::base());
        let err = ProcStat::parse("cpu0 1\ncpu1 2\ncpu1 3\n", &registry).unwrap_err();
        match err {
            ProcStatError::Parse { line, ref message } => {
                assert_eq!(line, 3);
                assert!(message.contains("cpu1"), "{}", message);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn missing_file_is_io_error() {
        let registry = CounterRegistry::build(Capabilities::base());
        let err = ProcStat::read_from("/nonexistent/cpustat/stat", &registry).unwrap_err();
        assert!(matches!(err, ProcStatError::Io(_)));
    }
}
