//! Error types for cpustat.

use core::fmt;

/// A query that could not be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStatError {
    /// The requested CPU does not exist.
    ///
    /// `max` is the highest valid index (`nr_cpu_ids - 1`), which is `-1`
    /// on a host with no CPUs.
    OutOfRangeUnit { cpu: i64, max: i64 },
}

impl fmt::Display for CpuStatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuStatError::OutOfRangeUnit { cpu, max } => {
                write!(f, "invalid CPU number: {} (max: {})", cpu, max)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CpuStatError {}

pub type CpuStatResult<T> = Result<T, CpuStatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn message_names_value_and_bound() {
        let err = CpuStatError::OutOfRangeUnit { cpu: 5, max: 3 };
        assert_eq!(err.to_string(), "invalid CPU number: 5 (max: 3)");
    }
}
