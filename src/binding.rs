//! Script-facing library surface.
//!
//! This is the part of cpustat an embedding scripting runtime registers as a
//! module. The runtime's own calling convention stays on its side: it hands
//! over already-unmarshalled integer arguments, supplies its table type via
//! [`TableBuilder`], and raises [`RuntimeError`] through its own error
//! channel.
//!
//! # Exported functions
//!
//! | name    | arguments      | returns                          |
//! |---------|----------------|----------------------------------|
//! | `get`   | `[cpu]`        | table of field name to ticks     |
//! | `count` | none           | number of CPUs                   |
//!
//! plus the read-only `stat` namespace mapping `USER`, `IDLE`, ... to slot
//! numbers.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use cpustat::binding::CpuStatLib;
//! use cpustat::block::PerCpuStat;
//! use cpustat::registry::{Capabilities, CounterRegistry};
//!
//! let registry = CounterRegistry::build(Capabilities::compiled());
//! let stat = PerCpuStat::new(2);
//! let lib = CpuStatLib::new(&registry, &stat);
//!
//! let all: BTreeMap<String, i64> = lib.get(None).unwrap();
//! assert_eq!(all["user"], 0);
//! assert_eq!(lib.count(), 2);
//! assert!(lib.get::<BTreeMap<String, i64>>(Some(2)).is_err());
//! ```

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

use crate::aggregate::Aggregator;
use crate::error::CpuStatError;
use crate::registry::CounterRegistry;
use crate::source::CpuStatSource;

/// Module name the library registers under.
pub const MODULE_NAME: &str = "cpustat";

/// Name of the numeric namespace table.
pub const NAMESPACE_NAME: &str = "stat";

/// Exported functions, in registration order.
pub const FUNCTIONS: &[&str] = &["get", "count"];

// =============================================================================
// Runtime-side types
// =============================================================================

/// A table under construction, owned by the embedding runtime.
pub trait TableBuilder: Sized {
    /// New empty table sized for `records` named fields.
    fn with_capacity(records: usize) -> Self;

    /// Set `table[key] = value`.
    fn set_integer(&mut self, key: &str, value: i64);
}

impl TableBuilder for BTreeMap<String, i64> {
    fn with_capacity(_records: usize) -> Self {
        BTreeMap::new()
    }

    fn set_integer(&mut self, key: &str, value: i64) {
        self.insert(key.to_string(), value);
    }
}

/// Error raised back into the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    /// Error carrying `message` as its full text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RuntimeError {}

impl From<CpuStatError> for RuntimeError {
    fn from(err: CpuStatError) -> Self {
        RuntimeError::new(err.to_string())
    }
}

/// Result of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<T> {
    Integer(i64),
    Table(T),
}

// =============================================================================
// Library
// =============================================================================

/// The `cpustat` module bound to one registry and one counter source.
pub struct CpuStatLib<'r, S> {
    aggregator: Aggregator<'r, S>,
}

impl<'r, S: CpuStatSource> CpuStatLib<'r, S> {
    /// Bind the module to `registry` and the counters of `source`.
    pub fn new(registry: &'r CounterRegistry, source: S) -> Self {
        Self {
            aggregator: Aggregator::new(registry, source),
        }
    }

    /// Aggregator behind `get` and `count`.
    pub fn aggregator(&self) -> &Aggregator<'r, S> {
        &self.aggregator
    }

    /// `get([cpu])`: counters of one CPU, or of all CPUs summed when `cpu`
    /// is omitted or `-1`.
    ///
    /// Values are clock ticks, passed to the runtime's signed integer type
    /// bit for bit.
    pub fn get<T: TableBuilder>(&self, cpu: Option<i64>) -> Result<T, RuntimeError> {
        let snapshot = self.aggregator.query_arg(cpu)?;
        let mut table = T::with_capacity(snapshot.len());
        for (field, value) in snapshot {
            table.set_integer(field, value as i64);
        }
        Ok(table)
    }

    /// `count()`: number of CPUs known to the host.
    pub fn count(&self) -> i64 {
        i64::try_from(self.aggregator.total_unit_count()).unwrap_or(i64::MAX)
    }

    /// The `stat` namespace: symbolic counter name to slot number.
    pub fn stat<T: TableBuilder>(&self) -> T {
        let registry = self.aggregator.registry();
        let mut table = T::with_capacity(registry.len());
        for (name, slot) in registry.namespace() {
            table.set_integer(name, slot as i64);
        }
        table
    }

    /// Dispatch an exported function by name.
    ///
    /// `args` are the call's integer arguments after the runtime has
    /// unmarshalled them; extra arguments are ignored.
    pub fn call<T: TableBuilder>(&self, name: &str, args: &[i64]) -> Result<Value<T>, RuntimeError> {
        match name {
            "get" => self.get(args.first().copied()).map(Value::Table),
            "count" => Ok(Value::Integer(self.count())),
            _ => Err(RuntimeError::new(alloc::format!(
                "{}: no function named '{}'",
                MODULE_NAME, name
            ))),
        }
    }
}
