//! Counter registry: the single source of truth for counter names and slots.
//!
//! The registry is an ordered list of `(symbolic name, slot)` pairs. Both the
//! lower-case field names used in snapshots and the upper-case numeric
//! namespace exposed to scripts are derived from this one list, so the two
//! can never disagree.
//!
//! The order of the list is the reporting order (`/proc/stat` column order),
//! while the slot is the storage index inside a per-CPU block (see
//! [`CpuTime`]). Conditional kinds are appended at the end, behind
//! [`Capabilities`], and never shift the slots of earlier entries.
//!
//! # Usage
//!
//! ```rust
//! use cpustat::registry::{self, Capabilities};
//!
//! let registry = registry::init(Capabilities::compiled());
//! for descriptor in registry.iter() {
//!     let _ = (descriptor.name, descriptor.slot);
//! }
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use conquer_once::spin::OnceCell;

use crate::cputime::{CpuTime, NR_STATS};

// =============================================================================
// Descriptors
// =============================================================================

/// One counter kind: its symbolic name and the slot it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDescriptor {
    /// Upper-case symbolic name, e.g. `GUEST_NICE`.
    pub name: &'static str,
    /// Index into a per-CPU counter block.
    pub slot: usize,
}

impl CounterDescriptor {
    const fn new(name: &'static str, kind: CpuTime) -> Self {
        Self {
            name,
            slot: kind.slot(),
        }
    }

    /// Externally visible field name: the symbolic name in lower case.
    pub fn field_name(&self) -> String {
        field_name_of(self)
    }
}

/// Derive the field name reported for `descriptor`.
///
/// Pure: the same descriptor always yields the same string.
pub fn field_name_of(descriptor: &CounterDescriptor) -> String {
    descriptor.name.to_ascii_lowercase()
}

/// Counter kinds every build carries, in reporting order.
const BASE_COUNTERS: [CounterDescriptor; 10] = [
    CounterDescriptor::new("USER", CpuTime::User),
    CounterDescriptor::new("NICE", CpuTime::Nice),
    CounterDescriptor::new("SYSTEM", CpuTime::System),
    CounterDescriptor::new("IDLE", CpuTime::Idle),
    CounterDescriptor::new("IOWAIT", CpuTime::Iowait),
    CounterDescriptor::new("IRQ", CpuTime::Irq),
    CounterDescriptor::new("SOFTIRQ", CpuTime::Softirq),
    CounterDescriptor::new("STEAL", CpuTime::Steal),
    CounterDescriptor::new("GUEST", CpuTime::Guest),
    CounterDescriptor::new("GUEST_NICE", CpuTime::GuestNice),
];

#[cfg(feature = "sched_core")]
const FORCE_IDLE: CounterDescriptor = CounterDescriptor::new("FORCEIDLE", CpuTime::ForceIdle);

// =============================================================================
// Capabilities
// =============================================================================

/// Which conditional counter kinds the registry should carry.
///
/// A kind can only be enabled if it was compiled in; asking for one that
/// was not is ignored with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Core-scheduling force-idle accounting (`FORCEIDLE`).
    pub force_idle: bool,
}

impl Capabilities {
    /// Everything the current build was compiled with.
    pub const fn compiled() -> Self {
        Self {
            force_idle: cfg!(feature = "sched_core"),
        }
    }

    /// Only the ten base counters.
    pub const fn base() -> Self {
        Self { force_idle: false }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::compiled()
    }
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug)]
struct RegistryEntry {
    descriptor: CounterDescriptor,
    field: String,
}

/// Ordered, immutable set of counter descriptors.
#[derive(Debug)]
pub struct CounterRegistry {
    entries: Vec<RegistryEntry>,
}

impl CounterRegistry {
    /// Build the registry for the given capabilities.
    ///
    /// Deterministic and infallible. Field names are folded once here and
    /// borrowed by every snapshot afterwards.
    pub fn build(caps: Capabilities) -> Self {
        let mut entries = Vec::with_capacity(NR_STATS);
        for descriptor in BASE_COUNTERS {
            entries.push(RegistryEntry {
                descriptor,
                field: field_name_of(&descriptor),
            });
        }

        #[cfg(feature = "sched_core")]
        if caps.force_idle {
            entries.push(RegistryEntry {
                descriptor: FORCE_IDLE,
                field: field_name_of(&FORCE_IDLE),
            });
        }

        #[cfg(not(feature = "sched_core"))]
        if caps.force_idle {
            log::warn!("cpustat: force-idle requested but not compiled in, ignoring");
        }

        let registry = Self { entries };
        debug_assert!(registry.is_consistent(), "counter registry is inconsistent");
        registry
    }

    /// Number of counter kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True only if no counter kind is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the descriptors in reporting order.
    ///
    /// Every call starts again from the first descriptor.
    pub fn iter(&self) -> Descriptors<'_> {
        Descriptors {
            registry: self,
            index: 0,
        }
    }

    /// Iterate `(descriptor, field name)` pairs in reporting order.
    pub fn fields(&self) -> impl Iterator<Item = (&CounterDescriptor, &str)> + '_ {
        self.entries
            .iter()
            .map(|entry| (&entry.descriptor, entry.field.as_str()))
    }

    /// Iterate the numeric namespace: `(symbolic name, slot)`.
    pub fn namespace(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.descriptor.name, entry.descriptor.slot))
    }

    /// Look up a descriptor by its upper-case symbolic name.
    pub fn lookup(&self, name: &str) -> Option<&CounterDescriptor> {
        self.iter().find(|descriptor| descriptor.name == name)
    }

    /// Look up a descriptor by its lower-case field name.
    pub fn lookup_field(&self, field: &str) -> Option<&CounterDescriptor> {
        self.fields()
            .find(|(_, name)| *name == field)
            .map(|(descriptor, _)| descriptor)
    }

    /// Names non-empty and unique after folding, slots in range and unique.
    fn is_consistent(&self) -> bool {
        let mut seen_slots = [false; NR_STATS];
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.field.is_empty() || entry.descriptor.slot >= NR_STATS {
                return false;
            }
            if core::mem::replace(&mut seen_slots[entry.descriptor.slot], true) {
                return false;
            }
            if self.entries[..i].iter().any(|other| other.field == entry.field) {
                return false;
            }
        }
        true
    }
}

/// Iterator over the descriptors of a [`CounterRegistry`].
pub struct Descriptors<'r> {
    registry: &'r CounterRegistry,
    index: usize,
}

impl<'r> Iterator for Descriptors<'r> {
    type Item = &'r CounterDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.registry.entries.get(self.index)?;
        self.index += 1;
        Some(&entry.descriptor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.registry.entries.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Descriptors<'_> {}

impl<'r> IntoIterator for &'r CounterRegistry {
    type Item = &'r CounterDescriptor;
    type IntoIter = Descriptors<'r>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Process-wide registry
// =============================================================================

static REGISTRY: OnceCell<CounterRegistry> = OnceCell::uninit();

/// Build the process-wide registry from `caps`.
///
/// Only the first call has an effect; later calls log a warning and return
/// the registry that is already in place.
pub fn init(caps: Capabilities) -> &'static CounterRegistry {
    match REGISTRY.try_init_once(|| CounterRegistry::build(caps)) {
        Ok(()) => {
            let registry = get();
            log::info!("cpustat: registry initialized with {} counters", registry.len());
            for (name, slot) in registry.namespace() {
                log::debug!("cpustat: {} -> slot {}", name, slot);
            }
            registry
        }
        Err(_) => {
            log::warn!("cpustat: registry already initialized");
            get()
        }
    }
}

/// The process-wide registry, built from [`Capabilities::compiled`] if
/// [`init`] was never called.
pub fn get() -> &'static CounterRegistry {
    REGISTRY.get_or_init(|| CounterRegistry::build(Capabilities::compiled()))
}
