//! Vector-clock versions.
//!
//! Versions form a partial order. A write whose version does not come after
//! every stored version of the key is obsolete; two versions that neither
//! dominates are concurrent and kept side by side.

use crate::node::NodeId;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of comparing two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurred {
    /// `self` happened before `other`.
    Before,
    /// `self` happened after `other`.
    After,
    /// Neither version dominates.
    Concurrently,
    /// Identical clocks.
    Equal,
}

/// Vector clock: one monotonically increasing counter per writing node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VectorClock {
    entries: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock with the given per-node counters (zero counters are dropped).
    pub fn from_entries(entries: impl IntoIterator<Item = (NodeId, u64)>) -> Self {
        Self {
            entries: entries.into_iter().filter(|(_, count)| *count > 0).collect(),
        }
    }

    /// Bump `node`'s counter in place.
    pub fn increment(&mut self, node: NodeId) {
        *self.entries.entry(node).or_insert(0) += 1;
    }

    /// Copy of this clock with `node`'s counter bumped.
    pub fn incremented(&self, node: NodeId) -> Self {
        let mut next = self.clone();
        next.increment(node);
        next
    }

    pub fn counter(&self, node: NodeId) -> u64 {
        self.entries.get(&node).copied().unwrap_or(0)
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeId, u64)> + '_ {
        self.entries.iter().map(|(node, count)| (*node, *count))
    }

    /// Compare two clocks; missing entries count as zero.
    pub fn compare(&self, other: &VectorClock) -> Occurred {
        let mut self_bigger = false;
        let mut other_bigger = false;

        for node in self.entries.keys().chain(other.entries.keys()) {
            match self.counter(*node).cmp(&other.counter(*node)) {
                Ordering::Greater => self_bigger = true,
                Ordering::Less => other_bigger = true,
                Ordering::Equal => {}
            }
            if self_bigger && other_bigger {
                return Occurred::Concurrently;
            }
        }

        match (self_bigger, other_bigger) {
            (true, false) => Occurred::After,
            (false, true) => Occurred::Before,
            (false, false) => Occurred::Equal,
            (true, true) => Occurred::Concurrently,
        }
    }

    /// True if a write at `self` would be obsolete against `other`.
    pub fn is_obsoleted_by(&self, other: &VectorClock) -> bool {
        matches!(self.compare(other), Occurred::Before | Occurred::Equal)
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version(")?;
        for (i, (node, count)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{node}:{count}")?;
        }
        write!(f, ")")
    }
}

/// A value paired with its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: VectorClock,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: VectorClock) -> Self {
        Self { value, version }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> &VectorClock {
        &self.version
    }
}
