//! Ring position trait.

use std::fmt::Debug;
use std::hash::Hash;

/// A position on the hash ring.
///
/// Positions are totally ordered and the ring wraps around, so the distance
/// between two positions is always measured clockwise.
pub trait Token: Copy + Ord + Hash + Send + Sync + Debug + 'static {
    /// Clockwise distance from `self` to `other`.
    fn distance_to(&self, other: &Self) -> Self;
}
