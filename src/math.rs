//! Definitions of small mathematical objects used throughout the crate which
//! do not really fit anywhere else.

use std::collections::{BTreeMap, BTreeSet};

/// Type alias for ordered sets. Every container whose iteration order feeds a
/// construction algorithm (minimization, determinization) must be ordered so
/// that results are reproducible across runs.
pub type OrderedSet<S> = BTreeSet<S>;
/// Type alias for sets that only need a stable insertion order.
pub type Set<S> = indexmap::IndexSet<S>;

/// Type alias for ordered maps, see [`OrderedSet`].
pub type OrderedMap<K, V> = BTreeMap<K, V>;
/// Type alias for maps that only need a stable insertion order.
pub type Map<K, V> = indexmap::IndexMap<K, V>;

/// A partition groups elements of type `I` into disjoint classes. Blocks are
/// indexed in the order they were created, which the minimization engine
/// relies on for canonical naming.
#[derive(Debug, Clone)]
pub struct Partition<I: Ord>(Vec<OrderedSet<I>>);

impl<I: Ord> std::ops::Deref for Partition<I> {
    type Target = Vec<OrderedSet<I>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, I: Ord> IntoIterator for &'a Partition<I> {
    type Item = &'a OrderedSet<I>;
    type IntoIter = std::slice::Iter<'a, OrderedSet<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<I: Ord> PartialEq for Partition<I> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|block| other.contains(block))
    }
}
impl<I: Ord> Eq for Partition<I> {}

impl<I: Ord> Partition<I> {
    /// Returns the number of classes in the partition.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Builds a partition from an iterator of iterators of elements.
    pub fn new<X: IntoIterator<Item = I>, Y: IntoIterator<Item = X>>(iter: Y) -> Self {
        Self(
            iter.into_iter()
                .map(|block| block.into_iter().collect::<OrderedSet<_>>())
                .collect(),
        )
    }

    /// The index of the block containing `element`, if any.
    pub fn block_of(&self, element: &I) -> Option<usize> {
        self.0.iter().position(|block| block.contains(element))
    }
}

impl<I: Ord> From<Vec<OrderedSet<I>>> for Partition<I> {
    fn from(value: Vec<OrderedSet<I>>) -> Self {
        Self(value)
    }
}
