use std::fmt::{Debug, Formatter};

use roaring::RoaringTreemap;

use crate::core::VID;

/// The vertices scheduled to run in a superstep.
///
/// Iteration is always in ascending physical id order.
#[derive(Clone, Default, PartialEq)]
pub struct ActiveSet(RoaringTreemap);

impl ActiveSet {
    pub fn new() -> Self {
        Self(RoaringTreemap::new())
    }

    /// Every vertex of a store with `num_vertices` vertices.
    pub fn all(num_vertices: usize) -> Self {
        let mut set = RoaringTreemap::new();
        if num_vertices > 0 {
            set.insert_range(0..num_vertices as u64);
        }
        Self(set)
    }

    pub fn insert(&mut self, v: VID) -> bool {
        self.0.insert(v.as_u64())
    }

    pub fn contains(&self, v: VID) -> bool {
        self.0.contains(v.as_u64())
    }

    pub fn len(&self) -> u64 {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = VID> + '_ {
        self.0.iter().map(|v| VID(v as usize))
    }

    pub fn to_vec(&self) -> Vec<VID> {
        self.iter().collect()
    }
}

impl FromIterator<VID> for ActiveSet {
    fn from_iter<T: IntoIterator<Item = VID>>(iter: T) -> Self {
        Self(iter.into_iter().map(|v| v.as_u64()).collect())
    }
}

impl Extend<VID> for ActiveSet {
    fn extend<T: IntoIterator<Item = VID>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(|v| v.as_u64()))
    }
}

impl Debug for ActiveSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}
