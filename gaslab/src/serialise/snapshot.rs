use serde::{Deserialize, Serialize};

/// Encoded payloads of every vertex and edge of a record store.
///
/// Vertices are kept in physical order and edges in insertion order, so restoring a snapshot
/// reproduces the same physical ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertices: Vec<(u64, Vec<u8>)>,
    pub edges: Vec<(u64, u64, Vec<u8>)>,
}

impl GraphSnapshot {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Box<bincode::ErrorKind>> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Box<bincode::ErrorKind>> {
        bincode::deserialize(bytes)
    }
}
