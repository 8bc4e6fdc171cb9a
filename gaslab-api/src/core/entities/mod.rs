use serde::{Deserialize, Serialize};

// the physical ids are dense indices into the record store and never move during a run
#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, Default,
)]
pub struct VID(pub usize);

impl VID {
    pub fn index(&self) -> usize {
        self.0
    }

    pub fn as_u64(&self) -> u64 {
        self.0 as u64
    }
}

impl From<usize> for VID {
    fn from(id: usize) -> Self {
        VID(id)
    }
}

impl From<VID> for usize {
    fn from(id: VID) -> Self {
        id.0
    }
}

#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, Default,
)]
pub struct EID(pub usize);

impl EID {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<EID> for usize {
    fn from(id: EID) -> Self {
        id.0
    }
}

impl From<usize> for EID {
    fn from(id: usize) -> Self {
        EID(id)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Dir {
    Into,
    Out,
}

/// A directed edge as seen from one of its endpoints.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EdgeRef {
    e_pid: EID,
    src_pid: VID,
    dst_pid: VID,
    e_type: Dir,
}

impl EdgeRef {
    #[inline]
    pub fn new_outgoing(e_pid: EID, src_pid: VID, dst_pid: VID) -> Self {
        EdgeRef {
            e_pid,
            src_pid,
            dst_pid,
            e_type: Dir::Out,
        }
    }

    #[inline]
    pub fn new_incoming(e_pid: EID, src_pid: VID, dst_pid: VID) -> Self {
        EdgeRef {
            e_pid,
            src_pid,
            dst_pid,
            e_type: Dir::Into,
        }
    }

    #[inline]
    pub fn pid(&self) -> EID {
        self.e_pid
    }

    #[inline]
    pub fn src(&self) -> VID {
        self.src_pid
    }

    #[inline]
    pub fn dst(&self) -> VID {
        self.dst_pid
    }

    #[inline]
    pub fn dir(&self) -> Dir {
        self.e_type
    }

    /// The endpoint the edge was reached from.
    #[inline]
    pub fn local(&self) -> VID {
        match self.e_type {
            Dir::Into => self.dst_pid,
            Dir::Out => self.src_pid,
        }
    }

    /// The endpoint on the far side of the edge.
    #[inline]
    pub fn remote(&self) -> VID {
        match self.e_type {
            Dir::Into => self.src_pid,
            Dir::Out => self.dst_pid,
        }
    }
}
