//! The record store holding vertex and edge payloads.
//!
//! Vertices are addressed by their stable logical id (`u64`) and stored densely by physical id
//! ([VID]). Edges are addressed by their `(src, dst)` logical pair and stored densely by [EID].
//! Lookups on either side are O(1) amortised. Nothing is created implicitly by the accessors;
//! structure is only added through [RecordStore::add_vertex] and [RecordStore::add_edge].

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::{
    core::{Direction, EdgeRef, EID, VID},
    errors::GasError,
    serialise::{Codec, GraphSnapshot},
};

#[derive(Debug, Clone, PartialEq)]
pub struct VertexStore<V> {
    gid: u64,
    data: V,
    in_edges: Vec<EID>,
    out_edges: Vec<EID>,
}

impl<V> VertexStore<V> {
    pub fn gid(&self) -> u64 {
        self.gid
    }

    pub fn data(&self) -> &V {
        &self.data
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStore<E> {
    src: VID,
    dst: VID,
    data: E,
}

impl<E> EdgeStore<E> {
    pub fn src(&self) -> VID {
        self.src
    }

    pub fn dst(&self) -> VID {
        self.dst
    }

    pub fn data(&self) -> &E {
        &self.data
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore<V, E> {
    logical_to_physical: FxHashMap<u64, VID>,
    vertices: Vec<VertexStore<V>>,
    edge_index: FxHashMap<(VID, VID), EID>,
    edges: Vec<EdgeStore<E>>,
}

impl<V, E> Default for RecordStore<V, E> {
    fn default() -> Self {
        Self {
            logical_to_physical: FxHashMap::default(),
            vertices: Vec::new(),
            edge_index: FxHashMap::default(),
            edges: Vec::new(),
        }
    }
}

impl<V, E> RecordStore<V, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn resolve_vertex(&self, gid: u64) -> Option<VID> {
        self.logical_to_physical.get(&gid).copied()
    }

    pub fn resolve_edge(&self, src: u64, dst: u64) -> Option<EID> {
        let src = self.resolve_vertex(src)?;
        let dst = self.resolve_vertex(dst)?;
        self.edge_index.get(&(src, dst)).copied()
    }

    fn vid(&self, gid: u64) -> Result<VID, GasError> {
        self.resolve_vertex(gid).ok_or(GasError::VertexNotFound(gid))
    }

    fn eid(&self, src: u64, dst: u64) -> Result<EID, GasError> {
        self.resolve_edge(src, dst)
            .ok_or(GasError::EdgeNotFound { src, dst })
    }

    /// Add a vertex with the given payload. Fails if the id is already taken.
    pub fn add_vertex(&mut self, gid: u64, data: V) -> Result<VID, GasError> {
        if self.logical_to_physical.contains_key(&gid) {
            return Err(GasError::VertexExists(gid));
        }
        let vid = VID(self.vertices.len());
        self.vertices.push(VertexStore {
            gid,
            data,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        });
        self.logical_to_physical.insert(gid, vid);
        Ok(vid)
    }

    /// Resolve `gid`, adding it with the payload from `init` if it is not yet present.
    pub fn ensure_vertex(&mut self, gid: u64, init: impl FnOnce() -> V) -> VID {
        match self.resolve_vertex(gid) {
            Some(vid) => vid,
            None => {
                let vid = VID(self.vertices.len());
                self.vertices.push(VertexStore {
                    gid,
                    data: init(),
                    in_edges: Vec::new(),
                    out_edges: Vec::new(),
                });
                self.logical_to_physical.insert(gid, vid);
                vid
            }
        }
    }

    /// Add a directed edge between two existing vertices.
    pub fn add_edge(&mut self, src: u64, dst: u64, data: E) -> Result<EID, GasError> {
        let src_pid = self.vid(src)?;
        let dst_pid = self.vid(dst)?;
        if self.edge_index.contains_key(&(src_pid, dst_pid)) {
            return Err(GasError::EdgeExists { src, dst });
        }
        let eid = EID(self.edges.len());
        self.edges.push(EdgeStore {
            src: src_pid,
            dst: dst_pid,
            data,
        });
        self.edge_index.insert((src_pid, dst_pid), eid);
        self.vertices[src_pid.index()].out_edges.push(eid);
        self.vertices[dst_pid.index()].in_edges.push(eid);
        Ok(eid)
    }

    pub fn get_vertex(&self, gid: u64) -> Result<&V, GasError> {
        let vid = self.vid(gid)?;
        Ok(&self.vertices[vid.index()].data)
    }

    pub fn set_vertex(&mut self, gid: u64, data: V) -> Result<(), GasError> {
        let vid = self.vid(gid)?;
        self.vertices[vid.index()].data = data;
        Ok(())
    }

    pub fn get_edge(&self, src: u64, dst: u64) -> Result<&E, GasError> {
        let eid = self.eid(src, dst)?;
        Ok(&self.edges[eid.index()].data)
    }

    pub fn set_edge(&mut self, src: u64, dst: u64, data: E) -> Result<(), GasError> {
        let eid = self.eid(src, dst)?;
        self.edges[eid.index()].data = data;
        Ok(())
    }

    /// `(in_degree, out_degree)` of a vertex.
    pub fn degree(&self, gid: u64) -> Result<(usize, usize), GasError> {
        let vid = self.vid(gid)?;
        Ok(self.degree_of(vid))
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.vertices.iter().map(|v| v.gid)
    }

    pub fn vertices(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.vertices.iter().map(|v| (v.gid, &v.data))
    }

    pub fn edges(&self) -> impl Iterator<Item = (u64, u64, &E)> + '_ {
        self.edges.iter().map(|e| {
            (
                self.vertices[e.src.index()].gid,
                self.vertices[e.dst.index()].gid,
                &e.data,
            )
        })
    }

    // physical access used by the scheduler, ids are always valid there

    pub(crate) fn vertex_data(&self, vid: VID) -> &V {
        &self.vertices[vid.index()].data
    }

    pub(crate) fn edge_entry(&self, eid: EID) -> &EdgeStore<E> {
        &self.edges[eid.index()]
    }

    pub(crate) fn gid(&self, vid: VID) -> u64 {
        self.vertices[vid.index()].gid
    }

    pub(crate) fn degree_of(&self, vid: VID) -> (usize, usize) {
        let v = &self.vertices[vid.index()];
        (v.in_degree(), v.out_degree())
    }

    pub(crate) fn replace_vertex(&mut self, vid: VID, data: V) {
        self.vertices[vid.index()].data = data;
    }

    pub(crate) fn replace_edge(&mut self, eid: EID, data: E) {
        self.edges[eid.index()].data = data;
    }

    /// Edges of `vid` in the given direction, incoming edges first when both are requested.
    pub fn edge_refs(&self, vid: VID, dir: Direction) -> impl Iterator<Item = EdgeRef> + '_ {
        let v = &self.vertices[vid.index()];
        let incoming = dir.includes_in().then_some(&v.in_edges);
        let outgoing = dir.includes_out().then_some(&v.out_edges);
        let ins = incoming.into_iter().flatten().map(move |eid| {
            let e = &self.edges[eid.index()];
            EdgeRef::new_incoming(*eid, e.src, e.dst)
        });
        let outs = outgoing.into_iter().flatten().map(move |eid| {
            let e = &self.edges[eid.index()];
            EdgeRef::new_outgoing(*eid, e.src, e.dst)
        });
        ins.chain(outs)
    }
}

impl<V: Send + Sync, E: Send + Sync> RecordStore<V, E> {
    pub fn par_vertices(&self) -> impl ParallelIterator<Item = (u64, &V)> + '_ {
        self.vertices.par_iter().map(|v| (v.gid, &v.data))
    }

    pub fn par_edges(&self) -> impl ParallelIterator<Item = (u64, u64, &E)> + '_ {
        let vertices = &self.vertices;
        self.edges.par_iter().map(move |e| {
            (
                vertices[e.src.index()].gid,
                vertices[e.dst.index()].gid,
                &e.data,
            )
        })
    }

    /// Replace every payload with the result of `fv` / `fe`, computed in parallel.
    /// Nothing is written unless every call succeeds.
    pub(crate) fn try_map_payloads<Err: Send>(
        &mut self,
        fv: impl Fn(u64, &V) -> Result<V, Err> + Sync,
        fe: impl Fn(u64, u64, &E) -> Result<E, Err> + Sync,
    ) -> Result<(), Err> {
        let vertices = self
            .par_vertices()
            .map(|(gid, v)| fv(gid, v))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = self
            .par_edges()
            .map(|(src, dst, e)| fe(src, dst, e))
            .collect::<Result<Vec<_>, _>>()?;
        for (v, data) in self.vertices.iter_mut().zip(vertices) {
            v.data = data;
        }
        for (e, data) in self.edges.iter_mut().zip(edges) {
            e.data = data;
        }
        Ok(())
    }
}

impl<V, E> RecordStore<V, E> {
    /// Encode every payload with the given codecs.
    pub fn snapshot(
        &self,
        vertex_codec: &dyn Codec<V>,
        edge_codec: &dyn Codec<E>,
    ) -> Result<GraphSnapshot, GasError> {
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let bytes = vertex_codec
                    .encode(&v.data)
                    .map_err(|err| GasError::encode(format!("vertex {}", v.gid), err))?;
                Ok((v.gid, bytes))
            })
            .collect::<Result<Vec<_>, GasError>>()?;

        let edges = self
            .edges
            .iter()
            .map(|e| {
                let (src, dst) = (self.gid(e.src), self.gid(e.dst));
                let bytes = edge_codec
                    .encode(&e.data)
                    .map_err(|err| GasError::encode(format!("edge ({src}, {dst})"), err))?;
                Ok((src, dst, bytes))
            })
            .collect::<Result<Vec<_>, GasError>>()?;

        Ok(GraphSnapshot { vertices, edges })
    }

    /// Rebuild a store from a snapshot. Any malformed payload aborts the restore.
    pub fn from_snapshot(
        snapshot: &GraphSnapshot,
        vertex_codec: &dyn Codec<V>,
        edge_codec: &dyn Codec<E>,
    ) -> Result<Self, GasError> {
        let mut store = Self::new();
        for (gid, bytes) in snapshot.vertices.iter() {
            let data = vertex_codec
                .decode(bytes)
                .map_err(|err| GasError::decode(format!("vertex {gid}"), err))?;
            store.add_vertex(*gid, data)?;
        }
        for (src, dst, bytes) in snapshot.edges.iter() {
            let data = edge_codec
                .decode(bytes)
                .map_err(|err| GasError::decode(format!("edge ({src}, {dst})"), err))?;
            store.add_edge(*src, *dst, data)?;
        }
        Ok(store)
    }
}
