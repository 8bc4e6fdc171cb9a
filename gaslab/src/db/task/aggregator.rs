use rayon::prelude::*;

use crate::{
    core::{store::RecordStore, Direction, VID},
    db::program::VertexProgram,
    errors::{CallbackError, CallbackKind, GasError},
};

/// The merged accumulator of one vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Gathered<A> {
    pub acc: A,
    /// Number of edges that contributed, zero when `acc` is the empty accumulator.
    pub contributions: usize,
}

impl<A> Gathered<A> {
    /// A reduction over `n` contributions performs `n - 1` merges.
    pub fn merges(&self) -> usize {
        self.contributions.saturating_sub(1)
    }
}

/// Reduces gather contributions with the program's `merge`.
///
/// Contributions are reduced as a parallel pairwise tree, so the grouping is unspecified and
/// `merge` must be associative and commutative.
pub struct Aggregator<'a, P: VertexProgram> {
    program: &'a P,
}

impl<'a, P: VertexProgram> Aggregator<'a, P> {
    pub fn new(program: &'a P) -> Self {
        Self { program }
    }

    /// Merge every contribution into one accumulator, `new_accum()` when there are none.
    pub fn merge_all<I>(&self, vertex: u64, contributions: I) -> Result<Gathered<P::Accum>, GasError>
    where
        I: IntoParallelIterator<Item = Result<P::Accum, GasError>>,
    {
        let merged = contributions
            .into_par_iter()
            .map(|acc| acc.map(|acc| (acc, 1usize)))
            .try_reduce_with(|(a, n), (b, m)| {
                let acc = self
                    .program
                    .merge(a, b)
                    .map_err(|err| GasError::callback(CallbackKind::Merge, vertex, err))?;
                Ok((acc, n + m))
            });
        match merged {
            Some(res) => {
                let (acc, contributions) = res?;
                Ok(Gathered { acc, contributions })
            }
            None => Ok(Gathered {
                acc: self.program.new_accum(),
                contributions: 0,
            }),
        }
    }

    /// Run `gather` over the edges of `vid` in direction `dir` and merge the results.
    pub fn gather(
        &self,
        store: &RecordStore<P::VertexData, P::EdgeData>,
        vid: VID,
        dir: Direction,
    ) -> Result<Gathered<P::Accum>, GasError> {
        let gid = store.gid(vid);
        let (num_in, num_out) = store.degree_of(vid);
        let edges: Vec<_> = store.edge_refs(vid, dir).collect();
        let contributions = edges.par_iter().map(|e| {
            let edge = store.edge_entry(e.pid());
            self.program
                .gather(
                    store.vertex_data(edge.src()),
                    store.vertex_data(edge.dst()),
                    edge.data(),
                    num_in,
                    num_out,
                )
                .map_err(|err: CallbackError| GasError::callback(CallbackKind::Gather, gid, err))
        });
        self.merge_all(gid, contributions)
    }
}
