//! Weakly connected components by minimum label propagation.
//!
//! Gather and scatter both run over every edge regardless of direction. Every vertex starts
//! labelled with its own id and ends with the smallest id of its component.

use crate::{
    algorithms::{run_program, AlgorithmResult},
    config::EngineConfig,
    core::{
        agg::{Accumulator, MinDef},
        Direction,
    },
    db::{
        program::{ScatterOutcome, VertexProgram},
        task::engine::{InitialActive, StoreOf},
    },
    errors::{CallbackError, GasError},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectedComponents;

impl VertexProgram for ConnectedComponents {
    type VertexData = u64;
    type EdgeData = ();
    type Accum = u64;

    fn new_vertex(&self) -> u64 {
        u64::MAX
    }

    fn new_edge(&self) -> Self::EdgeData {}

    fn new_accum(&self) -> u64 {
        MinDef::<u64>::zero()
    }

    fn gather(
        &self,
        src: &u64,
        target: &u64,
        _edge: &(),
        _num_in: usize,
        _num_out: usize,
    ) -> Result<u64, CallbackError> {
        Ok((*src).min(*target))
    }

    fn merge(&self, a: u64, b: u64) -> Result<u64, CallbackError> {
        Ok(MinDef::<u64>::merge(a, b))
    }

    fn apply(
        &self,
        target: &u64,
        acc: Option<u64>,
        _num_in: usize,
        _num_out: usize,
    ) -> Result<u64, CallbackError> {
        Ok(acc.map_or(*target, |acc| acc.min(*target)))
    }

    fn scatter(
        &self,
        src: &u64,
        target: &u64,
        _edge: &(),
        _num_in: usize,
        _num_out: usize,
    ) -> Result<ScatterOutcome<()>, CallbackError> {
        Ok(ScatterOutcome {
            edge: None,
            activate: src != target,
        })
    }
}

/// Label every vertex with the smallest id in its weakly connected component.
///
/// The edge directions in `config` are overridden.
pub fn weakly_connected_components(
    mut store: StoreOf<ConnectedComponents>,
    mut config: EngineConfig,
) -> Result<AlgorithmResult<u64>, GasError> {
    let ids: Vec<u64> = store.vertex_ids().collect();
    for id in ids {
        store.set_vertex(id, id)?;
    }
    config.gather_edges = Direction::BOTH;
    config.scatter_edges = Direction::BOTH;
    config.aggregator = true;
    run_program(ConnectedComponents, store, config, InitialActive::All, |l| *l)
}
