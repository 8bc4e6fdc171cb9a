//! PageRank with delta scheduling.
//!
//! Each vertex keeps its rank and the size of its last change. Scatter pushes `rank / out_degree`
//! onto every out-edge and only wakes neighbours while the change is above the tolerance, so
//! the run ends once ranks settle.

use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{run_program, AlgorithmResult},
    config::EngineConfig,
    core::{
        agg::{Accumulator, SumDef},
        Direction,
    },
    db::{
        program::{ScatterOutcome, VertexProgram},
        task::engine::{InitialActive, StoreOf},
    },
    errors::{CallbackError, GasError},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRankState {
    pub rank: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRank {
    pub damping: f64,
    pub tolerance: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
        }
    }
}

impl PageRank {
    pub fn new(damping: f64, tolerance: f64) -> Self {
        Self { damping, tolerance }
    }
}

impl VertexProgram for PageRank {
    type VertexData = PageRankState;
    /// The share of the source's rank carried by the edge.
    type EdgeData = f64;
    type Accum = f64;

    fn new_vertex(&self) -> PageRankState {
        PageRankState {
            rank: 1.0,
            delta: f64::INFINITY,
        }
    }

    fn new_edge(&self) -> f64 {
        0.0
    }

    fn new_accum(&self) -> f64 {
        SumDef::<f64>::zero()
    }

    fn gather(
        &self,
        _src: &PageRankState,
        _target: &PageRankState,
        edge: &f64,
        _num_in: usize,
        _num_out: usize,
    ) -> Result<f64, CallbackError> {
        Ok(*edge)
    }

    fn merge(&self, a: f64, b: f64) -> Result<f64, CallbackError> {
        Ok(SumDef::<f64>::merge(a, b))
    }

    fn apply(
        &self,
        target: &PageRankState,
        acc: Option<f64>,
        _num_in: usize,
        _num_out: usize,
    ) -> Result<PageRankState, CallbackError> {
        let acc = acc.ok_or_else(|| CallbackError::new("pagerank needs the aggregator enabled"))?;
        let rank = (1.0 - self.damping) + self.damping * acc;
        Ok(PageRankState {
            rank,
            delta: (rank - target.rank).abs(),
        })
    }

    fn scatter(
        &self,
        src: &PageRankState,
        _target: &PageRankState,
        _edge: &f64,
        _num_in: usize,
        num_out: usize,
    ) -> Result<ScatterOutcome<f64>, CallbackError> {
        let share = src.rank / num_out as f64;
        Ok(ScatterOutcome::rewrite(share, src.delta > self.tolerance))
    }
}

/// Run PageRank over every vertex of `store`.
///
/// Ranks flow along edge direction, so the edge directions and aggregator setting in `config`
/// are overridden.
pub fn pagerank(
    program: PageRank,
    store: StoreOf<PageRank>,
    mut config: EngineConfig,
) -> Result<AlgorithmResult<f64>, GasError> {
    config.gather_edges = Direction::IN;
    config.scatter_edges = Direction::OUT;
    config.aggregator = true;
    run_program(program, store, config, InitialActive::All, |s| s.rank)
}
