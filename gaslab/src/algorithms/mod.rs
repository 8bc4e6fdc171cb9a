//! Vertex programs bundled with gaslab.
//!
//! Each module provides the program itself and a helper that runs it over a loaded store and
//! collects one value per vertex.

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::EngineConfig,
    db::{
        program::{ProgramContext, VertexProgram},
        task::engine::{Engine, InitialActive, RunSummary, StoreOf},
    },
    errors::GasError,
};

pub mod connected_components;
pub mod pagerank;
pub mod sssp;

/// Per vertex results of a run, sorted by vertex id.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmResult<T> {
    pub values: Vec<(u64, T)>,
    pub summary: RunSummary,
}

impl<T> AlgorithmResult<T> {
    pub fn get(&self, id: u64) -> Option<&T> {
        self.values
            .binary_search_by_key(&id, |(v, _)| *v)
            .ok()
            .map(|i| &self.values[i].1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn run_program<P, T>(
    program: P,
    store: StoreOf<P>,
    config: EngineConfig,
    initial: InitialActive,
    extract: impl Fn(&P::VertexData) -> T,
) -> Result<AlgorithmResult<T>, GasError>
where
    P: VertexProgram,
    P::VertexData: Serialize + DeserializeOwned,
    P::EdgeData: Serialize + DeserializeOwned,
    P::Accum: Serialize + DeserializeOwned,
{
    let ctx = ProgramContext::with_defaults(program, config);
    let mut engine = Engine::new(ctx, store)?.with_initial_active(initial)?;
    let summary = engine.run()?;
    let mut values: Vec<_> = engine
        .store()
        .vertices()
        .map(|(id, v)| (id, extract(v)))
        .collect();
    values.sort_by_key(|(id, _)| *id);
    Ok(AlgorithmResult { values, summary })
}
