//! Single source shortest paths over non-negative integer weights.
//!
//! Only the source starts active. A vertex wakes a neighbour when going through it would
//! shorten the neighbour's distance, so the active set follows the frontier.

use crate::{
    algorithms::{run_program, AlgorithmResult},
    config::EngineConfig,
    core::agg::{Accumulator, MinDef},
    db::{
        program::{ScatterOutcome, VertexProgram},
        task::engine::{InitialActive, StoreOf},
    },
    errors::{CallbackError, GasError},
};

/// Distance of a vertex the source cannot reach.
pub const UNREACHABLE: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortestPaths;

impl VertexProgram for ShortestPaths {
    type VertexData = u64;
    /// Edge weight.
    type EdgeData = u64;
    type Accum = u64;

    fn new_vertex(&self) -> u64 {
        UNREACHABLE
    }

    fn new_edge(&self) -> u64 {
        1
    }

    fn new_accum(&self) -> u64 {
        MinDef::<u64>::zero()
    }

    fn gather(
        &self,
        src: &u64,
        _target: &u64,
        edge: &u64,
        _num_in: usize,
        _num_out: usize,
    ) -> Result<u64, CallbackError> {
        Ok(src.saturating_add(*edge))
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
        edge: &u64,
        _num_in: usize,
        _num_out: usize,
    ) -> Result<ScatterOutcome<u64>, CallbackError> {
        Ok(ScatterOutcome {
            edge: None,
            activate: src.saturating_add(*edge) < *target,
        })
    }

    /// `src dst [weight]`, the weight defaulting to 1.
    fn parse_edge(
        &self,
        _source: &str,
        line: &str,
    ) -> Result<Option<(u64, u64, u64)>, CallbackError> {
        if line.trim_start().starts_with('#') {
            return Ok(None);
        }
        let fields: Vec<_> = line.split_whitespace().collect();
        let parse = |s: &str| {
            s.parse::<u64>()
                .map_err(|_| CallbackError::new(format!("'{s}' is not an unsigned integer")))
        };
        match fields.as_slice() {
            [src, dst] => Ok(Some((parse(src)?, parse(dst)?, self.new_edge()))),
            [src, dst, weight, ..] => Ok(Some((parse(src)?, parse(dst)?, parse(weight)?))),
            _ => Err(CallbackError::new("expected 'src dst [weight]'")),
        }
    }
}

/// Distances from `source`, [UNREACHABLE] for vertices it cannot reach.
pub fn shortest_paths(
    mut store: StoreOf<ShortestPaths>,
    source: u64,
    config: EngineConfig,
) -> Result<AlgorithmResult<u64>, GasError> {
    store.set_vertex(source, 0)?;
    run_program(
        ShortestPaths,
        store,
        config,
        InitialActive::Vertices(vec![source]),
        |d| *d,
    )
}

#[cfg(test)]
mod sssp_test {
    use super::*;
    use crate::{config::EngineConfigBuilder, graph_loader::build_store};
    use pretty_assertions::assert_eq;

    #[test]
    fn shorter_path_through_more_hops_wins() {
        let store = build_store(
            &ShortestPaths,
            vec![(1, 2, 1), (2, 3, 1), (1, 3, 5), (4, 1, 1)],
        )
        .unwrap();
        let config = EngineConfigBuilder::new().build();

        let result = shortest_paths(store, 1, config).unwrap();
        assert!(result.summary.is_converged());
        assert_eq!(result.summary.iterations, 3);
        assert_eq!(
            result.values,
            vec![(1, 0), (2, 1), (3, 2), (4, UNREACHABLE)]
        );
    }

    #[test]
    fn unknown_source_is_not_found() {
        let store = build_store(&ShortestPaths, vec![(1, 2, 1)]).unwrap();
        let res = shortest_paths(store, 9, EngineConfigBuilder::new().build());
        assert!(matches!(res, Err(GasError::VertexNotFound(9))));
    }

    #[test]
    fn parses_optional_weights() {
        let p = ShortestPaths;
        assert_eq!(p.parse_edge("f", "1 2").unwrap(), Some((1, 2, 1)));
        assert_eq!(p.parse_edge("f", "1 2 7").unwrap(), Some((1, 2, 7)));
        assert_eq!(p.parse_edge("f", "# header").unwrap(), None);
        assert!(p.parse_edge("f", "1").is_err());
        assert!(p.parse_edge("f", "1 2 -3").is_err());
    }
}
