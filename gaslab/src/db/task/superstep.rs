//! One barrier-synchronised round of gather, apply and scatter over the active set.
//!
//! Each phase finishes for every active vertex before the next one starts. Apply results are
//! staged and scatter reads the staged payloads; the store itself is only written once scatter
//! has succeeded for every vertex, so a failing callback leaves the store as it was.

use std::time::{Duration, Instant};

use rayon::{prelude::*, ThreadPool};
use tracing::{debug, info};

use crate::{
    core::{active_set::ActiveSet, store::RecordStore, EID, VID},
    db::{
        program::{ProgramContext, VertexProgram},
        task::aggregator::{Aggregator, Gathered},
    },
    errors::{CallbackKind, GasError},
};

/// Where a superstep is in its cycle. Every active vertex passes through each phase once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Idle,
    Gathering,
    Applying,
    Scattering,
    Done,
}

impl Phase {
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::Gathering),
            Phase::Gathering => Some(Phase::Applying),
            Phase::Applying => Some(Phase::Scattering),
            Phase::Scattering => Some(Phase::Done),
            Phase::Done => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperstepStats {
    pub superstep: usize,
    pub active: u64,
    pub gather_calls: usize,
    pub merge_calls: usize,
    pub apply_calls: usize,
    pub scatter_calls: usize,
    pub edge_writes: usize,
    /// Size of the next active set.
    pub activations: u64,
    pub elapsed: Duration,
}

struct Scattered<E> {
    calls: usize,
    writes: Vec<(EID, E)>,
    activated: Vec<VID>,
}

pub(crate) struct Superstep<'a, P: VertexProgram> {
    ctx: &'a ProgramContext<P>,
    pool: &'a ThreadPool,
    superstep: usize,
    phase: Phase,
}

impl<'a, P: VertexProgram> Superstep<'a, P> {
    pub(crate) fn new(ctx: &'a ProgramContext<P>, pool: &'a ThreadPool, superstep: usize) -> Self {
        Self {
            ctx,
            pool,
            superstep,
            phase: Phase::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(&mut self, to: Phase) {
        debug_assert_eq!(
            self.phase.next(),
            Some(to),
            "superstep {} cannot move from {:?} to {:?}",
            self.superstep,
            self.phase,
            to
        );
        debug!("superstep {}: {:?} -> {:?}", self.superstep, self.phase, to);
        self.phase = to;
    }

    /// Run the superstep and return the next active set.
    pub(crate) fn run(
        &mut self,
        store: &mut RecordStore<P::VertexData, P::EdgeData>,
        active: &ActiveSet,
    ) -> Result<(ActiveSet, SuperstepStats), GasError> {
        let start = Instant::now();
        let ctx = self.ctx;
        let program = ctx.program();
        let config = ctx.config();
        let pool = self.pool;
        let active_vids = active.to_vec();
        let mut stats = SuperstepStats {
            superstep: self.superstep,
            active: active.len(),
            ..Default::default()
        };

        self.advance(Phase::Gathering);
        let gathered: Vec<Option<Gathered<P::Accum>>> = if config.aggregator {
            let agg = Aggregator::new(program);
            let store = &*store;
            pool.install(|| {
                active_vids
                    .par_iter()
                    .map(|vid| agg.gather(store, *vid, config.gather_edges).map(Some))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            active_vids.iter().map(|_| None).collect()
        };
        for g in gathered.iter().flatten() {
            stats.gather_calls += g.contributions;
            stats.merge_calls += g.merges();
        }

        self.advance(Phase::Applying);
        let applied: Vec<P::VertexData> = {
            let store = &*store;
            pool.install(|| {
                active_vids
                    .par_iter()
                    .zip(gathered.into_par_iter())
                    .map(|(vid, gathered)| {
                        let (num_in, num_out) = store.degree_of(*vid);
                        program
                            .apply(
                                store.vertex_data(*vid),
                                gathered.map(|g| g.acc),
                                num_in,
                                num_out,
                            )
                            .map_err(|err| {
                                GasError::callback(CallbackKind::Apply, store.gid(*vid), err)
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })?
        };
        stats.apply_calls = applied.len();

        self.advance(Phase::Scattering);
        let scattered: Vec<Scattered<P::EdgeData>> = {
            let store = &*store;
            // active vertices see their new payload, everything else the committed one
            let view = |vid: VID| match active_vids.binary_search(&vid) {
                Ok(i) => &applied[i],
                Err(_) => store.vertex_data(vid),
            };
            pool.install(|| {
                active_vids
                    .par_iter()
                    .map(|vid| {
                        let gid = store.gid(*vid);
                        let (num_in, num_out) = store.degree_of(*vid);
                        let mut out = Scattered {
                            calls: 0,
                            writes: Vec::new(),
                            activated: Vec::new(),
                        };
                        for e in store.edge_refs(*vid, config.scatter_edges) {
                            let edge = store.edge_entry(e.pid());
                            let outcome = program
                                .scatter(
                                    view(edge.src()),
                                    view(edge.dst()),
                                    edge.data(),
                                    num_in,
                                    num_out,
                                )
                                .map_err(|err| GasError::callback(CallbackKind::Scatter, gid, err))?;
                            out.calls += 1;
                            if let Some(data) = outcome.edge {
                                out.writes.push((e.pid(), data));
                            }
                            if outcome.activate {
                                out.activated.push(e.remote());
                            }
                        }
                        Ok::<_, GasError>(out)
                    })
                    .collect::<Result<Vec<_>, GasError>>()
            })?
        };

        // commit in ascending vertex order, a later write to the same edge wins
        for (vid, data) in active_vids.iter().zip(applied) {
            store.replace_vertex(*vid, data);
        }
        let mut next = ActiveSet::new();
        for s in scattered {
            stats.scatter_calls += s.calls;
            stats.edge_writes += s.writes.len();
            for (eid, data) in s.writes {
                store.replace_edge(eid, data);
            }
            next.extend(s.activated);
        }
        self.advance(Phase::Done);

        stats.activations = next.len();
        stats.elapsed = start.elapsed();
        info!(
            "superstep {} finished in {:?}: {} active, {} gathers, {} merges, {} scatters, {} edge writes, {} activated",
            stats.superstep,
            stats.elapsed,
            stats.active,
            stats.gather_calls,
            stats.merge_calls,
            stats.scatter_calls,
            stats.edge_writes,
            stats.activations
        );
        Ok((next, stats))
    }
}

#[cfg(test)]
mod superstep_test {
    use super::*;
    use crate::{
        config::EngineConfigBuilder,
        core::Direction,
        db::{program::ScatterOutcome, task::custom_pool},
        errors::CallbackError,
    };
    use pretty_assertions::assert_eq;

    // every vertex takes the max of its in-neighbours and itself, edges record the last value sent
    struct MaxLabel;

    impl VertexProgram for MaxLabel {
        type VertexData = u64;
        type EdgeData = u64;
        type Accum = u64;

        fn new_vertex(&self) -> u64 {
            0
        }

        fn new_edge(&self) -> u64 {
            0
        }

        fn new_accum(&self) -> u64 {
            0
        }

        fn gather(&self, src: &u64, _: &u64, _: &u64, _: usize, _: usize) -> Result<u64, CallbackError> {
            Ok(*src)
        }

        fn merge(&self, a: u64, b: u64) -> Result<u64, CallbackError> {
            Ok(a.max(b))
        }

        fn apply(&self, t: &u64, acc: Option<u64>, _: usize, _: usize) -> Result<u64, CallbackError> {
            Ok(acc.map_or(*t, |acc| acc.max(*t)))
        }

        fn scatter(
            &self,
            src: &u64,
            target: &u64,
            _: &u64,
            _: usize,
            _: usize,
        ) -> Result<ScatterOutcome<u64>, CallbackError> {
            if *src == 99 {
                return Err(CallbackError::new("boom"));
            }
            Ok(ScatterOutcome::rewrite(*src, src > target))
        }
    }

    fn path() -> RecordStore<u64, u64> {
        let mut store = RecordStore::new();
        for (id, v) in [(1, 5), (2, 1), (3, 3)] {
            store.add_vertex(id, v).unwrap();
        }
        store.add_edge(1, 2, 0).unwrap();
        store.add_edge(2, 3, 0).unwrap();
        store
    }

    #[test]
    fn phases_advance_in_order() {
        let mut phase = Phase::Idle;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            assert!(next > phase);
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                Phase::Idle,
                Phase::Gathering,
                Phase::Applying,
                Phase::Scattering,
                Phase::Done
            ]
        );
    }

    #[test]
    fn scatter_sees_applied_payloads() {
        let ctx = ProgramContext::with_defaults(MaxLabel, EngineConfigBuilder::new().build());
        let pool = custom_pool(2).unwrap();
        let mut store = path();
        let active = ActiveSet::all(store.num_vertices());

        let mut superstep = Superstep::new(&ctx, &pool, 0);
        let (next, stats) = superstep.run(&mut store, &active).unwrap();
        assert_eq!(superstep.phase(), Phase::Done);

        // gather reads committed payloads: 2 <- 5, 3 <- 1
        assert_eq!(*store.get_vertex(2).unwrap(), 5);
        assert_eq!(*store.get_vertex(3).unwrap(), 3);
        // scatter reads staged payloads
        assert_eq!(*store.get_edge(1, 2).unwrap(), 5);
        assert_eq!(*store.get_edge(2, 3).unwrap(), 5);
        assert_eq!(next.iter().map(|v| store.gid(v)).collect::<Vec<_>>(), vec![3]);

        assert_eq!(stats.active, 3);
        assert_eq!(stats.gather_calls, 2);
        assert_eq!(stats.merge_calls, 0);
        assert_eq!(stats.apply_calls, 3);
        assert_eq!(stats.scatter_calls, 2);
        assert_eq!(stats.edge_writes, 2);
        assert_eq!(stats.activations, 1);
    }

    #[test]
    fn failed_scatter_commits_nothing() {
        let ctx = ProgramContext::with_defaults(MaxLabel, EngineConfigBuilder::new().build());
        let pool = custom_pool(2).unwrap();
        let mut store = path();
        store.set_vertex(1, 99).unwrap();
        let before = store.clone();

        let active = ActiveSet::all(store.num_vertices());
        let err = Superstep::new(&ctx, &pool, 0)
            .run(&mut store, &active)
            .unwrap_err();
        assert!(matches!(
            err,
            GasError::Callback {
                kind: CallbackKind::Scatter,
                ..
            }
        ));
        assert_eq!(
            store.vertices().collect::<Vec<_>>(),
            before.vertices().collect::<Vec<_>>()
        );
        assert_eq!(store.edges().collect::<Vec<_>>(), before.edges().collect::<Vec<_>>());
    }

    #[test]
    fn both_directions_commit_highest_vertex_last() {
        let config = EngineConfigBuilder::new()
            .with_scatter_edges(Direction::BOTH)
            .with_aggregator(false)
            .build();
        let ctx = ProgramContext::with_defaults(MaxLabel, config);
        let pool = custom_pool(4).unwrap();
        let mut store = path();
        let active = ActiveSet::all(store.num_vertices());

        let (_, stats) = Superstep::new(&ctx, &pool, 0)
            .run(&mut store, &active)
            .unwrap();
        assert_eq!(stats.gather_calls, 0);
        // edge 2 -> 3 is scattered by vertex 2 and vertex 3, both write src = 1
        assert_eq!(*store.get_edge(2, 3).unwrap(), 1);
        assert_eq!(*store.get_edge(1, 2).unwrap(), 5);
        assert_eq!(stats.scatter_calls, 4);
    }
}
