use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use gaslab::{errors::CallbackKind, prelude::*};
use gaslab_api::core::utils::logging::global_info_logger;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

/// Sums edge weights into the target and records what every callback saw.
#[derive(Default)]
struct Probe {
    activate: bool,
    fail_scatter_on: Option<f64>,
    stop_after_apply: Option<StopHandle>,
    gathers: AtomicUsize,
    applies: AtomicUsize,
    seen_accs: Mutex<Vec<Option<f64>>>,
    saved: Mutex<Vec<(u64, f64)>>,
}

impl Probe {
    fn activating() -> Self {
        Self {
            activate: true,
            ..Default::default()
        }
    }
}

impl VertexProgram for Probe {
    type VertexData = f64;
    type EdgeData = f64;
    type Accum = f64;

    fn new_vertex(&self) -> f64 {
        0.0
    }

    fn new_edge(&self) -> f64 {
        1.0
    }

    fn new_accum(&self) -> f64 {
        -1.0
    }

    fn gather(&self, _: &f64, _: &f64, edge: &f64, _: usize, _: usize) -> Result<f64, CallbackError> {
        self.gathers.fetch_add(1, Ordering::Relaxed);
        Ok(*edge)
    }

    fn merge(&self, a: f64, b: f64) -> Result<f64, CallbackError> {
        Ok(a + b)
    }

    fn apply(&self, target: &f64, acc: Option<f64>, _: usize, _: usize) -> Result<f64, CallbackError> {
        self.applies.fetch_add(1, Ordering::Relaxed);
        self.seen_accs.lock().push(acc);
        if let Some(stop) = &self.stop_after_apply {
            stop.stop();
        }
        Ok(acc.unwrap_or(*target))
    }

    fn scatter(
        &self,
        src: &f64,
        _: &f64,
        _: &f64,
        _: usize,
        _: usize,
    ) -> Result<ScatterOutcome<f64>, CallbackError> {
        if self.fail_scatter_on == Some(*src) {
            return Err(CallbackError::new("refusing to scatter"));
        }
        Ok(ScatterOutcome {
            edge: None,
            activate: self.activate,
        })
    }

    fn transform_vertex(&self, v: &f64) -> Result<f64, CallbackError> {
        Ok(v * 2.0)
    }

    fn save_vertex(&self, id: u64, v: &f64) -> Result<(), CallbackError> {
        self.saved.lock().push((id, *v));
        Ok(())
    }
}

fn engine(program: Probe, store: RecordStore<f64, f64>, config: EngineConfig) -> Engine<Probe> {
    Engine::new(ProgramContext::with_defaults(program, config), store).unwrap()
}

fn store(vertices: &[(u64, f64)], edges: &[(u64, u64, f64)]) -> RecordStore<f64, f64> {
    let mut store = RecordStore::new();
    for (id, v) in vertices {
        store.add_vertex(*id, *v).unwrap();
    }
    for (src, dst, w) in edges {
        store.add_edge(*src, *dst, *w).unwrap();
    }
    store
}

#[test]
fn single_vertex_applies_once_with_empty_accumulator() {
    global_info_logger();
    let mut engine = engine(
        Probe::default(),
        store(&[(1, 5.0)], &[]),
        EngineConfig::default(),
    );

    let stats = engine.step().unwrap();
    let program = engine.context().program();
    assert_eq!(program.applies.load(Ordering::Relaxed), 1);
    assert_eq!(program.gathers.load(Ordering::Relaxed), 0);
    assert_eq!(*program.seen_accs.lock(), vec![Some(-1.0)]);
    assert_eq!(stats.merge_calls, 0);
    assert_eq!(engine.active(), Vec::<u64>::new());
    assert_eq!(*engine.store().get_vertex(1).unwrap(), -1.0);
}

#[test]
fn vertex_only_reactivates_itself_through_scatter() {
    let mut engine = engine(
        Probe::activating(),
        store(&[(1, 0.0)], &[(1, 1, 3.0)]),
        EngineConfig::default(),
    );
    engine.step().unwrap();
    assert_eq!(engine.active(), vec![1]);
    assert_eq!(*engine.store().get_vertex(1).unwrap(), 3.0);
}

#[test]
fn sum_of_single_edge_lands_on_target_only() {
    let mut engine = engine(
        Probe::default(),
        store(&[(1, 7.0), (2, 0.0)], &[(1, 2, 2.5)]),
        EngineConfig::default(),
    )
    .with_initial_active(InitialActive::Vertices(vec![2]))
    .unwrap();

    engine.step().unwrap();
    assert_eq!(*engine.store().get_vertex(2).unwrap(), 2.5);
    assert_eq!(*engine.store().get_vertex(1).unwrap(), 7.0);
    assert_eq!(engine.context().program().applies.load(Ordering::Relaxed), 1);
}

#[test]
fn activation_walks_down_a_chain() {
    let mut engine = engine(
        Probe::activating(),
        store(&[(1, 0.0), (2, 0.0), (3, 0.0)], &[(1, 2, 1.0), (2, 3, 1.0)]),
        EngineConfig::default(),
    )
    .with_initial_active(InitialActive::Vertices(vec![1]))
    .unwrap();

    engine.step().unwrap();
    assert_eq!(engine.active(), vec![2]);
    engine.step().unwrap();
    assert_eq!(engine.active(), vec![3]);
    engine.step().unwrap();
    assert_eq!(engine.active(), Vec::<u64>::new());

    let summary = engine.run().unwrap();
    assert_eq!(summary.iterations, 0);
    assert!(summary.is_converged());
}

#[test]
fn cycle_stops_exactly_at_iteration_bound() {
    let config = EngineConfigBuilder::new().with_max_iterations(5).build();
    let mut engine = engine(
        Probe::activating(),
        store(
            &[(1, 0.0), (2, 0.0), (3, 0.0)],
            &[(1, 2, 1.0), (2, 3, 1.0), (3, 1, 1.0)],
        ),
        config,
    );

    let summary = engine.run().unwrap();
    assert_eq!(summary.iterations, 5);
    assert_eq!(summary.status, RunStatus::NotConverged { active: 3 });
    assert_eq!(summary.stats.len(), 5);
    assert_eq!(engine.superstep(), 5);
    assert_eq!(engine.context().program().applies.load(Ordering::Relaxed), 15);

    match summary.into_result() {
        Err(GasError::NotConverged { iterations, active }) => {
            assert_eq!(iterations, 5);
            assert_eq!(active, 3);
        }
        other => panic!("expected NotConverged, got {other:?}"),
    }
}

#[test]
fn failed_superstep_leaves_everything_untouched() {
    let program = Probe {
        activate: true,
        fail_scatter_on: Some(4.0),
        ..Default::default()
    };
    let mut engine = engine(
        program,
        store(&[(1, 4.0), (2, 0.0), (3, 0.0)], &[(1, 2, 4.0), (2, 3, 1.0)]),
        EngineConfig::default(),
    )
    .with_initial_active(InitialActive::Vertices(vec![2, 3]))
    .unwrap();

    // vertex 2 gathers 4.0, then fails scattering its staged payload
    let err = engine.step().unwrap_err();
    assert!(matches!(
        err,
        GasError::Callback {
            kind: CallbackKind::Scatter,
            vertex: 2,
            ..
        }
    ));
    assert_eq!(engine.superstep(), 0);
    assert_eq!(engine.active(), vec![2, 3]);
    assert_eq!(
        engine.store().vertices().collect::<Vec<_>>(),
        vec![(1, &4.0), (2, &0.0), (3, &0.0)]
    );
}

#[test]
fn disabled_aggregator_skips_gather() {
    let config = EngineConfigBuilder::new().with_aggregator(false).build();
    let mut engine = engine(
        Probe::default(),
        store(&[(1, 1.0), (2, 2.0)], &[(1, 2, 9.0)]),
        config,
    );

    let stats = engine.step().unwrap();
    let program = engine.context().program();
    assert_eq!(program.gathers.load(Ordering::Relaxed), 0);
    assert_eq!(stats.gather_calls, 0);
    assert_eq!(*program.seen_accs.lock(), vec![None, None]);
    assert_eq!(*engine.store().get_vertex(2).unwrap(), 2.0);
}

#[test]
fn stop_is_honoured_between_supersteps() {
    let stop = StopHandle::default();
    let program = Probe {
        activate: true,
        stop_after_apply: Some(stop.clone()),
        ..Default::default()
    };
    let mut engine = engine(
        program,
        store(&[(1, 0.0), (2, 0.0)], &[(1, 2, 1.0), (2, 1, 1.0)]),
        EngineConfig::default(),
    )
    .with_stop_handle(stop.clone());

    let summary = engine.run().unwrap();
    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.status, RunStatus::Stopped { active: 2 });
    // the superstep in flight ran to completion
    assert_eq!(engine.context().program().applies.load(Ordering::Relaxed), 2);
    assert!(stop.is_stopped());
}

#[test]
fn transform_on_load_and_save_on_finish() {
    let config = EngineConfigBuilder::new()
        .with_transform_on_load(true)
        .with_save_on_finish(true)
        .build();
    let engine_store = store(&[(1, 1.5), (2, 4.0)], &[]);
    let mut engine = engine(Probe::default(), engine_store, config);
    assert_eq!(*engine.store().get_vertex(1).unwrap(), 3.0);
    assert_eq!(*engine.store().get_vertex(2).unwrap(), 8.0);

    let summary = engine.run().unwrap();
    assert!(summary.is_converged());
    let mut saved = engine.context().program().saved.lock().clone();
    saved.sort_by_key(|(id, _)| *id);
    assert_eq!(saved, vec![(1, -1.0), (2, -1.0)]);
}

// rewrites each edge with the degree signature of whichever vertex scatters it
struct DegreeStamp;

impl VertexProgram for DegreeStamp {
    type VertexData = ();
    type EdgeData = usize;
    type Accum = ();

    fn new_vertex(&self) -> Self::VertexData {}

    fn new_edge(&self) -> usize {
        0
    }

    fn new_accum(&self) -> Self::Accum {}

    fn gather(&self, _: &(), _: &(), _: &usize, _: usize, _: usize) -> Result<(), CallbackError> {
        Ok(())
    }

    fn merge(&self, _: (), _: ()) -> Result<(), CallbackError> {
        Ok(())
    }

    fn apply(&self, _: &(), _: Option<()>, _: usize, _: usize) -> Result<(), CallbackError> {
        Ok(())
    }

    fn scatter(
        &self,
        _: &(),
        _: &(),
        _: &usize,
        num_in: usize,
        num_out: usize,
    ) -> Result<ScatterOutcome<usize>, CallbackError> {
        Ok(ScatterOutcome::rewrite(num_in * 10 + num_out, false))
    }
}

#[test]
fn edge_scattered_from_both_ends_keeps_highest_vertex_write() {
    for threads in [1, 2, 8] {
        let config = EngineConfigBuilder::new()
            .with_scatter_edges(Direction::BOTH)
            .with_num_threads(threads)
            .build();
        let store = build_store(&DegreeStamp, vec![(1, 2, 0), (3, 2, 0)]).unwrap();
        let mut engine = Engine::new(ProgramContext::with_defaults(DegreeStamp, config), store).unwrap();
        engine.step().unwrap();
        // writes commit in vertex order 1, 2, 3 so each edge keeps the later stamp
        assert_eq!(*engine.store().get_edge(1, 2).unwrap(), 20);
        assert_eq!(*engine.store().get_edge(3, 2).unwrap(), 1);
    }
}

#[test]
fn unknown_initial_vertex_is_not_found() {
    let res = engine(Probe::default(), store(&[(1, 0.0)], &[]), EngineConfig::default())
        .with_initial_active(InitialActive::Vertices(vec![1, 42]));
    assert!(matches!(res, Err(GasError::VertexNotFound(42))));
}
