//! The engine driver: repeats supersteps until the active set is empty, an iteration bound is
//! hit, or a stop is requested between supersteps.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::{prelude::*, ThreadPool};
use tracing::{info, warn};

use crate::{
    core::{active_set::ActiveSet, store::RecordStore},
    db::{
        program::{ProgramContext, VertexProgram},
        task::{
            checkpoint::{Checkpoint, Checkpointer, FileCheckpointer, MemoryCheckpointer},
            pool_for,
            superstep::{Superstep, SuperstepStats},
        },
    },
    errors::{CallbackKind, GasError},
};

pub type StoreOf<P> =
    RecordStore<<P as VertexProgram>::VertexData, <P as VertexProgram>::EdgeData>;

/// The vertices active in the first superstep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InitialActive {
    #[default]
    All,
    Vertices(Vec<u64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The active set ran empty.
    Converged,
    /// `max_iterations` was reached with `active` vertices still scheduled.
    NotConverged { active: u64 },
    /// A stop was requested through a [StopHandle].
    Stopped { active: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Supersteps executed by this run.
    pub iterations: usize,
    pub status: RunStatus,
    pub stats: Vec<SuperstepStats>,
}

impl RunSummary {
    pub fn is_converged(&self) -> bool {
        self.status == RunStatus::Converged
    }

    /// Treat hitting the iteration bound as an error.
    pub fn into_result(self) -> Result<Self, GasError> {
        match self.status {
            RunStatus::NotConverged { active } => Err(GasError::NotConverged {
                iterations: self.iterations,
                active,
            }),
            _ => Ok(self),
        }
    }
}

/// Asks a running engine to stop before its next superstep.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed)
    }
}

pub struct Engine<P: VertexProgram> {
    ctx: ProgramContext<P>,
    store: StoreOf<P>,
    active: ActiveSet,
    superstep: usize,
    pool: Arc<ThreadPool>,
    stop: StopHandle,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl<P: VertexProgram> Engine<P> {
    /// Bind a program to a loaded store. Every vertex starts active.
    ///
    /// Runs the transform pass straight away when `transform_on_load` is set.
    pub fn new(ctx: ProgramContext<P>, store: StoreOf<P>) -> Result<Self, GasError> {
        let active = ActiveSet::all(store.num_vertices());
        let mut engine = Self::build(ctx, store, active, 0)?;
        if engine.ctx.config().transform_on_load {
            engine.transform_graph()?;
        }
        Ok(engine)
    }

    /// Resume from a checkpoint. The transform pass is not repeated.
    pub fn restore(ctx: ProgramContext<P>, checkpoint: &Checkpoint) -> Result<Self, GasError> {
        let codecs = ctx.codecs();
        let store = RecordStore::from_snapshot(
            &checkpoint.graph,
            codecs.vertex.as_ref(),
            codecs.edge.as_ref(),
        )?;
        let active = checkpoint
            .active
            .iter()
            .map(|gid| {
                store.resolve_vertex(*gid).ok_or_else(|| {
                    GasError::InvalidCheckpoint(format!("active vertex {gid} is not in the graph"))
                })
            })
            .collect::<Result<ActiveSet, _>>()?;
        info!(
            "Restored checkpoint at superstep {} with {} vertices, {} active",
            checkpoint.superstep,
            store.num_vertices(),
            active.len()
        );
        Self::build(ctx, store, active, checkpoint.superstep)
    }

    fn build(
        ctx: ProgramContext<P>,
        store: StoreOf<P>,
        active: ActiveSet,
        superstep: usize,
    ) -> Result<Self, GasError> {
        let config = ctx.config();
        let pool = pool_for(config.num_threads)?;
        let checkpointer: Option<Arc<dyn Checkpointer>> = if config.checkpoint.enabled {
            match &config.checkpoint.dir {
                Some(dir) => Some(Arc::new(FileCheckpointer::new(dir)?)),
                None => Some(Arc::new(MemoryCheckpointer::new())),
            }
        } else {
            None
        };
        info!(
            "Engine ready: {} vertices, {} edges, {} threads",
            store.num_vertices(),
            store.num_edges(),
            pool.current_num_threads()
        );
        Ok(Self {
            ctx,
            store,
            active,
            superstep,
            pool,
            stop: StopHandle::default(),
            checkpointer,
        })
    }

    pub fn with_initial_active(mut self, initial: InitialActive) -> Result<Self, GasError> {
        self.active = match initial {
            InitialActive::All => ActiveSet::all(self.store.num_vertices()),
            InitialActive::Vertices(ids) => ids
                .iter()
                .map(|gid| {
                    self.store
                        .resolve_vertex(*gid)
                        .ok_or(GasError::VertexNotFound(*gid))
                })
                .collect::<Result<_, _>>()?,
        };
        Ok(self)
    }

    /// Checkpoint through `checkpointer` every `checkpoint.interval` supersteps.
    pub fn with_checkpointer(mut self, checkpointer: impl Checkpointer + 'static) -> Self {
        self.checkpointer = Some(Arc::new(checkpointer));
        self
    }

    /// Share an existing stop flag, e.g. one already handed to the program.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn context(&self) -> &ProgramContext<P> {
        &self.ctx
    }

    pub fn store(&self) -> &StoreOf<P> {
        &self.store
    }

    pub fn into_store(self) -> StoreOf<P> {
        self.store
    }

    /// Supersteps completed so far, including those before a restore.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// Logical ids of the vertices scheduled for the next superstep, ascending.
    pub fn active(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.active.iter().map(|vid| self.store.gid(vid)).collect();
        ids.sort_unstable();
        ids
    }

    /// Run a single superstep over the current active set.
    ///
    /// On error the store, the active set and the superstep counter are left as they were before
    /// the call. When a checkpoint is due the superstep only takes effect once it is saved.
    pub fn step(&mut self) -> Result<SuperstepStats, GasError> {
        let completed = self.superstep + 1;
        let interval = self.ctx.config().checkpoint.interval;
        let due = self
            .checkpointer
            .clone()
            .filter(|_| interval > 0 && completed % interval == 0);

        let mut superstep = Superstep::new(&self.ctx, &self.pool, self.superstep);
        let stats = match due {
            None => {
                let (next, stats) = superstep.run(&mut self.store, &self.active)?;
                self.active = next;
                stats
            }
            Some(checkpointer) => {
                let mut store = self.store.clone();
                let (next, stats) = superstep.run(&mut store, &self.active)?;
                checkpointer.save(&checkpoint_of(&self.ctx, &store, &next, completed)?)?;
                self.store = store;
                self.active = next;
                stats
            }
        };
        self.superstep = completed;
        Ok(stats)
    }

    /// Step until the active set is empty, `max_iterations` supersteps have run in total, or a
    /// stop is requested.
    pub fn run(&mut self) -> Result<RunSummary, GasError> {
        let max_iterations = self.ctx.config().max_iterations.unwrap_or(usize::MAX);
        let mut stats = Vec::new();
        let status = loop {
            if self.active.is_empty() {
                break RunStatus::Converged;
            }
            if self.stop.is_stopped() {
                break RunStatus::Stopped {
                    active: self.active.len(),
                };
            }
            if self.superstep >= max_iterations {
                break RunStatus::NotConverged {
                    active: self.active.len(),
                };
            }
            stats.push(self.step()?);
        };

        match status {
            RunStatus::Converged => info!("Converged after {} supersteps", self.superstep),
            RunStatus::NotConverged { active } => warn!(
                "Stopped at the iteration bound of {max_iterations} with {active} vertices still active"
            ),
            RunStatus::Stopped { active } => info!(
                "Stop requested after {} supersteps with {active} vertices still active",
                self.superstep
            ),
        }

        if self.ctx.config().save_on_finish {
            self.save_graph()?;
        }

        Ok(RunSummary {
            iterations: stats.len(),
            status,
            stats,
        })
    }

    /// Encode the current state.
    pub fn checkpoint(&self) -> Result<Checkpoint, GasError> {
        checkpoint_of(&self.ctx, &self.store, &self.active, self.superstep)
    }

    /// Run `transform_vertex` and `transform_edge` over every entity. All or nothing.
    pub fn transform_graph(&mut self) -> Result<(), GasError> {
        let program = self.ctx.program();
        let store = &mut self.store;
        self.pool.install(|| {
            store.try_map_payloads(
                |gid, v| {
                    program
                        .transform_vertex(v)
                        .map_err(|err| GasError::callback(CallbackKind::TransformVertex, gid, err))
                },
                |src, _, e| {
                    program
                        .transform_edge(e)
                        .map_err(|err| GasError::callback(CallbackKind::TransformEdge, src, err))
                },
            )
        })?;
        info!("Transformed {} vertices and {} edges", store.num_vertices(), store.num_edges());
        Ok(())
    }

    /// Hand every vertex and edge to `save_vertex` / `save_edge`.
    pub fn save_graph(&self) -> Result<(), GasError> {
        let program = self.ctx.program();
        let store = &self.store;
        self.pool.install(|| {
            store.par_vertices().try_for_each(|(gid, v)| {
                program
                    .save_vertex(gid, v)
                    .map_err(|err| GasError::callback(CallbackKind::SaveVertex, gid, err))
            })?;
            store.par_edges().try_for_each(|(src, dst, e)| {
                program
                    .save_edge(src, dst, e)
                    .map_err(|err| GasError::callback(CallbackKind::SaveEdge, src, err))
            })
        })?;
        info!("Saved {} vertices and {} edges", store.num_vertices(), store.num_edges());
        Ok(())
    }
}

fn checkpoint_of<P: VertexProgram>(
    ctx: &ProgramContext<P>,
    store: &StoreOf<P>,
    active: &ActiveSet,
    superstep: usize,
) -> Result<Checkpoint, GasError> {
    let codecs = ctx.codecs();
    let graph = store.snapshot(codecs.vertex.as_ref(), codecs.edge.as_ref())?;
    let mut active: Vec<u64> = active.iter().map(|vid| store.gid(vid)).collect();
    active.sort_unstable();
    Ok(Checkpoint {
        superstep,
        active,
        graph,
    })
}
