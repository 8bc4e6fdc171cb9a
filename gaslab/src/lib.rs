//! # gaslab
//!
//! `gaslab` runs vertex programs in the gather-apply-scatter (GAS) style over a directed graph
//! held in memory.
//!
//! A program implements [VertexProgram](db::program::VertexProgram), a fixed set of callback
//! slots (construct, gather, merge, apply, scatter, transform, save and parse). The engine runs
//! barrier-synchronised supersteps over the set of active vertices until the set runs empty or
//! an iteration bound is reached:
//!
//! * **gather** collects one contribution per edge in the configured direction and merges them,
//! * **apply** turns the merged accumulator into the vertex's new payload,
//! * **scatter** may rewrite edge payloads and activate neighbours for the next superstep.
//!
//! Phases run in parallel on a rayon pool. A superstep either commits completely or, when a
//! callback fails, leaves the graph untouched.
//!
//! # Example
//!
//! ```rust
//! use gaslab::prelude::*;
//! use gaslab::algorithms::connected_components::{weakly_connected_components, ConnectedComponents};
//!
//! let store = build_store(&ConnectedComponents, vec![(1, 2, ()), (3, 4, ())]).unwrap();
//! let result = weakly_connected_components(store, EngineConfig::default()).unwrap();
//! assert_eq!(result.get(2), Some(&1));
//! assert_eq!(result.get(4), Some(&3));
//! ```

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod algorithms;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod graph_loader;
pub mod serialise;

pub mod prelude {
    pub use crate::{
        config::{load_config, EngineConfig, EngineConfigBuilder},
        core::{store::RecordStore, Direction},
        db::{
            program::{ProgramContext, ScatterOutcome, VertexProgram},
            task::{
                checkpoint::{Checkpoint, Checkpointer, FileCheckpointer, MemoryCheckpointer},
                engine::{Engine, InitialActive, RunStatus, RunSummary, StopHandle},
                superstep::SuperstepStats,
            },
        },
        errors::{CallbackError, GasError},
        graph_loader::{build_store, insert_edges, EdgeListLoader},
        serialise::{BincodeCodec, Codec, JsonCodec, PayloadCodecs},
    };
}
