//! Building a record store from raw edge records.
//!
//! Endpoints are created with the program's `new_vertex()` the first time they are seen.
//! Repeated edges keep the first payload and are reported with a warning.

use tracing::warn;

use crate::{
    core::store::RecordStore,
    db::{program::VertexProgram, task::engine::StoreOf},
    errors::GasError,
};

pub mod edge_list_loader;

pub use edge_list_loader::EdgeListLoader;

/// Insert edges in iteration order, returning how many duplicates were skipped.
pub fn insert_edges<P: VertexProgram>(
    program: &P,
    store: &mut StoreOf<P>,
    edges: impl IntoIterator<Item = (u64, u64, P::EdgeData)>,
) -> Result<usize, GasError> {
    let mut skipped = 0;
    for (src, dst, data) in edges {
        store.ensure_vertex(src, || program.new_vertex());
        store.ensure_vertex(dst, || program.new_vertex());
        match store.add_edge(src, dst, data) {
            Ok(_) => {}
            Err(GasError::EdgeExists { src, dst }) => {
                warn!("Skipping duplicate edge {src} -> {dst}");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(skipped)
}

/// A fresh store holding `edges`.
pub fn build_store<P: VertexProgram>(
    program: &P,
    edges: impl IntoIterator<Item = (u64, u64, P::EdgeData)>,
) -> Result<StoreOf<P>, GasError> {
    let mut store = RecordStore::new();
    insert_edges(program, &mut store, edges)?;
    Ok(store)
}
