use std::{num::NonZeroUsize, sync::Arc};

use once_cell::sync::OnceCell;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::errors::GasError;

pub mod aggregator;
pub mod checkpoint;
pub mod engine;
pub mod superstep;

pub const MAX_THREADS_ENV: &str = "GASLAB_MAX_THREADS";

static POOL: OnceCell<Arc<ThreadPool>> = OnceCell::new();

fn max_threads() -> usize {
    let available = || {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    };
    match std::env::var(MAX_THREADS_ENV) {
        Ok(s) => match s.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!("{MAX_THREADS_ENV} must be a positive number, got '{s}'");
                available()
            }
        },
        Err(_) => available(),
    }
}

/// The shared pool, sized from `GASLAB_MAX_THREADS` or the available parallelism.
pub fn default_pool() -> Result<Arc<ThreadPool>, GasError> {
    POOL.get_or_try_init(|| custom_pool(max_threads())).cloned()
}

pub fn custom_pool(n_threads: usize) -> Result<Arc<ThreadPool>, GasError> {
    let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
    Ok(Arc::new(pool))
}

pub(crate) fn pool_for(num_threads: Option<usize>) -> Result<Arc<ThreadPool>, GasError> {
    match num_threads {
        Some(n) => custom_pool(n),
        None => default_pool(),
    }
}
