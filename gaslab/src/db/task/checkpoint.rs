use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{errors::GasError, serialise::GraphSnapshot};

const CHECKPOINT_PREFIX: &str = "checkpoint-";
const CHECKPOINT_EXT: &str = "bin";

/// Everything needed to resume a run after `superstep` supersteps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub superstep: usize,
    /// Logical ids of the vertices active in the next superstep.
    pub active: Vec<u64>,
    pub graph: GraphSnapshot,
}

impl Checkpoint {
    pub fn to_bytes(&self) -> Result<Vec<u8>, GasError> {
        bincode::serialize(self)
            .map_err(|err| GasError::encode(format!("checkpoint {}", self.superstep), err.into()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GasError> {
        bincode::deserialize(bytes).map_err(|err| GasError::decode("checkpoint", err.into()))
    }
}

pub trait Checkpointer: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), GasError>;

    /// The checkpoint with the highest superstep, if any was taken.
    fn latest(&self) -> Result<Option<Checkpoint>, GasError>;
}

/// Keeps checkpoints in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointer {
    checkpoints: Arc<Mutex<Vec<Checkpoint>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.lock().is_empty()
    }

    pub fn supersteps(&self) -> Vec<usize> {
        self.checkpoints.lock().iter().map(|c| c.superstep).collect()
    }
}

impl Checkpointer for MemoryCheckpointer {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), GasError> {
        self.checkpoints.lock().push(checkpoint.clone());
        Ok(())
    }

    fn latest(&self) -> Result<Option<Checkpoint>, GasError> {
        Ok(self
            .checkpoints
            .lock()
            .iter()
            .max_by_key(|c| c.superstep)
            .cloned())
    }
}

/// Writes each checkpoint to `<dir>/checkpoint-<superstep>.bin`.
#[derive(Debug, Clone)]
pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, GasError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, superstep: usize) -> PathBuf {
        self.dir
            .join(format!("{CHECKPOINT_PREFIX}{superstep}.{CHECKPOINT_EXT}"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Checkpoint, GasError> {
        let bytes = fs::read(path)?;
        Checkpoint::from_bytes(&bytes)
    }

    fn superstep_of(path: &Path) -> Option<usize> {
        if path.extension()? != CHECKPOINT_EXT {
            return None;
        }
        path.file_stem()?
            .to_str()?
            .strip_prefix(CHECKPOINT_PREFIX)?
            .parse()
            .ok()
    }
}

impl Checkpointer for FileCheckpointer {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), GasError> {
        let path = self.path_for(checkpoint.superstep);
        let bytes = checkpoint.to_bytes()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        info!("Wrote checkpoint {}", path.display());
        Ok(())
    }

    fn latest(&self) -> Result<Option<Checkpoint>, GasError> {
        let mut latest: Option<(usize, PathBuf)> = None;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Some(superstep) = Self::superstep_of(&path) {
                if latest.as_ref().map_or(true, |(s, _)| superstep > *s) {
                    latest = Some((superstep, path));
                }
            }
        }
        match latest {
            Some((_, path)) => {
                debug!("Loading checkpoint {}", path.display());
                Ok(Some(Self::load(path)?))
            }
            None => Ok(None),
        }
    }
}
