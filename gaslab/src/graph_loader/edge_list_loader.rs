//! Loads edge lists from a file or a directory tree.
//!
//! Each line is handed to the program's `parse_edge`. Files are read and parsed in parallel and
//! then inserted in path order, so the resulting physical ids do not depend on thread timing.
//! Files ending in `.gz` are decompressed on the fly.
//!
//! # Example
//! ```no_run
//! use gaslab::algorithms::pagerank::PageRank;
//! use gaslab::graph_loader::EdgeListLoader;
//! use regex::Regex;
//!
//! let program = PageRank::default();
//! let store = EdgeListLoader::new("data/")
//!     .with_filter(Regex::new(r".+\.edges(\.gz)?$").unwrap())
//!     .load(&program)
//!     .expect("edge list did not parse");
//! println!("{} vertices", store.num_vertices());
//! ```

use std::{
    collections::VecDeque,
    fs::{self, File},
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info};

use crate::{
    core::store::RecordStore,
    db::{program::VertexProgram, task::engine::StoreOf},
    errors::GasError,
    graph_loader::insert_edges,
};

#[derive(Debug)]
pub struct EdgeListLoader {
    /// A single file or a directory searched recursively.
    path: PathBuf,
    /// Only files whose path matches are loaded.
    regex_filter: Option<Regex>,
    /// Skip the first line of every file.
    header: bool,
}

impl EdgeListLoader {
    pub fn new<P: Into<PathBuf>>(p: P) -> Self {
        Self {
            path: p.into(),
            regex_filter: None,
            header: false,
        }
    }

    pub fn set_header(mut self, h: bool) -> Self {
        self.header = h;
        self
    }

    pub fn with_filter(mut self, r: Regex) -> Self {
        self.regex_filter = Some(r);
        self
    }

    fn accept_file(&self, p: PathBuf, paths: &mut Vec<PathBuf>) {
        match &self.regex_filter {
            Some(pattern) => {
                if p.to_str().is_some_and(|name| pattern.is_match(name)) {
                    paths.push(p);
                }
            }
            None => paths.push(p),
        }
    }

    /// Every file to load, sorted by path.
    pub fn files_vec(&self) -> Result<Vec<PathBuf>, GasError> {
        let mut paths = vec![];
        let mut queue = VecDeque::from([self.path.clone()]);

        while let Some(path) = queue.pop_back() {
            if fs::metadata(&path)?.is_dir() {
                for entry in fs::read_dir(&path)? {
                    let p = entry?.path();
                    if fs::metadata(&p)?.is_dir() {
                        queue.push_back(p);
                    } else {
                        self.accept_file(p, &mut paths);
                    }
                }
            } else {
                self.accept_file(path, &mut paths);
            }
        }

        paths.sort();
        Ok(paths)
    }

    fn reader(path: &Path) -> Result<Box<dyn BufRead>, GasError> {
        let file = File::open(path)?;
        let is_gz = path.extension().is_some_and(|ext| ext == "gz");
        let inner: Box<dyn Read> = if is_gz {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Box::new(BufReader::new(inner)))
    }

    fn parse_file<P: VertexProgram>(
        &self,
        program: &P,
        path: &Path,
    ) -> Result<Vec<(u64, u64, P::EdgeData)>, GasError> {
        let name = path.display().to_string();
        let mut records = vec![];
        for (i, line) in Self::reader(path)?.lines().enumerate() {
            let line = line?;
            if (self.header && i == 0) || line.trim().is_empty() {
                continue;
            }
            let parsed = program
                .parse_edge(&name, &line)
                .map_err(|source| GasError::Parse {
                    file: name.clone(),
                    line: i + 1,
                    source,
                })?;
            records.extend(parsed);
        }
        debug!("Parsed {} edges from {name}", records.len());
        Ok(records)
    }

    /// Load into a fresh store.
    pub fn load<P: VertexProgram>(&self, program: &P) -> Result<StoreOf<P>, GasError> {
        let mut store = RecordStore::new();
        self.load_into(program, &mut store)?;
        Ok(store)
    }

    /// Load into an existing store. Returns the number of edges added.
    pub fn load_into<P: VertexProgram>(
        &self,
        program: &P,
        store: &mut StoreOf<P>,
    ) -> Result<usize, GasError> {
        let paths = self.files_vec()?;
        let parsed = paths
            .par_iter()
            .map(|path| self.parse_file(program, path))
            .collect::<Result<Vec<_>, _>>()?;

        let before = store.num_edges();
        let mut skipped = 0;
        for records in parsed {
            skipped += insert_edges(program, store, records)?;
        }
        let added = store.num_edges() - before;
        info!(
            "Loaded {added} edges from {} files ({skipped} duplicates skipped), {} vertices",
            paths.len(),
            store.num_vertices()
        );
        Ok(added)
    }
}
