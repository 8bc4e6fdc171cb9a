use crate::serialise::CodecError;
use std::fmt::{self, Display, Formatter};

/// The user callback slot that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    Gather,
    Merge,
    Apply,
    Scatter,
    TransformVertex,
    TransformEdge,
    SaveVertex,
    SaveEdge,
    ParseEdge,
}

impl Display for CallbackKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackKind::Gather => "gather",
            CallbackKind::Merge => "merge",
            CallbackKind::Apply => "apply",
            CallbackKind::Scatter => "scatter",
            CallbackKind::TransformVertex => "transform_vertex",
            CallbackKind::TransformEdge => "transform_edge",
            CallbackKind::SaveVertex => "save_vertex",
            CallbackKind::SaveEdge => "save_edge",
            CallbackKind::ParseEdge => "parse_edge",
        };
        f.write_str(name)
    }
}

/// Error raised from inside a user callback.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GasError {
    #[error("No vertex with ID {0}")]
    VertexNotFound(u64),

    #[error("No edge between {src} and {dst}")]
    EdgeNotFound { src: u64, dst: u64 },

    #[error("Vertex already exists with ID {0}")]
    VertexExists(u64),

    #[error("Edge already exists for vertices {src} {dst}")]
    EdgeExists { src: u64, dst: u64 },

    #[error("Failed to deserialise {what}: {source}")]
    Deserialization {
        what: String,
        #[source]
        source: CodecError,
    },

    #[error("Failed to serialise {what}: {source}")]
    Serialization {
        what: String,
        #[source]
        source: CodecError,
    },

    #[error("{kind} callback failed on vertex {vertex}: {source}")]
    Callback {
        kind: CallbackKind,
        vertex: u64,
        #[source]
        source: CallbackError,
    },

    #[error("Failed to parse line {line} of {file}: {source}")]
    Parse {
        file: String,
        line: usize,
        #[source]
        source: CallbackError,
    },

    #[error("Did not converge after {iterations} supersteps, {active} vertices still active")]
    NotConverged { iterations: usize, active: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    #[error("IO operation failed")]
    IOError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to load configuration")]
    Config {
        #[from]
        source: config::ConfigError,
    },

    #[error("Failed to build thread pool")]
    ThreadPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

impl GasError {
    pub(crate) fn callback(kind: CallbackKind, vertex: u64, source: CallbackError) -> Self {
        GasError::Callback {
            kind,
            vertex,
            source,
        }
    }

    pub(crate) fn decode(what: impl Into<String>, source: CodecError) -> Self {
        GasError::Deserialization {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn encode(what: impl Into<String>, source: CodecError) -> Self {
        GasError::Serialization {
            what: what.into(),
            source,
        }
    }
}
