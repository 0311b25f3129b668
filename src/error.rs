use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading map data or building a scene.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a usable TopoJSON document.
    #[error("malformed topology {path}: {reason}")]
    Topology { path: PathBuf, reason: String },

    #[error("topology has no object named {0:?}")]
    MissingObject(String),

    #[error("arc index {0} is out of range")]
    ArcOutOfRange(i64),

    #[error("geometry of type {kind} is malformed: {reason}")]
    Geometry { kind: String, reason: String },

    /// A link names a node that does not exist.
    #[error("no node with id {0:?}")]
    UnknownNode(String),

    #[error("node id {0:?} is defined more than once")]
    DuplicateNode(String),

    #[error("invalid graph file {path}: {source}")]
    Graph {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, MapError>;
