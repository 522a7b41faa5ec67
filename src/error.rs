use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("map data is corrupt: expected at least {expected} bytes, got {actual}")]
    CorruptData { expected: usize, actual: usize },
    #[error("voxel ({x}, {y}, {z}) is outside the grid")]
    OutOfBounds { x: usize, y: usize, z: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("pixel buffer holds {actual} pixels, frame needs {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("column ({x}, {y}) was edited and has not been re-encoded")]
    StaleColumn { x: usize, y: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownVerb(String),
    #[error("`{verb}` takes {expected} arguments, got {actual}")]
    ArgumentCount {
        verb: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("`{0}` is not a valid number here")]
    InvalidNumber(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
