use thiserror::Error;

use pet_bids::BidsError;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    ToolFailed { program: String, status: String, stderr: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("call payload is missing required argument `{name}`")]
    MissingArg { name: String },
    #[error("malformed curve data in {path} (line {line})")]
    MalformedCurve { path: String, line: usize },
    #[error("{region}: sampled {got} frames but the sidecar declares {expected}")]
    FrameCountMismatch { region: String, expected: usize, got: usize },
    #[error(transparent)]
    Bids(#[from] BidsError),
}
