use thiserror::Error;

use novelist_core::NovelistError;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph has no entry node")]
    MissingEntry,
    #[error("missing node: {node}")]
    MissingNode { node: String },
    #[error("invalid edge from '{from}' to '{to}'")]
    InvalidEdge { from: String, to: String },
    #[error("node failed: {node}")]
    NodeFailed {
        node: String,
        #[source]
        source: NovelistError,
    },
    #[error("Max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
}
