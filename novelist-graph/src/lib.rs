mod config;
mod error;
mod graph;
mod program;

pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::GraphError;
pub use graph::{ExecutableGraph, GraphBuilder, GraphNode, END};
pub use program::{EdgeKind, GraphProgram};

pub use novelist_core::{GraphState, StateSchema, StateUpdate};
