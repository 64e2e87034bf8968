use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid boolean operand: {0}")]
    InvalidOperand(String),

    #[error("Vertex index {index} out of range for mesh with {count} vertices")]
    VertexOutOfRange { index: usize, count: usize },

    #[error("Invalid primitive parameters: {0}")]
    InvalidPrimitive(String),
}
