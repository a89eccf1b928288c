//! Error type shared by the cells, drivers and configuration loader.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RnnError {
    /// Invalid construction parameters (layer count, dropout rate, sizes).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A tensor handed to a forward pass does not have the shape the driver expects.
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Array shape error: {0}")]
    Array(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RnnError>;

impl RnnError {
    pub(crate) fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        RnnError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
