use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The output tensor shape matches neither supported layout.
    #[error("unsupported tensor layout {shape:?}: no axis of size {expected} next to the anchor axis")]
    UnsupportedLayout { shape: Vec<usize>, expected: usize },

    #[error("frame source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("inference error: {0}")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
}
