//! Error type shared by the record model, the list codec and the file io.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XtalError {
    #[error("expected {expected}-item tuple in call to __setstate__; got {got} items")]
    StateArity { expected: usize, got: usize },

    /// `expected` is `None` when the shape's element count overflows `usize`.
    #[error("shoebox shape {shape:?} cannot hold {got} values")]
    InvalidShape {
        shape: [usize; 3],
        expected: Option<usize>,
        got: usize,
    },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unsupported reflection list format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode reflections: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode reflections: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, XtalError>;

impl XtalError {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        XtalError::Io { path: path.to_string(), source }
    }
}
