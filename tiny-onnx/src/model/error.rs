//! Module containing the [`ModelError`] type returned while building, checking and
//! storing models.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model container does not carry a graph.
    #[error("model has no graph")]
    MissingGraph,

    /// A value descriptor, initializer or node output was declared without a name.
    #[error("{kind} at position {index} has an empty name")]
    EmptyName { kind: &'static str, index: usize },

    /// A name was bound twice in the graph namespace.
    #[error("name '{0}' is defined more than once in the graph")]
    DuplicateName(String),

    /// A node consumes a name that nothing before it defines.
    #[error(
        "node '{node}' reads '{input}' which is neither a graph input, an initializer nor an earlier node output"
    )]
    DanglingInput { node: String, input: String },

    /// A declared graph output is never produced.
    #[error("graph output '{0}' is never produced")]
    UndefinedOutput(String),

    /// A node was declared without an operation kind.
    #[error("node at position {0} has no operation type")]
    MissingOpType(usize),

    /// A tensor shape holds a dimension below zero.
    #[error("tensor '{name}' has a negative dimension {dim}")]
    NegativeDim { name: String, dim: i64 },

    /// The element count implied by a tensor's dims does not fit in `usize`.
    #[error("tensor '{name}' has dims whose element count overflows")]
    DimOverflow { name: String },

    /// The payload of a constant tensor does not match its declared dims.
    #[error("tensor '{name}' declares {expected} elements but carries {actual}")]
    PayloadMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The raw payload of a constant tensor is not a whole number of elements.
    #[error("tensor '{name}' carries {len} raw bytes, not a multiple of its {width}-byte element")]
    UnalignedRawData {
        name: String,
        len: usize,
        width: usize,
    },

    /// Evaluation was requested on an empty input.
    #[error("input array cannot be empty")]
    EmptyInput,

    /// The bytes are not a valid `ModelProto` encoding.
    #[error("decoding ModelProto: {0}")]
    Decode(#[from] prost_tract_compat::DecodeError),

    /// A model spec file is not valid JSON for [`super::MulModelSpec`].
    #[error("reading model spec: {0}")]
    Spec(#[from] serde_json::Error),

    /// Reading or writing `path` failed.
    #[error("accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ModelError::Io { path, source }
    }
}
