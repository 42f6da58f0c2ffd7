//! Construction, validation and storage of ONNX model records.

pub mod builder;
pub mod check;
mod error;
pub mod io;
mod spec;

pub use check::check_model;
pub use error::ModelError;
pub use spec::MulModelSpec;
