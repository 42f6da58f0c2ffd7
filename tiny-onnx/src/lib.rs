//! Builds a minimal ONNX model (`output = input * scale`), validates it, stores it as
//! a protobuf file and evaluates it through tract.

pub mod inference;
pub mod model;

pub use inference::Evaluator;
pub use model::{builder, check_model, io, ModelError, MulModelSpec};
pub use tract_onnx::pb;
