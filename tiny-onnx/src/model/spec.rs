use std::path::Path;

use serde::{Deserialize, Serialize};
use tract_onnx::pb::{tensor_proto::DataType, ModelProto};
use tracing::debug;

use super::{
    builder::{make_graph, make_model, make_node, make_tensor, make_tensor_value_info, Dim},
    check_model, ModelError,
};

/// Literals describing the single-multiply model: `output = input * scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MulModelSpec {
    pub graph_name: String,
    pub input_name: String,
    pub output_name: String,
    /// Name of the constant initializer holding the multiplier.
    pub scale_name: String,
    pub scale: f32,
    pub producer_name: String,
}

impl Default for MulModelSpec {
    fn default() -> Self {
        Self {
            graph_name: "simple-mul-model".to_string(),
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            scale_name: "scale".to_string(),
            scale: 2.0,
            producer_name: "tiny-onnx-gen".to_string(),
        }
    }
}

impl MulModelSpec {
    /// Reads a JSON spec. Missing fields keep their default value.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ModelError::io(path))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builds the model and checks the resulting graph.
    pub fn build(&self) -> Result<ModelProto, ModelError> {
        let input = make_tensor_value_info(&self.input_name, DataType::Float, &[Dim::Unknown]);
        let output = make_tensor_value_info(&self.output_name, DataType::Float, &[Dim::Unknown]);
        let scale = make_tensor(&self.scale_name, DataType::Float, &[1], &[self.scale])?;
        let node = make_node(
            "Mul",
            &[self.input_name.as_str(), self.scale_name.as_str()],
            &[self.output_name.as_str()],
        );
        let graph = make_graph(
            vec![node],
            &self.graph_name,
            vec![input],
            vec![output],
            vec![scale],
        );
        let model = make_model(graph, &self.producer_name);
        check_model(&model)?;
        debug!(
            "built '{}': {} = {} * {}",
            self.graph_name, self.output_name, self.input_name, self.scale
        );
        Ok(model)
    }
}
