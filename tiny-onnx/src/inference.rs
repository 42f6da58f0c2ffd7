//! Reference evaluation of a model through tract.

use std::path::Path;

use anyhow::{ensure, Context, Error, Result};
use tracing::debug;
use tract_onnx::{pb::ModelProto, prelude::*};

use crate::model::{io, ModelError};

/// A loaded model, ready to be evaluated on 1-D `f32` inputs of any length.
#[derive(Debug, Clone)]
pub struct Evaluator {
    model: InferenceModel,
}

impl Evaluator {
    pub fn from_proto(proto: &ModelProto) -> Result<Self> {
        Self::from_bytes(&io::encode(proto))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut &*bytes)
            .map_err(|e| Error::msg(format!("Failed to load model: {:?}", e)))?;
        Ok(Self { model })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| Error::msg(format!("Failed to load model: {:?}", e)))
            .with_context(|| format!("loading {}", path.display()))?;
        Ok(Self { model })
    }

    /// Runs the model on `input` and returns its first output, flattened.
    ///
    /// The input length is fixed into the model before optimization, so each call
    /// compiles its own plan.
    pub fn run(&self, input: &[f32]) -> Result<Vec<f32>> {
        ensure!(!input.is_empty(), ModelError::EmptyInput);

        let plan = self
            .model
            .clone()
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec![input.len()]),
            )
            .context("setting input shape")?
            .into_optimized()
            .context("optimizing model")?
            .into_runnable()
            .context("building execution plan")?;

        let tensor: Tensor = tract_ndarray::Array1::from(input.to_vec()).into_tensor();
        let outputs = plan.run(tvec![tensor.into_tvalue()])?;
        let output = outputs.first().context("model produced no output")?;
        let values: Vec<f32> = output.to_array_view::<f32>()?.iter().copied().collect();
        debug!("evaluated {} values -> {:?}", input.len(), values);
        Ok(values)
    }
}
