use serde::{Deserialize, Serialize};

/// The `v1` prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Values fed to the model as a 1-D tensor
    pub input: Vec<f32>,
}

/// The `v1` prediction computed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Vec<f32>,
}
