//! Helpers assembling the ONNX protobuf records that make up a model.
//!
//! Every helper returns a plain [`tract_onnx::pb`] message; nothing is validated here
//! except the payload size of constant tensors. Whole-graph invariants are enforced by
//! [`super::check::check_model`].

use tract_onnx::pb::{
    tensor_proto::DataType,
    tensor_shape_proto::{self, dimension},
    type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto, Version,
};

use super::ModelError;

/// Opset imported from the default (`ai.onnx`) domain.
pub const DEFAULT_OPSET_VERSION: i64 = 13;

/// One dimension of a value descriptor's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    /// Known size.
    Fixed(i64),
    /// Symbolic size shared by name across the graph.
    Param(String),
    /// Size left unspecified.
    Unknown,
}

impl From<Dim> for tensor_shape_proto::Dimension {
    fn from(dim: Dim) -> Self {
        let value = match dim {
            Dim::Fixed(v) => Some(dimension::Value::DimValue(v)),
            Dim::Param(p) => Some(dimension::Value::DimParam(p)),
            Dim::Unknown => None,
        };
        tensor_shape_proto::Dimension {
            value,
            ..Default::default()
        }
    }
}

/// Builds a tensor value descriptor with the given element type and shape.
pub fn make_tensor_value_info(name: &str, elem_type: DataType, dims: &[Dim]) -> ValueInfoProto {
    let shape = TensorShapeProto {
        dim: dims.iter().cloned().map(Into::into).collect(),
    };
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: elem_type as i32,
                shape: Some(shape),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds a constant FLOAT tensor. The values are stored in `float_data`, row-major.
pub fn make_tensor(
    name: &str,
    data_type: DataType,
    dims: &[i64],
    vals: &[f32],
) -> Result<TensorProto, ModelError> {
    let expected = element_count(name, dims)?;
    if expected != vals.len() {
        return Err(ModelError::PayloadMismatch {
            name: name.to_string(),
            expected,
            actual: vals.len(),
        });
    }
    Ok(TensorProto {
        name: name.to_string(),
        data_type: data_type as i32,
        dims: dims.to_vec(),
        float_data: vals.to_vec(),
        ..Default::default()
    })
}

/// Builds a node of the default domain.
pub fn make_node(op_type: &str, inputs: &[&str], outputs: &[&str]) -> NodeProto {
    NodeProto {
        op_type: op_type.to_string(),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

pub fn make_graph(
    nodes: Vec<NodeProto>,
    name: &str,
    inputs: Vec<ValueInfoProto>,
    outputs: Vec<ValueInfoProto>,
    initializers: Vec<TensorProto>,
) -> GraphProto {
    GraphProto {
        node: nodes,
        name: name.to_string(),
        input: inputs,
        output: outputs,
        initializer: initializers,
        ..Default::default()
    }
}

/// Wraps `graph` in a model container. The IR version is the newest one known to the
/// protobuf bindings and the default domain is imported at [`DEFAULT_OPSET_VERSION`].
pub fn make_model(graph: GraphProto, producer_name: &str) -> ModelProto {
    ModelProto {
        ir_version: Version::IrVersion as i64,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: DEFAULT_OPSET_VERSION,
        }],
        producer_name: producer_name.to_string(),
        producer_version: env!("CARGO_PKG_VERSION").to_string(),
        graph: Some(graph),
        ..Default::default()
    }
}

/// Number of elements described by `dims`. A scalar (no dims) holds one element.
pub(crate) fn element_count(name: &str, dims: &[i64]) -> Result<usize, ModelError> {
    dims.iter().try_fold(1usize, |acc, &d| {
        if d < 0 {
            return Err(ModelError::NegativeDim {
                name: name.to_string(),
                dim: d,
            });
        }
        usize::try_from(d)
            .ok()
            .and_then(|d| acc.checked_mul(d))
            .ok_or_else(|| ModelError::DimOverflow {
                name: name.to_string(),
            })
    })
}
