//! Structural validation of a [`ModelProto`] before it is persisted or evaluated.

use std::collections::HashSet;

use tract_onnx::pb::{tensor_proto::DataType, GraphProto, ModelProto, TensorProto};
use tracing::debug;

use super::{builder::element_count, ModelError};

/// Checks that the model carries a graph and that the graph is well formed.
pub fn check_model(model: &ModelProto) -> Result<(), ModelError> {
    let graph = model.graph.as_ref().ok_or(ModelError::MissingGraph)?;
    check_graph(graph)
}

/// Validates name resolution over the graph namespace.
///
/// Nodes are visited in their stored order, so a node may only read names defined by
/// graph inputs, initializers or nodes placed before it. That also rules out cycles.
pub fn check_graph(graph: &GraphProto) -> Result<(), ModelError> {
    let mut inputs = HashSet::new();
    for (index, input) in graph.input.iter().enumerate() {
        if input.name.is_empty() {
            return Err(ModelError::EmptyName {
                kind: "graph input",
                index,
            });
        }
        if !inputs.insert(input.name.as_str()) {
            return Err(ModelError::DuplicateName(input.name.clone()));
        }
    }

    let mut initializers = HashSet::new();
    for (index, init) in graph.initializer.iter().enumerate() {
        if init.name.is_empty() {
            return Err(ModelError::EmptyName {
                kind: "initializer",
                index,
            });
        }
        if !initializers.insert(init.name.as_str()) {
            return Err(ModelError::DuplicateName(init.name.clone()));
        }
        check_payload(init)?;
    }

    // an initializer may also be listed as a graph input, giving it a default value
    let mut defined: HashSet<&str> = inputs.union(&initializers).copied().collect();

    for (index, node) in graph.node.iter().enumerate() {
        if node.op_type.is_empty() {
            return Err(ModelError::MissingOpType(index));
        }
        let node_name = if node.name.is_empty() {
            format!("#{index} ({})", node.op_type)
        } else {
            node.name.clone()
        };
        for input in &node.input {
            // empty names stand for omitted optional inputs
            if !input.is_empty() && !defined.contains(input.as_str()) {
                return Err(ModelError::DanglingInput {
                    node: node_name,
                    input: input.clone(),
                });
            }
        }
        for (slot, output) in node.output.iter().enumerate() {
            if output.is_empty() {
                return Err(ModelError::EmptyName {
                    kind: "node output",
                    index: slot,
                });
            }
            if !defined.insert(output.as_str()) {
                return Err(ModelError::DuplicateName(output.clone()));
            }
        }
    }

    for output in &graph.output {
        if !defined.contains(output.name.as_str()) {
            return Err(ModelError::UndefinedOutput(output.name.clone()));
        }
    }

    debug!(
        "graph '{}' checked: {} nodes, {} inputs, {} initializers, {} outputs",
        graph.name,
        graph.node.len(),
        graph.input.len(),
        graph.initializer.len(),
        graph.output.len()
    );
    Ok(())
}

/// Compares the stored element count of a constant tensor against its dims. Tensors
/// whose payload lives in external storage or in a field not listed here are skipped.
fn check_payload(tensor: &TensorProto) -> Result<(), ModelError> {
    let expected = element_count(&tensor.name, &tensor.dims)?;
    let Some(dt) = DataType::from_i32(tensor.data_type) else {
        return Ok(());
    };
    let typed_len = match dt {
        DataType::Float => tensor.float_data.len(),
        DataType::Double => tensor.double_data.len(),
        DataType::Int64 => tensor.int64_data.len(),
        DataType::Uint32 | DataType::Uint64 => tensor.uint64_data.len(),
        DataType::Int32
        | DataType::Int16
        | DataType::Int8
        | DataType::Uint16
        | DataType::Uint8
        | DataType::Bool
        | DataType::Float16 => tensor.int32_data.len(),
        DataType::String => tensor.string_data.len(),
        _ => return Ok(()),
    };
    let actual = if !tensor.raw_data.is_empty() {
        match byte_width(dt) {
            Some(width) if tensor.raw_data.len() % width != 0 => {
                return Err(ModelError::UnalignedRawData {
                    name: tensor.name.clone(),
                    len: tensor.raw_data.len(),
                    width,
                });
            }
            Some(width) => tensor.raw_data.len() / width,
            None => return Ok(()),
        }
    } else if tensor.external_data.is_empty() {
        typed_len
    } else {
        return Ok(());
    };
    if actual != expected {
        return Err(ModelError::PayloadMismatch {
            name: tensor.name.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn byte_width(dt: DataType) -> Option<usize> {
    match dt {
        DataType::Bool | DataType::Int8 | DataType::Uint8 => Some(1),
        DataType::Int16 | DataType::Uint16 | DataType::Float16 => Some(2),
        DataType::Int32 | DataType::Uint32 | DataType::Float => Some(4),
        DataType::Int64 | DataType::Uint64 | DataType::Double => Some(8),
        _ => None,
    }
}
