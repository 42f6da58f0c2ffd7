//! Reading and writing ONNX model files.

use std::{fs::File, path::Path};

use memmap2::Mmap;
use prost_tract_compat::Message;
use tract_onnx::pb::ModelProto;
use tracing::{debug, info};

use super::{check_model, ModelError};

/// Protobuf encoding of `model`. Field order is fixed by the message definition, so
/// equal models always encode to equal bytes.
pub fn encode(model: &ModelProto) -> Vec<u8> {
    model.encode_to_vec()
}

pub fn decode(bytes: &[u8]) -> Result<ModelProto, ModelError> {
    Ok(ModelProto::decode(bytes)?)
}

/// Validates `model` and writes it to `path`, replacing any previous content.
pub fn save(model: &ModelProto, path: impl AsRef<Path>) -> Result<(), ModelError> {
    let path = path.as_ref();
    check_model(model)?;
    let bytes = encode(model);
    std::fs::write(path, &bytes).map_err(ModelError::io(path))?;
    info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Loads and decodes the model stored at `path`. The result is not validated, use
/// [`check_model`] for that.
pub fn load(path: impl AsRef<Path>) -> Result<ModelProto, ModelError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(ModelError::io(path))?;
    // SAFETY: the mapping is only read while decoding, before it goes out of scope.
    let mmap = unsafe { Mmap::map(&file) }.map_err(ModelError::io(path))?;
    debug!("decoding {} bytes from {}", mmap.len(), path.display());
    decode(&mmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MulModelSpec;

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"stale content that is longer than nothing").unwrap();

        let model = MulModelSpec::default().build().unwrap();
        save(&model, &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), encode(&model));
        assert_eq!(load(&path).unwrap(), model);
    }

    #[test]
    fn test_save_rejects_invalid_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        let mut model = MulModelSpec::default().build().unwrap();
        model.graph.as_mut().unwrap().node[0].input[1] = "missing".to_string();

        assert!(matches!(
            save(&model, &path),
            Err(ModelError::DanglingInput { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("model.onnx");
        let model = MulModelSpec::default().build().unwrap();
        assert!(matches!(save(&model, &path), Err(ModelError::Io { .. })));
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        assert!(matches!(load(&path), Err(ModelError::Decode(_))));
    }
}
