use super::{Recorder, RecorderError, bin_config};
use serde::{Serialize, de::DeserializeOwned};

/// Recorder trait specialized to save and load data to and from bytes.
///
/// # Notes
///
/// This is useful to move state between processes without touching the file
/// system.
pub trait BytesRecorder:
    Recorder<RecordArgs = (), RecordOutput = Vec<u8>, LoadArgs = Vec<u8>>
{
}

/// In memory recorder using the [bincode format](bincode).
#[derive(Debug, Default, Clone)]
pub struct BinBytesRecorder;

impl BytesRecorder for BinBytesRecorder {}

impl Recorder for BinBytesRecorder {
    type RecordArgs = ();
    type RecordOutput = Vec<u8>;
    type LoadArgs = Vec<u8>;

    fn save_item<I: Serialize>(
        &self,
        item: I,
        _args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, RecorderError> {
        bincode::serde::encode_to_vec(item, bin_config())
            .map_err(|err| RecorderError::Unknown(err.to_string()))
    }

    fn load_item<I: DeserializeOwned>(&self, args: &mut Self::LoadArgs) -> Result<I, RecorderError> {
        let (state, _) = bincode::serde::decode_from_slice(args, bin_config())
            .map_err(|err| RecorderError::DeserializeError(err.to_string()))?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalogLinear, ModulePersist, Sequential};
    use analog_config::SingleRpuConfig;
    use ndarray::Array2;

    #[test]
    fn test_can_save_and_load_bin_format() {
        test_can_save_and_load(BinBytesRecorder)
    }

    fn test_can_save_and_load<R: BytesRecorder>(recorder: R) {
        let model1 = create_model(1.0);
        let mut model2 = create_model(2.0);
        let bytes1 = recorder.record(&model1.capture_tree().unwrap(), ()).unwrap();
        let bytes2 = recorder.record(&model2.capture_tree().unwrap(), ()).unwrap();

        let state = recorder.load(bytes1.clone()).unwrap();
        model2.restore_tree(&state, &Default::default()).unwrap();
        let bytes2_after = recorder.record(&model2.capture_tree().unwrap(), ()).unwrap();

        assert_ne!(bytes1, bytes2);
        assert_eq!(bytes1, bytes2_after);
    }

    fn create_model(value: f32) -> Sequential<AnalogLinear> {
        let mut layer = AnalogLinear::new(4, 3, SingleRpuConfig::default().into(), true);
        layer
            .tile_mut()
            .set_weights(Array2::from_elem((3, 4), value), Some(ndarray::Array1::zeros(3)))
            .unwrap();

        Sequential::new(vec![layer])
    }
}
