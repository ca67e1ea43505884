use super::base::recorder_metadata;
use super::{Recorder, RecorderError, StoreRecord, bin_config};
use crate::StateMap;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use serde::{Serialize, de::DeserializeOwned};
use std::io::{BufReader, BufWriter};
use std::{fs::File, path::PathBuf};

/// Recorder trait specialized to save and load data to and from files.
pub trait FileRecorder:
    Recorder<RecordArgs = PathBuf, RecordOutput = (), LoadArgs = PathBuf>
{
    /// File extension of the format, set on every path given to the recorder.
    fn file_extension() -> &'static str;
}

/// Default [file recorder](FileRecorder).
pub type DefaultFileRecorder = NamedMpkGzFileRecorder;

/// File recorder using the [bincode format](bincode).
#[derive(Debug, Default, Clone)]
pub struct BinFileRecorder;

/// File recorder using the [bincode format](bincode) compressed with gzip.
#[derive(Debug, Default, Clone)]
pub struct BinGzFileRecorder;

/// File recorder using pretty json for easy readability.
///
/// Json has no representation for NaN and infinities: recording a state map
/// holding one fails instead of writing a file that can't be loaded back.
#[derive(Debug, Default, Clone)]
pub struct PrettyJsonFileRecorder;

/// File recorder using the [named msgpack](rmp_serde) format compressed with gzip.
#[derive(Debug, Default, Clone)]
pub struct NamedMpkGzFileRecorder;

impl FileRecorder for BinGzFileRecorder {
    fn file_extension() -> &'static str {
        "bin.gz"
    }
}
impl FileRecorder for BinFileRecorder {
    fn file_extension() -> &'static str {
        "bin"
    }
}
impl FileRecorder for PrettyJsonFileRecorder {
    fn file_extension() -> &'static str {
        "json"
    }
}
impl FileRecorder for NamedMpkGzFileRecorder {
    fn file_extension() -> &'static str {
        "mpk.gz"
    }
}

macro_rules! str2reader {
    (
        $file:expr
    ) => {{
        $file.set_extension(<Self as FileRecorder>::file_extension());
        let path = $file.as_path();

        File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => RecorderError::FileNotFound(err.to_string()),
            _ => RecorderError::Unknown(err.to_string()),
        })
    }};
}

macro_rules! str2writer {
    (
        $file:expr
    ) => {{
        $file.set_extension(<Self as FileRecorder>::file_extension());
        let path = $file.as_path();

        if path.exists() {
            log::info!("File exists, replacing");
            std::fs::remove_file(path).map_err(|err| RecorderError::Unknown(err.to_string()))?;
        }

        File::create(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => RecorderError::FileNotFound(err.to_string()),
            _ => RecorderError::Unknown(err.to_string()),
        })
    }};
}

impl Recorder for BinGzFileRecorder {
    type RecordArgs = PathBuf;
    type RecordOutput = ();
    type LoadArgs = PathBuf;

    fn save_item<I: Serialize>(
        &self,
        item: I,
        mut file: Self::RecordArgs,
    ) -> Result<(), RecorderError> {
        let config = bin_config();
        let writer = str2writer!(file)?;
        let mut writer = GzEncoder::new(writer, Compression::default());

        bincode::serde::encode_into_std_write(&item, &mut writer, config)
            .map_err(|err| RecorderError::Unknown(err.to_string()))?;
        writer
            .finish()
            .map_err(|err| RecorderError::Unknown(err.to_string()))?;

        Ok(())
    }

    fn load_item<I: DeserializeOwned>(&self, file: &mut Self::LoadArgs) -> Result<I, RecorderError> {
        let reader = str2reader!(file)?;
        let mut reader = GzDecoder::new(reader);
        let state = bincode::serde::decode_from_std_read(&mut reader, bin_config())
            .map_err(|err| RecorderError::DeserializeError(err.to_string()))?;

        Ok(state)
    }
}

impl Recorder for BinFileRecorder {
    type RecordArgs = PathBuf;
    type RecordOutput = ();
    type LoadArgs = PathBuf;

    fn save_item<I: Serialize>(
        &self,
        item: I,
        mut file: Self::RecordArgs,
    ) -> Result<(), RecorderError> {
        let config = bin_config();
        let mut writer = BufWriter::new(str2writer!(file)?);
        bincode::serde::encode_into_std_write(&item, &mut writer, config)
            .map_err(|err| RecorderError::Unknown(err.to_string()))?;
        Ok(())
    }

    fn load_item<I: DeserializeOwned>(&self, file: &mut Self::LoadArgs) -> Result<I, RecorderError> {
        let mut reader = BufReader::new(str2reader!(file)?);
        let state = bincode::serde::decode_from_std_read(&mut reader, bin_config())
            .map_err(|err| RecorderError::DeserializeError(err.to_string()))?;
        Ok(state)
    }
}

impl Recorder for PrettyJsonFileRecorder {
    type RecordArgs = PathBuf;
    type RecordOutput = ();
    type LoadArgs = PathBuf;

    fn record(&self, state: &StateMap, args: Self::RecordArgs) -> Result<(), RecorderError> {
        if let Some(key) = state.find_non_finite() {
            return Err(RecorderError::Unknown(format!(
                "Json can't represent the non finite value under '{key}'"
            )));
        }
        let record = StoreRecord::new(recorder_metadata::<Self>(), state);

        self.save_item(record, args)
    }

    fn save_item<I: Serialize>(
        &self,
        item: I,
        mut file: Self::RecordArgs,
    ) -> Result<(), RecorderError> {
        let writer = BufWriter::new(str2writer!(file)?);
        serde_json::to_writer_pretty(writer, &item)
            .map_err(|err| RecorderError::Unknown(err.to_string()))?;
        Ok(())
    }

    fn load_item<I: DeserializeOwned>(&self, file: &mut Self::LoadArgs) -> Result<I, RecorderError> {
        let reader = BufReader::new(str2reader!(file)?);
        let state = serde_json::from_reader(reader)
            .map_err(|err| RecorderError::DeserializeError(err.to_string()))?;

        Ok(state)
    }
}

impl Recorder for NamedMpkGzFileRecorder {
    type RecordArgs = PathBuf;
    type RecordOutput = ();
    type LoadArgs = PathBuf;

    fn save_item<I: Serialize>(
        &self,
        item: I,
        mut file: Self::RecordArgs,
    ) -> Result<(), RecorderError> {
        let writer = str2writer!(file)?;
        let mut writer = GzEncoder::new(writer, Compression::default());
        rmp_serde::encode::write_named(&mut writer, &item)
            .map_err(|err| RecorderError::Unknown(err.to_string()))?;
        writer
            .finish()
            .map_err(|err| RecorderError::Unknown(err.to_string()))?;

        Ok(())
    }

    fn load_item<I: DeserializeOwned>(&self, file: &mut Self::LoadArgs) -> Result<I, RecorderError> {
        let reader = str2reader!(file)?;
        let reader = GzDecoder::new(reader);
        let state = rmp_serde::decode::from_read(reader)
            .map_err(|err| RecorderError::DeserializeError(err.to_string()))?;

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalogTile, StateMap, StateValue, capture};
    use analog_config::SingleRpuConfig;
    use ndarray::{ArrayD, IxDyn, array};

    fn state() -> StateMap {
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), true);
        tile.set_weights(array![[0.1, -0.2], [0.3, 0.4]], Some(array![0.5, 0.6]))
            .unwrap();
        tile.set_alpha_scale(2.0);

        let mut state = StateMap::new();
        state.insert("0.weight", StateValue::Tensor(ArrayD::ones(IxDyn(&[2, 3]))));
        state.insert("1.analog_tile_state", capture(&tile).into());
        state.insert("step", StateValue::Scalar(12.0));
        state
    }

    #[test]
    fn test_can_save_and_load_bin_format() {
        test_can_save_and_load(BinFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_bingz_format() {
        test_can_save_and_load(BinGzFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_pretty_json_format() {
        test_can_save_and_load(PrettyJsonFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_mpkgz_format() {
        test_can_save_and_load(NamedMpkGzFileRecorder)
    }

    fn test_can_save_and_load<R: FileRecorder>(recorder: R) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let state = state();

        recorder.record(&state, path.clone()).unwrap();
        assert!(path.with_extension(R::file_extension()).exists());

        // Saving again replaces the file.
        recorder.record(&state, path.clone()).unwrap();

        let loaded = recorder.load(path).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.keys().collect::<Vec<_>>(), state.keys().collect::<Vec<_>>());
    }

    #[test]
    fn pretty_json_rejects_non_finite_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), false);
        tile.set_weights(array![[f32::NAN, 0.0], [0.0, 1.0]], None)
            .unwrap();
        let mut state = StateMap::new();
        state.insert("analog_tile_state", capture(&tile).into());

        let err = PrettyJsonFileRecorder.record(&state, path.clone()).unwrap_err();
        assert!(err.to_string().contains("'analog_tile_state'"));
        assert!(!path.with_extension("json").exists());

        NamedMpkGzFileRecorder.record(&state, path.clone()).unwrap();
        let loaded = NamedMpkGzFileRecorder.load(path).unwrap();
        let weight = loaded.get("analog_tile_state").unwrap().as_tile().unwrap().weight();
        assert!(weight[[0, 0]].is_nan());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = NamedMpkGzFileRecorder.load(dir.path().join("missing"));

        assert!(matches!(result, Err(RecorderError::FileNotFound(_))));
    }

    #[test]
    fn metadata_difference_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        let content = r#"{
            "metadata": { "format": "other", "version": "0.0.0", "producer": "analog-store" },
            "item": 42
        }"#;
        std::fs::write(&path, content).unwrap();

        let err = PrettyJsonFileRecorder.load(path).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("different format"));
        assert!(message.contains("different version"));
        assert!(!message.contains("different producer"));
    }
}
