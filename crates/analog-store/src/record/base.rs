use core::any::type_name;

use derive_new::new;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::StateMap;

/// Name written in the metadata of every record.
pub const PRODUCER: &str = "analog-store";

/// Record a [state map](StateMap) with any serde format.
pub trait Recorder: Send + Sync + core::default::Default + core::fmt::Debug + Clone {
    /// Arguments used to record state.
    type RecordArgs: Clone;

    /// Record output type.
    type RecordOutput;

    /// Arguments used to load recorded state.
    type LoadArgs;

    /// Records a state map.
    ///
    /// # Arguments
    ///
    /// * `state` - The state to record.
    /// * `args` - Arguments used to record the state.
    fn record(
        &self,
        state: &StateMap,
        args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, RecorderError> {
        let record = StoreRecord::new(recorder_metadata::<Self>(), state);

        self.save_item(record, args)
    }

    /// Load a state map from the given arguments.
    ///
    /// When the record can't be read, the metadata alone is read again to
    /// report which of it differs from this recorder.
    fn load(&self, mut args: Self::LoadArgs) -> Result<StateMap, RecorderError> {
        let record: StoreRecord<StateMap> = self.load_item(&mut args).map_err(|err| {
            if let Ok(record) = self.load_item::<StoreRecordNoItem>(&mut args) {
                let mut message = "Unable to load record.".to_string();
                let metadata = recorder_metadata::<Self>();
                if metadata.format != record.metadata.format {
                    message += format!(
                        "\nMetadata has a different format: Actual {:?}, Expected {:?}",
                        record.metadata.format, metadata.format
                    )
                    .as_str();
                }
                if metadata.version != record.metadata.version {
                    message += format!(
                        "\nMetadata has a different version: Actual {:?}, Expected {:?}",
                        record.metadata.version, metadata.version
                    )
                    .as_str();
                }
                if metadata.producer != record.metadata.producer {
                    message += format!(
                        "\nMetadata has a different producer: Actual {:?}, Expected {:?}",
                        record.metadata.producer, metadata.producer
                    )
                    .as_str();
                }

                message += format!("\nError: {err:?}").as_str();

                return RecorderError::Unknown(message);
            }

            err
        })?;

        log::debug!(
            "Loaded {} state entries written by {} {}",
            record.item.len(),
            record.metadata.producer,
            record.metadata.version
        );

        Ok(record.item)
    }

    /// Saves an item.
    ///
    /// This method is used by [record](Recorder::record) to save the item.
    fn save_item<I: Serialize>(
        &self,
        item: I,
        args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, RecorderError>;

    /// Loads an item.
    ///
    /// This method is used by [load](Recorder::load) to load the item.
    fn load_item<I>(&self, args: &mut Self::LoadArgs) -> Result<I, RecorderError>
    where
        I: DeserializeOwned;
}

pub(super) fn recorder_metadata<R: Recorder>() -> StoreMetadata {
    StoreMetadata::new(
        type_name::<R>().to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
        PRODUCER.to_string(),
    )
}

/// Error that can occur when using a [Recorder](Recorder).
#[derive(thiserror::Error, Debug)]
pub enum RecorderError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Failed to read file.
    #[error("Failed to deserialize: {0}")]
    DeserializeError(String),

    /// Other error.
    #[error("{0}")]
    Unknown(String),
}

pub(crate) fn bin_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Metadata of a record.
#[derive(new, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreMetadata {
    /// Format used to record the item.
    pub format: String,

    /// Crate version used to record the item.
    pub version: String,

    /// Library that produced the record.
    pub producer: String,
}

/// Record that can be saved by a [Recorder](Recorder).
///
/// The metadata comes first so it can be read without the item.
#[derive(new, Serialize, Deserialize, Debug)]
pub struct StoreRecord<I> {
    /// Metadata of the record.
    pub metadata: StoreMetadata,

    /// Item to record.
    pub item: I,
}

/// Record that can be saved by a [Recorder](Recorder) without the item.
#[derive(new, Debug, Serialize, Deserialize)]
pub struct StoreRecordNoItem {
    /// Metadata of the record.
    pub metadata: StoreMetadata,
}

/// Default recorder.
///
/// It uses the [named msgpack](rmp_serde) format compressed with gzip.
pub type DefaultRecorder = super::DefaultFileRecorder;

/// Debug recorder.
///
/// It uses the [pretty json](serde_json) format, making it human readable.
pub type DebugRecorder = super::PrettyJsonFileRecorder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_names_the_recorder() {
        let metadata = recorder_metadata::<super::super::BinBytesRecorder>();

        assert!(metadata.format.ends_with("BinBytesRecorder"));
        assert_eq!(metadata.producer, PRODUCER);
        assert_eq!(metadata.version, env!("CARGO_PKG_VERSION"));
    }
}
