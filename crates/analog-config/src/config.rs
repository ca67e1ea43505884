use core::fmt::Debug;

/// Configuration IO error.
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid format.
    InvalidFormat(String),

    /// File not found.
    FileNotFound(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut message = "Config error => ".to_string();

        match self {
            Self::InvalidFormat(err) => {
                message += format!("Invalid format: {err}").as_str();
            }
            Self::FileNotFound(err) => {
                message += format!("File not found: {err}").as_str();
            }
        };

        f.write_str(message.as_str())
    }
}

impl core::error::Error for ConfigError {}

/// Configuration trait.
///
/// Every value of the tile configuration graph implements this trait, so any
/// part of it (a single [device](crate::PulsedDevice), the
/// [I/O parameters](crate::IOParameters) or a whole [RPU config](crate::RpuConfig))
/// can be written to and read back from JSON on its own.
pub trait Config: Debug + serde::Serialize + serde::de::DeserializeOwned {
    /// Saves the configuration to a file.
    ///
    /// # Arguments
    ///
    /// * `file` - File to save the configuration to.
    ///
    /// # Returns
    ///
    /// The output of the save operation.
    #[cfg(feature = "std")]
    fn save<P: AsRef<std::path::Path>>(&self, file: P) -> std::io::Result<()> {
        let content = config_to_json(self).map_err(std::io::Error::other)?;
        std::fs::write(file, content)
    }

    /// Loads the configuration from a file.
    ///
    /// # Arguments
    ///
    /// * `file` - File to load the configuration from.
    ///
    /// # Returns
    ///
    /// The loaded configuration.
    #[cfg(feature = "std")]
    fn load<P: AsRef<std::path::Path>>(file: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file.as_ref())
            .map_err(|_| ConfigError::FileNotFound(file.as_ref().to_string_lossy().to_string()))?;
        config_from_str(&content)
    }

    /// Loads the configuration from a binary buffer.
    ///
    /// # Arguments
    ///
    /// * `data` - Binary buffer to load the configuration from.
    ///
    /// # Returns
    ///
    /// The loaded configuration.
    fn load_binary(data: &[u8]) -> Result<Self, ConfigError> {
        let content = core::str::from_utf8(data).map_err(|_| {
            ConfigError::InvalidFormat("Could not parse data as utf-8.".to_string())
        })?;
        config_from_str(content)
    }
}

/// Converts a configuration to a JSON string.
///
/// # Arguments
///
/// * `config` - Configuration to convert.
///
/// # Returns
///
/// The JSON string.
pub fn config_to_json<C: Config>(config: &C) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|err| ConfigError::InvalidFormat(format!("{err}")))
}

fn config_from_str<C: Config>(content: &str) -> Result<C, ConfigError> {
    serde_json::from_str(content).map_err(|err| ConfigError::InvalidFormat(format!("{err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstantStepDevice, IOParameters, RpuConfig, SingleRpuConfig};

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound("rpu.json".to_string());
        assert_eq!(err.to_string(), "Config error => File not found: rpu.json");
    }

    #[test]
    fn load_binary_rejects_invalid_utf8() {
        let result = IOParameters::load_binary(&[0xff, 0xfe, 0xfd]);
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn load_binary_rejects_wrong_schema() {
        let result = IOParameters::load_binary(b"{\"inp_noise\": \"loud\"}");
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn save_and_load_rpu_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpu_config.json");

        let config: RpuConfig = SingleRpuConfig::new(ConstantStepDevice::default().into())
            .with_forward(IOParameters {
                inp_noise: 0.321,
                ..Default::default()
            })
            .into();
        config.save(&path).unwrap();

        let loaded = RpuConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file() {
        let result = RpuConfig::load("/tmp/analog_config_does_not_exist.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
