use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{
    Config, FloatingPointDevice, IOParameters, PcmLikeNoiseModel, PulsedDevice, PulsedDeviceKind,
    UpdateParameters, WeightClipParameter, WeightModifierParameter,
};

/// Configuration of a floating point tile.
///
/// Floating point tiles have no I/O, update or pulsed device parameters.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FloatingPointRpuConfig {
    /// Decay and diffusion of the floating point weights.
    #[new(default)]
    pub device: FloatingPointDevice,
}

/// Configuration of a tile built from a single pulsed device per cross-point.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRpuConfig {
    /// Forward pass parameters.
    #[new(default)]
    pub forward: IOParameters,
    /// Backward pass parameters.
    #[new(default)]
    pub backward: IOParameters,
    /// Update parameters.
    #[new(default)]
    pub update: UpdateParameters,
    /// Device parameters.
    pub device: PulsedDevice,
}

impl Default for SingleRpuConfig {
    fn default() -> Self {
        Self::new(PulsedDevice::default())
    }
}

impl SingleRpuConfig {
    /// Set the forward pass parameters.
    pub fn with_forward(mut self, forward: IOParameters) -> Self {
        self.forward = forward;
        self
    }

    /// Set the backward pass parameters.
    pub fn with_backward(mut self, backward: IOParameters) -> Self {
        self.backward = backward;
        self
    }

    /// Set the update parameters.
    pub fn with_update(mut self, update: UpdateParameters) -> Self {
        self.update = update;
        self
    }
}

/// Which devices of a unit cell receive an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnitCellUpdatePolicy {
    /// Update every device.
    #[default]
    All,
    /// Always update the same device.
    SingleFixed,
    /// Cycle through the devices.
    SingleSequential,
    /// Pick a random device per update.
    SingleRandom,
}

/// Configuration of a tile where each cross-point is a unit cell of several
/// pulsed devices.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCellRpuConfig {
    /// Forward pass parameters.
    #[new(default)]
    pub forward: IOParameters,
    /// Backward pass parameters.
    #[new(default)]
    pub backward: IOParameters,
    /// Update parameters.
    #[new(default)]
    pub update: UpdateParameters,
    /// Devices of the unit cell.
    pub unit_cell_devices: Vec<PulsedDevice>,
    /// Update policy.
    #[new(default)]
    pub update_policy: UnitCellUpdatePolicy,
    /// Index of the first device updated by single policies.
    #[new(default)]
    pub first_update_idx: usize,
    /// Weighting of each device when reading the weight, empty means uniform.
    #[new(default)]
    pub gamma_vec: Vec<f32>,
}

/// Configuration of an inference tile, whose programmed weights drift over
/// time according to a statistical noise model.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InferenceRpuConfig {
    /// Forward pass parameters.
    #[new(default)]
    pub forward: IOParameters,
    /// Backward pass parameters.
    #[new(default)]
    pub backward: IOParameters,
    /// Update parameters.
    #[new(default)]
    pub update: UpdateParameters,
    /// Programming, read and drift noise model.
    #[new(default)]
    pub noise_model: PcmLikeNoiseModel,
    /// Whether the output is rescaled to compensate the global drift.
    #[new(default)]
    pub drift_compensation: bool,
    /// Weight clipping.
    #[new(default)]
    pub clip: WeightClipParameter,
    /// Weight modifier.
    #[new(default)]
    pub modifier: WeightModifierParameter,
}

/// Kind of an [RPU config](RpuConfig), without its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigKind {
    /// [Floating point](FloatingPointRpuConfig).
    FloatingPoint,
    /// [Single device](SingleRpuConfig).
    SingleDevice,
    /// [Unit cell](UnitCellRpuConfig).
    UnitCell,
    /// [Inference](InferenceRpuConfig).
    Inference,
}

impl ConfigKind {
    /// Whether the kind is floating point.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::FloatingPoint)
    }
}

impl core::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::FloatingPoint => "FloatingPoint",
            Self::SingleDevice => "SingleDevice",
            Self::UnitCell => "UnitCell",
            Self::Inference => "Inference",
        };
        f.write_str(name)
    }
}

/// Device variant of a tile, the first half of its architecture signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Floating point weights.
    FloatingPoint,
    /// A single pulsed device.
    Pulsed(PulsedDeviceKind),
    /// A unit cell of pulsed devices, in cell order.
    UnitCell(Vec<PulsedDeviceKind>),
    /// Inference weights with a noise model.
    Inference,
}

impl core::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FloatingPoint => f.write_str("FloatingPoint"),
            Self::Pulsed(kind) => write!(f, "{kind}"),
            Self::UnitCell(kinds) => {
                f.write_str("UnitCell[")?;
                for (i, kind) in kinds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                f.write_str("]")
            }
            Self::Inference => f.write_str("Inference"),
        }
    }
}

/// Simulation configuration of one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpuConfig {
    /// Floating point tile.
    FloatingPoint(FloatingPointRpuConfig),
    /// Single pulsed device per cross-point.
    SingleDevice(SingleRpuConfig),
    /// Unit cell of pulsed devices per cross-point.
    UnitCell(UnitCellRpuConfig),
    /// Inference tile.
    Inference(InferenceRpuConfig),
}

impl Default for RpuConfig {
    fn default() -> Self {
        Self::SingleDevice(SingleRpuConfig::default())
    }
}

impl RpuConfig {
    /// Kind of the configuration.
    pub fn kind(&self) -> ConfigKind {
        match self {
            Self::FloatingPoint(_) => ConfigKind::FloatingPoint,
            Self::SingleDevice(_) => ConfigKind::SingleDevice,
            Self::UnitCell(_) => ConfigKind::UnitCell,
            Self::Inference(_) => ConfigKind::Inference,
        }
    }

    /// Device variant of the configuration.
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            Self::FloatingPoint(_) => DeviceKind::FloatingPoint,
            Self::SingleDevice(config) => DeviceKind::Pulsed(config.device.kind()),
            Self::UnitCell(config) => DeviceKind::UnitCell(
                config
                    .unit_cell_devices
                    .iter()
                    .map(PulsedDevice::kind)
                    .collect(),
            ),
            Self::Inference(_) => DeviceKind::Inference,
        }
    }

    /// Forward pass parameters, absent for floating point tiles.
    pub fn forward(&self) -> Option<&IOParameters> {
        match self {
            Self::FloatingPoint(_) => None,
            Self::SingleDevice(config) => Some(&config.forward),
            Self::UnitCell(config) => Some(&config.forward),
            Self::Inference(config) => Some(&config.forward),
        }
    }

    /// Mutable forward pass parameters, absent for floating point tiles.
    pub fn forward_mut(&mut self) -> Option<&mut IOParameters> {
        match self {
            Self::FloatingPoint(_) => None,
            Self::SingleDevice(config) => Some(&mut config.forward),
            Self::UnitCell(config) => Some(&mut config.forward),
            Self::Inference(config) => Some(&mut config.forward),
        }
    }

    /// Backward pass parameters, absent for floating point tiles.
    pub fn backward(&self) -> Option<&IOParameters> {
        match self {
            Self::FloatingPoint(_) => None,
            Self::SingleDevice(config) => Some(&config.backward),
            Self::UnitCell(config) => Some(&config.backward),
            Self::Inference(config) => Some(&config.backward),
        }
    }

    /// Update parameters, absent for floating point tiles.
    pub fn update(&self) -> Option<&UpdateParameters> {
        match self {
            Self::FloatingPoint(_) => None,
            Self::SingleDevice(config) => Some(&config.update),
            Self::UnitCell(config) => Some(&config.update),
            Self::Inference(config) => Some(&config.update),
        }
    }

    /// Names and initial values of the hidden parameter arrays of a tile
    /// built from this configuration, in order.
    ///
    /// Unit cell names are prefixed with the index of their device.
    pub fn hidden_parameter_layout(&self) -> Vec<(String, f32)> {
        match self {
            Self::FloatingPoint(_) | Self::Inference(_) => Vec::new(),
            Self::SingleDevice(config) => device_layout(&config.device, None),
            Self::UnitCell(config) => config
                .unit_cell_devices
                .iter()
                .enumerate()
                .flat_map(|(index, device)| device_layout(device, Some(index)))
                .collect(),
        }
    }
}

fn device_layout(device: &PulsedDevice, index: Option<usize>) -> Vec<(String, f32)> {
    device
        .hidden_parameter_names()
        .iter()
        .zip(device.hidden_parameter_values())
        .map(|(name, value)| match index {
            Some(index) => (format!("{index}_{name}"), value),
            None => (name.to_string(), value),
        })
        .collect()
}

impl From<FloatingPointRpuConfig> for RpuConfig {
    fn from(config: FloatingPointRpuConfig) -> Self {
        Self::FloatingPoint(config)
    }
}

impl From<SingleRpuConfig> for RpuConfig {
    fn from(config: SingleRpuConfig) -> Self {
        Self::SingleDevice(config)
    }
}

impl From<UnitCellRpuConfig> for RpuConfig {
    fn from(config: UnitCellRpuConfig) -> Self {
        Self::UnitCell(config)
    }
}

impl From<InferenceRpuConfig> for RpuConfig {
    fn from(config: InferenceRpuConfig) -> Self {
        Self::Inference(config)
    }
}

impl Config for FloatingPointRpuConfig {}
impl Config for SingleRpuConfig {}
impl Config for UnitCellRpuConfig {}
impl Config for InferenceRpuConfig {}
impl Config for RpuConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstantStepDevice, LinearStepDevice};

    #[test]
    fn kinds() {
        let fp: RpuConfig = FloatingPointRpuConfig::new().into();
        let single: RpuConfig = SingleRpuConfig::default().into();

        assert_eq!(fp.kind(), ConfigKind::FloatingPoint);
        assert!(fp.kind().is_floating_point());
        assert_eq!(single.kind(), ConfigKind::SingleDevice);
        assert_eq!(
            single.device_kind(),
            DeviceKind::Pulsed(PulsedDeviceKind::ConstantStep)
        );
        assert!(fp.forward().is_none());
        assert!(single.forward().is_some());
    }

    #[test]
    fn unit_cell_layout_is_prefixed() {
        let config: RpuConfig = UnitCellRpuConfig::new(vec![
            ConstantStepDevice::default().into(),
            LinearStepDevice::default().into(),
        ])
        .into();

        let layout = config.hidden_parameter_layout();
        assert_eq!(layout.len(), 7 + 9);
        assert_eq!(layout[0].0, "0_max_bound");
        assert_eq!(layout[7].0, "1_max_bound");
        assert_eq!(layout[15].0, "1_slope_down");
        assert_eq!(
            config.device_kind().to_string(),
            "UnitCell[ConstantStep, LinearStep]"
        );
    }

    #[test]
    fn floating_point_and_inference_have_no_hidden_parameters() {
        let fp: RpuConfig = FloatingPointRpuConfig::new().into();
        let inference: RpuConfig = InferenceRpuConfig::new().into();

        assert!(fp.hidden_parameter_layout().is_empty());
        assert!(inference.hidden_parameter_layout().is_empty());
    }

    #[test]
    fn clone_is_independent() {
        let mut config: RpuConfig = SingleRpuConfig::default().into();
        let copy = config.clone();

        if let Some(forward) = config.forward_mut() {
            forward.inp_noise = 0.51;
        }

        assert_eq!(copy.forward().map(|io| io.inp_noise), Some(0.0));
        assert_eq!(config.forward().map(|io| io.inp_noise), Some(0.51));
        assert_ne!(copy, config);
        assert_eq!(copy.kind(), config.kind());
    }
}
