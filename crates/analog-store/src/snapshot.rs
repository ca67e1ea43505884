use analog_config::{DeviceKind, RpuConfig};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{AnalogTile, HiddenParameter};

/// Format version written in every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Structural identity of a tile: its device variant and the ordered shapes of
/// its hidden parameter arrays.
///
/// Two tiles exchange state only when their signatures are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSignature {
    /// Device variant.
    pub device: DeviceKind,
    /// Shape of each hidden parameter array, in layout order.
    pub hidden_shapes: Vec<Vec<usize>>,
}

impl core::fmt::Display for ArchitectureSignature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} with {} hidden parameter array(s)",
            self.device,
            self.hidden_shapes.len()
        )
    }
}

/// Portable copy of the complete state of one tile.
///
/// A snapshot never aliases the tile it was captured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    version: u32,
    weight: Array2<f32>,
    bias: Option<Array1<f32>>,
    hidden: Vec<HiddenParameter>,
    alpha_scale: f32,
    rpu_config: RpuConfig,
    signature: ArchitectureSignature,
}

impl TileSnapshot {
    /// Format version the snapshot was written with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Stored weights.
    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    /// Stored bias.
    pub fn bias(&self) -> Option<&Array1<f32>> {
        self.bias.as_ref()
    }

    /// Hidden parameter arrays.
    pub fn hidden_parameters(&self) -> &[HiddenParameter] {
        &self.hidden
    }

    /// Alpha scale.
    pub fn alpha_scale(&self) -> f32 {
        self.alpha_scale
    }

    /// Configuration of the captured tile.
    pub fn rpu_config(&self) -> &RpuConfig {
        &self.rpu_config
    }

    /// Signature recorded at capture time.
    pub fn signature(&self) -> &ArchitectureSignature {
        &self.signature
    }

    /// Whether every array element and the alpha scale are finite.
    pub(crate) fn is_finite(&self) -> bool {
        self.alpha_scale.is_finite()
            && self.weight.iter().all(|v| v.is_finite())
            && self.bias.iter().flatten().all(|v| v.is_finite())
            && self.hidden.iter().all(|h| h.values.iter().all(|v| v.is_finite()))
    }

    /// Signature computed from the arrays held by the snapshot.
    pub(crate) fn derived_signature(&self) -> ArchitectureSignature {
        ArchitectureSignature {
            device: self.rpu_config.device_kind(),
            hidden_shapes: self
                .hidden
                .iter()
                .map(|h| h.values.shape().to_vec())
                .collect(),
        }
    }
}

/// Capture the state of a tile.
pub fn capture(tile: &AnalogTile) -> TileSnapshot {
    TileSnapshot {
        version: SNAPSHOT_VERSION,
        weight: tile.weight().clone(),
        bias: tile.bias().cloned(),
        hidden: tile.hidden_parameters().to_vec(),
        alpha_scale: tile.alpha_scale(),
        rpu_config: tile.rpu_config().clone(),
        signature: signature(tile),
    }
}

/// Architecture signature of a tile.
pub fn signature(tile: &AnalogTile) -> ArchitectureSignature {
    ArchitectureSignature {
        device: tile.rpu_config().device_kind(),
        hidden_shapes: tile
            .hidden_parameters()
            .iter()
            .map(|h| h.values.shape().to_vec())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analog_config::{LinearStepDevice, PulsedDeviceKind, SingleRpuConfig};
    use ndarray::array;

    #[test]
    fn capture_is_a_deep_copy() {
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), true);
        tile.set_weights(array![[1.0, 2.0], [3.0, 4.0]], Some(array![0.5, -0.5]))
            .unwrap();
        tile.set_alpha_scale(2.0);

        let snapshot = capture(&tile);

        tile.set_weights(Array2::zeros((2, 2)), Some(Array1::zeros(2)))
            .unwrap();
        tile.set_alpha_scale(1.0);

        assert_eq!(snapshot.weight(), &array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(snapshot.bias(), Some(&array![0.5, -0.5]));
        assert_eq!(snapshot.alpha_scale(), 2.0);
        assert_eq!(snapshot.version(), SNAPSHOT_VERSION);
        assert_eq!(snapshot.signature(), &snapshot.derived_signature());
    }

    #[test]
    fn signature_depends_on_device_variant() {
        let constant = AnalogTile::new(2, 3, SingleRpuConfig::default().into(), false);
        let linear = AnalogTile::new(
            2,
            3,
            SingleRpuConfig::new(LinearStepDevice::default().into()).into(),
            false,
        );

        let a = signature(&constant);
        let b = signature(&linear);

        assert_eq!(a.device, DeviceKind::Pulsed(PulsedDeviceKind::ConstantStep));
        assert_eq!(a.hidden_shapes, vec![vec![2, 3]; 7]);
        assert_eq!(b.hidden_shapes.len(), 9);
        assert_ne!(a, b);
    }

    #[test]
    fn signature_ignores_weight_values() {
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), false);
        let before = signature(&tile);
        tile.set_weights(array![[1.0, 1.0], [1.0, 1.0]], None).unwrap();

        assert_eq!(before, signature(&tile));
    }
}
