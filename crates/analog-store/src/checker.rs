use analog_config::DeviceKind;

use crate::snapshot::SNAPSHOT_VERSION;
use crate::{AnalogTile, StoreError, TileSnapshot, signature};

/// Result of comparing a tile with a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Compatibility {
    /// The snapshot can be restored into the tile.
    Compatible,
    /// The snapshot was captured from a tile with another structure.
    Mismatch(MismatchReason),
}

impl Compatibility {
    /// Whether the snapshot can be restored.
    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible)
    }
}

/// Component of the architecture that differs between a tile and a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// The device variants differ.
    DeviceKind {
        /// Variant of the tile.
        expected: DeviceKind,
        /// Variant of the snapshot.
        found: DeviceKind,
    },
    /// The number of hidden parameter arrays differs.
    HiddenCount {
        /// Count of the tile.
        expected: usize,
        /// Count of the snapshot.
        found: usize,
    },
    /// A hidden parameter array has another shape.
    HiddenShape {
        /// Position in the layout.
        index: usize,
        /// Name of the array in the tile.
        name: String,
        /// Shape in the tile.
        expected: Vec<usize>,
        /// Shape in the snapshot.
        found: Vec<usize>,
    },
    /// The weight shape differs.
    WeightShape {
        /// Shape of the tile.
        expected: Vec<usize>,
        /// Shape of the snapshot.
        found: Vec<usize>,
    },
    /// One side has a bias and the other doesn't.
    Bias {
        /// Whether the tile has a bias.
        expected: bool,
        /// Whether the snapshot has a bias.
        found: bool,
    },
    /// Both sides have a bias, of different lengths.
    BiasShape {
        /// Length of the tile bias.
        expected: usize,
        /// Length of the snapshot bias.
        found: usize,
    },
}

impl core::fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DeviceKind { expected, found } => {
                write!(f, "device kind differs, expected {expected}, found {found}")
            }
            Self::HiddenCount { expected, found } => write!(
                f,
                "hidden parameter count differs, expected {expected}, found {found}"
            ),
            Self::HiddenShape {
                index,
                name,
                expected,
                found,
            } => write!(
                f,
                "hidden parameter {index} ({name}) shape differs, expected {expected:?}, found {found:?}"
            ),
            Self::WeightShape { expected, found } => write!(
                f,
                "weight shape differs, expected {expected:?}, found {found:?}"
            ),
            Self::Bias { expected, found } => write!(
                f,
                "bias presence differs, expected {expected}, found {found}"
            ),
            Self::BiasShape { expected, found } => write!(
                f,
                "bias length differs, expected {expected}, found {found}"
            ),
        }
    }
}

/// Compare the structure of a tile with a snapshot.
///
/// Reports the first component that differs, in the order device kind, hidden
/// parameter count, hidden parameter shapes, weight shape, bias.
pub fn check(tile: &AnalogTile, snapshot: &TileSnapshot) -> Compatibility {
    let expected = signature(tile);
    let found = snapshot.signature();

    if expected.device != found.device {
        return Compatibility::Mismatch(MismatchReason::DeviceKind {
            expected: expected.device,
            found: found.device.clone(),
        });
    }

    if expected.hidden_shapes.len() != found.hidden_shapes.len() {
        return Compatibility::Mismatch(MismatchReason::HiddenCount {
            expected: expected.hidden_shapes.len(),
            found: found.hidden_shapes.len(),
        });
    }

    let names = tile.hidden_parameter_names();
    for (index, (a, b)) in expected
        .hidden_shapes
        .iter()
        .zip(found.hidden_shapes.iter())
        .enumerate()
    {
        if a != b {
            return Compatibility::Mismatch(MismatchReason::HiddenShape {
                index,
                name: names[index].to_string(),
                expected: a.clone(),
                found: b.clone(),
            });
        }
    }

    if tile.weight().shape() != snapshot.weight().shape() {
        return Compatibility::Mismatch(MismatchReason::WeightShape {
            expected: tile.weight().shape().to_vec(),
            found: snapshot.weight().shape().to_vec(),
        });
    }

    if tile.has_bias() != snapshot.bias().is_some() {
        return Compatibility::Mismatch(MismatchReason::Bias {
            expected: tile.has_bias(),
            found: snapshot.bias().is_some(),
        });
    }

    if let Some((a, b)) = tile.bias().zip(snapshot.bias()) {
        if a.len() != b.len() {
            return Compatibility::Mismatch(MismatchReason::BiasShape {
                expected: a.len(),
                found: b.len(),
            });
        }
    }

    Compatibility::Compatible
}

/// Reject exchanges between floating point and device configurations.
pub fn check_config_kind(
    key: &str,
    tile: &AnalogTile,
    snapshot: &TileSnapshot,
) -> Result<(), StoreError> {
    let target = tile.rpu_config().kind();
    let found = snapshot.rpu_config().kind();

    if target.is_floating_point() != found.is_floating_point() {
        return Err(StoreError::ConfigKindMismatch {
            key: key.to_string(),
            target,
            found,
        });
    }

    Ok(())
}

/// Check that a snapshot is consistent with itself.
///
/// A deserialized snapshot may come from a newer format, or have been edited
/// so that its recorded signature no longer describes its arrays.
pub fn verify_snapshot(key: &str, snapshot: &TileSnapshot) -> Result<(), StoreError> {
    let invalid = |message: String| StoreError::InvalidPayload {
        key: key.to_string(),
        message,
    };

    if snapshot.version() > SNAPSHOT_VERSION {
        return Err(invalid(format!(
            "snapshot version {} is newer than the supported version {SNAPSHOT_VERSION}",
            snapshot.version()
        )));
    }

    let derived = snapshot.derived_signature();
    if &derived != snapshot.signature() {
        return Err(invalid(format!(
            "recorded signature ({}) does not match the snapshot content ({derived})",
            snapshot.signature()
        )));
    }

    let weight_shape = snapshot.weight().shape();
    if let Some(hidden) = snapshot
        .hidden_parameters()
        .iter()
        .find(|h| h.values.shape() != weight_shape)
    {
        return Err(invalid(format!(
            "hidden parameter {} has shape {:?}, weight has shape {weight_shape:?}",
            hidden.name,
            hidden.values.shape()
        )));
    }

    if let Some(bias) = snapshot.bias() {
        if bias.len() != weight_shape[0] {
            return Err(invalid(format!(
                "bias has length {}, weight has {} rows",
                bias.len(),
                weight_shape[0]
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture;
    use analog_config::{
        ConfigKind, ConstantStepDevice, FloatingPointRpuConfig, LinearStepDevice, PulsedDeviceKind,
        SingleRpuConfig,
    };

    fn constant_step(out_size: usize, in_size: usize, bias: bool) -> AnalogTile {
        AnalogTile::new(out_size, in_size, SingleRpuConfig::default().into(), bias)
    }

    #[test]
    fn same_architecture_is_compatible() {
        let a = constant_step(2, 3, true);
        let b = constant_step(2, 3, true);

        assert!(check(&a, &capture(&b)).is_compatible());
    }

    #[test]
    fn device_kind_is_reported_first() {
        let target = constant_step(2, 3, true);
        let source = AnalogTile::new(
            4,
            4,
            SingleRpuConfig::new(LinearStepDevice::default().into()).into(),
            false,
        );

        assert_eq!(
            check(&target, &capture(&source)),
            Compatibility::Mismatch(MismatchReason::DeviceKind {
                expected: DeviceKind::Pulsed(PulsedDeviceKind::ConstantStep),
                found: DeviceKind::Pulsed(PulsedDeviceKind::LinearStep),
            })
        );
    }

    #[test]
    fn hidden_shape_mismatch() {
        let target = constant_step(2, 3, false);
        let source = constant_step(3, 3, false);

        let result = check(&target, &capture(&source));
        assert_eq!(
            result,
            Compatibility::Mismatch(MismatchReason::HiddenShape {
                index: 0,
                name: "max_bound".to_string(),
                expected: vec![2, 3],
                found: vec![3, 3],
            })
        );
    }

    #[test]
    fn bias_presence_mismatch() {
        let target = constant_step(2, 3, true);
        let source = constant_step(2, 3, false);

        assert_eq!(
            check(&target, &capture(&source)),
            Compatibility::Mismatch(MismatchReason::Bias {
                expected: true,
                found: false
            })
        );
    }

    #[test]
    fn weight_shape_mismatch_without_hidden_parameters() {
        let target = AnalogTile::new(2, 3, FloatingPointRpuConfig::new().into(), false);
        let source = AnalogTile::new(2, 4, FloatingPointRpuConfig::new().into(), false);

        assert!(matches!(
            check(&target, &capture(&source)),
            Compatibility::Mismatch(MismatchReason::WeightShape { .. })
        ));
    }

    #[test]
    fn config_kind_gate() {
        let fp = AnalogTile::new(2, 2, FloatingPointRpuConfig::new().into(), false);
        let device = AnalogTile::new(
            2,
            2,
            SingleRpuConfig::new(ConstantStepDevice::default().into()).into(),
            false,
        );

        let err = check_config_kind("analog_tile_state", &device, &capture(&fp)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConfigKindMismatch {
                target: ConfigKind::SingleDevice,
                found: ConfigKind::FloatingPoint,
                ..
            }
        ));
        assert!(check_config_kind("analog_tile_state", &device, &capture(&device)).is_ok());
    }

    #[test]
    fn captured_snapshot_verifies() {
        let tile = constant_step(2, 3, true);

        assert!(verify_snapshot("analog_tile_state", &capture(&tile)).is_ok());
    }

    fn tamper(snapshot: &TileSnapshot, edit: impl FnOnce(&mut serde_json::Value)) -> TileSnapshot {
        let mut value = serde_json::to_value(snapshot).unwrap();
        edit(&mut value);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let snapshot = capture(&constant_step(2, 3, false));
        let snapshot = tamper(&snapshot, |value| {
            value["signature"]["hidden_shapes"]
                .as_array_mut()
                .unwrap()
                .pop();
        });

        let err = verify_snapshot("0.analog_tile_state", &snapshot).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload { ref key, .. } if key == "0.analog_tile_state"));
    }

    #[test]
    fn bias_length_mismatch() {
        let tile = constant_step(2, 3, true);
        let snapshot = tamper(&capture(&tile), |value| {
            value["bias"]["dim"] = serde_json::json!([3]);
            value["bias"]["data"] = serde_json::json!([0.0, 0.0, 0.0]);
        });

        assert_eq!(
            check(&tile, &snapshot),
            Compatibility::Mismatch(MismatchReason::BiasShape {
                expected: 2,
                found: 3,
            })
        );
        assert!(verify_snapshot("analog_tile_state", &snapshot).is_err());
    }

    #[test]
    fn newer_version_is_rejected() {
        let snapshot = capture(&constant_step(2, 3, false));
        let snapshot = tamper(&snapshot, |value| {
            value["version"] = serde_json::json!(SNAPSHOT_VERSION + 1);
        });

        assert!(matches!(
            verify_snapshot("analog_tile_state", &snapshot),
            Err(StoreError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn mismatch_reason_display() {
        let reason = MismatchReason::HiddenCount {
            expected: 7,
            found: 9,
        };

        assert_eq!(
            reason.to_string(),
            "hidden parameter count differs, expected 7, found 9"
        );
    }
}
