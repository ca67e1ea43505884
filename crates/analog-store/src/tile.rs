use analog_config::RpuConfig;
use derive_new::new;
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::TileError;

/// A named hidden parameter array of a tile.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenParameter {
    /// Name of the array, given by the device layout.
    pub name: String,
    /// Values, one per cross-point.
    pub values: ArrayD<f32>,
}

/// Analog tile: a weight matrix together with the simulation state of the
/// devices implementing it.
///
/// The weight shape, the presence of the bias and the hidden parameter layout
/// are fixed at construction.
#[derive(Debug, Clone)]
pub struct AnalogTile {
    weight: Array2<f32>,
    bias: Option<Array1<f32>>,
    hidden: Vec<HiddenParameter>,
    alpha_scale: f32,
    rpu_config: RpuConfig,
}

impl AnalogTile {
    /// Create a tile of `out_size` rows and `in_size` columns.
    ///
    /// The tile owns `rpu_config`; the weights start at zero and the hidden
    /// parameters at the initial values of the configured device.
    pub fn new(out_size: usize, in_size: usize, rpu_config: RpuConfig, bias: bool) -> Self {
        let hidden = rpu_config
            .hidden_parameter_layout()
            .into_iter()
            .map(|(name, value)| {
                HiddenParameter::new(name, ArrayD::from_elem(IxDyn(&[out_size, in_size]), value))
            })
            .collect();

        Self {
            weight: Array2::zeros((out_size, in_size)),
            bias: bias.then(|| Array1::zeros(out_size)),
            hidden,
            alpha_scale: 1.0,
            rpu_config,
        }
    }

    /// Number of rows.
    pub fn out_size(&self) -> usize {
        self.weight.nrows()
    }

    /// Number of columns.
    pub fn in_size(&self) -> usize {
        self.weight.ncols()
    }

    /// Whether the tile has a bias.
    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }

    /// Stored weights, without the alpha scale.
    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    /// Stored bias.
    pub fn bias(&self) -> Option<&Array1<f32>> {
        self.bias.as_ref()
    }

    /// Copy of the stored weights and bias.
    pub fn get_weights(&self) -> (Array2<f32>, Option<Array1<f32>>) {
        (self.weight.clone(), self.bias.clone())
    }

    /// Set the stored weights and bias.
    ///
    /// The tile is left unchanged when a shape or the bias presence differs.
    pub fn set_weights(
        &mut self,
        weight: Array2<f32>,
        bias: Option<Array1<f32>>,
    ) -> Result<(), TileError> {
        self.check_weights(&weight, bias.as_ref())?;
        self.weight = weight;
        self.bias = bias;
        Ok(())
    }

    /// Set the weights, rescaling them so their absolute maximum maps to `omega`.
    ///
    /// The alpha scale becomes `max|weight| / omega` and the stored weights are
    /// divided by it, so [effective_weights](Self::effective_weights) returns
    /// the given weights. A non positive `omega` or all-zero weights leave the
    /// alpha scale at one.
    pub fn set_weights_scaled(
        &mut self,
        weight: Array2<f32>,
        bias: Option<Array1<f32>>,
        omega: f32,
    ) -> Result<(), TileError> {
        self.check_weights(&weight, bias.as_ref())?;

        let max = weight.iter().fold(0.0f32, |acc, w| acc.max(w.abs()));
        let alpha = if omega > 0.0 && max > 0.0 {
            max / omega
        } else {
            1.0
        };

        self.weight = weight / alpha;
        self.bias = bias.map(|bias| bias / alpha);
        self.alpha_scale = alpha;
        Ok(())
    }

    /// Weights as seen by the layer: the stored weights times the alpha scale.
    pub fn effective_weights(&self) -> (Array2<f32>, Option<Array1<f32>>) {
        let alpha = self.alpha_scale;
        (
            &self.weight * alpha,
            self.bias.as_ref().map(|bias| bias * alpha),
        )
    }

    /// Alpha scale.
    pub fn alpha_scale(&self) -> f32 {
        self.alpha_scale
    }

    /// Set the alpha scale.
    pub fn set_alpha_scale(&mut self, alpha_scale: f32) {
        self.alpha_scale = alpha_scale;
    }

    /// Hidden parameter arrays, in device layout order.
    pub fn hidden_parameters(&self) -> &[HiddenParameter] {
        &self.hidden
    }

    /// Names of the hidden parameter arrays.
    pub fn hidden_parameter_names(&self) -> Vec<&str> {
        self.hidden.iter().map(|h| h.name.as_str()).collect()
    }

    /// Replace the values of every hidden parameter array, in layout order.
    pub fn set_hidden_parameters(&mut self, values: Vec<ArrayD<f32>>) -> Result<(), TileError> {
        if values.len() != self.hidden.len() {
            return Err(TileError::HiddenCount {
                expected: self.hidden.len(),
                found: values.len(),
            });
        }

        for (hidden, values) in self.hidden.iter().zip(values.iter()) {
            if hidden.values.shape() != values.shape() {
                return Err(TileError::ShapeMismatch {
                    name: hidden.name.clone(),
                    expected: hidden.values.shape().to_vec(),
                    found: values.shape().to_vec(),
                });
            }
        }

        for (hidden, values) in self.hidden.iter_mut().zip(values) {
            hidden.values = values;
        }
        Ok(())
    }

    /// Configuration of the tile.
    pub fn rpu_config(&self) -> &RpuConfig {
        &self.rpu_config
    }

    pub(crate) fn replace_rpu_config(&mut self, rpu_config: RpuConfig) {
        self.rpu_config = rpu_config;
    }

    fn check_weights(
        &self,
        weight: &Array2<f32>,
        bias: Option<&Array1<f32>>,
    ) -> Result<(), TileError> {
        if weight.shape() != self.weight.shape() {
            return Err(TileError::ShapeMismatch {
                name: "weight".to_string(),
                expected: self.weight.shape().to_vec(),
                found: weight.shape().to_vec(),
            });
        }

        match (&self.bias, bias) {
            (Some(current), Some(bias)) if current.shape() != bias.shape() => {
                Err(TileError::ShapeMismatch {
                    name: "bias".to_string(),
                    expected: current.shape().to_vec(),
                    found: bias.shape().to_vec(),
                })
            }
            (Some(_), Some(_)) | (None, None) => Ok(()),
            (current, bias) => Err(TileError::BiasMismatch {
                expected: current.is_some(),
                found: bias.is_some(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analog_config::{FloatingPointRpuConfig, LinearStepDevice, SingleRpuConfig};
    use ndarray::array;

    #[test]
    fn new_tile_layout() {
        let tile = AnalogTile::new(3, 2, SingleRpuConfig::default().into(), true);

        assert_eq!(tile.out_size(), 3);
        assert_eq!(tile.in_size(), 2);
        assert_eq!(tile.bias().map(|b| b.len()), Some(3));
        assert_eq!(tile.hidden_parameters().len(), 7);
        assert_eq!(tile.hidden_parameters()[0].values.shape(), &[3, 2]);
        assert_eq!(tile.alpha_scale(), 1.0);
    }

    #[test]
    fn floating_point_tile_has_no_hidden_parameters() {
        let tile = AnalogTile::new(2, 2, FloatingPointRpuConfig::new().into(), false);

        assert!(tile.hidden_parameters().is_empty());
        assert!(!tile.has_bias());
    }

    #[test]
    fn set_weights_checks_shape() {
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), false);

        let err = tile
            .set_weights(array![[1.0, 2.0, 3.0]], None)
            .unwrap_err();
        assert!(matches!(err, TileError::ShapeMismatch { .. }));
        assert_eq!(tile.weight(), &Array2::<f32>::zeros((2, 2)));
    }

    #[test]
    fn set_weights_checks_bias_presence() {
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), false);

        let err = tile
            .set_weights(array![[1.0, 2.0], [3.0, 4.0]], Some(array![1.0, 2.0]))
            .unwrap_err();
        assert_eq!(
            err,
            TileError::BiasMismatch {
                expected: false,
                found: true
            }
        );
    }

    #[test]
    fn weight_scaling_omega_sets_alpha() {
        let mut tile = AnalogTile::new(2, 2, SingleRpuConfig::default().into(), true);

        tile.set_weights_scaled(
            array![[1.0, -2.0], [0.5, 0.25]],
            Some(array![0.1, 0.2]),
            0.5,
        )
        .unwrap();

        assert_eq!(tile.alpha_scale(), 4.0);
        assert_eq!(tile.weight(), &array![[0.25, -0.5], [0.125, 0.0625]]);

        let (weight, bias) = tile.effective_weights();
        assert_eq!(weight, array![[1.0, -2.0], [0.5, 0.25]]);
        let bias = bias.unwrap();
        assert!((bias[0] - 0.1).abs() < 1e-6);
        assert!((bias[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn set_hidden_parameters_is_all_or_nothing() {
        let config = SingleRpuConfig::new(LinearStepDevice::default().into());
        let mut tile = AnalogTile::new(2, 3, config.into(), false);
        let before = tile.hidden_parameters().to_vec();

        let mut values: Vec<ArrayD<f32>> = before.iter().map(|h| h.values.clone() + 1.0).collect();
        values[8] = ArrayD::zeros(IxDyn(&[3, 2]));

        let err = tile.set_hidden_parameters(values).unwrap_err();
        assert!(matches!(err, TileError::ShapeMismatch { ref name, .. } if name == "slope_down"));
        assert_eq!(tile.hidden_parameters(), before.as_slice());
    }
}
