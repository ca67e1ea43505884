use serde::{Deserialize, Serialize};

use crate::Config;

/// Bound management applied when the analog output saturates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundManagementType {
    /// No bound management.
    None,
    /// Iteratively halve the input until the output is within bounds.
    #[default]
    Iterative,
    /// Iterative, also rescaling when the output bound is undershot.
    IterativeWorstCase,
    /// Shift the input by a constant factor.
    Shift,
}

/// Noise management applied to the input vector before the analog MVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NoiseManagementType {
    /// No noise management.
    None,
    /// Scale by the absolute maximum of the input.
    #[default]
    AbsMax,
    /// Scale by a running maximum.
    Max,
    /// Scale by a fixed constant.
    Constant,
    /// Scale by the average absolute maximum over the batch.
    AverageAbsMax,
}

/// Type of weight noise injected during the analog MVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeightNoiseType {
    /// No weight noise.
    #[default]
    None,
    /// Additive Gaussian noise with constant standard deviation.
    AdditiveConstant,
    /// Noise proportional to the weight magnitude.
    PCMRead,
}

/// Parameters of the forward or backward analog matrix-vector product.
///
/// These values are opaque to the persistence layer: they are captured with
/// the tile configuration and only compared or replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IOParameters {
    /// Whether the MVM is computed without any non-ideality.
    pub is_perfect: bool,
    /// Standard deviation of Gaussian input noise.
    pub inp_noise: f32,
    /// Standard deviation of Gaussian output noise.
    pub out_noise: f32,
    /// Scale of the weight noise.
    pub w_noise: f32,
    /// Type of the weight noise.
    pub w_noise_type: WeightNoiseType,
    /// Resolution of the input DAC.
    pub inp_res: f32,
    /// Resolution of the output ADC.
    pub out_res: f32,
    /// Input bound.
    pub inp_bound: f32,
    /// Output bound.
    pub out_bound: f32,
    /// Whether the input quantization rounds stochastically.
    pub inp_sto_round: bool,
    /// Whether the output quantization rounds stochastically.
    pub out_sto_round: bool,
    /// Bound management strategy.
    pub bound_management: BoundManagementType,
    /// Noise management strategy.
    pub noise_management: NoiseManagementType,
    /// Maximal bound management down-scaling factor.
    pub max_bm_factor: u32,
    /// Limit of bound management iterations, relative to the input resolution.
    pub max_bm_res: f32,
}

impl Default for IOParameters {
    fn default() -> Self {
        Self {
            is_perfect: false,
            inp_noise: 0.0,
            out_noise: 0.06,
            w_noise: 0.0,
            w_noise_type: WeightNoiseType::None,
            inp_res: 1.0 / (2f32.powi(7) - 2.0),
            out_res: 1.0 / (2f32.powi(9) - 2.0),
            inp_bound: 1.0,
            out_bound: 12.0,
            inp_sto_round: false,
            out_sto_round: false,
            bound_management: BoundManagementType::Iterative,
            noise_management: NoiseManagementType::AbsMax,
            max_bm_factor: 1000,
            max_bm_res: 0.25,
        }
    }
}

impl IOParameters {
    /// I/O parameters of an ideal MVM.
    pub fn perfect() -> Self {
        Self {
            is_perfect: true,
            ..Default::default()
        }
    }

    /// Set the input noise.
    pub fn with_inp_noise(mut self, inp_noise: f32) -> Self {
        self.inp_noise = inp_noise;
        self
    }

    /// Set the output noise.
    pub fn with_out_noise(mut self, out_noise: f32) -> Self {
        self.out_noise = out_noise;
        self
    }

    /// Set the weight noise scale and type.
    pub fn with_w_noise(mut self, w_noise: f32, w_noise_type: WeightNoiseType) -> Self {
        self.w_noise = w_noise;
        self.w_noise_type = w_noise_type;
        self
    }
}

impl Config for IOParameters {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resolutions() {
        let io = IOParameters::default();

        assert!((io.inp_res - 1.0 / 126.0).abs() < 1e-9);
        assert!((io.out_res - 1.0 / 510.0).abs() < 1e-9);
        assert_eq!(io.bound_management, BoundManagementType::Iterative);
        assert_eq!(io.noise_management, NoiseManagementType::AbsMax);
    }

    #[test]
    fn builder_only_touches_its_field() {
        let io = IOParameters::default().with_inp_noise(0.51);

        assert_eq!(io.inp_noise, 0.51);
        assert_eq!(
            IOParameters {
                inp_noise: 0.0,
                ..io
            },
            IOParameters::default()
        );
    }
}
