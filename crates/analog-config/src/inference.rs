use serde::{Deserialize, Serialize};

use crate::Config;

/// Statistical model of programming noise, read noise and drift of
/// phase-change memory, used by inference tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcmLikeNoiseModel {
    /// Maximal conductance in micro-Siemens.
    pub g_max: f32,
    /// Scale of the programming noise.
    pub prog_noise_scale: f32,
    /// Scale of the read noise.
    pub read_noise_scale: f32,
    /// Scale of the conductance drift.
    pub drift_scale: f32,
    /// Reference time of the drift, in seconds.
    pub t_0: f32,
    /// Duration of one read, in seconds.
    pub t_read: f32,
}

impl Default for PcmLikeNoiseModel {
    fn default() -> Self {
        Self {
            g_max: 25.0,
            prog_noise_scale: 1.0,
            read_noise_scale: 1.0,
            drift_scale: 1.0,
            t_0: 20.0,
            t_read: 250.0e-9,
        }
    }
}

/// Weight clipping applied after each optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeightClipType {
    /// No clipping.
    #[default]
    None,
    /// Clip to a fixed value.
    FixedValue,
    /// Clip to a multiple of the layer standard deviation.
    LayerGaussian,
    /// Clip to the average of the per-channel maximum.
    AverageChannelMax,
}

/// Parameters of the weight clipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightClipParameter {
    /// Clipping strategy.
    pub clip_type: WeightClipType,
    /// Value used by [FixedValue](WeightClipType::FixedValue).
    pub fixed_value: f32,
    /// Multiple used by [LayerGaussian](WeightClipType::LayerGaussian).
    pub sigma: f32,
}

impl Default for WeightClipParameter {
    fn default() -> Self {
        Self {
            clip_type: WeightClipType::None,
            fixed_value: -1.0,
            sigma: 2.5,
        }
    }
}

/// Weight modifier applied during hardware-aware training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeightModifierType {
    /// Use the weights as they are.
    #[default]
    Copy,
    /// Discretize the weights.
    Discretize,
    /// Multiplicative Gaussian noise.
    MultNormal,
    /// Additive Gaussian noise.
    AddNormal,
    /// Discretize, then add Gaussian noise.
    DiscretizeAddNormal,
    /// DoReFa discretization.
    DoReFa,
    /// Polynomial noise in the weight magnitude.
    Poly,
}

/// Parameters of the weight modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeightModifierParameter {
    /// Modifier type.
    pub modifier_type: WeightModifierType,
    /// Standard deviation of the modifier noise.
    pub std_dev: f32,
    /// Discretization resolution.
    pub res: f32,
    /// Drop connect probability.
    pub pdrop: f32,
    /// Whether the modifier is also applied in evaluation mode.
    pub enable_during_test: bool,
}

impl Config for PcmLikeNoiseModel {}
impl Config for WeightClipParameter {}
impl Config for WeightModifierParameter {}
