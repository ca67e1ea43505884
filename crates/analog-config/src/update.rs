use serde::{Deserialize, Serialize};

use crate::Config;

/// Pulse train generation used by the analog update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PulseType {
    /// No pulsing, the update is computed in floating point.
    None,
    /// Stochastic pulse trains with explicit bit lines.
    Stochastic,
    /// Stochastic pulse trains, compressed representation.
    #[default]
    StochasticCompressed,
    /// Deterministic implicit pulse trains.
    DeterministicImplicit,
    /// Mean-field approximation of the stochastic update.
    MeanCount,
}

/// Parameters of the pulsed analog update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParameters {
    /// Desired length of the pulse trains.
    pub desired_bl: u32,
    /// Whether the bit length is fixed or adapted per batch.
    pub fixed_bl: bool,
    /// Pulse train generation.
    pub pulse_type: PulseType,
    /// Resolution of the update probability.
    pub res: f32,
    /// Whether the update probabilities are rounded stochastically.
    pub sto_round: bool,
    /// Adapt the bit length to the maximal input and error values.
    pub update_bl_management: bool,
    /// Balance input and error scaling.
    pub update_management: bool,
    /// Implicit resolution of the input for deterministic pulses.
    pub x_res_implicit: f32,
    /// Implicit resolution of the error for deterministic pulses.
    pub d_res_implicit: f32,
}

impl Default for UpdateParameters {
    fn default() -> Self {
        Self {
            desired_bl: 31,
            fixed_bl: true,
            pulse_type: PulseType::StochasticCompressed,
            res: 0.0,
            sto_round: false,
            update_bl_management: true,
            update_management: true,
            x_res_implicit: 0.0,
            d_res_implicit: 0.0,
        }
    }
}

impl UpdateParameters {
    /// Set the desired bit length.
    pub fn with_desired_bl(mut self, desired_bl: u32) -> Self {
        self.desired_bl = desired_bl;
        self
    }

    /// Set the pulse type.
    pub fn with_pulse_type(mut self, pulse_type: PulseType) -> Self {
        self.pulse_type = pulse_type;
        self
    }
}

impl Config for UpdateParameters {}
