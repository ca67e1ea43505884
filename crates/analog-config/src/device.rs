//! Device parameter blocks.
//!
//! A device block describes the physical resistive element behind every
//! cross-point of a tile. Besides its scalar parameters, each device variant
//! fixes the set of hidden parameter arrays the simulator keeps per
//! cross-point. That layout is what makes two tiles structurally compatible
//! for checkpointing.

use serde::{Deserialize, Serialize};

use crate::Config;

const PULSED_HIDDEN: [&str; 7] = [
    "max_bound",
    "min_bound",
    "dwmin_up",
    "dwmin_down",
    "decay_scales",
    "diffusion_rates",
    "reset_bias",
];

const LINEAR_STEP_HIDDEN: [&str; 9] = [
    "max_bound",
    "min_bound",
    "dwmin_up",
    "dwmin_down",
    "decay_scales",
    "diffusion_rates",
    "reset_bias",
    "slope_up",
    "slope_down",
];

const IDEAL_HIDDEN: [&str; 2] = ["decay_scales", "diffusion_rates"];

/// Identifies a [pulsed device](PulsedDevice) variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PulsedDeviceKind {
    /// [Constant step device](ConstantStepDevice).
    ConstantStep,
    /// [Linear step device](LinearStepDevice).
    LinearStep,
    /// [Soft bounds device](SoftBoundsDevice).
    SoftBounds,
    /// [Exponential step device](ExpStepDevice).
    ExpStep,
    /// [Ideal device](IdealDevice).
    Ideal,
}

impl core::fmt::Display for PulsedDeviceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::ConstantStep => "ConstantStep",
            Self::LinearStep => "LinearStep",
            Self::SoftBounds => "SoftBounds",
            Self::ExpStep => "ExpStep",
            Self::Ideal => "Ideal",
        };
        f.write_str(name)
    }
}

/// Parameters shared by every pulsed device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsedParameters {
    /// Mean minimal weight change of one pulse.
    pub dw_min: f32,
    /// Device-to-device variation of `dw_min`.
    pub dw_min_dtod: f32,
    /// Cycle-to-cycle variation of `dw_min`.
    pub dw_min_std: f32,
    /// Asymmetry between up and down pulses.
    pub up_down: f32,
    /// Device-to-device variation of `up_down`.
    pub up_down_dtod: f32,
    /// Upper weight bound.
    pub w_max: f32,
    /// Device-to-device variation of `w_max`.
    pub w_max_dtod: f32,
    /// Lower weight bound.
    pub w_min: f32,
    /// Device-to-device variation of `w_min`.
    pub w_min_dtod: f32,
    /// Weight decay lifetime in mini-batches, `0` disables decay.
    pub lifetime: f32,
    /// Device-to-device variation of `lifetime`.
    pub lifetime_dtod: f32,
    /// Standard deviation of the weight diffusion.
    pub diffusion: f32,
    /// Device-to-device variation of `diffusion`.
    pub diffusion_dtod: f32,
    /// Mean reset value.
    pub reset: f32,
    /// Device-to-device variation of the reset value.
    pub reset_dtod: f32,
    /// Cycle-to-cycle variation of the reset value.
    pub reset_std: f32,
    /// Seed of the device-to-device variation, `0` means random.
    pub construction_seed: u64,
}

impl Default for PulsedParameters {
    fn default() -> Self {
        Self {
            dw_min: 0.001,
            dw_min_dtod: 0.3,
            dw_min_std: 0.3,
            up_down: 0.0,
            up_down_dtod: 0.01,
            w_max: 0.6,
            w_max_dtod: 0.3,
            w_min: -0.6,
            w_min_dtod: 0.3,
            lifetime: 0.0,
            lifetime_dtod: 0.0,
            diffusion: 0.0,
            diffusion_dtod: 0.0,
            reset: 0.01,
            reset_dtod: 0.0,
            reset_std: 0.01,
            construction_seed: 0,
        }
    }
}

impl PulsedParameters {
    fn dw_min_up(&self) -> f32 {
        self.dw_min * (1.0 + self.up_down)
    }

    fn dw_min_down(&self) -> f32 {
        self.dw_min * (1.0 - self.up_down)
    }

    fn decay_scale(&self) -> f32 {
        decay_scale(self.lifetime)
    }

    /// Initial values of the base hidden parameters, in layout order.
    fn base_hidden_values(&self) -> Vec<f32> {
        vec![
            self.w_max,
            self.w_min,
            self.dw_min_up(),
            self.dw_min_down(),
            self.decay_scale(),
            self.diffusion,
            0.0,
        ]
    }
}

fn decay_scale(lifetime: f32) -> f32 {
    if lifetime > 0.0 {
        1.0 - 1.0 / lifetime
    } else {
        1.0
    }
}

fn slope(gamma: f32, dw_min: f32, bound: f32) -> f32 {
    if bound == 0.0 {
        0.0
    } else {
        -gamma * dw_min / bound.abs()
    }
}

/// Device with a constant weight change per pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConstantStepDevice {
    /// Common pulsed parameters.
    pub pulsed: PulsedParameters,
}

impl ConstantStepDevice {
    /// Set the upper weight bound.
    pub fn with_w_max(mut self, w_max: f32) -> Self {
        self.pulsed.w_max = w_max;
        self
    }
}

/// Device whose step size depends linearly on the current weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearStepDevice {
    /// Common pulsed parameters.
    pub pulsed: PulsedParameters,
    /// Slope of the up steps.
    pub gamma_up: f32,
    /// Slope of the down steps.
    pub gamma_down: f32,
    /// Device-to-device variation of `gamma_up`.
    pub gamma_up_dtod: f32,
    /// Device-to-device variation of `gamma_down`.
    pub gamma_down_dtod: f32,
    /// Whether the step size may grow with the weight.
    pub allow_increasing: bool,
    /// Whether the slopes are relative to the mean bounds.
    pub mean_bound_reference: bool,
    /// Whether the cycle-to-cycle noise is multiplicative.
    pub mult_noise: bool,
}

impl Default for LinearStepDevice {
    fn default() -> Self {
        Self {
            pulsed: PulsedParameters::default(),
            gamma_up: 0.0,
            gamma_down: 0.0,
            gamma_up_dtod: 0.05,
            gamma_down_dtod: 0.05,
            allow_increasing: false,
            mean_bound_reference: true,
            mult_noise: true,
        }
    }
}

/// Linear step device saturating softly at its bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftBoundsDevice {
    /// Common pulsed parameters.
    pub pulsed: PulsedParameters,
    /// Whether the cycle-to-cycle noise is multiplicative.
    pub mult_noise: bool,
}

impl Default for SoftBoundsDevice {
    fn default() -> Self {
        Self {
            pulsed: PulsedParameters {
                w_max: 1.0,
                w_min: -1.0,
                ..Default::default()
            },
            mult_noise: false,
        }
    }
}

/// Device with an exponential step size dependence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpStepDevice {
    /// Common pulsed parameters.
    pub pulsed: PulsedParameters,
    /// Shape parameter `A` of the up direction.
    pub a_up: f32,
    /// Shape parameter `A` of the down direction.
    pub a_down: f32,
    /// Exponent of the up direction.
    pub gamma_up: f32,
    /// Exponent of the down direction.
    pub gamma_down: f32,
    /// Global slope `a`.
    pub a: f32,
    /// Global offset `b`.
    pub b: f32,
}

impl Default for ExpStepDevice {
    fn default() -> Self {
        Self {
            pulsed: PulsedParameters::default(),
            a_up: 0.00081,
            a_down: 0.36833,
            gamma_up: 12.44625,
            gamma_down: 12.78785,
            a: 0.244,
            b: 0.2425,
        }
    }
}

/// Ideal update behavior, keeping only decay and diffusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IdealDevice {
    /// Standard deviation of the weight diffusion.
    pub diffusion: f32,
    /// Weight decay lifetime, `0` disables decay.
    pub lifetime: f32,
    /// Seed of the device-to-device variation.
    pub construction_seed: u64,
}

/// Floating point "device" of a floating point tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FloatingPointDevice {
    /// Standard deviation of the weight diffusion.
    pub diffusion: f32,
    /// Weight decay lifetime, `0` disables decay.
    pub lifetime: f32,
}

/// Device parameters of a pulsed tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PulsedDevice {
    /// Constant step device.
    ConstantStep(ConstantStepDevice),
    /// Linear step device.
    LinearStep(LinearStepDevice),
    /// Soft bounds device.
    SoftBounds(SoftBoundsDevice),
    /// Exponential step device.
    ExpStep(ExpStepDevice),
    /// Ideal device.
    Ideal(IdealDevice),
}

impl Default for PulsedDevice {
    fn default() -> Self {
        Self::ConstantStep(ConstantStepDevice::default())
    }
}

impl PulsedDevice {
    /// Variant of the device.
    pub fn kind(&self) -> PulsedDeviceKind {
        match self {
            Self::ConstantStep(_) => PulsedDeviceKind::ConstantStep,
            Self::LinearStep(_) => PulsedDeviceKind::LinearStep,
            Self::SoftBounds(_) => PulsedDeviceKind::SoftBounds,
            Self::ExpStep(_) => PulsedDeviceKind::ExpStep,
            Self::Ideal(_) => PulsedDeviceKind::Ideal,
        }
    }

    /// Common pulsed parameters, absent for the ideal device.
    pub fn pulsed(&self) -> Option<&PulsedParameters> {
        match self {
            Self::ConstantStep(device) => Some(&device.pulsed),
            Self::LinearStep(device) => Some(&device.pulsed),
            Self::SoftBounds(device) => Some(&device.pulsed),
            Self::ExpStep(device) => Some(&device.pulsed),
            Self::Ideal(_) => None,
        }
    }

    /// Names of the hidden parameter arrays kept for this device, in order.
    pub fn hidden_parameter_names(&self) -> &'static [&'static str] {
        match self {
            Self::ConstantStep(_) | Self::ExpStep(_) => &PULSED_HIDDEN,
            Self::LinearStep(_) | Self::SoftBounds(_) => &LINEAR_STEP_HIDDEN,
            Self::Ideal(_) => &IDEAL_HIDDEN,
        }
    }

    /// Initial value of every hidden parameter array, in the order of
    /// [hidden_parameter_names](Self::hidden_parameter_names).
    ///
    /// Each array starts uniformly filled with its value.
    pub fn hidden_parameter_values(&self) -> Vec<f32> {
        match self {
            Self::ConstantStep(device) => device.pulsed.base_hidden_values(),
            Self::ExpStep(device) => device.pulsed.base_hidden_values(),
            Self::LinearStep(device) => {
                let p = &device.pulsed;
                let mut values = p.base_hidden_values();
                values.push(slope(device.gamma_up, p.dw_min_up(), p.w_max));
                values.push(slope(device.gamma_down, p.dw_min_down(), p.w_min));
                values
            }
            Self::SoftBounds(device) => {
                let p = &device.pulsed;
                let mut values = p.base_hidden_values();
                values.push(slope(1.0, p.dw_min_up(), p.w_max));
                values.push(slope(1.0, p.dw_min_down(), p.w_min));
                values
            }
            Self::Ideal(device) => vec![decay_scale(device.lifetime), device.diffusion],
        }
    }
}

impl From<ConstantStepDevice> for PulsedDevice {
    fn from(device: ConstantStepDevice) -> Self {
        Self::ConstantStep(device)
    }
}

impl From<LinearStepDevice> for PulsedDevice {
    fn from(device: LinearStepDevice) -> Self {
        Self::LinearStep(device)
    }
}

impl From<SoftBoundsDevice> for PulsedDevice {
    fn from(device: SoftBoundsDevice) -> Self {
        Self::SoftBounds(device)
    }
}

impl From<ExpStepDevice> for PulsedDevice {
    fn from(device: ExpStepDevice) -> Self {
        Self::ExpStep(device)
    }
}

impl From<IdealDevice> for PulsedDevice {
    fn from(device: IdealDevice) -> Self {
        Self::Ideal(device)
    }
}

impl Config for PulsedParameters {}
impl Config for ConstantStepDevice {}
impl Config for LinearStepDevice {}
impl Config for SoftBoundsDevice {}
impl Config for ExpStepDevice {}
impl Config for IdealDevice {}
impl Config for FloatingPointDevice {}
impl Config for PulsedDevice {}
