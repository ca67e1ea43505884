use core::sync::atomic::{AtomicU64, Ordering};

use ndarray::ArrayD;

static PARAM_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier of a parameter, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId {
    value: u64,
}

impl Default for ParamId {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamId {
    /// Create a new identifier.
    pub fn new() -> Self {
        Self {
            value: PARAM_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Integer value of the identifier.
    pub fn val(&self) -> u64 {
        self.value
    }
}

impl core::fmt::Display for ParamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Ordinary trainable parameter of a module.
///
/// Loading a value into a parameter keeps its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    id: ParamId,
    value: ArrayD<f32>,
}

impl Param {
    /// Create a parameter with a new identifier.
    pub fn new(value: ArrayD<f32>) -> Self {
        Self {
            id: ParamId::new(),
            value,
        }
    }

    /// Identifier.
    pub fn id(&self) -> ParamId {
        self.id
    }

    /// Value.
    pub fn val(&self) -> &ArrayD<f32> {
        &self.value
    }

    /// Shape of the value.
    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Replace the value, keeping the identifier.
    pub fn with_value(self, value: ArrayD<f32>) -> Self {
        Self { id: self.id, value }
    }
}

impl core::ops::Deref for Param {
    type Target = ArrayD<f32>;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl core::fmt::Display for Param {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Param: {} {:?}", self.id, self.value.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn ids_are_unique() {
        let a = ParamId::new();
        let b = ParamId::new();

        assert_ne!(a, b);
    }

    #[test]
    fn with_value_keeps_id() {
        let param = Param::new(ArrayD::zeros(IxDyn(&[2, 2])));
        let id = param.id();

        let param = param.with_value(ArrayD::ones(IxDyn(&[2, 2])));

        assert_eq!(param.id(), id);
        assert_eq!(param.sum(), 4.0);
    }
}
