use ndarray::{ArrayD, IxDyn};

use super::{Module, ModuleMapper, ModuleVisitor, Param};

/// Digital fully connected layer with ordinary `weight` and `bias` parameters.
#[derive(Debug, Clone)]
pub struct Linear {
    /// Matrix of shape `[d_output, d_input]`.
    pub weight: Param,
    /// Vector of size `d_output`.
    pub bias: Option<Param>,
}

impl Linear {
    /// Create a layer with zero initialized parameters.
    pub fn new(d_input: usize, d_output: usize, bias: bool) -> Self {
        Self {
            weight: Param::new(ArrayD::zeros(IxDyn(&[d_output, d_input]))),
            bias: bias.then(|| Param::new(ArrayD::zeros(IxDyn(&[d_output])))),
        }
    }
}

impl Module for Linear {
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
        visitor.visit_param("weight", &self.weight);
        if let Some(bias) = &self.bias {
            visitor.visit_param("bias", bias);
        }
    }

    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
        Self {
            weight: mapper.map_param("weight", self.weight),
            bias: self.bias.map(|bias| mapper.map_param("bias", bias)),
        }
    }
}
