use super::Param;
use crate::AnalogTile;

/// Node of a module tree.
///
/// A module reports its ordinary parameters, its tiles and its children to a
/// [visitor](ModuleVisitor) or a [mapper](ModuleMapper), always in the same
/// order. Children are reported between [enter_module](ModuleVisitor::enter_module)
/// and [exit_module](ModuleVisitor::exit_module) calls carrying their name.
///
/// # Example
///
/// ```rust
/// use analog_store::module::{visit_child, map_child, Module, ModuleMapper, ModuleVisitor};
/// use analog_store::AnalogLinear;
///
/// #[derive(Debug, Clone)]
/// struct Net {
///     layer: AnalogLinear,
/// }
///
/// impl Module for Net {
///     fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
///         visit_child("layer", &self.layer, visitor);
///     }
///
///     fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
///         Self {
///             layer: map_child("layer", self.layer, mapper),
///         }
///     }
/// }
/// ```
pub trait Module: Clone + core::fmt::Debug {
    /// Visit each parameter and tile of the module and its children.
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V);
    /// Map each parameter and tile of the module and its children.
    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self;
}

/// Read-only traversal of a module tree.
pub trait ModuleVisitor {
    /// A child module named `name` is entered.
    fn enter_module(&mut self, _name: &str) {}
    /// The child module named `name` is left.
    fn exit_module(&mut self, _name: &str) {}
    /// Visit an ordinary parameter of the current module.
    fn visit_param(&mut self, _name: &str, _param: &Param) {}
    /// Visit a tile of the current module, `name` being its state name.
    fn visit_tile(&mut self, _name: &str, _tile: &AnalogTile) {}
}

/// Consuming traversal of a module tree.
pub trait ModuleMapper {
    /// A child module named `name` is entered.
    fn enter_module(&mut self, _name: &str) {}
    /// The child module named `name` is left.
    fn exit_module(&mut self, _name: &str) {}
    /// Map an ordinary parameter of the current module.
    fn map_param(&mut self, _name: &str, param: Param) -> Param {
        param
    }
    /// Map a tile of the current module, `name` being its state name.
    fn map_tile(&mut self, _name: &str, tile: AnalogTile) -> AnalogTile {
        tile
    }
}

/// Visit a named child module.
pub fn visit_child<C: Module, V: ModuleVisitor>(name: &str, child: &C, visitor: &mut V) {
    visitor.enter_module(name);
    child.visit(visitor);
    visitor.exit_module(name);
}

/// Map a named child module.
pub fn map_child<C: Module, M: ModuleMapper>(name: &str, child: C, mapper: &mut M) -> C {
    mapper.enter_module(name);
    let child = child.map(mapper);
    mapper.exit_module(name);
    child
}

impl<T: Module> Module for Vec<T> {
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
        for (index, module) in self.iter().enumerate() {
            visit_child(&index.to_string(), module, visitor);
        }
    }

    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
        self.into_iter()
            .enumerate()
            .map(|(index, module)| map_child(&index.to_string(), module, mapper))
            .collect()
    }
}

impl<T: Module> Module for Option<T> {
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
        if let Some(module) = self {
            module.visit(visitor)
        }
    }

    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
        self.map(|module| Module::map(module, mapper))
    }
}

/// Module holding its children in order, named by their index.
#[derive(Debug, Clone)]
pub struct Sequential<T> {
    layers: Vec<T>,
}

impl<T: Module> Sequential<T> {
    /// Create a container from its layers.
    pub fn new(layers: Vec<T>) -> Self {
        Self { layers }
    }

    /// Layers, in order.
    pub fn layers(&self) -> &[T] {
        &self.layers
    }

    /// Mutable access to the layers.
    pub fn layers_mut(&mut self) -> &mut [T] {
        &mut self.layers
    }
}

impl<T: Module> Module for Sequential<T> {
    fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
        self.layers.visit(visitor)
    }

    fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
        Self {
            layers: self.layers.map(mapper),
        }
    }
}
