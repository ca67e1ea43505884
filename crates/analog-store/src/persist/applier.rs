use hashbrown::HashSet;

use crate::module::{ModuleMapper, Param};
use crate::namespace::compose_key;
use crate::{AnalogTile, RestoreOptions, StateMap, StateValue, StoreError, restore_payload};

/// Keys handled while restoring a module tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Keys that were restored, in tree order.
    pub applied: Vec<String>,
    /// Keys of the tree absent from the state map, in tree order.
    pub missing: Vec<String>,
    /// Keys of the state map the tree doesn't have, sorted.
    pub unused: Vec<String>,
}

impl RestoreReport {
    /// Whether every key of the tree and of the state map was used.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unused.is_empty()
    }
}

/// Mapper restoring a module tree from a [state map](StateMap).
///
/// Tiles are restored as they are reached; after the first tile failure the
/// remaining modules are passed through untouched. Problems with ordinary
/// parameters are collected and reported once every tile has been handled.
pub struct Applier<'a> {
    /// State to restore from
    state: &'a StateMap,
    /// Restoration policy
    options: RestoreOptions,
    /// Current path in the module hierarchy
    path_stack: Vec<String>,
    /// Every key of the tree that was visited
    visited: HashSet<String>,
    /// Successfully applied keys
    applied: Vec<String>,
    /// Keys of the tree without state
    missing: Vec<String>,
    /// First tile failure
    tile_error: Option<StoreError>,
    /// Errors of ordinary parameters
    param_errors: Vec<StoreError>,
}

impl<'a> Applier<'a> {
    /// Create an applier over `state`.
    pub fn new(state: &'a StateMap, options: RestoreOptions) -> Self {
        Self {
            state,
            options,
            path_stack: Vec::new(),
            visited: HashSet::new(),
            applied: Vec::new(),
            missing: Vec::new(),
            tile_error: None,
            param_errors: Vec::new(),
        }
    }

    fn current_path(&self) -> String {
        self.path_stack.join(".")
    }

    /// Convert the applier into a report, applying the key accounting of the
    /// restoration policy.
    pub fn into_result(self) -> Result<RestoreReport, StoreError> {
        if let Some(err) = self.tile_error {
            return Err(err);
        }

        if let Some(err) = self.param_errors.into_iter().next() {
            return Err(err);
        }

        let mut unused: Vec<String> = self
            .state
            .keys()
            .filter(|key| !self.visited.contains(*key))
            .map(ToString::to_string)
            .collect();
        unused.sort();

        if self.options.strict {
            if !self.missing.is_empty() {
                return Err(StoreError::MissingKey(self.missing.join(", ")));
            }
            if !unused.is_empty() {
                return Err(StoreError::UnexpectedKeys(unused));
            }
        } else {
            if !self.missing.is_empty() {
                log::warn!("Keys missing from the state map: {}", self.missing.join(", "));
            }
            if !unused.is_empty() {
                log::warn!("Unused keys of the state map: {}", unused.join(", "));
            }
        }

        Ok(RestoreReport {
            applied: self.applied,
            missing: self.missing,
            unused,
        })
    }
}

impl ModuleMapper for Applier<'_> {
    fn enter_module(&mut self, name: &str) {
        self.path_stack.push(name.to_string());
    }

    fn exit_module(&mut self, _name: &str) {
        self.path_stack.pop();
    }

    fn map_param(&mut self, name: &str, param: Param) -> Param {
        let key = compose_key(&self.current_path(), name);
        self.visited.insert(key.clone());

        if self.tile_error.is_some() {
            return param;
        }

        match self.state.get(&key) {
            None => {
                self.missing.push(key);
                param
            }
            Some(StateValue::Tensor(value)) if value.shape() == param.shape() => {
                self.applied.push(key);
                param.with_value(value.clone())
            }
            Some(StateValue::Tensor(value)) => {
                self.param_errors.push(StoreError::ShapeMismatch {
                    expected: param.shape().to_vec(),
                    found: value.shape().to_vec(),
                    key,
                });
                param
            }
            Some(other) => {
                self.param_errors.push(StoreError::InvalidPayload {
                    message: format!("expected a tensor, found a {}", other.variant_name()),
                    key,
                });
                param
            }
        }
    }

    fn map_tile(&mut self, name: &str, mut tile: AnalogTile) -> AnalogTile {
        let key = compose_key(&self.current_path(), name);
        self.visited.insert(key.clone());

        if self.tile_error.is_some() {
            return tile;
        }

        match restore_payload(&mut tile, &key, self.state.get(&key), &self.options) {
            Ok(true) => self.applied.push(key),
            Ok(false) => self.missing.push(key),
            Err(err) => self.tile_error = Some(err),
        }

        tile
    }
}
