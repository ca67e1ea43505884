use crate::module::{ModuleVisitor, Param};
use crate::namespace::{compose_key, is_reserved};
use crate::{AnalogTile, StateMap, StateValue, StoreError, capture};

/// Visitor gathering the state of a module tree into a [state map](StateMap).
///
/// Ordinary parameters become tensor entries and tiles become snapshot
/// entries, keyed by their dotted path.
#[derive(Default)]
pub struct Collector {
    /// Current path in the module hierarchy
    path_stack: Vec<String>,
    /// Collected state, in tree order
    state: StateMap,
    /// First reserved name or duplicate key found
    error: Option<StoreError>,
}

impl Collector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert the collector into the collected state.
    pub fn into_result(self) -> Result<StateMap, StoreError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.state),
        }
    }

    fn current_path(&self) -> String {
        self.path_stack.join(".")
    }

    fn check_name(&mut self, name: &str) -> bool {
        if !is_reserved(name) {
            return true;
        }
        let key = compose_key(&self.current_path(), name);
        self.fail(StoreError::ReservedName(key));
        false
    }

    fn store(&mut self, key: String, value: StateValue) {
        if self.state.contains_key(&key) {
            self.fail(StoreError::DuplicateKey(key));
        } else {
            self.state.insert(key, value);
        }
    }

    fn fail(&mut self, err: StoreError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

impl ModuleVisitor for Collector {
    fn enter_module(&mut self, name: &str) {
        self.check_name(name);
        self.path_stack.push(name.to_string());
    }

    fn exit_module(&mut self, _name: &str) {
        self.path_stack.pop();
    }

    fn visit_param(&mut self, name: &str, param: &Param) {
        if self.check_name(name) {
            let key = compose_key(&self.current_path(), name);
            self.store(key, StateValue::Tensor(param.val().clone()));
        }
    }

    fn visit_tile(&mut self, name: &str, tile: &AnalogTile) {
        let key = compose_key(&self.current_path(), name);
        self.store(key, capture(tile).into());
    }
}
