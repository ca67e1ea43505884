//! Keys of analog tile state inside a state map.
//!
//! The state of a tile owned by the module at `path` is stored under
//! `"{path}.analog_tile_state"`. Modules with several tiles add a suffix to
//! every tile after the first one.

use crate::{StateMap, StateValue};

/// Local name of the state of the first tile of a module.
pub const ANALOG_TILE_STATE: &str = "analog_tile_state";

/// Join a module path and a local name with a dot.
///
/// The root module has the empty path, under which the local name is the key.
pub fn compose_key(module_path: &str, local_name: &str) -> String {
    if module_path.is_empty() {
        local_name.to_string()
    } else {
        format!("{module_path}.{local_name}")
    }
}

/// Local name of the state of the tile at `index` within its module.
pub fn tile_state_name(index: usize) -> String {
    match index {
        0 => ANALOG_TILE_STATE.to_string(),
        index => format!("{ANALOG_TILE_STATE}_{index}"),
    }
}

/// Whether a local name collides with the names used for tile state.
pub fn is_reserved(local_name: &str) -> bool {
    local_name.starts_with(ANALOG_TILE_STATE)
}

/// Key of the state of the first tile owned by the module at `module_path`.
pub fn tile_key(module_path: &str) -> String {
    compose_key(module_path, ANALOG_TILE_STATE)
}

/// State of the first tile owned by the module at `module_path`, if present.
pub fn decompose<'a>(state_map: &'a StateMap, module_path: &str) -> Option<&'a StateValue> {
    state_map.get(&tile_key(module_path))
}

/// State of the tile at `index` owned by the module at `module_path`, if present.
pub fn decompose_tile<'a>(
    state_map: &'a StateMap,
    module_path: &str,
    index: usize,
) -> Option<&'a StateValue> {
    state_map.get(&compose_key(module_path, &tile_state_name(index)))
}
