use crate::namespace::{compose_key, tile_state_name};
use crate::{
    AnalogTile, Compatibility, StateMap, StateValue, StoreError, TileSnapshot, check,
    check_config_kind, verify_snapshot,
};

/// How state is restored into existing modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Fail on missing or unexpected keys instead of skipping them.
    pub strict: bool,
    /// Replace the configuration of each tile with the one of its snapshot.
    ///
    /// When disabled, tiles keep the configuration they were built with and
    /// only their weights, hidden parameters and alpha scale are restored.
    pub load_rpu_config: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            strict: true,
            load_rpu_config: true,
        }
    }
}

impl RestoreOptions {
    /// Set the strict flag.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the load RPU config flag.
    pub fn with_load_rpu_config(mut self, load_rpu_config: bool) -> Self {
        self.load_rpu_config = load_rpu_config;
        self
    }
}

/// Restore the first tile owned by the module at `module_path`.
///
/// Returns the key that was consumed, or `None` when the key is absent and the
/// restoration isn't strict.
pub fn restore(
    tile: &mut AnalogTile,
    state_map: &StateMap,
    module_path: &str,
    options: &RestoreOptions,
) -> Result<Option<String>, StoreError> {
    restore_indexed(tile, state_map, module_path, 0, options)
}

/// Restore the tile at `index` owned by the module at `module_path`.
pub fn restore_indexed(
    tile: &mut AnalogTile,
    state_map: &StateMap,
    module_path: &str,
    index: usize,
    options: &RestoreOptions,
) -> Result<Option<String>, StoreError> {
    let key = compose_key(module_path, &tile_state_name(index));
    let restored = restore_payload(tile, &key, state_map.get(&key), options)?;

    Ok(restored.then_some(key))
}

/// Restore a tile from the value found under `key`.
///
/// Returns whether the tile was restored.
pub fn restore_payload(
    tile: &mut AnalogTile,
    key: &str,
    payload: Option<&StateValue>,
    options: &RestoreOptions,
) -> Result<bool, StoreError> {
    let Some(payload) = payload else {
        if options.strict {
            return Err(StoreError::MissingKey(key.to_string()));
        }
        log::warn!("No state found for '{key}', the tile keeps its current state");
        return Ok(false);
    };

    let Some(snapshot) = payload.as_tile() else {
        return Err(StoreError::InvalidPayload {
            key: key.to_string(),
            message: format!("expected a tile snapshot, found a {}", payload.variant_name()),
        });
    };

    restore_snapshot(tile, snapshot, key, options.load_rpu_config)?;
    Ok(true)
}

/// Restore a tile from a snapshot.
///
/// Every check runs before the tile is modified: on error the tile is left as
/// it was.
pub fn restore_snapshot(
    tile: &mut AnalogTile,
    snapshot: &TileSnapshot,
    key: &str,
    load_rpu_config: bool,
) -> Result<(), StoreError> {
    verify_snapshot(key, snapshot)?;
    check_config_kind(key, tile, snapshot)?;

    if let Compatibility::Mismatch(reason) = check(tile, snapshot) {
        return Err(StoreError::ArchitectureMismatch {
            key: key.to_string(),
            reason,
        });
    }

    let hidden = snapshot
        .hidden_parameters()
        .iter()
        .map(|h| h.values.clone())
        .collect();

    tile.set_weights(snapshot.weight().clone(), snapshot.bias().cloned())?;
    tile.set_hidden_parameters(hidden)?;
    tile.set_alpha_scale(snapshot.alpha_scale());

    if load_rpu_config {
        tile.replace_rpu_config(snapshot.rpu_config().clone());
    } else if tile.rpu_config() != snapshot.rpu_config() {
        log::debug!("Keeping the RPU config of '{key}', the stored one is ignored");
    }

    log::debug!("Restored tile state from '{key}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture;
    use analog_config::{FloatingPointRpuConfig, IOParameters, LinearStepDevice, SingleRpuConfig};
    use ndarray::{Array2, array};

    fn tile_with_inp_noise(inp_noise: f32) -> AnalogTile {
        let config = SingleRpuConfig::default()
            .with_forward(IOParameters::default().with_inp_noise(inp_noise));
        AnalogTile::new(2, 2, config.into(), true)
    }

    fn state_of(tile: &AnalogTile) -> StateMap {
        let mut map = StateMap::new();
        map.insert("analog_tile_state", capture(tile).into());
        map
    }

    #[test]
    fn restore_copies_everything() {
        let mut source = tile_with_inp_noise(0.321);
        source
            .set_weights(array![[0.1, 0.2], [0.3, 0.4]], Some(array![1.0, 2.0]))
            .unwrap();
        source.set_alpha_scale(2.0);
        let map = state_of(&source);

        let mut target = tile_with_inp_noise(0.51);
        let key = restore(&mut target, &map, "", &RestoreOptions::default()).unwrap();

        assert_eq!(key.as_deref(), Some("analog_tile_state"));
        assert_eq!(target.weight(), source.weight());
        assert_eq!(target.bias(), source.bias());
        assert_eq!(target.alpha_scale(), 2.0);
        assert_eq!(target.hidden_parameters(), source.hidden_parameters());
        assert_eq!(target.rpu_config(), source.rpu_config());
    }

    #[test]
    fn restore_keeps_config_when_asked() {
        let source = tile_with_inp_noise(0.321);
        let map = state_of(&source);

        let mut target = tile_with_inp_noise(0.51);
        let options = RestoreOptions::default().with_load_rpu_config(false);
        restore(&mut target, &map, "", &options).unwrap();

        assert_eq!(target.rpu_config().forward().map(|io| io.inp_noise), Some(0.51));
    }

    #[test]
    fn missing_key_depends_on_strict() {
        let map = StateMap::new();
        let mut tile = tile_with_inp_noise(0.0);
        tile.set_alpha_scale(3.0);

        let err = restore(&mut tile, &map, "layer", &RestoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::MissingKey(ref key) if key == "layer.analog_tile_state"));
        assert!(err.to_string().contains("Missing key"));

        let options = RestoreOptions::default().with_strict(false);
        let key = restore(&mut tile, &map, "layer", &options).unwrap();
        assert_eq!(key, None);
        assert_eq!(tile.alpha_scale(), 3.0);
    }

    #[test]
    fn wrong_payload_type() {
        let mut map = StateMap::new();
        map.insert("analog_tile_state", StateValue::Scalar(1.0));
        let mut tile = tile_with_inp_noise(0.0);

        let err = restore(&mut tile, &map, "", &RestoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload { .. }));
    }

    #[test]
    fn architecture_mismatch_leaves_tile_unchanged() {
        let source = AnalogTile::new(
            2,
            2,
            SingleRpuConfig::new(LinearStepDevice::default().into()).into(),
            true,
        );
        let map = state_of(&source);

        let mut target = tile_with_inp_noise(0.0);
        target
            .set_weights(array![[1.0, 1.0], [1.0, 1.0]], Some(array![1.0, 1.0]))
            .unwrap();
        let before = target.clone();

        let err = restore(&mut target, &map, "", &RestoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::ArchitectureMismatch { .. }));
        assert_eq!(target.weight(), before.weight());
        assert_eq!(target.hidden_parameters(), before.hidden_parameters());
        assert_eq!(target.rpu_config(), before.rpu_config());
    }

    #[test]
    fn config_kind_mismatch_regardless_of_load_rpu_config() {
        let source = AnalogTile::new(2, 2, FloatingPointRpuConfig::new().into(), true);
        let map = state_of(&source);

        for load_rpu_config in [true, false] {
            let mut target = tile_with_inp_noise(0.0);
            let options = RestoreOptions::default().with_load_rpu_config(load_rpu_config);

            let err = restore(&mut target, &map, "", &options).unwrap_err();
            assert!(matches!(err, StoreError::ConfigKindMismatch { .. }));
            assert_eq!(target.weight(), &Array2::<f32>::zeros((2, 2)));
        }
    }
}
