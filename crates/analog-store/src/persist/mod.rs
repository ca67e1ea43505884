//! Capture and restoration of whole module trees.

mod applier;
mod collector;

pub use applier::*;
pub use collector::*;

use std::path::PathBuf;

use crate::module::Module;
use crate::record::FileRecorder;
use crate::{RestoreOptions, StateMap, StoreError};

/// Capture the state of every parameter and tile of a module tree.
///
/// Fails when a child or parameter uses a name reserved for tile state, or
/// when two entries of the tree resolve to the same key.
pub fn capture_tree<M: Module>(root: &M) -> Result<StateMap, StoreError> {
    let mut collector = Collector::new();
    root.visit(&mut collector);
    let state = collector.into_result()?;

    log::debug!("Captured {} state entries", state.len());
    Ok(state)
}

/// Restore a module tree from a state map.
///
/// The restoration runs on a copy of the tree that replaces `root` only when
/// every step succeeded: on error `root` is left as it was.
pub fn restore_tree<M: Module>(
    root: &mut M,
    state: &StateMap,
    options: &RestoreOptions,
) -> Result<RestoreReport, StoreError> {
    let mut applier = Applier::new(state, *options);
    let restored = root.clone().map(&mut applier);
    let report = applier.into_result()?;
    *root = restored;

    log::debug!(
        "Restored {} state entries ({} missing, {} unused)",
        report.applied.len(),
        report.missing.len(),
        report.unused.len()
    );
    Ok(report)
}

/// Extension trait giving every [module](Module) persistence methods.
pub trait ModulePersist: Module {
    /// Capture the state of the module. See [capture_tree].
    fn capture_tree(&self) -> Result<StateMap, StoreError> {
        capture_tree(self)
    }

    /// Restore the module from a state map. See [restore_tree].
    fn restore_tree(
        &mut self,
        state: &StateMap,
        options: &RestoreOptions,
    ) -> Result<RestoreReport, StoreError> {
        restore_tree(self, state, options)
    }

    /// Save the state of the module to a file.
    ///
    /// The extension of the path is replaced by the one of the recorder.
    fn save_file<FR, PB>(&self, file_path: PB, recorder: &FR) -> Result<(), StoreError>
    where
        FR: FileRecorder,
        PB: Into<PathBuf>,
    {
        let state = self.capture_tree()?;
        recorder.record(&state, file_path.into())?;
        Ok(())
    }

    /// Restore the module from a file written by [save_file](ModulePersist::save_file).
    fn load_file<FR, PB>(
        &mut self,
        file_path: PB,
        recorder: &FR,
        options: &RestoreOptions,
    ) -> Result<RestoreReport, StoreError>
    where
        FR: FileRecorder,
        PB: Into<PathBuf>,
    {
        let state = recorder.load(file_path.into())?;
        self.restore_tree(&state, options)
    }
}

impl<M: Module> ModulePersist for M {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleMapper, ModuleVisitor, map_child, visit_child};
    use crate::{AnalogLinear, Linear, StateValue};
    use analog_config::SingleRpuConfig;
    use ndarray::{ArrayD, IxDyn, array};

    #[derive(Debug, Clone)]
    struct Net {
        analog: AnalogLinear,
        head: Linear,
    }

    impl Module for Net {
        fn visit<V: ModuleVisitor>(&self, visitor: &mut V) {
            visit_child("analog", &self.analog, visitor);
            visit_child("head", &self.head, visitor);
        }

        fn map<M: ModuleMapper>(self, mapper: &mut M) -> Self {
            Self {
                analog: map_child("analog", self.analog, mapper),
                head: map_child("head", self.head, mapper),
            }
        }
    }

    fn net() -> Net {
        Net {
            analog: AnalogLinear::new(2, 2, SingleRpuConfig::default().into(), true),
            head: Linear::new(2, 1, true),
        }
    }

    #[test]
    fn round_trip() {
        let mut source = net();
        source
            .analog
            .tile_mut()
            .set_weights(array![[1.0, 2.0], [3.0, 4.0]], Some(array![0.1, 0.2]))
            .unwrap();
        let state = source.capture_tree().unwrap();

        let mut target = net();
        let report = target.restore_tree(&state, &RestoreOptions::default()).unwrap();

        assert_eq!(
            report.applied,
            vec!["analog.analog_tile_state", "head.weight", "head.bias"]
        );
        assert!(report.is_complete());
        assert_eq!(target.analog.tile().weight(), source.analog.tile().weight());
    }

    #[test]
    fn strict_reports_unexpected_keys() {
        let mut state = net().capture_tree().unwrap();
        state.insert("extra", StateValue::Scalar(1.0));

        let err = net()
            .restore_tree(&state, &RestoreOptions::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::UnexpectedKeys(ref keys) if keys == &["extra"]));

        let options = RestoreOptions::default().with_strict(false);
        let report = net().restore_tree(&state, &options).unwrap();
        assert_eq!(report.unused, vec!["extra"]);
    }

    #[test]
    fn strict_reports_missing_params() {
        let mut state = net().capture_tree().unwrap();
        state.remove("head.bias");

        let err = net()
            .restore_tree(&state, &RestoreOptions::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingKey(ref key) if key == "head.bias"));
    }

    #[test]
    fn param_shape_is_checked() {
        let mut state = net().capture_tree().unwrap();
        state.insert(
            "head.weight",
            StateValue::Tensor(ArrayD::zeros(IxDyn(&[3, 3]))),
        );

        let err = net()
            .restore_tree(&state, &RestoreOptions::default().with_strict(false))
            .unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { ref key, .. } if key == "head.weight"));
    }
}
