use analog_config::ConfigKind;

use crate::checker::MismatchReason;
use crate::record::RecorderError;

/// Error raised by a [tile](crate::AnalogTile) setter.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TileError {
    /// An array does not have the shape fixed at construction.
    #[error("Shape mismatch for {name}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Name of the array.
        name: String,
        /// Shape of the tile.
        expected: Vec<usize>,
        /// Shape that was given.
        found: Vec<usize>,
    },

    /// The number of hidden parameter arrays does not match the device.
    #[error("Expected {expected} hidden parameter arrays, found {found}")]
    HiddenCount {
        /// Number of arrays of the device.
        expected: usize,
        /// Number of arrays that were given.
        found: usize,
    },

    /// A bias was given to a tile without bias, or omitted for a tile with one.
    #[error("Bias mismatch: tile has bias {expected}, given bias {found}")]
    BiasMismatch {
        /// Whether the tile has a bias.
        expected: bool,
        /// Whether a bias was given.
        found: bool,
    },
}

/// Error raised while capturing or restoring state.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// An expected key is absent from the state map under strict restoration.
    #[error("Missing key(s) in state map: {0}")]
    MissingKey(String),

    /// The snapshot was captured from a tile with a different structure.
    #[error("Architecture mismatch for '{key}': {reason}")]
    ArchitectureMismatch {
        /// Key of the snapshot.
        key: String,
        /// Component that differs.
        reason: MismatchReason,
    },

    /// Floating point and device configurations can't be exchanged.
    #[error("RPU config kind mismatch for '{key}': tile is {target}, state holds {found}")]
    ConfigKindMismatch {
        /// Key of the snapshot.
        key: String,
        /// Kind of the target tile configuration.
        target: ConfigKind,
        /// Kind of the snapshot configuration.
        found: ConfigKind,
    },

    /// Keys of the state map that no module consumed, under strict restoration.
    #[error("Unexpected key(s) in state map: {}", .0.join(", "))]
    UnexpectedKeys(Vec<String>),

    /// An ordinary parameter has a different shape in the state map.
    #[error("Shape mismatch for '{key}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Key of the parameter.
        key: String,
        /// Shape of the module parameter.
        expected: Vec<usize>,
        /// Shape found in the state map.
        found: Vec<usize>,
    },

    /// The value under a key is not what the module expects.
    #[error("Invalid payload for '{key}': {message}")]
    InvalidPayload {
        /// Key of the value.
        key: String,
        /// Description of the problem.
        message: String,
    },

    /// A module used a name reserved for analog tile state.
    #[error("Name '{0}' is reserved for analog tile state")]
    ReservedName(String),

    /// Two entries of a module tree resolve to the same key.
    #[error("Duplicate key in module tree: {0}")]
    DuplicateKey(String),

    /// Tile error.
    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    /// Recorder error.
    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),
}
