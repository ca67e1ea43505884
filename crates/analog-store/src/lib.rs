#![warn(missing_docs)]

//! Persistence of analog tiles.
//!
//! An [analog tile](AnalogTile) pairs a weight matrix with the simulation state
//! of the devices implementing it: hidden parameters, an alpha scale and its
//! [RPU config](analog_config::RpuConfig). This crate captures that state into
//! [snapshots](TileSnapshot), stores them in the [state map](StateMap) of the
//! module tree owning the tiles, and restores them into newly built tiles after
//! checking that both have the same architecture.
//!
//! ```rust
//! use analog_config::SingleRpuConfig;
//! use analog_store::{AnalogLinear, ModulePersist, RestoreOptions, Sequential};
//!
//! let model = Sequential::new(vec![AnalogLinear::new(4, 2, SingleRpuConfig::default().into(), true)]);
//! let state = model.capture_tree().unwrap();
//! assert!(state.contains_key("0.analog_tile_state"));
//!
//! let mut copy = Sequential::new(vec![AnalogLinear::new(4, 2, SingleRpuConfig::default().into(), true)]);
//! copy.restore_tree(&state, &RestoreOptions::default()).unwrap();
//! ```

mod checker;
mod error;
mod restore;
mod snapshot;
mod state;
mod tile;

pub mod module;
pub mod namespace;
pub mod persist;
pub mod record;

pub use checker::*;
pub use error::*;
pub use restore::*;
pub use snapshot::*;
pub use state::*;
pub use tile::*;

pub use module::{AnalogLinear, AnalogMapped, Linear, Module, Param, Sequential};
pub use namespace::{ANALOG_TILE_STATE, compose_key, decompose};
pub use persist::{ModulePersist, RestoreReport, capture_tree, restore_tree};
pub use record::{
    BinBytesRecorder, BinFileRecorder, BinGzFileRecorder, DefaultFileRecorder, FileRecorder,
    NamedMpkGzFileRecorder, PrettyJsonFileRecorder, Recorder, RecorderError,
};
