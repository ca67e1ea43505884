#![warn(missing_docs)]

//! Configuration values of analog tiles.
//!
//! An [RPU config](RpuConfig) selects the device variant of a tile together with
//! its forward, backward and update parameters. All values are plain data: they
//! can be cloned, compared and saved as JSON through the [Config] trait.

mod config;
mod device;
mod inference;
mod io;
mod rpu;
mod update;

pub use config::*;
pub use device::*;
pub use inference::*;
pub use io::*;
pub use rpu::*;
pub use update::*;
