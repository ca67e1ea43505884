//! Module tree interface and the layers built on it.

mod analog;
mod base;
mod linear;
mod param;

pub use analog::*;
pub use base::*;
pub use linear::*;
pub use param::*;
