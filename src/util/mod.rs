//! Utility types and functions for Kenos.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus plane and surface-frame helpers

mod error;
mod math;

pub use error::*;
pub use math::*;
