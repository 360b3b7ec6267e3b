//! Radial profile extraction.
//!
//! Turns an image plus disk geometry into `(μ, I/I(1))` samples that are safe
//! to fit: sigma-clipped per radius bin, invalid bins dropped, sorted by `μ`.

pub mod extract;

pub use extract::*;
