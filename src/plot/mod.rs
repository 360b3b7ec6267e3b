//! Terminal plots of radial profiles and fitted laws.

pub mod ascii;

pub use ascii::*;
