//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - fit a single catalog law to a radial profile (`fitter`)
//! - fit every law independently and rank the survivors by R² (`selection`)

pub mod fitter;
pub mod selection;

pub use fitter::*;
pub use selection::*;
