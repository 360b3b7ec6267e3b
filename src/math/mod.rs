//! Mathematical utilities: least squares, the nonlinear solver and fit statistics.

pub mod lm;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use stats::*;
