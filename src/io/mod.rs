//! Input/output helpers.
//!
//! - analysis document JSON read/write (`document`)
//! - radial profile CSV export (`export`)

pub mod document;
pub mod export;

pub use document::*;
pub use export::*;
