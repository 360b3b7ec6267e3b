//! Terminal reports: per-image analysis summaries, model comparison tables and
//! the model catalog listing.

pub mod format;

pub use format::*;
