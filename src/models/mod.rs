//! Limb-darkening law implementations.
//!
//! Laws are implemented as small, pure functions so that fitting code can stay
//! generic over the catalog.

pub mod model;

pub use model::*;
