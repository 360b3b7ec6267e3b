//! `limb-darkening` library crate.
//!
//! The binary (`ldark`) is a thin wrapper around this library so that:
//!
//! - core logic (detection, profile extraction, fitting) is testable without spawning processes
//! - the pipeline is reusable from other front-ends (a web handler, notebooks, batch jobs)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cache;
pub mod cli;
pub mod detect;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod preprocess;
pub mod profile;
pub mod report;
pub mod synth;

#[cfg(test)]
pub(crate) mod test_utils;
