//! Tracing setup for the `ldark` binary.
//!
//! Logs go to stderr so stdout stays clean for reports and plots. `RUST_LOG`
//! (possibly set through a `.env` file) overrides the CLI level.

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set and valid, else `fallback`, else `warn`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(level: &str) {
    dotenvy::dotenv().ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Test-friendly subscriber that routes through the harness capture.
#[cfg(test)]
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_falls_back_instead_of_panicking() {
        let _ = env_filter("not a [valid filter");
        init_for_tests();
        init_for_tests();
        tracing::debug!("subscriber installed");
    }
}
