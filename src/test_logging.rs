//! Tracing bootstrap for tests.
//!
//! Installs a `tracing_subscriber` fmt layer once per process, honoring
//! `RUST_LOG` so a failing test can be re-run with trace output:
//!
//! ```text
//! RUST_LOG=troth=trace cargo test -- settles_at_most_once
//! ```

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes test logging. Safe to call from every test; only the first
/// call installs the subscriber.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
