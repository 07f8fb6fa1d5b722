//! Shared test infrastructure for the query compiler.
//!
//! Provides criteria fixtures, statement assertions and a tracing
//! subscriber for debugging failing cases with `RUST_LOG=xtens_query=trace`.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
