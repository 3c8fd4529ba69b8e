//! Shared test utilities.
//!
//! `init_tracing` wires a `tracing` subscriber to the test writer so that
//! structural events show up when the crate is built with
//! `--features tracing`:
//!
//! ```bash
//! RUST_LOG=wordtrie=trace cargo test --features tracing --test stress_tests
//! ```

#![allow(dead_code)]

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
