//! Tracing setup for binaries and tests embedding the engine.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the host. Targets used by the engine:
//!
//! - `prologtron::vm` activation entry, exit and errors
//! - `prologtron::vm::step` one event per instruction (needs `trace = true`)
//! - `prologtron::vm::nondet` choice point creation and resumption
//! - `prologtron::database`, `prologtron::registry`, `prologtron::redefinition`

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Returns false if a global subscriber was already set.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Subscriber for tests: writes through the test harness capture.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}
