//! tracing-subscriber setup for hosts and tests.

/// Installs the global fmt subscriber. Call once at host startup.
pub fn init() {
    tracing_subscriber::fmt().with_target(false).init();
}

/// Test-friendly init: captures output per test and tolerates repeat calls.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}
