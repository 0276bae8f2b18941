//! Structured logging setup.
//!
//! The core never configures logging implicitly on load — callers opt in.
//! Native hosts (tests, a future native sync daemon) call
//! [`init_tracing`]; the `wasm` boundary wires `tracing-wasm` instead the
//! first time it is touched (see `wasm::ensure_logging`).

#[cfg(not(target_arch = "wasm32"))]
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init();
    });
}
