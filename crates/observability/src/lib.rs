//! Tracing/logging setup shared by binaries, tests and benches.

pub mod subscriber;

pub use subscriber::{LogFormat, init_with};

/// Initialize process-wide tracing (JSON, `RUST_LOG`, default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init_with(LogFormat::Json, "info");
}
