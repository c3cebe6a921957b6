//! Tracing subscriber initialization
//!
//! Log verbosity follows `RUST_LOG` when set, otherwise the default filter passed in.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
