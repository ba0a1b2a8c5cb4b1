//! Tracing/logging (shared setup).

use k6svc_core::Environment;

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide logging with the format suited to `env`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(env: Environment) {
    crate::tracing::init(LogFormat::for_environment(env));
}
