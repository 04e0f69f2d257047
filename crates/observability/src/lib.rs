//! Tracing/logging setup shared by embedding processes and tests.

/// Initialize process-wide tracing/logging.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    self::tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
