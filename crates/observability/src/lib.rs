//! Process-wide logging setup shared by every binary.

/// Initialize tracing in the format named by `STOREFRONT_LOG_FORMAT`
/// (JSON by default).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filters, formats).
pub mod tracing;
