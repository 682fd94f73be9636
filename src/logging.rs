//!
//! Optional log output via `tracing-subscriber`.
//!
//! The library itself only emits `tracing` events. Binaries and tests that want
//! to see them on stderr can call [`init`] once at startup.

/// Installs a global formatting subscriber at `level`.
///
/// Fails if a global subscriber is already set.
pub fn init(
    level: tracing::Level,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
}
