//! Process-wide logging setup shared by the binaries.

pub mod logging;

pub use logging::{LogConfig, LogFormat, UnknownLogFormat};

/// Initialize logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(&LogConfig::from_env());
}
