//! Tracing setup for processes hosting partition indexes.

use tracing_subscriber::EnvFilter;

use pindex_types::{StreamError, StreamSettings};

/// Filter built from `settings.log_level`.
pub fn log_filter(settings: &StreamSettings) -> Result<EnvFilter, StreamError> {
    EnvFilter::try_new(&settings.log_level).map_err(|e| {
        StreamError::Config(format!("invalid log_level {:?}: {}", settings.log_level, e))
    })
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `settings.log_level` when set.
pub fn init_tracing(settings: &StreamSettings) -> Result<(), StreamError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => log_filter(settings)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| StreamError::Config(format!("failed to set tracing subscriber: {}", e)))
}
