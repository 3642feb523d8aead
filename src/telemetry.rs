use tracing_subscriber::EnvFilter;

use crate::error::{Result, TripmateError};

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` (e.g. `tripmate=info`).
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|err| TripmateError::Config(format!("invalid log filter: {err}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| TripmateError::Config(format!("tracing already initialized: {err}")))
}
